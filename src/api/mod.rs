pub mod user;

use serde::{Deserialize, Serialize};

pub use self::user::User;

/// Body of a successful mutation response.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    #[serde(default)]
    pub message: Option<String>,
}
