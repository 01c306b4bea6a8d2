use derive_more::Display;
use serde::{Deserialize, Serialize};

pub use crate::policy::Role;

/// Opaque identifier assigned by the backend.
#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: Id,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct List {
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRole {
    pub email: String,
    pub new_role: Role,
}
