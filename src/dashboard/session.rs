use tracing::warn;

use crate::{config, policy::Role};

/// Identity of the operator using the dashboard.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Session {
    pub auth_token: Option<String>,
    pub role: Option<Role>,

    /// Email of the acting user, used to recognize their own row.
    pub user_email: Option<String>,
}

impl Session {
    pub fn new(auth_token: &str, role: Role, user_email: &str) -> Self {
        Self {
            auth_token: Some(auth_token.to_string()),
            role: Some(role),
            user_email: Some(user_email.to_string()),
        }
    }

    pub fn admission(&self) -> Admission {
        match (self.token(), self.role) {
            (None, _) => Admission::LoginRequired,
            (Some(_), Some(role)) if role.is_admin() => Admission::Granted,
            (Some(_), _) => Admission::AccessDenied,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn is_self(&self, email: &str) -> bool {
        self.user_email.as_deref() == Some(email)
    }
}

impl From<config::Session> for Session {
    fn from(config: config::Session) -> Self {
        let role = config.role.and_then(|role| {
            role.parse::<Role>()
                .inspect_err(|e| warn!("ignoring session role: {e}"))
                .ok()
        });
        Self {
            auth_token: config.auth_token,
            role,
            user_email: config.user_email,
        }
    }
}

/// Outcome of checking a [`Session`] before any roster logic runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Admission {
    LoginRequired,
    AccessDenied,
    Granted,
}
