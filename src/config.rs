use std::env;

use serde::Deserialize;

pub const TOKEN_ENV: &str = "ROSTER_ADMIN_TOKEN";
pub const ROLE_ENV: &str = "ROSTER_ADMIN_ROLE";
pub const EMAIL_ENV: &str = "ROSTER_ADMIN_EMAIL";

#[derive(Deserialize)]
pub struct Config {
    pub backend: Backend,
    #[serde(default)]
    pub roster: Roster,
    #[serde(default)]
    pub session: Session,
}

#[derive(Clone, Deserialize)]
pub struct Backend {
    pub base_url: String,
}

/// Page of the user list requested by the dashboard.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Roster {
    #[serde(default = "Roster::default_page")]
    pub page: u32,
    #[serde(default = "Roster::default_limit")]
    pub limit: u32,
}

impl Roster {
    fn default_page() -> u32 {
        1
    }

    fn default_limit() -> u32 {
        100
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            page: Self::default_page(),
            limit: Self::default_limit(),
        }
    }
}

/// Credentials handed over by the hosting application.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Session {
    pub auth_token: Option<String>,
    pub role: Option<String>,
    pub user_email: Option<String>,
}

impl Session {
    /// Replaces every value that is also set in the environment.
    pub fn with_env_overrides(self) -> Self {
        Self {
            auth_token: env::var(TOKEN_ENV).ok().or(self.auth_token),
            role: env::var(ROLE_ENV).ok().or(self.role),
            user_email: env::var(EMAIL_ENV).ok().or(self.user_email),
        }
    }
}
