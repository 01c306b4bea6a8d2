//! Headless view model of the user management dashboard.
//!
//! A [`Dashboard`] owns the roster and its banners, runs the session gate,
//! and reconciles local state after each backend call. Rendering is left to
//! the caller, which reads [`Dashboard::mode`] and [`Dashboard::rows`].

mod session;
pub mod table;
mod view;

use tracing::{info, warn};

use crate::{
    api::user::Id,
    backend, config,
    policy::{self, Role},
};

pub use self::{
    session::{Admission, Session},
    view::{Mode, RoleOption, RowView, TodoHandoff, ViewState, Viewed},
};

pub const ACCESS_DENIED: &str =
    "Access denied: administrator privileges required";
const FETCH_FAILED: &str = "Failed to fetch users";
const CHANGE_ROLE_FAILED: &str = "Failed to change role";
const DELETE_FAILED: &str = "Failed to delete user";

pub struct Dashboard {
    client: backend::Client,
    roster: config::Roster,
    session: Session,
    state: ViewState,
}

impl Dashboard {
    pub fn new(
        client: backend::Client,
        roster: config::Roster,
        session: Session,
    ) -> Self {
        Self {
            client,
            roster,
            session,
            state: ViewState::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn admission(&self) -> Admission {
        self.session.admission()
    }

    /// Runs the session gate and loads the roster for admitted operators.
    pub async fn mount(&mut self) -> Admission {
        self.gate().await
    }

    /// Replaces the session, re-running the gate when the token or the role
    /// differ from the previous ones.
    pub async fn set_session(&mut self, session: Session) -> Admission {
        let changed = self.session.auth_token != session.auth_token
            || self.session.role != session.role;
        self.session = session;
        if changed {
            self.gate().await
        } else {
            self.admission()
        }
    }

    async fn gate(&mut self) -> Admission {
        let admission = self.admission();
        self.state.clear_banners();
        if admission != Admission::Granted {
            self.state.users.clear();
            self.state.viewing = None;
        }
        match admission {
            Admission::LoginRequired => {}
            Admission::AccessDenied => {
                self.state.error = Some(ACCESS_DENIED.to_string());
            }
            Admission::Granted => self.fetch_users().await,
        }
        admission
    }

    pub async fn fetch_users(&mut self) {
        let Some(token) = self.session.token() else {
            warn!("not fetching users without an auth token");
            return;
        };

        self.state.begin();
        match self
            .client
            .list_users(token, self.roster.page, self.roster.limit)
            .await
        {
            Ok(users) => self.state.users = users,
            Err(e) => {
                warn!("failed to fetch users: {e}");
                self.state.error = Some(e.banner(FETCH_FAILED));
            }
        }
        self.state.loading = false;
    }

    pub async fn change_role(&mut self, id: &Id, email: &str, new_role: Role) {
        let Some(token) = self.session.token() else {
            warn!("not changing role without an auth token");
            return;
        };

        self.state.begin();
        match self.client.change_role(token, email, new_role).await {
            Ok(res) => {
                info!(%id, %email, %new_role, "role changed");
                if let Some(user) =
                    self.state.users.iter_mut().find(|user| &user.id == id)
                {
                    user.role = new_role;
                }
                self.state.message = Some(res.message.unwrap_or_else(|| {
                    format!("Role of {email} changed to {new_role}")
                }));
            }
            Err(e) => {
                warn!("failed to change role of {email}: {e}");
                self.state.error = Some(e.banner(CHANGE_ROLE_FAILED));
            }
        }
        self.state.loading = false;
    }

    /// Deletes a user once `confirm` accepts the prompt naming `email`.
    ///
    /// Nothing is sent and no state changes when the prompt is declined.
    pub async fn delete_user<F>(&mut self, id: &Id, email: &str, confirm: F)
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(&format!("Are you sure you want to delete user {email}?"))
        {
            return;
        }
        let Some(token) = self.session.token() else {
            warn!("not deleting user without an auth token");
            return;
        };

        self.state.begin();
        match self.client.delete_user(token, id).await {
            Ok(res) => {
                info!(%id, %email, "user deleted");
                self.state.users.retain(|user| &user.id != id);
                self.state.message = Some(
                    res.message
                        .unwrap_or_else(|| format!("User {email} deleted")),
                );
            }
            Err(e) => {
                warn!("failed to delete {email}: {e}");
                self.state.error = Some(e.banner(DELETE_FAILED));
            }
        }
        self.state.loading = false;
    }

    pub fn view_user_todos(&mut self, id: &Id, email: &str) {
        self.state.viewing = Some(Viewed {
            id: id.clone(),
            email: email.to_string(),
        });
    }

    /// Leaves the to-do view and reloads the roster, which may have changed
    /// in the meantime.
    pub async fn back_to_users(&mut self) {
        self.state.viewing = None;
        self.fetch_users().await;
    }

    pub fn mode(&self) -> Mode {
        match &self.state.viewing {
            None => Mode::Roster,
            Some(viewed) => Mode::Todos(TodoHandoff {
                auth_token: self.session.auth_token.clone(),
                role: self.session.role,
                user_id: viewed.id.clone(),
                email: viewed.email.clone(),
            }),
        }
    }

    /// Roster lines with their controls, empty unless access is granted.
    pub fn rows(&self) -> Vec<RowView<'_>> {
        let acting = match (self.admission(), self.session.role) {
            (Admission::Granted, Some(role)) => role,
            _ => return Vec::new(),
        };
        let loading = self.state.loading;

        self.state
            .users
            .iter()
            .map(|user| {
                let is_self = self.session.is_self(&user.email);
                RowView {
                    user,
                    is_self,
                    role_select_disabled: policy::is_role_select_disabled(
                        acting, user.role, is_self, loading,
                    ),
                    role_options: Role::ALL
                        .into_iter()
                        .map(|role| RoleOption {
                            role,
                            disabled: policy::is_role_option_disabled(
                                acting, user.role, role,
                            ),
                        })
                        .collect(),
                    delete_disabled: policy::is_delete_disabled(
                        acting, user.role, is_self, loading,
                    ),
                }
            })
            .collect()
    }
}
