use crate::{
    api::{self, user::Id},
    policy::Role,
};

/// Ephemeral state owned by a single [`Dashboard`](super::Dashboard).
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    pub users: Vec<api::User>,
    pub loading: bool,
    pub error: Option<String>,
    pub message: Option<String>,
    pub viewing: Option<Viewed>,
}

impl ViewState {
    pub(super) fn begin(&mut self) {
        self.loading = true;
        self.clear_banners();
    }

    pub(super) fn clear_banners(&mut self) {
        self.error = None;
        self.message = None;
    }
}

/// User whose to-do items replace the roster on screen.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Viewed {
    pub id: Id,
    pub email: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    Roster,
    Todos(TodoHandoff),
}

/// Everything the to-do view needs to take over.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TodoHandoff {
    pub auth_token: Option<String>,
    pub role: Option<Role>,
    pub user_id: Id,
    pub email: String,
}

/// One roster line together with the controls the operator may use on it.
#[derive(Clone, Debug)]
pub struct RowView<'a> {
    pub user: &'a api::User,
    pub is_self: bool,
    pub role_select_disabled: bool,
    pub role_options: Vec<RoleOption>,
    pub delete_disabled: bool,
}

impl RowView<'_> {
    pub fn enabled_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.role_options
            .iter()
            .filter(|option| !option.disabled)
            .map(|option| option.role)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoleOption {
    pub role: Role,
    pub disabled: bool,
}
