//! Role hierarchy and the eligibility rules derived from it.
//!
//! This module has no dependency on the rest of the crate, so the same table
//! can be compiled into a backend and enforce exactly what the dashboard
//! renders.

use std::{fmt, str::FromStr};

use derive_more::Display;
use enum_utils::TryFromRepr;
use serde::{Deserialize, Serialize};

/// Roles an account can hold.
///
/// The discriminant is the role level used by every comparison in this
/// module. Note that [`Role::Manager`] sits above [`Role::SuperAdmin`],
/// while [`Role::SuperAdmin`] is the top-tier role (see
/// [`Role::is_top_tier`]).
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, TryFromRepr,
)]
#[repr(u8)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    User = 0,
    Moderator = 1,
    Admin = 2,
    SuperAdmin = 3,
    Manager = 4,
}

impl Role {
    /// All roles, ordered by level.
    pub const ALL: [Self; 5] = [
        Self::User,
        Self::Moderator,
        Self::Admin,
        Self::SuperAdmin,
        Self::Manager,
    ];

    /// Roles admitted to the user management dashboard.
    pub const ADMINS: [Self; 3] =
        [Self::Admin, Self::SuperAdmin, Self::Manager];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn is_admin(self) -> bool {
        Self::ADMINS.contains(&self)
    }

    /// Whether this is the role that bypasses level comparisons for deletes
    /// and guards its holders from lower roles, independent of its level.
    pub fn is_top_tier(self) -> bool {
        self == Self::SuperAdmin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
            Self::SuperAdmin => "superAdmin",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("unknown role `{_0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Reason an action on another account is not allowed.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Denied {
    #[display("you cannot modify your own account")]
    OwnAccount,
    #[display("your role is not high enough for this action")]
    InsufficientLevel,
    #[display("only a superAdmin can manage a superAdmin")]
    TopTierTarget,
}

/// Checks whether `acting` may change the role of an account holding
/// `target` at all.
///
/// Peers of equal level pass this check, unlike [`check_delete`].
pub fn check_role_change(
    acting: Role,
    target: Role,
    is_self: bool,
) -> Result<(), Denied> {
    if is_self {
        return Err(Denied::OwnAccount);
    }
    if acting.level() < target.level() {
        return Err(Denied::InsufficientLevel);
    }
    Ok(())
}

/// Checks whether `candidate` may be assigned by `acting` to an account
/// currently holding `target`.
pub fn check_role_option(
    acting: Role,
    target: Role,
    candidate: Role,
) -> Result<(), Denied> {
    if candidate.level() > acting.level() {
        return Err(Denied::InsufficientLevel);
    }
    if target.is_top_tier() && !acting.is_top_tier() {
        return Err(Denied::TopTierTarget);
    }
    Ok(())
}

/// Checks whether `acting` may delete an account holding `target`.
pub fn check_delete(
    acting: Role,
    target: Role,
    is_self: bool,
) -> Result<(), Denied> {
    if is_self {
        return Err(Denied::OwnAccount);
    }
    if acting.level() <= target.level() && !acting.is_top_tier() {
        return Err(Denied::InsufficientLevel);
    }
    if target.is_top_tier() && !acting.is_top_tier() {
        return Err(Denied::TopTierTarget);
    }
    Ok(())
}

pub fn is_role_select_disabled(
    acting: Role,
    target: Role,
    is_self: bool,
    loading: bool,
) -> bool {
    loading || check_role_change(acting, target, is_self).is_err()
}

pub fn is_role_option_disabled(
    acting: Role,
    target: Role,
    candidate: Role,
) -> bool {
    check_role_option(acting, target, candidate).is_err()
}

pub fn is_delete_disabled(
    acting: Role,
    target: Role,
    is_self: bool,
    loading: bool,
) -> bool {
    loading || check_delete(acting, target, is_self).is_err()
}
