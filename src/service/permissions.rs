use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission tier assigned to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ViewOnly,
    UserEdit,
    Admin,
}

/// Something a caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::ViewOnly, Role::UserEdit, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::ViewOnly => "view_only",
            Role::UserEdit => "user_edit",
            Role::Admin => "admin",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::ViewOnly => "Can view inventory only",
            Role::UserEdit => "Can view, add, and edit inventory (no delete)",
            Role::Admin => "Full access including delete and user management",
        }
    }

    pub fn permissions(self) -> &'static [Action] {
        match self {
            Role::ViewOnly => &[Action::View],
            Role::UserEdit => &[Action::View, Action::Create, Action::Update],
            Role::Admin => &[
                Action::View,
                Action::Create,
                Action::Update,
                Action::Delete,
                Action::Admin,
            ],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role `{}`", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view_only" => Ok(Role::ViewOnly),
            "user_edit" => Ok(Role::UserEdit),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

fn has_role<S: AsRef<str>>(role_names: &[S], role: Role) -> bool {
    role_names.iter().any(|r| r.as_ref() == role.as_str())
}

/// Highest-ranked role among `role_names`: admin > user_edit > view_only.
/// Unknown names are ignored; an empty set yields `ViewOnly`.
pub fn highest_role<S: AsRef<str>>(role_names: &[S]) -> Role {
    if has_role(role_names, Role::Admin) {
        Role::Admin
    } else if has_role(role_names, Role::UserEdit) {
        Role::UserEdit
    } else {
        Role::ViewOnly
    }
}

pub fn can_perform<S: AsRef<str>>(role_names: &[S], action: Action) -> bool {
    if action == Action::Admin {
        return has_role(role_names, Role::Admin);
    }
    highest_role(role_names).permissions().contains(&action)
}
