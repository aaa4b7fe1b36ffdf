use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserPermissions {
    #[default]
    User,
    Editor,
    Admin,
}

impl std::fmt::Display for UserPermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserPermissions::User => "USER",
            UserPermissions::Editor => "EDITOR",
            UserPermissions::Admin => "ADMIN",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub permissions: UserPermissions,
}

impl User {
    /// A user that has not been registered yet; the directory assigns the id.
    pub fn new(email: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        User {
            id: UserId::default(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            permissions: UserPermissions::User,
        }
    }
}
