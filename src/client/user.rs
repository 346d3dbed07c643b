//! The remote user resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as exchanged with the users service.
///
/// Zero and empty fields are left out of request bodies, so a partial
/// `User` works as an update payload.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

fn is_zero(id: &i64) -> bool {
    *id == 0
}

/// Body of a successful `POST /users`.
#[derive(Deserialize)]
pub(crate) struct Created {
    pub(crate) id: i64,
}
