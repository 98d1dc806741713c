use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Status assigned when a create request omits one.
pub const DEFAULT_STATUS: &str = "active";

/// User entity - matches SQL schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUIDv7, time ordered)
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Email address (unique, compared case-sensitively)
    pub email: String,
    /// Age in years, `null` when unknown
    pub age: Option<i32>,
    /// Free-form status label
    #[schema(example = "active")]
    pub status: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh record from a create request.
    ///
    /// `createdAt` and `updatedAt` share one timestamp, truncated to
    /// microseconds so it survives a round trip through `timestamptz`.
    pub fn new(input: CreateUser) -> Self {
        let now = now();

        Self {
            id: Uuid::now_v7(),
            name: input.name,
            email: input.email,
            age: input.age,
            status: input.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the fields present in `update`; everything else is kept.
    pub fn apply_update(&mut self, update: UpdateUser) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now().max(self.updated_at);
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// DTO for creating a new user
///
/// Missing, `null` or non-string `name`/`email` deserialize as empty strings
/// so they are reported as validation failures rather than malformed JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[serde(default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Ann")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "ann@example.com")]
    pub email: String,
    pub age: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// DTO for updating an existing user
///
/// Absent keys are left untouched. `"age": null` clears the age.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<i32>)]
    pub age: Option<Option<i32>>,
    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,
}

// Present-but-null becomes `Some(None)`; absent stays `None` via `default`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Pagination metadata returned alongside a page of users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListMeta {
    /// Number of matching users ignoring pagination
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Response body for `GET /users`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub data: Vec<User>,
    pub meta: ListMeta,
}
