//! Translation of `GET /users` query parameters into a search.
//!
//! Raw parameters are accepted as strings and never rejected; anything
//! unusable falls back to "no filter" or the pagination defaults.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use utoipa::IntoParams;

use crate::entity;
use crate::models::User;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// Raw list query string
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct UserListParams {
    /// Case-insensitive substring matched against name or email
    pub q: Option<String>,
    /// Exact status match
    pub status: Option<String>,
    /// Inclusive lower age bound
    pub min_age: Option<String>,
    /// Inclusive upper age bound
    pub max_age: Option<String>,
    /// Page size, 1..=100 (default 20)
    pub limit: Option<String>,
    /// Records to skip (default 0)
    pub offset: Option<String>,
}

/// Normalized search criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            q: None,
            status: None,
            min_age: None,
            max_age: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl UserQuery {
    pub fn from_params(params: &UserListParams) -> Self {
        // Blank terms are dropped, but a kept term is matched as written.
        let q = params.q.clone().filter(|q| !q.trim().is_empty());

        let status = params
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let limit = match params.limit.as_deref().map(|v| v.trim().parse::<i64>()) {
            Some(Ok(n)) if n < 1 => DEFAULT_LIMIT,
            Some(Ok(n)) => (n as u64).min(MAX_LIMIT),
            Some(Err(e)) if *e.kind() == IntErrorKind::PosOverflow => MAX_LIMIT,
            _ => DEFAULT_LIMIT,
        };

        let offset = match parse_trimmed::<i64>(params.offset.as_deref()) {
            Some(n) if n > 0 => n as u64,
            _ => 0,
        };

        Self {
            q,
            status,
            min_age: parse_trimmed(params.min_age.as_deref()),
            max_age: parse_trimmed(params.max_age.as_deref()),
            limit,
            offset,
        }
    }

    /// True when `user` satisfies every present filter. Pagination is ignored.
    pub fn matches(&self, user: &User) -> bool {
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            if !user.name.to_lowercase().contains(&q) && !user.email.to_lowercase().contains(&q) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &user.status != status {
                return false;
            }
        }
        if let Some(min) = self.min_age {
            if !user.age.is_some_and(|age| age >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_age {
            if !user.age.is_some_and(|age| age <= max) {
                return false;
            }
        }
        true
    }

    /// Add the filters and ordering to `select`. Pagination is left to the
    /// caller so the same statement can be counted first.
    pub fn apply(&self, select: Select<entity::Entity>) -> Select<entity::Entity> {
        let mut select = select;

        if let Some(q) = &self.q {
            let pattern = format!("%{}%", escape_like(q));
            select = select.filter(Expr::cust_with_values(
                r#"("users"."name" ILIKE ? OR "users"."email" ILIKE ?)"#,
                [pattern.clone(), pattern],
            ));
        }

        if let Some(status) = &self.status {
            select = select.filter(entity::Column::Status.eq(status.as_str()));
        }

        if let Some(min) = self.min_age {
            select = select.filter(entity::Column::Age.gte(min));
        }

        if let Some(max) = self.max_age {
            select = select.filter(entity::Column::Age.lte(max));
        }

        select
            .order_by_desc(entity::Column::CreatedAt)
            .order_by_asc(entity::Column::Id)
    }

    /// `apply` on a fresh `SELECT` over the users table.
    pub fn select(&self) -> Select<entity::Entity> {
        self.apply(entity::Entity::find())
    }
}

fn parse_trimmed<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

// Backslash is Postgres' default LIKE escape character.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUser;
    use sea_orm::{DbBackend, QueryTrait};

    fn params(pairs: &[(&str, &str)]) -> UserListParams {
        let mut p = UserListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "q" => p.q = value,
                "status" => p.status = value,
                "minAge" => p.min_age = value,
                "maxAge" => p.max_age = value,
                "limit" => p.limit = value,
                "offset" => p.offset = value,
                other => panic!("unknown param {other}"),
            }
        }
        p
    }

    fn user(name: &str, email: &str, age: Option<i32>, status: &str) -> User {
        User::new(CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            age,
            status: Some(status.to_string()),
        })
    }

    #[test]
    fn test_defaults() {
        assert_eq!(UserQuery::from_params(&params(&[])), UserQuery::default());
    }

    #[test]
    fn test_limit_normalization() {
        let limit = |raw: &str| UserQuery::from_params(&params(&[("limit", raw)])).limit;

        assert_eq!(limit("5"), 5);
        assert_eq!(limit("100"), 100);
        assert_eq!(limit("500"), 100);
        assert_eq!(limit("0"), 20);
        assert_eq!(limit("-3"), 20);
        assert_eq!(limit("abc"), 20);
        assert_eq!(limit("99999999999999999999"), 100);
        assert_eq!(limit("-99999999999999999999"), 20);
    }

    #[test]
    fn test_offset_normalization() {
        let offset = |raw: &str| UserQuery::from_params(&params(&[("offset", raw)])).offset;

        assert_eq!(offset("40"), 40);
        assert_eq!(offset("-1"), 0);
        assert_eq!(offset("x"), 0);
    }

    #[test]
    fn test_empty_and_unparseable_filters_are_absent() {
        let query = UserQuery::from_params(&params(&[
            ("q", "   "),
            ("status", ""),
            ("minAge", "old"),
            ("maxAge", ""),
        ]));

        assert_eq!(query, UserQuery::default());
    }

    #[test]
    fn test_q_keeps_surrounding_whitespace() {
        let query = UserQuery::from_params(&params(&[("q", " lee")]));
        assert_eq!(query.q.as_deref(), Some(" lee"));

        assert!(query.matches(&user("Ann Lee", "a@x.com", None, "active")));
        assert!(!query.matches(&user("Lee", "lee@x.com", None, "active")));
    }

    #[test]
    fn test_matches_q_on_name_or_email_ignoring_case() {
        let query = UserQuery::from_params(&params(&[("q", "ANN")]));

        assert!(query.matches(&user("Ann", "a@x.com", None, "active")));
        assert!(query.matches(&user("Bob", "joanna@x.com", None, "active")));
        assert!(!query.matches(&user("Bob", "bob@x.com", None, "active")));
    }

    #[test]
    fn test_matches_age_bounds_are_inclusive_and_skip_null() {
        let query = UserQuery::from_params(&params(&[("minAge", "18"), ("maxAge", "30")]));

        assert!(query.matches(&user("A", "a@x.com", Some(18), "active")));
        assert!(query.matches(&user("B", "b@x.com", Some(30), "active")));
        assert!(!query.matches(&user("C", "c@x.com", Some(31), "active")));
        assert!(!query.matches(&user("D", "d@x.com", None, "active")));
    }

    #[test]
    fn test_matches_status_exactly() {
        let query = UserQuery::from_params(&params(&[("status", "inactive")]));

        assert!(query.matches(&user("A", "a@x.com", None, "inactive")));
        assert!(!query.matches(&user("B", "b@x.com", None, "Inactive")));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
    }

    #[test]
    fn test_select_binds_values_instead_of_inlining() {
        let query = UserQuery::from_params(&params(&[
            ("q", "ann'; DROP TABLE users; --"),
            ("status", "active"),
            ("minAge", "21"),
        ]));

        let statement = query.select().build(DbBackend::Postgres);

        assert!(statement.sql.contains("ILIKE"));
        assert!(!statement.sql.contains("DROP TABLE"));
        assert!(!statement.sql.contains("active"));
        assert!(statement.sql.contains(r#"ORDER BY "users"."created_at" DESC, "users"."id" ASC"#));
        assert!(statement.values.is_some());
    }
}
