use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres, Row};

use crate::db::errors::{DatabaseError, Result};

/// A bind parameter for a generated query. Typed so that the same value
/// both drives the real `bind()` call and can be asserted in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Number(Decimal),
    Timestamp(DateTime<Utc>),
    IdList(Vec<i64>),
}

/// A generated SQL statement plus its parameters, in placeholder order.
/// Builders produce these as plain values; executing them is a separate
/// step, so query generation stays unit-testable without a database.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        SqlQuery {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter and return its 1-based placeholder index
    pub fn push(&mut self, param: SqlParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    fn build(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, param| match param {
                SqlParam::Text(v) => query.bind(v),
                SqlParam::Int(v) => query.bind(v),
                SqlParam::Float(v) => query.bind(v),
                SqlParam::Number(v) => query.bind(v),
                SqlParam::Timestamp(v) => query.bind(v),
                SqlParam::IdList(v) => query.bind(v),
            })
    }

    /// Run the statement and return the number of affected rows
    pub async fn execute(&self, pool: &PgPool) -> Result<u64> {
        let result = self
            .build()
            .execute(pool)
            .await
            .map_err(DatabaseError::QueryError)?;
        Ok(result.rows_affected())
    }

    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        let rows = self
            .build()
            .fetch_all(pool)
            .await
            .map_err(DatabaseError::QueryError)?;

        rows.iter()
            .map(|row| T::from_row(row).map_err(DatabaseError::QueryError))
            .collect()
    }

    pub async fn fetch_optional<T>(&self, pool: &PgPool) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        let row = self
            .build()
            .fetch_optional(pool)
            .await
            .map_err(DatabaseError::QueryError)?;

        row.map(|r| T::from_row(&r).map_err(DatabaseError::QueryError))
            .transpose()
    }

    /// Fetch a single scalar count, e.g. from a `SELECT COUNT(*)` statement
    pub async fn fetch_count(&self, pool: &PgPool) -> Result<i64> {
        let row = self
            .build()
            .fetch_one(pool)
            .await
            .map_err(DatabaseError::QueryError)?;

        row.try_get::<i64, _>(0).map_err(DatabaseError::QueryError)
    }
}

/// Escape LIKE/ILIKE wildcards in user-supplied text so it matches
/// literally. Postgres treats backslash as the default escape character.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_placeholder_index() {
        let mut query = SqlQuery::new("SELECT 1");
        assert_eq!(query.push(SqlParam::Int(7)), 1);
        assert_eq!(query.push(SqlParam::Text("x".to_string())), 2);
        assert_eq!(query.params.len(), 2);
    }

    #[test]
    fn params_compare_by_value() {
        let mut a = SqlQuery::new("SELECT $1");
        a.push(SqlParam::IdList(vec![1, 2, 3]));
        let mut b = SqlQuery::new("SELECT $1");
        b.push(SqlParam::IdList(vec![1, 2, 3]));
        assert_eq!(a, b);
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
