use chrono::{DateTime, Utc};
use sqlx::{Postgres, postgres::PgArguments, query::Query};
use uuid::Uuid;

// SQL parameter that will be bound to query
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParameter {
    Text(String),
    Integer(i32),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl SqlParameter {
    /// Bind to sqlx query
    pub fn bind_to_query<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParameter::Text(s) => query.bind(s),
            SqlParameter::Integer(i) => query.bind(i),
            SqlParameter::Float(f) => query.bind(f),
            SqlParameter::Boolean(b) => query.bind(b),
            SqlParameter::Uuid(u) => query.bind(u),
            SqlParameter::Timestamp(t) => query.bind(t),
        }
    }
}

/// Binds all parameters in order.
pub fn bind_all<'q>(
    sql: &'q str,
    params: Vec<SqlParameter>,
) -> Query<'q, Postgres, PgArguments> {
    params
        .into_iter()
        .fold(sqlx::query(sql), |query, param| param.bind_to_query(query))
}

impl From<&str> for SqlParameter {
    fn from(value: &str) -> Self {
        SqlParameter::Text(value.to_string())
    }
}

impl From<String> for SqlParameter {
    fn from(value: String) -> Self {
        SqlParameter::Text(value)
    }
}

impl From<i32> for SqlParameter {
    fn from(value: i32) -> Self {
        SqlParameter::Integer(value)
    }
}

impl From<f64> for SqlParameter {
    fn from(value: f64) -> Self {
        SqlParameter::Float(value)
    }
}

impl From<bool> for SqlParameter {
    fn from(value: bool) -> Self {
        SqlParameter::Boolean(value)
    }
}

impl From<Uuid> for SqlParameter {
    fn from(value: Uuid) -> Self {
        SqlParameter::Uuid(value)
    }
}

impl From<DateTime<Utc>> for SqlParameter {
    fn from(value: DateTime<Utc>) -> Self {
        SqlParameter::Timestamp(value)
    }
}
