mod catalog;
mod validator;

pub use catalog::{INDEXES, INTROSPECTION_QUERIES, POLICIES, TRIGGERS};
pub use validator::{QueryValidator, ValidationResult};

/// A fixed, read-only statement and the columns it is declared to return.
///
/// Every statement takes the target table names as `$1` (`text[]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDef {
    pub name: &'static str,
    pub sql: &'static str,
    pub columns: &'static [&'static str],
}

impl QueryDef {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn header(&self) -> String {
        format!("## {}", self.name)
    }
}
