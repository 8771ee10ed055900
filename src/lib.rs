pub mod config;
pub mod error;
pub mod executor;
pub mod output;
pub mod query;
pub mod value;

pub use config::{InspectConfig, DEFAULT_DATABASE_URL, DEFAULT_TABLES};
pub use error::{InspectError, Result};
pub use executor::{
    run, run_session, PgClient, ResultRows, RowSource, RunReport, Runner, SectionStats, Session,
};
pub use output::{JsonLinesWriter, SpacedFormatter};
pub use query::{QueryDef, QueryValidator, ValidationResult, INTROSPECTION_QUERIES};
pub use value::Value;
