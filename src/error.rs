use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query '{query}' failed: {message}")]
    Query { query: String, message: String },

    #[error("Query '{query}' returned an undecodable value in column '{column}': {message}")]
    Decode {
        query: String,
        column: String,
        message: String,
    },

    #[error("Invalid query definition: {0}")]
    InvalidQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl InspectError {
    pub fn query(query: impl Into<String>, error: &tokio_postgres::Error) -> Self {
        Self::Query {
            query: query.into(),
            message: format_postgres_error(error),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;

/// Renders a driver error with the server's SQLSTATE, detail and hint when the
/// failure came from the database rather than the transport.
pub fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail() {
        if !detail.trim().is_empty() {
            message.push_str(&format!(" (detail: {})", detail));
        }
    }

    if let Some(hint) = db_error.hint() {
        if !hint.trim().is_empty() {
            message.push_str(&format!(" (hint: {})", hint));
        }
    }

    match db_error.code().code() {
        "42501" => format!("permission denied: {}", message),
        "42P01" => format!("undefined table: {}", message),
        "42601" => format!("syntax error: {}", message),
        code => format!("{} (code: {})", message, code),
    }
}
