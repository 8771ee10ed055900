use crate::error::Result;
use crate::query::QueryDef;
use crate::value::Value;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Decoded rows of one statement, in server order. Single pass.
pub type ResultRows = BoxStream<'static, Result<Vec<Value>>>;

/// Something that can execute a catalog query against the target tables.
///
/// Resolves once the statement has been accepted; rows then arrive lazily.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn rows(&self, query: &QueryDef, tables: &[String]) -> Result<ResultRows>;
}

/// An open connection that owns its release. `close` consumes the session.
#[async_trait]
pub trait Session: RowSource {
    async fn close(self);
}
