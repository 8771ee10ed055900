use super::decode::decode_row;
use super::source::{ResultRows, RowSource, Session};
use crate::config::InspectConfig;
use crate::error::{format_postgres_error, InspectError, Result};
use crate::query::QueryDef;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_postgres::config::Host;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, error, info, warn};

/// An open session. [`Session::close`] ends the connection task and waits for
/// it; dropping the handle without closing aborts the task instead.
pub struct PgClient {
    client: Client,
    connection: ConnectionTask,
    target: String,
}

/// The spawned connection driver. Aborted on drop unless taken first.
struct ConnectionTask(Option<JoinHandle<()>>);

impl ConnectionTask {
    fn take(&mut self) -> Option<JoinHandle<()>> {
        self.0.take()
    }
}

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        if let Some(task) = self.0.take() {
            task.abort();
        }
    }
}

impl PgClient {
    pub async fn connect(config: &InspectConfig) -> Result<Self> {
        let pg_config = config.pg_config()?;
        let target = describe_target(&pg_config);

        info!(target = %target, "connecting to PostgreSQL");

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            InspectError::Connection(format!(
                "Failed to connect to {}: {}",
                target,
                format_postgres_error(&e)
            ))
        })?;

        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        info!(target = %target, "PostgreSQL connection established");

        Ok(Self {
            client,
            connection: ConnectionTask(Some(connection)),
            target,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl RowSource for PgClient {
    #[tracing::instrument(skip(self, query, tables), fields(query = query.name))]
    async fn rows(&self, query: &QueryDef, tables: &[String]) -> Result<ResultRows> {
        let name = query.name;
        let tables = tables.to_vec();
        let params: [&(dyn ToSql + Sync); 1] = [&tables];

        let stream = self
            .client
            .query_raw(query.sql, params)
            .await
            .map_err(|e| InspectError::query(name, &e))?;

        debug!("statement accepted, streaming rows");

        Ok(stream
            .map(move |row| {
                let row = row.map_err(|e| InspectError::query(name, &e))?;
                decode_row(name, &row)
            })
            .boxed())
    }
}

#[async_trait]
impl Session for PgClient {
    async fn close(self) {
        let Self {
            client,
            mut connection,
            target,
        } = self;

        // Closing the request channel makes the driver send Terminate and exit.
        drop(client);
        if let Some(connection) = connection.take() {
            if let Err(e) = connection.await {
                warn!(target = %target, error = %e, "connection task did not shut down cleanly");
            }
        }
        debug!(target = %target, "PostgreSQL connection closed");
    }
}

/// `host:port/dbname`, without credentials.
fn describe_target(config: &Config) -> String {
    let host = config
        .get_hosts()
        .first()
        .map(|host| match host {
            Host::Tcp(name) => name.clone(),
            #[cfg(unix)]
            Host::Unix(path) => path.display().to_string(),
        })
        .unwrap_or_else(|| "localhost".to_string());
    let port = config.get_ports().first().copied().unwrap_or(5432);
    let dbname = config.get_dbname().unwrap_or("postgres");
    format!("{}:{}/{}", host, port, dbname)
}
