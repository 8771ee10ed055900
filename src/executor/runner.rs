use super::client::PgClient;
use super::source::{RowSource, Session};
use crate::config::InspectConfig;
use crate::error::{InspectError, Result};
use crate::output::JsonLinesWriter;
use crate::query::{QueryDef, INTROSPECTION_QUERIES};
use futures::TryStreamExt;
use std::io::Write;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct SectionStats {
    pub query_name: String,
    pub rows: usize,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub sections: Vec<SectionStats>,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.sections.iter().map(|s| s.rows).sum()
    }
}

/// Runs catalog queries one after another against a single source. The first
/// failure aborts the run; sections already written stay written.
pub struct Runner<'a, S: RowSource + ?Sized> {
    source: &'a S,
    queries: &'a [QueryDef],
    tables: &'a [String],
}

impl<'a, S: RowSource + ?Sized> Runner<'a, S> {
    pub fn new(source: &'a S, tables: &'a [String]) -> Self {
        Self {
            source,
            queries: &INTROSPECTION_QUERIES,
            tables,
        }
    }

    pub fn with_queries(mut self, queries: &'a [QueryDef]) -> Self {
        self.queries = queries;
        self
    }

    pub fn queries(&self) -> &[QueryDef] {
        self.queries
    }

    pub async fn run<W: Write>(&self, writer: &mut JsonLinesWriter<W>) -> Result<RunReport> {
        let mut report = RunReport::default();
        for query in self.queries {
            let stats = self.run_query(query, writer).await?;
            report.sections.push(stats);
        }
        Ok(report)
    }

    async fn run_query<W: Write>(
        &self,
        query: &QueryDef,
        writer: &mut JsonLinesWriter<W>,
    ) -> Result<SectionStats> {
        let mut rows = self.source.rows(query, self.tables).await?;
        writer.header(query)?;

        let mut count = 0;
        let outcome = loop {
            match rows.try_next().await {
                Ok(Some(row)) => {
                    if row.len() != query.width() {
                        break Err(InspectError::InvalidQuery(format!(
                            "{}: row has {} columns, {} declared",
                            query.name,
                            row.len(),
                            query.width()
                        )));
                    }
                    if let Err(e) = writer.row(&row) {
                        break Err(e);
                    }
                    count += 1;
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        // Rows printed before a failure must reach the terminal.
        writer.flush()?;
        outcome?;

        debug!(query = query.name, rows = count, "section complete");
        Ok(SectionStats {
            query_name: query.name.to_string(),
            rows: count,
        })
    }
}

/// Connects and prints every section.
#[tracing::instrument(skip_all, fields(tables = ?config.tables))]
pub async fn run<W: Write>(config: &InspectConfig, out: W) -> Result<RunReport> {
    let client = PgClient::connect(config).await?;
    run_session(client, &config.tables, out).await
}

/// Prints every section through an open session, then closes it whether or
/// not a query failed.
pub async fn run_session<S: Session, W: Write>(
    session: S,
    tables: &[String],
    out: W,
) -> Result<RunReport> {
    let mut writer = JsonLinesWriter::new(out);

    let result = Runner::new(&session, tables).run(&mut writer).await;
    session.close().await;

    if let Ok(report) = &result {
        info!(
            sections = report.sections.len(),
            rows = report.total_rows(),
            "introspection complete"
        );
    }
    result
}
