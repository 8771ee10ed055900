mod client;
mod decode;
mod runner;
mod source;

pub use client::PgClient;
pub use decode::decode_row;
pub use runner::{run, run_session, RunReport, Runner, SectionStats};
pub use source::{ResultRows, RowSource, Session};
