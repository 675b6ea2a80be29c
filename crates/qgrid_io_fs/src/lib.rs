//! `qgrid_io_fs` v1:
//! Size-adaptive, cooperative file writer.
//!
//! Modules:
//! - `conf`   : size thresholds
//! - `spec`   : write states and errors
//! - `report` : write report model
//! - `host`   : filesystem capability trait
//! - `writer` : chunked writer state machine and scheduled driver
//! - `util`   : slice arithmetic

pub mod conf;
pub mod host;
pub mod report;
pub mod spec;
mod util;
pub mod writer;

pub use conf::{N_CHUNK_SIZE, N_SMALL_WRITE_MAX};
pub use host::{FileHost, StdFileHost};
pub use report::{ReportWrite, ReportWriteBuilder};
pub use spec::{EnumWriteState, EnumWriteStep, WriteError};
pub use writer::{ChunkedWriter, TypeProgressFn, write_async};
