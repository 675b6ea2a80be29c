//! `qgrid_export` v1:
//! Export facade over the render, spreadsheet and writer kernels.
//!
//! Modules:
//! - `conf`   : facade constants
//! - `spec`   : export configuration, request/outcome models, errors
//! - `export` : selection/batch text export and file export

pub mod conf;
pub mod export;
pub mod spec;

pub use conf::{C_SET_SEPARATOR, C_XLSX_FALLBACK_NOTICE};
pub use export::{
    build_export_payload, derive_export_format, derive_selection_scopes, export_batch_text,
    export_selection_text, export_to_file,
};
pub use qgrid_io_xlsx::is_xlsx_available;
pub use spec::{
    EnumExportFormat, ExportError, SpecExportConfig, SpecExportOutcome, SpecExportPayload,
    SpecExportRequest,
};
