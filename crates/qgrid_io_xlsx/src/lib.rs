//! `qgrid_io_xlsx` v1:
//! Styled spreadsheet export kernel.
//!
//! Modules:
//! - `conf`   : constants, SQL type table and default presets
//! - `spec`   : style models, options, report and errors
//! - `util`   : pure helper functions
//! - `style`  : per-cell style resolution and memoization
//! - `sink`   : workbook capability trait and in-memory sink
//! - `export` : result batch to sheets
//! - `writer` : `rust_xlsxwriter` sink (feature `xlsx`)
pub mod conf;
pub mod export;
pub mod sink;
pub mod spec;
pub mod style;
pub mod util;
#[cfg(feature = "xlsx")]
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
pub use export::{export_spreadsheet, export_spreadsheet_scoped, export_spreadsheet_to_buffer};
pub use sink::{MemoryWorkbookSink, SpecMemorySheet, WorkbookSink, is_xlsx_available};
pub use spec::{
    EnumSheetValue, EnumStyleCondition, EnumTypeCategory, SpecAutofitCellsPolicy,
    SpecCellFormat, SpecSheetReport, SpecSheetStyle, SpecStyleRule, SpecTableStyle,
    SpecXlsxReport, SpecXlsxStyleOptions, TypeStyleId, XlsxExportError,
};
pub use style::{StyleCache, StyleResolver};
pub use util::{derive_type_category, normalize_sql_type, sanitize_sheet_name};
#[cfg(feature = "xlsx")]
pub use writer::XlsxWorkbookSink;
