//! `qgrid_render` v1:
//! Result-set grid rendering kernel.
//!
//! Modules:
//! - `conf`      : constants and border presets
//! - `spec`      : data model, options, rendered document, cell maps
//! - `util`      : pure text helpers
//! - `divider`   : divider template resolver
//! - `layout`    : tabular layout engine
//! - `selection` : selection-to-cell mapper
//! - `serialize` : CSV/TSV serializers
//! - `task`      : cooperative scheduling and batched render
pub mod conf;
pub mod divider;
pub mod layout;
pub mod selection;
pub mod serialize;
pub mod spec;
pub mod task;
pub mod util;

pub use conf::{
    C_BLOCK_LABEL_TEMPLATE_DEFAULT, C_EMPTY_RESULT_TEXT, C_NULL_DISPLAY_DEFAULT,
    N_RENDER_BATCH_SIZE_DEFAULT, SpecBorderChars, derive_border_chars,
};
pub use divider::{SpecDividerMetadata, format_duration, parse_divider_format};
pub use layout::{
    SpecRenderContext, SpecRenderedSet, compute_column_widths, render, render_batch,
    render_batch_with_context, render_result_set, wrap_cell_text,
};
pub use selection::{map_selection, map_selection_batch};
pub use serialize::{escape_csv_field, escape_tsv_field, serialize, serialize_scope};
pub use spec::{
    EnumBorderStyle, EnumCellValue, EnumRowSeparatorPolicy, EnumStyleTag, EnumTextFormat,
    EnumWrapMode, SpecCellMap, SpecCellScope, SpecColumn, SpecColumnSpan, SpecLine,
    SpecRenderOptions, SpecRenderedDocument, SpecResultBatch, SpecResultSet, SpecRowSpan,
    SpecSelectedCells, SpecSelectionBounds, SpecSpan, TypeRow,
};
pub use task::{
    CancelToken, EnumBatchedRenderOutcome, LocalScheduler, Scheduler, TaskSlot, TypeTask,
    render_batched,
};
pub use util::{derive_display_text, derive_export_text};
