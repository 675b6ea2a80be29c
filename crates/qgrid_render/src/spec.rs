//! Result-set data model, render options, rendered document and cell maps.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::time::Duration;

use serde::Deserialize;

use crate::conf::{
    C_BLOCK_LABEL_TEMPLATE_DEFAULT, C_NULL_DISPLAY_DEFAULT, N_RENDER_BATCH_SIZE_DEFAULT,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// One cell value as delivered by the query layer.
///
/// `Null` is distinct from `Text(String::new())`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum EnumCellValue {
    /// SQL NULL.
    #[default]
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Raw bytes.
    Binary(Vec<u8>),
}

static NULL_VALUE: EnumCellValue = EnumCellValue::Null;

impl EnumCellValue {
    /// Whether the value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value; numeric-looking text counts.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text convenience constructor.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for EnumCellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<EnumCellValue>> From<Option<T>> for EnumCellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ResultSet

/// Column metadata of one result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumn {
    /// Row lookup key.
    pub key: String,
    /// Header text; may differ from `key`.
    pub display_name: String,
    /// Position reported by the driver; columns are ordered by it.
    pub ordinal_index: usize,
    /// Driver-reported SQL type name.
    pub sql_type: Option<String>,
}

impl SpecColumn {
    /// Column whose display name equals its key.
    pub fn new(key: impl Into<String>, ordinal_index: usize) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            key,
            ordinal_index,
            sql_type: None,
        }
    }

    /// Attach a SQL type name.
    pub fn with_sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    /// Override the header text.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// One row: column key to value. Missing keys read as NULL.
pub type TypeRow = BTreeMap<String, EnumCellValue>;

/// One tabular result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecResultSet {
    /// Column metadata; empty when the driver reported none.
    pub columns: Vec<SpecColumn>,
    /// Rows in natural result order.
    pub rows: Vec<TypeRow>,
    /// Statement execution time.
    pub execution_time: Option<Duration>,
    /// Label of the logical block that produced this set.
    pub block_label: Option<String>,
    /// Error reported for the owning block.
    pub block_error: Option<String>,
}

impl SpecResultSet {
    /// Build a set from columns and rows.
    pub fn new(columns: Vec<SpecColumn>, rows: Vec<TypeRow>) -> Self {
        Self {
            columns,
            rows,
            ..Default::default()
        }
    }

    /// Attach a block label.
    pub fn with_block_label(mut self, label: impl Into<String>) -> Self {
        self.block_label = Some(label.into());
        self
    }

    /// Attach an execution time.
    pub fn with_execution_time(mut self, execution_time: Duration) -> Self {
        self.execution_time = Some(execution_time);
        self
    }

    /// Ordered columns used for layout and export.
    ///
    /// With metadata present, columns are sorted by `ordinal_index`. Without it,
    /// the union of all row keys is used in lexicographic key order.
    pub fn derive_columns(&self) -> Vec<SpecColumn> {
        if !self.columns.is_empty() {
            let mut l_cols = self.columns.clone();
            l_cols.sort_by_key(|col| col.ordinal_index);
            return l_cols;
        }

        let set_keys: BTreeSet<&String> = self.rows.iter().flat_map(|row| row.keys()).collect();
        set_keys
            .into_iter()
            .enumerate()
            .map(|(n_idx, key)| SpecColumn::new(key.clone(), n_idx))
            .collect()
    }

    /// Value at `row_idx` for `key`; NULL when absent.
    pub fn cell(&self, row_idx: usize, key: &str) -> &EnumCellValue {
        self.rows
            .get(row_idx)
            .and_then(|row| row.get(key))
            .unwrap_or(&NULL_VALUE)
    }

    /// Scope covering every row and column.
    pub fn full_scope(&self) -> SpecCellScope {
        SpecCellScope {
            rows: (0..self.rows.len()).collect(),
            cols: (0..self.derive_columns().len()).collect(),
            include_headers: true,
        }
    }
}

/// Result sets of one execution, in execution order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecResultBatch {
    /// Ordered result sets.
    pub sets: Vec<SpecResultSet>,
}

impl SpecResultBatch {
    /// Wrap result sets into a batch.
    pub fn new(sets: Vec<SpecResultSet>) -> Self {
        Self { sets }
    }

    /// Whether the batch holds no result set.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sum of known execution times.
    pub fn total_time(&self) -> Option<Duration> {
        self.sets
            .iter()
            .filter_map(|set| set.execution_time)
            .reduce(|a, b| a + b)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RenderOptions

/// Wrapping strategy for cells wider than their column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumWrapMode {
    /// One line per cell, cut at the column width.
    #[default]
    Truncate,
    /// Wrap at word boundaries.
    Word,
    /// Hard-wrap every `width` characters.
    Char,
}

/// When to draw separator rules between data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumRowSeparatorPolicy {
    /// Separators for `word`/`char` wrapping only.
    #[default]
    Auto,
    /// Always draw separators.
    Always,
    /// Never draw separators.
    Never,
}

/// Grid border style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumBorderStyle {
    /// Single-line box drawing.
    #[default]
    Single,
    /// Double-line box drawing.
    Double,
    /// Single-line box with rounded corners.
    Rounded,
    /// `+`, `-` and `|`.
    Ascii,
    /// No box; blank column separators and dashed inner rules.
    None,
}

/// Options for grid rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecRenderOptions {
    /// Wrapping strategy.
    pub wrap_mode: EnumWrapMode,
    /// Keep embedded line breaks when wrapping.
    pub preserve_newlines: bool,
    /// Column width cap; `None` or `Some(0)` means uncapped.
    pub max_col_width: Option<usize>,
    /// Text shown for NULL cells.
    pub null_display: String,
    /// Row separator policy.
    pub row_separator: EnumRowSeparatorPolicy,
    /// Render (and export) the header row.
    pub include_headers: bool,
    /// Render the row-number gutter.
    pub show_row_numbers: bool,
    /// Border style.
    pub border_style: EnumBorderStyle,
    /// Divider template inserted between result sets.
    pub divider_template: Option<String>,
    /// Template inserted when the owning block changes.
    pub block_label_template: String,
    /// Lines delivered per batched-render step.
    pub batch_size: usize,
}

impl Default for SpecRenderOptions {
    fn default() -> Self {
        Self {
            wrap_mode: EnumWrapMode::Truncate,
            preserve_newlines: true,
            max_col_width: None,
            null_display: C_NULL_DISPLAY_DEFAULT.to_string(),
            row_separator: EnumRowSeparatorPolicy::Auto,
            include_headers: true,
            show_row_numbers: false,
            border_style: EnumBorderStyle::Single,
            divider_template: None,
            block_label_template: C_BLOCK_LABEL_TEMPLATE_DEFAULT.to_string(),
            batch_size: N_RENDER_BATCH_SIZE_DEFAULT,
        }
    }
}

impl SpecRenderOptions {
    /// Column cap with `Some(0)` folded into `None`.
    pub fn effective_max_col_width(&self) -> Option<usize> {
        self.max_col_width.filter(|n| *n > 0)
    }

    /// Whether separators are drawn between data rows.
    pub fn should_draw_row_separators(&self) -> bool {
        match self.row_separator {
            EnumRowSeparatorPolicy::Always => true,
            EnumRowSeparatorPolicy::Never => false,
            EnumRowSeparatorPolicy::Auto => self.wrap_mode != EnumWrapMode::Truncate,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RenderedDocument

/// Semantic style of one span; the host maps tags to its own highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumStyleTag {
    /// Unstyled text.
    Plain,
    /// Border and rule characters.
    Border,
    /// Header cell.
    Header,
    /// Row-number gutter.
    RowNumber,
    /// NULL cell.
    Null,
    /// Text cell.
    Text,
    /// Numeric cell.
    Number,
    /// Boolean cell.
    Boolean,
    /// Binary cell.
    Binary,
    /// Divider line between result sets.
    Divider,
    /// Block-label separator line.
    BlockLabel,
    /// Informational message.
    Info,
    /// Error message.
    Error,
}

/// Styled run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSpan {
    /// Literal text.
    pub text: String,
    /// Style tag.
    pub tag: EnumStyleTag,
}

impl SpecSpan {
    /// Build a span.
    pub fn new(text: impl Into<String>, tag: EnumStyleTag) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }
}

/// One document line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecLine {
    /// Ordered spans.
    pub spans: Vec<SpecSpan>,
}

impl SpecLine {
    /// Line made of one span.
    pub fn single(text: impl Into<String>, tag: EnumStyleTag) -> Self {
        Self {
            spans: vec![SpecSpan::new(text, tag)],
        }
    }

    /// Concatenated text.
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Width in characters.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|span| span.text.chars().count()).sum()
    }
}

/// Rendered grid document of a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRenderedDocument {
    /// Ordered lines.
    pub lines: Vec<SpecLine>,
}

impl SpecRenderedDocument {
    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no line.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Plain text of every line.
    pub fn line_texts(&self) -> Vec<String> {
        self.lines.iter().map(SpecLine::text).collect()
    }

    /// Whole document joined with line feeds.
    pub fn to_plain_text(&self) -> String {
        self.line_texts().join("\n")
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellMap

/// Document columns covered by one logical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnSpan {
    /// Position of the column in the ordered column list.
    pub ordinal: usize,
    /// Half-open character range, padding included, borders excluded.
    pub col_range: Range<usize>,
}

/// Document lines covered by one logical row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRowSpan {
    /// Index of the row in the result set.
    pub ordinal: usize,
    /// Half-open line range.
    pub line_range: Range<usize>,
}

/// Geometry of one rendered result set in document coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCellMap {
    /// Header line range, absent when headers are hidden.
    pub header_span: Option<Range<usize>>,
    /// Row-number gutter character range.
    pub gutter_span: Option<Range<usize>>,
    /// Column spans in column order.
    pub columns: Vec<SpecColumnSpan>,
    /// Row spans in row order.
    pub rows: Vec<SpecRowSpan>,
    /// Every line occupied by this result set.
    pub line_range: Range<usize>,
    /// Rendered grid width in characters.
    pub result_width: usize,
}

impl SpecCellMap {
    /// Move every line range down by `n_offset` lines.
    pub fn shift_lines(&mut self, n_offset: usize) {
        let shift = |range: &Range<usize>| (range.start + n_offset)..(range.end + n_offset);
        self.header_span = self.header_span.as_ref().map(shift);
        for row in &mut self.rows {
            row.line_range = shift(&row.line_range);
        }
        self.line_range = shift(&self.line_range);
    }

    /// Content width of each column, padding excluded.
    pub fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| col.col_range.len().saturating_sub(2))
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Selection

/// Rectangular selection in document coordinates.
///
/// Lines are inclusive on both ends; columns are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSelectionBounds {
    /// First selected line.
    pub start_line: usize,
    /// First selected character column.
    pub start_col: usize,
    /// Last selected line (inclusive).
    pub end_line: usize,
    /// One past the last selected character column.
    pub end_col: usize,
}

impl SpecSelectionBounds {
    /// Build normalized bounds from two corners.
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line: start_line.min(end_line),
            start_col: start_col.min(end_col),
            end_line: start_line.max(end_line),
            end_col: start_col.max(end_col),
        }
    }

    /// Whole-line selection of `start_line..=end_line`.
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self::new(start_line, 0, end_line, usize::MAX)
    }
}

/// Logical cells recovered from a selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSelectedCells {
    /// Selected row indices.
    pub rows: BTreeSet<usize>,
    /// Selected column ordinals.
    pub cols: BTreeSet<usize>,
    /// Whether the header line is inside the selection.
    pub includes_header: bool,
}

impl SpecSelectedCells {
    /// Whether no data cell is selected.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    /// Convert into an explicit export scope.
    pub fn into_scope(self) -> SpecCellScope {
        SpecCellScope {
            rows: self.rows.into_iter().collect(),
            cols: self.cols.into_iter().collect(),
            include_headers: self.includes_header,
        }
    }
}

/// Explicit row and column selection handed to serializers/exporters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCellScope {
    /// Row indices, in output order.
    pub rows: Vec<usize>,
    /// Column ordinals, in output order.
    pub cols: Vec<usize>,
    /// Whether the selection touched the header line.
    pub include_headers: bool,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TextExport

/// Flat text export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumTextFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
}

impl EnumTextFormat {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_columns_orders_by_ordinal_index() {
        let set = SpecResultSet::new(
            vec![SpecColumn::new("b", 2), SpecColumn::new("a", 1)],
            vec![],
        );
        let l_keys: Vec<String> = set.derive_columns().into_iter().map(|c| c.key).collect();
        assert_eq!(l_keys, vec!["a", "b"]);
    }

    #[test]
    fn derive_columns_infers_sorted_union_without_metadata() {
        let mut row_1 = TypeRow::new();
        row_1.insert("zeta".to_string(), EnumCellValue::from(1_i64));
        let mut row_2 = TypeRow::new();
        row_2.insert("alpha".to_string(), EnumCellValue::from("x"));
        row_2.insert("zeta".to_string(), EnumCellValue::Null);

        let set = SpecResultSet::new(vec![], vec![row_1, row_2]);
        let l_cols = set.derive_columns();
        assert_eq!(l_cols.len(), 2);
        assert_eq!(l_cols[0].key, "alpha");
        assert_eq!(l_cols[0].ordinal_index, 0);
        assert_eq!(l_cols[1].display_name, "zeta");
    }

    #[test]
    fn missing_cell_reads_as_null() {
        let set = SpecResultSet::new(vec![SpecColumn::new("a", 0)], vec![TypeRow::new()]);
        assert!(set.cell(0, "a").is_null());
        assert!(set.cell(5, "a").is_null());
    }

    #[test]
    fn selection_bounds_normalize_corners() {
        let bounds = SpecSelectionBounds::new(7, 12, 3, 4);
        assert_eq!(bounds.start_line, 3);
        assert_eq!(bounds.end_line, 7);
        assert_eq!(bounds.start_col, 4);
        assert_eq!(bounds.end_col, 12);
    }

    #[test]
    fn render_options_deserialize_partial_json() {
        let options: SpecRenderOptions =
            serde_json::from_str(r#"{"wrap_mode": "word", "max_col_width": 0}"#)
                .expect("parse options");
        assert_eq!(options.wrap_mode, EnumWrapMode::Word);
        assert_eq!(options.effective_max_col_width(), None);
        assert!(options.should_draw_row_separators());
        assert_eq!(options.null_display, "NULL");
    }

    #[test]
    fn cell_value_deserializes_untagged() {
        let l_values: Vec<EnumCellValue> =
            serde_json::from_str(r#"[null, true, -1.5, 3, "x"]"#).expect("parse values");
        assert_eq!(
            l_values,
            vec![
                EnumCellValue::Null,
                EnumCellValue::Boolean(true),
                EnumCellValue::Number(-1.5),
                EnumCellValue::Number(3.0),
                EnumCellValue::Text("x".to_string()),
            ]
        );
    }
}
