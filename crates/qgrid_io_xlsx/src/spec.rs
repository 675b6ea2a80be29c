//! Spreadsheet style models, options, reports and errors.

use std::collections::BTreeMap;
use std::fmt;

use qgrid_render::EnumCellValue;
use serde::Deserialize;
use thiserror::Error;

use crate::conf::{
    derive_default_header_style, derive_default_null_style, derive_default_style_presets,
    derive_default_table_base, derive_default_table_even_row, derive_default_type_styles,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormat

/// Cell style definition.
///
/// Every field is optional; [`SpecCellFormat::merge`] overlays the right side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,

    /// Named preset expanded underneath this definition.
    pub preset: Option<String>,
}

/// Scalar value for generic format-map representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCellFormatValue {
    /// String format property value.
    String(String),
    /// Integer format property value.
    Integer(i64),
    /// Boolean format property value.
    Boolean(bool),
}

impl fmt::Display for EnumCellFormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(val) => write!(f, "{val}"),
            Self::Integer(val) => write!(f, "{val}"),
            Self::Boolean(val) => write!(f, "{val}"),
        }
    }
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
            preset: other.preset.clone().or_else(|| self.preset.clone()),
        }
    }

    /// Whether no visual property is set.
    pub fn is_empty(&self) -> bool {
        self.to_xlsxwriter().is_empty()
    }

    /// Convert format into key-value map compatible with xlsxwriter properties.
    ///
    /// `preset` is a reference, not a property, and is left out.
    pub fn to_xlsxwriter(&self) -> BTreeMap<String, EnumCellFormatValue> {
        let mut dict_fmt = BTreeMap::new();

        let l_strings = [
            ("font_name", &self.font_name),
            ("align", &self.align),
            ("valign", &self.valign),
            ("num_format", &self.num_format),
            ("bg_color", &self.bg_color),
            ("font_color", &self.font_color),
        ];
        for (c_key, value) in l_strings {
            if let Some(value) = value {
                dict_fmt.insert(
                    c_key.to_string(),
                    EnumCellFormatValue::String(value.clone()),
                );
            }
        }

        for (c_key, value) in [("font_size", self.font_size), ("border", self.border)] {
            if let Some(value) = value {
                dict_fmt.insert(c_key.to_string(), EnumCellFormatValue::Integer(value));
            }
        }

        let l_flags = [
            ("bold", self.bold),
            ("italic", self.italic),
            ("underline", self.underline),
            ("text_wrap", self.text_wrap),
        ];
        for (c_key, value) in l_flags {
            if let Some(value) = value {
                dict_fmt.insert(c_key.to_string(), EnumCellFormatValue::Boolean(value));
            }
        }

        dict_fmt
    }

    /// Canonical memoization key: sorted `key=value` pairs joined by `;`.
    pub fn derive_style_key(&self) -> String {
        self.to_xlsxwriter()
            .iter()
            .map(|(c_key, value)| format!("{c_key}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleRules

/// Category a SQL type normalizes to for type-based styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumTypeCategory {
    /// Whole numbers.
    Integer,
    /// Fractional numbers.
    Decimal,
    /// Currency amounts.
    Money,
    /// Calendar dates.
    Date,
    /// Date plus time of day.
    Datetime,
    /// Time of day.
    Time,
    /// Booleans and bits.
    Boolean,
}

impl EnumTypeCategory {
    /// Key used in `type_styles`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Money => "money",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Time => "time",
            Self::Boolean => "boolean",
        }
    }
}

/// Value predicate of a conditional style rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumStyleCondition {
    /// Value is NULL.
    Null,
    /// Value is empty text.
    Empty,
    /// Value is not NULL and its text is not empty.
    Nonempty,
    /// Numeric value below zero.
    Negative,
    /// Numeric value above zero.
    Positive,
    /// Numeric value equal to zero.
    Zero,
}

/// Conditional style rule.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SpecStyleRule {
    /// Column keys the rule is limited to; all columns when `None`.
    pub columns: Option<Vec<String>>,
    /// Value predicate.
    pub condition: Option<EnumStyleCondition>,
    /// Exact value the cell must equal.
    #[serde(rename = "match")]
    pub match_value: Option<EnumCellValue>,
    /// Regular expression the cell text must match.
    pub pattern: Option<String>,
    /// Style applied when the rule holds.
    pub style: SpecCellFormat,
    /// Preset expanded underneath `style`.
    pub preset: Option<String>,
}

/// Alternating-row table styling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecTableStyle {
    /// Style of every data cell.
    pub base: SpecCellFormat,
    /// Overlay for odd data rows (1-based).
    pub odd_row: Option<SpecCellFormat>,
    /// Overlay for even data rows (1-based).
    pub even_row: Option<SpecCellFormat>,
    /// Overlay for NULL cells.
    pub null_style: SpecCellFormat,
}

impl Default for SpecTableStyle {
    fn default() -> Self {
        Self {
            base: derive_default_table_base(),
            odd_row: None,
            even_row: Some(derive_default_table_even_row()),
            null_style: derive_default_null_style(),
        }
    }
}

/// Autofit policy for column width inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Per-sheet settings applied after all cells are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecSheetStyle {
    /// Freeze rows up to and including the header.
    pub freeze_header: bool,
    /// Auto-filter over header and data.
    pub auto_filter: bool,
    /// Landscape page orientation.
    pub landscape: bool,
    /// Fit column widths to content.
    pub autofit_columns: bool,
    /// Autofit lower bound.
    pub width_min: usize,
    /// Autofit upper bound.
    pub width_max: usize,
    /// Write the sheet label as a merged title row above the table.
    pub title_row: bool,
}

impl Default for SpecSheetStyle {
    fn default() -> Self {
        let policy = SpecAutofitCellsPolicy::default();
        Self {
            freeze_header: true,
            auto_filter: true,
            landscape: false,
            autofit_columns: true,
            width_min: policy.width_cell_min,
            width_max: policy.width_cell_max,
            title_row: false,
        }
    }
}

impl SpecSheetStyle {
    /// Autofit policy derived from the configured bounds.
    pub fn autofit_policy(&self) -> SpecAutofitCellsPolicy {
        SpecAutofitCellsPolicy {
            width_cell_min: self.width_min,
            width_cell_max: self.width_max,
            ..Default::default()
        }
    }
}

/// Spreadsheet styling options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpecXlsxStyleOptions {
    /// Apply `type_styles` by SQL type category.
    pub auto_type_formatting: bool,
    /// Style per type category name (`integer`, `decimal`, ...).
    pub type_styles: BTreeMap<String, SpecCellFormat>,
    /// Style per column key; keys containing `*` are globs.
    pub column_styles: BTreeMap<String, SpecCellFormat>,
    /// Conditional rules in evaluation order.
    pub conditional_styles: Vec<SpecStyleRule>,
    /// Named presets referenced by `preset`.
    pub style_presets: BTreeMap<String, SpecCellFormat>,
    /// Header cell style.
    pub header_style: SpecCellFormat,
    /// Alternating-row styling.
    pub table_style: SpecTableStyle,
    /// Sheet settings.
    pub sheet_style: SpecSheetStyle,
}

impl Default for SpecXlsxStyleOptions {
    fn default() -> Self {
        Self {
            auto_type_formatting: true,
            type_styles: derive_default_type_styles(),
            column_styles: BTreeMap::new(),
            conditional_styles: Vec::new(),
            style_presets: derive_default_style_presets(),
            header_style: derive_default_header_style(),
            table_style: SpecTableStyle::default(),
            sheet_style: SpecSheetStyle::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetValues

/// Value handed to a workbook sink.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumSheetValue {
    /// Styled empty cell.
    Blank,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

/// Handle of a style registered with a workbook sink.
pub type TypeStyleId = usize;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Reports

/// One written sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Index of the source result set in the batch.
    pub set_idx: usize,
    /// Data rows written.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
}

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheets produced by the export call.
    pub sheets: Vec<SpecSheetReport>,
    /// Distinct styles registered with the sink.
    pub n_styles: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Spreadsheet export failure.
#[derive(Debug, Error)]
pub enum XlsxExportError {
    /// The workbook backend rejected an operation.
    #[error("xlsx write error: {0}")]
    Workbook(String),
    /// A wildcard column key is not a valid glob.
    #[error("invalid column pattern {pattern:?}: {message}")]
    InvalidGlob {
        /// Offending key.
        pattern: String,
        /// Parser message.
        message: String,
    },
    /// A conditional rule pattern is not a valid regular expression.
    #[error("invalid regular expression {pattern:?}: {message}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },
    /// A style references a preset that does not exist.
    #[error("unknown style preset: {0:?}")]
    UnknownPreset(String),
    /// The table does not fit one worksheet.
    #[error("Excel limit overflow: {0}")]
    ExcelLimit(String),
    /// A sheet index does not exist in the sink.
    #[error("unknown sheet index: {0}")]
    UnknownSheet(usize),
    /// Spreadsheet support was not compiled in.
    #[error("spreadsheet export is unavailable in this build")]
    Unavailable,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
