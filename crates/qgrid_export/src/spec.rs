//! Export configuration, request/outcome models and errors.

use std::path::{Path, PathBuf};

use qgrid_io_fs::WriteError;
use qgrid_io_xlsx::{SpecXlsxReport, SpecXlsxStyleOptions, XlsxExportError};
use qgrid_render::{EnumTextFormat, SpecCellScope, SpecRenderOptions, SpecResultBatch};
use serde::Deserialize;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region Config

/// Per-call configuration for rendering and exporting.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SpecExportConfig {
    /// Grid and text-export options.
    pub render: SpecRenderOptions,
    /// Spreadsheet styling options.
    pub xlsx: SpecXlsxStyleOptions,
}

impl SpecExportConfig {
    /// Parse a (possibly partial) JSON configuration; absent fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(text)?)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Formats

/// File export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumExportFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
    /// Styled spreadsheet.
    Xlsx,
}

impl EnumExportFormat {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Xlsx => "xlsx",
        }
    }

    /// Flat text format, `None` for spreadsheets.
    pub fn text_format(self) -> Option<EnumTextFormat> {
        match self {
            Self::Csv => Some(EnumTextFormat::Csv),
            Self::Tsv => Some(EnumTextFormat::Tsv),
            Self::Xlsx => None,
        }
    }

    /// Format named by the extension of `path` (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let c_ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match c_ext.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RequestAndOutcome

/// One file export.
#[derive(Debug, Clone, Copy)]
pub struct SpecExportRequest<'a> {
    /// Source results.
    pub batch: &'a SpecResultBatch,
    /// `(set index, scope)` pairs; `None` exports every set in full.
    pub scopes: Option<&'a [(usize, SpecCellScope)]>,
    /// Requested format.
    pub format: EnumExportFormat,
    /// Target path.
    pub path: &'a Path,
    /// Options.
    pub config: &'a SpecExportConfig,
}

/// What an export produced before the bytes were handed to the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportOutcome {
    /// Path actually written.
    pub path: PathBuf,
    /// Format actually written.
    pub format: EnumExportFormat,
    /// User-facing notice, set when the requested format was replaced.
    pub notice: Option<String>,
    /// Spreadsheet report for XLSX exports.
    pub xlsx_report: Option<SpecXlsxReport>,
    /// Sets left out of a text export.
    pub warnings: Vec<String>,
    /// Payload size.
    pub n_bytes: usize,
}

/// Serialized payload plus its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportPayload {
    /// Bytes to write.
    pub bytes: Vec<u8>,
    /// Export outcome.
    pub outcome: SpecExportOutcome,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Export failure.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to export.
    #[error("No results to export")]
    NoResults,
    /// Selection export without a selection.
    #[error("No selection")]
    NoSelection,
    /// The selection covers no data cell.
    #[error("No cells selected")]
    NoCellsSelected,
    /// Spreadsheet export failed.
    #[error(transparent)]
    Xlsx(#[from] XlsxExportError),
    /// File write failed.
    #[error(transparent)]
    Write(#[from] WriteError),
    /// Configuration could not be parsed.
    #[error("Invalid export configuration: {0}")]
    Config(#[from] serde_json::Error),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use qgrid_io_xlsx::EnumStyleCondition;
    use qgrid_render::EnumWrapMode;

    #[test]
    fn export_config_from_partial_json() {
        let config = SpecExportConfig::from_json_str(
            r##"{
                "render": {"wrap_mode": "word", "null_display": "<null>"},
                "xlsx": {"conditional_styles": [
                    {"columns": ["amount"], "condition": "negative",
                     "style": {"font_color": "#FF0000"}}
                ]}
            }"##,
        )
        .expect("config");

        assert_eq!(config.render.wrap_mode, EnumWrapMode::Word);
        assert_eq!(config.render.null_display, "<null>");
        assert!(config.render.include_headers);
        assert!(config.xlsx.auto_type_formatting);
        assert_eq!(config.xlsx.conditional_styles.len(), 1);
        assert_eq!(
            config.xlsx.conditional_styles[0].condition,
            Some(EnumStyleCondition::Negative)
        );
        assert!(!config.xlsx.style_presets.is_empty());
    }

    #[test]
    fn export_config_rejects_bad_json() {
        assert!(matches!(
            SpecExportConfig::from_json_str(r#"{"render": {"wrap_mode": "diagonal"}}"#),
            Err(ExportError::Config(_))
        ));
        assert_eq!(
            SpecExportConfig::from_json_str("{}").expect("empty"),
            SpecExportConfig::default()
        );
    }

    #[test]
    fn export_format_from_path_extension() {
        assert_eq!(
            EnumExportFormat::from_path(Path::new("/tmp/out.XLSX")),
            Some(EnumExportFormat::Xlsx)
        );
        assert_eq!(
            EnumExportFormat::from_path(Path::new("a.tab")),
            Some(EnumExportFormat::Tsv)
        );
        assert_eq!(EnumExportFormat::from_path(Path::new("a")), None);
        assert_eq!(EnumExportFormat::Tsv.text_format(), Some(EnumTextFormat::Tsv));
        assert_eq!(EnumExportFormat::Xlsx.text_format(), None);
    }
}
