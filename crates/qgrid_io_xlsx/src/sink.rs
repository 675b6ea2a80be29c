//! Workbook capability boundary.
//!
//! The exporter only talks to a [`WorkbookSink`]; the real backend lives in
//! [`crate::writer`] behind the `xlsx` feature.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::spec::{EnumSheetValue, SpecCellFormat, TypeStyleId, XlsxExportError};

/// Spreadsheet-writing capability.
///
/// Sheets and styles are addressed by the indices the sink hands out.
pub trait WorkbookSink {
    /// Append a sheet named `name`; returns its index.
    fn add_sheet(&mut self, name: &str) -> Result<usize, XlsxExportError>;

    /// Register a style; returns its handle.
    fn create_style(&mut self, fmt: &SpecCellFormat) -> Result<TypeStyleId, XlsxExportError>;

    /// Write one styled cell.
    fn write_cell(
        &mut self,
        sheet: usize,
        row: usize,
        col: usize,
        value: &EnumSheetValue,
        style: TypeStyleId,
    ) -> Result<(), XlsxExportError>;

    /// Merge `col_first..=col_last` on `row` and write `text` into it.
    fn merge_range(
        &mut self,
        sheet: usize,
        row: usize,
        col_first: usize,
        col_last: usize,
        text: &str,
        style: TypeStyleId,
    ) -> Result<(), XlsxExportError>;

    /// Freeze everything above `row` and left of `col`.
    fn freeze_panes(&mut self, sheet: usize, row: usize, col: usize)
    -> Result<(), XlsxExportError>;

    /// Auto-filter over the inclusive rectangle.
    fn set_auto_filter(
        &mut self,
        sheet: usize,
        row_first: usize,
        col_first: usize,
        row_last: usize,
        col_last: usize,
    ) -> Result<(), XlsxExportError>;

    /// Set one column width in character units.
    fn set_column_width(
        &mut self,
        sheet: usize,
        col: usize,
        width: f64,
    ) -> Result<(), XlsxExportError>;

    /// Switch the page orientation to landscape.
    fn set_landscape(&mut self, sheet: usize) -> Result<(), XlsxExportError>;

    /// Persist the workbook.
    fn save(&mut self, path: &Path) -> Result<(), XlsxExportError>;
}

/// Whether the `rust_xlsxwriter` backend is compiled in.
pub fn is_xlsx_available() -> bool {
    cfg!(feature = "xlsx")
}

////////////////////////////////////////////////////////////////////////////////
// #region MemoryWorkbookSink

/// Recorded sheet of a [`MemoryWorkbookSink`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecMemorySheet {
    /// Sheet name.
    pub name: String,
    /// `(row, col)` to value and style handle.
    pub cells: BTreeMap<(usize, usize), (EnumSheetValue, TypeStyleId)>,
    /// Merged ranges as `(row, col_first, col_last)`.
    pub merges: Vec<(usize, usize, usize)>,
    /// Freeze position.
    pub freeze: Option<(usize, usize)>,
    /// Auto-filter rectangle.
    pub auto_filter: Option<(usize, usize, usize, usize)>,
    /// Column widths.
    pub widths: BTreeMap<usize, f64>,
    /// Landscape orientation.
    pub landscape: bool,
}

impl SpecMemorySheet {
    /// Value at `(row, col)`.
    pub fn value(&self, row: usize, col: usize) -> Option<&EnumSheetValue> {
        self.cells.get(&(row, col)).map(|(value, _)| value)
    }
}

/// Workbook sink that records every call in memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryWorkbookSink {
    /// Sheets in creation order.
    pub sheets: Vec<SpecMemorySheet>,
    /// Registered styles, indexed by handle.
    pub styles: Vec<SpecCellFormat>,
    /// Paths passed to `save`.
    pub saved_to: Vec<PathBuf>,
}

impl MemoryWorkbookSink {
    /// Empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Style registered under `handle`.
    pub fn style(&self, handle: TypeStyleId) -> Option<&SpecCellFormat> {
        self.styles.get(handle)
    }

    /// Style of the cell at `(row, col)` on `sheet`.
    pub fn cell_style(&self, sheet: usize, row: usize, col: usize) -> Option<&SpecCellFormat> {
        let (_, n_style) = self.sheets.get(sheet)?.cells.get(&(row, col))?;
        self.style(*n_style)
    }

    fn sheet_mut(&mut self, sheet: usize) -> Result<&mut SpecMemorySheet, XlsxExportError> {
        self.sheets
            .get_mut(sheet)
            .ok_or(XlsxExportError::UnknownSheet(sheet))
    }
}

impl WorkbookSink for MemoryWorkbookSink {
    fn add_sheet(&mut self, name: &str) -> Result<usize, XlsxExportError> {
        self.sheets.push(SpecMemorySheet {
            name: name.to_string(),
            ..Default::default()
        });
        Ok(self.sheets.len() - 1)
    }

    fn create_style(&mut self, fmt: &SpecCellFormat) -> Result<TypeStyleId, XlsxExportError> {
        self.styles.push(fmt.clone());
        Ok(self.styles.len() - 1)
    }

    fn write_cell(
        &mut self,
        sheet: usize,
        row: usize,
        col: usize,
        value: &EnumSheetValue,
        style: TypeStyleId,
    ) -> Result<(), XlsxExportError> {
        self.sheet_mut(sheet)?
            .cells
            .insert((row, col), (value.clone(), style));
        Ok(())
    }

    fn merge_range(
        &mut self,
        sheet: usize,
        row: usize,
        col_first: usize,
        col_last: usize,
        text: &str,
        style: TypeStyleId,
    ) -> Result<(), XlsxExportError> {
        let sheet = self.sheet_mut(sheet)?;
        sheet.merges.push((row, col_first, col_last));
        sheet.cells.insert(
            (row, col_first),
            (EnumSheetValue::String(text.to_string()), style),
        );
        Ok(())
    }

    fn freeze_panes(
        &mut self,
        sheet: usize,
        row: usize,
        col: usize,
    ) -> Result<(), XlsxExportError> {
        self.sheet_mut(sheet)?.freeze = Some((row, col));
        Ok(())
    }

    fn set_auto_filter(
        &mut self,
        sheet: usize,
        row_first: usize,
        col_first: usize,
        row_last: usize,
        col_last: usize,
    ) -> Result<(), XlsxExportError> {
        self.sheet_mut(sheet)?.auto_filter = Some((row_first, col_first, row_last, col_last));
        Ok(())
    }

    fn set_column_width(
        &mut self,
        sheet: usize,
        col: usize,
        width: f64,
    ) -> Result<(), XlsxExportError> {
        self.sheet_mut(sheet)?.widths.insert(col, width);
        Ok(())
    }

    fn set_landscape(&mut self, sheet: usize) -> Result<(), XlsxExportError> {
        self.sheet_mut(sheet)?.landscape = true;
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), XlsxExportError> {
        self.saved_to.push(path.to_path_buf());
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
