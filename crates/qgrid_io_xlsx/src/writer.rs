//! `rust_xlsxwriter` workbook sink.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, XlsxError};

use crate::sink::WorkbookSink;
use crate::spec::{EnumSheetValue, SpecCellFormat, TypeStyleId, XlsxExportError};

/// Workbook sink buffering an in-memory `rust_xlsxwriter` workbook.
///
/// Nothing touches disk until [`WorkbookSink::save`].
pub struct XlsxWorkbookSink {
    workbook: Workbook,
    l_formats: Vec<Format>,
    n_sheets: usize,
}

impl Default for XlsxWorkbookSink {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWorkbookSink {
    /// Empty workbook.
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            l_formats: Vec::new(),
            n_sheets: 0,
        }
    }

    /// Serialize the workbook to `.xlsx` bytes without touching disk.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, XlsxExportError> {
        self.workbook.save_to_buffer().map_err(derive_xlsx_error)
    }

    fn format(&self, style: TypeStyleId) -> Result<&Format, XlsxExportError> {
        self.l_formats
            .get(style)
            .ok_or_else(|| XlsxExportError::Workbook(format!("unknown style handle: {style}")))
    }

    fn with_sheet<F>(&mut self, sheet: usize, f: F) -> Result<(), XlsxExportError>
    where
        F: FnOnce(&mut rust_xlsxwriter::Worksheet, &[Format]) -> Result<(), XlsxError>,
    {
        if sheet >= self.n_sheets {
            return Err(XlsxExportError::UnknownSheet(sheet));
        }
        let worksheet = self
            .workbook
            .worksheet_from_index(sheet)
            .map_err(derive_xlsx_error)?;
        f(worksheet, &self.l_formats).map_err(derive_xlsx_error)
    }
}

impl WorkbookSink for XlsxWorkbookSink {
    fn add_sheet(&mut self, name: &str) -> Result<usize, XlsxExportError> {
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(name).map_err(derive_xlsx_error)?;
        self.n_sheets += 1;
        Ok(self.n_sheets - 1)
    }

    fn create_style(&mut self, fmt: &SpecCellFormat) -> Result<TypeStyleId, XlsxExportError> {
        self.l_formats.push(derive_rust_xlsx_format(fmt));
        Ok(self.l_formats.len() - 1)
    }

    fn write_cell(
        &mut self,
        sheet: usize,
        row: usize,
        col: usize,
        value: &EnumSheetValue,
        style: TypeStyleId,
    ) -> Result<(), XlsxExportError> {
        self.format(style)?;
        let n_row = cast_row_num(row)?;
        let n_col = cast_col_num(col)?;
        self.with_sheet(sheet, |worksheet, l_formats| {
            let format = &l_formats[style];
            match value {
                EnumSheetValue::Blank => worksheet.write_blank(n_row, n_col, format)?,
                EnumSheetValue::String(val) => {
                    worksheet.write_string_with_format(n_row, n_col, val, format)?
                }
                EnumSheetValue::Number(val) => {
                    worksheet.write_number_with_format(n_row, n_col, *val, format)?
                }
                EnumSheetValue::Boolean(val) => {
                    worksheet.write_boolean_with_format(n_row, n_col, *val, format)?
                }
            };
            Ok(())
        })
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
        self.format(style)?;
        let n_row = cast_row_num(row)?;
        let n_col_first = cast_col_num(col_first)?;
        let n_col_last = cast_col_num(col_last)?;
        self.with_sheet(sheet, |worksheet, l_formats| {
            worksheet.merge_range(
                n_row,
                n_col_first,
                n_row,
                n_col_last,
                text,
                &l_formats[style],
            )?;
            Ok(())
        })
    }

    fn freeze_panes(
        &mut self,
        sheet: usize,
        row: usize,
        col: usize,
    ) -> Result<(), XlsxExportError> {
        let n_row = cast_row_num(row)?;
        let n_col = cast_col_num(col)?;
        self.with_sheet(sheet, |worksheet, _| {
            worksheet.set_freeze_panes(n_row, n_col)?;
            Ok(())
        })
    }

    fn set_auto_filter(
        &mut self,
        sheet: usize,
        row_first: usize,
        col_first: usize,
        row_last: usize,
        col_last: usize,
    ) -> Result<(), XlsxExportError> {
        let n_row_first = cast_row_num(row_first)?;
        let n_col_first = cast_col_num(col_first)?;
        let n_row_last = cast_row_num(row_last)?;
        let n_col_last = cast_col_num(col_last)?;
        self.with_sheet(sheet, |worksheet, _| {
            worksheet.autofilter(n_row_first, n_col_first, n_row_last, n_col_last)?;
            Ok(())
        })
    }

    fn set_column_width(
        &mut self,
        sheet: usize,
        col: usize,
        width: f64,
    ) -> Result<(), XlsxExportError> {
        let n_col = cast_col_num(col)?;
        self.with_sheet(sheet, |worksheet, _| {
            worksheet.set_column_width(n_col, width)?;
            Ok(())
        })
    }

    fn set_landscape(&mut self, sheet: usize) -> Result<(), XlsxExportError> {
        self.with_sheet(sheet, |worksheet, _| {
            worksheet.set_landscape();
            Ok(())
        })
    }

    fn save(&mut self, path: &Path) -> Result<(), XlsxExportError> {
        self.workbook.save(path).map_err(derive_xlsx_error)
    }
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_valign(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn derive_format_valign(valign: &str) -> Option<FormatAlign> {
    let value = valign.trim().to_ascii_lowercase();
    match value.as_str() {
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "center" | "vcenter" | "vertical_center" | "middle" => Some(FormatAlign::VerticalCenter),
        "justify" | "vjustify" => Some(FormatAlign::VerticalJustify),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxExportError> {
    u32::try_from(value)
        .map_err(|_| XlsxExportError::ExcelLimit(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxExportError> {
    u16::try_from(value)
        .map_err(|_| XlsxExportError::ExcelLimit(format!("column index overflow: {value}")))
}

fn derive_xlsx_error(err: XlsxError) -> XlsxExportError {
    XlsxExportError::Workbook(err.to_string())
}
