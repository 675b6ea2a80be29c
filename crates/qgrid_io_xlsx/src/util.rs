//! Stateless helper utilities used by the spreadsheet exporter.

use std::collections::BTreeSet;

use qgrid_render::{EnumCellValue, derive_export_text};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    TUP_SQL_TYPE_CATEGORIES,
};
use crate::spec::{EnumSheetValue, EnumTypeCategory, XlsxExportError};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert a result value into the value written to the sheet.
///
/// NULL is written as `null_display` text; binary as `0x` hex text.
pub fn convert_cell_value(value: &EnumCellValue, null_display: &str) -> EnumSheetValue {
    match value {
        EnumCellValue::Null => {
            if null_display.is_empty() {
                EnumSheetValue::Blank
            } else {
                EnumSheetValue::String(null_display.to_string())
            }
        }
        EnumCellValue::Number(n) if n.is_finite() => EnumSheetValue::Number(*n),
        EnumCellValue::Boolean(b) => EnumSheetValue::Boolean(*b),
        _ => EnumSheetValue::String(derive_export_text(value)),
    }
}

/// Text the sheet will show for `value`, used for width estimation.
pub fn derive_sheet_text(value: &EnumSheetValue) -> String {
    match value {
        EnumSheetValue::Blank => String::new(),
        EnumSheetValue::String(s) => s.clone(),
        EnumSheetValue::Number(n) => qgrid_render::util::format_number(*n),
        EnumSheetValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TypeCategories

/// Lowercase, drop parenthesized arguments and collapse whitespace.
///
/// `DECIMAL(10, 2)` becomes `decimal`; `timestamp(3) with time zone` becomes
/// `timestamp with time zone`.
pub fn normalize_sql_type(sql_type: &str) -> String {
    let mut c_out = String::with_capacity(sql_type.len());
    let mut n_depth = 0usize;
    for ch in sql_type.chars() {
        match ch {
            '(' => n_depth += 1,
            ')' => n_depth = n_depth.saturating_sub(1),
            _ if n_depth == 0 => c_out.push(ch),
            _ => {}
        }
    }
    c_out
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Styling category of a SQL type, if it has one.
pub fn derive_type_category(sql_type: &str) -> Option<EnumTypeCategory> {
    let c_type = normalize_sql_type(sql_type);
    TUP_SQL_TYPE_CATEGORIES
        .iter()
        .find(|(c_name, _)| *c_name == c_type)
        .map(|(_, enum_category)| *enum_category)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Register `name` in `set_existing`, suffixing `__2`, `__3`, ... on collision.
///
/// Excel compares sheet names case-insensitively, so `set_existing` holds
/// lowercase names.
pub fn derive_unique_sheet_name(name: &str, set_existing: &mut BTreeSet<String>) -> String {
    if set_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 4))
        .collect();
    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if set_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

/// Fail when a table of `n_rows` (header rows included) by `n_cols` does not
/// fit one worksheet.
pub fn validate_excel_limits(n_rows: usize, n_cols: usize) -> Result<(), XlsxExportError> {
    if n_rows > N_NROWS_EXCEL_MAX {
        return Err(XlsxExportError::ExcelLimit(format!(
            "{n_rows} rows exceed the {N_NROWS_EXCEL_MAX}-row sheet limit"
        )));
    }
    if n_cols > N_NCOLS_EXCEL_MAX {
        return Err(XlsxExportError::ExcelLimit(format!(
            "{n_cols} columns exceed the {N_NCOLS_EXCEL_MAX}-column sheet limit"
        )));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Autofit

/// Estimate displayed width units of one string.
///
/// Non-ASCII characters count 1.6 units to approximate wide glyphs.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    qgrid_render::util::split_logical_lines(s)
        .into_iter()
        .map(|line| {
            let n_ascii = line.chars().filter(|chr| chr.is_ascii()).count();
            let n_non_ascii = line.chars().count().saturating_sub(n_ascii);
            n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
        })
        .max()
        .unwrap_or(0)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
