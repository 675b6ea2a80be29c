//! Facade constants.

/// Text between result sets in multi-set CSV/TSV output.
pub const C_SET_SEPARATOR: &str = "\n\n";

/// Notice attached when a spreadsheet export degrades to CSV.
pub const C_XLSX_FALLBACK_NOTICE: &str =
    "Spreadsheet export is not available in this build; exported CSV instead.";
