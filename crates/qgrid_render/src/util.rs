//! Stateless text helpers shared by layout, divider and serializers.

use crate::conf::N_TAB_EXPANSION;
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region ValueText

/// Format a number the way the grid and exports show it.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

/// Text of a value for export; NULL becomes the empty string.
pub fn derive_export_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::Null => String::new(),
        EnumCellValue::Text(s) => s.clone(),
        EnumCellValue::Number(n) => format_number(*n),
        EnumCellValue::Boolean(b) => b.to_string(),
        EnumCellValue::Binary(bytes) => format!("0x{}", hex::encode(bytes)),
    }
}

/// Text of a value for the on-screen grid.
///
/// NULL shows `null_display`; tabs are expanded so one logical character never
/// renders wider than it measures.
pub fn derive_display_text(value: &EnumCellValue, null_display: &str) -> String {
    let c_text = match value {
        EnumCellValue::Null => null_display.to_string(),
        _ => derive_export_text(value),
    };
    expand_tabs(&c_text)
}

/// Text of a column name for the header row: one line, tabs expanded.
pub fn derive_header_text(display_name: &str) -> String {
    expand_tabs(&collapse_line_breaks(display_name))
}

/// Replace each tab with spaces.
pub fn expand_tabs(text: &str) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    text.replace('\t', &" ".repeat(N_TAB_EXPANSION))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LineBreaks

/// Split on `\r\n`, `\n` and `\r`.
pub fn split_logical_lines(text: &str) -> Vec<&str> {
    let mut l_lines = Vec::new();
    let mut n_start = 0;
    let bytes = text.as_bytes();
    let mut n_idx = 0;
    while n_idx < bytes.len() {
        match bytes[n_idx] {
            b'\r' => {
                l_lines.push(&text[n_start..n_idx]);
                if bytes.get(n_idx + 1) == Some(&b'\n') {
                    n_idx += 1;
                }
                n_start = n_idx + 1;
            }
            b'\n' => {
                l_lines.push(&text[n_start..n_idx]);
                n_start = n_idx + 1;
            }
            _ => {}
        }
        n_idx += 1;
    }
    l_lines.push(&text[n_start..]);
    l_lines
}

/// Replace every line-break variant with one space.
pub fn collapse_line_breaks(text: &str) -> String {
    split_logical_lines(text).join(" ")
}

/// Whether `text` contains any line break.
pub fn has_line_break(text: &str) -> bool {
    text.contains(['\n', '\r'])
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Measuring

/// Width of `text` in characters.
pub fn count_chars(text: &str) -> usize {
    text.chars().count()
}

/// Width of the longest logical line.
pub fn measure_longest_line(text: &str) -> usize {
    split_logical_lines(text)
        .into_iter()
        .map(count_chars)
        .max()
        .unwrap_or(0)
}

/// Decimal digit count of `n` (at least 1).
pub fn count_digits(n: usize) -> usize {
    let mut n_digits = 1;
    let mut n_rest = n / 10;
    while n_rest > 0 {
        n_digits += 1;
        n_rest /= 10;
    }
    n_digits
}

/// First `width` characters of `text`.
pub fn take_chars(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Pad `text` with spaces to `width` characters.
pub fn pad_to_width(text: &str, width: usize, if_align_right: bool) -> String {
    let n_fill = width.saturating_sub(count_chars(text));
    if if_align_right {
        format!("{}{text}", " ".repeat(n_fill))
    } else {
        format!("{text}{}", " ".repeat(n_fill))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_logical_lines_handles_every_break_variant() {
        assert_eq!(split_logical_lines("a\r\nb\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_logical_lines(""), vec![""]);
        assert_eq!(split_logical_lines("x\n"), vec!["x", ""]);
    }

    #[test]
    fn display_text_expands_tabs_and_shows_null() {
        assert_eq!(
            derive_display_text(&EnumCellValue::text("a\tb"), "NULL"),
            "a    b"
        );
        assert_eq!(derive_display_text(&EnumCellValue::Null, "<null>"), "<null>");
        assert_eq!(derive_export_text(&EnumCellValue::Null), "");
    }

    #[test]
    fn numbers_and_binary_render_compactly() {
        assert_eq!(derive_export_text(&EnumCellValue::Number(1.0)), "1");
        assert_eq!(derive_export_text(&EnumCellValue::Number(-0.0)), "0");
        assert_eq!(derive_export_text(&EnumCellValue::Number(2.5)), "2.5");
        assert_eq!(
            derive_export_text(&EnumCellValue::Binary(vec![0xde, 0xad])),
            "0xdead"
        );
    }

    #[test]
    fn count_digits_matches_decimal_length() {
        assert_eq!(count_digits(0), 1);
        assert_eq!(count_digits(9), 1);
        assert_eq!(count_digits(10), 2);
        assert_eq!(count_digits(12_345), 5);
    }
}
