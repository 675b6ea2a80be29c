//! CSV and TSV serializers over a cell scope.

use crate::spec::{EnumTextFormat, SpecCellScope, SpecColumn, SpecResultSet};
use crate::util::{collapse_line_breaks, derive_export_text};

/// Quote a CSV field when it holds a comma, a quote, a line break, or
/// leading/trailing whitespace. Internal quotes are doubled.
pub fn escape_csv_field(text: &str) -> String {
    let if_quote = text.contains([',', '"', '\n', '\r'])
        || text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace);
    if !if_quote {
        return text.to_string();
    }
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// TSV field: tabs and line breaks collapse to one space, no quoting.
pub fn escape_tsv_field(text: &str) -> String {
    collapse_line_breaks(text).replace('\t', " ")
}

fn escape_field(text: &str, format: EnumTextFormat) -> String {
    match format {
        EnumTextFormat::Csv => escape_csv_field(text),
        EnumTextFormat::Tsv => escape_tsv_field(text),
    }
}

fn derive_separator(format: EnumTextFormat) -> &'static str {
    match format {
        EnumTextFormat::Csv => ",",
        EnumTextFormat::Tsv => "\t",
    }
}

/// Serialize `rows` x `cols` of a result set.
///
/// Column ordinals resolve against [`SpecResultSet::derive_columns`]; unknown
/// ordinals are skipped. Lines are joined with `\n` without a trailing newline.
pub fn serialize(
    set: &SpecResultSet,
    rows: &[usize],
    cols: &[usize],
    format: EnumTextFormat,
    include_headers: bool,
) -> String {
    let l_columns_all = set.derive_columns();
    let l_columns: Vec<&SpecColumn> = cols.iter().filter_map(|n| l_columns_all.get(*n)).collect();
    let c_sep = derive_separator(format);

    let mut l_lines: Vec<String> = Vec::with_capacity(rows.len() + 1);
    if include_headers {
        l_lines.push(
            l_columns
                .iter()
                .map(|col| escape_field(&col.display_name, format))
                .collect::<Vec<_>>()
                .join(c_sep),
        );
    }
    for n_row in rows {
        l_lines.push(
            l_columns
                .iter()
                .map(|col| escape_field(&derive_export_text(set.cell(*n_row, &col.key)), format))
                .collect::<Vec<_>>()
                .join(c_sep),
        );
    }
    l_lines.join("\n")
}

/// Serialize the rows and columns named by `scope`.
pub fn serialize_scope(
    set: &SpecResultSet,
    scope: &SpecCellScope,
    format: EnumTextFormat,
    include_headers: bool,
) -> String {
    serialize(
        set,
        &scope.rows,
        &scope.cols,
        format,
        include_headers && scope.include_headers,
    )
}
