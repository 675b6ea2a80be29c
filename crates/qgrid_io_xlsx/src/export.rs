//! Spreadsheet export over a [`WorkbookSink`].

use std::collections::BTreeSet;

use qgrid_render::{SpecCellScope, SpecColumn, SpecResultBatch, SpecResultSet};

use crate::conf::{C_SHEET_NAME_PREFIX_DEFAULT, N_WIDTH_EXCEL_COLUMN_MAX};
use crate::sink::WorkbookSink;
use crate::spec::{
    EnumSheetValue, SpecSheetReport, SpecXlsxReport, SpecXlsxStyleOptions, XlsxExportError,
};
use crate::style::{StyleCache, StyleResolver};
use crate::util::{
    convert_cell_value, derive_sheet_text, derive_unique_sheet_name,
    estimate_unicode_string_width, sanitize_sheet_name, validate_excel_limits,
};

/// Export every result set of `batch`, one sheet each, headers included.
pub fn export_spreadsheet<S: WorkbookSink + ?Sized>(
    batch: &SpecResultBatch,
    options: &SpecXlsxStyleOptions,
    null_display: &str,
    sink: &mut S,
) -> Result<SpecXlsxReport, XlsxExportError> {
    let l_scopes: Vec<(usize, SpecCellScope)> = batch
        .sets
        .iter()
        .enumerate()
        .map(|(n_idx, set)| (n_idx, set.full_scope()))
        .collect();
    export_spreadsheet_scoped(batch, &l_scopes, options, null_display, sink)
}

/// Export the given `(set index, scope)` pairs, one sheet each.
///
/// Sets carrying a block error and out-of-range indices are skipped with a
/// warning. The sink is not saved.
pub fn export_spreadsheet_scoped<S: WorkbookSink + ?Sized>(
    batch: &SpecResultBatch,
    scopes: &[(usize, SpecCellScope)],
    options: &SpecXlsxStyleOptions,
    null_display: &str,
    sink: &mut S,
) -> Result<SpecXlsxReport, XlsxExportError> {
    let resolver = StyleResolver::new(options)?;
    let mut cache = StyleCache::new();
    let mut report = SpecXlsxReport::default();
    let mut set_sheet_names = BTreeSet::new();

    for (n_set_idx, scope) in scopes {
        let Some(set) = batch.sets.get(*n_set_idx) else {
            report.warn(format!("Result set {} does not exist; skipped.", n_set_idx + 1));
            continue;
        };
        if let Some(c_error) = &set.block_error {
            report.warn(format!(
                "Result set {} failed and was skipped: {c_error}",
                n_set_idx + 1
            ));
            continue;
        }

        let c_label = set
            .block_label
            .clone()
            .unwrap_or_else(|| format!("{C_SHEET_NAME_PREFIX_DEFAULT} {}", n_set_idx + 1));
        let c_sheet_name = derive_unique_sheet_name(
            &sanitize_sheet_name(&c_label, "_"),
            &mut set_sheet_names,
        );

        let sheet_report = write_sheet(
            SpecSheetJob {
                set,
                n_set_idx: *n_set_idx,
                scope,
                c_label: &c_label,
                c_sheet_name,
                null_display,
                options,
            },
            &resolver,
            &mut cache,
            sink,
        )?;
        tracing::debug!(
            sheet = %sheet_report.sheet_name,
            n_rows = sheet_report.n_rows,
            n_cols = sheet_report.n_cols,
            "wrote sheet"
        );
        report.sheets.push(sheet_report);
    }

    report.n_styles = cache.len();
    tracing::info!(
        n_sheets = report.sheets.len(),
        n_styles = report.n_styles,
        n_style_hits = cache.hits(),
        "spreadsheet export finished"
    );
    Ok(report)
}

/// Export to in-memory `.xlsx` bytes through the `rust_xlsxwriter` backend.
///
/// Returns `Ok(None)` when the backend is not compiled in, matching
/// [`crate::is_xlsx_available`].
#[cfg(feature = "xlsx")]
pub fn export_spreadsheet_to_buffer(
    batch: &SpecResultBatch,
    scopes: &[(usize, SpecCellScope)],
    options: &SpecXlsxStyleOptions,
    null_display: &str,
) -> Result<Option<(Vec<u8>, SpecXlsxReport)>, XlsxExportError> {
    let mut sink = crate::writer::XlsxWorkbookSink::new();
    let report = export_spreadsheet_scoped(batch, scopes, options, null_display, &mut sink)?;
    Ok(Some((sink.save_to_buffer()?, report)))
}

/// Export to in-memory `.xlsx` bytes; always `Ok(None)` without the `xlsx` feature.
#[cfg(not(feature = "xlsx"))]
pub fn export_spreadsheet_to_buffer(
    _batch: &SpecResultBatch,
    _scopes: &[(usize, SpecCellScope)],
    _options: &SpecXlsxStyleOptions,
    _null_display: &str,
) -> Result<Option<(Vec<u8>, SpecXlsxReport)>, XlsxExportError> {
    Ok(None)
}

struct SpecSheetJob<'a> {
    set: &'a SpecResultSet,
    n_set_idx: usize,
    scope: &'a SpecCellScope,
    c_label: &'a str,
    c_sheet_name: String,
    null_display: &'a str,
    options: &'a SpecXlsxStyleOptions,
}

fn write_sheet<S: WorkbookSink + ?Sized>(
    job: SpecSheetJob<'_>,
    resolver: &StyleResolver<'_>,
    cache: &mut StyleCache,
    sink: &mut S,
) -> Result<SpecSheetReport, XlsxExportError> {
    let SpecSheetJob {
        set,
        n_set_idx,
        scope,
        c_label,
        c_sheet_name,
        null_display,
        options,
    } = job;
    let sheet_style = &options.sheet_style;

    let l_columns_all = set.derive_columns();
    let l_columns: Vec<&SpecColumn> = scope
        .cols
        .iter()
        .filter_map(|n| l_columns_all.get(*n))
        .collect();
    let l_rows: Vec<usize> = scope
        .rows
        .iter()
        .copied()
        .filter(|n| *n < set.rows.len())
        .collect();
    let n_cols = l_columns.len();

    let if_title = sheet_style.title_row && n_cols > 0;
    let if_header = scope.include_headers && n_cols > 0;
    let n_rows_total = usize::from(if_title) + usize::from(if_header) + l_rows.len();
    validate_excel_limits(n_rows_total, n_cols)?;

    let n_sheet = sink.add_sheet(&c_sheet_name)?;
    let mut l_widths = vec![0usize; n_cols];
    let mut n_row_cursor = 0usize;

    if if_title {
        let n_style = cache.get_or_create(resolver.header_style(), sink)?;
        if n_cols > 1 {
            sink.merge_range(n_sheet, 0, 0, n_cols - 1, c_label, n_style)?;
        } else {
            sink.write_cell(
                n_sheet,
                0,
                0,
                &EnumSheetValue::String(c_label.to_string()),
                n_style,
            )?;
        }
        n_row_cursor += 1;
    }

    let n_row_header = n_row_cursor;
    if if_header {
        let n_style = cache.get_or_create(resolver.header_style(), sink)?;
        for (n_col, column) in l_columns.iter().enumerate() {
            l_widths[n_col] = estimate_unicode_string_width(&column.display_name);
            sink.write_cell(
                n_sheet,
                n_row_cursor,
                n_col,
                &EnumSheetValue::String(column.display_name.clone()),
                n_style,
            )?;
        }
        n_row_cursor += 1;
    }

    for (n_pos, n_row) in l_rows.iter().enumerate() {
        for (n_col, column) in l_columns.iter().enumerate() {
            let value = set.cell(*n_row, &column.key);
            let fmt = resolver.resolve_cell_style(column, value, n_pos + 1);
            let n_style = cache.get_or_create(&fmt, sink)?;
            let sheet_value = convert_cell_value(value, null_display);
            l_widths[n_col] =
                l_widths[n_col].max(estimate_unicode_string_width(&derive_sheet_text(&sheet_value)));
            sink.write_cell(n_sheet, n_row_cursor, n_col, &sheet_value, n_style)?;
        }
        n_row_cursor += 1;
    }

    if sheet_style.freeze_header && if_header {
        sink.freeze_panes(n_sheet, n_row_header + 1, 0)?;
    }
    if sheet_style.auto_filter && if_header {
        sink.set_auto_filter(
            n_sheet,
            n_row_header,
            0,
            n_row_cursor.saturating_sub(1).max(n_row_header),
            n_cols - 1,
        )?;
    }
    if sheet_style.landscape {
        sink.set_landscape(n_sheet)?;
    }
    if sheet_style.autofit_columns {
        let policy = sheet_style.autofit_policy();
        let n_min = usize::max(1, policy.width_cell_min);
        let n_max = usize::min(
            N_WIDTH_EXCEL_COLUMN_MAX,
            usize::max(n_min, policy.width_cell_max),
        );
        for (n_col, n_width) in l_widths.iter().enumerate() {
            let n_width_final = usize::min(
                n_max,
                usize::max(n_min, n_width + policy.width_cell_padding),
            );
            sink.set_column_width(n_sheet, n_col, n_width_final as f64)?;
        }
    }

    Ok(SpecSheetReport {
        sheet_name: c_sheet_name,
        set_idx: n_set_idx,
        n_rows: l_rows.len(),
        n_cols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryWorkbookSink;
    use crate::spec::{EnumStyleCondition, SpecStyleRule};
    use qgrid_render::{EnumCellValue, TypeRow};

    fn ledger() -> SpecResultSet {
        let l_rows = [(1_i64, -12.5), (2, 40.0), (3, 0.0)]
            .into_iter()
            .map(|(n_id, n_amount)| {
                TypeRow::from([
                    ("id".to_string(), EnumCellValue::from(n_id)),
                    ("amount".to_string(), EnumCellValue::from(n_amount)),
                ])
            })
            .chain(std::iter::once(TypeRow::from([(
                "id".to_string(),
                EnumCellValue::from(4_i64),
            )])))
            .collect();
        SpecResultSet::new(
            vec![
                SpecColumn::new("id", 0).with_sql_type("INTEGER"),
                SpecColumn::new("amount", 1).with_sql_type("NUMERIC(10,2)"),
            ],
            l_rows,
        )
    }

    fn negative_red() -> SpecXlsxStyleOptions {
        SpecXlsxStyleOptions {
            conditional_styles: vec![SpecStyleRule {
                columns: Some(vec!["amount".to_string()]),
                condition: Some(EnumStyleCondition::Negative),
                style: crate::spec::SpecCellFormat {
                    font_color: Some("#FF0000".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn exports_header_data_and_sheet_settings() {
        let batch = SpecResultBatch::new(vec![ledger()]);
        let mut sink = MemoryWorkbookSink::new();
        let report =
            export_spreadsheet(&batch, &negative_red(), "NULL", &mut sink).expect("export");

        assert_eq!(report.sheets.len(), 1);
        assert_eq!(report.sheets[0].sheet_name, "Result 1");
        assert_eq!(report.sheets[0].n_rows, 4);

        let sheet = &sink.sheets[0];
        assert_eq!(
            sheet.value(0, 1),
            Some(&EnumSheetValue::String("amount".to_string()))
        );
        assert_eq!(sheet.value(1, 1), Some(&EnumSheetValue::Number(-12.5)));
        assert_eq!(
            sheet.value(4, 1),
            Some(&EnumSheetValue::String("NULL".to_string()))
        );
        assert_eq!(sheet.freeze, Some((1, 0)));
        assert_eq!(sheet.auto_filter, Some((0, 0, 4, 1)));
        assert_eq!(sheet.widths.get(&0), Some(&8.0));

        let fmt_negative = sink.cell_style(0, 1, 1).expect("style");
        assert_eq!(fmt_negative.num_format.as_deref(), Some("0.00"));
        assert_eq!(fmt_negative.font_color.as_deref(), Some("#FF0000"));
        let fmt_positive = sink.cell_style(0, 2, 1).expect("style");
        assert_eq!(fmt_positive.num_format.as_deref(), Some("0.00"));
        assert_eq!(fmt_positive.font_color, None);
        let fmt_null = sink.cell_style(0, 4, 1).expect("style");
        assert_eq!(fmt_null.italic, Some(true));
        assert_eq!(fmt_null.num_format, None);
    }

    #[test]
    fn identical_styles_share_one_handle() {
        let batch = SpecResultBatch::new(vec![ledger()]);
        let mut sink = MemoryWorkbookSink::new();
        let report =
            export_spreadsheet(&batch, &negative_red(), "NULL", &mut sink).expect("export");
        let sheet = &sink.sheets[0];
        let (_, n_style_row_1) = sheet.cells[&(1, 0)];
        let (_, n_style_row_3) = sheet.cells[&(3, 0)];
        assert_eq!(n_style_row_1, n_style_row_3);
        assert_eq!(report.n_styles, sink.styles.len());
        let set_keys: BTreeSet<String> =
            sink.styles.iter().map(|fmt| fmt.derive_style_key()).collect();
        assert_eq!(set_keys.len(), sink.styles.len());
    }

    #[test]
    fn scoped_export_names_sheets_and_skips_errors() {
        let mut set_failed = ledger();
        set_failed.block_error = Some("boom".to_string());
        let batch = SpecResultBatch::new(vec![
            ledger().with_block_label("ledger/2024"),
            ledger().with_block_label("ledger/2024"),
            set_failed,
        ]);
        let scope = SpecCellScope {
            rows: vec![1],
            cols: vec![1],
            include_headers: false,
        };
        let l_scopes = vec![(0, scope.clone()), (1, scope.clone()), (2, scope)];
        let options = SpecXlsxStyleOptions {
            sheet_style: crate::spec::SpecSheetStyle {
                title_row: true,
                landscape: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut sink = MemoryWorkbookSink::new();
        let report = export_spreadsheet_scoped(&batch, &l_scopes, &options, "NULL", &mut sink)
            .expect("export");

        assert_eq!(report.sheets.len(), 2);
        assert_eq!(report.sheets[0].sheet_name, "ledger_2024");
        assert_eq!(report.sheets[1].sheet_name, "ledger_2024__2");
        assert_eq!(report.warnings.len(), 1);

        let sheet = &sink.sheets[0];
        assert_eq!(
            sheet.value(0, 0),
            Some(&EnumSheetValue::String("ledger/2024".to_string()))
        );
        assert_eq!(sheet.value(1, 0), Some(&EnumSheetValue::Number(40.0)));
        assert_eq!(sheet.freeze, None);
        assert!(sheet.landscape);
        assert!(sheet.merges.is_empty());
    }

    #[test]
    fn title_row_merges_across_columns() {
        let batch = SpecResultBatch::new(vec![ledger().with_block_label("Totals")]);
        let options = SpecXlsxStyleOptions {
            sheet_style: crate::spec::SpecSheetStyle {
                title_row: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut sink = MemoryWorkbookSink::new();
        export_spreadsheet(&batch, &options, "NULL", &mut sink).expect("export");
        let sheet = &sink.sheets[0];
        assert_eq!(sheet.merges, vec![(0, 0, 1)]);
        assert_eq!(
            sheet.value(1, 0),
            Some(&EnumSheetValue::String("id".to_string()))
        );
        assert_eq!(sheet.freeze, Some((2, 0)));
        assert_eq!(sheet.auto_filter, Some((1, 0, 5, 1)));
    }

    #[test]
    fn buffer_export_follows_backend_availability() {
        let batch = SpecResultBatch::new(vec![ledger()]);
        let l_scopes = vec![(0, batch.sets[0].full_scope())];
        let result = export_spreadsheet_to_buffer(&batch, &l_scopes, &negative_red(), "NULL")
            .expect("export");

        assert_eq!(result.is_some(), crate::is_xlsx_available());
        if let Some((bytes, report)) = result {
            assert!(bytes.starts_with(b"PK"));
            assert_eq!(report.sheets.len(), 1);
            assert_eq!(report.sheets[0].n_rows, 4);
        }
    }
}
