use std::cell::RefCell;
use std::rc::Rc;

use qgrid_export::{
    EnumExportFormat, SpecExportConfig, SpecExportRequest, export_batch_text, export_to_file,
    is_xlsx_available,
};
use qgrid_io_fs::{ReportWrite, StdFileHost, WriteError};
use qgrid_render::task::{LocalScheduler, TaskSlot};
use qgrid_render::{
    EnumCellValue, EnumStyleTag, EnumTextFormat, SpecColumn, SpecResultBatch, SpecResultSet,
    TypeRow, render,
};

fn people() -> SpecResultBatch {
    SpecResultBatch::new(vec![SpecResultSet::new(
        vec![
            SpecColumn::new("id", 0).with_sql_type("int"),
            SpecColumn::new("name", 1).with_sql_type("text"),
        ],
        vec![
            TypeRow::from([
                ("id".to_string(), EnumCellValue::from(1_i64)),
                ("name".to_string(), EnumCellValue::from("Alice")),
            ]),
            TypeRow::from([
                ("id".to_string(), EnumCellValue::from(2_i64)),
                ("name".to_string(), EnumCellValue::Null),
            ]),
        ],
    )])
}

#[test]
fn null_renders_as_text_and_exports_as_empty_field() {
    let batch = people();
    let config = SpecExportConfig::default();

    let (document, l_maps) = render(&batch, &config.render);
    let n_line = l_maps[0].rows[1].line_range.start;
    let line = &document.lines[n_line];
    assert!(line.text().contains("NULL"));
    assert!(
        line.spans
            .iter()
            .any(|span| span.tag == EnumStyleTag::Null && span.text.contains("NULL"))
    );

    assert_eq!(
        export_batch_text(&batch, EnumTextFormat::Csv, &config).expect("csv"),
        "id,name\n1,Alice\n2,"
    );
}

#[test]
fn csv_file_export_goes_through_the_writer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("people.csv");
    let batch = people();
    let config = SpecExportConfig::default();
    let scheduler = LocalScheduler::new();
    let slot = TaskSlot::new();
    let result: Rc<RefCell<Option<Result<ReportWrite, WriteError>>>> = Rc::default();

    let result_sink = Rc::clone(&result);
    let outcome = export_to_file(
        Rc::new(scheduler.clone()),
        &slot,
        Rc::new(StdFileHost),
        &SpecExportRequest {
            batch: &batch,
            scopes: None,
            format: EnumExportFormat::Csv,
            path: &path,
            config: &config,
        },
        None,
        move |res| *result_sink.borrow_mut() = Some(res),
    )
    .expect("export");
    assert_eq!(outcome.n_bytes, 18);
    assert_eq!(outcome.path, path);

    scheduler.run_until_idle();
    let report = result.borrow_mut().take().expect("completed").expect("ok");
    assert_eq!(report.cnt_bytes_written, 18);
    assert_eq!(
        std::fs::read_to_string(&path).expect("read"),
        "id,name\n1,Alice\n2,"
    );
}

#[test]
fn xlsx_file_export_writes_a_workbook_or_csv_fallback() {
    use std::path::Path;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("people.xlsx");
    let batch = people();
    let config = SpecExportConfig::default();
    let scheduler = LocalScheduler::new();
    let slot = TaskSlot::new();

    let outcome = export_to_file(
        Rc::new(scheduler.clone()),
        &slot,
        Rc::new(StdFileHost),
        &SpecExportRequest {
            batch: &batch,
            scopes: None,
            format: EnumExportFormat::from_path(Path::new("people.xlsx")).expect("format"),
            path: &path,
            config: &config,
        },
        None,
        |res| assert!(res.is_ok()),
    )
    .expect("export");

    scheduler.run_until_idle();
    let bytes = std::fs::read(&outcome.path).expect("read");
    assert_eq!(bytes.len(), outcome.n_bytes);
    if is_xlsx_available() {
        assert_eq!(outcome.format, EnumExportFormat::Xlsx);
        assert!(outcome.notice.is_none());
        assert!(bytes.starts_with(b"PK"));
    } else {
        assert_eq!(outcome.format, EnumExportFormat::Csv);
        assert_eq!(outcome.path, dir.path().join("people.csv"));
        assert!(outcome.notice.is_some());
        assert_eq!(bytes, b"id,name\n1,Alice\n2,");
    }
}
