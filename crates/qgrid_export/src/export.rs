//! Selection and batch export pipelines.

use std::path::Path;
use std::rc::Rc;

use qgrid_io_fs::{FileHost, ReportWrite, TypeProgressFn, WriteError, write_async};
use qgrid_io_xlsx::{export_spreadsheet_to_buffer, is_xlsx_available};
use qgrid_render::task::{Scheduler, TaskSlot};
use qgrid_render::{
    EnumTextFormat, SpecCellMap, SpecCellScope, SpecResultBatch, SpecSelectionBounds,
    map_selection_batch, serialize_scope,
};

use crate::conf::{C_SET_SEPARATOR, C_XLSX_FALLBACK_NOTICE};
use crate::spec::{
    EnumExportFormat, ExportError, SpecExportConfig, SpecExportOutcome, SpecExportPayload,
    SpecExportRequest,
};

////////////////////////////////////////////////////////////////////////////////
// #region Scopes

/// Map a selection over the rendered batch into `(set index, scope)` pairs.
pub fn derive_selection_scopes(
    cell_maps: &[SpecCellMap],
    bounds: Option<&SpecSelectionBounds>,
) -> Result<Vec<(usize, SpecCellScope)>, ExportError> {
    let Some(bounds) = bounds else {
        return Err(ExportError::NoSelection);
    };
    let l_scopes: Vec<(usize, SpecCellScope)> = map_selection_batch(cell_maps, bounds)
        .into_iter()
        .map(|(n_idx, selected)| (n_idx, selected.into_scope()))
        .collect();
    if l_scopes.is_empty() {
        return Err(ExportError::NoCellsSelected);
    }
    Ok(l_scopes)
}

fn derive_full_scopes(batch: &SpecResultBatch) -> Vec<(usize, SpecCellScope)> {
    batch
        .sets
        .iter()
        .enumerate()
        .map(|(n_idx, set)| (n_idx, set.full_scope()))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Text

fn serialize_scopes(
    batch: &SpecResultBatch,
    scopes: &[(usize, SpecCellScope)],
    format: EnumTextFormat,
    config: &SpecExportConfig,
    warnings: &mut Vec<String>,
) -> String {
    let mut l_parts: Vec<String> = Vec::with_capacity(scopes.len());
    for (n_idx, scope) in scopes {
        let Some(set) = batch.sets.get(*n_idx) else {
            warnings.push(format!("Result set {} does not exist; skipped.", n_idx + 1));
            continue;
        };
        if let Some(c_error) = &set.block_error {
            warnings.push(format!(
                "Result set {} failed and was skipped: {c_error}",
                n_idx + 1
            ));
            continue;
        }
        l_parts.push(serialize_scope(
            set,
            scope,
            format,
            config.render.include_headers,
        ));
    }
    l_parts.join(C_SET_SEPARATOR)
}

/// Serialize the cells under `bounds` as CSV or TSV.
///
/// Each touched result set contributes its selected rows and columns; the
/// header line is emitted only when the selection covers it.
pub fn export_selection_text(
    batch: &SpecResultBatch,
    cell_maps: &[SpecCellMap],
    bounds: Option<&SpecSelectionBounds>,
    format: EnumTextFormat,
    config: &SpecExportConfig,
) -> Result<String, ExportError> {
    if batch.is_empty() {
        return Err(ExportError::NoResults);
    }
    let l_scopes = derive_selection_scopes(cell_maps, bounds)?;
    let mut l_warnings = Vec::new();
    let c_text = serialize_scopes(batch, &l_scopes, format, config, &mut l_warnings);
    for c_warning in &l_warnings {
        tracing::warn!("{c_warning}");
    }
    Ok(c_text)
}

/// Serialize every result set of `batch` as CSV or TSV.
pub fn export_batch_text(
    batch: &SpecResultBatch,
    format: EnumTextFormat,
    config: &SpecExportConfig,
) -> Result<String, ExportError> {
    if batch.is_empty() {
        return Err(ExportError::NoResults);
    }
    let mut l_warnings = Vec::new();
    let c_text = serialize_scopes(
        batch,
        &derive_full_scopes(batch),
        format,
        config,
        &mut l_warnings,
    );
    for c_warning in &l_warnings {
        tracing::warn!("{c_warning}");
    }
    Ok(c_text)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region File

/// Serialize a request into the bytes that [`export_to_file`] writes.
///
/// A spreadsheet request degrades to CSV next to the requested path, with a
/// notice in the outcome, whenever [`is_xlsx_available`] reports no backend.
pub fn build_export_payload(
    request: &SpecExportRequest<'_>,
) -> Result<SpecExportPayload, ExportError> {
    let SpecExportRequest {
        batch,
        scopes,
        format,
        path,
        config,
    } = *request;
    if batch.is_empty() {
        return Err(ExportError::NoResults);
    }
    let l_scopes_full;
    let scopes = match scopes {
        Some(scopes) => scopes,
        None => {
            l_scopes_full = derive_full_scopes(batch);
            &l_scopes_full
        }
    };
    if scopes.is_empty() {
        return Err(ExportError::NoCellsSelected);
    }

    let mut notice = None;
    let mut format_written = format;
    let mut path_written = path.to_path_buf();
    if format == EnumExportFormat::Xlsx {
        if is_xlsx_available()
            && let Some((bytes, report)) = export_spreadsheet_to_buffer(
                batch,
                scopes,
                &config.xlsx,
                &config.render.null_display,
            )?
        {
            return Ok(SpecExportPayload {
                outcome: SpecExportOutcome {
                    path: path_written,
                    format,
                    notice,
                    warnings: report.warnings.clone(),
                    xlsx_report: Some(report),
                    n_bytes: bytes.len(),
                },
                bytes,
            });
        }
        tracing::warn!(path = %path.display(), "{C_XLSX_FALLBACK_NOTICE}");
        notice = Some(C_XLSX_FALLBACK_NOTICE.to_string());
        format_written = EnumExportFormat::Csv;
        path_written = path.with_extension(EnumExportFormat::Csv.extension());
    }

    let text_format = format_written.text_format().unwrap_or(EnumTextFormat::Csv);
    let mut l_warnings = Vec::new();
    let bytes = serialize_scopes(batch, scopes, text_format, config, &mut l_warnings)
        .into_bytes();
    Ok(SpecExportPayload {
        outcome: SpecExportOutcome {
            path: path_written,
            format: format_written,
            notice,
            xlsx_report: None,
            warnings: l_warnings,
            n_bytes: bytes.len(),
        },
        bytes,
    })
}

/// Serialize `request` and persist it with [`write_async`].
///
/// Input and spreadsheet errors return immediately; the write itself reports
/// through `on_progress` and `on_complete` once the scheduler runs it.
pub fn export_to_file<H, C>(
    scheduler: Rc<dyn Scheduler>,
    slot: &TaskSlot,
    host: Rc<H>,
    request: &SpecExportRequest<'_>,
    on_progress: Option<TypeProgressFn>,
    on_complete: C,
) -> Result<SpecExportOutcome, ExportError>
where
    H: FileHost + 'static,
    H::Handle: 'static,
    C: FnOnce(Result<ReportWrite, WriteError>) + 'static,
{
    let SpecExportPayload { bytes, outcome } = build_export_payload(request)?;
    tracing::info!(
        path = %outcome.path.display(),
        format = outcome.format.extension(),
        n_bytes = outcome.n_bytes,
        "export serialized"
    );
    write_async(
        scheduler,
        slot,
        host,
        outcome.path.clone(),
        bytes,
        on_progress,
        on_complete,
    );
    Ok(outcome)
}

/// Format for `path`, falling back to `default` for unknown extensions.
pub fn derive_export_format(path: &Path, default: EnumExportFormat) -> EnumExportFormat {
    EnumExportFormat::from_path(path).unwrap_or(default)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
