//! Tabular layout engine.
//!
//! Renders result sets into bordered grids and records, for every set, the
//! [`SpecCellMap`] that ties document coordinates back to logical cells.

use crate::conf::{
    C_EMPTY_RESULT_TEXT, C_GUTTER_HEADER, N_WIDTH_EMPTY_DEFAULT, SpecBorderChars,
    derive_border_chars,
};
use crate::divider::{SpecDividerMetadata, parse_divider_format};
use crate::spec::{
    EnumCellValue, EnumStyleTag, EnumWrapMode, SpecCellMap, SpecColumn, SpecColumnSpan,
    SpecLine, SpecRenderOptions, SpecRenderedDocument, SpecResultBatch, SpecResultSet,
    SpecRowSpan, SpecSpan,
};
use crate::util::{
    collapse_line_breaks, count_chars, count_digits, derive_display_text, derive_header_text,
    measure_longest_line, pad_to_width, split_logical_lines, take_chars,
};

////////////////////////////////////////////////////////////////////////////////
// #region Widths

/// Compute the content width of every column.
///
/// Each width is the longest line among the display name and every rendered
/// value, capped at the configured maximum and never below 1.
pub fn compute_column_widths(
    set: &SpecResultSet,
    columns: &[SpecColumn],
    options: &SpecRenderOptions,
) -> Vec<usize> {
    let n_cap = options.effective_max_col_width();
    columns
        .iter()
        .map(|col| {
            let mut n_width = count_chars(&derive_header_text(&col.display_name));
            for n_row in 0..set.rows.len() {
                let c_text = derive_display_text(set.cell(n_row, &col.key), &options.null_display);
                n_width = n_width.max(measure_longest_line(&c_text));
            }
            if let Some(n_cap) = n_cap {
                n_width = n_width.min(n_cap);
            }
            n_width.max(1)
        })
        .collect()
}

/// Width of the row-number gutter for `n_rows` rows.
pub fn compute_gutter_width(n_rows: usize) -> usize {
    count_digits(n_rows).max(1)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Wrapping

/// Split one cell's display text into rendered lines of at most `width` chars.
pub fn wrap_cell_text(
    text: &str,
    width: usize,
    wrap_mode: EnumWrapMode,
    preserve_newlines: bool,
) -> Vec<String> {
    let width = width.max(1);

    if wrap_mode == EnumWrapMode::Truncate {
        return vec![take_chars(&collapse_line_breaks(text), width)];
    }

    let l_logical: Vec<String> = if preserve_newlines {
        split_logical_lines(text)
            .into_iter()
            .map(ToString::to_string)
            .collect()
    } else {
        vec![collapse_line_breaks(text)]
    };

    if preserve_newlines && l_logical.iter().all(|line| count_chars(line) <= width) {
        return l_logical;
    }

    let mut l_out = Vec::new();
    for c_line in &l_logical {
        match wrap_mode {
            EnumWrapMode::Word => l_out.extend(wrap_words(c_line, width)),
            _ => l_out.extend(wrap_chars(c_line, width)),
        }
    }
    l_out
}

fn wrap_chars(line: &str, width: usize) -> Vec<String> {
    let l_chars: Vec<char> = line.chars().collect();
    if l_chars.is_empty() {
        return vec![String::new()];
    }
    l_chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn wrap_words(line: &str, width: usize) -> Vec<String> {
    if count_chars(line) <= width {
        return vec![line.to_string()];
    }

    let mut l_out = Vec::new();
    let mut c_current = String::new();
    let mut n_current = 0usize;
    let mut if_started = false;

    for c_word in line.split(' ') {
        let n_word = count_chars(c_word);
        if if_started && n_current + 1 + n_word <= width {
            c_current.push(' ');
            c_current.push_str(c_word);
            n_current += 1 + n_word;
            continue;
        }
        if n_word == 0 && if_started {
            continue;
        }
        if !c_current.is_empty() {
            l_out.push(std::mem::take(&mut c_current));
        }

        let mut l_chars: Vec<char> = c_word.chars().collect();
        while l_chars.len() > width {
            l_out.push(l_chars.drain(..width).collect());
        }
        c_current = l_chars.into_iter().collect();
        n_current = count_chars(&c_current);
        if_started = true;
    }

    if if_started {
        l_out.push(c_current);
    }
    l_out
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ResultSetRender

/// Lines and geometry of one rendered result set, relative to line 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRenderedSet {
    /// Rendered lines.
    pub lines: Vec<SpecLine>,
    /// Geometry; line ranges start at 0.
    pub cell_map: SpecCellMap,
}

struct SpecGridGeometry {
    border: SpecBorderChars,
    gutter_width: Option<usize>,
    widths: Vec<usize>,
}

impl SpecGridGeometry {
    fn segment_widths(&self) -> Vec<usize> {
        self.gutter_width
            .into_iter()
            .chain(self.widths.iter().copied())
            .collect()
    }

    fn total_width(&self) -> usize {
        self.segment_widths().iter().map(|n| n + 3).sum::<usize>() + 1
    }

    fn rule(&self, ch_left: char, ch_mid: char, ch_right: char) -> SpecLine {
        let mut c_rule = String::new();
        for (n_idx, n_width) in self.segment_widths().into_iter().enumerate() {
            c_rule.push(if n_idx == 0 { ch_left } else { ch_mid });
            c_rule.extend(std::iter::repeat_n(self.border.horizontal, n_width + 2));
        }
        c_rule.push(ch_right);
        SpecLine::single(c_rule, EnumStyleTag::Border)
    }

    fn row_line(&self, l_cells: Vec<(String, EnumStyleTag)>) -> SpecLine {
        let c_vertical = self.border.vertical.to_string();
        let mut l_spans = Vec::with_capacity(l_cells.len() * 2 + 1);
        for (c_text, enum_tag) in l_cells {
            l_spans.push(SpecSpan::new(c_vertical.clone(), EnumStyleTag::Border));
            l_spans.push(SpecSpan::new(format!(" {c_text} "), enum_tag));
        }
        l_spans.push(SpecSpan::new(c_vertical, EnumStyleTag::Border));
        SpecLine { spans: l_spans }
    }
}

/// Render one result set into grid lines and its cell map.
///
/// Never fails: block errors and column-less sets degrade to message lines.
pub fn render_result_set(set: &SpecResultSet, options: &SpecRenderOptions) -> SpecRenderedSet {
    if let Some(c_error) = &set.block_error {
        let lines: Vec<SpecLine> = split_logical_lines(&format!("Error: {c_error}"))
            .into_iter()
            .map(|c_line| SpecLine::single(c_line, EnumStyleTag::Error))
            .collect();
        return derive_message_set(lines);
    }

    let l_columns = set.derive_columns();
    if l_columns.is_empty() {
        let mut rendered =
            derive_message_set(vec![SpecLine::single(C_EMPTY_RESULT_TEXT, EnumStyleTag::Info)]);
        rendered.cell_map.result_width = rendered.cell_map.result_width.max(N_WIDTH_EMPTY_DEFAULT);
        return rendered;
    }

    let geometry = SpecGridGeometry {
        border: derive_border_chars(options.border_style),
        gutter_width: options
            .show_row_numbers
            .then(|| compute_gutter_width(set.rows.len())),
        widths: compute_column_widths(set, &l_columns, options),
    };

    let mut l_lines: Vec<SpecLine> = Vec::new();
    let mut cell_map = SpecCellMap {
        result_width: geometry.total_width(),
        ..Default::default()
    };

    let mut n_col_cursor = 1usize;
    if let Some(n_gutter) = geometry.gutter_width {
        cell_map.gutter_span = Some(n_col_cursor..n_col_cursor + n_gutter + 2);
        n_col_cursor += n_gutter + 3;
    }
    for (n_ordinal, n_width) in geometry.widths.iter().enumerate() {
        cell_map.columns.push(SpecColumnSpan {
            ordinal: n_ordinal,
            col_range: n_col_cursor..n_col_cursor + n_width + 2,
        });
        n_col_cursor += n_width + 3;
    }

    let border = geometry.border;
    if border.if_outer_rules {
        l_lines.push(geometry.rule(border.top_left, border.top_mid, border.top_right));
    }

    // Built once and reused for the header rule and every row separator.
    let line_separator = geometry.rule(border.mid_left, border.mid_mid, border.mid_right);

    if options.include_headers {
        let mut l_cells = Vec::with_capacity(l_columns.len() + 1);
        if let Some(n_gutter) = geometry.gutter_width {
            l_cells.push((
                pad_to_width(C_GUTTER_HEADER, n_gutter, true),
                EnumStyleTag::RowNumber,
            ));
        }
        for (col, n_width) in l_columns.iter().zip(&geometry.widths) {
            let c_name = take_chars(&derive_header_text(&col.display_name), *n_width);
            l_cells.push((pad_to_width(&c_name, *n_width, false), EnumStyleTag::Header));
        }
        cell_map.header_span = Some(l_lines.len()..l_lines.len() + 1);
        l_lines.push(geometry.row_line(l_cells));
        l_lines.push(line_separator.clone());
    }

    let if_row_separators = options.should_draw_row_separators();
    for n_row in 0..set.rows.len() {
        if n_row > 0 && if_row_separators {
            l_lines.push(line_separator.clone());
        }

        let l_cell_lines: Vec<(Vec<String>, EnumStyleTag, bool)> = l_columns
            .iter()
            .zip(&geometry.widths)
            .map(|(col, n_width)| {
                let value = set.cell(n_row, &col.key);
                let c_text = derive_display_text(value, &options.null_display);
                (
                    wrap_cell_text(
                        &c_text,
                        *n_width,
                        options.wrap_mode,
                        options.preserve_newlines,
                    ),
                    derive_value_tag(value),
                    matches!(value, EnumCellValue::Number(_)),
                )
            })
            .collect();

        let n_height = l_cell_lines
            .iter()
            .map(|(l_wrapped, _, _)| l_wrapped.len())
            .max()
            .unwrap_or(1)
            .max(1);

        let n_line_start = l_lines.len();
        for n_sub in 0..n_height {
            let mut l_cells = Vec::with_capacity(l_cell_lines.len() + 1);
            if let Some(n_gutter) = geometry.gutter_width {
                let c_num = if n_sub == 0 {
                    (n_row + 1).to_string()
                } else {
                    String::new()
                };
                l_cells.push((pad_to_width(&c_num, n_gutter, true), EnumStyleTag::RowNumber));
            }
            for ((l_wrapped, enum_tag, if_align_right), n_width) in
                l_cell_lines.iter().zip(&geometry.widths)
            {
                let c_part = l_wrapped.get(n_sub).map(String::as_str).unwrap_or("");
                l_cells.push((pad_to_width(c_part, *n_width, *if_align_right), *enum_tag));
            }
            l_lines.push(geometry.row_line(l_cells));
        }
        cell_map.rows.push(SpecRowSpan {
            ordinal: n_row,
            line_range: n_line_start..l_lines.len(),
        });
    }

    if border.if_outer_rules {
        l_lines.push(geometry.rule(border.bottom_left, border.bottom_mid, border.bottom_right));
    }

    cell_map.line_range = 0..l_lines.len();
    SpecRenderedSet {
        lines: l_lines,
        cell_map,
    }
}

fn derive_message_set(lines: Vec<SpecLine>) -> SpecRenderedSet {
    let n_width = lines.iter().map(SpecLine::width).max().unwrap_or(0);
    let cell_map = SpecCellMap {
        line_range: 0..lines.len(),
        result_width: n_width,
        ..Default::default()
    };
    SpecRenderedSet { lines, cell_map }
}

/// Style tag for a cell value.
pub fn derive_value_tag(value: &EnumCellValue) -> EnumStyleTag {
    match value {
        EnumCellValue::Null => EnumStyleTag::Null,
        EnumCellValue::Text(_) => EnumStyleTag::Text,
        EnumCellValue::Number(_) => EnumStyleTag::Number,
        EnumCellValue::Boolean(_) => EnumStyleTag::Boolean,
        EnumCellValue::Binary(_) => EnumStyleTag::Binary,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BatchRender

/// Chunk/batch position and clock values fed to divider templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRenderContext {
    /// Current chunk number.
    pub chunk_num: usize,
    /// Total chunk count.
    pub total_chunks: usize,
    /// Current batch number.
    pub batch_num: usize,
    /// Total batch count.
    pub total_batches: usize,
    /// Date text.
    pub date: String,
    /// Time text.
    pub time: String,
}

impl SpecRenderContext {
    /// Single chunk, single batch, current local date and time.
    pub fn now() -> Self {
        let meta = SpecDividerMetadata::default().with_current_datetime();
        Self {
            chunk_num: 1,
            total_chunks: 1,
            batch_num: 1,
            total_batches: 1,
            date: meta.date,
            time: meta.time,
        }
    }
}

/// Render a whole batch; alias of [`render_batch`].
pub fn render(
    batch: &SpecResultBatch,
    options: &SpecRenderOptions,
) -> (SpecRenderedDocument, Vec<SpecCellMap>) {
    render_batch(batch, options)
}

/// Render a whole batch with the current clock.
pub fn render_batch(
    batch: &SpecResultBatch,
    options: &SpecRenderOptions,
) -> (SpecRenderedDocument, Vec<SpecCellMap>) {
    render_batch_with_context(batch, options, &SpecRenderContext::now())
}

/// Render a whole batch into one document plus one cell map per result set.
///
/// Between sets, a block-label separator is inserted when the owning block
/// changes, else the divider template when configured. Divider metadata
/// describes the set that follows it.
pub fn render_batch_with_context(
    batch: &SpecResultBatch,
    options: &SpecRenderOptions,
    context: &SpecRenderContext,
) -> (SpecRenderedDocument, Vec<SpecCellMap>) {
    let mut document = SpecRenderedDocument::default();
    let mut l_cell_maps = Vec::with_capacity(batch.sets.len());
    let total_time = batch.total_time();
    let mut c_label_prev: Option<&str> = None;

    for (n_idx, set) in batch.sets.iter().enumerate() {
        let SpecRenderedSet {
            lines,
            mut cell_map,
        } = render_result_set(set, options);

        if n_idx > 0 {
            let meta = SpecDividerMetadata {
                row_count: set.rows.len(),
                col_count: cell_map.columns.len(),
                result_set_num: n_idx + 1,
                total_result_sets: batch.sets.len(),
                run_time: set.execution_time,
                total_time,
                chunk_num: context.chunk_num,
                total_chunks: context.total_chunks,
                batch_num: context.batch_num,
                total_batches: context.total_batches,
                date: context.date.clone(),
                time: context.time.clone(),
                result_width: cell_map.result_width,
                extras: Default::default(),
            };

            let c_label = set.block_label.as_deref();
            if let Some(c_label) = c_label
                && c_label_prev != Some(c_label)
            {
                let meta = meta.with_extra("block_label", c_label);
                for c_line in parse_divider_format(&options.block_label_template, &meta) {
                    document
                        .lines
                        .push(SpecLine::single(c_line, EnumStyleTag::BlockLabel));
                }
            } else if let Some(c_template) = &options.divider_template {
                for c_line in parse_divider_format(c_template, &meta) {
                    document
                        .lines
                        .push(SpecLine::single(c_line, EnumStyleTag::Divider));
                }
            }
        }
        c_label_prev = set.block_label.as_deref();

        cell_map.shift_lines(document.lines.len());
        document.lines.extend(lines);
        l_cell_maps.push(cell_map);
    }

    tracing::debug!(
        n_sets = batch.sets.len(),
        n_lines = document.lines.len(),
        "rendered result batch"
    );
    (document, l_cell_maps)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
