//! Selection-to-cell mapper.
//!
//! Turns a rectangular document selection into the logical rows and columns it
//! touches, using the cell maps produced by the layout engine.

use std::ops::Range;

use crate::spec::{SpecCellMap, SpecSelectedCells, SpecSelectionBounds};

fn overlaps_cols(range: &Range<usize>, bounds: &SpecSelectionBounds) -> bool {
    range.start < bounds.end_col && bounds.start_col < range.end
}

fn overlaps_lines(range: &Range<usize>, bounds: &SpecSelectionBounds) -> bool {
    range.start <= bounds.end_line && bounds.start_line < range.end
}

/// Map a selection onto one result set's cells.
///
/// A row is selected when any of its lines is inside the selection; a column
/// when any of its characters is. Selecting gutter characters selects every
/// column. Borders never select anything on their own.
pub fn map_selection(
    cell_map: &SpecCellMap,
    bounds: &SpecSelectionBounds,
) -> SpecSelectedCells {
    let mut selected = SpecSelectedCells::default();

    if !overlaps_lines(&cell_map.line_range, bounds) {
        return selected;
    }

    selected.rows = cell_map
        .rows
        .iter()
        .filter(|span| overlaps_lines(&span.line_range, bounds))
        .map(|span| span.ordinal)
        .collect();

    let if_gutter_hit = cell_map
        .gutter_span
        .as_ref()
        .is_some_and(|range| overlaps_cols(range, bounds));
    selected.cols = cell_map
        .columns
        .iter()
        .filter(|span| if_gutter_hit || overlaps_cols(&span.col_range, bounds))
        .map(|span| span.ordinal)
        .collect();

    selected.includes_header = cell_map
        .header_span
        .as_ref()
        .is_some_and(|range| overlaps_lines(range, bounds));

    selected
}

/// Map a selection across every result set of a rendered batch.
///
/// Returns `(set index, cells)` for each set with at least one selected cell.
pub fn map_selection_batch(
    cell_maps: &[SpecCellMap],
    bounds: &SpecSelectionBounds,
) -> Vec<(usize, SpecSelectedCells)> {
    cell_maps
        .iter()
        .enumerate()
        .map(|(n_idx, cell_map)| (n_idx, map_selection(cell_map, bounds)))
        .filter(|(_, selected)| !selected.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::layout::render_batch;
    use crate::spec::{
        EnumCellValue, SpecColumn, SpecRenderOptions, SpecResultBatch, SpecResultSet, TypeRow,
    };

    fn grid_batch() -> SpecResultBatch {
        let l_rows: Vec<TypeRow> = (1..=3_i64)
            .map(|n| {
                TypeRow::from([
                    ("id".to_string(), EnumCellValue::from(n)),
                    ("name".to_string(), EnumCellValue::from(format!("user{n}"))),
                    ("score".to_string(), EnumCellValue::from(n * 10)),
                ])
            })
            .collect();
        SpecResultBatch::new(vec![SpecResultSet::new(
            vec![
                SpecColumn::new("id", 0),
                SpecColumn::new("name", 1),
                SpecColumn::new("score", 2),
            ],
            l_rows,
        )])
    }

    // Layout of grid_batch with defaults:
    // 0 ┌────┬───────┬───────┐
    // 1 │ id │ name  │ score │
    // 2 ├────┼───────┼───────┤
    // 3 │  1 │ user1 │    10 │
    // 4 │  2 │ user2 │    20 │
    // 5 │  3 │ user3 │    30 │
    // 6 └────┴───────┴───────┘

    #[test]
    fn selection_inside_one_cell_selects_that_cell() {
        let (_, l_maps) = render_batch(&grid_batch(), &SpecRenderOptions::default());
        let selected = map_selection(&l_maps[0], &SpecSelectionBounds::new(4, 8, 4, 10));
        assert_eq!(selected.rows.into_iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(selected.cols.into_iter().collect::<Vec<_>>(), vec![1]);
        assert!(!selected.includes_header);
    }

    #[test]
    fn selection_spanning_header_and_columns() {
        let (_, l_maps) = render_batch(&grid_batch(), &SpecRenderOptions::default());
        let selected = map_selection(&l_maps[0], &SpecSelectionBounds::new(1, 2, 3, 9));
        assert_eq!(selected.rows.into_iter().collect::<Vec<_>>(), vec![0]);
        assert_eq!(selected.cols.into_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert!(selected.includes_header);
    }

    #[test]
    fn border_only_selection_is_empty() {
        let (_, l_maps) = render_batch(&grid_batch(), &SpecRenderOptions::default());
        let selected = map_selection(&l_maps[0], &SpecSelectionBounds::new(0, 0, 0, 23));
        assert!(selected.is_empty());
        let selected = map_selection(&l_maps[0], &SpecSelectionBounds::new(3, 5, 5, 6));
        assert!(selected.cols.is_empty());
    }

    #[test]
    fn gutter_selection_selects_every_column() {
        let options = SpecRenderOptions {
            show_row_numbers: true,
            ..Default::default()
        };
        let (_, l_maps) = render_batch(&grid_batch(), &options);
        let selected = map_selection(&l_maps[0], &SpecSelectionBounds::new(3, 1, 4, 2));
        assert_eq!(selected.rows.into_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(selected.cols.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn whole_line_selection_across_sets() {
        let mut batch = grid_batch();
        batch.sets.push(batch.sets[0].clone());
        let options = SpecRenderOptions {
            divider_template: Some("%fit_results%-".to_string()),
            ..Default::default()
        };
        let (_, l_maps) = render_batch(&batch, &options);
        // Set 0 occupies 0..7, divider at 7, set 1 at 8..15.
        let l_hits = map_selection_batch(&l_maps, &SpecSelectionBounds::lines(5, 12));
        assert_eq!(l_hits.len(), 2);
        assert_eq!(l_hits[0].0, 0);
        assert_eq!(l_hits[0].1.rows.iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(l_hits[1].0, 1);
        assert_eq!(
            l_hits[1].1.rows.iter().copied().collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert!(l_hits[1].1.includes_header);
        assert_eq!(l_hits[1].1.cols.len(), 3);
    }

    #[test]
    fn divider_only_selection_hits_nothing() {
        let mut batch = grid_batch();
        batch.sets.push(batch.sets[0].clone());
        let options = SpecRenderOptions {
            divider_template: Some("%fit_results%-".to_string()),
            ..Default::default()
        };
        let (_, l_maps) = render_batch(&batch, &options);
        assert!(map_selection_batch(&l_maps, &SpecSelectionBounds::lines(7, 7)).is_empty());
    }

    proptest! {
        #[test]
        fn any_point_inside_a_cell_maps_to_that_cell(
            n_row in 0_usize..3,
            n_col in 0_usize..3,
            n_char in 0_usize..64,
            n_len in 1_usize..4,
        ) {
            let (_, l_maps) = render_batch(&grid_batch(), &SpecRenderOptions::default());
            let cell_map = &l_maps[0];
            let n_line = cell_map.rows[n_row].line_range.start;
            let col_range = cell_map.columns[n_col].col_range.clone();
            let n_start = col_range.start + n_char % col_range.len();
            let n_end = (n_start + n_len).min(col_range.end);

            let selected =
                map_selection(cell_map, &SpecSelectionBounds::new(n_line, n_start, n_line, n_end));
            prop_assert_eq!(selected.rows.into_iter().collect::<Vec<_>>(), vec![n_row]);
            prop_assert_eq!(selected.cols.into_iter().collect::<Vec<_>>(), vec![n_col]);
        }
    }
}
