use std::ops::Range;

/// Byte range of the slice starting at `n_offset`.
pub(crate) fn derive_chunk_range(
    n_offset: usize,
    n_total: usize,
    n_chunk_size: usize,
) -> Range<usize> {
    let n_start = n_offset.min(n_total);
    n_start..n_start.saturating_add(n_chunk_size.max(1)).min(n_total)
}

/// Number of slices needed for `n_total` bytes.
pub(crate) fn count_chunks(n_total: usize, n_chunk_size: usize) -> usize {
    n_total.div_ceil(n_chunk_size.max(1))
}
