//! Size thresholds of the chunked writer.

/// Payloads up to this many bytes are written in one call.
pub const N_SMALL_WRITE_MAX: usize = 1024 * 1024;

/// Slice size of a chunked write.
pub const N_CHUNK_SIZE: usize = 64 * 1024;
