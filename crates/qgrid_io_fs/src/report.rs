//! Write report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Counters for one completed write.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportWrite {
    /// Target path.
    pub path: PathBuf,
    /// Payload size.
    pub cnt_bytes_total: u64,
    /// Bytes committed to the target.
    pub cnt_bytes_written: u64,
    /// Number of write calls issued.
    pub cnt_chunks: u64,
    /// Whether the payload went through the sliced path.
    pub if_chunked: bool,
}

impl ReportWrite {
    /// Whether every byte reached the target.
    pub fn is_complete(&self) -> bool {
        self.cnt_bytes_written == self.cnt_bytes_total
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_bytes_total".to_string(), self.cnt_bytes_total);
        dict_counts.insert("cnt_bytes_written".to_string(), self.cnt_bytes_written);
        dict_counts.insert("cnt_chunks".to_string(), self.cnt_chunks);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} path={} total={} written={} chunks={} chunked={}",
            self.path.display(),
            dict_counts["cnt_bytes_total"],
            dict_counts["cnt_bytes_written"],
            dict_counts["cnt_chunks"],
            self.if_chunked
        )
    }
}

impl fmt::Display for ReportWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[WRITE]"))
    }
}

/// Mutable accumulator for write statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportWriteBuilder {
    /// See [`ReportWrite::cnt_bytes_written`].
    pub cnt_bytes_written: u64,
    /// See [`ReportWrite::cnt_chunks`].
    pub cnt_chunks: u64,
}

impl ReportWriteBuilder {
    /// Record one write call of `n_bytes`.
    pub fn add_chunk(&mut self, n_bytes: u64) {
        self.cnt_bytes_written += n_bytes;
        self.cnt_chunks += 1;
    }

    /// Snapshot into an immutable report.
    pub fn build(&self, path: PathBuf, cnt_bytes_total: u64, if_chunked: bool) -> ReportWrite {
        ReportWrite {
            path,
            cnt_bytes_total,
            cnt_bytes_written: self.cnt_bytes_written,
            cnt_chunks: self.cnt_chunks,
            if_chunked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_write_to_dict_and_format() {
        let mut builder = ReportWriteBuilder::default();
        builder.add_chunk(65536);
        builder.add_chunk(100);
        let report = builder.build(PathBuf::from("out.csv"), 65636, true);

        assert!(report.is_complete());
        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_bytes_total"], 65636);
        assert_eq!(dict_counts["cnt_bytes_written"], 65636);
        assert_eq!(dict_counts["cnt_chunks"], 2);

        let txt = report.format("[WRITE]");
        assert_eq!(
            txt,
            "[WRITE] path=out.csv total=65636 written=65636 chunks=2 chunked=true"
        );
        assert_eq!(report.to_string(), txt);
    }
}
