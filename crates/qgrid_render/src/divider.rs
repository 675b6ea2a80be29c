//! Divider template resolver.
//!
//! Templates are `\n`-separated segments written in a small mini-language:
//! - `%name%` placeholders take values from [`SpecDividerMetadata`];
//! - `<digits><char>` repeats `char` that many times (`5-` is `-----`);
//! - `%fit_results%` and `%fit%` become widths resolved after the other lines,
//!   so `%fit%=` draws a rule as wide as the widest line of the template.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::conf::N_DIVIDER_REPEAT_MAX;
use crate::util::count_chars;

const C_TOKEN_FIT_RESULTS: &str = "%fit_results%";
const C_TOKEN_FIT: &str = "%fit%";

/// Values available to divider placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecDividerMetadata {
    /// Row count of the described result set.
    pub row_count: usize,
    /// Column count of the described result set.
    pub col_count: usize,
    /// 1-based number of the described result set.
    pub result_set_num: usize,
    /// Number of result sets in the batch.
    pub total_result_sets: usize,
    /// Execution time of the described result set.
    pub run_time: Option<Duration>,
    /// Execution time of the whole batch.
    pub total_time: Option<Duration>,
    /// Current chunk number.
    pub chunk_num: usize,
    /// Total chunk count.
    pub total_chunks: usize,
    /// Current batch number.
    pub batch_num: usize,
    /// Total batch count.
    pub total_batches: usize,
    /// Render date text.
    pub date: String,
    /// Render time text.
    pub time: String,
    /// Rendered width of the described result set.
    pub result_width: usize,
    /// Additional named values (e.g. `block_label`).
    pub extras: BTreeMap<String, String>,
}

impl SpecDividerMetadata {
    /// Fill `date` and `time` from the local clock.
    pub fn with_current_datetime(mut self) -> Self {
        let now = chrono::Local::now();
        self.date = now.format("%Y-%m-%d").to_string();
        self.time = now.format("%H:%M:%S").to_string();
        self
    }

    /// Add one extra placeholder value.
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(name.into(), value.into());
        self
    }

    /// Placeholder name to substituted text.
    pub fn to_dict(&self) -> BTreeMap<String, String> {
        let mut dict_values = self.extras.clone();
        for (c_name, c_value) in [
            ("row_count", self.row_count.to_string()),
            ("col_count", self.col_count.to_string()),
            ("result_set_num", self.result_set_num.to_string()),
            ("total_result_sets", self.total_result_sets.to_string()),
            ("run_time", format_duration(self.run_time)),
            ("total_time", format_duration(self.total_time)),
            ("chunk_num", self.chunk_num.to_string()),
            ("total_chunks", self.total_chunks.to_string()),
            ("batch_num", self.batch_num.to_string()),
            ("total_batches", self.total_batches.to_string()),
            ("date", self.date.clone()),
            ("time", self.time.clone()),
            ("result_width", self.result_width.to_string()),
        ] {
            dict_values.insert(c_name.to_string(), c_value);
        }
        dict_values
    }
}

/// Human-readable duration: `850ms`, `1.25s`; empty when unknown.
pub fn format_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return String::new();
    };
    let n_millis = duration.as_secs_f64() * 1000.0;
    if n_millis < 1000.0 {
        format!("{}ms", n_millis.round() as u64)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumFitKind {
    FitResults,
    Fit,
}

/// Resolve a divider template into literal lines.
///
/// Three passes: plain segments first (tracking the widest), then
/// `%fit_results%` segments with the metadata `result_width`, then `%fit%`
/// segments with the widest line seen so far. Unknown placeholders are kept
/// verbatim.
pub fn parse_divider_format(template: &str, metadata: &SpecDividerMetadata) -> Vec<String> {
    let dict_values = metadata.to_dict();
    let c_template = template.replace("\\n", "\n");
    let l_segments: Vec<&str> = c_template.split('\n').collect();

    let mut l_lines: Vec<String> = vec![String::new(); l_segments.len()];
    let mut l_deferred: Vec<(usize, EnumFitKind)> = Vec::new();
    let mut n_width_max = 0usize;

    for (n_idx, c_segment) in l_segments.iter().enumerate() {
        if c_segment.contains(C_TOKEN_FIT_RESULTS) {
            l_deferred.push((n_idx, EnumFitKind::FitResults));
        } else if c_segment.contains(C_TOKEN_FIT) {
            l_deferred.push((n_idx, EnumFitKind::Fit));
        } else {
            let c_line = expand_segment(c_segment, &dict_values);
            n_width_max = n_width_max.max(count_chars(&c_line));
            l_lines[n_idx] = c_line;
        }
    }

    let c_result_width = metadata.result_width.to_string();
    let mut l_deferred_fit = Vec::new();
    for (n_idx, enum_kind) in &l_deferred {
        if *enum_kind != EnumFitKind::FitResults {
            l_deferred_fit.push(*n_idx);
            continue;
        }
        let c_segment = l_segments[*n_idx].replace(C_TOKEN_FIT_RESULTS, &c_result_width);
        if c_segment.contains(C_TOKEN_FIT) {
            l_deferred_fit.push(*n_idx);
            l_lines[*n_idx] = c_segment;
            continue;
        }
        let c_line = expand_segment(&c_segment, &dict_values);
        n_width_max = n_width_max.max(count_chars(&c_line));
        l_lines[*n_idx] = c_line;
    }

    let c_fit_width = n_width_max.to_string();
    for n_idx in l_deferred_fit {
        let c_segment = if l_lines[n_idx].is_empty() {
            l_segments[n_idx].to_string()
        } else {
            std::mem::take(&mut l_lines[n_idx])
        };
        let c_segment = c_segment.replace(C_TOKEN_FIT, &c_fit_width);
        l_lines[n_idx] = expand_segment(&c_segment, &dict_values);
    }

    l_lines
}

/// Expand repeat counts and substitute placeholders in one segment.
pub fn expand_segment(segment: &str, dict_values: &BTreeMap<String, String>) -> String {
    let l_chars: Vec<char> = segment.chars().collect();
    let mut c_out = String::with_capacity(segment.len());
    let mut n_idx = 0;

    while n_idx < l_chars.len() {
        let ch = l_chars[n_idx];

        if ch == '%'
            && let Some(n_end) = find_placeholder_end(&l_chars, n_idx)
        {
            let c_name: String = l_chars[n_idx + 1..n_end].iter().collect();
            match dict_values.get(&c_name) {
                Some(c_value) => c_out.push_str(c_value),
                None => {
                    c_out.push('%');
                    c_out.push_str(&c_name);
                    c_out.push('%');
                }
            }
            n_idx = n_end + 1;
            continue;
        }

        if ch.is_ascii_digit() {
            let n_start = n_idx;
            while n_idx < l_chars.len() && l_chars[n_idx].is_ascii_digit() {
                n_idx += 1;
            }
            let c_digits: String = l_chars[n_start..n_idx].iter().collect();
            let if_has_suffix = n_idx < l_chars.len()
                && !(l_chars[n_idx] == '%' && find_placeholder_end(&l_chars, n_idx).is_some());
            let n_repeat = c_digits
                .parse::<usize>()
                .ok()
                .filter(|n| *n <= N_DIVIDER_REPEAT_MAX);

            match (if_has_suffix, n_repeat) {
                (true, Some(n_repeat)) => {
                    let ch_fill = l_chars[n_idx];
                    c_out.extend(std::iter::repeat_n(ch_fill, n_repeat));
                    n_idx += 1;
                }
                _ => c_out.push_str(&c_digits),
            }
            continue;
        }

        c_out.push(ch);
        n_idx += 1;
    }

    c_out
}

fn find_placeholder_end(l_chars: &[char], n_start: usize) -> Option<usize> {
    let mut n_idx = n_start + 1;
    while n_idx < l_chars.len() {
        let ch = l_chars[n_idx];
        if ch == '%' {
            return if n_idx > n_start + 1 { Some(n_idx) } else { None };
        }
        if !(ch.is_ascii_alphanumeric() || ch == '_') {
            return None;
        }
        n_idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn meta_rows(n: usize) -> SpecDividerMetadata {
        SpecDividerMetadata {
            row_count: n,
            ..Default::default()
        }
    }

    #[test]
    fn repeat_counts_surround_substituted_placeholder() {
        assert_eq!(
            parse_divider_format("5-(%row_count% rows)5-", &meta_rows(12)),
            vec!["-----(12 rows)-----"]
        );
    }

    #[test]
    fn substituted_digits_are_not_expanded() {
        let meta = SpecDividerMetadata {
            row_count: 3,
            col_count: 2,
            ..Default::default()
        };
        assert_eq!(
            parse_divider_format("%row_count%x%col_count%", &meta),
            vec!["3x2"]
        );
    }

    #[test]
    fn unknown_placeholder_is_left_untouched() {
        assert_eq!(
            parse_divider_format("[%nope%]", &SpecDividerMetadata::default()),
            vec!["[%nope%]"]
        );
    }

    #[test]
    fn empty_template_yields_one_blank_line() {
        assert_eq!(
            parse_divider_format("", &SpecDividerMetadata::default()),
            vec![String::new()]
        );
    }

    #[test]
    fn fit_results_uses_result_width() {
        let meta = SpecDividerMetadata {
            result_width: 7,
            ..Default::default()
        };
        assert_eq!(
            parse_divider_format("%fit_results%=", &meta),
            vec!["======="]
        );
    }

    #[test]
    fn fit_spans_widest_line_including_fit_results_lines() {
        let meta = SpecDividerMetadata {
            result_width: 12,
            ..Default::default()
        };
        let l_lines = parse_divider_format("%fit%-\\nabc\\n%fit_results%=", &meta);
        assert_eq!(l_lines, vec!["-".repeat(12), "abc".to_string(), "=".repeat(12)]);
    }

    #[test]
    fn fit_without_fit_results_uses_plain_lines() {
        let l_lines = parse_divider_format(
            "Result %result_set_num%/%total_result_sets%\n%fit%~",
            &SpecDividerMetadata {
                result_set_num: 2,
                total_result_sets: 10,
                ..Default::default()
            },
        );
        assert_eq!(l_lines, vec!["Result 2/10".to_string(), "~".repeat(11)]);
    }

    #[test]
    fn trailing_digits_stay_literal() {
        assert_eq!(
            parse_divider_format("set 12", &SpecDividerMetadata::default()),
            vec!["set 12"]
        );
    }

    #[test]
    fn extras_are_substituted() {
        let meta = SpecDividerMetadata::default().with_extra("block_label", "users");
        assert_eq!(
            parse_divider_format("== %block_label% ==", &meta),
            vec!["== users =="]
        );
    }

    #[test]
    fn format_duration_switches_units() {
        assert_eq!(format_duration(None), "");
        assert_eq!(format_duration(Some(Duration::from_millis(850))), "850ms");
        assert_eq!(format_duration(Some(Duration::from_millis(1250))), "1.25s");
    }

    proptest! {
        #[test]
        fn repeat_segment_expands_exactly(n_repeat in 0usize..200, ch in "[-=~*#+]") {
            let c_template = format!("{n_repeat}{ch}");
            let l_lines = parse_divider_format(&c_template, &SpecDividerMetadata::default());
            prop_assert_eq!(l_lines, vec![ch.repeat(n_repeat)]);
        }
    }
}
