//! Per-cell style resolution and style memoization.

use std::collections::BTreeMap;

use globset::{Glob, GlobMatcher};
use qgrid_render::{EnumCellValue, SpecColumn, derive_export_text};
use regex::Regex;

use crate::sink::WorkbookSink;
use crate::spec::{
    EnumStyleCondition, SpecCellFormat, SpecStyleRule, SpecXlsxStyleOptions, TypeStyleId,
    XlsxExportError,
};
use crate::util::derive_type_category;

////////////////////////////////////////////////////////////////////////////////
// #region StyleResolver

struct SpecCompiledRule<'a> {
    rule: &'a SpecStyleRule,
    pattern: Option<Regex>,
    style: SpecCellFormat,
}

/// Style options with globs, regexes and presets compiled once per export.
pub struct StyleResolver<'a> {
    options: &'a SpecXlsxStyleOptions,
    l_column_globs: Vec<(GlobMatcher, SpecCellFormat)>,
    dict_column_exact: BTreeMap<&'a str, SpecCellFormat>,
    l_rules: Vec<SpecCompiledRule<'a>>,
    header_style: SpecCellFormat,
}

impl<'a> StyleResolver<'a> {
    /// Compile `options`; invalid globs, regexes and presets fail here.
    pub fn new(options: &'a SpecXlsxStyleOptions) -> Result<Self, XlsxExportError> {
        let mut l_column_globs = Vec::new();
        let mut dict_column_exact = BTreeMap::new();
        // BTreeMap order makes "first wildcard match" deterministic.
        for (c_key, fmt) in &options.column_styles {
            let fmt = expand_preset(fmt, &options.style_presets)?;
            if c_key.contains('*') {
                let matcher = Glob::new(c_key)
                    .map_err(|err| XlsxExportError::InvalidGlob {
                        pattern: c_key.clone(),
                        message: err.to_string(),
                    })?
                    .compile_matcher();
                l_column_globs.push((matcher, fmt));
            } else {
                dict_column_exact.insert(c_key.as_str(), fmt);
            }
        }

        let mut l_rules = Vec::with_capacity(options.conditional_styles.len());
        for rule in &options.conditional_styles {
            let pattern = match &rule.pattern {
                Some(c_pattern) => Some(Regex::new(c_pattern).map_err(|err| {
                    XlsxExportError::InvalidPattern {
                        pattern: c_pattern.clone(),
                        message: err.to_string(),
                    }
                })?),
                None => None,
            };
            let mut style = expand_preset(&rule.style, &options.style_presets)?;
            if let Some(c_preset) = &rule.preset {
                let fmt_preset = options
                    .style_presets
                    .get(c_preset)
                    .ok_or_else(|| XlsxExportError::UnknownPreset(c_preset.clone()))?;
                style = fmt_preset.merge(&style);
                style.preset = None;
            }
            l_rules.push(SpecCompiledRule {
                rule,
                pattern,
                style,
            });
        }

        let header_style = expand_preset(&options.header_style, &options.style_presets)?;

        Ok(Self {
            options,
            l_column_globs,
            dict_column_exact,
            l_rules,
            header_style,
        })
    }

    /// Style of header cells.
    pub fn header_style(&self) -> &SpecCellFormat {
        &self.header_style
    }

    /// Base alternating-row style for 1-based data row `n_row_1based`.
    pub fn resolve_base_style(&self, n_row_1based: usize) -> SpecCellFormat {
        let table_style = &self.options.table_style;
        let overlay = if n_row_1based % 2 == 1 {
            table_style.odd_row.as_ref()
        } else {
            table_style.even_row.as_ref()
        };
        match overlay {
            Some(fmt) => table_style.base.merge(fmt),
            None => table_style.base.clone(),
        }
    }

    /// Column-specific style: exact key first, then the first matching glob.
    pub fn resolve_column_style(&self, key: &str) -> Option<&SpecCellFormat> {
        self.dict_column_exact.get(key).or_else(|| {
            self.l_column_globs
                .iter()
                .find(|(matcher, _)| matcher.is_match(key))
                .map(|(_, fmt)| fmt)
        })
    }

    /// Final style of one data cell.
    pub fn resolve_cell_style(
        &self,
        column: &SpecColumn,
        value: &EnumCellValue,
        n_row_1based: usize,
    ) -> SpecCellFormat {
        let fmt_base = self.resolve_base_style(n_row_1based);
        if value.is_null() {
            return fmt_base.merge(&self.options.table_style.null_style);
        }

        let mut fmt = fmt_base;
        if self.options.auto_type_formatting
            && let Some(enum_category) = column.sql_type.as_deref().and_then(derive_type_category)
            && let Some(fmt_type) = self.options.type_styles.get(enum_category.as_str())
        {
            fmt = fmt.merge(fmt_type);
        }

        if let Some(fmt_column) = self.resolve_column_style(&column.key) {
            fmt = fmt.merge(fmt_column);
        }

        let c_text = derive_export_text(value);
        for compiled in &self.l_rules {
            if rule_applies(compiled, &column.key, value, &c_text) {
                fmt = fmt.merge(&compiled.style);
            }
        }
        fmt.preset = None;
        fmt
    }
}

/// Expand the preset a format references, the format's own fields winning.
pub fn expand_preset(
    fmt: &SpecCellFormat,
    dict_presets: &BTreeMap<String, SpecCellFormat>,
) -> Result<SpecCellFormat, XlsxExportError> {
    let Some(c_preset) = &fmt.preset else {
        return Ok(fmt.clone());
    };
    let fmt_preset = dict_presets
        .get(c_preset)
        .ok_or_else(|| XlsxExportError::UnknownPreset(c_preset.clone()))?;
    let mut fmt_out = fmt_preset.merge(fmt);
    fmt_out.preset = None;
    Ok(fmt_out)
}

fn rule_applies(
    compiled: &SpecCompiledRule<'_>,
    key: &str,
    value: &EnumCellValue,
    c_text: &str,
) -> bool {
    let rule = compiled.rule;
    if let Some(l_columns) = &rule.columns
        && !l_columns.iter().any(|c_col| c_col == key)
    {
        return false;
    }
    if let Some(enum_condition) = rule.condition
        && !evaluate_condition(enum_condition, value, c_text)
    {
        return false;
    }
    if let Some(match_value) = &rule.match_value
        && !match_cell_value(match_value, value, c_text)
    {
        return false;
    }
    if let Some(pattern) = &compiled.pattern
        && !pattern.is_match(c_text)
    {
        return false;
    }
    true
}

/// Evaluate one condition predicate.
pub fn evaluate_condition(
    enum_condition: EnumStyleCondition,
    value: &EnumCellValue,
    c_text: &str,
) -> bool {
    match enum_condition {
        EnumStyleCondition::Null => value.is_null(),
        EnumStyleCondition::Empty => matches!(value, EnumCellValue::Text(s) if s.is_empty()),
        EnumStyleCondition::Nonempty => !value.is_null() && !c_text.is_empty(),
        EnumStyleCondition::Negative => value.as_number().is_some_and(|n| n < 0.0),
        EnumStyleCondition::Positive => value.as_number().is_some_and(|n| n > 0.0),
        EnumStyleCondition::Zero => value.as_number().is_some_and(|n| n == 0.0),
    }
}

fn match_cell_value(match_value: &EnumCellValue, value: &EnumCellValue, c_text: &str) -> bool {
    if let (Some(n_want), Some(n_got)) = (match_value.as_number(), value.as_number()) {
        return n_want == n_got;
    }
    match_value.is_null() == value.is_null() && derive_export_text(match_value) == c_text
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleCache

/// Canonical style key to sink handle, scoped to one export.
#[derive(Debug, Default)]
pub struct StyleCache {
    dict_handles: BTreeMap<String, TypeStyleId>,
    n_hits: usize,
}

impl StyleCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `fmt`, registering it with `sink` on first use.
    pub fn get_or_create<S: WorkbookSink + ?Sized>(
        &mut self,
        fmt: &SpecCellFormat,
        sink: &mut S,
    ) -> Result<TypeStyleId, XlsxExportError> {
        let c_key = fmt.derive_style_key();
        if let Some(n_handle) = self.dict_handles.get(&c_key) {
            self.n_hits += 1;
            return Ok(*n_handle);
        }
        let n_handle = sink.create_style(fmt)?;
        self.dict_handles.insert(c_key, n_handle);
        Ok(n_handle)
    }

    /// Distinct styles created.
    pub fn len(&self) -> usize {
        self.dict_handles.len()
    }

    /// Whether no style was created yet.
    pub fn is_empty(&self) -> bool {
        self.dict_handles.is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.n_hits
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryWorkbookSink;
    use crate::spec::SpecTableStyle;

    fn red() -> SpecCellFormat {
        SpecCellFormat {
            font_color: Some("#FF0000".to_string()),
            ..Default::default()
        }
    }

    fn decimal_options() -> SpecXlsxStyleOptions {
        SpecXlsxStyleOptions {
            auto_type_formatting: true,
            conditional_styles: vec![SpecStyleRule {
                columns: Some(vec!["amount".to_string()]),
                condition: Some(EnumStyleCondition::Negative),
                style: red(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn decimal_column_with_negative_rule() {
        let options = decimal_options();
        let resolver = StyleResolver::new(&options).expect("compile styles");
        let column = SpecColumn::new("amount", 0).with_sql_type("decimal(10,2)");

        let fmt_negative = resolver.resolve_cell_style(&column, &EnumCellValue::Number(-3.5), 1);
        assert_eq!(fmt_negative.num_format.as_deref(), Some("0.00"));
        assert_eq!(fmt_negative.font_color.as_deref(), Some("#FF0000"));

        let fmt_positive = resolver.resolve_cell_style(&column, &EnumCellValue::Number(3.5), 1);
        assert_eq!(fmt_positive.num_format.as_deref(), Some("0.00"));
        assert_eq!(fmt_positive.font_color, None);
        assert_eq!(fmt_positive, resolver.resolve_base_style(1).with_(SpecCellFormat {
            num_format: Some("0.00".to_string()),
            ..Default::default()
        }));
    }

    #[test]
    fn null_cells_skip_type_column_and_rules() {
        let mut options = decimal_options();
        options.column_styles.insert("amount".to_string(), SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        });
        let resolver = StyleResolver::new(&options).expect("compile styles");
        let column = SpecColumn::new("amount", 0).with_sql_type("decimal");

        let fmt = resolver.resolve_cell_style(&column, &EnumCellValue::Null, 2);
        assert_eq!(fmt.num_format, None);
        assert_eq!(fmt.bold, None);
        assert_eq!(fmt.italic, Some(true));
        assert_eq!(fmt.font_color.as_deref(), Some("#808080"));
        assert_eq!(fmt.bg_color.as_deref(), Some("#F2F2F2"));
    }

    #[test]
    fn alternating_rows_follow_one_based_numbering() {
        let options = SpecXlsxStyleOptions {
            table_style: SpecTableStyle {
                base: SpecCellFormat::default(),
                odd_row: Some(SpecCellFormat {
                    bg_color: Some("#111111".to_string()),
                    ..Default::default()
                }),
                even_row: Some(SpecCellFormat {
                    bg_color: Some("#222222".to_string()),
                    ..Default::default()
                }),
                null_style: SpecCellFormat::default(),
            },
            ..Default::default()
        };
        let resolver = StyleResolver::new(&options).expect("compile styles");
        assert_eq!(
            resolver.resolve_base_style(1).bg_color.as_deref(),
            Some("#111111")
        );
        assert_eq!(
            resolver.resolve_base_style(2).bg_color.as_deref(),
            Some("#222222")
        );
    }

    #[test]
    fn column_styles_prefer_exact_then_first_sorted_glob() {
        let mut options = SpecXlsxStyleOptions::default();
        options.column_styles.insert("*_id".to_string(), SpecCellFormat {
            align: Some("right".to_string()),
            ..Default::default()
        });
        options.column_styles.insert("user_*".to_string(), SpecCellFormat {
            align: Some("left".to_string()),
            ..Default::default()
        });
        options.column_styles.insert("user_id".to_string(), SpecCellFormat {
            align: Some("center".to_string()),
            preset: Some("highlight".to_string()),
            ..Default::default()
        });
        let resolver = StyleResolver::new(&options).expect("compile styles");

        let fmt_exact = resolver.resolve_column_style("user_id").expect("exact");
        assert_eq!(fmt_exact.align.as_deref(), Some("center"));
        assert_eq!(fmt_exact.bg_color.as_deref(), Some("#FFF2CC"));
        assert_eq!(fmt_exact.preset, None);

        let fmt_glob = resolver.resolve_column_style("user_name").expect("glob");
        assert_eq!(fmt_glob.align.as_deref(), Some("left"));
        let fmt_glob = resolver.resolve_column_style("order_id").expect("glob");
        assert_eq!(fmt_glob.align.as_deref(), Some("right"));
        assert!(resolver.resolve_column_style("total").is_none());
    }

    #[test]
    fn rules_match_values_patterns_and_merge_in_order() {
        let options = SpecXlsxStyleOptions {
            auto_type_formatting: false,
            conditional_styles: vec![
                SpecStyleRule {
                    match_value: Some(EnumCellValue::Number(42.0)),
                    style: SpecCellFormat {
                        bold: Some(true),
                        font_color: Some("#0000FF".to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                SpecStyleRule {
                    pattern: Some("^4".to_string()),
                    preset: Some("danger".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let resolver = StyleResolver::new(&options).expect("compile styles");
        let column = SpecColumn::new("code", 0);

        let fmt = resolver.resolve_cell_style(&column, &EnumCellValue::text("42"), 1);
        assert_eq!(fmt.bold, Some(true));
        assert_eq!(fmt.font_color.as_deref(), Some("#C00000"));

        let fmt = resolver.resolve_cell_style(&column, &EnumCellValue::text("7"), 1);
        assert_eq!(fmt.font_color, None);
    }

    #[test]
    fn conditions_cover_every_predicate() {
        let text_empty = EnumCellValue::text("");
        assert!(evaluate_condition(EnumStyleCondition::Null, &EnumCellValue::Null, ""));
        assert!(evaluate_condition(EnumStyleCondition::Empty, &text_empty, ""));
        assert!(!evaluate_condition(EnumStyleCondition::Nonempty, &text_empty, ""));
        assert!(evaluate_condition(
            EnumStyleCondition::Negative,
            &EnumCellValue::text("-1.5"),
            "-1.5"
        ));
        assert!(evaluate_condition(
            EnumStyleCondition::Zero,
            &EnumCellValue::Number(0.0),
            "0"
        ));
        assert!(!evaluate_condition(
            EnumStyleCondition::Positive,
            &EnumCellValue::text("abc"),
            "abc"
        ));
    }

    #[test]
    fn invalid_inputs_surface_errors() {
        let mut options = SpecXlsxStyleOptions::default();
        options.conditional_styles.push(SpecStyleRule {
            pattern: Some("(".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            StyleResolver::new(&options),
            Err(XlsxExportError::InvalidPattern { .. })
        ));

        let mut options = SpecXlsxStyleOptions::default();
        options.column_styles.insert("a*[".to_string(), SpecCellFormat::default());
        assert!(matches!(
            StyleResolver::new(&options),
            Err(XlsxExportError::InvalidGlob { .. })
        ));

        let mut options = SpecXlsxStyleOptions::default();
        options.header_style.preset = Some("missing".to_string());
        assert!(matches!(
            StyleResolver::new(&options),
            Err(XlsxExportError::UnknownPreset(_))
        ));
    }

    #[test]
    fn cache_reuses_handles_for_identical_styles() {
        let mut sink = MemoryWorkbookSink::new();
        let mut cache = StyleCache::new();
        let n_a = cache.get_or_create(&red(), &mut sink).expect("style");
        let n_b = cache.get_or_create(&red(), &mut sink).expect("style");
        let n_c = cache
            .get_or_create(&SpecCellFormat::default(), &mut sink)
            .expect("style");
        assert_eq!(n_a, n_b);
        assert_ne!(n_a, n_c);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hits(), 1);
        assert_eq!(sink.styles.len(), 2);
    }
}
