//! Render constants and border presets.

use crate::spec::EnumBorderStyle;

/// Default text shown for NULL cells in the on-screen grid.
pub const C_NULL_DISPLAY_DEFAULT: &str = "NULL";
/// Spaces substituted for one tab character in display text.
pub const N_TAB_EXPANSION: usize = 4;
/// Width reported for a result set that has nothing to lay out.
pub const N_WIDTH_EMPTY_DEFAULT: usize = 20;
/// Informational line rendered for an empty result set without columns.
pub const C_EMPTY_RESULT_TEXT: &str = "(no results)";
/// Header text of the row-number gutter.
pub const C_GUTTER_HEADER: &str = "#";
/// Upper bound for one repeat-count expansion in divider templates.
pub const N_DIVIDER_REPEAT_MAX: usize = 10_000;
/// Default number of document lines delivered per batched-render step.
pub const N_RENDER_BATCH_SIZE_DEFAULT: usize = 500;
/// Default block-label separator template.
pub const C_BLOCK_LABEL_TEMPLATE_DEFAULT: &str = "== %block_label% ==";

/// Box-drawing characters for one border style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecBorderChars {
    /// Top-left corner.
    pub top_left: char,
    /// Junction on the top rule.
    pub top_mid: char,
    /// Top-right corner.
    pub top_right: char,
    /// Left end of a middle rule.
    pub mid_left: char,
    /// Junction on a middle rule.
    pub mid_mid: char,
    /// Right end of a middle rule.
    pub mid_right: char,
    /// Bottom-left corner.
    pub bottom_left: char,
    /// Junction on the bottom rule.
    pub bottom_mid: char,
    /// Bottom-right corner.
    pub bottom_right: char,
    /// Horizontal fill of every rule.
    pub horizontal: char,
    /// Vertical column separator.
    pub vertical: char,
    /// Whether top and bottom rules are drawn.
    pub if_outer_rules: bool,
}

const BORDER_SINGLE: SpecBorderChars = SpecBorderChars {
    top_left: '┌',
    top_mid: '┬',
    top_right: '┐',
    mid_left: '├',
    mid_mid: '┼',
    mid_right: '┤',
    bottom_left: '└',
    bottom_mid: '┴',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
    if_outer_rules: true,
};

const BORDER_ROUNDED: SpecBorderChars = SpecBorderChars {
    top_left: '╭',
    top_right: '╮',
    bottom_left: '╰',
    bottom_right: '╯',
    ..BORDER_SINGLE
};

const BORDER_DOUBLE: SpecBorderChars = SpecBorderChars {
    top_left: '╔',
    top_mid: '╦',
    top_right: '╗',
    mid_left: '╠',
    mid_mid: '╬',
    mid_right: '╣',
    bottom_left: '╚',
    bottom_mid: '╩',
    bottom_right: '╝',
    horizontal: '═',
    vertical: '║',
    if_outer_rules: true,
};

const BORDER_ASCII: SpecBorderChars = SpecBorderChars {
    top_left: '+',
    top_mid: '+',
    top_right: '+',
    mid_left: '+',
    mid_mid: '+',
    mid_right: '+',
    bottom_left: '+',
    bottom_mid: '+',
    bottom_right: '+',
    horizontal: '-',
    vertical: '|',
    if_outer_rules: true,
};

// No box: columns are separated by blanks and only inner rules are drawn.
const BORDER_NONE: SpecBorderChars = SpecBorderChars {
    top_left: ' ',
    top_mid: ' ',
    top_right: ' ',
    mid_left: ' ',
    mid_mid: ' ',
    mid_right: ' ',
    bottom_left: ' ',
    bottom_mid: ' ',
    bottom_right: ' ',
    horizontal: '-',
    vertical: ' ',
    if_outer_rules: false,
};

/// Resolve the character set for a border style.
pub fn derive_border_chars(style: EnumBorderStyle) -> SpecBorderChars {
    match style {
        EnumBorderStyle::Single => BORDER_SINGLE,
        EnumBorderStyle::Rounded => BORDER_ROUNDED,
        EnumBorderStyle::Double => BORDER_DOUBLE,
        EnumBorderStyle::Ascii => BORDER_ASCII,
        EnumBorderStyle::None => BORDER_NONE,
    }
}
