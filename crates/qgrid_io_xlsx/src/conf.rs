//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{EnumTypeCategory, SpecCellFormat};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Upper bound Excel accepts for a column width.
pub const N_WIDTH_EXCEL_COLUMN_MAX: usize = 255;
/// Sheet name prefix for result sets without a block label.
pub const C_SHEET_NAME_PREFIX_DEFAULT: &str = "Result";

/// Normalized SQL type name to styling category.
pub const TUP_SQL_TYPE_CATEGORIES: [(&str, EnumTypeCategory); 36] = [
    ("int", EnumTypeCategory::Integer),
    ("integer", EnumTypeCategory::Integer),
    ("tinyint", EnumTypeCategory::Integer),
    ("smallint", EnumTypeCategory::Integer),
    ("mediumint", EnumTypeCategory::Integer),
    ("bigint", EnumTypeCategory::Integer),
    ("int2", EnumTypeCategory::Integer),
    ("int4", EnumTypeCategory::Integer),
    ("int8", EnumTypeCategory::Integer),
    ("serial", EnumTypeCategory::Integer),
    ("bigserial", EnumTypeCategory::Integer),
    ("decimal", EnumTypeCategory::Decimal),
    ("numeric", EnumTypeCategory::Decimal),
    ("number", EnumTypeCategory::Decimal),
    ("float", EnumTypeCategory::Decimal),
    ("float4", EnumTypeCategory::Decimal),
    ("float8", EnumTypeCategory::Decimal),
    ("real", EnumTypeCategory::Decimal),
    ("double", EnumTypeCategory::Decimal),
    ("double precision", EnumTypeCategory::Decimal),
    ("money", EnumTypeCategory::Money),
    ("smallmoney", EnumTypeCategory::Money),
    ("date", EnumTypeCategory::Date),
    ("datetime", EnumTypeCategory::Datetime),
    ("datetime2", EnumTypeCategory::Datetime),
    ("smalldatetime", EnumTypeCategory::Datetime),
    ("datetimeoffset", EnumTypeCategory::Datetime),
    ("timestamp", EnumTypeCategory::Datetime),
    ("timestamptz", EnumTypeCategory::Datetime),
    ("timestamp with time zone", EnumTypeCategory::Datetime),
    ("timestamp without time zone", EnumTypeCategory::Datetime),
    ("time", EnumTypeCategory::Time),
    ("timetz", EnumTypeCategory::Time),
    ("bool", EnumTypeCategory::Boolean),
    ("boolean", EnumTypeCategory::Boolean),
    ("bit", EnumTypeCategory::Boolean),
];

/// Style of every data cell before overlays.
pub fn derive_default_table_base() -> SpecCellFormat {
    SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        border: Some(1),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    }
}

/// Banding overlay for even data rows.
pub fn derive_default_table_even_row() -> SpecCellFormat {
    SpecCellFormat {
        bg_color: Some("#F2F2F2".to_string()),
        ..Default::default()
    }
}

/// Overlay for NULL cells: italic, muted grey.
pub fn derive_default_null_style() -> SpecCellFormat {
    SpecCellFormat {
        italic: Some(true),
        font_color: Some("#808080".to_string()),
        ..Default::default()
    }
}

/// Header cell style.
pub fn derive_default_header_style() -> SpecCellFormat {
    derive_default_table_base().with_(SpecCellFormat {
        bold: Some(true),
        align: Some("center".to_string()),
        bg_color: Some("#D9E1F2".to_string()),
        ..Default::default()
    })
}

/// Default style per type category.
pub fn derive_default_type_styles() -> BTreeMap<String, SpecCellFormat> {
    let num_format = |c_code: &str| SpecCellFormat {
        num_format: Some(c_code.to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    for (enum_category, fmt) in [
        (EnumTypeCategory::Integer, num_format("0")),
        (EnumTypeCategory::Decimal, num_format("0.00")),
        (EnumTypeCategory::Money, num_format("$#,##0.00")),
        (EnumTypeCategory::Date, num_format("yyyy-mm-dd")),
        (EnumTypeCategory::Datetime, num_format("yyyy-mm-dd hh:mm:ss")),
        (EnumTypeCategory::Time, num_format("hh:mm:ss")),
        (
            EnumTypeCategory::Boolean,
            SpecCellFormat {
                align: Some("center".to_string()),
                ..Default::default()
            },
        ),
    ] {
        dict_fmt.insert(enum_category.as_str().to_string(), fmt);
    }
    dict_fmt
}

/// Build default named presets referenced through `preset`.
pub fn derive_default_style_presets() -> BTreeMap<String, SpecCellFormat> {
    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        "highlight".to_string(),
        SpecCellFormat {
            bg_color: Some("#FFF2CC".to_string()),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        "danger".to_string(),
        SpecCellFormat {
            bold: Some(true),
            font_color: Some("#C00000".to_string()),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        "success".to_string(),
        SpecCellFormat {
            font_color: Some("#006100".to_string()),
            bg_color: Some("#C6EFCE".to_string()),
            ..Default::default()
        },
    );
    dict_fmt.insert("muted".to_string(), derive_default_null_style());
    dict_fmt.insert(
        "scientific".to_string(),
        SpecCellFormat {
            num_format: Some("0.00E+0".to_string()),
            ..Default::default()
        },
    );
    dict_fmt
}
