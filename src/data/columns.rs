use super::model::{CellField, FieldValue};

/// Shown for every absent value.
pub const PLACEHOLDER: &str = "-";

// ---------------------------------------------------------------------------
// Column metadata
// ---------------------------------------------------------------------------

/// Which predicate a column's filter widget feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Dropdown of distinct values, case-insensitive equality.
    EqualsString,
    /// Free text, case-insensitive substring.
    IncludesString,
    /// Min/max text boxes.
    InNumberRange,
}

/// How a value is turned into display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Text,
    /// Shortest round-trip representation (`48`, `48.5`).
    Plain,
    /// Fixed number of decimals.
    Fixed(usize),
    /// Value followed by ` %`.
    Percent,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub field: CellField,
    pub header: &'static str,
    pub filter: FilterKind,
    pub format: CellFormat,
}

impl ColumnDef {
    const fn text(field: CellField, header: &'static str, filter: FilterKind) -> Self {
        Self {
            field,
            header,
            filter,
            format: CellFormat::Text,
        }
    }

    const fn numeric(field: CellField, header: &'static str, format: CellFormat) -> Self {
        Self {
            field,
            header,
            filter: FilterKind::InNumberRange,
            format,
        }
    }

    /// Numeric columns are right-aligned.
    pub fn align_right(&self) -> bool {
        self.format != CellFormat::Text
    }

    pub fn render(&self, value: FieldValue<'_>) -> String {
        format_value(self.format, value)
    }
}

/// Data columns in display order. The selection checkbox column is handled
/// by the table itself.
pub static COLUMNS: [ColumnDef; 17] = [
    ColumnDef::text(CellField::Manufacturer, "Manufacturer", FilterKind::EqualsString),
    ColumnDef::text(CellField::Model, "Model", FilterKind::IncludesString),
    ColumnDef::text(CellField::CellFormat, "Format", FilterKind::EqualsString),
    ColumnDef::text(CellField::Chemistry, "Chemistry", FilterKind::EqualsString),
    ColumnDef::numeric(CellField::MassG, "Mass [g]", CellFormat::Plain),
    ColumnDef::numeric(CellField::CapacityAh, "Capacity [Ah]", CellFormat::Fixed(2)),
    ColumnDef::numeric(CellField::EnergyWh, "Energy [Wh]", CellFormat::Fixed(2)),
    ColumnDef::numeric(CellField::VoltageNominalV, "Nominal Voltage [V]", CellFormat::Fixed(2)),
    ColumnDef::numeric(CellField::VoltageMinV, "Min Voltage [V]", CellFormat::Fixed(2)),
    ColumnDef::numeric(CellField::VoltageMaxV, "Max Voltage [V]", CellFormat::Fixed(2)),
    ColumnDef::numeric(
        CellField::CurrentMaxChargeA,
        "Max Charge Current [A]",
        CellFormat::Fixed(1),
    ),
    ColumnDef::numeric(
        CellField::CurrentMaxDischargeA,
        "Max Discharge Current [A]",
        CellFormat::Fixed(1),
    ),
    ColumnDef::numeric(
        CellField::InternalResistanceMohm,
        "Internal Resistance [mΩ]",
        CellFormat::Fixed(2),
    ),
    ColumnDef::numeric(
        CellField::ChargeDischargeCycles,
        "Charge/Discharge Cycles",
        CellFormat::Plain,
    ),
    ColumnDef::numeric(
        CellField::CapacityRetention,
        "Capacity retention [%]",
        CellFormat::Percent,
    ),
    ColumnDef::numeric(
        CellField::TemperatureMinC,
        "Min Operating Temp. [°C]",
        CellFormat::Plain,
    ),
    ColumnDef::numeric(
        CellField::TemperatureMaxC,
        "Max Operating Temp. [°C]",
        CellFormat::Plain,
    ),
];

/// Metadata for one field. Every `CellField` has exactly one column.
pub fn column_def(field: CellField) -> &'static ColumnDef {
    COLUMNS
        .iter()
        .find(|c| c.field == field)
        .unwrap_or(&COLUMNS[0])
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render one value. Absent values always become [`PLACEHOLDER`].
pub fn format_value(format: CellFormat, value: FieldValue<'_>) -> String {
    let n = match value {
        FieldValue::Null => return PLACEHOLDER.to_string(),
        FieldValue::Text(s) => return s.to_string(),
        FieldValue::Number(n) => n,
    };
    match format {
        CellFormat::Text | CellFormat::Plain => format!("{n}"),
        CellFormat::Fixed(decimals) => to_fixed(n, decimals),
        CellFormat::Percent => format!("{n} %"),
    }
}

/// Fixed-point rendering where a value exactly halfway between two
/// candidates takes the one further from zero (`2.125` → `"2.13"`).
fn to_fixed(n: f64, decimals: usize) -> String {
    // -0.0 prints as plain zero.
    let n = if n == 0.0 { 0.0 } else { n };
    if !is_decimal_tie(n, decimals) {
        return format!("{n:.decimals$}");
    }
    let scale = 10f64.powi(decimals as i32);
    let rounded = ((n.abs() * scale).floor() + 1.0) / scale;
    format!("{:.decimals$}", rounded.copysign(n))
}

/// True when `n` sits exactly halfway between two multiples of
/// `10^-decimals`.
///
/// With `n = m * 2^e`, `2 * n * 10^d = m * 5^d * 2^(e + 1 + d)`. Since `5^d`
/// is odd this is an odd integer exactly when the trailing zero bits of `m`
/// cancel the power of two.
fn is_decimal_tie(n: f64, decimals: usize) -> bool {
    if !n.is_finite() || n == 0.0 {
        return false;
    }
    let bits = n.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    i64::from(mantissa.trailing_zeros()) + exp + 1 + decimals as i64 == 0
}
