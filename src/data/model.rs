use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellSpec – one row of the `cells` table
// ---------------------------------------------------------------------------

/// A single battery-cell specification as stored in the `cells` table.
///
/// Every descriptive and measured field is nullable; absence is always
/// `None`, never `0.0` or an empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellSpec {
    pub id: i64,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub cell_format: Option<String>,
    pub mass_g: Option<f64>,
    pub capacity_ah: Option<f64>,
    pub energy_wh: Option<f64>,
    pub voltage_nominal_v: Option<f64>,
    pub voltage_min_v: Option<f64>,
    pub voltage_max_v: Option<f64>,
    pub current_max_charge_a: Option<f64>,
    pub current_max_discharge_a: Option<f64>,
    #[serde(rename = "internal_resistance__initial_mohm")]
    pub internal_resistance_initial_mohm: Option<f64>,
    pub charge_discharge_cycles: Option<f64>,
    pub capacity_retention: Option<f64>,
    pub temperature_oparating_min_celcius: Option<f64>,
    pub temperature_oparating_max_celcius: Option<f64>,
    pub chemistry: Option<String>,
}

impl CellSpec {
    /// Dynamic access to one field.
    pub fn get(&self, field: CellField) -> FieldValue<'_> {
        use CellField::*;
        match field {
            Manufacturer => FieldValue::from(self.manufacturer.as_deref()),
            Model => FieldValue::from(self.model.as_deref()),
            CellFormat => FieldValue::from(self.cell_format.as_deref()),
            Chemistry => FieldValue::from(self.chemistry.as_deref()),
            MassG => FieldValue::from(self.mass_g),
            CapacityAh => FieldValue::from(self.capacity_ah),
            EnergyWh => FieldValue::from(self.energy_wh),
            VoltageNominalV => FieldValue::from(self.voltage_nominal_v),
            VoltageMinV => FieldValue::from(self.voltage_min_v),
            VoltageMaxV => FieldValue::from(self.voltage_max_v),
            CurrentMaxChargeA => FieldValue::from(self.current_max_charge_a),
            CurrentMaxDischargeA => FieldValue::from(self.current_max_discharge_a),
            InternalResistanceMohm => FieldValue::from(self.internal_resistance_initial_mohm),
            ChargeDischargeCycles => FieldValue::from(self.charge_discharge_cycles),
            CapacityRetention => FieldValue::from(self.capacity_retention),
            TemperatureMinC => FieldValue::from(self.temperature_oparating_min_celcius),
            TemperatureMaxC => FieldValue::from(self.temperature_oparating_max_celcius),
        }
    }
}

// ---------------------------------------------------------------------------
// CellField – the named (non-id) columns of the table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellField {
    Manufacturer,
    Model,
    CellFormat,
    MassG,
    CapacityAh,
    EnergyWh,
    VoltageNominalV,
    VoltageMinV,
    VoltageMaxV,
    CurrentMaxChargeA,
    CurrentMaxDischargeA,
    InternalResistanceMohm,
    ChargeDischargeCycles,
    CapacityRetention,
    TemperatureMinC,
    TemperatureMaxC,
    Chemistry,
}

impl CellField {
    /// All seventeen named fields, in store column order.
    pub const ALL: [CellField; 17] = [
        CellField::Manufacturer,
        CellField::Model,
        CellField::CellFormat,
        CellField::MassG,
        CellField::CapacityAh,
        CellField::EnergyWh,
        CellField::VoltageNominalV,
        CellField::VoltageMinV,
        CellField::VoltageMaxV,
        CellField::CurrentMaxChargeA,
        CellField::CurrentMaxDischargeA,
        CellField::InternalResistanceMohm,
        CellField::ChargeDischargeCycles,
        CellField::CapacityRetention,
        CellField::TemperatureMinC,
        CellField::TemperatureMaxC,
        CellField::Chemistry,
    ];

    /// Column name in the backing store.
    pub fn column_name(self) -> &'static str {
        use CellField::*;
        match self {
            Manufacturer => "manufacturer",
            Model => "model",
            CellFormat => "cell_format",
            MassG => "mass_g",
            CapacityAh => "capacity_ah",
            EnergyWh => "energy_wh",
            VoltageNominalV => "voltage_nominal_v",
            VoltageMinV => "voltage_min_v",
            VoltageMaxV => "voltage_max_v",
            CurrentMaxChargeA => "current_max_charge_a",
            CurrentMaxDischargeA => "current_max_discharge_a",
            InternalResistanceMohm => "internal_resistance__initial_mohm",
            ChargeDischargeCycles => "charge_discharge_cycles",
            CapacityRetention => "capacity_retention",
            TemperatureMinC => "temperature_oparating_min_celcius",
            TemperatureMaxC => "temperature_oparating_max_celcius",
            Chemistry => "chemistry",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            CellField::Manufacturer | CellField::Model | CellField::CellFormat | CellField::Chemistry
        )
    }
}

// ---------------------------------------------------------------------------
// FieldValue – a borrowed view of a single field
// ---------------------------------------------------------------------------

/// A dynamically-typed view of one field, used by the filter predicates,
/// the formatter and the sorter so every column is handled the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Text(&'a str),
    Number(f64),
}

impl<'a> From<Option<&'a str>> for FieldValue<'a> {
    fn from(v: Option<&'a str>) -> Self {
        v.map_or(FieldValue::Null, FieldValue::Text)
    }
}

impl From<Option<f64>> for FieldValue<'_> {
    fn from(v: Option<f64>) -> Self {
        v.map_or(FieldValue::Null, FieldValue::Number)
    }
}

impl FieldValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// `Null` sorts after everything, numbers before text. `fold_case`
    /// compares text case-insensitively first.
    pub fn compare(&self, other: &Self, fold_case: bool) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Greater,
            (_, Null) => Ordering::Less,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Number(_), Text(_)) => Ordering::Less,
            (Text(_), Number(_)) => Ordering::Greater,
            (Text(a), Text(b)) if fold_case => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (Text(a), Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// PageData – what the loader hands to the rendering layer
// ---------------------------------------------------------------------------

/// Payload of one page load. `cells` is always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageData {
    pub cells: Vec<CellSpec>,
}
