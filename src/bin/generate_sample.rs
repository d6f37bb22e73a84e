use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// (manufacturer, model, format, chemistry, mass, capacity, nominal V, min V, max V,
///  charge A, discharge A, resistance mΩ, cycles, retention %, min °C, max °C)
type Row = (
    &'static str,
    &'static str,
    Option<&'static str>,
    Option<&'static str>,
    Option<f64>,
    Option<f64>,
    f64,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

const ROWS: &[Row] = &[
    ("Samsung", "INR21700-50E", Some("21700"), Some("NMC"), Some(69.0), Some(4.9), 3.6, Some(2.5), Some(4.2), Some(4.9), Some(9.8), Some(22.0), Some(500.0), Some(70.0), Some(-20.0), Some(60.0)),
    ("Samsung", "INR18650-35E", Some("18650"), Some("NMC"), Some(50.0), Some(3.4), 3.6, Some(2.65), Some(4.2), Some(2.0), Some(8.0), Some(35.0), Some(500.0), Some(60.0), Some(-10.0), Some(60.0)),
    ("Molicel", "INR21700-P45B", Some("21700"), Some("NCA"), Some(70.0), Some(4.5), 3.6, Some(2.5), Some(4.2), Some(13.5), Some(45.0), Some(11.0), None, None, Some(-40.0), Some(60.0)),
    ("EVE", "LF105", Some("prismatic"), Some("LiFePO4"), Some(1980.0), Some(105.0), 3.2, Some(2.5), Some(3.65), Some(105.0), Some(210.0), Some(0.25), Some(4000.0), Some(80.0), Some(-20.0), Some(55.0)),
    ("EVE", "LF280K", Some("prismatic"), Some("LiFePO4"), Some(5490.0), Some(280.0), 3.2, Some(2.5), Some(3.65), Some(140.0), Some(280.0), Some(0.18), Some(6000.0), Some(80.0), Some(-20.0), Some(55.0)),
    ("LG", "INR18650-MJ1", Some("18650"), None, Some(49.0), Some(3.5), 3.635, Some(2.5), Some(4.2), Some(1.0), Some(10.0), None, Some(400.0), Some(80.0), None, None),
    ("Toshiba", "SCiB 20Ah", None, Some("LTO"), Some(515.0), Some(20.0), 2.3, Some(1.5), Some(2.7), None, Some(160.0), Some(1.1), Some(20000.0), Some(80.0), Some(-30.0), Some(55.0)),
];

fn main() -> Result<()> {
    let text = |f: fn(&Row) -> Option<&'static str>| -> ArrayRef {
        Arc::new(StringArray::from(ROWS.iter().map(f).collect::<Vec<_>>()))
    };
    let number = |f: fn(&Row) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(ROWS.iter().map(f).collect::<Vec<_>>()))
    };

    let ids: ArrayRef = Arc::new(Int64Array::from_iter_values(1..=ROWS.len() as i64));
    let columns: Vec<(&str, ArrayRef)> = vec![
        ("id", ids),
        ("manufacturer", text(|r| Some(r.0))),
        ("model", text(|r| Some(r.1))),
        ("cell_format", text(|r| r.2)),
        ("chemistry", text(|r| r.3)),
        ("mass_g", number(|r| r.4)),
        ("capacity_ah", number(|r| r.5)),
        ("energy_wh", number(|r| r.5.map(|ah| ah * r.6))),
        ("voltage_nominal_v", number(|r| Some(r.6))),
        ("voltage_min_v", number(|r| r.7)),
        ("voltage_max_v", number(|r| r.8)),
        ("current_max_charge_a", number(|r| r.9)),
        ("current_max_discharge_a", number(|r| r.10)),
        ("internal_resistance__initial_mohm", number(|r| r.11)),
        ("charge_discharge_cycles", number(|r| r.12)),
        ("capacity_retention", number(|r| r.13)),
        ("temperature_oparating_min_celcius", number(|r| r.14)),
        ("temperature_oparating_max_celcius", number(|r| r.15)),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), *name != "id"))
            .collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let output_path = "sample_cells.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("Wrote {} cells to {output_path}", ROWS.len());
    Ok(())
}
