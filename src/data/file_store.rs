use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{CellField, CellSpec, PageData};
use super::store::{CellQuery, CellStore, StoreError};

/// A local export of the cell table.
///
/// Supported formats:
/// * `.json`    – `[{ "id": 1, "manufacturer": ... }, ...]` or `{ "cells": [...] }`
/// * `.csv`     – header row with the store's column names
/// * `.parquet` – one column per field, nullable
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CellStore for FileStore {
    fn fetch_cells(&self, query: &CellQuery) -> Result<Option<Vec<CellSpec>>, StoreError> {
        let mut rows = load_file(&self.path).map_err(|e| StoreError::File {
            path: self.path.display().to_string(),
            message: format!("{e:#}"),
        })?;
        query.apply_order(&mut rows);
        Ok(Some(rows))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Dispatch by extension
// ---------------------------------------------------------------------------

pub fn load_file(path: &Path) -> Result<Vec<CellSpec>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonExport {
    Rows(Vec<CellSpec>),
    Page(PageData),
}

fn load_json(path: &Path) -> Result<Vec<CellSpec>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let export: JsonExport = serde_json::from_str(&text)
        .context("Expected an array of cells or an object with a `cells` array")?;
    Ok(match export {
        JsonExport::Rows(rows) => rows,
        JsonExport::Page(page) => page.cells,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Empty fields are read as absent values.
fn load_csv(path: &Path) -> Result<Vec<CellSpec>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?;
    if !headers.iter().any(|h| h == "id") {
        bail!("CSV missing 'id' column");
    }

    reader
        .deserialize::<CellSpec>()
        .enumerate()
        .map(|(row_no, result)| result.with_context(|| format!("CSV row {row_no}")))
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Columns are looked up by store name; missing columns read as null.
/// Numeric columns may be any int or float width.
fn load_parquet(path: &Path) -> Result<Vec<CellSpec>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut cells = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, &mut cells)?;
    }
    Ok(cells)
}

fn read_batch(batch: &RecordBatch, out: &mut Vec<CellSpec>) -> Result<()> {
    let schema = batch.schema();
    let column = |name: &str| schema.index_of(name).ok().map(|i| batch.column(i));

    let id_col = column("id").context("Parquet file missing 'id' column")?;
    let fields: Vec<(CellField, Option<&Arc<dyn Array>>)> = CellField::ALL
        .iter()
        .map(|&f| (f, column(f.column_name())))
        .collect();

    for row in 0..batch.num_rows() {
        let id = extract_number(id_col, row)
            .with_context(|| format!("Row {row}: null or non-numeric 'id'"))?;
        let mut cell = CellSpec {
            id: id as i64,
            ..Default::default()
        };
        for (field, col) in &fields {
            let Some(col) = col else { continue };
            if field.is_text() {
                set_text(&mut cell, *field, extract_text(col, row));
            } else {
                set_number(&mut cell, *field, extract_number(col, row));
            }
        }
        out.push(cell);
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

fn extract_text(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|s| s.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => extract_number(col, row).map(|n| n.to_string()),
    }
}

fn extract_number(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row) as f64),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        _ => None,
    }
}

fn set_text(cell: &mut CellSpec, field: CellField, value: Option<String>) {
    match field {
        CellField::Manufacturer => cell.manufacturer = value,
        CellField::Model => cell.model = value,
        CellField::CellFormat => cell.cell_format = value,
        CellField::Chemistry => cell.chemistry = value,
        _ => {}
    }
}

fn set_number(cell: &mut CellSpec, field: CellField, value: Option<f64>) {
    use CellField::*;
    let slot = match field {
        MassG => &mut cell.mass_g,
        CapacityAh => &mut cell.capacity_ah,
        EnergyWh => &mut cell.energy_wh,
        VoltageNominalV => &mut cell.voltage_nominal_v,
        VoltageMinV => &mut cell.voltage_min_v,
        VoltageMaxV => &mut cell.voltage_max_v,
        CurrentMaxChargeA => &mut cell.current_max_charge_a,
        CurrentMaxDischargeA => &mut cell.current_max_discharge_a,
        InternalResistanceMohm => &mut cell.internal_resistance_initial_mohm,
        ChargeDischargeCycles => &mut cell.charge_discharge_cycles,
        CapacityRetention => &mut cell.capacity_retention,
        TemperatureMinC => &mut cell.temperature_oparating_min_celcius,
        TemperatureMaxC => &mut cell.temperature_oparating_max_celcius,
        Manufacturer | Model | CellFormat | Chemistry => return,
    };
    *slot = value;
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn json_array_loads() {
        let file = write_temp(
            ".json",
            r#"[{"id": 1, "manufacturer": "EVE", "model": "LF105", "capacity_ah": 105, "chemistry": "LiFePO4"},
                {"id": 2, "manufacturer": null, "internal_resistance__initial_mohm": 0.25}]"#,
        );
        let cells = load_file(file.path()).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].capacity_ah, Some(105.0));
        assert_eq!(cells[1].manufacturer, None);
        assert_eq!(cells[1].internal_resistance_initial_mohm, Some(0.25));
    }

    #[test]
    fn json_page_object_loads() {
        let file = write_temp(".json", r#"{"cells": [{"id": 3, "model": "P45B"}]}"#);
        let cells = load_file(file.path()).unwrap();
        assert_eq!(cells[0].model.as_deref(), Some("P45B"));
    }

    #[test]
    fn csv_empty_fields_are_absent() {
        let file = write_temp(
            ".csv",
            "id,manufacturer,model,mass_g,capacity_retention\n\
             1,Samsung,INR21700-50E,69,\n\
             2,,LF280K,,80\n",
        );
        let cells = load_file(file.path()).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].mass_g, Some(69.0));
        assert_eq!(cells[0].capacity_retention, None);
        assert_eq!(cells[1].manufacturer, None);
        assert_eq!(cells[1].capacity_retention, Some(80.0));
    }

    #[test]
    fn csv_without_id_is_rejected() {
        let file = write_temp(".csv", "manufacturer,model\nEVE,LF105\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("'id'"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = write_temp(".xlsx", "");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn parquet_loads_mixed_widths_and_nulls() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("manufacturer", DataType::Utf8, true),
            Field::new("charge_discharge_cycles", DataType::Int32, true),
            Field::new("voltage_nominal_v", DataType::Float32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![10, 11])),
                Arc::new(StringArray::from(vec![Some("Molicel"), None])),
                Arc::new(Int32Array::from(vec![Some(500), None])),
                Arc::new(Float32Array::from(vec![Some(3.6), Some(3.2)])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let cells = load_file(file.path()).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].id, 10);
        assert_eq!(cells[0].manufacturer.as_deref(), Some("Molicel"));
        assert_eq!(cells[0].charge_discharge_cycles, Some(500.0));
        assert!((cells[0].voltage_nominal_v.unwrap() - 3.6).abs() < 1e-6);
        assert_eq!(cells[1].manufacturer, None);
        assert_eq!(cells[1].charge_discharge_cycles, None);
        assert_eq!(cells[1].energy_wh, None);
    }

    #[test]
    fn store_applies_query_order() {
        let file = write_temp(
            ".json",
            r#"[{"id": 1, "manufacturer": "Samsung", "model": "50E"},
                {"id": 2, "manufacturer": "EVE", "model": "LF280K"},
                {"id": 3, "manufacturer": "EVE", "model": "LF105"}]"#,
        );
        let store = FileStore::new(file.path());
        let rows = store
            .fetch_cells(&CellQuery::cells("cells"))
            .unwrap()
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn store_reports_missing_file() {
        let store = FileStore::new("/nonexistent/cells.json");
        let err = store.fetch_cells(&CellQuery::cells("cells")).unwrap_err();
        assert!(matches!(err, StoreError::File { .. }));
    }
}
