//! Reading observation rows from CSV and JSON.
//!
//! CSV input is header driven: the five key columns are typed and every
//! other column becomes a measure. Cells that parse as numbers are stored
//! as numbers, empty cells as `null`, anything else verbatim.

use std::collections::BTreeMap;
use std::io::Read;

use naomi_area_models::AreaLevel;
use naomi_observation_models::ObservationRow;

use crate::ObservationError;

const KEY_COLUMNS: [&str; 5] = [
    "area_id",
    "area_level",
    "calendar_quarter",
    "age_group",
    "sex",
];

/// Column positions of the five key fields.
struct KeyColumns {
    area_id: usize,
    area_level: usize,
    calendar_quarter: usize,
    age_group: usize,
    sex: usize,
}

impl KeyColumns {
    fn locate(headers: &[String]) -> Result<Self, ObservationError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or(ObservationError::MissingColumn { column })
        };

        Ok(Self {
            area_id: find("area_id")?,
            area_level: find("area_level")?,
            calendar_quarter: find("calendar_quarter")?,
            age_group: find("age_group")?,
            sex: find("sex")?,
        })
    }
}

/// Reads observation rows from CSV with a header row.
///
/// # Errors
///
/// * [`ObservationError::MissingColumn`] if a key column is absent.
/// * [`ObservationError::InvalidValue`] if `area_level` is not a
///   non-negative integer.
/// * [`ObservationError::Csv`] on malformed CSV.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ObservationRow>, ObservationError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();
    let keys = KeyColumns::locate(&headers)?;

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let level_cell = cell(keys.area_level);
        let area_level: AreaLevel = level_cell
            .parse()
            .map_err(|_| ObservationError::InvalidValue {
                column: "area_level",
                value: level_cell.to_owned(),
                line,
            })?;

        let mut measures = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if KEY_COLUMNS.contains(&header.as_str()) {
                continue;
            }
            measures.insert(header.clone(), measure_value(cell(idx)));
        }

        rows.push(ObservationRow {
            area_id: cell(keys.area_id).to_owned(),
            area_level,
            calendar_quarter: cell(keys.calendar_quarter).to_owned(),
            age_group: cell(keys.age_group).into(),
            sex: cell(keys.sex).into(),
            measures,
        });
    }

    log::debug!("Parsed {} observation rows from CSV", rows.len());

    Ok(rows)
}

/// Reads observation rows from a JSON array.
///
/// # Errors
///
/// Returns [`ObservationError::Json`] if the input is not an array of rows.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<ObservationRow>, ObservationError> {
    let rows: Vec<ObservationRow> = serde_json::from_reader(reader)?;
    log::debug!("Parsed {} observation rows from JSON", rows.len());
    Ok(rows)
}

fn measure_value(cell: &str) -> serde_json::Value {
    if cell.is_empty() || cell.eq_ignore_ascii_case("NA") {
        return serde_json::Value::Null;
    }
    cell.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(
            || serde_json::Value::String(cell.to_owned()),
            serde_json::Value::Number,
        )
}
