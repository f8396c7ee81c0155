use std::path::Path;

use anyhow::{bail, Context, Result};

use super::loader::{load_file, load_upload};
use super::model::{Column, Table, Value};

const IRIS_CSV: &str = include_str!("../../data/iris.csv");

/// Fields per row of the StatLib `cal_housing.data` file.
const STATLIB_FIELDS: usize = 9;

/// Fisher's Iris measurements: four numeric features and the species.
pub fn iris() -> Result<Table> {
    load_upload("iris.csv", IRIS_CSV.as_bytes()).context("parsing embedded Iris table")
}

/// The 1990 census California Housing table, read from `path`.
///
/// A `.data` file is the raw StatLib `cal_housing.data`; any other
/// extension goes through the upload loader (e.g. a CSV export with the
/// derived column names already in place).
pub fn california_housing(path: &Path) -> Result<Table> {
    if !path.exists() {
        bail!(
            "California Housing data not found at {}. Extract cal_housing.data from \
             StatLib's cal_housing.tgz there, or point `housing_path` at it.",
            path.display()
        );
    }
    let is_statlib = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("data"));
    if !is_statlib {
        return load_file(path);
    }

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let table = housing_from_statlib(&bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    log::info!("Loaded California Housing: {} rows", table.len());
    Ok(table)
}

/// Turn raw StatLib rows (longitude, latitude, housing median age, total
/// rooms, total bedrooms, population, households, median income, median
/// house value) into the per-household feature table.
fn housing_from_statlib(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut columns: [Vec<Value>; STATLIB_FIELDS] = Default::default();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        if record.len() != STATLIB_FIELDS {
            bail!("row {row_no}: expected {STATLIB_FIELDS} fields, found {}", record.len());
        }
        let mut raw = [0.0f64; STATLIB_FIELDS];
        for (slot, field) in raw.iter_mut().zip(record.iter()) {
            *slot = field
                .parse()
                .with_context(|| format!("row {row_no}: '{field}' is not a number"))?;
        }
        let [lon, lat, age, rooms, bedrooms, population, households, income, value] = raw;

        let derived = [
            income,
            age,
            rooms / households,
            bedrooms / households,
            population,
            population / households,
            lat,
            lon,
            value / 100_000.0,
        ];
        for (column, v) in columns.iter_mut().zip(derived) {
            column.push(Value::Float(v));
        }
    }

    let names = [
        "MedInc",
        "HouseAge",
        "AveRooms",
        "AveBedrms",
        "Population",
        "AveOccup",
        "Latitude",
        "Longitude",
        "MedHouseVal",
    ];
    Ok(Table::new(
        names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::infer(name, values))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnKind;

    const STATLIB_ROWS: &str = "\
-1.222300000000000000e+02,3.788000000000000000e+01,4.100000000000000000e+01,8.800000000000000000e+02,1.290000000000000000e+02,3.220000000000000000e+02,1.260000000000000000e+02,8.325200000000000387e+00,4.526000000000000000e+05
-122.220000,37.860000,21.000000,7099.000000,1106.000000,2401.000000,1138.000000,8.301400,358500.000000
";

    fn close(v: &Value, expected: f64) -> bool {
        v.as_f64().is_some_and(|x| (x - expected).abs() < 1e-6)
    }

    #[test]
    fn iris_has_four_features_and_species() {
        let t = iris().unwrap();
        assert_eq!(t.len(), 150);
        assert_eq!(t.names_of_kind(ColumnKind::Numeric).len(), 4);
        assert_eq!(t.names_of_kind(ColumnKind::Text), vec!["species"]);
        assert_eq!(t.distinct_values("species").len(), 3);
        assert_eq!(t.observed_range("petal length (cm)"), Some((1.0, 6.9)));
    }

    #[test]
    fn statlib_rows_become_household_averages() {
        let t = housing_from_statlib(STATLIB_ROWS.as_bytes()).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.names_of_kind(ColumnKind::Numeric).len(), 9);
        assert_eq!(t.column_names()[0], "MedInc");

        let row0 = |name: &str| t.column(name).unwrap().values[0].clone();
        assert!(close(&row0("MedInc"), 8.3252));
        assert!(close(&row0("HouseAge"), 41.0));
        assert!(close(&row0("AveRooms"), 6.984127));
        assert!(close(&row0("AveBedrms"), 1.023810));
        assert!(close(&row0("Population"), 322.0));
        assert!(close(&row0("AveOccup"), 2.555556));
        assert!(close(&row0("Latitude"), 37.88));
        assert!(close(&row0("Longitude"), -122.23));
        assert!(close(&row0("MedHouseVal"), 4.526));
        assert!(close(&t.column("MedHouseVal").unwrap().values[1], 3.585));
    }

    #[test]
    fn short_statlib_row_is_an_error() {
        let err = housing_from_statlib(b"1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("expected 9 fields"));
    }

    #[test]
    fn missing_housing_file_is_an_error() {
        let err = california_housing(Path::new("no/such/cal_housing.data")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn housing_file_is_read_from_disk() {
        let path = std::env::temp_dir().join("dataset-explorer-samples-cal_housing.data");
        std::fs::write(&path, STATLIB_ROWS).unwrap();
        let t = california_housing(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.observed_range("HouseAge"), Some((21.0, 41.0)));
    }
}
