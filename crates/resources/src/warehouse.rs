use crate::errors::ResourceError;
use crate::traits::Declare;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    String,
    Float64,
    Int64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// One column of a table schema. Field order here is the key order of the
/// serialised schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub mode: ColumnMode,
    pub description: String,
}

impl Column {
    pub fn nullable(name: &str, column_type: ColumnType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            mode: ColumnMode::Nullable,
            description: description.to_string(),
        }
    }
}

/// Columns of the transformed weather record, in insertion order.
pub fn weather_columns() -> Vec<Column> {
    vec![
        Column::nullable("longitude", ColumnType::Float64, "City longitude"),
        Column::nullable("latitude", ColumnType::Float64, "City latitude"),
        Column::nullable("weather_main", ColumnType::String, "Group of weather parameters"),
        Column::nullable("weather_description", ColumnType::String, "Weather condition within the group"),
        Column::nullable("temperature", ColumnType::Float64, "Temperature"),
        Column::nullable("temperature_min", ColumnType::Float64, "Minimum observed temperature"),
        Column::nullable("temperature_max", ColumnType::Float64, "Maximum observed temperature"),
        Column::nullable("pressure", ColumnType::Int64, "Atmospheric pressure in hPa"),
        Column::nullable("humidity", ColumnType::Int64, "Humidity in percent"),
        Column::nullable("name", ColumnType::String, "City name"),
    ]
}

/// Serialise a column list to the JSON array string the table resource
/// expects.
pub fn schema_json(columns: &[Column]) -> Result<String, ResourceError> {
    serde_json::to_string(columns).map_err(|e| ResourceError::serde_json("google_bigquery_table", e))
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BigqueryDataset {
    pub dataset_id: String,
    pub location: String,
}

impl Declare for BigqueryDataset {
    fn kind(&self) -> &'static str {
        "google_bigquery_dataset"
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BigqueryTable {
    /// `${google_bigquery_dataset.<name>.dataset_id}`
    pub dataset_id: String,
    pub table_id: String,
    pub schema: String,
    pub deletion_protection: bool,
}

impl BigqueryTable {
    pub fn with_columns(
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
        columns: &[Column],
    ) -> Result<Self, ResourceError> {
        if columns.is_empty() {
            return Err(ResourceError::invalid(
                "google_bigquery_table",
                "a table needs at least one column",
            ));
        }
        Ok(Self {
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
            schema: schema_json(columns)?,
            deletion_protection: false,
        })
    }
}

impl Declare for BigqueryTable {
    fn kind(&self) -> &'static str {
        "google_bigquery_table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn schema_json_keeps_column_order_and_types() {
        let columns = weather_columns();
        assert_eq!(columns.len(), 10);

        let raw = schema_json(&columns).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 10);

        for (col, value) in columns.iter().zip(&parsed) {
            assert_eq!(value["name"], col.name.as_str());
            assert_eq!(value["mode"], "NULLABLE");
        }
        let pairs = parsed
            .iter()
            .map(|v| (v["name"].as_str().unwrap(), v["type"].as_str().unwrap()))
            .collect::<Vec<_>>();
        assert_eq!(pairs[0], ("longitude", "FLOAT64"));
        assert_eq!(pairs[2], ("weather_main", "STRING"));
        assert_eq!(pairs[7], ("pressure", "INT64"));
        assert_eq!(pairs[9], ("name", "STRING"));
    }

    #[test]
    fn schema_json_key_order_is_name_type_mode_description() {
        let raw = schema_json(&[Column::nullable("pressure", ColumnType::Int64, "hPa")]).unwrap();
        assert_eq!(
            raw,
            r#"[{"name":"pressure","type":"INT64","mode":"NULLABLE","description":"hPa"}]"#
        );
    }

    #[test]
    fn table_without_columns_is_rejected() {
        let err = BigqueryTable::with_columns("ds", "t", &[]).unwrap_err();
        assert!(matches!(err, ResourceError::Invalid { .. }));
    }
}
