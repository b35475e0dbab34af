//! Dataset catalog model and client.
//!
//! The catalog exposes two endpoints: a listing of every dataset, and a
//! per-dataset detail carrying the resource list. Both return the same
//! [`Dataset`] shape. Everything downstream only depends on the [`Catalog`]
//! trait, so tests can substitute an in-memory catalog.
//!
//! # Example
//!
//! ```no_run
//! use transit_downloader::catalog::{AttributeTable, Catalog, HttpCatalog};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = HttpCatalog::new("https://transport.data.gouv.fr")?;
//! let datasets = catalog.list_datasets().await?;
//! let table = AttributeTable::from_datasets(&datasets);
//! println!("{} datasets", table.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

pub use client::{CATALOG_TIMEOUT_SECS, DEFAULT_CATALOG_URL, HttpCatalog};
pub use error::CatalogError;

/// Timestamp layout used by the catalog (`2024-03-01T08:15:00.000000Z`).
const CATALOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Read access to the remote dataset catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Lists every dataset the catalog publishes.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the listing cannot be fetched or decoded.
    async fn list_datasets(&self) -> Result<Vec<Dataset>, CatalogError>;

    /// Fetches one dataset with its full resource list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the dataset cannot be fetched or decoded.
    async fn get_dataset(&self, id: &str) -> Result<Dataset, CatalogError>;
}

/// One dataset as returned by the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default, rename = "type")]
    pub dataset_type: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// One downloadable file entry within a dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "optional_id_from_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub format: ResourceFormat,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
}

impl Resource {
    /// Whether the catalog flags this resource as currently downloadable.
    #[must_use]
    pub fn available(&self) -> bool {
        self.is_available.unwrap_or(false)
    }
}

/// Declared format of a resource.
///
/// The catalog sometimes publishes a list of formats for one resource; such
/// resources are ambiguous and are kept distinct from the single-value case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResourceFormat {
    /// No format, `null`, empty string, or a non-string value.
    #[default]
    Missing,
    /// A single declared format.
    Single(String),
    /// Several declared formats.
    Multiple(Vec<String>),
}

impl ResourceFormat {
    /// Returns the format when exactly one is declared.
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(format) => Some(format),
            Self::Missing | Self::Multiple(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for ResourceFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(format) if !format.is_empty() => Self::Single(format),
            serde_json::Value::Array(items) => Self::Multiple(
                items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => Self::Missing,
        })
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    optional_id_from_string_or_number(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("dataset id must be a string or number"))
}

fn optional_id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(id) => Some(id),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

/// Parses a catalog timestamp such as `2024-03-01T08:15:00.123Z`.
#[must_use]
pub fn parse_catalog_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, CATALOG_TIMESTAMP_FORMAT).ok()
}

/// Per-dataset attributes kept for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetAttributes {
    pub id: String,
    pub title: Option<String>,
    pub updated: Option<NaiveDate>,
    pub dataset_type: Option<String>,
    pub page_url: Option<String>,
}

impl From<&Dataset> for DatasetAttributes {
    fn from(dataset: &Dataset) -> Self {
        Self {
            id: dataset.id.clone(),
            title: dataset.title.clone(),
            updated: dataset
                .updated
                .as_deref()
                .and_then(parse_catalog_timestamp)
                .map(|timestamp| timestamp.date()),
            dataset_type: dataset.dataset_type.clone(),
            page_url: dataset.page_url.clone(),
        }
    }
}

/// Read-only lookup table of dataset attributes keyed by dataset id.
///
/// Built once from the catalog listing and shared across workers behind an
/// `Arc`; no locking is needed because it is never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    entries: HashMap<String, DatasetAttributes>,
    order: Vec<String>,
}

impl AttributeTable {
    /// Builds the table from a catalog listing. The first occurrence of a
    /// duplicated id wins.
    #[must_use]
    pub fn from_datasets(datasets: &[Dataset]) -> Self {
        let mut table = Self::default();
        for dataset in datasets {
            table.insert(DatasetAttributes::from(dataset));
        }
        table
    }

    /// Adds one dataset's attributes unless the id is already present.
    pub fn insert(&mut self, attributes: DatasetAttributes) {
        if self.entries.contains_key(&attributes.id) {
            return;
        }
        self.order.push(attributes.id.clone());
        self.entries.insert(attributes.id.clone(), attributes);
    }

    /// Looks up a dataset by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DatasetAttributes> {
        self.entries.get(id)
    }

    /// Dataset ids in catalog order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dataset(json: &str) -> Dataset {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_resource_format_single_string() {
        let resource: Resource = serde_json::from_str(r#"{"format": "GTFS"}"#).unwrap();
        assert_eq!(resource.format, ResourceFormat::Single("GTFS".to_string()));
        assert_eq!(resource.format.as_single(), Some("GTFS"));
    }

    #[test]
    fn test_resource_format_list_is_multiple() {
        let resource: Resource = serde_json::from_str(r#"{"format": ["GTFS", "NeTEx"]}"#).unwrap();
        assert!(matches!(resource.format, ResourceFormat::Multiple(ref f) if f.len() == 2));
        assert_eq!(resource.format.as_single(), None);
    }

    #[test]
    fn test_resource_format_absent_null_or_empty_is_missing() {
        for json in [r"{}", r#"{"format": null}"#, r#"{"format": ""}"#, r#"{"format": 3}"#] {
            let resource: Resource = serde_json::from_str(json).unwrap();
            assert_eq!(resource.format, ResourceFormat::Missing, "input: {json}");
        }
    }

    #[test]
    fn test_resource_available_defaults_to_false() {
        let resource: Resource = serde_json::from_str(r#"{"is_available": null}"#).unwrap();
        assert!(!resource.available());
        let resource: Resource = serde_json::from_str(r#"{"is_available": true}"#).unwrap();
        assert!(resource.available());
    }

    #[test]
    fn test_resource_numeric_id_is_stringified() {
        let resource: Resource = serde_json::from_str(r#"{"id": 81234}"#).unwrap();
        assert_eq!(resource.id.as_deref(), Some("81234"));
    }

    #[test]
    fn test_dataset_without_id_is_rejected() {
        let result = serde_json::from_str::<Dataset>(r#"{"title": "No id"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_catalog_timestamp_with_fraction() {
        let parsed = parse_catalog_timestamp("2024-03-01T08:15:00.123456Z").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_catalog_timestamp_rejects_offset_form() {
        assert!(parse_catalog_timestamp("2024-03-01T08:15:00+02:00").is_none());
        assert!(parse_catalog_timestamp("").is_none());
    }

    #[test]
    fn test_dataset_attributes_from_dataset() {
        let ds = dataset(
            r#"{"id": "abc", "title": "Bus Network", "updated": "2023-11-20T10:00:00.000Z",
                "type": "public-transit", "page_url": "https://catalog.example/datasets/abc"}"#,
        );
        let attributes = DatasetAttributes::from(&ds);
        assert_eq!(attributes.id, "abc");
        assert_eq!(attributes.title.as_deref(), Some("Bus Network"));
        assert_eq!(attributes.updated, NaiveDate::from_ymd_opt(2023, 11, 20));
        assert_eq!(attributes.dataset_type.as_deref(), Some("public-transit"));
    }

    #[test]
    fn test_attribute_table_lookup_and_order() {
        let datasets = vec![
            dataset(r#"{"id": "b", "title": "Second"}"#),
            dataset(r#"{"id": "a", "title": "First"}"#),
            dataset(r#"{"id": "b", "title": "Duplicate"}"#),
        ];
        let table = AttributeTable::from_datasets(&datasets);
        assert_eq!(table.len(), 2);
        assert_eq!(table.ids(), ["b".to_string(), "a".to_string()]);
        assert_eq!(table.get("b").unwrap().title.as_deref(), Some("Second"));
        assert!(table.get("missing").is_none());
    }
}
