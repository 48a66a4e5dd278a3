//! Material Catalog - Immutable per-material carbon and cost coefficients
//!
//! The catalog is reference data: built once at process start (from the
//! built-in reference table or a CSV file) and shared read-only between the
//! decision engine, the recommendation prompt and the HTTP echo.
//!
//! CSV layout (header required):
//! `material,category,unit,carbon_kg_per_unit,cost_per_unit,source`

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

/// One row of the material catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    #[serde(alias = "material")]
    pub name: String,
    pub category: String,
    pub unit: String,
    /// kg CO2e per unit
    #[serde(alias = "carbon_kg_per_unit")]
    pub carbon_per_unit: f64,
    /// currency per unit
    #[serde(alias = "cost_per_unit")]
    pub cost_per_unit: f64,
    /// Free-text source tag (e.g. "ICE Database v3.0")
    #[serde(alias = "source")]
    pub provenance: String,
}

impl MaterialRecord {
    pub fn new(
        name: &str,
        category: &str,
        unit: &str,
        carbon_per_unit: f64,
        cost_per_unit: f64,
        provenance: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            unit: unit.to_string(),
            carbon_per_unit,
            cost_per_unit,
            provenance: provenance.to_string(),
        }
    }
}

/// Catalog construction failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate material name in catalog: {0}")]
    DuplicateMaterial(String),

    #[error("Non-finite coefficient for material '{0}'")]
    InvalidCoefficient(String),

    #[error("Catalog is empty")]
    Empty,
}

/// Immutable material catalog with O(1) name lookup
///
/// Record order is preserved (it is echoed to callers and rendered into the
/// recommendation prompt in the same order).
#[derive(Debug, Clone)]
pub struct MaterialCatalog {
    records: Vec<MaterialRecord>,
    index: FxHashMap<String, usize>,
}

impl MaterialCatalog {
    /// Build a catalog, rejecting duplicate names and non-finite coefficients
    pub fn from_records(records: Vec<MaterialRecord>) -> std::result::Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = FxHashMap::default();
        for (idx, record) in records.iter().enumerate() {
            if !record.carbon_per_unit.is_finite() || !record.cost_per_unit.is_finite() {
                return Err(CatalogError::InvalidCoefficient(record.name.clone()));
            }
            if index.insert(record.name.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateMaterial(record.name.clone()));
            }
        }

        Ok(Self { records, index })
    }

    /// Built-in reference catalog (ICE Database v3.0 + OpenLCA)
    pub fn reference() -> Self {
        let records = vec![
            MaterialRecord::new("Concrete (Standard)", "Structure", "kg", 0.13, 0.06, "ICE Database v3.0"),
            MaterialRecord::new("Concrete (Low-Carbon)", "Structure", "kg", 0.08, 0.08, "ICE Database v3.0"),
            MaterialRecord::new("Steel (Virgin)", "Structure", "kg", 2.30, 1.20, "ICE Database v3.0"),
            MaterialRecord::new("Steel (Recycled)", "Structure", "kg", 0.43, 1.35, "ICE Database v3.0"),
            MaterialRecord::new("Cross-Laminated Timber", "Structure", "kg", 0.50, 1.50, "ICE Database v3.0"),
            MaterialRecord::new("Softwood Timber", "Structure", "kg", 0.45, 0.80, "ICE Database v3.0"),
            MaterialRecord::new("Brick", "Envelope", "kg", 0.22, 0.30, "ICE Database v3.0"),
            MaterialRecord::new("Glass", "Envelope", "kg", 1.44, 2.50, "ICE Database v3.0"),
            MaterialRecord::new("Mineral Wool", "Insulation", "kg", 1.20, 1.80, "ICE Database v3.0"),
            MaterialRecord::new("EPS Insulation", "Insulation", "kg", 3.30, 1.10, "ICE Database v3.0"),
            MaterialRecord::new("Hempcrete", "Insulation/Structure", "kg", -0.10, 2.00, "OpenLCA"),
            MaterialRecord::new("Aluminium (Virgin)", "Envelope", "kg", 12.79, 3.50, "ICE Database v3.0"),
            MaterialRecord::new("Aluminium (Recycled)", "Envelope", "kg", 1.81, 3.80, "ICE Database v3.0"),
        ];

        // Static table: names are unique and coefficients finite
        let index = records
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.name.clone(), idx))
            .collect();
        Self { records, index }
    }

    /// Load catalog from CSV
    pub fn from_csv(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load material catalog: {:?}", path))?;

        let records = Self::records_from_frame(&df)?;
        tracing::info!("Loaded {} materials from {:?}", records.len(), path);

        Self::from_records(records).with_context(|| format!("Invalid material catalog: {:?}", path))
    }

    fn records_from_frame(df: &DataFrame) -> Result<Vec<MaterialRecord>> {
        let str_col = |name: &str| -> Result<StringChunked> {
            let col = df
                .column(name)
                .with_context(|| format!("Column '{}' not found", name))?;
            Ok(col
                .str()
                .with_context(|| format!("Column '{}' is not string type", name))?
                .clone())
        };
        let f64_col = |name: &str| -> Result<Float64Chunked> {
            let col = df
                .column(name)
                .with_context(|| format!("Column '{}' not found", name))?
                .cast(&DataType::Float64)
                .with_context(|| format!("Column '{}' is not numeric", name))?;
            Ok(col.f64()?.clone())
        };

        let names = str_col("material")?;
        let categories = str_col("category")?;
        let units = str_col("unit")?;
        let sources = str_col("source")?;
        let carbon = f64_col("carbon_kg_per_unit")?;
        let cost = f64_col("cost_per_unit")?;

        let mut records = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            // Rows without a name or coefficients are skipped, not defaulted
            let (Some(name), Some(carbon_per_unit), Some(cost_per_unit)) =
                (names.get(idx), carbon.get(idx), cost.get(idx))
            else {
                tracing::warn!("Skipping incomplete catalog row {}", idx + 1);
                continue;
            };

            records.push(MaterialRecord {
                name: name.trim().to_string(),
                category: categories.get(idx).unwrap_or("").to_string(),
                unit: units.get(idx).unwrap_or("kg").to_string(),
                carbon_per_unit,
                cost_per_unit,
                provenance: sources.get(idx).unwrap_or("").to_string(),
            });
        }

        Ok(records)
    }

    /// Look up a material by its unique name
    pub fn get(&self, name: &str) -> Option<&MaterialRecord> {
        self.index.get(name).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn records(&self) -> &[MaterialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of this catalog without the named material (fixture helper)
    pub fn without(&self, name: &str) -> std::result::Result<Self, CatalogError> {
        let records = self
            .records
            .iter()
            .filter(|r| r.name != name)
            .cloned()
            .collect();
        Self::from_records(records)
    }
}

impl Serialize for MaterialCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_reference_catalog_lookup() {
        let catalog = MaterialCatalog::reference();
        assert_eq!(catalog.len(), 13);

        let hemp = catalog.get("Hempcrete").unwrap();
        assert_relative_eq!(hemp.carbon_per_unit, -0.10, epsilon = 1e-12);
        assert_eq!(hemp.provenance, "OpenLCA");
        assert!(catalog.get("Unobtainium").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let records = vec![
            MaterialRecord::new("Brick", "Envelope", "kg", 0.22, 0.30, "a"),
            MaterialRecord::new("Brick", "Envelope", "kg", 0.25, 0.35, "b"),
        ];
        assert_eq!(
            MaterialCatalog::from_records(records).unwrap_err(),
            CatalogError::DuplicateMaterial("Brick".to_string())
        );
    }

    #[test]
    fn test_non_finite_coefficient_rejected() {
        let records = vec![MaterialRecord::new("Glass", "Envelope", "kg", f64::NAN, 2.5, "x")];
        assert!(matches!(
            MaterialCatalog::from_records(records),
            Err(CatalogError::InvalidCoefficient(_))
        ));
    }

    #[test]
    fn test_without_removes_material() {
        let catalog = MaterialCatalog::reference().without("Hempcrete").unwrap();
        assert_eq!(catalog.len(), 12);
        assert!(!catalog.contains("Hempcrete"));
        assert!(catalog.contains("Mineral Wool"));
    }

    #[test]
    fn test_serializes_as_record_array() {
        let catalog = MaterialCatalog::reference();
        let json = serde_json::to_value(&catalog).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0]["name"], "Concrete (Standard)");
        assert_eq!(rows[0]["carbonPerUnit"], 0.13);
    }

    #[test]
    fn test_load_from_csv() {
        let dir = std::env::temp_dir().join(format!("greenbuild_catalog_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("materials.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "material,category,unit,carbon_kg_per_unit,cost_per_unit,source").unwrap();
        writeln!(file, "\"Brick\",\"Envelope\",\"kg\",0.22,0.30,\"ICE Database v3.0\"").unwrap();
        writeln!(file, "\"Hempcrete\",\"Insulation/Structure\",\"kg\",-0.10,2.00,\"OpenLCA\"").unwrap();
        drop(file);

        let catalog = MaterialCatalog::from_csv(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_relative_eq!(catalog.get("Brick").unwrap().cost_per_unit, 0.30, epsilon = 1e-12);
        assert_relative_eq!(catalog.get("Hempcrete").unwrap().carbon_per_unit, -0.10, epsilon = 1e-12);

        std::fs::remove_dir_all(&dir).ok();
    }
}
