//! Reference-data catalog loading.
//!
//! A catalog is a TOML document listing plant types, the symptom dictionary,
//! and diseases. Diseases refer to symptoms and plant types by name, which
//! keeps catalogs readable and independent of generated IDs:
//!
//! ```toml
//! plant_types = ["Tomato", "Rose"]
//!
//! [[symptoms]]
//! name = "white spots"
//! category = "leaf"
//! weight = 0.6
//!
//! [[diseases]]
//! name = "Powdery Mildew"
//! plant_type = "Rose"
//! symptoms = [{ name = "white spots", weight = 0.6 }]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::repos::NewDiseaseSymptom;
use crate::service::PhytoService;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub plant_types: Vec<String>,
    #[serde(default)]
    pub symptoms: Vec<CatalogSymptom>,
    #[serde(default)]
    pub diseases: Vec<CatalogDisease>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogSymptom {
    pub name: String,
    pub category: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogDisease {
    pub name: String,
    #[serde(default)]
    pub plant_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    pub symptoms: Vec<CatalogDiseaseSymptom>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogDiseaseSymptom {
    pub name: String,
    pub weight: f64,
}

/// Counts of rows inserted by [`PhytoService::seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub plant_types: usize,
    pub symptoms: usize,
    pub diseases: usize,
}

impl Catalog {
    /// Parse a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Catalog` on malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, DatabaseError> {
        toml::from_str(text).map_err(|e| DatabaseError::Catalog(format!("invalid catalog: {e}")))
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Catalog` if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, DatabaseError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DatabaseError::Catalog(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}

impl PhytoService {
    /// Insert every plant type, symptom and disease of `catalog`.
    ///
    /// Names already present in the database are reused rather than
    /// duplicated, so seeding the same catalog twice only adds diseases again
    /// if they were removed. A disease referring to an unknown symptom or
    /// plant type aborts with `DatabaseError::Catalog`.
    pub async fn seed_catalog(&self, catalog: &Catalog) -> Result<SeedReport, DatabaseError> {
        let mut report = SeedReport::default();

        let mut plant_ids: HashMap<String, String> = HashMap::new();
        for name in &catalog.plant_types {
            let key = name.trim().to_lowercase();
            let plant_type = match self.find_plant_type_by_name(name).await? {
                Some(existing) if existing.name.eq_ignore_ascii_case(name.trim()) => existing,
                _ => {
                    report.plant_types += 1;
                    self.create_plant_type(name).await?
                }
            };
            plant_ids.insert(key, plant_type.id);
        }

        let mut symptom_ids: HashMap<String, String> = HashMap::new();
        for symptom in &catalog.symptoms {
            let entry = match self.find_symptom_by_name(&symptom.name).await? {
                Some(existing) => existing,
                None => {
                    report.symptoms += 1;
                    self.create_symptom(&symptom.name, &symptom.category, symptom.weight)
                        .await?
                }
            };
            symptom_ids.insert(symptom.name.trim().to_lowercase(), entry.id);
        }

        for disease in &catalog.diseases {
            if self
                .find_disease_by_name(&disease.name)
                .await?
                .is_some_and(|d| d.name.eq_ignore_ascii_case(disease.name.trim()))
            {
                tracing::debug!(disease = %disease.name, "disease already seeded, skipping");
                continue;
            }

            let plant_type_id = match &disease.plant_type {
                Some(name) => Some(
                    plant_ids
                        .get(&name.trim().to_lowercase())
                        .cloned()
                        .ok_or_else(|| {
                            DatabaseError::Catalog(format!(
                                "disease '{}' refers to unknown plant type '{name}'",
                                disease.name
                            ))
                        })?,
                ),
                None => None,
            };

            let mut symptoms = Vec::with_capacity(disease.symptoms.len());
            for symptom in &disease.symptoms {
                let symptom_id = symptom_ids
                    .get(&symptom.name.trim().to_lowercase())
                    .cloned()
                    .ok_or_else(|| {
                        DatabaseError::Catalog(format!(
                            "disease '{}' refers to unknown symptom '{}'",
                            disease.name, symptom.name
                        ))
                    })?;
                symptoms.push(NewDiseaseSymptom {
                    symptom_id,
                    weight: symptom.weight,
                });
            }

            self.create_disease(
                &disease.name,
                plant_type_id.as_deref(),
                disease.description.as_deref(),
                disease.treatment.as_deref(),
                &symptoms,
            )
            .await?;
            report.diseases += 1;
        }

        tracing::info!(
            plant_types = report.plant_types,
            symptoms = report.symptoms,
            diseases = report.diseases,
            "catalog seeded"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::test_service;

    const CATALOG: &str = r#"
plant_types = ["Rose", "Tomato"]

[[symptoms]]
name = "white spots"
category = "leaf"
weight = 0.6

[[symptoms]]
name = "leaf curl"
category = "leaf"
weight = 0.4

[[diseases]]
name = "Powdery Mildew"
plant_type = "Rose"
description = "Fungal coating on leaves"
symptoms = [
    { name = "white spots", weight = 0.6 },
    { name = "leaf curl", weight = 0.4 },
]
"#;

    #[test]
    fn parses_catalog() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.plant_types, vec!["Rose", "Tomato"]);
        assert_eq!(catalog.symptoms.len(), 2);
        assert_eq!(catalog.diseases[0].symptoms[1].name, "leaf curl");
        assert!(Catalog::from_toml_str("plant_types = 3").is_err());
    }

    #[tokio::test]
    async fn seed_inserts_everything_once() {
        let svc = test_service().await;
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();

        let first = svc.seed_catalog(&catalog).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                plant_types: 2,
                symptoms: 2,
                diseases: 1
            }
        );

        let second = svc.seed_catalog(&catalog).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let mildew = svc.find_disease_by_name("powdery mildew").await.unwrap().unwrap();
        assert_eq!(mildew.plant_type_name.as_deref(), Some("Rose"));
        assert_eq!(mildew.symptoms.len(), 2);
    }

    #[tokio::test]
    async fn unknown_symptom_reference_fails() {
        let svc = test_service().await;
        let catalog = Catalog::from_toml_str(
            r#"
[[diseases]]
name = "Ghost Blight"
symptoms = [{ name = "invisible spots", weight = 1.0 }]
"#,
        )
        .unwrap();

        let err = svc.seed_catalog(&catalog).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Catalog(msg) if msg.contains("invisible spots")));
    }

    #[tokio::test]
    async fn sample_catalog_seeds() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog.sample.toml");
        let catalog = Catalog::from_path(&path).unwrap();

        let svc = test_service().await;
        let report = svc.seed_catalog(&catalog).await.unwrap();
        assert_eq!(report.plant_types, catalog.plant_types.len());
        assert_eq!(report.diseases, catalog.diseases.len());
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, CATALOG).unwrap();
        assert_eq!(Catalog::from_path(&path).unwrap().diseases.len(), 1);
        assert!(Catalog::from_path(&dir.path().join("missing.toml")).is_err());
    }
}
