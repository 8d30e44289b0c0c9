//! Disease repository: knowledge-base diseases and their weighted symptoms.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;

use phyto_core::entities::{Disease, DiseaseSymptom};
use phyto_core::ids::PREFIX_DISEASE;
use phyto_core::matches::DiseaseWithMatchInfo;

use crate::error::DatabaseError;
use crate::helpers::{escape_like, format_datetime, get_bool, get_opt_string, placeholders};
use crate::service::PhytoService;

const DISEASE_SELECT: &str = "SELECT d.id, d.name, d.plant_type_id, p.name, d.description, d.treatment, d.active
     FROM diseases d LEFT JOIN plant_types p ON p.id = d.plant_type_id";

/// A symptom to attach to a new disease.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiseaseSymptom {
    pub symptom_id: String,
    pub weight: f64,
}

fn row_to_disease(row: &libsql::Row) -> Result<Disease, DatabaseError> {
    Ok(Disease {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        plant_type_id: get_opt_string(row, 2)?,
        plant_type_name: get_opt_string(row, 3)?,
        description: get_opt_string(row, 4)?,
        treatment: get_opt_string(row, 5)?,
        active: get_bool(row, 6)?,
        symptoms: Vec::new(),
    })
}

impl PhytoService {
    /// Insert a disease and its symptom associations in one transaction.
    ///
    /// Symptom order is preserved. Weights must be positive and symptom IDs
    /// unique within the disease.
    pub async fn create_disease(
        &self,
        name: &str,
        plant_type_id: Option<&str>,
        description: Option<&str>,
        treatment: Option<&str>,
        symptoms: &[NewDiseaseSymptom],
    ) -> Result<Disease, DatabaseError> {
        let mut seen = HashSet::new();
        for symptom in symptoms {
            if !(symptom.weight.is_finite() && symptom.weight > 0.0) {
                return Err(DatabaseError::InvalidState(format!(
                    "disease '{name}': weight of {} must be positive, got {}",
                    symptom.symptom_id, symptom.weight
                )));
            }
            if !seen.insert(symptom.symptom_id.as_str()) {
                return Err(DatabaseError::InvalidState(format!(
                    "disease '{name}': symptom {} listed twice",
                    symptom.symptom_id
                )));
            }
        }

        let id = self.db().generate_id(PREFIX_DISEASE).await?;
        let now = Utc::now();

        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "INSERT INTO diseases (id, name, plant_type_id, description, treatment, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            libsql::params![
                id.as_str(),
                name.trim(),
                plant_type_id,
                description,
                treatment,
                format_datetime(now)
            ],
        )
        .await?;
        for (position, symptom) in symptoms.iter().enumerate() {
            #[allow(clippy::cast_possible_wrap)]
            let position = position as i64;
            tx.execute(
                "INSERT INTO disease_symptoms (disease_id, symptom_id, weight, position)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    id.as_str(),
                    symptom.symptom_id.as_str(),
                    symptom.weight,
                    position
                ],
            )
            .await?;
        }
        tx.commit().await?;

        self.get_disease_with_details(&id).await
    }

    pub async fn set_disease_active(&self, id: &str, active: bool) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE diseases SET active = ?1 WHERE id = ?2",
                libsql::params![i64::from(active), id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        Ok(())
    }

    /// A single disease with its plant type name and ordered symptoms.
    pub async fn get_disease_with_details(&self, id: &str) -> Result<Disease, DatabaseError> {
        let mut diseases = self
            .load_diseases("WHERE d.id = ?1", vec![id.into()])
            .await?;
        diseases.pop().ok_or(DatabaseError::NoResult)
    }

    /// Every disease, active or not, with symptoms attached.
    pub async fn get_all_diseases_with_symptoms(&self) -> Result<Vec<Disease>, DatabaseError> {
        self.load_diseases("", Vec::new()).await
    }

    pub async fn get_diseases_by_plant_type_id(
        &self,
        plant_type_id: &str,
    ) -> Result<Vec<Disease>, DatabaseError> {
        self.load_diseases("WHERE d.plant_type_id = ?1", vec![plant_type_id.into()])
            .await
    }

    /// Diseases of the plant type that fuzzily matches `name`; empty when no
    /// plant type matches.
    pub async fn get_diseases_by_plant_type_name(
        &self,
        name: &str,
    ) -> Result<Vec<Disease>, DatabaseError> {
        match self.find_plant_type_by_name(name).await? {
            Some(plant_type) => self.get_diseases_by_plant_type_id(&plant_type.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Fuzzy lookup by disease name: exact case-insensitive first, then the
    /// shortest name containing `name`.
    pub async fn find_disease_by_name(&self, name: &str) -> Result<Option<Disease>, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let exact = self
            .load_diseases("WHERE d.name = ?1 COLLATE NOCASE", vec![name.into()])
            .await?;
        if let Some(disease) = exact.into_iter().next() {
            return Ok(Some(disease));
        }
        let mut partial = self
            .load_diseases(
                "WHERE d.name LIKE '%' || ?1 || '%' ESCAPE '\\'",
                vec![escape_like(name).into()],
            )
            .await?;
        partial.sort_by_key(|d| d.name.len());
        Ok(partial.into_iter().next())
    }

    /// Active diseases sharing at least one symptom with `symptom_ids`,
    /// with overlap info computed against the full symptom set.
    ///
    /// `plant_type_id` restricts candidates to one plant type.
    pub async fn find_diseases_by_symptom_ids(
        &self,
        symptom_ids: &BTreeSet<String>,
        plant_type_id: Option<&str>,
    ) -> Result<Vec<DiseaseWithMatchInfo>, DatabaseError> {
        if symptom_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut params: Vec<libsql::Value> =
            symptom_ids.iter().map(|id| id.as_str().into()).collect();
        let mut where_sql = format!(
            "WHERE d.active = 1 AND d.id IN (SELECT disease_id FROM disease_symptoms WHERE symptom_id IN ({}))",
            placeholders(1, symptom_ids.len())
        );
        if let Some(plant_type_id) = plant_type_id {
            where_sql.push_str(&format!(" AND d.plant_type_id = ?{}", params.len() + 1));
            params.push(plant_type_id.into());
        }

        let diseases = self.load_diseases(&where_sql, params).await?;
        Ok(diseases
            .into_iter()
            .map(|disease| DiseaseWithMatchInfo::compute(disease, symptom_ids))
            .collect())
    }

    async fn load_diseases(
        &self,
        where_sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<Disease>, DatabaseError> {
        let sql = format!("{DISEASE_SELECT} {where_sql} ORDER BY d.name COLLATE NOCASE, d.id");
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut diseases = Vec::new();
        while let Some(row) = rows.next().await? {
            diseases.push(row_to_disease(&row)?);
        }
        self.attach_symptoms(&mut diseases).await?;
        Ok(diseases)
    }

    async fn attach_symptoms(&self, diseases: &mut [Disease]) -> Result<(), DatabaseError> {
        if diseases.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "SELECT ds.disease_id, ds.symptom_id, s.name, ds.weight
             FROM disease_symptoms ds JOIN symptoms s ON s.id = ds.symptom_id
             WHERE ds.disease_id IN ({})
             ORDER BY ds.disease_id, ds.position",
            placeholders(1, diseases.len())
        );
        let params: Vec<libsql::Value> = diseases.iter().map(|d| d.id.as_str().into()).collect();
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut by_disease: HashMap<String, Vec<DiseaseSymptom>> = HashMap::new();
        while let Some(row) = rows.next().await? {
            by_disease
                .entry(row.get::<String>(0)?)
                .or_default()
                .push(DiseaseSymptom {
                    symptom_id: row.get::<String>(1)?,
                    symptom_name: row.get::<String>(2)?,
                    weight: row.get::<f64>(3)?,
                });
        }
        for disease in diseases {
            disease.symptoms = by_disease.remove(&disease.id).unwrap_or_default();
        }
        Ok(())
    }
}
