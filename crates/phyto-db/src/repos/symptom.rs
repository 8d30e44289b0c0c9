//! Symptom dictionary repository.
//!
//! The dictionary is small and read-mostly; `get_all_symptoms` is how the
//! diagnosis engine loads its in-memory snapshot.

use phyto_core::entities::SymptomEntry;
use phyto_core::ids::PREFIX_SYMPTOM;

use crate::error::DatabaseError;
use crate::service::PhytoService;

fn row_to_symptom(row: &libsql::Row) -> Result<SymptomEntry, DatabaseError> {
    Ok(SymptomEntry {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        category: row.get::<String>(2)?,
        weight: row.get::<f64>(3)?,
    })
}

impl PhytoService {
    pub async fn create_symptom(
        &self,
        name: &str,
        category: &str,
        weight: f64,
    ) -> Result<SymptomEntry, DatabaseError> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(DatabaseError::InvalidState(format!(
                "symptom '{name}' weight must be positive, got {weight}"
            )));
        }
        let id = self.db().generate_id(PREFIX_SYMPTOM).await?;
        let name = name.trim();
        let category = category.trim();

        self.db()
            .conn()
            .execute(
                "INSERT INTO symptoms (id, name, category, weight) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), name, category, weight],
            )
            .await?;

        Ok(SymptomEntry {
            id,
            name: name.to_string(),
            category: category.to_string(),
            weight,
        })
    }

    pub async fn get_all_symptoms(&self) -> Result<Vec<SymptomEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, category, weight FROM symptoms ORDER BY name COLLATE NOCASE",
                (),
            )
            .await?;

        let mut symptoms = Vec::new();
        while let Some(row) = rows.next().await? {
            symptoms.push(row_to_symptom(&row)?);
        }
        Ok(symptoms)
    }

    pub async fn get_symptoms_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<SymptomEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, category, weight FROM symptoms
                 WHERE category = ?1 COLLATE NOCASE ORDER BY name COLLATE NOCASE",
                [category.trim()],
            )
            .await?;

        let mut symptoms = Vec::new();
        while let Some(row) = rows.next().await? {
            symptoms.push(row_to_symptom(&row)?);
        }
        Ok(symptoms)
    }

    /// Exact (case-insensitive) lookup by canonical name.
    pub async fn find_symptom_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SymptomEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, category, weight FROM symptoms WHERE name = ?1 COLLATE NOCASE",
                [name.trim()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_symptom(&row)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DatabaseError;
    use crate::test_support::test_service;

    #[tokio::test]
    async fn create_and_list_sorted() {
        let svc = test_service().await;
        svc.create_symptom("yellow leaves", "leaf", 0.5).await.unwrap();
        svc.create_symptom("Black rot", "fruit", 0.8).await.unwrap();

        let names: Vec<_> = svc
            .get_all_symptoms()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Black rot", "yellow leaves"]);
    }

    #[tokio::test]
    async fn non_positive_weight_is_rejected() {
        let svc = test_service().await;
        let err = svc.create_symptom("wilting", "whole plant", 0.0).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
        assert!(svc.create_symptom("wilting", "whole plant", f64::NAN).await.is_err());
    }

    #[tokio::test]
    async fn filter_by_category() {
        let svc = test_service().await;
        svc.create_symptom("white spots", "Leaf", 0.6).await.unwrap();
        svc.create_symptom("leaf curl", "leaf", 0.4).await.unwrap();
        svc.create_symptom("stem canker", "stem", 0.9).await.unwrap();

        let leaf = svc.get_symptoms_by_category("LEAF").await.unwrap();
        assert_eq!(leaf.len(), 2);
        assert!(svc.get_symptoms_by_category("root").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_name_is_case_insensitive() {
        let svc = test_service().await;
        let created = svc.create_symptom("Leaf Curl", "leaf", 0.4).await.unwrap();
        let found = svc.find_symptom_by_name("leaf curl").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(svc.find_symptom_by_name("curl").await.unwrap().is_none());
    }
}
