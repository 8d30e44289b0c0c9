//! Diagnosis cache repository: write-back, hit counting, expiry.
//!
//! Candidate scoring is not done here: `list_cache_candidates` returns the
//! filtered active set and `phyto-diagnosis` ranks it with its similarity
//! strategy.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use phyto_core::entities::DiagnosisCacheEntry;
use phyto_core::ids::PREFIX_DIAGNOSIS_CACHE;

use crate::error::DatabaseError;
use crate::helpers::{decode_id_set, encode_id_set, format_datetime, get_opt_string, parse_datetime};
use crate::service::PhytoService;
use crate::updates::diagnosis_cache::CacheEntryUpdate;

const CACHE_COLUMNS: &str = "id, plant_type, normalized_description, symptom_ids, disease_name, ai_response, hit_count, created_at, expires_at";

/// Everything needed to write back an AI resolution.
#[derive(Debug, Clone)]
pub struct NewCacheEntry {
    pub plant_type: Option<String>,
    pub normalized_description: String,
    pub symptom_ids: BTreeSet<String>,
    pub disease_name: String,
    pub ai_response: String,
    pub expires_at: DateTime<Utc>,
}

/// Point-in-time counts over the cache table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: u64,
    pub active: u64,
    pub expired: u64,
    pub total_hits: u64,
}

fn row_to_cache_entry(row: &libsql::Row) -> Result<DiagnosisCacheEntry, DatabaseError> {
    Ok(DiagnosisCacheEntry {
        id: row.get::<String>(0)?,
        plant_type: get_opt_string(row, 1)?,
        normalized_description: row.get::<String>(2)?,
        symptom_ids: decode_id_set(&row.get::<String>(3)?)?,
        disease_name: row.get::<String>(4)?,
        ai_response: row.get::<String>(5)?,
        hit_count: row.get::<i64>(6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        expires_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

#[allow(clippy::cast_sign_loss)]
fn count(row: &libsql::Row, idx: i32) -> Result<u64, DatabaseError> {
    Ok(row.get::<Option<i64>>(idx)?.unwrap_or(0).max(0) as u64)
}

impl PhytoService {
    pub async fn create_cache_entry(
        &self,
        new: &NewCacheEntry,
    ) -> Result<DiagnosisCacheEntry, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_DIAGNOSIS_CACHE).await?;

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO diagnosis_cache ({CACHE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)"
                ),
                libsql::params![
                    id.as_str(),
                    new.plant_type.as_deref(),
                    new.normalized_description.as_str(),
                    encode_id_set(&new.symptom_ids)?,
                    new.disease_name.as_str(),
                    new.ai_response.as_str(),
                    format_datetime(now),
                    format_datetime(new.expires_at)
                ],
            )
            .await?;

        tracing::debug!(cache_id = %id, disease = %new.disease_name, "cache entry written");

        Ok(DiagnosisCacheEntry {
            id,
            plant_type: new.plant_type.clone(),
            normalized_description: new.normalized_description.clone(),
            symptom_ids: new.symptom_ids.clone(),
            disease_name: new.disease_name.clone(),
            ai_response: new.ai_response.clone(),
            hit_count: 0,
            created_at: now,
            expires_at: new.expires_at,
        })
    }

    pub async fn get_cache_entry(&self, id: &str) -> Result<DiagnosisCacheEntry, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {CACHE_COLUMNS} FROM diagnosis_cache WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_cache_entry(&row)
    }

    /// Most recent entries first, expired ones included.
    pub async fn list_cache_entries(
        &self,
        limit: u32,
    ) -> Result<Vec<DiagnosisCacheEntry>, DatabaseError> {
        self.query_cache_entries(
            &format!(
                "SELECT {CACHE_COLUMNS} FROM diagnosis_cache ORDER BY created_at DESC LIMIT ?1"
            ),
            vec![i64::from(limit).into()],
        )
        .await
    }

    pub async fn update_cache_entry(
        &self,
        id: &str,
        update: &CacheEntryUpdate,
    ) -> Result<DiagnosisCacheEntry, DatabaseError> {
        if update.is_empty() {
            return self.get_cache_entry(id).await;
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref disease_name) = update.disease_name {
            sets.push(format!("disease_name = ?{idx}"));
            params.push(disease_name.as_str().into());
            idx += 1;
        }
        if let Some(ref ai_response) = update.ai_response {
            sets.push(format!("ai_response = ?{idx}"));
            params.push(ai_response.as_str().into());
            idx += 1;
        }
        if let Some(expires_at) = update.expires_at {
            sets.push(format!("expires_at = ?{idx}"));
            params.push(format_datetime(expires_at).into());
            idx += 1;
        }

        params.push(id.into());
        let sql = format!(
            "UPDATE diagnosis_cache SET {} WHERE id = ?{idx}",
            sets.join(", ")
        );
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }

        self.get_cache_entry(id).await
    }

    /// Delete one entry. Returns whether a row was removed.
    pub async fn delete_cache_entry(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute("DELETE FROM diagnosis_cache WHERE id = ?1", [id])
            .await?;
        Ok(changed > 0)
    }

    /// Atomically bump the hit counter of one entry.
    ///
    /// The increment happens inside a single `UPDATE`, so concurrent hits on
    /// the same entry never lose counts. Returns `false` when the entry no
    /// longer exists (e.g. swept between match and increment).
    pub async fn increment_cache_hit_count(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE diagnosis_cache SET hit_count = hit_count + 1 WHERE id = ?1",
                [id],
            )
            .await?;
        Ok(changed > 0)
    }

    /// Entries whose expiry is after `now`.
    pub async fn get_active_cache_entries_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DiagnosisCacheEntry>, DatabaseError> {
        self.query_cache_entries(
            &format!(
                "SELECT {CACHE_COLUMNS} FROM diagnosis_cache
                 WHERE expires_at > ?1 ORDER BY created_at DESC"
            ),
            vec![format_datetime(now).into()],
        )
        .await
    }

    pub async fn get_active_cache_entries(
        &self,
    ) -> Result<Vec<DiagnosisCacheEntry>, DatabaseError> {
        self.get_active_cache_entries_at(Utc::now()).await
    }

    /// Active entries eligible as match candidates.
    ///
    /// With `plant_type`, only entries labelled with that plant type
    /// (case-insensitive) are returned.
    pub async fn list_cache_candidates(
        &self,
        plant_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DiagnosisCacheEntry>, DatabaseError> {
        match plant_type.map(str::trim).filter(|p| !p.is_empty()) {
            Some(plant_type) => {
                self.query_cache_entries(
                    &format!(
                        "SELECT {CACHE_COLUMNS} FROM diagnosis_cache
                         WHERE expires_at > ?1 AND plant_type = ?2 COLLATE NOCASE
                         ORDER BY created_at DESC"
                    ),
                    vec![format_datetime(now).into(), plant_type.into()],
                )
                .await
            }
            None => self.get_active_cache_entries_at(now).await,
        }
    }

    /// Delete every entry whose expiry is at or before `now`.
    /// Returns the number of rows removed.
    pub async fn cleanup_expired_cache_at(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let removed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM diagnosis_cache WHERE expires_at <= ?1",
                [format_datetime(now)],
            )
            .await?;
        Ok(removed)
    }

    pub async fn cleanup_expired_cache(&self) -> Result<u64, DatabaseError> {
        self.cleanup_expired_cache_at(Utc::now()).await
    }

    pub async fn cache_stats_at(&self, now: DateTime<Utc>) -> Result<CacheStats, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*),
                        SUM(CASE WHEN expires_at > ?1 THEN 1 ELSE 0 END),
                        SUM(hit_count)
                 FROM diagnosis_cache",
                [format_datetime(now)],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let total = count(&row, 0)?;
        let active = count(&row, 1)?;
        Ok(CacheStats {
            total,
            active,
            expired: total.saturating_sub(active),
            total_hits: count(&row, 2)?,
        })
    }

    pub async fn cache_stats(&self) -> Result<CacheStats, DatabaseError> {
        self.cache_stats_at(Utc::now()).await
    }

    async fn query_cache_entries(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<DiagnosisCacheEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(sql, libsql::params_from_iter(params))
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_cache_entry(&row)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    use super::NewCacheEntry;
    use crate::error::DatabaseError;
    use crate::test_support::test_service;
    use crate::updates::diagnosis_cache::CacheEntryUpdateBuilder;

    fn new_entry(description: &str, plant_type: Option<&str>, ttl: Duration) -> NewCacheEntry {
        NewCacheEntry {
            plant_type: plant_type.map(String::from),
            normalized_description: description.to_string(),
            symptom_ids: ["sym-a".to_string(), "sym-b".to_string()].into(),
            disease_name: "Leaf Spot".to_string(),
            ai_response: r#"{"disease_name":"Leaf Spot"}"#.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let svc = test_service().await;
        let created = svc
            .create_cache_entry(&new_entry("yellow spots on leaves", Some("Tomato"), Duration::days(1)))
            .await
            .unwrap();

        let fetched = svc.get_cache_entry(&created.id).await.unwrap();
        assert_eq!(fetched.normalized_description, "yellow spots on leaves");
        assert_eq!(fetched.plant_type.as_deref(), Some("Tomato"));
        assert_eq!(
            fetched.symptom_ids,
            BTreeSet::from(["sym-a".to_string(), "sym-b".to_string()])
        );
        assert_eq!(fetched.hit_count, 0);
        assert_eq!(fetched.ai_response, created.ai_response);
    }

    #[tokio::test]
    async fn increment_is_monotonic_and_tolerates_missing() {
        let svc = test_service().await;
        let entry = svc
            .create_cache_entry(&new_entry("wilting", None, Duration::days(1)))
            .await
            .unwrap();

        for expected in 1..=3 {
            assert!(svc.increment_cache_hit_count(&entry.id).await.unwrap());
            assert_eq!(svc.get_cache_entry(&entry.id).await.unwrap().hit_count, expected);
        }

        assert!(!svc.increment_cache_hit_count("dgc-00000000").await.unwrap());
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let svc = test_service().await;
        svc.create_cache_entry(&new_entry("old one", None, Duration::hours(-2)))
            .await
            .unwrap();
        svc.create_cache_entry(&new_entry("old two", None, Duration::seconds(-1)))
            .await
            .unwrap();
        let fresh = svc
            .create_cache_entry(&new_entry("fresh", None, Duration::days(3)))
            .await
            .unwrap();

        assert_eq!(svc.cleanup_expired_cache().await.unwrap(), 2);
        assert_eq!(svc.cleanup_expired_cache().await.unwrap(), 0);

        let active = svc.get_active_cache_entries().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, fresh.id);
    }

    #[tokio::test]
    async fn candidates_exclude_expired_and_other_plants() {
        let svc = test_service().await;
        let tomato = svc
            .create_cache_entry(&new_entry("spots", Some("Tomato"), Duration::days(1)))
            .await
            .unwrap();
        svc.create_cache_entry(&new_entry("spots", Some("Rose"), Duration::days(1)))
            .await
            .unwrap();
        svc.create_cache_entry(&new_entry("spots", Some("Tomato"), Duration::hours(-1)))
            .await
            .unwrap();

        let now = Utc::now();
        let for_tomato = svc.list_cache_candidates(Some("tomato"), now).await.unwrap();
        assert_eq!(for_tomato.len(), 1);
        assert_eq!(for_tomato[0].id, tomato.id);

        assert_eq!(svc.list_cache_candidates(None, now).await.unwrap().len(), 2);
        assert_eq!(svc.list_cache_candidates(Some("  "), now).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_rewrites_fields_but_not_hits() {
        let svc = test_service().await;
        let entry = svc
            .create_cache_entry(&new_entry("spots", None, Duration::days(1)))
            .await
            .unwrap();
        svc.increment_cache_hit_count(&entry.id).await.unwrap();

        let new_expiry = Utc::now() + Duration::days(10);
        let update = CacheEntryUpdateBuilder::new()
            .disease_name("Septoria Leaf Spot")
            .expires_at(new_expiry)
            .build();
        let updated = svc.update_cache_entry(&entry.id, &update).await.unwrap();

        assert_eq!(updated.disease_name, "Septoria Leaf Spot");
        assert_eq!(updated.hit_count, 1);
        assert_eq!(updated.ai_response, entry.ai_response);
        assert!((updated.expires_at - new_expiry).num_milliseconds().abs() < 1);

        let missing = svc.update_cache_entry("dgc-00000000", &update).await;
        assert!(matches!(missing, Err(DatabaseError::NoResult)));
    }

    #[tokio::test]
    async fn delete_and_stats() {
        let svc = test_service().await;
        let a = svc
            .create_cache_entry(&new_entry("a", None, Duration::days(1)))
            .await
            .unwrap();
        svc.create_cache_entry(&new_entry("b", None, Duration::days(1)))
            .await
            .unwrap();
        svc.create_cache_entry(&new_entry("c", None, Duration::hours(-1)))
            .await
            .unwrap();
        svc.increment_cache_hit_count(&a.id).await.unwrap();
        svc.increment_cache_hit_count(&a.id).await.unwrap();

        let stats = svc.cache_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.total_hits, 2);

        assert!(svc.delete_cache_entry(&a.id).await.unwrap());
        assert!(!svc.delete_cache_entry(&a.id).await.unwrap());
        assert_eq!(svc.list_cache_entries(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_table_stats_are_zero() {
        let svc = test_service().await;
        let stats = svc.cache_stats().await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.total_hits, 0);
    }
}
