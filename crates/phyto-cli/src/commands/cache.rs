use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Duration, Utc};
use phyto_core::entities::DiagnosisCacheEntry;
use phyto_core::enums::CacheEntryStatus;
use phyto_db::error::DatabaseError;
use phyto_db::updates::diagnosis_cache::CacheEntryUpdateBuilder;
use phyto_diagnosis::CacheLifecycle;
use serde::Serialize;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CacheCommands;
use crate::context::AppContext;
use crate::output::output;

const DEFAULT_LIST_LIMIT: u32 = 50;

/// A cache entry with its expiry status at listing time.
#[derive(Debug, Serialize)]
struct CacheListing {
    #[serde(flatten)]
    entry: DiagnosisCacheEntry,
    status: CacheEntryStatus,
}

impl CacheListing {
    fn at(entry: DiagnosisCacheEntry, now: DateTime<Utc>) -> Self {
        Self {
            status: entry.status_at(now),
            entry,
        }
    }
}

/// Handle `phyto cache`.
pub async fn handle(action: &CacheCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let lifecycle = CacheLifecycle::new(Arc::clone(&ctx.store));

    match action {
        CacheCommands::List => {
            let now = Utc::now();
            let listings: Vec<_> = ctx
                .store
                .list_cache_entries(flags.limit.unwrap_or(DEFAULT_LIST_LIMIT))
                .await?
                .into_iter()
                .map(|entry| CacheListing::at(entry, now))
                .collect();
            output(&listings, flags.format)
        }
        CacheCommands::Stats => output(&lifecycle.stats().await?, flags.format),
        CacheCommands::Sweep => {
            let removed = lifecycle.cleanup_expired().await?;
            output(&json!({ "removed": removed }), flags.format)
        }
        CacheCommands::Get { id } => match ctx.store.get_cache_entry(id).await {
            Ok(entry) => output(&CacheListing::at(entry, Utc::now()), flags.format),
            Err(DatabaseError::NoResult) => bail!("no cache entry '{id}'"),
            Err(e) => Err(e.into()),
        },
        CacheCommands::Delete { id } => {
            let deleted = ctx.store.delete_cache_entry(id).await?;
            output(&json!({ "id": id, "deleted": deleted }), flags.format)
        }
        CacheCommands::Extend { id, hours } => {
            let Some(expires_at) = extended_expiry(Utc::now(), *hours) else {
                bail!("cannot extend cache entry '{id}' by {hours} hours");
            };
            let update = CacheEntryUpdateBuilder::new().expires_at(expires_at).build();
            let entry = ctx
                .store
                .update_cache_entry(id, &update)
                .await
                .with_context(|| format!("failed to extend cache entry '{id}'"))?;
            output(&entry, flags.format)
        }
    }
}

/// `now + hours`, or `None` if the result is not a representable timestamp.
fn extended_expiry(now: DateTime<Utc>, hours: u32) -> Option<DateTime<Utc>> {
    now.checked_add_signed(Duration::hours(i64::from(hours)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(expires_at: DateTime<Utc>) -> DiagnosisCacheEntry {
        DiagnosisCacheEntry {
            id: "dgc-0000abcd".into(),
            plant_type: Some("Rose".into()),
            normalized_description: "white spots".into(),
            symptom_ids: std::collections::BTreeSet::new(),
            disease_name: "Powdery Mildew".into(),
            ai_response: "Powdery Mildew".into(),
            hit_count: 3,
            created_at: expires_at - Duration::days(1),
            expires_at,
        }
    }

    #[test]
    fn listing_reports_status_next_to_entry_fields() {
        let now = Utc::now();
        let active = serde_json::to_value(CacheListing::at(entry(now + Duration::hours(1)), now)).unwrap();
        assert_eq!(active["status"], "active");
        assert_eq!(active["id"], "dgc-0000abcd");
        assert_eq!(active["hit_count"], 3);

        let expired = serde_json::to_value(CacheListing::at(entry(now), now)).unwrap();
        assert_eq!(expired["status"], "expired");
    }

    #[test]
    fn extension_is_checked() {
        let now = Utc::now();
        assert_eq!(extended_expiry(now, 2), Some(now + Duration::hours(2)));
        assert_eq!(extended_expiry(DateTime::<Utc>::MAX_UTC, 1), None);
    }
}
