//! Read-only listings of the reference data the knowledge base matches on.

use anyhow::{Context, bail};
use phyto_db::error::DatabaseError;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{DiseaseArgs, DiseasesArgs, SymptomsArgs};
use crate::context::AppContext;
use crate::output::output;

/// Handle `phyto symptoms`.
pub async fn symptoms(args: &SymptomsArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut symptoms = match &args.category {
        Some(category) => ctx.store.get_symptoms_by_category(category).await?,
        None => ctx.store.get_all_symptoms().await?,
    };
    truncate(&mut symptoms, flags.limit);
    output(&symptoms, flags.format)
}

/// Handle `phyto plants`.
pub async fn plants(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut plants = ctx.store.get_all_active_plant_types().await?;
    truncate(&mut plants, flags.limit);
    output(&plants, flags.format)
}

/// Handle `phyto diseases`.
pub async fn diseases(args: &DiseasesArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut diseases = match args.plant_type.as_deref().map(str::trim) {
        Some(hint) => match ctx.store.get_plant_type(hint).await {
            Ok(plant_type) => ctx.store.get_diseases_by_plant_type_id(&plant_type.id).await?,
            Err(DatabaseError::NoResult) => ctx.store.get_diseases_by_plant_type_name(hint).await?,
            Err(e) => return Err(e.into()),
        },
        None => ctx.store.get_all_diseases_with_symptoms().await?,
    };
    truncate(&mut diseases, flags.limit);
    output(&diseases, flags.format)
}

/// Handle `phyto disease`.
pub async fn disease(args: &DiseaseArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let key = args.disease.trim();
    let disease = match ctx.store.get_disease_with_details(key).await {
        Ok(disease) => disease,
        Err(DatabaseError::NoResult) => match ctx
            .store
            .find_disease_by_name(key)
            .await
            .context("disease lookup failed")?
        {
            Some(disease) => disease,
            None => bail!("no disease matches '{key}'"),
        },
        Err(e) => return Err(e.into()),
    };
    output(&disease, flags.format)
}

fn truncate<T>(items: &mut Vec<T>, limit: Option<u32>) {
    if let Some(limit) = limit {
        items.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }
}
