use anyhow::Context;
use phyto_db::catalog::Catalog;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SeedArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `phyto seed`.
pub async fn handle(args: &SeedArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let catalog = Catalog::from_path(&args.file)
        .with_context(|| format!("failed to load catalog {}", args.file.display()))?;
    let report = ctx.store.seed_catalog(&catalog).await?;
    output(&report, flags.format)
}
