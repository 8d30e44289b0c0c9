use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Diagnose(args) => commands::diagnose::handle(&args, ctx, flags).await,
        Commands::Seed(args) => commands::seed::handle(&args, ctx, flags).await,
        Commands::Symptoms(args) => commands::reference::symptoms(&args, ctx, flags).await,
        Commands::Plants => commands::reference::plants(ctx, flags).await,
        Commands::Diseases(args) => commands::reference::diseases(&args, ctx, flags).await,
        Commands::Disease(args) => commands::reference::disease(&args, ctx, flags).await,
        Commands::Cache { action } => commands::cache::handle(&action, ctx, flags).await,
        Commands::Sweeper(args) => commands::sweeper::handle(&args, ctx).await,
    }
}
