use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use phyto_diagnosis::{CacheLifecycle, CacheSweeper};
use tokio_util::sync::CancellationToken;

use crate::cli::root_commands::SweeperArgs;
use crate::context::AppContext;

/// Handle `phyto sweeper`. Runs until Ctrl-C.
pub async fn handle(args: &SweeperArgs, ctx: &AppContext) -> anyhow::Result<()> {
    if !ctx.config.sweeper.enabled {
        bail!("the cache sweeper is disabled (sweeper.enabled = false)");
    }
    let interval = args
        .interval
        .map_or_else(|| ctx.config.sweeper.interval(), Duration::from_secs);

    let sweeper = CacheSweeper::new(CacheLifecycle::new(Arc::clone(&ctx.store)), interval);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    sweeper.run(cancel).await;
    Ok(())
}
