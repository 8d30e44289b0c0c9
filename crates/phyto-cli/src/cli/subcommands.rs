use clap::Subcommand;

/// Diagnosis cache maintenance.
#[derive(Clone, Debug, Subcommand)]
pub enum CacheCommands {
    /// List cache entries, newest first.
    List,
    /// Show entry counts and total hits.
    Stats,
    /// Delete expired entries now.
    Sweep,
    /// Show one entry.
    Get {
        /// Cache entry ID (dgc-...).
        id: String,
    },
    /// Delete one entry.
    Delete {
        /// Cache entry ID (dgc-...).
        id: String,
    },
    /// Push an entry's expiry out to now + the given number of hours.
    Extend {
        /// Cache entry ID (dgc-...).
        id: String,
        /// New lifetime in hours, counted from now.
        #[arg(long)]
        hours: u32,
    },
}
