use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::CacheCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Diagnose a plant from a description and/or photo.
    Diagnose(DiagnoseArgs),
    /// Load plant types, symptoms and diseases from a TOML catalog.
    Seed(SeedArgs),
    /// List the symptom dictionary.
    Symptoms(SymptomsArgs),
    /// List active plant types.
    Plants,
    /// List diseases with their weighted symptoms.
    Diseases(DiseasesArgs),
    /// Show one disease by ID or name.
    Disease(DiseaseArgs),
    /// Diagnosis cache maintenance.
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
    /// Run the recurring cache expiry sweep until interrupted.
    Sweeper(SweeperArgs),
}

#[derive(Clone, Debug, Args)]
pub struct DiagnoseArgs {
    /// Symptom description, e.g. "white spots and curled leaves".
    #[arg(default_value = "")]
    pub description: String,
    /// Photo of the plant (JPEG/PNG), sent base64-encoded.
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Publicly reachable photo URL.
    #[arg(long, conflicts_with = "image")]
    pub image_url: Option<String>,
    /// Plant type ID or name.
    #[arg(long)]
    pub plant_type: Option<String>,
    /// Answer language for the AI tier (ISO 639-1).
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SeedArgs {
    /// Catalog file.
    pub file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct SymptomsArgs {
    /// Only symptoms of this category.
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct DiseasesArgs {
    /// Only diseases of this plant type (ID or name).
    #[arg(long)]
    pub plant_type: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct DiseaseArgs {
    /// Disease ID (dis-...) or name.
    pub disease: String,
}

#[derive(Clone, Debug, Args)]
pub struct SweeperArgs {
    /// Seconds between sweeps (overrides `sweeper.interval_secs`).
    #[arg(long)]
    pub interval: Option<u64>,
}
