use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `phyto` binary.
#[derive(Debug, Parser)]
#[command(name = "phyto", version, about = "Phyto - tiered plant diagnosis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path (overrides `database.path`)
    #[arg(long, global = true)]
    pub database: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            database: self.database.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::subcommands::CacheCommands;
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "phyto",
            "--format",
            "raw",
            "--limit",
            "10",
            "--verbose",
            "plants",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Plants));
    }

    #[test]
    fn diagnose_parses_description_and_hints() {
        let cli = Cli::try_parse_from([
            "phyto",
            "diagnose",
            "white spots on leaves",
            "--plant-type",
            "rose",
            "--language",
            "en",
            "--database",
            ":memory:",
        ])
        .expect("cli should parse");

        let Commands::Diagnose(args) = cli.command else {
            panic!("expected diagnose");
        };
        assert_eq!(args.description, "white spots on leaves");
        assert_eq!(args.plant_type.as_deref(), Some("rose"));
        assert_eq!(args.language.as_deref(), Some("en"));
        assert_eq!(cli.database.as_deref(), Some(":memory:"));
    }

    #[test]
    fn image_and_image_url_conflict() {
        let result = Cli::try_parse_from([
            "phyto",
            "diagnose",
            "--image",
            "leaf.jpg",
            "--image-url",
            "https://example.com/leaf.jpg",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cache_extend_requires_hours() {
        assert!(Cli::try_parse_from(["phyto", "cache", "extend", "dgc-1"]).is_err());
        let cli = Cli::try_parse_from(["phyto", "cache", "extend", "dgc-1", "--hours", "48"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheCommands::Extend { hours: 48, .. }
            }
        ));
    }
}
