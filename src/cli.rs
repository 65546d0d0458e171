//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for shortlinker-insights using clap's derive macros.

use clap::{Parser, Subcommand};

use crate::storage::LinkId;

/// Shortlinker Insights - click analytics for shortened links
#[derive(Parser, Debug)]
#[command(name = "shortlinker-insights")]
#[command(version)]
#[command(about = "Click analytics & insights engine for shortlinker", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    /// Skip the result cache for this invocation
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Load links and clicks from a JSON snapshot instead of the database
    #[arg(long, global = true)]
    pub seed: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Full analytics report for one link
    Report {
        /// Link id
        link_id: LinkId,

        /// Sort insights by priority (high first)
        #[arg(long)]
        sort_insights: bool,
    },

    /// Aggregated report across several links
    Global {
        /// Link ids
        #[arg(required = true, num_args = 1..)]
        link_ids: Vec<LinkId>,
    },

    /// Traffic quality report for one link
    Quality {
        /// Link id
        link_id: LinkId,
    },

    /// Click heatmap for one or more links
    Heatmap {
        /// Link ids; more than one merges the points
        #[arg(required = true, num_args = 1..)]
        link_ids: Vec<LinkId>,
    },

    /// Generate example configuration file
    GenerateConfig {
        /// Output path (default: stdout)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shortlinker-insights",
            "report",
            "42",
            "--no-cache",
            "--seed",
            "demo.json",
        ])
        .unwrap();
        assert!(cli.no_cache);
        assert_eq!(cli.seed.as_deref(), Some("demo.json"));
        assert_eq!(cli.config, "config.toml");
        assert!(matches!(
            cli.command,
            Commands::Report {
                link_id: 42,
                sort_insights: false
            }
        ));
    }

    #[test]
    fn test_global_requires_ids() {
        assert!(Cli::try_parse_from(["shortlinker-insights", "global"]).is_err());
        let cli = Cli::try_parse_from(["shortlinker-insights", "heatmap", "1", "2"]).unwrap();
        match cli.command {
            Commands::Heatmap { link_ids } => assert_eq!(link_ids, vec![1, 2]),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
