pub mod logging;
pub mod progress;

use clap::{Parser, Subcommand, ValueEnum};
use mistake_clusters::ingest::ParseMode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mistake-clusters")]
#[command(about = "Clusters incorrect submissions by the edits that would fix them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Every submission
    All,
    /// Last failed and first passed submission per session
    Last,
}

impl From<ModeArg> for ParseMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::All => ParseMode::All,
            ModeArg::Last => ParseMode::Last,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse a CSV submission log into a dataset
    Parse {
        /// CSV file to read
        input: PathBuf,
        /// Dataset file to write (defaults to the configured dataset path)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "all")]
        mode: ModeArg,
        /// Keep only these problems (repeatable)
        #[arg(long = "problem")]
        problems: Vec<i64>,
        /// Skip the syntax tree check on submitted code
        #[arg(long)]
        accept_all: bool,
    },
    /// Split a dataset into train and test sets by session
    Split {
        dataset: Option<PathBuf>,
        #[arg(long)]
        test_size: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Cluster the incorrect solutions of one problem
    Cluster {
        dataset: Option<PathBuf>,
        #[arg(long)]
        problem: Option<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cluster incorrect solutions of several problems together
    ClusterGlobal {
        dataset: Option<PathBuf>,
        /// Problems to include (repeatable, defaults to all)
        #[arg(long = "problem")]
        problems: Vec<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cluster the deduplicated correct solutions of a problem
    ClusterCorrect {
        dataset: Option<PathBuf>,
        #[arg(long)]
        problem: Option<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Label clusters by majority vote over solution marks
    Mark {
        clusters: PathBuf,
        marks: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print representative fingerprints per cluster
    Representatives {
        clusters: PathBuf,
        /// Number of clusters to print, largest first
        #[arg(long)]
        top: Option<usize>,
    },
    /// Remove all cached reference selections
    ClearCache {
        #[arg(short, long)]
        yes: bool,
    },
    /// Display the number of cached reference selections
    CountCache,
    /// Print configuration values
    PrintConfig,
}

#[cfg(test)]
mod tests {
    use super::progress::CliReporter;
    use super::*;
    use clap::CommandFactory;
    use mistake_clusters::ProgressReporter;

    #[test]
    fn test_command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cluster_with_problem() {
        let args = ["mistake-clusters", "cluster", "data.json", "--problem", "7"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Some(Commands::Cluster {
                dataset, problem, ..
            }) => {
                assert_eq!(dataset, Some(PathBuf::from("data.json")));
                assert_eq!(problem, Some(7));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_reporter_survives_full_run() {
        let reporter = CliReporter::new();
        reporter.on_extract_start(2);
        reporter.on_extract_progress(1, 2);
        reporter.on_extract_complete(2, 0, 0.1);
        reporter.on_cluster_start(2);
        reporter.on_cluster_complete(1, 0.1);
    }
}
