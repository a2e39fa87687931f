mod cli;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::logging;
use cli::progress::CliReporter;
use cli::{Cli, Commands};
use colored::*;
use dotenv::dotenv;
use mistake_clusters::analysis::SolutionMarksHolder;
use mistake_clusters::clustering::Clusters;
use mistake_clusters::config::{self, AppConfig};
use mistake_clusters::ingest::{self, AcceptAll, CodeValidator, SubmissionParser, TreeValidator};
use mistake_clusters::metrics::FeaturedSolution;
use mistake_clusters::model::Dataset;
use mistake_clusters::storage::{serialization, CacheStore};
use mistake_clusters::{ClusteringEngine, ClusteringResult};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();
    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return;
    };

    if let Err(err) = run(command, &config) {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Parse {
            input,
            output,
            mode,
            problems,
            accept_all,
        } => {
            let engine = ClusteringEngine::new(config.clone());
            let tree_validator = TreeValidator::new(engine.builder());
            let validator: &dyn CodeValidator = if accept_all {
                &AcceptAll
            } else {
                &tree_validator
            };
            let file = std::fs::File::open(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let dataset = SubmissionParser::new(validator)
                .with_problem_filter(|p| problems.is_empty() || problems.contains(&p))
                .parse(file, mode.into())?;
            let output = output.unwrap_or_else(|| config.paths.dataset.clone());
            serialization::store_dataset(&dataset, &output)?;
            info!(
                "Stored {} solutions to {}",
                format!("{}", dataset.len()).cyan(),
                output.display()
            );
        }
        Commands::Split {
            dataset,
            test_size,
            seed,
        } => {
            let dataset = load_dataset(dataset.as_deref(), config)?;
            let (train, test) = ingest::split_sessions(
                &dataset,
                test_size.unwrap_or(config.split.test_size),
                seed.unwrap_or(config.split.seed),
            );
            let train_path = config.paths.output_dir.join("train.json");
            let test_path = config.paths.output_dir.join("test.json");
            serialization::store_dataset(&train, &train_path)?;
            serialization::store_dataset(&test, &test_path)?;
            info!(
                "Train: {} solutions, test: {} solutions",
                format!("{}", train.len()).green(),
                format!("{}", test.len()).green()
            );
        }
        Commands::Cluster {
            dataset,
            problem,
            output,
        } => {
            let mut dataset = load_dataset(dataset.as_deref(), config)?;
            if let Some(problem) = problem {
                dataset = dataset.for_problem(problem);
            }
            let (engine, store) = engine_with_cache(config)?;
            let result = engine.cluster_problem(&dataset, &CliReporter::new())?;
            let output =
                output.unwrap_or_else(|| config.paths.output_dir.join("unmarked_clusters.json"));
            finish_clustering(&result, &output)?;
            close_cache(engine, store)?;
        }
        Commands::ClusterGlobal {
            dataset,
            problems,
            output,
        } => {
            let dataset = load_dataset(dataset.as_deref(), config)?;
            let datasets: Vec<Dataset> = dataset
                .problems()
                .into_iter()
                .filter(|p| problems.is_empty() || problems.contains(p))
                .map(|p| dataset.for_problem(p))
                .collect();
            let (engine, store) = engine_with_cache(config)?;
            let result = engine.cluster_global(&datasets, &CliReporter::new())?;
            let output =
                output.unwrap_or_else(|| config.paths.output_dir.join("global_clusters.json"));
            finish_clustering(&result, &output)?;
            close_cache(engine, store)?;
        }
        Commands::ClusterCorrect {
            dataset,
            problem,
            output,
        } => {
            let mut dataset = load_dataset(dataset.as_deref(), config)?;
            if let Some(problem) = problem {
                dataset = dataset.for_problem(problem);
            }
            let engine = ClusteringEngine::new(config.clone());
            let result = engine.cluster_correct(&dataset, &CliReporter::new())?;
            let output = output.unwrap_or_else(|| {
                config.paths.output_dir.join(format!(
                    "sqrt-clusters-{}.json",
                    mistake_clusters::engine::CORRECT_CLUSTERS_THRESHOLD
                ))
            });
            finish_clustering(&result, &output)?;
        }
        Commands::Mark {
            clusters,
            marks,
            output,
        } => {
            let clusters: Clusters<FeaturedSolution> = serialization::load_clusters(&clusters)
                .with_context(|| format!("Failed to load clusters from {}", clusters.display()))?;
            let marks: SolutionMarksHolder = serialization::load_marks(&marks)
                .with_context(|| format!("Failed to load marks from {}", marks.display()))?;
            let engine = ClusteringEngine::new(config.clone());
            let marked = engine.mark(&clusters, &marks);
            let output =
                output.unwrap_or_else(|| config.paths.output_dir.join("marked_clusters.json"));
            serialization::store_marked_clusters(&marked, &output)?;
            info!(
                "{} of {} clusters labeled, stored to {}",
                format!("{}", marked.labeled().count()).green(),
                marked.len(),
                output.display()
            );
        }
        Commands::Representatives { clusters, top } => {
            let clusters: Clusters<FeaturedSolution> = serialization::load_clusters(&clusters)
                .with_context(|| format!("Failed to load clusters from {}", clusters.display()))?;
            let engine = ClusteringEngine::new(config.clone());
            let sorted = clusters.sorted_by_size();
            for (rank, cluster) in sorted.into_iter().take(top.unwrap_or(usize::MAX)).enumerate() {
                let ids: Vec<String> = cluster
                    .iter()
                    .map(|s| s.solution.solution_id.to_string())
                    .collect();
                println!(
                    "{} {} ({} solutions): {}",
                    "Cluster".bold(),
                    rank + 1,
                    cluster.len(),
                    ids.join(", ")
                );
                match engine.representatives(cluster) {
                    Ok(fingerprints) => {
                        for fingerprint in fingerprints {
                            println!("    {}", fingerprint.to_string().yellow());
                        }
                    }
                    Err(err) => warn!("Cluster {}: {}", rank + 1, err),
                }
            }
        }
        Commands::ClearCache { yes } => {
            if !yes
                && !prompt_confirm(
                    "Are you SURE you want to COMPLETELY DELETE the reference cache?",
                    Some(false),
                )?
            {
                return Ok(());
            }
            let store = open_cache(config)?;
            let removed = store.drop_index(&config.cache.index)?;
            store.close()?;
            println!("Removed {} cached references", removed);
        }
        Commands::CountCache => {
            let store = open_cache(config)?;
            let count = store.count(Some(&config.cache.index))?;
            info!(
                "Total cached references in {}: {}",
                config.cache.index,
                format!("{}", count).cyan()
            );
        }
        Commands::PrintConfig => {
            println!("{}", config::render_configuration(config)?);
        }
    }
    Ok(())
}

fn load_dataset(path: Option<&Path>, config: &AppConfig) -> Result<Dataset> {
    let path: PathBuf = path.map_or_else(|| config.paths.dataset.clone(), Path::to_path_buf);
    serialization::load_dataset(&path)
        .with_context(|| format!("Failed to load dataset from {}", path.display()))
}

fn open_cache(config: &AppConfig) -> Result<CacheStore> {
    let store = CacheStore::open(&config.paths.cache_db)
        .with_context(|| format!("Failed to open cache {}", config.paths.cache_db.display()))?;
    Ok(store.with_flush_every(config.cache.flush_every))
}

fn engine_with_cache(config: &AppConfig) -> Result<(ClusteringEngine, Arc<CacheStore>)> {
    let store = Arc::new(open_cache(config)?);
    let engine = ClusteringEngine::new(config.clone()).with_cache(store.clone());
    Ok((engine, store))
}

fn close_cache(engine: ClusteringEngine, store: Arc<CacheStore>) -> Result<()> {
    drop(engine);
    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(shared) => shared.flush()?,
    }
    Ok(())
}

fn finish_clustering<V: serde::Serialize>(
    result: &ClusteringResult<V>,
    output: &Path,
) -> Result<()> {
    serialization::store_clusters(&result.clusters, output)?;
    println!();
    info!(
        "Extract: {}, Cluster: {}",
        format!("{:.2}s", result.extract_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.cluster_duration.as_secs_f64()).green(),
    );
    info!(
        "{} clusters over {} solutions, {} failures, stored to {}",
        format!("{}", result.clusters.len()).cyan(),
        result.clusters.population(),
        format!("{}", result.failures.len()).red(),
        output.display()
    );
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
