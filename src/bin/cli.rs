//! listwatch CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use listwatch::{
    config,
    error::{AppError, Result},
    models::{Config, RunBucket},
    pipeline,
    services::{HttpFetcherFactory, expand},
    storage::{LocalStorage, RunStorage, load_history},
};

/// listwatch - classifieds search watcher
#[derive(Parser, Debug)]
#[command(
    name = "listwatch",
    version,
    about = "Crawls classifieds searches and reports newly listed ads"
)]
struct Cli {
    /// Path to the application config file
    #[arg(short, long, default_value = "listwatch.toml")]
    config: PathBuf,

    /// Search config files to use (default: every *.json in the configs dir)
    #[arg(short, long = "search", global = true)]
    searches: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every search into the current hour's bucket
    Run {
        /// Reuse the bucket if this hour already has a run
        #[arg(long)]
        force: bool,
    },

    /// Link counts of every committed run
    Timetable,

    /// Links of the latest committed run
    Latest,

    /// Links of the latest run that no earlier run has seen
    Diff,

    /// Links of one run, e.g. 2026-10-19-14
    Show { bucket: RunBucket },

    /// Delete runs that never committed a snapshot
    Clean {
        /// Only list what would be deleted
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the crawl targets of each search
    Expand,

    /// Validate configuration files
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Storage of every selected search, by name.
fn search_storages(config: &Config, names: &[String]) -> Result<Vec<(String, LocalStorage)>> {
    let configs_dir = Path::new(&config.paths.configs_dir);
    config::search_config_paths(configs_dir, names)?
        .iter()
        .map(|path| {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| AppError::malformed(path, "file name has no usable stem"))?
                .to_string();
            let storage = LocalStorage::for_search(&config.paths.output_dir, &name);
            Ok((name, storage))
        })
        .collect()
}

fn print_lines(lines: &[String]) {
    if lines.is_empty() {
        println!("  (no links)");
    }
    for line in lines {
        println!("{}", line);
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::debug!("Configuration: {:?}", config);

    match cli.command {
        Command::Run { force } => {
            config.validate()?;
            let searches =
                config::load_search_configs(Path::new(&config.paths.configs_dir), &cli.searches)?;
            let fetchers = HttpFetcherFactory::new(&config.crawler);

            let reports = pipeline::run_crawler(&config, &searches, &fetchers, force).await?;

            for report in &reports {
                log::info!(
                    "{}: {} links, {} failed target(s), took {}s",
                    report.bucket,
                    report.snapshot.link_count(),
                    report.failed_count(),
                    (report.finished_at - report.started_at).num_seconds()
                );
                for target in &report.targets {
                    if let pipeline::TargetStatus::Failed(reason) = &target.status {
                        log::warn!("  {} failed: {}", target.url, reason);
                    }
                }
            }
            log::info!("Crawl complete!");
        }

        Command::Timetable => {
            for (name, storage) in search_storages(&config, &cli.searches)? {
                let history = load_history(&storage).await?;
                println!("{} ({} runs)", name, history.len());
                for row in pipeline::timetable(&history) {
                    println!(
                        "  {}  total {:>5}  new vs previous {:>4}  new overall {:>4}",
                        row.bucket, row.total_links, row.new_since_previous, row.new_since_all
                    );
                }
            }
        }

        Command::Latest => {
            for (name, storage) in search_storages(&config, &cli.searches)? {
                let Some(bucket) = storage.list_snapshots().await?.pop() else {
                    println!("{}: no runs yet", name);
                    continue;
                };
                let snapshot = storage.load_snapshot(&bucket).await?.unwrap_or_default();
                println!("{} @ {}", name, bucket);
                print_lines(&pipeline::format_links(snapshot.targets()));
            }
        }

        Command::Diff => {
            for (name, storage) in search_storages(&config, &cli.searches)? {
                let history = load_history(&storage).await?;
                let fresh = pipeline::diff_against_immediate_prior(&history);
                match history.last() {
                    Some((bucket, _)) => println!("{} @ {}: new links", name, bucket),
                    None => println!("{}: no runs yet", name),
                }
                print_lines(&pipeline::format_links(
                    fresh.iter().map(|(slug, links)| (slug.as_str(), links)),
                ));
            }
        }

        Command::Show { bucket } => {
            for (name, storage) in search_storages(&config, &cli.searches)? {
                match storage.load_snapshot(&bucket).await? {
                    Some(snapshot) => {
                        println!("{} @ {}", name, bucket);
                        print_lines(&pipeline::format_links(snapshot.targets()));
                    }
                    None => println!("{}: no snapshot for {}", name, bucket),
                }
            }
        }

        Command::Clean { dry_run } => {
            for (name, storage) in search_storages(&config, &cli.searches)? {
                let removed = if dry_run {
                    storage.list_failed_runs().await?
                } else {
                    pipeline::clean_failed_runs(&storage).await?
                };
                let verb = if dry_run { "would remove" } else { "removed" };
                log::info!("{}: {} {} failed run(s)", name, verb, removed.len());
                for bucket in removed {
                    println!("  {}", storage.root().join(bucket.to_string()).display());
                }
            }
        }

        Command::Expand => {
            let searches =
                config::load_search_configs(Path::new(&config.paths.configs_dir), &cli.searches)?;
            for search in &searches {
                let targets = expand(&search.filters);
                println!("{} ({} targets)", search.name, targets.len());
                for (i, target) in targets.iter().enumerate() {
                    println!("  {:>3}. {}  [{}]", i + 1, target, target.slug(&config.slug));
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let searches =
                config::load_search_configs(Path::new(&config.paths.configs_dir), &cli.searches)?;
            for search in &searches {
                log::info!(
                    "✓ {} expands to {} targets",
                    search.name,
                    expand(&search.filters).len()
                );
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
