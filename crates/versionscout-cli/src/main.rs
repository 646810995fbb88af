use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use versionscout_api::{REQUESTS_PER_HOUR_NO_TOKEN, REQUESTS_PER_HOUR_WITH_TOKEN};
use versionscout_cache::CacheSlot;
use versionscout_core::{
    export::format_thousands, Aggregator, BatchRunner, CachedStatsService, Config, Exporter,
    GitHubProvider, ReportFormat,
};

#[derive(Parser)]
#[command(name = "versionscout")]
#[command(version, about = "Track releases and published packages across a GitHub user's repositories", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Generate a version report for one user
    Report {
        /// GitHub username to analyze
        #[arg(short, long)]
        username: String,

        /// GitHub personal access token, for higher rate limits
        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Include forked repositories
        #[arg(short = 'f', long)]
        include_forks: bool,

        /// Output format: table, rich or json
        #[arg(short = 'F', long, default_value = "rich")]
        format: ReportFormat,

        /// Save the report to a file instead of printing it
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
    /// Serve the JSON API
    Serve {
        /// Address to bind, overrides the config file
        #[arg(long)]
        bind: Option<String>,

        /// Trust X-Forwarded-For (only behind a reverse proxy)
        #[arg(long)]
        behind_proxy: bool,

        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Analyze several users and write JSON reports
    Batch {
        /// GitHub usernames
        #[arg(required = true)]
        usernames: Vec<String>,

        /// Directory for the report files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for reports
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "versionscout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::Report {
            username,
            token,
            include_forks,
            format,
            save,
        } => {
            let provider = provider(&config, token);
            let aggregator = Aggregator::new(Arc::new(provider));

            let report = aggregator
                .generate(&username, include_forks)
                .await
                .with_context(|| format!("Failed to generate report for {}", username))?;

            if report.summary.total_repositories == 0 {
                println!("No repositories found for {}", username);
                return Ok(());
            }

            match save {
                Some(path) => {
                    Exporter::save_to_file(&report, &path, format)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Report saved to {}", path.display());
                }
                None => {
                    let format = format.for_output(std::io::stdout().is_terminal());
                    println!("{}", Exporter::render(&report, format)?);
                }
            }
        }
        Commands::Serve {
            bind,
            behind_proxy,
            token,
        } => {
            let mut server_config = config.server.clone();
            if let Some(bind) = bind {
                server_config.bind_addr = bind;
            }
            server_config.behind_proxy |= behind_proxy;

            let aggregator = Aggregator::new(Arc::new(provider(&config, token)));
            let service = CachedStatsService::new(
                aggregator,
                CacheSlot::with_ttl_hours(config.cache.ttl_hours),
            );

            info!("Starting web API on {}", server_config.bind_addr);
            versionscout_server::run_server(&server_config, service).await?;
        }
        Commands::Batch {
            usernames,
            output_dir,
            token,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
            let aggregator = Aggregator::new(Arc::new(provider(&config, token)));
            let outcome = BatchRunner::new(aggregator, output_dir).run(&usernames).await?;

            for (username, reason) in &outcome.failed {
                println!("Error analyzing {}: {}", username, reason);
            }
            println!("Combined report saved: {}", outcome.combined_path.display());
            println!("Summary report saved: {}", outcome.summary_path.display());

            let stats = &outcome.summary.aggregated_stats;
            let rule = "=".repeat(60);
            println!("\n{}", rule);
            println!("BATCH ANALYSIS SUMMARY");
            println!("{}", rule);
            println!("Users analyzed: {}", outcome.summary.total_users_analyzed);
            println!("Total repositories: {}", stats.total_repositories);
            println!("Total releases: {}", stats.total_releases);
            println!("Total packages: {}", stats.total_packages);
            println!("Total downloads: {}", format_thousands(stats.total_downloads));
            println!("Total stars: {}", format_thousands(stats.total_stars));
            println!("{}", rule);
        }
    }

    Ok(())
}

/// GitHub provider from config, with the CLI/env token taking precedence
fn provider(config: &Config, token: Option<String>) -> GitHubProvider {
    let provider = GitHubProvider::from_config(config, token);
    if provider.has_token() {
        info!(
            "Using GitHub token ({} requests/hour)",
            provider.hourly_rate_ceiling()
        );
    } else {
        warn!(
            "No GitHub token provided. Unauthenticated requests are limited to {} per hour (vs {} with a token). Set GITHUB_TOKEN or pass --token.",
            REQUESTS_PER_HOUR_NO_TOKEN, REQUESTS_PER_HOUR_WITH_TOKEN
        );
    }
    provider
}
