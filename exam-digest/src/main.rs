use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use exam_digest::artifact::{decrypt_artifact, encode_report, read_artifact, write_artifact};
use exam_digest::config::{self, artifact_key_from_env, flatten_jobs, load_feed_table, Config};
use exam_digest::Pipeline;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "exam-digest", version, about = "Harvests exam-relevant news and writes it as an encrypted artifact")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest, classify and encrypt (default)
    Run(RunArgs),
    /// Decrypt an artifact with AES_SECRET_KEY and print its records
    Decrypt {
        artifact: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective (category, feed) work list
    Feeds {
        #[arg(long, env = "EXAM_DIGEST_FEEDS")]
        feeds: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// JSON feed table, overrides EXAM_DIGEST_FEEDS
    #[arg(long)]
    feeds: Option<PathBuf>,
    /// Artifact path, overrides EXAM_DIGEST_OUTPUT
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    max_entries: Option<usize>,
    #[arg(long)]
    pacing_ms: Option<u64>,
    #[arg(long)]
    run_timeout_secs: Option<u64>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(path) = self.feeds {
            config.feeds = load_feed_table(&path)?;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(max_entries) = self.max_entries {
            config.policy.max_entries_per_feed = max_entries;
        }
        if let Some(pacing_ms) = self.pacing_ms {
            config.policy.pacing = Duration::from_millis(pacing_ms);
        }
        if let Some(secs) = self.run_timeout_secs {
            config.policy.run_timeout = Some(Duration::from_secs(secs));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Run(args) => run(args).await,
        Command::Decrypt { artifact, pretty } => decrypt(artifact, pretty),
        Command::Feeds { feeds } => print_feeds(feeds),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = Config::from_env()
        .map_err(|e| {
            error!("Refusing to start: {}", e);
            e
        })
        .context("invalid configuration")?;
    args.apply(&mut config).context("invalid command line override")?;

    info!("Starting exam news engine ({} feeds)", config.jobs().len());

    let pipeline = Pipeline::from_config(&config).context("failed to build pipeline")?;
    let report = pipeline.run().await;

    info!(
        "Processing complete in {}s. Found {} valid exam news items",
        (report.finished_at - report.started_at).num_seconds(),
        report.records.len()
    );

    let artifact = encode_report(&report.records, &config.artifact_key).context("failed to encrypt report")?;
    match artifact {
        Some(artifact) => {
            write_artifact(&config.output_path, &artifact)
                .with_context(|| format!("failed to write {}", config.output_path.display()))?;
            info!(
                "Encrypted {} records into {}",
                report.records.len(),
                config.output_path.display()
            );
        }
        None => warn!("No valid news found this run; no artifact written"),
    }

    if report.interrupted {
        warn!("Run was cut short by the run deadline");
    }
    Ok(())
}

fn decrypt(path: PathBuf, pretty: bool) -> Result<()> {
    let key = artifact_key_from_env().context("invalid configuration")?;
    let artifact = read_artifact(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let plaintext = decrypt_artifact(&artifact, &key).context("failed to decrypt artifact")?;

    if pretty {
        let value: serde_json::Value = serde_json::from_slice(&plaintext).context("payload is not JSON")?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", String::from_utf8_lossy(&plaintext));
    }
    Ok(())
}

fn print_feeds(path: Option<PathBuf>) -> Result<()> {
    let table = match path {
        Some(path) => load_feed_table(&path)?,
        None => config::default_feed_table(),
    };
    for job in flatten_jobs(&table) {
        println!("{}\t{}", job.category, job.feed_url);
    }
    Ok(())
}
