use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use logogroup::config::{
    DEFAULT_HASH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_THRESHOLD, FetchConfig, GroupingConfig,
    ResolverConfig,
};
use logogroup::core::{
    FingerprintService, GroupRecord, HashAlgorithm, LogoItem, fingerprint_items,
    group_fingerprinted,
};
use logogroup::services::dataset::{self, DomainRecord, LogoRecord, RunRecord};
use logogroup::services::{ImageFetcher, LogoResolver};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "logogroup", version, about = "Group brand logos by visual similarity")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find a logo URL for every domain
    Resolve {
        /// JSON Lines file of `{"domain": ...}` rows
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Where to write `{"domain": ..., "logo_url": ...}` rows
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Attempts per domain when a source errors
        #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
        max_retries: u32,
        /// Pause between attempts
        #[arg(long, default_value_t = 2000)]
        retry_delay_ms: u64,
        /// Per-request timeout
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },

    /// Download logos and group near-identical ones
    Group {
        /// JSON Lines file produced by `resolve`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Where to write one row per group
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Maximum differing bits for two logos to share a group
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u32,
        /// Side of the hashing grid (mean and gradient give hash_size² bits)
        #[arg(long, default_value_t = DEFAULT_HASH_SIZE)]
        hash_size: u32,
        /// Perceptual hash: mean, gradient or double-gradient
        #[arg(long, default_value_t = HashAlgorithm::Mean)]
        algorithm: HashAlgorithm,
        /// Per-download timeout
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },

    /// Print grouped logos
    Show {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Summarise any dataset file
    Inspect {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Number of leading rows to print
        #[arg(long, default_value_t = 5)]
        head: usize,
    },

    /// List previous `group` runs
    History {
        /// Directory holding the grouped output
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            input,
            output,
            max_retries,
            retry_delay_ms,
            timeout_secs,
        } => {
            let config = ResolverConfig {
                max_retries,
                retry_delay: Duration::from_millis(retry_delay_ms),
                timeout: Duration::from_secs(timeout_secs),
                ..ResolverConfig::default()
            };
            resolve(&input, &output, &config)?;
        }

        Commands::Group {
            input,
            output,
            threshold,
            hash_size,
            algorithm,
            timeout_secs,
        } => {
            let config = GroupingConfig {
                threshold,
                hash_size,
                algorithm,
            };
            let fetch = FetchConfig {
                timeout: Duration::from_secs(timeout_secs),
            };
            group(&input, &output, &config, &fetch)?;
        }

        Commands::Show { input } => {
            let groups: Vec<GroupRecord> = dataset::read_jsonl(&input)
                .with_context(|| format!("Could not read groups from {:?}", input))?;
            let mut count = 0;
            for group in &groups {
                println!("Group {}:", group.group_id);
                for (domain, logo_url) in group.entries() {
                    println!("  Domain: {}", domain);
                    println!("  Logo URL: {}", logo_url);
                    count += 1;
                }
                println!("{}", "-".repeat(40));
            }
            println!("{} logo(s) in {} group(s)", count, groups.len());
        }

        Commands::Inspect { input, head } => {
            let summary = dataset::summarize(&input, head)
                .with_context(|| format!("Could not read dataset {:?}", input))?;
            println!("🗂️  {} ({} rows)", input.display(), summary.rows);
            for column in &summary.columns {
                println!("   {:<12} {} non-null", column.name, column.non_null);
            }
            for row in &summary.head {
                println!("   {}", row);
            }
        }

        Commands::History { dir } => {
            let runs = dataset::read_runs(&dir)
                .with_context(|| format!("Could not open history in {:?}", dir))?;
            println!("🗂️  Run History:");
            for (i, run) in runs.iter().enumerate() {
                println!(
                    "[{}] {}\n     {} → {}\n     {} hash, size {}, threshold {}\n     {} of {} logos in {} group(s)\n",
                    i,
                    run.timestamp,
                    run.input,
                    run.output,
                    run.algorithm,
                    run.hash_size,
                    run.threshold,
                    run.grouped,
                    run.items,
                    run.groups
                );
            }
        }
    }

    Ok(())
}

fn resolve(input: &Path, output: &Path, config: &ResolverConfig) -> Result<()> {
    let records: Vec<DomainRecord> = dataset::read_jsonl(input)
        .with_context(|| format!("Could not read domains from {:?}", input))?;
    println!("▶ Resolving logos for {} domain(s)", records.len());

    let resolver = LogoResolver::with_default_sources(config)?;
    let domains: Vec<String> = records.into_iter().map(|r| r.domain).collect();

    let bar = progress_bar(domains.len() as u64)?;
    let urls = benchmark("resolving logos", || {
        resolver.resolve_all(&domains, |_, _| bar.inc(1))
    });
    bar.finish_and_clear();

    let rows: Vec<LogoRecord> = domains
        .into_iter()
        .zip(urls)
        .map(|(domain, logo_url)| LogoRecord { domain, logo_url })
        .collect();
    let found = rows.iter().filter(|r| r.logo_url.is_some()).count();

    dataset::write_jsonl(output, &rows)
        .with_context(|| format!("Failed to write {:?}", output))?;
    println!(
        "✅ Found {} of {} logos ({:.1}%) → {}",
        found,
        rows.len(),
        percent(found, rows.len()),
        output.display()
    );
    Ok(())
}

fn group(
    input: &Path,
    output: &Path,
    config: &GroupingConfig,
    fetch: &FetchConfig,
) -> Result<()> {
    let records: Vec<LogoRecord> = dataset::read_jsonl(input)
        .with_context(|| format!("Could not read logos from {:?}", input))?;
    let total = records.len();
    let items: Vec<LogoItem> = records
        .into_iter()
        .filter_map(|r| r.logo_url.map(|url| LogoItem::new(r.domain, url)))
        .collect();
    println!("▶ Total logos to process: {}", items.len());
    println!(
        "▶ {} hash, {} bits per fingerprint, threshold {}",
        config.algorithm,
        config.bit_len(),
        config.threshold
    );

    let fetcher = ImageFetcher::new(fetch)?;
    let service = FingerprintService::new(config)?;

    let bar = progress_bar(items.len() as u64)?;
    let table = benchmark("downloading and hashing logos", || {
        fingerprint_items(&service, &fetcher, items, || bar.inc(1))
    });
    bar.finish_and_clear();
    println!("▶ Logos successfully downloaded: {}", table.len());

    let outcome = benchmark("grouping logos", || {
        group_fingerprinted(&table, config.threshold)
    })?;

    dataset::write_jsonl(output, &outcome.records)
        .with_context(|| format!("Failed to write {:?}", output))?;

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let run = RunRecord {
        timestamp: Utc::now().to_rfc3339(),
        input: input.to_string_lossy().into_owned(),
        output: output.to_string_lossy().into_owned(),
        algorithm: config.algorithm.to_string(),
        hash_size: config.hash_size,
        threshold: config.threshold,
        items: total,
        grouped: table.len(),
        groups: outcome.records.len(),
    };
    dataset::append_run(dir, &run)
        .with_context(|| format!("Failed to record run history in {:?}", dir))?;

    let shared = outcome.records.iter().filter(|g| g.len() > 1).count();
    println!(
        "✅ {} logo(s) in {} group(s), {} with more than one logo → {}",
        table.len(),
        outcome.records.len(),
        shared,
        output.display()
    );
    Ok(())
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )?);
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    println!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
