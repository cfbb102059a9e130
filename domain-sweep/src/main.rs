//! Domain Sweep CLI Application
//!
//! Generates short domain candidates and checks their availability through
//! domain-sweep-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args as ClapArgs, Parser, Subcommand};
use domain_sweep_lib::protocols::is_whois_available;
use domain_sweep_lib::{
    read_domain_file, AvailabilityChecker, ConfigManager, DomainGenerator, DomainSweepError,
    IanaTldSource, LookupCache, Report, ReservedSet, Settings, TldCache, WordList,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-sweep
#[derive(Parser, Debug)]
#[command(name = "domain-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find unregistered short domains: generate SLD x TLD candidates and check them")]
#[command(
    long_about = "Generate every short SLD x TLD candidate for the configured lengths and prefixes, then check availability via WHOIS with Domainr API fallback.\n\nLookups are cached, so reruns within the cache window send no queries."
)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write candidate domains, one per line
    Generate(GenerateArgs),
    /// Check a list of domains and write the report
    Check(CheckArgs),
    /// Refresh TLDs, generate, check and report in one go
    Run(RunArgs),
}

/// Candidate selection flags shared by `generate` and `run`.
#[derive(ClapArgs, Debug, Default)]
pub struct CandidateArgs {
    /// Only SLDs starting with this prefix
    #[arg(long = "prefix-domain", value_name = "PREFIX")]
    pub prefix_domain: Option<String>,

    /// Only TLDs starting with this prefix
    #[arg(long = "prefix-tld", value_name = "PREFIX")]
    pub prefix_tld: Option<String>,

    /// Only keep candidates whose SLD + TLD spells a dictionary word
    #[arg(long = "only-words")]
    pub only_words: bool,
}

#[derive(ClapArgs, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub candidates: CandidateArgs,

    /// Output file (default: generated_domains_file from config)
    #[arg(short = 'o', long = "outfile", value_name = "FILE")]
    pub outfile: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct CheckArgs {
    /// Newline-delimited domains to check (default: generated_domains_file)
    #[arg(short = 'f', long = "domains-file", value_name = "FILE")]
    pub domains_file: Option<PathBuf>,

    /// JSON report path (default: results_file from config)
    #[arg(long = "results-file", value_name = "FILE")]
    pub results_file: Option<PathBuf>,

    /// Max concurrent lookups (1-100)
    #[arg(short = 'c', long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub candidates: CandidateArgs,

    /// Max concurrent lookups (1-100)
    #[arg(short = 'c', long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.log_file.as_deref());
    debug!("domain-sweep v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

/// Install the tracing subscriber: stderr always, plus the log file when
/// it can be opened.
fn init_logging(verbose: bool, log_file: Option<&Path>) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let mut open_error = None;
    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                open_error = Some(format!("{}: {}", path.display(), e));
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(e) = open_error {
        warn!("Cannot open log file {}; logging to stderr only", e);
    }
}

async fn run(args: Args) -> Result<(), DomainSweepError> {
    let manager = ConfigManager::new(args.verbose);
    let mut settings = manager.load_settings(args.config.as_deref())?;

    match args.command {
        Command::Generate(cmd) => {
            apply_candidate_args(&mut settings, &cmd.candidates);
            run_generate(&settings, cmd.outfile).await
        }
        Command::Check(cmd) => {
            apply_concurrency(&mut settings, cmd.concurrency)?;
            if let Some(path) = cmd.results_file {
                settings.paths.results_file = path;
            }
            let domains_file = cmd
                .domains_file
                .unwrap_or_else(|| settings.paths.generated_domains_file.clone());
            run_check(&settings, &domains_file).await
        }
        Command::Run(cmd) => {
            apply_candidate_args(&mut settings, &cmd.candidates);
            apply_concurrency(&mut settings, cmd.concurrency)?;
            run_all(&settings).await
        }
    }
}

fn apply_candidate_args(settings: &mut Settings, args: &CandidateArgs) {
    let mut generate = std::mem::take(&mut settings.generate);
    if let Some(prefix) = &args.prefix_domain {
        generate = generate.with_prefix_domain(prefix.as_str());
    }
    if let Some(prefix) = &args.prefix_tld {
        generate = generate.with_prefix_tld(prefix.as_str());
    }
    if args.only_words {
        generate = generate.with_only_words(true);
    }
    settings.generate = generate;
}

fn apply_concurrency(
    settings: &mut Settings,
    concurrency: Option<usize>,
) -> Result<(), DomainSweepError> {
    if let Some(n) = concurrency {
        if n == 0 || n > 100 {
            return Err(DomainSweepError::config(
                "--concurrency must be between 1 and 100",
            ));
        }
        settings.check.thread_count = n;
    }
    Ok(())
}

/// Build the generator from the TLD cache, reserved list and word list.
async fn build_generator(settings: &Settings) -> Result<DomainGenerator, DomainSweepError> {
    let source = IanaTldSource::new(settings.tld_source_url.clone(), settings.check.check_timeout)?;
    let mut tld_cache = TldCache::load(
        &settings.paths.tld_cache_file,
        settings.check.max_cache_age_days,
    );
    let tlds = tld_cache.get_valid_tlds(&source).await?;

    let reserved = ReservedSet::load(&settings.paths.reserved_file)?;
    let mut generator = DomainGenerator::new(settings.generate.clone(), tlds, reserved)?;

    if settings.generate.only_words {
        if let Some(path) = &settings.paths.word_list_file {
            generator =
                generator.with_word_list(WordList::load(path, settings.generate.target_word_length)?);
        }
    }

    debug!(
        "Generating over {} TLDs, up to {} candidates before filtering",
        generator.tlds().len(),
        generator.estimate_count()
    );
    Ok(generator)
}

async fn run_generate(
    settings: &Settings,
    outfile: Option<PathBuf>,
) -> Result<(), DomainSweepError> {
    let generator = build_generator(settings).await?;
    let outfile = outfile.unwrap_or_else(|| settings.paths.generated_domains_file.clone());

    let count = generator.write_to(&outfile)?;
    ui::print_generated(count, generator.tlds().len(), &outfile);
    Ok(())
}

fn build_checker(settings: &Settings) -> Result<AvailabilityChecker, DomainSweepError> {
    let cache = Arc::new(LookupCache::load(
        &settings.paths.lookup_cache_file,
        settings.check.max_cache_age_days,
    ));
    AvailabilityChecker::new(settings.check.clone(), cache)
}

async fn run_check(settings: &Settings, domains_file: &Path) -> Result<(), DomainSweepError> {
    let domains = read_domain_file(domains_file)?;
    info!(
        "Checking {} domains from {}",
        domains.len(),
        domains_file.display()
    );

    let checker = build_checker(settings)?;
    warn_if_whois_missing(settings).await;

    let spinner = ui::Spinner::start("Checking domains", Some(domains.len()));
    let report = checker
        .check_all_with_progress(domains, |_| spinner.tick())
        .await;
    spinner.stop().await;

    finish_report(settings, &report?)
}

/// The full pipeline: TLD refresh, generation, checking, reporting.
async fn run_all(settings: &Settings) -> Result<(), DomainSweepError> {
    if settings.notifications.any_enabled() {
        warn!("Email/webhook notifications are configured but not supported; they are ignored");
    }

    let generator = build_generator(settings).await?;
    let count = generator.write_to(&settings.paths.generated_domains_file)?;
    ui::print_generated(
        count,
        generator.tlds().len(),
        &settings.paths.generated_domains_file,
    );

    let checker = build_checker(settings)?;
    warn_if_whois_missing(settings).await;

    let spinner = ui::Spinner::start("Checking domains", Some(count));
    let report = checker
        .check_all_with_progress(generator.candidates().map(|c| c.full), |_| spinner.tick())
        .await;
    spinner.stop().await;

    finish_report(settings, &report?)
}

async fn warn_if_whois_missing(settings: &Settings) {
    if !is_whois_available(&settings.check.whois_command).await {
        warn!(
            "WHOIS client '{}' not found; every uncached domain will need the API fallback",
            settings.check.whois_command
        );
    }
}

/// Save the report and the available listing, then print the summary.
fn finish_report(settings: &Settings, report: &Report) -> Result<(), DomainSweepError> {
    let paths = &settings.paths;
    let previous = Report::load_previous(&paths.results_file);

    report.save(&paths.results_file)?;
    let listed = report.write_available(&paths.available_file)?;
    info!(
        "{} available domains written to {}",
        listed,
        paths.available_file.display()
    );

    let newly_available = match &previous {
        Some(previous) => report.newly_available(previous),
        None => Vec::new(),
    };
    if !newly_available.is_empty() {
        info!("Newly available since last run: {}", newly_available.join(", "));
    }

    info!("{}", report.summary);
    ui::print_summary(report, &newly_available, &paths.results_file);
    Ok(())
}
