//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cdkdocset_core::{
    BuildConfig, DownloadConfig, Fetcher, PackageConfig, ProgressReporter, current_version,
    validate_docset,
};
use cdkdocset_shared::{AppConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// The AWS CDK API reference as an offline docset.
#[derive(Parser, Debug)]
#[command(
    name = "cdk-docset",
    version,
    about = "Mirror the AWS CDK API reference and build an offline docset from it.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.cdk-docset/cdk-docset.toml).
    #[arg(long = "config", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Where the source mirror lives and what it must contain.
#[derive(Args, Debug)]
pub(crate) struct SourceArgs {
    /// Source mirror directory.
    #[arg(long, default_value = "var/mirror")]
    pub mirror: PathBuf,

    /// Version every page must show (defaults to the published one).
    #[arg(long, env = "CDK_DOCSET_VERSION")]
    pub expect_version: Option<String>,

    /// Concurrent requests or page workers (overrides fetch.concurrency).
    #[arg(short = 'j', long)]
    pub concurrency: Option<u32>,
}

/// Where the docset is written.
#[derive(Args, Debug)]
pub(crate) struct OutputArgs {
    /// Directory receiving `<name>.docset` and `meta.json`.
    #[arg(short, long, default_value = "var/docset")]
    pub out: PathBuf,

    /// Docset name (overrides docset.name).
    #[arg(long)]
    pub name: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Mirror the table of contents, its pages and the static assets.
    Download {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Build the docset from an existing mirror.
    Build {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download, then build.
    Sync {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Add the icon to a built docset and archive it as `<name>.tgz`.
    Package {
        #[command(flatten)]
        output: OutputArgs,

        /// PNG to use as the docset icon (overrides docset.icon).
        #[arg(long)]
        icon: Option<PathBuf>,
    },

    /// Print the version currently published online.
    Version,

    /// Check that a built docset is well-formed.
    Validate {
        /// Path to the `.docset` directory.
        path: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. `RUST_LOG` takes precedence.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "cdkdocset=info,cdk_docset=info",
        1 => "cdkdocset=debug,cdk_docset=debug",
        _ => "cdkdocset=trace,cdk_docset=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_file;
    match cli.command {
        Command::Download { source } => {
            let config = resolve_config(config_path.as_deref(), &source, None)?;
            cmd_download(&config, &source).await
        }
        Command::Build { source, output } => {
            let config = resolve_config(config_path.as_deref(), &source, Some(&output))?;
            cmd_build(&config, &source, &output).await
        }
        Command::Sync { source, output } => {
            let config = resolve_config(config_path.as_deref(), &source, Some(&output))?;
            cmd_sync(&config, &source, &output).await
        }
        Command::Package { output, icon } => {
            let mut config = load(config_path.as_deref())?;
            if let Some(name) = &output.name {
                config.docset.name = name.clone();
            }
            if icon.is_some() {
                config.docset.icon = icon;
            }
            config.validate()?;
            cmd_package(&config, &output).await
        }
        Command::Version => cmd_version(&load(config_path.as_deref())?).await,
        Command::Validate { path } => cmd_validate(&path).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&load(config_path.as_deref())?).await,
        },
    }
}

/// Config file at `path`, or the user config.
fn load(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Loaded config with command-line overrides applied.
fn resolve_config(
    path: Option<&Path>,
    source: &SourceArgs,
    output: Option<&OutputArgs>,
) -> Result<AppConfig> {
    let mut config = load(path)?;
    apply_overrides(&mut config, source, output)?;
    Ok(config)
}

fn apply_overrides(
    config: &mut AppConfig,
    source: &SourceArgs,
    output: Option<&OutputArgs>,
) -> Result<()> {
    if let Some(concurrency) = source.concurrency {
        if concurrency == 0 {
            return Err(eyre!("--concurrency must be at least 1"));
        }
        config.fetch.concurrency = concurrency;
    }
    if let Some(name) = output.and_then(|o| o.name.as_ref()) {
        config.docset.name = name.clone();
    }
    config.validate()?;
    Ok(())
}

fn download_config(config: &AppConfig, source: &SourceArgs) -> DownloadConfig {
    DownloadConfig {
        site: config.site.clone(),
        mirror_dir: source.mirror.clone(),
        expected_version: source.expect_version.clone(),
        concurrency: config.fetch.concurrency as usize,
    }
}

fn build_config(config: &AppConfig, source: &SourceArgs, output: &OutputArgs) -> BuildConfig {
    BuildConfig {
        site: config.site.clone(),
        docset: config.docset.clone(),
        mirror_dir: source.mirror.clone(),
        output_dir: output.out.clone(),
        expected_version: source.expect_version.clone(),
        concurrency: config.fetch.concurrency as usize,
    }
}

fn package_config(config: &AppConfig, output: &OutputArgs) -> PackageConfig {
    PackageConfig {
        docset: config.docset.clone(),
        output_dir: output.out.clone(),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_download(config: &AppConfig, source: &SourceArgs) -> Result<()> {
    let fetcher = Fetcher::new(&config.site, &config.fetch)?;
    info!(mirror = %source.mirror.display(), "downloading");

    let reporter = CliProgress::new();
    let result =
        cdkdocset_core::download(&fetcher, &download_config(config, source), &reporter).await?;
    drop(reporter);

    println!();
    println!("  Mirror updated!");
    println!("  Version: {}", result.version);
    println!("  Fetched: {}", result.report.fetched);
    println!("  Present: {}", result.report.skipped);
    println!("  Path:    {}", source.mirror.display());
    println!("  Time:    {:.1}s", result.report.duration.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_build(config: &AppConfig, source: &SourceArgs, output: &OutputArgs) -> Result<()> {
    info!(mirror = %source.mirror.display(), out = %output.out.display(), "building docset");

    let reporter = CliProgress::new();
    let result = cdkdocset_core::build(&build_config(config, source, output), &reporter).await?;
    drop(reporter);

    print_build(&result);
    Ok(())
}

async fn cmd_sync(config: &AppConfig, source: &SourceArgs, output: &OutputArgs) -> Result<()> {
    let fetcher = Fetcher::new(&config.site, &config.fetch)?;
    info!(mirror = %source.mirror.display(), out = %output.out.display(), "syncing docset");

    let reporter = CliProgress::new();
    let result =
        cdkdocset_core::sync(&fetcher, &build_config(config, source, output), &reporter).await?;
    drop(reporter);

    println!();
    println!(
        "  Mirrored {} items ({} already present)",
        result.download.report.fetched, result.download.report.skipped
    );
    print_build(&result.build);
    Ok(())
}

fn print_build(result: &cdkdocset_core::BuildResult) {
    println!();
    println!("  Docset built!");
    println!("  Version:  {}", result.version);
    println!("  Rendered: {}", result.rendered);
    println!("  Skipped:  {}", result.skipped);
    println!("  Assets:   {}", result.assets_copied);
    println!("  Entries:  {} (+{})", result.index_entries, result.entries_added);
    println!("  Path:     {}", result.docset_path.display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

async fn cmd_package(config: &AppConfig, output: &OutputArgs) -> Result<()> {
    info!(out = %output.out.display(), name = %config.docset.name, "packaging docset");

    let reporter = CliProgress::new();
    let result = cdkdocset_core::package(&package_config(config, output), &reporter).await?;
    drop(reporter);

    println!();
    println!("  Docset packaged!");
    println!("  Members: {}", result.members);
    println!("  Entries: {}", result.index_entries);
    println!("  Size:    {:.1} MiB", result.size as f64 / (1024.0 * 1024.0));
    println!("  Path:    {}", result.archive_path.display());
    println!();

    Ok(())
}

async fn cmd_version(config: &AppConfig) -> Result<()> {
    let fetcher = Fetcher::new(&config.site, &config.fetch)?;
    let version = current_version(&fetcher, &config.site).await?;
    println!("{version}");
    Ok(())
}

async fn cmd_validate(path: &Path) -> Result<()> {
    let entries = validate_docset(path).await?;
    println!("{} is valid ({entries} index entries)", path.display());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
///
/// The spinner is cleared when the reporter is dropped.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_done(&self, path: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("[{current}/{total}] {path}"));
    }

    fn done(&self, summary: &str) {
        self.spinner.println(format!("  {summary}"));
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}
