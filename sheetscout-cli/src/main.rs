use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Input, Select};
use sheetscout::{
    config::DEFAULT_CONFIG_PATH, run_search, BarProgress, ConfigOverrides, ScanConfig, ScanError,
    ScanProgress, SearchSummary, SettingKey, Settings, SilentProgress,
};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the settings file
    #[arg(short = 'c', long = "config", global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Starts the interactive menu when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct SearchArgs {
    /// Directory to search recursively (overrides search_directory)
    #[arg(short = 'd', long = "dir")]
    directory: Option<PathBuf>,

    /// Workbook whose first column lists the keywords (overrides excel_file_path)
    #[arg(short = 'k', long = "keywords")]
    keywords: Option<PathBuf>,

    /// Result workbook to write (overrides output_path)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every workbook under a directory for keyword rows
    Search(Box<SearchArgs>),

    /// Show or change the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Interactive menu
    Menu,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print every setting
    Show,

    /// Change one setting and save the file
    Set {
        /// Setting name, e.g. search_directory
        key: String,
        /// New value; empty clears an optional setting
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Search(args)) => search_command(&cli.config, &args),
        Some(Commands::Config {
            action: ConfigAction::Show,
        }) => show_config(&cli.config),
        Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) => set_config(&cli.config, &key, &value),
        Some(Commands::Menu) | None => run_menu(&cli.config),
    }
}

fn report_error(err: &anyhow::Error) -> ExitCode {
    debug!("{:?}", err);
    if let Some(ScanError::ConfigMissing(path)) = err.downcast_ref::<ScanError>() {
        eprintln!(
            "{} created {}",
            "Configuration required:".yellow().bold(),
            path.display()
        );
        eprintln!("Fill in search_directory and excel_file_path, then run sheetscout again.");
        return ExitCode::from(2);
    }
    eprintln!("{} {}", "Error:".red().bold(), err);
    ExitCode::FAILURE
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sheetscout={},warn", level)));

    // The menu may start several searches; only the first one installs a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_scan_config(config_path: &Path, args: &SearchArgs) -> Result<ScanConfig> {
    let base = match (&args.directory, &args.keywords) {
        // Both required paths given: the settings file is optional
        (Some(dir), Some(keywords)) if !config_path.exists() => ScanConfig::new(dir, keywords),
        _ => ScanConfig::load_from(config_path)?,
    };

    Ok(base.merge_with_cli(ConfigOverrides {
        search_directory: args.directory.clone(),
        keyword_file: args.keywords.clone(),
        output_path: args.output.clone(),
        thread_count: args.threads,
        log_level: args.log_level.clone(),
    }))
}

fn search_command(config_path: &Path, args: &SearchArgs) -> Result<()> {
    let config = load_scan_config(config_path, args)?;
    init_logging(&config.log_level);

    println!(
        "Searching {} with keywords from {}",
        config.search_directory.display().to_string().blue(),
        config.keyword_file.display().to_string().blue()
    );

    let bar;
    let progress: &dyn ScanProgress = if args.no_progress {
        &SilentProgress
    } else {
        bar = BarProgress::new();
        &bar
    };

    let summary = run_search(&config, progress)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &SearchSummary) {
    println!(
        "\nFound {} matching rows in {} of {} workbooks ({} keywords, {} rows scanned)",
        summary.total_matches.to_string().green(),
        summary.files_with_matches,
        summary.files_scanned,
        summary.keywords,
        summary.rows_scanned
    );

    if !summary.failures.is_empty() {
        println!(
            "{}",
            format!("{} workbooks could not be read:", summary.files_failed()).yellow()
        );
        for failure in &summary.failures {
            println!("  {}: {}", failure.path.display(), failure.message);
        }
    }

    println!(
        "Results written to {} in {:.2?}",
        summary.output_path.display().to_string().blue(),
        summary.elapsed
    );
}

fn show_config(config_path: &Path) -> Result<()> {
    let settings = Settings::load(config_path)?;
    println!("{}", config_path.display().to_string().blue());
    for (key, value) in settings.entries() {
        match value {
            Some(value) if !value.is_empty() => println!("  {} = {}", key, value),
            _ => println!("  {} = {}", key, "(not set)".dimmed()),
        }
    }
    Ok(())
}

fn load_or_default(config_path: &Path) -> Result<Settings> {
    if config_path.exists() {
        Ok(Settings::load(config_path)?)
    } else {
        Ok(Settings::default())
    }
}

fn set_config(config_path: &Path, key: &str, value: &str) -> Result<()> {
    let key: SettingKey = key.parse()?;
    let mut settings = load_or_default(config_path)?;
    settings.set(key, value)?;
    settings.save(config_path)?;
    println!("Updated {} in {}", key.to_string().green(), config_path.display());
    Ok(())
}

fn edit_config(config_path: &Path) -> Result<()> {
    let mut settings = load_or_default(config_path)?;
    for key in SettingKey::ALL {
        let current = settings.get(key).unwrap_or_default();
        let value: String = Input::new()
            .with_prompt(key.as_str())
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?;
        settings.set(key, &value)?;
    }
    settings.save(config_path)?;
    println!("Saved {}", config_path.display().to_string().green());
    Ok(())
}

fn run_menu(config_path: &Path) -> Result<()> {
    let items = [
        "Run search",
        "Edit configuration",
        "Show configuration",
        "Exit",
    ];

    loop {
        let choice = Select::new()
            .with_prompt("sheetscout")
            .items(&items)
            .default(0)
            .interact()?;

        let result = match choice {
            0 => search_command(config_path, &SearchArgs::default()),
            1 => edit_config(config_path),
            2 => show_config(config_path),
            _ => return Ok(()),
        };
        if let Err(err) = result {
            report_error(&err);
        }
        println!();
    }
}
