use clap::{Parser, Subcommand, ValueEnum};
use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use version_gate::config::Config;
use version_gate::engine::{ComplianceEngine, Trigger, Verdict};
use version_gate::error::{Error, Result};
use version_gate::fetch::{FileFetcher, OfflineFetcher, PolicyFetcher};
use version_gate::logger;
use version_gate::policy::GatePolicy;
use version_gate::signal::LogEmitter;
use version_gate::storage::{ComplianceCache, FileStorage};
use version_gate::version::Version;

#[derive(Parser)]
#[command(name = "version-gate")]
#[command(about = "Version gate CLI - decide whether an app version must update before use")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: "human" or "json" (falls back to VERSION_GATE_OUTPUT_FORMAT)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Data directory path
    #[arg(short, long)]
    pub data_dir: Option<String>,

    /// Log level: "error", "warn", "info", "debug"
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the data directory
    Init,

    /// Evaluate the gate for a running app version
    Evaluate {
        /// Running app version (falls back to VERSION_GATE_APP_VERSION)
        #[arg(short, long)]
        app_version: Option<String>,

        /// Policy payload file standing in for the network fetch; omit to simulate being offline
        #[arg(short, long)]
        policy: Option<String>,

        /// What triggered the evaluation
        #[arg(short, long, value_enum, default_value = "launch")]
        trigger: TriggerArg,
    },

    /// Compare two version strings
    Compare {
        left: String,
        right: String,
    },

    /// Show the cached policy
    ShowCache,

    /// Clear the cached policy
    ClearCache,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TriggerArg {
    Launch,
    Foreground,
}

impl From<TriggerArg> for Trigger {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::Launch => Trigger::Launch,
            TriggerArg::Foreground => Trigger::Foreground,
        }
    }
}

/// Format output based on format type
fn format_output<T: serde::Serialize + std::fmt::Debug>(data: &T, format: &str) -> Result<String> {
    match format {
        "json" => serde_json::to_string_pretty(data)
            .map_err(|e| Error::Serialization(format!("Failed to serialize JSON: {}", e))),
        _ => Ok(format!("{:#?}", data)),
    }
}

fn evaluate_with<F: PolicyFetcher>(
    config: &Config,
    app_version: &str,
    fetcher: F,
    trigger: Trigger,
) -> EvaluateOutput {
    let storage = FileStorage::new(config);
    let mut engine = ComplianceEngine::new(app_version, fetcher, storage, LogEmitter);
    let verdict = engine.evaluate(trigger);
    EvaluateOutput {
        app_version: engine.app_version().to_string(),
        trigger,
        verdict,
    }
}

/// Apply global CLI flags on top of the env-derived config; unset flags keep the env value
fn apply_flags(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.data_dir {
        config.set_data_dir(PathBuf::from(dir));
    }
    if let Some(level) = &cli.log_level {
        config.set_log_level(level.clone());
    }
    if let Some(format) = &cli.format {
        config.set_output_format(format.clone());
    }
}

fn render_verdict(output: &EvaluateOutput) -> String {
    let mut lines = vec![format!("{} -> {}", output.app_version, output.verdict)];
    if let Some(prompt) = output.verdict.prompt() {
        if let Some(latest) = &prompt.latest_version {
            lines.push(format!("  Latest version: {}", latest));
        }
        if let Some(whats_new) = &prompt.whats_new {
            lines.push(format!("  What's new: {}", whats_new));
        }
        if let Some(url) = &prompt.store_url {
            lines.push(format!("  Store: {}", url));
        }
    }
    lines.join("\n")
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    apply_flags(&mut config, &cli);
    logger::init(config.get_log_level());

    let format = config.get_output_format().to_string();

    match cli.command {
        Commands::Init => {
            fs::create_dir_all(config.get_data_dir())
                .map_err(|e| Error::Storage(format!("Failed to create data directory: {}", e)))?;
            println!("Initialized data directory at: {}", config.get_data_dir().display());
            Ok(())
        }

        Commands::Evaluate {
            app_version,
            policy,
            trigger,
        } => {
            if let Some(version) = app_version {
                config.set_app_version(version);
            }
            let app_version = config.require_app_version()?.to_string();

            let output = match policy {
                Some(path) => evaluate_with(&config, &app_version, FileFetcher::new(path), trigger.into()),
                None => evaluate_with(&config, &app_version, OfflineFetcher, trigger.into()),
            };
            match format.as_str() {
                "json" => println!("{}", format_output(&output, &format)?),
                _ => println!("{}", render_verdict(&output)),
            }
            Ok(())
        }

        Commands::Compare { left, right } => {
            let ordering = match Version::parse_strict(&left)?.cmp(&Version::parse_strict(&right)?) {
                Ordering::Less => "lt",
                Ordering::Equal => "eq",
                Ordering::Greater => "gt",
            };
            let output = CompareOutput {
                left,
                right,
                ordering,
            };
            match format.as_str() {
                "json" => println!("{}", format_output(&output, &format)?),
                _ => println!("{} {} {}", output.left, output.ordering, output.right),
            }
            Ok(())
        }

        Commands::ShowCache => {
            let storage = FileStorage::new(&config);
            let output = CacheOutput {
                path: config.policy_cache_path().display().to_string(),
                policy: storage.read()?,
            };
            println!("{}", format_output(&output, &format)?);
            Ok(())
        }

        Commands::ClearCache => {
            let mut storage = FileStorage::new(&config);
            storage.write(None)?;
            println!("Cleared policy cache at: {}", config.policy_cache_path().display());
            Ok(())
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct EvaluateOutput {
    app_version: String,
    trigger: Trigger,
    verdict: Verdict,
}

#[derive(Debug, serde::Serialize)]
struct CompareOutput {
    left: String,
    right: String,
    ordering: &'static str,
}

#[derive(Debug, serde::Serialize)]
struct CacheOutput {
    path: String,
    policy: Option<GatePolicy>,
}
