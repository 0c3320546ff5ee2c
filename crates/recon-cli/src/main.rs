use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use recon_core::{ChangePlan, ReconcileConfig, ReconcileError};
use recon_diff::diff_types;
use recon_schema::{SnapshotDocument, SnapshotPair};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod render;

fn cli() -> Command {
    let file = Arg::new("file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Snapshot document (.yaml, .yml or .json)");

    Command::new("recon")
        .version(recon_core::VERSION)
        .about("Schema reconciliation for document stores")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log level when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Run configuration (TOML)"),
        )
        .subcommand(
            Command::new("diff")
                .about("Show type and field changes between the old and new snapshot")
                .arg(file.clone()),
        )
        .subcommand(
            Command::new("plan")
                .about("Show the operations a run would issue")
                .arg(file)
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    if let Err(e) = setup_logging(level, matches.get_flag("log-json")) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    debug!(?config, "Loaded run configuration");

    match matches.subcommand() {
        Some(("diff", args)) => {
            let pair = load_pair(required_path(args)?)?;
            let diff = diff_types(&pair.old, &pair.new);
            diff.check_consistency().map_err(ReconcileError::from)?;
            print!("{}", render::render_diff(&diff));
        }
        Some(("plan", args)) => {
            let pair = load_pair(required_path(args)?)?;
            let plan = recon_core::plan(&pair.old, &pair.new)?;
            info!(
                operations = plan.len(),
                concurrency_limit = config.concurrency_limit,
                "Plan ready"
            );
            if args.get_flag("json") {
                println!("{}", plan_json(&plan, &config)?);
            } else {
                print!("{}", render::render_plan(&plan, &config));
            }
        }
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}

fn required_path(args: &ArgMatches) -> Result<&Path> {
    args.get_one::<PathBuf>("file")
        .map(PathBuf::as_path)
        .context("missing snapshot document")
}

fn load_pair(path: &Path) -> Result<SnapshotPair> {
    let document = SnapshotDocument::from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let pair = document.into_pair().map_err(ReconcileError::from)?;
    info!(
        old = pair.old.label().unwrap_or("-"),
        new = pair.new.label().unwrap_or("-"),
        "Loaded snapshots"
    );
    Ok(pair)
}

fn plan_json(plan: &ChangePlan, config: &ReconcileConfig) -> Result<String> {
    let out = serde_json::json!({ "config": config, "plan": plan });
    Ok(serde_json::to_string_pretty(&out)?)
}

fn load_config(path: Option<&Path>) -> Result<ReconcileConfig> {
    let Some(path) = path else {
        return Ok(ReconcileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = ReconcileConfig::from_toml_str(&text)?;
    Ok(config)
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
