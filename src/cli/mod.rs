use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;

use crate::core::{CompanyInfo, ProcessResponse, StoredReport};
use crate::engine::{Engine, EngineOptions};
use crate::ingest::{Dataset, DatasetClassifier, DatasetKind, ProcessRequest};
use crate::store::{FileReportStore, ReportStore, SaveOutcome};
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "win11ready",
    version,
    about = "Windows 11 readiness reports from RMM diagnostics joined with ScalePad warranty data"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify an RMM export against a ScalePad export.
    Process(ProcessArgs),
    /// Saved reports.
    History(HistoryArgs),
    /// Interactive terminal dashboard over saved reports.
    Dashboard(DashboardArgs),
    Completion(CompletionArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    #[arg(long)]
    pub rmm: Option<PathBuf>,
    #[arg(long)]
    pub scalepad: Option<PathBuf>,
    /// Input files whose kind is inferred from the file name.
    #[arg(long, num_args = 1..)]
    pub input: Vec<PathBuf>,
    #[arg(long)]
    pub input_dir: Option<PathBuf>,
    /// JSON processing request (`files` + `companyInfo`).
    #[arg(long, conflicts_with_all = ["rmm", "scalepad", "input", "input_dir"])]
    pub request: Option<PathBuf>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub site: Option<String>,
    #[arg(long)]
    pub tenant: Option<String>,
    #[arg(long)]
    pub csv_out: Option<PathBuf>,
    #[arg(long)]
    pub markdown: bool,
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    List,
    Show {
        #[arg(long)]
        id: String,
        #[arg(long)]
        markdown: bool,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
    Export {
        #[arg(long)]
        id: String,
        /// Defaults to stdout.
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let stdin_is_tty = io::stdin().is_terminal();
    let stdout_is_tty = io::stdout().is_terminal();
    let stderr_is_tty = io::stderr().is_terminal();

    let home_dir = crate::config::home_dir().map_err(crate::exit::invalid_args_err)?;

    let env_config_path = std::env::var_os(crate::config::CONFIG_ENV).map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &home_dir,
    )
    .map_err(crate::exit::invalid_args_err)?;

    let color = stdout_is_tty && cfg.ui.color && !cli.no_color;

    let ui_cfg = UiConfig {
        color,
        stdin_is_tty,
        stdout_is_tty,
        stderr_is_tty,
        max_table_rows: cfg.ui.max_table_rows,
        quiet: cli.quiet,
    };

    let store = FileReportStore::new(&cfg.store.path);

    match cli.command {
        Commands::Process(args) => {
            if cli.json && args.markdown {
                return Err(crate::exit::invalid_args(
                    "--markdown cannot be combined with --json",
                ));
            }
            let request = build_request(&args, &cfg)?;

            let engine = Engine::new(EngineOptions {
                export_csv: cfg.export.csv,
                show_progress: ui_cfg.stderr_is_tty && !cli.quiet && !cli.json,
            });
            let response = engine.process(&request)?;

            if let Some(path) = &args.csv_out {
                write_csv_file(path, &response)?;
            }

            if args.no_save || !cfg.store.enabled {
                log::info!("report not saved to history");
            } else {
                save_report(&store, &cfg.store.fallback_path, &response);
            }

            if cli.json {
                write_json(&response)?;
            } else if args.markdown {
                write_stdout(&crate::export::format_markdown(
                    &response.company_info,
                    &response.summary,
                    &response.secure_boot_stats,
                    &response.data,
                    None,
                ))?;
            } else {
                crate::ui::print_report(&response, &ui_cfg);
            }
        }
        Commands::History(args) => match args.command {
            HistoryCommand::List => {
                let reports = store.list().map_err(crate::exit::store_failed_err)?;
                let groups = crate::store::group_by_company(&reports);
                if cli.json {
                    write_json(&groups)?;
                } else {
                    crate::ui::print_history(&groups, &ui_cfg);
                }
            }
            HistoryCommand::Show { id, markdown } => {
                let report = find_report(&store, &id)?;
                if cli.json {
                    write_json(&report)?;
                } else if markdown {
                    write_stdout(&crate::export::format_markdown(
                        &report.company_info,
                        &report.summary,
                        &report.secure_boot_stats,
                        &report.data,
                        Some(&report.timestamp),
                    ))?;
                } else {
                    crate::ui::print_stored_report(&report, &ui_cfg);
                }
            }
            HistoryCommand::Delete { id } => {
                let deleted = store.delete(&id).map_err(crate::exit::store_failed_err)?;
                if !deleted {
                    return Err(crate::exit::invalid_args(format!("report not found: {id}")));
                }
                if cli.json {
                    write_json(&serde_json::json!({ "deleted": id }))?;
                } else if !ui_cfg.quiet {
                    println!("deleted report {id}");
                }
            }
            HistoryCommand::Export { id, csv_out } => {
                let report = find_report(&store, &id)?;
                let csv = crate::export::encode_csv(&report.data)?;
                match csv_out {
                    Some(path) => write_file(&path, &csv)?,
                    None => write_stdout(&csv)?,
                }
            }
        },
        Commands::Dashboard(args) => {
            if cli.json {
                return Err(crate::exit::invalid_args(
                    "dashboard cannot be combined with --json",
                ));
            }
            if !(ui_cfg.stdin_is_tty && ui_cfg.stdout_is_tty) {
                return Err(crate::exit::invalid_args(
                    "dashboard requires a TTY (stdin + stdout)",
                ));
            }
            crate::tui::run(&store, args.id.as_deref(), ui_cfg.color)
                .map_err(|err| {
                    if err.is::<crate::exit::ExitError>() {
                        err
                    } else {
                        crate::exit::store_failed_err(err)
                    }
                })?;
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "win11ready", &mut out);
        }
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    write_json(&cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: use `win11ready config --show`");
            }
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    // RUST_LOG is parsed after the flag level so it wins.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn build_request(args: &ProcessArgs, cfg: &crate::config::EffectiveConfig) -> Result<ProcessRequest> {
    if let Some(path) = &args.request {
        let mut request = read_request(path)?;
        apply_company_flags(args, &mut request.company_info);
        return Ok(request);
    }

    let mut company_info = CompanyInfo::default();
    apply_company_flags(args, &mut company_info);

    // Argument problems are reported before any export file is read.
    let paths = dataset_paths(args, cfg)?;
    let has = |kind: DatasetKind| paths.iter().any(|(_, k)| *k == kind);
    crate::engine::validate_header(
        has(DatasetKind::Rmm),
        has(DatasetKind::Scalepad),
        &company_info,
    )?;

    let files = paths
        .iter()
        .map(|(p, kind)| {
            crate::ingest::load_dataset(p, *kind).map_err(crate::exit::input_failed_err)
        })
        .collect::<Result<Vec<Dataset>>>()?;
    Ok(ProcessRequest {
        files,
        company_info,
    })
}

fn apply_company_flags(args: &ProcessArgs, company_info: &mut CompanyInfo) {
    if let Some(name) = &args.company {
        company_info.name = name.clone();
    }
    if let Some(site) = &args.site {
        company_info.site = site.clone();
    }
    if let Some(tenant) = &args.tenant {
        company_info.tenant = tenant.clone();
    }
}

fn read_request(path: &Path) -> Result<ProcessRequest> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read request: {}", path.display()))
        .map_err(crate::exit::input_failed_err)?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid processing request: {}", path.display()))
        .map_err(crate::exit::invalid_args_err)
}

/// Input files and their kinds, classified by name only.
fn dataset_paths(
    args: &ProcessArgs,
    cfg: &crate::config::EffectiveConfig,
) -> Result<Vec<(PathBuf, DatasetKind)>> {
    let mut paths: Vec<(PathBuf, DatasetKind)> = Vec::new();
    if let Some(p) = &args.rmm {
        paths.push((p.clone(), DatasetKind::Rmm));
    }
    if let Some(p) = &args.scalepad {
        paths.push((p.clone(), DatasetKind::Scalepad));
    }

    if !args.input.is_empty() || args.input_dir.is_some() {
        let classifier =
            DatasetClassifier::new(&cfg.ingest.rmm_patterns, &cfg.ingest.scalepad_patterns)
                .map_err(crate::exit::invalid_args_err)?;
        for p in &args.input {
            let kind = classifier
                .classify_or_err(p)
                .map_err(crate::exit::invalid_args_err)?;
            paths.push((p.clone(), kind));
        }
        if let Some(dir) = &args.input_dir {
            let found = crate::ingest::discover(dir, &classifier)
                .map_err(crate::exit::input_failed_err)?;
            paths.extend(found);
        }
    }

    for kind in [DatasetKind::Rmm, DatasetKind::Scalepad] {
        let given: Vec<String> = paths
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(p, _)| p.display().to_string())
            .collect();
        if given.len() > 1 {
            return Err(crate::exit::invalid_args(format!(
                "only one {kind} file may be given (got: {})",
                given.join(", ")
            )));
        }
    }

    Ok(paths)
}

fn save_report(store: &FileReportStore, fallback_path: &Path, response: &ProcessResponse) {
    let snapshot = match crate::engine::snapshot(response, time::OffsetDateTime::now_utc()) {
        Ok(s) => s,
        Err(err) => {
            log::warn!("report not saved: {err:#}");
            return;
        }
    };
    let id = snapshot.id.clone();
    let fallback = FileReportStore::new(fallback_path);
    match crate::store::save_with_fallback(store, &fallback, snapshot) {
        SaveOutcome::Primary => log::info!("saved report {id} to {}", store.path().display()),
        SaveOutcome::Fallback => {
            log::info!("saved report {id} to {}", fallback.path().display())
        }
        SaveOutcome::Lost => {}
    }
}

fn find_report(store: &FileReportStore, id: &str) -> Result<StoredReport> {
    store
        .get(id)
        .map_err(crate::exit::store_failed_err)?
        .ok_or_else(|| crate::exit::invalid_args(format!("report not found: {id}")))
}

fn write_csv_file(path: &Path, response: &ProcessResponse) -> Result<()> {
    let csv = crate::export::encode_csv(&response.data)?;
    write_file(path, &csv)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut buf = serde_json::to_vec_pretty(value)?;
    buf.push(b'\n');
    write_stdout_bytes(&buf)
}

fn write_stdout(s: &str) -> Result<()> {
    write_stdout_bytes(s.as_bytes())
}

fn write_stdout_bytes(buf: &[u8]) -> Result<()> {
    use std::io::Write;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(buf).and_then(|()| stdout.flush()) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        "powershell" => Ok(clap_complete::Shell::PowerShell),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (expected bash|zsh|fish|powershell)"
        ))),
    }
}
