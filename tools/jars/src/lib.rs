pub mod assembler;
pub mod collector;
pub mod comment_mapping;
pub mod compliance;
pub mod config;
pub mod correction;
pub mod errors;
pub mod formatter;
pub mod generator;
pub mod grade_record;
pub mod log_retention;
pub mod logging;
pub mod manifest;
pub mod probe;
pub mod report;
pub mod report_loader;
pub mod runtime;
pub mod types;
pub mod validator;

use clap::{error::ErrorKind, CommandFactory, Parser};
use compliance::ComplianceRules;
use config::{load_config, AppConfig, CliOverrides};
use correction::with_corrector;
use errors::JarsError;
use generator::{generate_all, GenerationOptions};
use logging::{init_run_log, structured_fallback_line, JsonlLogger};
use manifest::Manifest;
use probe::run_probe;
use report_loader::load_report_str;
use runtime::{FileSystem, ProductionRuntime};
use serde::Serialize;
use std::path::Path;
use validator::validate;

/// Exit code for `--validate-only` when the report has issues.
pub const EXIT_INVALID_REPORT: i32 = 2;

#[derive(Debug, Clone, Parser)]
#[command(name = "jars")]
#[command(about = "Generate report-card comments from a grader report")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
    #[arg(long)]
    pub report: Option<std::path::PathBuf>,
    #[arg(long)]
    pub rules: Option<std::path::PathBuf>,
    #[arg(long)]
    pub output: Option<std::path::PathBuf>,
    #[arg(long, default_value_t = false)]
    pub strict: bool,
    #[arg(long, default_value_t = false)]
    pub autocorrect: bool,
    #[arg(long, default_value_t = false)]
    pub validate_only: bool,
    #[arg(long, default_value_t = false)]
    pub probe_only: bool,
    #[arg(long, default_value_t = false)]
    pub sequential: bool,
}

pub fn run() -> Result<i32, JarsError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| JarsError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    cwd: &Path,
    runtime: &ProductionRuntime,
) -> Result<i32, JarsError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(JarsError::Cli(error.to_string())),
        },
    };
    if cli.validate_only && cli.probe_only {
        return Err(JarsError::Cli(
            "--validate-only and --probe-only cannot be combined".to_string(),
        ));
    }

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        report_path: cli.report.clone(),
        rules_path: cli.rules.clone(),
        output_path: cli.output.clone(),
        strict: cli.strict,
        autocorrect: cli.autocorrect,
        sequential: cli.sequential,
    };
    let cfg = load_config(&overrides, cwd, runtime.file_system.as_ref())?;
    init_run_log(JsonlLogger {
        path: cfg.logging.path.clone(),
        max_payload_bytes: cfg.logging.max_payload_bytes,
        budget_bytes: cfg.logging.budget_bytes,
    });

    let fs = runtime.file_system.as_ref();
    let report_text = fs.read_to_string(&cfg.report.path)?;
    let report = load_report_str(&report_text)?;
    let options = GenerationOptions {
        stripping: cfg.assembly.also_stripping,
        name_placeholder: cfg.generation.name_placeholder.clone(),
        parallel: cfg.generation.parallel,
    };

    if cli.probe_only {
        let rows = with_corrector(runtime.process_runner.as_ref(), &cfg.correction, |corrector| {
            run_probe(&report.comment_mapping, &cfg.probe, &options, corrector)
        })??;
        write_json(fs, &cfg.output.path, &rows)?;
        emit_summary(
            runtime,
            "probe",
            &format!("rows={} output={}", rows.len(), cfg.output.path.display()),
        )?;
        return Ok(0);
    }

    let rules = ComplianceRules::from_json_str(&fs.read_to_string(&cfg.report.rules_path)?)?;
    let validation = validate(&report, &rules, cfg.report.expected_version.as_deref());
    for warning in &validation.warnings {
        runtime.terminal.write_line(&warning.to_string())?;
    }
    runtime
        .terminal
        .write_line(&format!("Validation Pass: {}", validation.valid))?;
    if !validation.valid {
        runtime.terminal.write_line(&format!("Warnings: {}", validation.issue_count()))?;
    }

    if cli.validate_only {
        return Ok(if validation.valid { 0 } else { EXIT_INVALID_REPORT });
    }
    if cfg.generation.strict && !validation.valid {
        return Err(JarsError::StrictValidation(validation.issue_count()));
    }

    let comments = with_corrector(runtime.process_runner.as_ref(), &cfg.correction, |corrector| {
        generate_all(&report, &options, corrector)
    })?;
    write_json(fs, &cfg.output.path, &comments)?;
    Manifest::build(&report_text, &comments, runtime.clock.as_ref())
        .write(&cfg.output.manifest_path, fs)?;

    let failed = comments
        .iter()
        .filter(|c| c.correction_error.is_some())
        .count();
    emit_summary(
        runtime,
        "generation",
        &format!(
            "students={} correction_failures={failed} output={} manifest={}",
            comments.len(),
            cfg.output.path.display(),
            cfg.output.manifest_path.display()
        ),
    )?;
    Ok(0)
}

fn write_json<T: Serialize + ?Sized>(
    fs: &dyn FileSystem,
    path: &Path,
    value: &T,
) -> Result<(), JarsError> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(value).map_err(|e| JarsError::Io(e.to_string()))?;
    fs.write_string(path, &text)
}

fn emit_summary(runtime: &ProductionRuntime, scope: &str, detail: &str) -> Result<(), JarsError> {
    if runtime.terminal.stdin_is_tty() {
        runtime
            .terminal
            .write_line(&format!("{scope} complete: {detail}"))
    } else {
        runtime
            .terminal
            .write_line(&structured_fallback_line(scope, "complete", detail))
    }
}

pub fn default_config_toml() -> Result<String, JarsError> {
    toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| JarsError::ConfigParse(e.to_string()))
}

pub fn render_help() -> String {
    Cli::command().render_long_help().to_string()
}
