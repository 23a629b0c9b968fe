use crate::assembler::AlsoStripping;
use crate::errors::JarsError;
use crate::logging::DEFAULT_DISK_BUDGET_BYTES;
use crate::runtime::FileSystem;
use crate::types::Gender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub strict: bool,
    pub autocorrect: bool,
    pub sequential: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub report: ReportConfig,
    pub generation: GenerationConfig,
    pub assembly: AssemblyConfig,
    pub correction: CorrectionConfig,
    pub output: OutputConfig,
    pub probe: ProbeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    pub path: PathBuf,
    pub rules_path: PathBuf,
    pub expected_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    pub strict: bool,
    pub parallel: bool,
    pub name_placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssemblyConfig {
    pub also_stripping: AlsoStripping,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrectionConfig {
    pub enabled: bool,
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub manifest_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeConfig {
    pub short_name: String,
    pub gender: Gender,
    pub max_combinations: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            report: ReportConfig {
                path: PathBuf::from("grader-report.json"),
                rules_path: PathBuf::from("resources/sna_rules.json"),
                expected_version: Some("1.2".to_string()),
            },
            generation: GenerationConfig {
                strict: false,
                parallel: true,
                name_placeholder: "VDC".to_string(),
            },
            assembly: AssemblyConfig {
                also_stripping: AlsoStripping::WordBoundary,
            },
            correction: CorrectionConfig::default(),
            output: OutputConfig {
                path: PathBuf::from("comments.json"),
                manifest_path: PathBuf::from("manifest.json"),
            },
            probe: ProbeConfig {
                short_name: "Fu".to_string(),
                gender: Gender::F,
                max_combinations: 100_000,
            },
            logging: LoggingConfig {
                path: PathBuf::from(".cache/jars/run.jsonl"),
                max_payload_bytes: 4096,
                budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialAppConfig {
    report: Option<PartialReportConfig>,
    generation: Option<PartialGenerationConfig>,
    assembly: Option<PartialAssemblyConfig>,
    correction: Option<PartialCorrectionConfig>,
    output: Option<PartialOutputConfig>,
    probe: Option<PartialProbeConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialReportConfig {
    path: Option<PathBuf>,
    rules_path: Option<PathBuf>,
    expected_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialGenerationConfig {
    strict: Option<bool>,
    parallel: Option<bool>,
    name_placeholder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialAssemblyConfig {
    also_stripping: Option<AlsoStripping>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialCorrectionConfig {
    enabled: Option<bool>,
    command: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialOutputConfig {
    path: Option<PathBuf>,
    manifest_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialProbeConfig {
    short_name: Option<String>,
    gender: Option<Gender>,
    max_combinations: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
    budget_bytes: Option<u64>,
}

/// Defaults, then the TOML file, then CLI flags. Relative paths resolve
/// against `process_cwd`.
pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<AppConfig, JarsError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let path = absolutize_path(process_cwd, path);
        let file_contents = fs.read_to_string(&path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| JarsError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    absolutize_paths(&mut cfg, process_cwd);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(report) = partial.report {
        if let Some(value) = report.path {
            cfg.report.path = value;
        }
        if let Some(value) = report.rules_path {
            cfg.report.rules_path = value;
        }
        if let Some(value) = report.expected_version {
            cfg.report.expected_version = (!value.trim().is_empty()).then_some(value);
        }
    }

    if let Some(generation) = partial.generation {
        if let Some(value) = generation.strict {
            cfg.generation.strict = value;
        }
        if let Some(value) = generation.parallel {
            cfg.generation.parallel = value;
        }
        if let Some(value) = generation.name_placeholder {
            cfg.generation.name_placeholder = value;
        }
    }

    if let Some(assembly) = partial.assembly {
        if let Some(value) = assembly.also_stripping {
            cfg.assembly.also_stripping = value;
        }
    }

    if let Some(correction) = partial.correction {
        if let Some(value) = correction.enabled {
            cfg.correction.enabled = value;
        }
        if let Some(value) = correction.command {
            cfg.correction.command = Some(value);
        }
        if let Some(value) = correction.args {
            cfg.correction.args = value;
        }
    }

    if let Some(output) = partial.output {
        if let Some(value) = output.path {
            cfg.output.path = value;
        }
        if let Some(value) = output.manifest_path {
            cfg.output.manifest_path = value;
        }
    }

    if let Some(probe) = partial.probe {
        if let Some(value) = probe.short_name {
            cfg.probe.short_name = value;
        }
        if let Some(value) = probe.gender {
            cfg.probe.gender = value;
        }
        if let Some(value) = probe.max_combinations {
            cfg.probe.max_combinations = value;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(value) = logging.path {
            cfg.logging.path = value;
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
        if let Some(value) = logging.budget_bytes {
            cfg.logging.budget_bytes = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(path) = &overrides.report_path {
        cfg.report.path = path.clone();
    }
    if let Some(path) = &overrides.rules_path {
        cfg.report.rules_path = path.clone();
    }
    if let Some(path) = &overrides.output_path {
        cfg.output.path = path.clone();
    }
    if overrides.strict {
        cfg.generation.strict = true;
    }
    if overrides.autocorrect {
        cfg.correction.enabled = true;
    }
    if overrides.sequential {
        cfg.generation.parallel = false;
    }
}

fn absolutize_paths(cfg: &mut AppConfig, base: &Path) {
    for path in [
        &mut cfg.report.path,
        &mut cfg.report.rules_path,
        &mut cfg.output.path,
        &mut cfg.output.manifest_path,
        &mut cfg.logging.path,
    ] {
        if !path.as_os_str().is_empty() {
            *path = absolutize_path(base, path);
        }
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), JarsError> {
    let placeholder = &cfg.generation.name_placeholder;
    if placeholder.is_empty() {
        return Err(JarsError::InvalidConfig(
            "generation.name_placeholder must not be empty".to_string(),
        ));
    }
    if placeholder.contains(['{', '}']) || placeholder.chars().any(char::is_whitespace) {
        return Err(JarsError::InvalidConfig(format!(
            "generation.name_placeholder '{placeholder}' must be a single bare word"
        )));
    }
    // Sentence capitalization would otherwise change the placeholder before
    // the real name is swapped back in.
    if !placeholder.chars().next().is_some_and(char::is_uppercase) {
        return Err(JarsError::InvalidConfig(format!(
            "generation.name_placeholder '{placeholder}' must start with an uppercase letter"
        )));
    }
    let collides = [Gender::M, Gender::F]
        .iter()
        .flat_map(|g| [g.pronoun(), g.adjective()])
        .any(|word| word.eq_ignore_ascii_case(placeholder));
    if collides {
        return Err(JarsError::InvalidConfig(format!(
            "generation.name_placeholder '{placeholder}' collides with a pronoun"
        )));
    }

    if cfg.probe.max_combinations == 0 {
        return Err(JarsError::InvalidConfig(
            "probe.max_combinations must be greater than zero".to_string(),
        ));
    }

    if cfg.correction.enabled
        && cfg
            .correction
            .command
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    {
        return Err(JarsError::InvalidConfig(
            "correction.command is required when correction is enabled".to_string(),
        ));
    }

    if cfg.logging.path.as_os_str().is_empty() {
        return Err(JarsError::InvalidConfig(
            "logging.path must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_config, AppConfig, CliOverrides};
    use crate::assembler::AlsoStripping;
    use crate::runtime::FakeFileSystem;
    use crate::types::Gender;
    use std::path::{Path, PathBuf};

    fn with_config(text: &str) -> (FakeFileSystem, CliOverrides) {
        let fs = FakeFileSystem::with_file("/work/jars.toml", text);
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("jars.toml")),
            ..CliOverrides::default()
        };
        (fs, overrides)
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let cfg = load_config(&CliOverrides::default(), Path::new("/work"), &FakeFileSystem::default())
            .expect("defaults");
        let defaults = AppConfig::default();
        assert_eq!(cfg.generation, defaults.generation);
        assert_eq!(cfg.report.path, PathBuf::from("/work/grader-report.json"));
        assert_eq!(cfg.logging.path, PathBuf::from("/work/.cache/jars/run.jsonl"));
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let (fs, overrides) = with_config(
            r#"
[assembly]
also_stripping = "substring"

[probe]
gender = "M"
"#,
        );
        let cfg = load_config(&overrides, Path::new("/work"), &fs).expect("config");
        assert_eq!(cfg.assembly.also_stripping, AlsoStripping::Substring);
        assert_eq!(cfg.probe.gender, Gender::M);
        assert_eq!(cfg.probe.short_name, "Fu");
        assert!(cfg.generation.parallel);
    }

    #[test]
    fn cli_flags_win_over_file() {
        let (fs, mut overrides) = with_config(
            r#"
[generation]
strict = false
parallel = true

[correction]
command = "fixer"
"#,
        );
        overrides.strict = true;
        overrides.sequential = true;
        overrides.autocorrect = true;
        overrides.report_path = Some(PathBuf::from("/data/report.json"));
        let cfg = load_config(&overrides, Path::new("/work"), &fs).expect("config");
        assert!(cfg.generation.strict);
        assert!(!cfg.generation.parallel);
        assert!(cfg.correction.enabled);
        assert_eq!(cfg.report.path, PathBuf::from("/data/report.json"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "[generation]\nname_placeholder = \"\"",
            "[generation]\nname_placeholder = \"{name}\"",
            "[generation]\nname_placeholder = \"V D C\"",
            "[probe]\nmax_combinations = 0",
            "[correction]\nenabled = true",
            "[logging]\npath = \"\"",
        ] {
            let (fs, overrides) = with_config(text);
            assert!(
                load_config(&overrides, Path::new("/work"), &fs).is_err(),
                "{text}"
            );
        }
    }

    #[test]
    fn placeholder_must_survive_sentence_capitalization() {
        for placeholder in ["student", "vdc", "She", "HIS"] {
            let (fs, overrides) =
                with_config(&format!("[generation]\nname_placeholder = \"{placeholder}\""));
            let err = load_config(&overrides, Path::new("/work"), &fs).expect_err(placeholder);
            assert!(err.to_string().contains("name_placeholder"), "{err}");
        }
        let (fs, overrides) = with_config("[generation]\nname_placeholder = \"Pupil\"");
        let cfg = load_config(&overrides, Path::new("/work"), &fs).expect("config");
        assert_eq!(cfg.generation.name_placeholder, "Pupil");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let (fs, overrides) = with_config("[generation\nstrict = true");
        let err = load_config(&overrides, Path::new("/work"), &fs).expect_err("parse");
        assert!(err.to_string().starts_with("config parse error"));
    }
}
