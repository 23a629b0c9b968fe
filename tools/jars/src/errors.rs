use thiserror::Error;

#[derive(Debug, Error)]
pub enum JarsError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("process error: {0}")]
    Process(String),
    #[error("report parse error: {0}")]
    ReportParse(String),
    #[error("rule table error: {0}")]
    RuleTable(String),
    #[error("correction error: {0}")]
    Correction(String),
    #[error("strict mode refused generation: {0} validation issue(s)")]
    StrictValidation(usize),
}
