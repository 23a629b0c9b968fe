use crate::config::CorrectionConfig;
use crate::errors::JarsError;
use crate::logging::append_run_log;
use crate::runtime::{ProcessRequest, ProcessRunner};
use serde_json::json;

/// Grammar or style correction applied to an assembled comment.
pub trait GrammarCorrector: Send + Sync {
    fn correct(&self, text: &str) -> Result<String, JarsError>;
}

/// Runs an external correction program: the text is passed as the last
/// argument and the corrected text is read from stdout.
pub struct CommandCorrector<'a> {
    runner: &'a dyn ProcessRunner,
    program: String,
    args: Vec<String>,
}

impl<'a> CommandCorrector<'a> {
    pub fn acquire(runner: &'a dyn ProcessRunner, cfg: &CorrectionConfig) -> Result<Self, JarsError> {
        let program = cfg
            .command
            .as_deref()
            .map(str::trim)
            .filter(|command| !command.is_empty())
            .ok_or_else(|| {
                JarsError::InvalidConfig("correction.command is required".to_string())
            })?;
        append_run_log(
            "info",
            "correction.session.acquired",
            json!({ "program": program, "args": cfg.args }),
        );
        Ok(Self {
            runner,
            program: program.to_string(),
            args: cfg.args.clone(),
        })
    }

    pub fn release(self) {
        append_run_log(
            "info",
            "correction.session.released",
            json!({ "program": self.program }),
        );
    }
}

impl GrammarCorrector for CommandCorrector<'_> {
    fn correct(&self, text: &str) -> Result<String, JarsError> {
        let mut args = self.args.clone();
        args.push(text.to_string());
        let output = self.runner.run(ProcessRequest {
            program: self.program.clone(),
            args,
        })?;
        if output.exit_code != 0 {
            return Err(JarsError::Correction(format!(
                "{} exited with {}: {}",
                self.program,
                output.exit_code,
                output.stderr.trim()
            )));
        }
        let corrected = output.stdout.trim();
        if corrected.is_empty() {
            return Err(JarsError::Correction(format!(
                "{} returned no text",
                self.program
            )));
        }
        Ok(corrected.to_string())
    }
}

/// Runs `f` with a correction session held for its duration. When correction
/// is disabled `f` receives `None`.
pub fn with_corrector<R>(
    runner: &dyn ProcessRunner,
    cfg: &CorrectionConfig,
    f: impl FnOnce(Option<&dyn GrammarCorrector>) -> R,
) -> Result<R, JarsError> {
    if !cfg.enabled {
        return Ok(f(None));
    }
    let session = CommandCorrector::acquire(runner, cfg)?;
    let result = f(Some(&session));
    session.release();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{with_corrector, CommandCorrector, GrammarCorrector};
    use crate::config::CorrectionConfig;
    use crate::runtime::{FakeProcessRunner, ProcessOutput};

    fn enabled() -> CorrectionConfig {
        CorrectionConfig {
            enabled: true,
            command: Some("grammar-fix".to_string()),
            args: vec!["--lang".to_string(), "en-GB".to_string()],
        }
    }

    #[test]
    fn command_receives_text_as_last_argument() {
        let runner = FakeProcessRunner::default();
        runner.push_response(Ok(ProcessOutput {
            exit_code: 0,
            stdout: "She reads well.\n".to_string(),
            stderr: String::new(),
        }));
        let corrector = CommandCorrector::acquire(&runner, &enabled()).expect("acquire");
        assert_eq!(corrector.correct("She read well.").expect("corrected"), "She reads well.");
        corrector.release();

        let requests = runner.requests();
        assert_eq!(requests[0].program, "grammar-fix");
        assert_eq!(requests[0].args, vec!["--lang", "en-GB", "She read well."]);
    }

    #[test]
    fn nonzero_exit_and_empty_output_are_errors() {
        let runner = FakeProcessRunner::default();
        runner.push_response(Ok(ProcessOutput {
            exit_code: 3,
            stdout: String::new(),
            stderr: "java missing".to_string(),
        }));
        runner.push_response(Ok(ProcessOutput {
            exit_code: 0,
            stdout: "  ".to_string(),
            stderr: String::new(),
        }));
        let corrector = CommandCorrector::acquire(&runner, &enabled()).expect("acquire");
        let first = corrector.correct("text").expect_err("exit 3");
        assert!(first.to_string().contains("java missing"));
        assert!(corrector.correct("text").is_err());
    }

    #[test]
    fn disabled_correction_passes_none() {
        let runner = FakeProcessRunner::default();
        let got = with_corrector(&runner, &CorrectionConfig::default(), |c| c.is_none())
            .expect("scoped");
        assert!(got);
        assert!(runner.requests().is_empty());
    }

    #[test]
    fn enabled_without_command_fails_to_acquire() {
        let runner = FakeProcessRunner::default();
        let cfg = CorrectionConfig {
            enabled: true,
            command: None,
            args: Vec::new(),
        };
        assert!(with_corrector(&runner, &cfg, |_| ()).is_err());
    }
}
