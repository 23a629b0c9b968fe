use crate::errors::JarsError;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Runs one external command to completion. Stdin is closed.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, request: ProcessRequest) -> Result<ProcessOutput, JarsError>;
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, JarsError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), JarsError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), JarsError>;
    fn exists(&self, path: &Path) -> bool;
}

pub trait Terminal: Send + Sync {
    fn stdin_is_tty(&self) -> bool;
    fn write_line(&self, line: &str) -> Result<(), JarsError>;
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, JarsError> {
    mutex
        .lock()
        .map_err(|_| JarsError::Process(format!("{what} lock poisoned")))
}

pub struct ProductionClock;

impl Clock for ProductionClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, JarsError> {
        std::fs::read_to_string(path)
            .map_err(|e| JarsError::Io(format!("{}: {e}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), JarsError> {
        std::fs::write(path, contents).map_err(|e| JarsError::Io(format!("{}: {e}", path.display())))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), JarsError> {
        std::fs::create_dir_all(path).map_err(|e| JarsError::Io(e.to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub struct ProductionProcessRunner;

impl ProcessRunner for ProductionProcessRunner {
    fn run(&self, request: ProcessRequest) -> Result<ProcessOutput, JarsError> {
        let output = std::process::Command::new(&request.program)
            .args(&request.args)
            .stdin(std::process::Stdio::null())
            .output()
            .map_err(|e| JarsError::Process(format!("{}: {e}", request.program)))?;
        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn stdin_is_tty(&self) -> bool {
        std::io::IsTerminal::is_terminal(&std::io::stdin())
    }

    fn write_line(&self, line: &str) -> Result<(), JarsError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| JarsError::Io(e.to_string()))
    }
}

pub struct ProductionRuntime {
    pub clock: Arc<dyn Clock>,
    pub file_system: Arc<dyn FileSystem>,
    pub process_runner: Arc<dyn ProcessRunner>,
    pub terminal: Arc<dyn Terminal>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(ProductionClock),
            file_system: Arc::new(ProductionFileSystem),
            process_runner: Arc::new(ProductionProcessRunner),
            terminal: Arc::new(ProductionTerminal),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct FakeClock {
    now: SystemTime,
}

impl FakeClock {
    pub fn new(now: SystemTime) -> Self {
        Self { now }
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        self.now
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_next: Arc<Mutex<Option<JarsError>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        if let Ok(mut files) = fs.files.lock() {
            files.insert(path.into(), contents.into());
        }
        fs
    }

    pub fn set_fail_next(&self, error: JarsError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(error);
        }
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().ok()?.get(path.as_ref()).cloned()
    }

    fn maybe_fail(&self) -> Result<(), JarsError> {
        if let Some(err) = lock(&self.fail_next, "fail")?.take() {
            return Err(err);
        }
        Ok(())
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, JarsError> {
        self.maybe_fail()?;
        lock(&self.files, "files")?
            .get(path)
            .cloned()
            .ok_or_else(|| JarsError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), JarsError> {
        self.maybe_fail()?;
        lock(&self.files, "files")?.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), JarsError> {
        self.maybe_fail()?;
        lock(&self.dirs, "dirs")?.push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    pub is_tty: bool,
    writes: Arc<Mutex<Vec<String>>>,
}

impl FakeTerminal {
    pub fn new(is_tty: bool) -> Self {
        Self {
            is_tty,
            ..Self::default()
        }
    }

    pub fn written_lines(&self) -> Vec<String> {
        self.writes
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl Terminal for FakeTerminal {
    fn stdin_is_tty(&self) -> bool {
        self.is_tty
    }

    fn write_line(&self, line: &str) -> Result<(), JarsError> {
        lock(&self.writes, "writes")?.push(line.to_string());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct FakeProcessRunner {
    responses: Arc<Mutex<VecDeque<Result<ProcessOutput, JarsError>>>>,
    requests: Arc<Mutex<Vec<ProcessRequest>>>,
}

impl FakeProcessRunner {
    pub fn push_response(&self, output: Result<ProcessOutput, JarsError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(output);
        }
    }

    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl ProcessRunner for FakeProcessRunner {
    fn run(&self, request: ProcessRequest) -> Result<ProcessOutput, JarsError> {
        lock(&self.requests, "requests")?.push(request);
        lock(&self.responses, "responses")?
            .pop_front()
            .unwrap_or_else(|| Err(JarsError::Process("no fake response queued".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FakeFileSystem, FakeProcessRunner, FakeTerminal, FileSystem, ProcessOutput,
        ProcessRequest, ProcessRunner, Terminal,
    };
    use crate::errors::JarsError;
    use std::path::Path;

    #[test]
    fn fake_file_system_round_trips_and_fails_on_demand() {
        let fs = FakeFileSystem::with_file("/report.json", "{}");
        assert_eq!(fs.read_to_string(Path::new("/report.json")).expect("read"), "{}");
        fs.write_string(Path::new("/out.json"), "[]").expect("write");
        assert!(fs.exists(Path::new("/out.json")));

        fs.set_fail_next(JarsError::Io("disk full".to_string()));
        assert!(fs.read_to_string(Path::new("/report.json")).is_err());
        assert!(fs.read_to_string(Path::new("/report.json")).is_ok());
        assert!(fs.read_to_string(Path::new("/missing.json")).is_err());
    }

    #[test]
    fn fake_process_runner_replays_queued_responses_in_order() {
        let runner = FakeProcessRunner::default();
        runner.push_response(Ok(ProcessOutput {
            exit_code: 0,
            stdout: "first".to_string(),
            stderr: String::new(),
        }));
        let request = ProcessRequest {
            program: "grammar".to_string(),
            args: vec!["text".to_string()],
        };
        assert_eq!(runner.run(request.clone()).expect("first").stdout, "first");
        assert!(runner.run(request).is_err());
        assert_eq!(runner.requests().len(), 2);
    }

    #[test]
    fn fake_terminal_records_lines() {
        let terminal = FakeTerminal::new(false);
        terminal.write_line("Validation Pass: true").expect("write");
        assert!(!terminal.stdin_is_tty());
        assert_eq!(terminal.written_lines(), vec!["Validation Pass: true"]);
    }
}
