//! Request/response boundary for executing QASM programs
//!
//! A request carries program text (or its lines) and an optional shot count.
//! The program is compiled once and the batch runs on a worker thread under
//! the configured wall-clock bound. When the bound expires the worker's cancel
//! flag is raised and the caller gets an `ERR_CANNOT_EXECUTE` response at once;
//! the worker stops at its next instruction.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ExecutionConfig;
use crate::qasm::{compile, compile_lines, Program, QasmError};
use crate::simulators::{ShotRunner, ShotSummary};

/// Program text, either whole or pre-split into lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgramSource {
    Text(String),
    Lines(Vec<String>),
}

impl ProgramSource {
    pub fn compile(&self) -> Result<Program, QasmError> {
        match self {
            ProgramSource::Text(text) => compile(text),
            ProgramSource::Lines(lines) => compile_lines(lines),
        }
    }
}

impl From<&str> for ProgramSource {
    fn from(text: &str) -> Self {
        ProgramSource::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub instructions: ProgramSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<usize>,
}

impl ExecuteRequest {
    pub fn new(instructions: impl Into<ProgramSource>) -> Self {
        ExecuteRequest {
            instructions: instructions.into(),
            shots: None,
        }
    }

    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = Some(shots);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "ERR_CANNOT_COMPILE")]
    CannotCompile,
    #[serde(rename = "ERR_CANNOT_EXECUTE")]
    CannotExecute,
    #[serde(rename = "ERR_INVALID_REQUEST")]
    InvalidRequest,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::CannotCompile => "ERR_CANNOT_COMPILE",
            ErrorCode::CannotExecute => "ERR_CANNOT_EXECUTE",
            ErrorCode::InvalidRequest => "ERR_INVALID_REQUEST",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Exactly one of `error` and `content` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub error: Option<ErrorBody>,
    pub content: Option<Vec<f64>>,
}

impl ExecuteResponse {
    pub fn success(content: Vec<f64>) -> Self {
        ExecuteResponse {
            error: None,
            content: Some(content),
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        ExecuteResponse {
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
            content: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Executes requests with a base configuration
#[derive(Debug, Clone, Default)]
pub struct Service {
    config: ExecutionConfig,
}

impl Service {
    pub fn new(config: ExecutionConfig) -> Self {
        Service { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn handle(&self, request: &ExecuteRequest) -> ExecuteResponse {
        let mut config = self.config.clone();
        if let Some(shots) = request.shots {
            config.shots = shots;
        }
        if let Err(err) = config.validate() {
            return ExecuteResponse::failure(ErrorCode::InvalidRequest, err.to_string());
        }

        let program = match request.instructions.compile() {
            Ok(program) => program,
            Err(err) => return ExecuteResponse::failure(ErrorCode::CannotCompile, err.to_string()),
        };

        match run_bounded(program, config) {
            Ok(summary) => ExecuteResponse::success(summary.compact()),
            Err(err) => ExecuteResponse::failure(ErrorCode::CannotExecute, err.to_string()),
        }
    }
}

/// Run the shot batch on a worker thread, giving up after the configured bound
fn run_bounded(program: Program, config: ExecutionConfig) -> Result<ShotSummary, QasmError> {
    let timeout = config.timeout();
    let cancel = Arc::new(AtomicBool::new(false));
    let runner = ShotRunner::new(config).with_cancel_flag(Arc::clone(&cancel));
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        // The receiver is gone once the caller has timed out
        let _ = sender.send(runner.run(&program));
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            warn!(?timeout, "qasm execution timed out, cancelling worker");
            Err(QasmError::Timeout(timeout))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            debug!("qasm worker exited without a result");
            Err(QasmError::Cancelled(0))
        }
    }
}

/// Handle one request with the default configuration
pub fn execute_request(request: &ExecuteRequest) -> ExecuteResponse {
    Service::default().handle(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_success_drops_non_integer_cells() {
        let request = ExecuteRequest::new("alloc 4\nalloc 1Q(0)\nalloc 1b(2)\nadd 3, 2b").with_shots(2);
        let response = execute_request(&request);
        assert_eq!(response, ExecuteResponse::success(vec![3.0]));
    }

    #[test]
    fn test_error_codes() {
        let compile = execute_request(&ExecuteRequest::new("BOGUS"));
        assert_eq!(compile.error.map(|e| e.code), Some(ErrorCode::CannotCompile));

        let execute = execute_request(&ExecuteRequest::new("jmp .nowhere"));
        assert_eq!(execute.error.map(|e| e.code), Some(ErrorCode::CannotExecute));

        let invalid = execute_request(&ExecuteRequest::new("alloc 1").with_shots(0));
        assert_eq!(invalid.error.map(|e| e.code), Some(ErrorCode::InvalidRequest));
    }

    #[test]
    fn test_timeout_cancels_worker() {
        let service = Service::new(ExecutionConfig::default().with_timeout(Duration::from_millis(50)));
        let response = service.handle(&ExecuteRequest::new(".l:\njmp .l"));
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::CannotExecute);
        assert_eq!(error.message, "Execution took more than 50ms");
        assert!(response.content.is_none());
    }
}
