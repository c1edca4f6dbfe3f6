//! Execution service client
//!
//! An [`ExecutionBackend`] turns program source into a [`Trace`]. The
//! visualizer never runs programs itself; hosts that can re-run code (the
//! interactive app's `r` key) hold a backend and a [`BackendRequest`].
//!
//! [`CommandBackend`] runs an external tracer program:
//!
//! - source on stdin
//! - [`BackendOptions`] as JSON in `TRACEVIS_BACKEND_OPTIONS`
//! - raw inputs, newline-joined, in `TRACEVIS_RAW_INPUT`
//! - the trace payload read back from stdout
//!
//! Any failure to produce a payload is reported as
//! [`VisualizerError::BackendUnavailable`].

use crate::config::{Lang, Options};
use crate::errors::{Result, VisualizerError};
use crate::snapshot::Trace;
use serde::Serialize;
use serde_json::Value as Json;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const OPTIONS_ENV: &str = "TRACEVIS_BACKEND_OPTIONS";
pub const RAW_INPUT_ENV: &str = "TRACEVIS_RAW_INPUT";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Options forwarded to the tracer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendOptions {
    pub lang: Lang,
    pub show_only_outputs: bool,
    pub cumulative_mode: bool,
    pub heap_primitives: bool,
}

impl From<&Options> for BackendOptions {
    fn from(options: &Options) -> Self {
        BackendOptions {
            lang: options.lang,
            show_only_outputs: options.show_only_outputs,
            cumulative_mode: options.cumulative_mode,
            heap_primitives: options.heap_primitives,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub source: String,
    /// Lines fed to the program's input calls
    pub raw_inputs: Vec<String>,
    pub options: BackendOptions,
}

impl BackendRequest {
    pub fn new(source: impl Into<String>, options: &Options) -> Self {
        BackendRequest {
            source: source.into(),
            raw_inputs: Vec::new(),
            options: BackendOptions::from(options),
        }
    }

    pub fn with_raw_inputs(mut self, raw_inputs: Vec<String>) -> Self {
        self.raw_inputs = raw_inputs;
        self
    }
}

pub trait ExecutionBackend {
    fn execute(&self, request: &BackendRequest) -> Result<Trace>;
}

/// Tracer run as a child process
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>) -> Self {
        CommandBackend {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Build from a command line such as `["python3", "tracer.py"]`
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| VisualizerError::backend("no tracer command given"))?;
        Ok(CommandBackend {
            program: program.clone(),
            args: args.to_vec(),
            timeout: None,
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn spawn(&self, request: &BackendRequest) -> Result<Child> {
        let options = serde_json::to_string(&request.options)
            .map_err(|e| VisualizerError::backend(format!("cannot encode options: {}", e)))?;

        Command::new(&self.program)
            .args(&self.args)
            .env(OPTIONS_ENV, options)
            .env(RAW_INPUT_ENV, request.raw_inputs.join("\n"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VisualizerError::backend(format!("cannot start `{}`: {}", self.program, e)))
    }

    /// Wait for the child, killing it once the timeout passes
    fn wait(&self, child: &mut Child) -> Result<std::process::ExitStatus> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => return Err(VisualizerError::backend(format!("wait failed: {}", e))),
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    // Reaping after kill; errors here leave nothing to clean up
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(VisualizerError::backend(format!(
                        "`{}` timed out after {:.1}s",
                        self.program,
                        timeout.as_secs_f64()
                    )));
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut bytes) {
            debug!(error = %e, "tracer pipe closed early");
        }
        bytes
    })
}

fn feed(mut pipe: impl Write + Send + 'static, source: String) {
    thread::spawn(move || {
        if let Err(e) = pipe.write_all(source.as_bytes()) {
            // The tracer may exit without reading everything
            debug!(error = %e, "tracer closed stdin");
        }
    });
}

impl ExecutionBackend for CommandBackend {
    fn execute(&self, request: &BackendRequest) -> Result<Trace> {
        info!(program = %self.program, lang = ?request.options.lang, "running tracer");
        let mut child = self.spawn(request)?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        // Detached: the writer ends once the child exits or is killed
        if let Some(pipe) = child.stdin.take() {
            feed(pipe, request.source.clone());
        }

        let status = self.wait(&mut child)?;
        let stdout = stdout
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            let detail = String::from_utf8_lossy(&stderr);
            return Err(VisualizerError::backend(format!(
                "`{}` exited with {}: {}",
                self.program,
                status,
                detail.trim()
            )));
        }

        let payload: Json = serde_json::from_slice(&stdout)
            .map_err(|e| VisualizerError::backend(format!("tracer output is not JSON: {}", e)))?;

        if let Some(error) = payload.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            warn!(%message, "tracer reported an error");
            return Err(VisualizerError::backend(message));
        }

        Trace::load(payload)
    }
}
