//! Test driver for the optflag demo binaries.
//!
//! Spawns a demo with:
//! - stdin: null
//! - stdout, stderr: pipes, drained by background threads and captured
//!   for assertions

use std::io::Read;
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

/// A running demo process.
pub struct DemoRun {
    child: Child,
    /// Captured stdout, populated by background thread.
    stdout_capture: Arc<Mutex<Vec<u8>>>,
    /// Captured stderr, populated by background thread.
    stderr_capture: Arc<Mutex<Vec<u8>>>,
    stdout_thread: thread::JoinHandle<()>,
    stderr_thread: thread::JoinHandle<()>,
}

enum Pipe {
    Out(ChildStdout),
    Err(ChildStderr),
}

impl Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Pipe::Out(p) => p.read(buf),
            Pipe::Err(p) => p.read(buf),
        }
    }
}

fn drain(mut pipe: Pipe, capture: Arc<Mutex<Vec<u8>>>, label: &'static str) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    capture.lock().unwrap().extend_from_slice(&buf[..n]);
                }
                Err(e) => {
                    eprintln!("{label} drain error: {e}");
                    break;
                }
            }
        }
    })
}

impl DemoRun {
    /// Spawn `binary` with the given arguments.
    ///
    /// `env` are additional environment variables to set. `RUST_LOG` is
    /// cleared unless given here, so log lines never leak into captured
    /// stderr.
    pub fn spawn(binary: &str, args: &[&str], env: &[(&str, &str)]) -> std::io::Result<DemoRun> {
        let mut cmd = Command::new(binary);
        cmd.args(args);
        cmd.env_remove("RUST_LOG");
        for (k, v) in env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let stdout_capture = Arc::new(Mutex::new(Vec::new()));
        let stdout_thread = drain(
            Pipe::Out(child.stdout.take().unwrap()),
            Arc::clone(&stdout_capture),
            "stdout",
        );
        let stderr_capture = Arc::new(Mutex::new(Vec::new()));
        let stderr_thread = drain(
            Pipe::Err(child.stderr.take().unwrap()),
            Arc::clone(&stderr_capture),
            "stderr",
        );

        Ok(DemoRun {
            child,
            stdout_capture,
            stderr_capture,
            stdout_thread,
            stderr_thread,
        })
    }

    /// Wait for the child to exit and assert the exit code.
    pub fn wait_exit(mut self, expected_code: i32) -> RunOutput {
        let status = self.child.wait().expect("failed to wait for child");
        let code = status.code().unwrap_or(-1);

        // The drain threads finish once the child's pipes close.
        let _ = self.stdout_thread.join();
        let _ = self.stderr_thread.join();

        let stdout = String::from_utf8_lossy(&self.stdout_capture.lock().unwrap()).to_string();
        let stderr = String::from_utf8_lossy(&self.stderr_capture.lock().unwrap()).to_string();

        assert_eq!(
            code, expected_code,
            "expected exit code {expected_code}, got {code}\nstdout:\n{stdout}\nstderr:\n{stderr}"
        );

        RunOutput { stdout, stderr }
    }
}

/// Output captured from a finished run.
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Spawn `binary`, wait for it, and assert the exit code.
pub fn run(binary: &str, args: &[&str], expected_code: i32) -> RunOutput {
    DemoRun::spawn(binary, args, &[])
        .unwrap_or_else(|e| panic!("failed to spawn {binary}: {e}"))
        .wait_exit(expected_code)
}

/// Install the demo binaries' log subscriber: stderr, filtered by
/// `RUST_LOG`, silent when unset.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .init();
}
