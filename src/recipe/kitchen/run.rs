// src/recipe/kitchen/run.rs

//! Blocking subprocess execution with an optional timeout

use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (None if killed by a signal)
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Exit code rendered for error messages
    pub fn code_display(&self) -> String {
        match self.code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}

/// Run a command to completion, capturing stdout and stderr
///
/// Stdin is nulled. With a timeout the child is killed once it expires and
/// an `ErrorKind::TimedOut` error is returned.
pub fn run_command(command: &mut Command, timeout: Option<Duration>) -> io::Result<CommandOutput> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let Some(timeout) = timeout else {
        let output = command.output()?;
        return Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    };

    let mut child = command.spawn()?;
    // Drain pipes while waiting so a chatty child cannot block on a full pipe
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    match child.wait_timeout(timeout)? {
        Some(status) => Ok(CommandOutput {
            code: status.code(),
            success: status.success(),
            stdout: join(stdout),
            stderr: join(stderr),
        }),
        None => {
            kill(&mut child);
            let _ = join(stdout);
            let _ = join(stderr);
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out after {} seconds", timeout.as_secs()),
            ))
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
