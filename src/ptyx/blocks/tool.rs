//! External batch tools
//!
//! Checkers and formatters are separate programs: block text goes in through
//! stdin and results come back on stdout. [`ExternalTool`] is the seam; closures
//! implement it so tests never spawn a process.

use ptyx_config::ToolConfig;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use tracing::debug;

/// What a tool printed, and whether it exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

#[derive(Debug)]
pub enum ToolError {
    /// The program could not be started
    Spawn { program: String, source: io::Error },
    /// Feeding stdin or collecting output failed
    Io { program: String, source: io::Error },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Spawn { program, source } => {
                write!(f, "Failed to start `{}`: {}", program, source)
            }
            ToolError::Io { program, source } => {
                write!(f, "I/O error while running `{}`: {}", program, source)
            }
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Spawn { source, .. } | ToolError::Io { source, .. } => Some(source),
        }
    }
}

pub trait ExternalTool {
    /// Run the tool over `input`, waiting for it to exit.
    fn run(&self, input: &str) -> Result<ToolOutput, ToolError>;
}

impl<F> ExternalTool for F
where
    F: Fn(&str) -> Result<ToolOutput, ToolError>,
{
    fn run(&self, input: &str) -> Result<ToolOutput, ToolError> {
        self(input)
    }
}

/// A tool started as a child process for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTool {
    program: String,
    args: Vec<String>,
}

impl ProcessTool {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn io_error(&self, source: io::Error) -> ToolError {
        ToolError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl From<&ToolConfig> for ProcessTool {
    fn from(config: &ToolConfig) -> Self {
        Self::new(config.program.clone(), config.args.iter().cloned())
    }
}

impl ExternalTool for ProcessTool {
    fn run(&self, input: &str) -> Result<ToolOutput, ToolError> {
        debug!(program = %self.program, args = ?self.args, bytes = input.len(), "running external tool");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Write from another thread so a tool that answers before draining
        // stdin can't deadlock against us
        let stdin = child.stdin.take();
        let payload = input.to_string();
        let writer = std::thread::spawn(move || -> io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(payload.as_bytes())?;
            }
            Ok(())
        });

        let output = child.wait_with_output().map_err(|e| self.io_error(e))?;
        match writer.join() {
            Ok(Ok(())) => {}
            // A tool may exit without reading everything, its output still counts
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(self.io_error(e)),
            Err(_) => {
                return Err(self.io_error(io::Error::new(
                    io::ErrorKind::Other,
                    "stdin writer panicked",
                )))
            }
        }

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_tools() {
        let upper =
            |input: &str| -> Result<ToolOutput, ToolError> { Ok(ToolOutput::ok(input.to_uppercase())) };
        assert_eq!(upper.run("abc").unwrap().stdout, "ABC");
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let tool = ProcessTool::new("ptyx-no-such-program", Vec::<String>::new());
        let error = tool.run("").unwrap_err();
        assert!(matches!(error, ToolError::Spawn { .. }));
        assert!(error.to_string().contains("ptyx-no-such-program"));
    }

    #[cfg(unix)]
    #[test]
    fn pipes_stdin_to_stdout() {
        let tool = ProcessTool::new("cat", Vec::<String>::new());
        let output = tool.run("x = 1\n").unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "x = 1\n");
    }

    #[test]
    fn built_from_config() {
        let config = ToolConfig {
            program: "ruff".to_string(),
            args: vec!["format".to_string(), "-".to_string()],
        };
        assert_eq!(ProcessTool::from(&config), ProcessTool::new("ruff", ["format", "-"]));
    }
}
