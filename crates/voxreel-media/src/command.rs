//! Command descriptors for external tools.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// A pure description of a subprocess invocation.
///
/// Builders in this crate only produce descriptors; running one is the job of
/// [`CommandRunner`](crate::runner::CommandRunner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Binary name or path
    binary: String,
    /// Argument vector, in order
    args: Vec<String>,
    /// Files the command reads
    inputs: Vec<PathBuf>,
    /// Files or directories the command writes
    outputs: Vec<PathBuf>,
}

impl CommandDescriptor {
    /// Create a descriptor for `binary` with no arguments.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Declare a file the command reads.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Declare several files the command reads.
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.inputs
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Declare a file or directory the command writes.
    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.outputs.push(path.as_ref().to_path_buf());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn declared_inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn declared_outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Full command line, for logs and error reports.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            return self.binary.clone();
        }
        format!("{} {}", self.binary, self.args.join(" "))
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Locate a tool on PATH.
pub fn check_tool(name: &str) -> MediaResult<PathBuf> {
    which::which(name).map_err(|_| MediaError::ToolNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let cmd = CommandDescriptor::new("ffmpeg")
            .arg("-y")
            .args(["-i", "in.mp4"])
            .path_arg("/tmp/out.mp4")
            .input("in.mp4")
            .output("/tmp/out.mp4");

        assert_eq!(cmd.binary(), "ffmpeg");
        assert_eq!(cmd.arguments(), ["-y", "-i", "in.mp4", "/tmp/out.mp4"]);
        assert_eq!(cmd.declared_inputs(), [PathBuf::from("in.mp4")]);
        assert_eq!(cmd.declared_outputs(), [PathBuf::from("/tmp/out.mp4")]);
        assert_eq!(cmd.to_string(), "ffmpeg -y -i in.mp4 /tmp/out.mp4");
    }

    #[test]
    fn test_command_line_without_args() {
        assert_eq!(CommandDescriptor::new("ffprobe").command_line(), "ffprobe");
    }

    #[test]
    fn test_check_tool_missing() {
        let err = check_tool("voxreel-definitely-not-installed").unwrap_err();
        assert!(matches!(err, MediaError::ToolNotFound(_)));
    }
}
