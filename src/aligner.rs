//! External aligner invocation.
//!
//! The orchestrator only ever sees [`CommandRunner`]: run one command, get
//! back its exit code and captured output. [`SystemRunner`] spawns a real
//! process; tests substitute their own runner.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use crate::config::AlignerParams;

/// One aligner execution against a (chunk, reference database) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub chunk: usize,
    pub reference: PathBuf,
    /// Hit table the aligner is asked to write.
    pub result_path: PathBuf,
}

impl Invocation {
    /// Builds a `usearch -usearch_global` invocation with blast6 output.
    pub fn usearch_global(
        params: &AlignerParams,
        chunk: usize,
        query: &Path,
        reference: &Path,
        result_path: &Path,
    ) -> Self {
        let mut args: Vec<OsString> = Vec::with_capacity(22);
        let mut push = |flag: &str, value: OsString| {
            args.push(flag.into());
            args.push(value);
        };

        push("-usearch_global", query.into());
        push("-db", reference.into());
        push("-blast6out", result_path.into());
        push("-id", params.pct_id.to_string().into());
        push("-query_cov", params.query_coverage.to_string().into());
        push("-target_cov", params.target_coverage.to_string().into());
        push("-maxaccepts", params.max_accepts.to_string().into());
        push("-maxrejects", params.max_rejects.to_string().into());
        push("-strand", params.strand.as_str().into());
        push("-threads", params.threads.to_string().into());

        Self {
            program: params.program.clone(),
            args,
            chunk,
            reference: reference.to_path_buf(),
            result_path: result_path.to_path_buf(),
        }
    }

    /// Space-joined command line for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Exit status and captured streams of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    pub fn code_display(&self) -> String {
        self.code
            .map_or_else(|| "signal".to_string(), |code| code.to_string())
    }
}

/// Runs external commands to completion.
pub trait CommandRunner: Send + Sync {
    /// Runs `invocation` and waits for it; `Err` only if it could not be started.
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// Spawns real processes with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strand;

    #[test]
    fn usearch_arguments_are_forwarded() {
        let params = AlignerParams {
            strand: Strand::Plus,
            threads: 4,
            ..AlignerParams::default()
        };
        let inv = Invocation::usearch_global(
            &params,
            0,
            Path::new("chunk.fasta"),
            Path::new("ref.udb"),
            Path::new("out.b6"),
        );
        assert_eq!(
            inv.command_line(),
            "usearch -usearch_global chunk.fasta -db ref.udb -blast6out out.b6 -id 0.97 \
             -query_cov 1 -target_cov 0 -maxaccepts 2 -maxrejects 32 -strand plus -threads 4"
        );
    }

    #[test]
    fn output_success_requires_zero_code() {
        let ok = CommandOutput {
            code: Some(0),
            ..CommandOutput::default()
        };
        let failed = CommandOutput {
            code: Some(3),
            ..CommandOutput::default()
        };
        let killed = CommandOutput::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
        assert_eq!(killed.code_display(), "signal");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_streams() {
        let inv = Invocation {
            program: "sh".to_string(),
            args: vec!["-c".into(), "echo out; echo err >&2; exit 2".into()],
            chunk: 0,
            reference: PathBuf::new(),
            result_path: PathBuf::new(),
        };
        let output = SystemRunner.run(&inv).unwrap();
        assert_eq!(output.code, Some(2));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let inv = Invocation {
            program: "/nonexistent/aligner".to_string(),
            args: Vec::new(),
            chunk: 0,
            reference: PathBuf::new(),
            result_path: PathBuf::new(),
        };
        assert!(SystemRunner.run(&inv).is_err());
    }
}
