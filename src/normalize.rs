use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::config::NormalizeConfig;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("{program} not found in PATH. Please install it and ensure it's available.")]
    ToolNotFound { program: String },

    #[error("Not a file path: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("{program} failed with {status}:\nstderr:\n{stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} finished but did not create {}", .output.display())]
    OutputMissing { program: String, output: PathBuf },

    #[error("File system error: {0}")]
    Io(#[from] io::Error),
}

/// Runs an external program to completion.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output>;
}

/// Looks the program up on PATH and blocks until it exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output> {
        let program = which::which(program)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
        log::info!("Running {} with arguments: {:?}", program.display(), args);
        Command::new(program).args(args).output()
    }
}

/// The original file and the normalized copy that should replace it.
///
/// The original is only removed by `commit`, once the copy is known to exist.
struct PendingReplacement<'a> {
    original: &'a Path,
    output: PathBuf,
    committed: bool,
}

impl<'a> PendingReplacement<'a> {
    fn new(original: &'a Path, output: PathBuf) -> Self {
        Self {
            original,
            output,
            committed: false,
        }
    }

    fn commit(mut self, program: &str) -> Result<PathBuf, NormalizeError> {
        if !self.output.is_file() {
            return Err(NormalizeError::OutputMissing {
                program: program.to_string(),
                output: self.output.clone(),
            });
        }
        std::fs::remove_file(self.original)?;
        self.committed = true;
        Ok(self.output.clone())
    }
}

impl Drop for PendingReplacement<'_> {
    fn drop(&mut self) {
        if !self.committed {
            log::warn!(
                "Normalization of {} did not complete, keeping the original",
                self.original.display()
            );
        }
    }
}

/// Evens out loudness of downloaded songs with an external tool.
pub struct Normalizer<R = SystemCommandRunner> {
    config: NormalizeConfig,
    runner: R,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self::with_runner(config, SystemCommandRunner)
    }
}

impl<R: CommandRunner> Normalizer<R> {
    pub fn with_runner(config: NormalizeConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Where the tool writes the normalized copy of `path`: next to it, with
    /// the configured prefix and a dash in front of the file name.
    pub fn output_path(&self, path: &Path) -> Option<PathBuf> {
        let file_name = path.file_name()?.to_str()?;
        Some(path.with_file_name(format!("{}-{}", self.config.output_prefix, file_name)))
    }

    fn args(&self, path: &Path) -> Vec<String> {
        vec![
            "-u".to_string(),
            "-p".to_string(),
            self.config.output_prefix.clone(),
            "-l".to_string(),
            self.config.target_level_db.to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Normalize the song at `path`, replacing it with the normalized copy.
    ///
    /// Returns the path of the new file. If the tool fails or doesn't produce
    /// a file, the original is left in place.
    pub fn normalize_audio(&self, path: &Path) -> Result<PathBuf, NormalizeError> {
        let program = self.config.program.as_str();
        let output_path = self
            .output_path(path)
            .ok_or_else(|| NormalizeError::InvalidPath(path.to_path_buf()))?;
        let pending = PendingReplacement::new(path, output_path);

        let output = self
            .runner
            .run(program, &self.args(path))
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => NormalizeError::ToolNotFound {
                    program: program.to_string(),
                },
                _ => NormalizeError::Io(e),
            })?;

        if !output.status.success() {
            return Err(NormalizeError::ToolFailed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let normalized = pending.commit(program)?;
        log::debug!(
            "Normalized {} into {}",
            path.display(),
            normalized.display()
        );
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn exit_with(code: i32) -> Output {
        use std::os::unix::process::ExitStatusExt;

        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: b"something went wrong".to_vec(),
        }
    }

    fn song_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Green Day - Basket Case.mp3");
        std::fs::write(&path, b"loud audio").unwrap();
        (dir, path)
    }

    #[test]
    fn test_output_path() {
        let normalizer = Normalizer::new(NormalizeConfig::default());
        assert_eq!(
            normalizer.output_path(Path::new("/music/Punk/Green Day - Basket Case.mp3")),
            Some(PathBuf::from(
                "/music/Punk/normalized-Green Day - Basket Case.mp3"
            ))
        );
        assert_eq!(normalizer.output_path(Path::new("/")), None);
    }

    #[test]
    fn test_args() {
        let normalizer = Normalizer::new(NormalizeConfig::default());
        assert_eq!(
            normalizer.args(Path::new("song.mp3")),
            vec!["-u", "-p", "normalized", "-l", "-18", "song.mp3"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_replaces_original_with_normalized_copy() {
        let (dir, path) = song_file();
        let expected_args = Normalizer::new(NormalizeConfig::default()).args(&path);

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(move |program, args| {
                program.to_string() == "ffmpeg-normalize" && args.to_vec() == expected_args
            })
            .times(1)
            .returning(|_, args| {
                let input = PathBuf::from(args.last().unwrap());
                let output = input.with_file_name(format!(
                    "normalized-{}",
                    input.file_name().unwrap().to_str().unwrap()
                ));
                std::fs::write(output, b"audio").unwrap();
                Ok(exit_with(0))
            });

        let normalizer = Normalizer::with_runner(NormalizeConfig::default(), runner);
        let normalized = normalizer.normalize_audio(&path).unwrap();

        assert_eq!(
            normalized,
            dir.path().join("normalized-Green Day - Basket Case.mp3")
        );
        assert!(normalized.is_file());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_keeps_original_when_tool_fails() {
        let (_dir, path) = song_file();

        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_, _| Ok(exit_with(1)));

        let normalizer = Normalizer::with_runner(NormalizeConfig::default(), runner);
        let err = normalizer.normalize_audio(&path).unwrap_err();

        match err {
            NormalizeError::ToolFailed { stderr, .. } => {
                assert_eq!(stderr, "something went wrong")
            }
            other => panic!("Expected ToolFailed, got {:?}", other),
        }
        assert!(path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_keeps_original_when_output_missing() {
        let (_dir, path) = song_file();

        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_, _| Ok(exit_with(0)));

        let normalizer = Normalizer::with_runner(NormalizeConfig::default(), runner);
        assert!(matches!(
            normalizer.normalize_audio(&path),
            Err(NormalizeError::OutputMissing { .. })
        ));
        assert!(path.is_file());
    }

    #[test]
    fn test_tool_not_found() {
        let (_dir, path) = song_file();

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::NotFound, "missing")));

        let normalizer = Normalizer::with_runner(NormalizeConfig::default(), runner);
        match normalizer.normalize_audio(&path) {
            Err(NormalizeError::ToolNotFound { program }) => {
                assert_eq!(program, "ffmpeg-normalize")
            }
            other => panic!("Expected ToolNotFound, got {:?}", other),
        }
        assert!(path.is_file());
    }

    #[test]
    fn test_system_runner_reports_missing_program() {
        let err = SystemCommandRunner
            .run("definitely-not-an-installed-normalizer", &[])
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_custom_prefix_and_level() {
        let normalizer = Normalizer::new(NormalizeConfig {
            program: "loudnorm".to_string(),
            target_level_db: -23,
            output_prefix: "norm".to_string(),
        });
        assert_eq!(
            normalizer.args(Path::new("a.mp3")),
            vec!["-u", "-p", "norm", "-l", "-23", "a.mp3"]
        );
        assert_eq!(
            normalizer.output_path(Path::new("a.mp3")),
            Some(PathBuf::from("norm-a.mp3"))
        );
    }
}
