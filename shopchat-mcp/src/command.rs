//! Tool host process selection and child environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Package launched through `npx` when no local server script is configured.
pub const DEFAULT_PACKAGE: &str = "@spurtcommerce/mcp";

/// Errors reading the tool host environment file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a JSON object of string pairs.
    #[error("invalid tool host config {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// How to launch the tool host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHostCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Extra environment for the child, on top of the inherited one.
    pub env: HashMap<String, String>,
}

impl ToolHostCommand {
    /// Pick the command for the tool host.
    ///
    /// A configured server script runs as `<runtime> <path>`. Without one the
    /// packaged server runs through `npx`.
    #[must_use]
    pub fn resolve(server_path: Option<&Path>, runtime: &str) -> Self {
        match server_path {
            Some(path) => Self {
                program: runtime.to_string(),
                args: vec![path.display().to_string()],
                env: HashMap::new(),
            },
            None => Self {
                program: "npx".to_string(),
                args: vec![DEFAULT_PACKAGE.to_string()],
                env: HashMap::new(),
            },
        }
    }

    /// Attach extra environment variables for the child.
    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    /// Build the process command. Stdin and stdout are wired by the transport.
    #[must_use]
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(&self.env);
        cmd
    }
}

/// Load the child environment from a JSON object of string pairs.
///
/// A missing file yields an empty map.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or is not a JSON object
/// whose values are all strings.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no tool host config, using inherited env");
            return Ok(HashMap::new());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
