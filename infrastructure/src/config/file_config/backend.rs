//! Tool backend configuration (`[backend]` section)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// How to launch the MCP tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Executable to spawn; when unset, `node src/index.js` is run
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Working directory for the server process; defaults to `MCP_SERVER_PATH`
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the server process
    pub env: HashMap<String, String>,
    /// Per-request timeout for JSON-RPC calls
    pub request_timeout_secs: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            request_timeout_secs: 60,
        }
    }
}

/// Entry script of the server checkout, relative to its directory
const DEFAULT_SCRIPT: &str = "src/index.js";

/// A concrete command line for the backend process
#[derive(Debug, Clone, PartialEq)]
pub struct BackendLaunch {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub request_timeout: Duration,
}

impl FileBackendConfig {
    /// Resolve the command line.
    ///
    /// Without a `command`, the server checkout is started with
    /// `node src/index.js`, from `cwd`, else `MCP_SERVER_PATH`, else the
    /// current directory.
    pub fn launch(&self, env: impl Fn(&str) -> Option<String>) -> BackendLaunch {
        let (program, args) = match &self.command {
            Some(command) if !command.trim().is_empty() => (command.clone(), self.args.clone()),
            _ => ("node".to_string(), vec![DEFAULT_SCRIPT.to_string()]),
        };
        let cwd = self.cwd.clone().or_else(|| {
            env("MCP_SERVER_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
        });

        BackendLaunch {
            program,
            args,
            cwd,
            env: self.env.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_command() {
        let config = FileBackendConfig {
            command: Some("zendesk-mcp".into()),
            args: vec!["--stdio".into()],
            ..Default::default()
        };
        let launch = config.launch(|_| None);
        assert_eq!(launch.program, "zendesk-mcp");
        assert_eq!(launch.args, vec!["--stdio"]);
        assert_eq!(launch.cwd, None);
        assert_eq!(launch.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_server_path_is_the_working_directory() {
        let launch = FileBackendConfig::default().launch(|name| {
            (name == "MCP_SERVER_PATH").then(|| "/path/to/zendesk-mcp-server".to_string())
        });
        assert_eq!(launch.program, "node");
        assert_eq!(launch.args, vec!["src/index.js"]);
        assert_eq!(launch.cwd, Some(PathBuf::from("/path/to/zendesk-mcp-server")));
    }

    #[test]
    fn test_configured_cwd_beats_server_path() {
        let config = FileBackendConfig {
            cwd: Some(PathBuf::from("/opt/tickets")),
            ..Default::default()
        };
        let launch = config.launch(|_| Some("/elsewhere".into()));
        assert_eq!(launch.cwd, Some(PathBuf::from("/opt/tickets")));
    }

    #[test]
    fn test_nothing_configured_runs_from_current_dir() {
        let launch = FileBackendConfig::default().launch(|_| Some(" ".into()));
        assert_eq!(launch.program, "node");
        assert_eq!(launch.args, vec!["src/index.js"]);
        assert_eq!(launch.cwd, None);
    }
}
