use archive::ArchiveConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address, `host:port` or Go-style `:port`
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Local document cache directory
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Remote archive connection
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Request body read timeout in seconds
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Whole-request timeout in seconds, including document resolution
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    /// How long in-flight requests may drain after a shutdown signal
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            directory: default_directory(),
            archive: ArchiveConfig::default(),
            read_timeout_secs: default_read_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            log_level: default_log_level(),
        }
    }
}

/// Command-line overrides; anything given here beats file and environment.
#[derive(Debug, Default, Parser)]
#[command(name = "docvault-server", version, about = "Serve documents from a local cache backed by an FTP archive")]
pub struct CliArgs {
    /// Server listen address
    #[arg(long = "listen-addr")]
    pub listen_addr: Option<String>,

    /// Directory holding cached documents
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// FTP archive host name
    #[arg(long = "srv-ftp")]
    pub srv_ftp: Option<String>,

    /// FTP archive user name
    #[arg(long = "user-ftp")]
    pub user_ftp: Option<String>,

    /// FTP archive password
    #[arg(long = "pwd-ftp", env = "DOCVAULT_FTP_PASSWORD", hide_env_values = true)]
    pub pwd_ftp: Option<String>,

    /// Log filter, e.g. `info` or `server=debug,cache=debug`
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("DOCVAULT_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_cli(&mut self, cli: CliArgs) {
        if let Some(addr) = cli.listen_addr {
            self.listen_addr = addr;
        }
        if let Some(directory) = cli.directory {
            self.directory = directory;
        }
        if let Some(host) = cli.srv_ftp {
            self.archive.host = host;
        }
        if let Some(user) = cli.user_ftp {
            self.archive.user = user;
        }
        if let Some(password) = cli.pwd_ftp {
            self.archive.password = password;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        };
        Ok(addr_str.parse()?)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_read_timeout_secs() -> u64 {
    5
}

fn default_write_timeout_secs() -> u64 {
    10
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:5000");
        assert_eq!(cfg.directory, PathBuf::from("."));
        assert_eq!(cfg.read_timeout_secs, 5);
        assert_eq!(cfg.write_timeout_secs, 10);
        assert_eq!(cfg.shutdown_grace_secs, 30);
        assert_eq!(cfg.archive.port, 21);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_go_style_listen_addr() {
        let cfg = ServerConfig {
            listen_addr: ":8081".to_string(),
            ..ServerConfig::default()
        };
        let addr = cfg.socket_addr().unwrap();
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 8081);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliArgs::try_parse_from([
            "docvault-server",
            "--listen-addr",
            ":6000",
            "--directory",
            "/srv/docs",
            "--srv-ftp",
            "srvdata",
            "--user-ftp",
            "archivist",
        ])
        .unwrap();

        let mut cfg = ServerConfig::default();
        cfg.apply_cli(cli);

        assert_eq!(cfg.listen_addr, ":6000");
        assert_eq!(cfg.directory, PathBuf::from("/srv/docs"));
        assert_eq!(cfg.archive.host, "srvdata");
        assert_eq!(cfg.archive.user, "archivist");
        assert_eq!(cfg.archive.password, "pwd");
    }
}
