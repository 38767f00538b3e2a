//! Command-line and environment configuration for the server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::network::{NetworkConfig, TlsConfig};
use crate::storage::StorageConfig;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    #[default]
    Fmt,
    /// One JSON object per event.
    Json,
}

/// REST API server for tutorhub datasets.
#[derive(Debug, Clone, Parser)]
#[command(name = "tutorhub-server", version, about)]
pub struct ServerArgs {
    /// Interface to bind.
    #[arg(long, env = "TUTORHUB_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind; 0 picks a free port.
    #[arg(long, env = "TUTORHUB_PORT", default_value_t = 9000)]
    pub port: u16,

    /// Allowed CORS origins, comma separated. `*` allows any.
    #[arg(
        long,
        env = "TUTORHUB_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    pub cors_origins: Vec<String>,

    /// Seconds before a request is answered with 408.
    #[arg(long, env = "TUTORHUB_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// PEM certificate; enables HTTPS together with `--tls-key`.
    #[arg(long, env = "TUTORHUB_TLS_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long, env = "TUTORHUB_TLS_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    /// `memory://` or a `postgres://` connection URL.
    #[arg(long, env = "TUTORHUB_STORAGE_URL", default_value = "memory://")]
    pub storage_url: String,

    /// Connection pool size for database-backed storage.
    #[arg(long, env = "TUTORHUB_STORAGE_MAX_CONNECTIONS", default_value_t = 10)]
    pub storage_max_connections: u32,

    #[arg(long, env = "TUTORHUB_LOG_FORMAT", value_enum, default_value_t = LogFormat::Fmt)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "TUTORHUB_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

impl ServerArgs {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.clone(),
                key_path: key.clone(),
            }),
            _ => None,
        };

        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }

    #[must_use]
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            url: self.storage_url.clone(),
            max_connections: self.storage_max_connections,
        }
    }
}
