/// Configuration management for Hoaxify
use crate::error::{HoaxError, HoaxResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub attachments: AttachmentConfig,
    pub email: Option<EmailConfig>,
    /// Upper bound on a single outbound email; must stay below `storage.busy_timeout`
    pub email_timeout: Duration,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL used in activation and reset links
    pub public_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub account_db: PathBuf,
    pub upload_directory: PathBuf,
    /// How long a write waits on the SQLite lock before failing
    pub busy_timeout: Duration,
}

impl StorageConfig {
    /// Directory holding attachment files
    pub fn attachment_directory(&self) -> PathBuf {
        self.upload_directory.join("attachment")
    }
}

/// Session token lifetime and sweep cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub lifetime: Duration,
    pub sweep_interval: Duration,
}

/// Attachment retention and upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// How long an unassociated upload survives before it is reclaimed
    pub retention: Duration,
    pub sweep_interval: Duration,
    pub max_bytes: usize,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "hoaxify=debug,tower_http=debug";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    pub json: bool,
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> HoaxResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("HOAXIFY_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("HOAXIFY_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| HoaxError::Validation("Invalid port number".to_string()))?;
        let public_url = env::var("HOAXIFY_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));

        let data_directory: PathBuf = env::var("HOAXIFY_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let account_db = env::var("HOAXIFY_ACCOUNT_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("account.sqlite"));
        let upload_directory = env::var("HOAXIFY_UPLOAD_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("uploads"));
        let busy_timeout = env_secs("HOAXIFY_DB_BUSY_TIMEOUT_SECS", 5);

        let session = SessionConfig {
            lifetime: env_secs("HOAXIFY_SESSION_LIFETIME_SECS", 7 * 24 * 3600),
            sweep_interval: env_secs("HOAXIFY_SESSION_SWEEP_INTERVAL_SECS", 3600),
        };

        let attachments = AttachmentConfig {
            retention: env_secs("HOAXIFY_ATTACHMENT_RETENTION_SECS", 24 * 3600),
            sweep_interval: env_secs("HOAXIFY_ATTACHMENT_SWEEP_INTERVAL_SECS", 24 * 3600),
            max_bytes: env::var("HOAXIFY_ATTACHMENT_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5 * 1024 * 1024),
        };

        let email = if let Ok(smtp_url) = env::var("HOAXIFY_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("HOAXIFY_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let email_timeout = env_secs("HOAXIFY_EMAIL_TIMEOUT_SECS", 3);

        let logging = LoggingConfig {
            level: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            json: env::var("HOAXIFY_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
            },
            storage: StorageConfig {
                data_directory,
                account_db,
                upload_directory,
                busy_timeout,
            },
            session,
            attachments,
            email,
            email_timeout,
            logging,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> HoaxResult<()> {
        if self.service.hostname.is_empty() {
            return Err(HoaxError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.session.lifetime.is_zero() {
            return Err(HoaxError::Validation(
                "Session lifetime must be greater than zero".to_string(),
            ));
        }

        if self.session.sweep_interval.is_zero() || self.attachments.sweep_interval.is_zero() {
            return Err(HoaxError::Validation(
                "Sweep intervals must be greater than zero".to_string(),
            ));
        }

        if self.attachments.max_bytes == 0 {
            return Err(HoaxError::Validation(
                "Attachment size limit must be greater than zero".to_string(),
            ));
        }

        // Registration holds the write lock while its email is in flight
        if self.email_timeout.is_zero() || self.email_timeout >= self.storage.busy_timeout {
            return Err(HoaxError::Validation(
                "Email timeout must be non-zero and shorter than the database busy timeout"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Configuration suitable for tests: everything under `data_directory`, no SMTP
    pub fn for_data_directory(data_directory: PathBuf) -> Self {
        Self {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 3000,
                public_url: "http://localhost:3000".to_string(),
            },
            storage: StorageConfig {
                account_db: data_directory.join("account.sqlite"),
                upload_directory: data_directory.join("uploads"),
                data_directory,
                busy_timeout: Duration::from_secs(5),
            },
            session: SessionConfig {
                lifetime: Duration::from_secs(7 * 24 * 3600),
                sweep_interval: Duration::from_secs(3600),
            },
            attachments: AttachmentConfig {
                retention: Duration::from_secs(24 * 3600),
                sweep_interval: Duration::from_secs(24 * 3600),
                max_bytes: 5 * 1024 * 1024,
            },
            email: None,
            email_timeout: Duration::from_secs(3),
            logging: LoggingConfig {
                level: DEFAULT_LOG_FILTER.to_string(),
                json: false,
            },
        }
    }
}
