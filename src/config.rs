use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sheets: SheetsConfig,
    pub lookup: LookupConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// Sheet that receives invoice rows; clearing it resets duplicate tracking.
    pub primary_sheet: String,
    pub credentials_file: PathBuf,
    #[serde(skip_serializing)]
    pub credentials_base64: Option<String>,
}

// Keeps the encoded service account key out of startup logs.
impl fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("primary_sheet", &self.primary_sheet)
            .field("credentials_file", &self.credentials_file)
            .field(
                "credentials_base64",
                &self.credentials_base64.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    pub program: PathBuf,
    /// Fixed arguments placed before the access key.
    pub args: Vec<String>,
    pub output_dir: PathBuf,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub ingest: Duration,
    pub maintenance: Duration,
}

pub const DEFAULT_SPREADSHEET_ID: &str = "1x4a-gJyjHVxNKBy0bsuAE40vpt5Y9O9f5xEEF7W-fcE";
pub const DEFAULT_PRIMARY_SHEET: &str = "NOTA FISCAL";

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ingest: Duration::from_secs(30),
            maintenance: Duration::from_secs(15),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(&base_dir, |name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source, resolving default paths
    /// against `base_dir`.
    pub fn from_lookup<F>(base_dir: &Path, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let parsed = |name: &str| non_empty(name).and_then(|v| v.trim().parse::<u64>().ok());

        let port = non_empty("SERVER_PORT")
            .or_else(|| non_empty("PORT"))
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(10000);

        let defaults = TimeoutConfig::default();

        Self {
            server: ServerConfig {
                host: non_empty("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
            },
            sheets: SheetsConfig {
                spreadsheet_id: non_empty("SPREADSHEET_ID")
                    .unwrap_or_else(|| DEFAULT_SPREADSHEET_ID.to_string()),
                primary_sheet: non_empty("PRIMARY_SHEET")
                    .unwrap_or_else(|| DEFAULT_PRIMARY_SHEET.to_string()),
                credentials_file: non_empty("CREDENTIALS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| base_dir.join("credentials.json")),
                credentials_base64: non_empty("CREDENTIALS_BASE64"),
            },
            lookup: LookupConfig {
                program: non_empty("LOOKUP_PROGRAM")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| base_dir.join("NfePorChaveGo")),
                args: non_empty("LOOKUP_ARGS")
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                output_dir: non_empty("LOOKUP_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| base_dir.join("nfes")),
                max_concurrency: parsed("LOOKUP_MAX_CONCURRENCY")
                    .filter(|n| *n > 0)
                    .map(|n| n as usize)
                    .unwrap_or(4),
            },
            timeouts: TimeoutConfig {
                ingest: parsed("INGEST_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.ingest),
                maintenance: parsed("MAINTENANCE_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.maintenance),
            },
        }
    }
}
