use crate::config::LookupConfig;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::Semaphore;

/// Produces the XML of an invoice given its access key
#[async_trait]
pub trait InvoiceSource: Send + Sync {
    async fn fetch_by_key(&self, access_key: &str) -> Result<Vec<u8>>;
}

/// File name the lookup program writes for `access_key`
pub fn result_file_name(access_key: &str) -> String {
    format!("NFe_{}.xml", access_key)
}

/// Access keys become part of a file name, so only ASCII alphanumerics are accepted.
pub fn validate_access_key(access_key: &str) -> Result<()> {
    if access_key.is_empty() || !access_key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SyncError::InvalidAccessKey(access_key.to_string()));
    }
    Ok(())
}

/// Runs the external lookup program once per call and reads back `NFe_<key>.xml`.
pub struct ProcessFetcher {
    program: PathBuf,
    args: Vec<String>,
    output_dir: PathBuf,
    permits: Semaphore,
}

impl ProcessFetcher {
    pub fn new(config: &LookupConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            output_dir: config.output_dir.clone(),
            permits: Semaphore::new(config.max_concurrency.max(1)),
        }
    }

    async fn run_lookup(&self, access_key: &str) -> Result<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SyncError::LookupProcessFailed {
                reason: e.to_string(),
                output: String::new(),
            })?;

        tracing::info!("Starting external lookup: {:?} {}", self.program, access_key);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(access_key)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                tracing::error!("Failed to spawn lookup program {:?}: {}", self.program, e);
                SyncError::LookupProcessFailed {
                    reason: e.to_string(),
                    output: String::new(),
                }
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            tracing::error!(
                "Lookup program failed for {}: {}. Output: {}",
                access_key,
                output.status,
                combined
            );
            return Err(SyncError::LookupProcessFailed {
                reason: output.status.to_string(),
                output: combined,
            });
        }

        tracing::debug!("Lookup program finished for {}. Output:\n{}", access_key, combined);
        Ok(combined)
    }
}

#[async_trait]
impl InvoiceSource for ProcessFetcher {
    async fn fetch_by_key(&self, access_key: &str) -> Result<Vec<u8>> {
        validate_access_key(access_key)?;
        self.run_lookup(access_key).await?;

        let path = self.output_dir.join(result_file_name(access_key));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Lookup produced no file at {:?}", path);
                Err(SyncError::ResultNotFound(access_key.to_string()))
            }
            Err(e) => {
                tracing::error!("Failed to read lookup result {:?}: {}", path, e);
                Err(SyncError::LookupProcessFailed {
                    reason: format!("erro ao ler {}: {}", path.display(), e),
                    output: String::new(),
                })
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;

    // Runs `sh -c <script> lookup <key>`, so the key is `$1` inside the script.
    fn shell_fetcher(script: &str, output_dir: &Path) -> ProcessFetcher {
        ProcessFetcher::new(&LookupConfig {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string(), "lookup".to_string()],
            output_dir: output_dir.to_path_buf(),
            max_concurrency: 2,
        })
    }

    #[tokio::test]
    async fn reads_file_written_by_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let script = format!(
            "echo consultando $1; printf '<nfeProc/>' > '{}'/NFe_$1.xml",
            dir.path().display()
        );
        let fetcher = shell_fetcher(&script, dir.path());
        let bytes = fetcher.fetch_by_key("123").await.unwrap();
        assert_eq!(bytes, b"<nfeProc/>");
    }

    #[tokio::test]
    async fn non_zero_exit_embeds_output() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = shell_fetcher("echo rejeitada; echo detalhe >&2; exit 3", dir.path());
        match fetcher.fetch_by_key("999").await {
            Err(SyncError::LookupProcessFailed { output, .. }) => {
                assert!(output.contains("rejeitada"));
                assert!(output.contains("detalhe"));
            }
            other => panic!("expected LookupProcessFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_result_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = shell_fetcher("exit 0", dir.path());
        assert!(matches!(
            fetcher.fetch_by_key("555").await,
            Err(SyncError::ResultNotFound(ref k)) if k == "555"
        ));
    }

    #[tokio::test]
    async fn missing_program_is_lookup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ProcessFetcher::new(&LookupConfig {
            program: dir.path().join("does-not-exist"),
            args: Vec::new(),
            output_dir: dir.path().to_path_buf(),
            max_concurrency: 1,
        });
        assert!(matches!(
            fetcher.fetch_by_key("1").await,
            Err(SyncError::LookupProcessFailed { .. })
        ));
    }

    #[tokio::test]
    async fn path_like_keys_are_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = format!("touch '{}'", marker.display());
        let fetcher = shell_fetcher(&script, dir.path());
        for key in ["", "../etc/passwd", "12 34"] {
            assert!(matches!(
                fetcher.fetch_by_key(key).await,
                Err(SyncError::InvalidAccessKey(_))
            ));
        }
        assert!(!marker.exists());
    }
}
