use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::backends::ChatCompletionsClient;
use crate::chat::ChatMessage;
use crate::error::BenchError;

use super::traits::ModelProvider;

pub const DEFAULT_CONTEXT_LENGTH: u32 = 8192;

const DEFAULT_CLI: &str = "lms";
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(60);

/// A model hosted by a local LM Studio server.
///
/// Loading and unloading go through the `lms` command-line tool; questions go
/// to the server's OpenAI-compatible endpoint. Models are addressed by their
/// path so that several quantisations of the same model are not confused.
#[derive(Debug)]
pub struct LmStudioModel {
    model_path: String,
    context_length: u32,
    cli: PathBuf,
    client: ChatCompletionsClient,
}

impl LmStudioModel {
    pub fn new(
        endpoint: &str,
        model_path: impl Into<String>,
        context_length: u32,
        timeout: Duration,
    ) -> Result<Self, BenchError> {
        let model_path = model_path.into();
        Ok(Self {
            client: ChatCompletionsClient::new(
                endpoint,
                model_path.clone(),
                None,
                Some(timeout),
            )?,
            model_path,
            context_length,
            cli: PathBuf::from(DEFAULT_CLI),
        })
    }

    /// Uses another `lms` executable.
    pub fn with_cli(mut self, cli: impl Into<PathBuf>) -> Self {
        self.cli = cli.into();
        self
    }

    async fn run_cli(&self, args: &[&str], timeout: Duration) -> Result<String, BenchError> {
        let invocation = format!("`{} {}`", self.cli.display(), args.join(" "));
        log::debug!("running {invocation}");

        let output = Command::new(&self.cli)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, output)
            .await
            .map_err(|_| BenchError::ModelLifecycle(format!("{invocation} timed out")))?
            .map_err(|err| BenchError::ModelLifecycle(format!("{invocation} failed: {err}")))?;

        if !output.status.success() {
            return Err(BenchError::ModelLifecycle(format!(
                "{invocation} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn loaded_models(&self) -> Result<String, BenchError> {
        self.run_cli(&["ps"], STATUS_TIMEOUT).await
    }

    async fn available_models(&self) -> Result<String, BenchError> {
        self.run_cli(&["ls", "--json"], STATUS_TIMEOUT).await
    }
}

/// Finds the `Identifier:` LM Studio assigned to `model_path` in `lms ps`
/// output. The identifier sits at most three lines above the path.
pub(crate) fn find_identifier(ps_output: &str, model_path: &str) -> Option<String> {
    let lines: Vec<&str> = ps_output.lines().collect();
    let at = lines.iter().position(|line| line.contains(model_path))?;
    lines[at.saturating_sub(3)..=at]
        .iter()
        .find_map(|line| line.trim().strip_prefix("Identifier:"))
        .map(|id| id.trim().to_string())
}

#[async_trait]
impl ModelProvider for LmStudioModel {
    async fn load(&self) -> Result<(), BenchError> {
        if self.loaded_models().await?.contains(&self.model_path) {
            log::info!("model {} is already loaded", self.model_path);
            return Ok(());
        }

        if !self.available_models().await?.contains(&self.model_path) {
            return Err(BenchError::ModelLifecycle(format!(
                "model {} is not available, download it first",
                self.model_path
            )));
        }

        log::info!(
            "loading model {} with context length {}",
            self.model_path,
            self.context_length
        );
        let context_length = self.context_length.to_string();
        self.run_cli(
            &["load", &self.model_path, "--context-length", &context_length],
            LIFECYCLE_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn unload(&self) -> Result<(), BenchError> {
        let loaded = self.loaded_models().await?;
        if !loaded.contains(&self.model_path) {
            log::info!("model {} is not loaded", self.model_path);
            return Ok(());
        }

        let identifier = find_identifier(&loaded, &self.model_path).ok_or_else(|| {
            BenchError::ModelLifecycle(format!(
                "could not find identifier for model path {}",
                self.model_path
            ))
        })?;
        self.run_cli(&["unload", &identifier], LIFECYCLE_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn call_with_messages(&self, conversation: &[ChatMessage]) -> Result<String, BenchError> {
        self.client.complete(conversation).await
    }

    fn describe(&self) -> String {
        format!("lmstudio:{}", self.model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS_OUTPUT: &str = "\
LOADED MODELS

Identifier: qwen2.5-7b-instruct
  • Type:  LLM
  • Path: lmstudio-community/Qwen2.5-7B-Instruct-GGUF/Qwen2.5-7B-Instruct-Q4_K_M.gguf
  • Size: 4.68 GB
";

    #[test]
    fn identifier_is_found_above_path() {
        assert_eq!(
            find_identifier(PS_OUTPUT, "Qwen2.5-7B-Instruct-Q4_K_M.gguf").as_deref(),
            Some("qwen2.5-7b-instruct")
        );
        assert_eq!(find_identifier(PS_OUTPUT, "llama"), None);
    }

    #[test]
    fn identifier_too_far_away_is_ignored() {
        let output = "Identifier: far\n\n\n\n  Path: some/model.gguf\n";
        assert_eq!(find_identifier(output, "some/model.gguf"), None);
    }

    #[cfg(unix)]
    fn fake_cli(dir: &std::path::Path, ps: &str) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("calls.log");
        let ps_file = dir.join("ps.txt");
        std::fs::write(&ps_file, ps).unwrap();
        let script = dir.join("lms");
        std::fs::write(
            &script,
            format!(
                concat!(
                    "#!/bin/sh\n",
                    "echo \"$@\" >> {log}\n",
                    "case \"$1\" in\n",
                    "  ps) cat {ps} ;;\n",
                    "  ls) echo '[\"some/model.gguf\"]' ;;\n",
                    "esac\n"
                ),
                log = log.display(),
                ps = ps_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        (script, log)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn load_and_unload_drive_the_cli() {
        let dir = tempfile::tempdir().unwrap();
        let (script, log) = fake_cli(dir.path(), "nothing loaded\n");
        let model = LmStudioModel::new(
            "http://localhost:1234",
            "some/model.gguf",
            4096,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_cli(&script);

        model.load().await.unwrap();
        // Not loaded according to `ps`, so unloading is a no-op.
        model.unload().await.unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(
            calls.lines().collect::<Vec<_>>(),
            vec![
                "ps",
                "ls --json",
                "load some/model.gguf --context-length 4096",
                "ps"
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unload_uses_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let (script, log) = fake_cli(dir.path(), "Identifier: model-1\n  Path: some/model.gguf\n");
        let model = LmStudioModel::new(
            "http://localhost:1234",
            "some/model.gguf",
            DEFAULT_CONTEXT_LENGTH,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_cli(&script);

        model.load().await.unwrap();
        model.unload().await.unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(
            calls.lines().collect::<Vec<_>>(),
            vec!["ps", "ps", "unload model-1"]
        );
    }

    #[tokio::test]
    async fn missing_cli_is_a_lifecycle_error() {
        let model = LmStudioModel::new(
            "http://localhost:1234",
            "some/model.gguf",
            DEFAULT_CONTEXT_LENGTH,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_cli("/nonexistent/lms");

        let err = model.load().await.unwrap_err();
        assert!(matches!(err, BenchError::ModelLifecycle(_)));
    }
}
