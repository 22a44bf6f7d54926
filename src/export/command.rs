use crate::config::LiveExportConfig;
use crate::error::{LiveExportError, Result};
use crate::export::traits::{SceneExporter, TextureExport};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code a texture command uses to say the document has no environment texture
pub const TEXTURE_MISSING_EXIT_CODE: i32 = 3;

/// Exporter backed by external commands, e.g. a headless Blender run.
///
/// Command templates are split shell-style; `{output}` is replaced by the
/// artifact path and `{document}` by the watched document.
#[derive(Debug, Clone)]
pub struct CommandExporter {
    scene_command: Option<String>,
    texture_command: Option<String>,
    document: Option<PathBuf>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl CommandExporter {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            scene_command: None,
            texture_command: None,
            document: None,
            working_dir: working_dir.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(config: &LiveExportConfig, working_dir: &Path) -> Self {
        Self {
            scene_command: config.export.scene_command.clone(),
            texture_command: config.export.texture_command.clone(),
            document: config.watch.document.clone(),
            working_dir: working_dir.to_path_buf(),
            timeout: config.export_timeout(),
        }
    }

    pub fn with_scene_command(mut self, command: impl Into<String>) -> Self {
        self.scene_command = Some(command.into());
        self
    }

    pub fn with_texture_command(mut self, command: impl Into<String>) -> Self {
        self.texture_command = Some(command.into());
        self
    }

    pub fn with_document(mut self, document: impl Into<PathBuf>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_scene_command(&self) -> bool {
        self.scene_command.is_some()
    }

    /// Split a template and substitute placeholders into each argument
    fn build_args(&self, template: &str, output: &Path) -> Result<(String, Vec<String>)> {
        let parts = shlex::split(template).ok_or_else(|| {
            LiveExportError::CommandError(format!("Failed to parse command: {template}"))
        })?;

        if parts.is_empty() {
            return Err(LiveExportError::CommandError("Empty command".to_string()));
        }

        let output = output.display().to_string();
        let document = self.document.as_ref().map(|d| d.display().to_string());

        let mut args = Vec::with_capacity(parts.len());
        for part in parts {
            let mut arg = part.replace("{output}", &output);
            if arg.contains("{document}") {
                let document = document.as_deref().ok_or_else(|| {
                    LiveExportError::CommandError(
                        "Command uses {document} but no document is configured".to_string(),
                    )
                })?;
                arg = arg.replace("{document}", document);
            }
            args.push(arg);
        }

        let program = args.remove(0);
        Ok((program, args))
    }

    /// Run a template to completion and return its exit code
    async fn run(&self, artifact: &str, template: &str, output: &Path) -> Result<i32> {
        let (program, args) = self.build_args(template, output)?;
        debug!("Running {} export: {} {:?}", artifact, program, args);

        let mut command = Command::new(&program);
        command
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            LiveExportError::CommandError(format!("Failed to spawn '{program}': {e}"))
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                LiveExportError::TimeoutError(format!(
                    "{artifact} export did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })??;

        // Killed by a signal counts as a failure
        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().last().unwrap_or("").trim();
            warn!("{} export command exited with {}: {}", artifact, code, last_line);
        }

        Ok(code)
    }

    fn failed(artifact: &str, code: i32) -> LiveExportError {
        LiveExportError::CommandError(format!("{artifact} export command exited with code {code}"))
    }
}

#[async_trait]
impl SceneExporter for CommandExporter {
    async fn export_scene(&self, path: &Path) -> Result<()> {
        let template = self.scene_command.as_deref().ok_or_else(|| {
            LiveExportError::ExportError("No scene_command configured".to_string())
        })?;

        let code = self.run("scene", template, path).await?;
        if code != 0 {
            return Err(Self::failed("scene", code));
        }

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(LiveExportError::ExportError(format!(
                "Scene command succeeded but did not write {}",
                path.display()
            )));
        }
        Ok(())
    }

    async fn export_environment_texture(&self, path: &Path) -> Result<TextureExport> {
        let Some(template) = self.texture_command.as_deref() else {
            return Ok(TextureExport::Skipped {
                reason: "no texture_command configured".to_string(),
            });
        };

        match self.run("environment texture", template, path).await? {
            0 => Ok(TextureExport::Written),
            TEXTURE_MISSING_EXIT_CODE => Ok(TextureExport::Skipped {
                reason: "document has no environment texture".to_string(),
            }),
            code => Err(Self::failed("environment texture", code)),
        }
    }
}
