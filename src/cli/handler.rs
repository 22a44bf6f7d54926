#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_handler_default_config_path() {
        let handler = CliHandler::new(None).unwrap();
        assert!(handler.config_path.ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_apply_overrides() {
        let config = LiveExportConfig::default();
        let config = CliHandler::apply_overrides(
            config,
            Some(PathBuf::from("scene.blend")),
            Some(9001),
            Some(PathBuf::from("public")),
        )
        .unwrap();

        assert_eq!(config.watch.document, Some(PathBuf::from("scene.blend")));
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.root_dir, Some(PathBuf::from("public")));
    }

    #[test]
    fn test_apply_overrides_validates() {
        let result =
            CliHandler::apply_overrides(LiveExportConfig::default(), None, Some(0), None);
        assert!(matches!(result, Err(LiveExportError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_init_writes_config_once() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        let handler = CliHandler::new(Some(config_path.clone())).unwrap();

        let first = handler.init_project(false).await.unwrap();
        assert!(matches!(first, CliResult::Success(_)));
        let loaded = LiveExportConfig::load_from_path(&config_path).await.unwrap();
        assert_eq!(loaded.server.port, 8000);

        let second = handler.init_project(false).await.unwrap();
        assert!(matches!(second, CliResult::Error(_)));

        let forced = handler.init_project(true).await.unwrap();
        assert!(matches!(forced, CliResult::Success(_)));
    }

    #[tokio::test]
    async fn test_load_config_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let handler = CliHandler::new(Some(temp_dir.path().join(CONFIG_FILE_NAME))).unwrap();

        let config = handler.load_config().await.unwrap();
        assert_eq!(config.export.scene_file_name, "blender_live_scene.glb");
    }
}

use crate::action::ToggleLiveExportAction;
use crate::cli::commands::{CliArgs, CliResult, Commands};
use crate::config::{CONFIG_FILE_NAME, ExportPaths, LiveExportConfig};
use crate::controller::LiveExportController;
use crate::error::{LiveExportError, Result};
use crate::export::{CommandExporter, ExportTrigger};
use crate::host::{DocumentWatcher, SaveEvent, SaveHandlers};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const INIT_HEADER: &str = r#"# live-export configuration
#
# Export commands are split like a shell command line. Placeholders:
#   {output}   - path of the artifact to write
#   {document} - the watched document ([watch] document)
#
# A texture command exiting with code 3 means "no environment texture".
#
# [export]
# scene_command = "blender --background {document} --python export_glb.py -- {output}"
# texture_command = "blender --background {document} --python export_env.py -- {output}"

"#;

const INTERACTIVE_HELP: &str = "Commands: toggle, status, save, export, quit";

/// Main CLI handler that runs commands in-process
pub struct CliHandler {
    pub config_path: PathBuf,
}

impl CliHandler {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => std::env::current_dir()?.join(CONFIG_FILE_NAME),
        };

        Ok(Self { config_path })
    }

    pub async fn load_config(&self) -> Result<LiveExportConfig> {
        LiveExportConfig::load_from_path(&self.config_path).await
    }

    /// Main entry point for handling CLI commands
    pub async fn handle_command(&self, args: CliArgs, config: LiveExportConfig) -> Result<CliResult> {
        match args.command {
            Commands::Run {
                document,
                port,
                root,
            } => {
                let config = Self::apply_overrides(config, document, port, root)?;
                self.run_live(config).await
            }
            Commands::Export { json } => self.export_once(config, json).await,
            Commands::Init { force } => self.init_project(force).await,
        }
    }

    /// Layer command-line flags over the loaded configuration
    pub fn apply_overrides(
        mut config: LiveExportConfig,
        document: Option<PathBuf>,
        port: Option<u16>,
        root: Option<PathBuf>,
    ) -> Result<LiveExportConfig> {
        if let Some(document) = document {
            config.watch.document = Some(document);
        }
        if let Some(port) = port {
            config.server.port = port;
        }
        if let Some(root) = root {
            config.server.root_dir = Some(root);
        }
        config.validate()?;
        Ok(config)
    }

    async fn init_project(&self, force: bool) -> Result<CliResult> {
        if self.config_path.exists() && !force {
            return Ok(CliResult::Error(format!(
                "{} already exists (use --force to overwrite)",
                self.config_path.display()
            )));
        }

        if let Some(parent) = self.config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = toml::to_string_pretty(&LiveExportConfig::default())
            .map_err(|e| LiveExportError::ConfigError(format!("Failed to serialize config: {e}")))?;
        tokio::fs::write(&self.config_path, format!("{INIT_HEADER}{body}")).await?;

        Ok(CliResult::Success(format!(
            "Wrote {}",
            self.config_path.display()
        )))
    }

    async fn export_once(&self, config: LiveExportConfig, json: bool) -> Result<CliResult> {
        let working_dir = std::env::current_dir()?;
        let paths = Arc::new(ExportPaths::from_config(&config, &working_dir)?);
        let exporter = CommandExporter::from_config(&config, &working_dir);

        tokio::fs::create_dir_all(&paths.root_dir).await?;

        let trigger = ExportTrigger::new(paths, Arc::new(exporter));
        let report = trigger.run_exports().await;

        let output = if json {
            serde_json::to_string_pretty(&report)?
        } else {
            report.to_string()
        };

        if report.has_failures() {
            Ok(CliResult::Error(output))
        } else {
            Ok(CliResult::Success(output))
        }
    }

    async fn run_live(&self, config: LiveExportConfig) -> Result<CliResult> {
        let working_dir = std::env::current_dir()?;
        let paths = Arc::new(ExportPaths::from_config(&config, &working_dir)?);
        let exporter = CommandExporter::from_config(&config, &working_dir);
        if !exporter.has_scene_command() {
            warn!("No scene_command configured; saves will report scene export failures");
        }

        let events = Arc::new(SaveHandlers::new());
        let controller = Arc::new(
            LiveExportController::new(paths, events.clone(), Arc::new(exporter))
                .with_shutdown_grace(config.shutdown_grace()),
        );
        let action = ToggleLiveExportAction::new(Arc::clone(&controller));

        let report = action.invoke().await;
        println!("{report}");
        if report.is_error() {
            return Ok(CliResult::Error(report.message));
        }

        let document = config
            .watch
            .document
            .as_ref()
            .map(|document| absolutize(&working_dir, document));

        let watcher_task = match &document {
            Some(document) => match self.spawn_watcher(document, &config, &events) {
                Ok(task) => Some(task),
                Err(e) => {
                    controller.shutdown().await?;
                    return Err(e);
                }
            },
            None => {
                info!("No document configured; type 'save' to trigger an export");
                None
            }
        };

        println!("{INTERACTIVE_HELP}");
        self.interactive_loop(&action, &events, document).await;

        if let Some(task) = watcher_task {
            task.abort();
        }
        controller.shutdown().await?;

        Ok(CliResult::Success("Live export stopped".to_string()))
    }

    fn spawn_watcher(
        &self,
        document: &Path,
        config: &LiveExportConfig,
        events: &Arc<SaveHandlers>,
    ) -> Result<JoinHandle<()>> {
        let mut watcher = DocumentWatcher::new(document, config.debounce());
        watcher.start()?;

        let handlers = Arc::clone(events);
        Ok(tokio::spawn(async move {
            if let Err(e) = watcher.run(handlers).await {
                error!("Document watcher failed: {}", e);
            }
        }))
    }

    /// Read commands from stdin until quit, EOF plus Ctrl+C, or Ctrl+C
    async fn interactive_loop(
        &self,
        action: &ToggleLiveExportAction,
        events: &SaveHandlers,
        document: Option<PathBuf>,
    ) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("Received Ctrl+C, shutting down...");
                    break;
                }
                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => match line.trim() {
                        "" => {}
                        "toggle" | "t" => println!("{}", action.invoke().await),
                        "status" | "s" => println!("{}", action.controller().status().await),
                        "save" => events.dispatch(&SaveEvent::new(document.clone())).await,
                        "export" | "e" => println!("{}", action.controller().export_now().await),
                        "quit" | "q" | "exit" => break,
                        other => println!("Unknown command '{other}'. {INTERACTIVE_HELP}"),
                    },
                    Ok(None) => {
                        // Detached from a terminal: keep serving until Ctrl+C
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                },
            }
        }
    }
}

fn absolutize(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}
