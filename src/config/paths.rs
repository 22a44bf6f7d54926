use crate::config::LiveExportConfig;
use crate::error::{LiveExportError, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Where the server listens and where exports land.
///
/// Resolved once at startup and shared read-only for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub root_dir: PathBuf,
    pub scene_path: PathBuf,
    pub texture_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl ExportPaths {
    /// Default file names on all interfaces; port 0 asks the OS for a free port
    pub fn new(root_dir: impl Into<PathBuf>, port: u16) -> Self {
        let root_dir = root_dir.into();
        let defaults = LiveExportConfig::default();
        Self {
            scene_path: root_dir.join(&defaults.export.scene_file_name),
            texture_path: root_dir.join(&defaults.export.texture_file_name),
            root_dir,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port,
        }
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn from_config(config: &LiveExportConfig, working_dir: &Path) -> Result<Self> {
        let root_dir = match &config.server.root_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => working_dir.join(dir),
            None => working_dir.to_path_buf(),
        };

        let host = config.server.host.parse::<IpAddr>().map_err(|e| {
            LiveExportError::ConfigError(format!(
                "Invalid server host '{}': {e}",
                config.server.host
            ))
        })?;

        Ok(Self {
            scene_path: root_dir.join(&config.export.scene_file_name),
            texture_path: root_dir.join(&config.export.texture_file_name),
            root_dir,
            host,
            port: config.server.port,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_default_config_use_working_dir() {
        let config = LiveExportConfig::default();
        let paths = ExportPaths::from_config(&config, Path::new("/tmp/out")).unwrap();

        assert_eq!(paths.root_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            paths.scene_path,
            PathBuf::from("/tmp/out/blender_live_scene.glb")
        );
        assert_eq!(
            paths.texture_path,
            PathBuf::from("/tmp/out/environment_texture.jpg")
        );
        assert_eq!(paths.socket_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn test_relative_root_dir_is_joined_to_working_dir() {
        let mut config = LiveExportConfig::default();
        config.server.root_dir = Some(PathBuf::from("public"));
        config.export.scene_file_name = "scene.glb".to_string();

        let paths = ExportPaths::from_config(&config, Path::new("/work")).unwrap();
        assert_eq!(paths.root_dir, PathBuf::from("/work/public"));
        assert_eq!(paths.scene_path, PathBuf::from("/work/public/scene.glb"));
    }

    #[test]
    fn test_absolute_root_dir_is_kept() {
        let mut config = LiveExportConfig::default();
        config.server.root_dir = Some(PathBuf::from("/srv/live"));

        let paths = ExportPaths::from_config(&config, Path::new("/work")).unwrap();
        assert_eq!(paths.root_dir, PathBuf::from("/srv/live"));
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let mut config = LiveExportConfig::default();
        config.server.host = "localhost".to_string();

        let result = ExportPaths::from_config(&config, Path::new("/work"));
        assert!(matches!(result, Err(LiveExportError::ConfigError(_))));
    }
}
