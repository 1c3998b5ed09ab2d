use crate::infrastructure::config::{ensure_default_configs, load_app_config, AppConfig};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::initialize_database;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub database_path: PathBuf,
    pub logs_dir: PathBuf,
    pub export_dir: PathBuf,
    pub config: AppConfig,
}

/// Creates the workspace layout, default config and storage schema.
pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join("focusmate.sqlite");

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let config = load_app_config(&config_dir)?;
    let export_dir = workspace_root.join(&config.export_dir);
    fs::create_dir_all(&export_dir)?;
    initialize_database(&database_path)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        database_path,
        logs_dir,
        export_dir,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_creates_layout_and_is_idempotent() {
        let root = std::env::temp_dir().join(format!("focusmate-bootstrap-{}", std::process::id()));
        let first = bootstrap_workspace(&root).expect("bootstrap");
        let second = bootstrap_workspace(&root).expect("bootstrap again");

        assert!(first.config_dir.join("app.json").is_file());
        assert!(first.database_path.is_file());
        assert!(first.logs_dir.is_dir());
        assert!(first.export_dir.ends_with("exports"));
        assert!(first.export_dir.is_dir());
        assert_eq!(first.config, second.config);
        let _ = fs::remove_dir_all(&root);
    }
}
