//! Project configuration (`weft.toml`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeftConfig {
    /// Directory to scan for annotated sources
    pub path: Option<String>,
    /// Directory generated files are written to
    pub output: Option<String>,
    /// Path to a custom template file
    pub template: Option<String>,
    /// Source file extension to scan (default "swift")
    pub extension: Option<String>,
    /// Annotation sigil, the word before the colon (default "weft")
    pub sigil: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("weft.toml")
}

pub fn default_output_dir_in(base: &Path) -> PathBuf {
    base.join("Generated")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<WeftConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: WeftConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &WeftConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_output_dir(output: &Path) -> anyhow::Result<()> {
    if !output.exists() {
        std::fs::create_dir_all(output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.toml");

        let config = WeftConfig {
            path: Some("Sources".to_string()),
            output: Some("Generated".to_string()),
            sigil: Some("inject".to_string()),
            ..Default::default()
        };
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.path.as_deref(), Some("Sources"));
        assert_eq!(loaded.sigil.as_deref(), Some("inject"));
        assert!(loaded.template.is_none());
    }

    #[test]
    fn test_write_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.toml");

        write_config(&path, &WeftConfig::default(), false).unwrap();
        assert!(write_config(&path, &WeftConfig::default(), false).is_err());
        assert!(write_config(&path, &WeftConfig::default(), true).is_ok());
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());
    }
}
