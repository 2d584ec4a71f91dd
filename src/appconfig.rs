//! Application config handoff
//!
//! The voxd app reads absolute paths (whisper binary, model, llama
//! server) from its YAML config at startup. The installer merges resolved
//! paths into that file without touching unrelated keys the user may have
//! customized.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Result, SetupError};
use crate::paths;

/// Config keys the installer owns
pub const KEY_WHISPER_BINARY: &str = "whisper_binary";
pub const KEY_WHISPER_MODEL: &str = "whisper_model_path";
pub const KEY_LLAMA_SERVER: &str = "llamacpp_server_path";
pub const KEY_LLAMA_MODEL: &str = "llamacpp_default_model";

/// Merge key/value pairs into the YAML mapping at `path`, creating the
/// file when absent and preserving everything else.
pub fn merge_into(path: &Path, updates: &[(&str, String)]) -> Result<()> {
    if updates.is_empty() {
        return Ok(());
    }
    let mut root: Value = match fs::read_to_string(path) {
        Ok(text) => serde_yaml::from_str(&text).map_err(|e| SetupError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?,
        Err(_) => Value::Mapping(Mapping::new()),
    };
    if !root.is_mapping() {
        return Err(SetupError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: "top level is not a mapping".to_string(),
        });
    }
    if let Some(map) = root.as_mapping_mut() {
        for (key, value) in updates {
            debug!("config: {key} = {value}");
            map.insert(
                Value::String((*key).to_string()),
                Value::String(value.clone()),
            );
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_yaml::to_string(&root)?;
    fs::write(path, text).map_err(|e| SetupError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Merge into the real app config location
pub fn persist(updates: &[(&str, String)]) -> Result<()> {
    merge_into(&paths::app_config_path()?, updates)
}

/// Read one string value back out of the app config, if present
pub fn read_key(path: &Path, key: &str) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let root: Value = serde_yaml::from_str(&text).ok()?;
    root.get(key)?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_file_with_updates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("voxd").join("config.yaml");
        merge_into(&path, &[(KEY_WHISPER_BINARY, "/bin/whisper-cli".to_string())]).unwrap();
        assert_eq!(
            read_key(&path, KEY_WHISPER_BINARY).as_deref(),
            Some("/bin/whisper-cli")
        );
    }

    #[test]
    fn test_preserves_unrelated_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "hotkey: ctrl+alt+v\nsimulate_typing: true\n").unwrap();

        merge_into(&path, &[(KEY_LLAMA_SERVER, "/opt/llama-server".to_string())]).unwrap();

        assert_eq!(read_key(&path, "hotkey").as_deref(), Some("ctrl+alt+v"));
        assert_eq!(
            read_key(&path, KEY_LLAMA_SERVER).as_deref(),
            Some("/opt/llama-server")
        );
    }

    #[test]
    fn test_overwrites_stale_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "whisper_binary: /old/path\n").unwrap();

        merge_into(&path, &[(KEY_WHISPER_BINARY, "/new/path".to_string())]).unwrap();
        assert_eq!(read_key(&path, KEY_WHISPER_BINARY).as_deref(), Some("/new/path"));
    }

    #[test]
    fn test_rejects_non_mapping_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "- just\n- a\n- list\n").unwrap();

        let err = merge_into(&path, &[(KEY_WHISPER_BINARY, "/p".to_string())]).unwrap_err();
        assert!(matches!(err, SetupError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_empty_updates_touch_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        merge_into(&path, &[]).unwrap();
        assert!(!path.exists());
    }
}
