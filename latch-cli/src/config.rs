//! Input file loading
//!
//! Reads configurations and recorded events from disk with enough context
//! in the error to tell which file was at fault.

use anyhow::{Context, Result};
use latch_core::{Configuration, InterceptorRequest, Merge};
use std::fs;
use std::path::Path;

/// Reads a YAML pipeline configuration
pub fn load_configuration(path: &Path) -> Result<Configuration> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    Configuration::from_yaml(&yaml)
        .with_context(|| format!("Failed to parse config file {:?}", path))
}

/// Reads `base` and layers the optional `overlay` on top of it
pub fn load_layered(base: &Path, overlay: Option<&Path>) -> Result<Configuration> {
    let mut config = load_configuration(base)?;
    if let Some(overlay) = overlay {
        config.merge(&load_configuration(overlay)?);
    }
    Ok(config)
}

/// Reads a recorded interceptor request (JSON)
pub fn load_request(path: &Path) -> Result<InterceptorRequest> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse event file {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_layered_merges_overlay() {
        let base = file(
            "defaults:\n  metadata:\n    namespace: ci\ntriggers:\n  - name: push\n    pipelines:\n      - name: build\n",
        );
        let overlay = file("defaults:\n  metadata:\n    namespace: staging\n");

        let config = load_layered(base.path(), Some(overlay.path())).unwrap();

        assert_eq!(config.defaults.metadata.namespace, "staging");
        assert_eq!(config.triggers.len(), 1);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_configuration(Path::new("/nonexistent/latch.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/latch.yaml"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let bad = file("trigger: []\n");
        assert!(load_configuration(bad.path()).is_err());
    }

    #[test]
    fn test_load_request() {
        let event = file(r#"{"body": "{\"action\":\"push\"}", "header": {"X-Event": ["push"]}}"#);

        let request = load_request(event.path()).unwrap();

        assert_eq!(request.header["X-Event"], ["push"]);
        assert!(request.unmarshal_body().unwrap().contains_key("action"));
    }
}
