//! YAML parsing with located diagnostics

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse YAML text; `filename` labels the diagnostic
pub fn parse_yaml_str<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, source, filename)))
}

/// Read and parse a YAML file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml_str(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build.yaml");
        std::fs::write(&path, "name: Test\nengine: e1\n").unwrap();
        let value: serde_yml::Value = parse_yaml_file(&path).unwrap();
        assert_eq!(value["engine"].as_str(), Some("e1"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_yaml_file::<serde_yml::Value>(Path::new("/nonexistent/build.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io { .. }));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_yaml_str::<serde_yml::Value>("a: [1, 2\n", "bad.yaml").unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }
}
