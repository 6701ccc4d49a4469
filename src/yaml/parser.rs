//! YAML parsing and writing with error handling

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content into a typed value with nice error messages
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|e| {
        YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename))
    })
}

/// Parse YAML from a file path
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();
    parse_yaml(&content, &filename)
}

/// Serialize a value and write it, creating parent directories as needed
pub fn write_yaml_file<T: Serialize>(path: &Path, value: &T) -> Result<(), YamlError> {
    let content = serde_yml::to_string(value).map_err(|e| YamlError::Serialize {
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct TestStruct {
        name: String,
        value: i32,
    }

    #[test]
    fn test_parse_valid_yaml() {
        let yaml = "name: test\nvalue: 42";
        let result: TestStruct = parse_yaml(yaml, "test.yaml").unwrap();
        assert_eq!(result.name, "test");
        assert_eq!(result.value, 42);
    }

    #[test]
    fn test_parse_invalid_yaml_returns_error() {
        let yaml = "name: test\n  invalid indentation";
        let result: Result<TestStruct, _> = parse_yaml(yaml, "test.yaml");
        assert!(matches!(result, Err(YamlError::Syntax(_))));
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/value.yaml");
        let value = TestStruct {
            name: "strike".into(),
            value: 7,
        };
        write_yaml_file(&path, &value).unwrap();
        let back: TestStruct = parse_yaml_file(&path).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result: Result<TestStruct, _> = parse_yaml_file(&dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(YamlError::Io(_))));
    }
}
