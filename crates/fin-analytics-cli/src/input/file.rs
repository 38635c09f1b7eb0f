use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read an analysis input file as a generic JSON value.
///
/// `.yaml`/`.yml` files are parsed with serde_yaml, everything else as JSON.
pub fn read_input_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_input(&contents, InputFormat::from_path(&canonical))
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => InputFormat::Yaml,
            _ => InputFormat::Json,
        }
    }
}

pub fn parse_input(
    contents: &str,
    format: InputFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let value = match format {
        InputFormat::Json => serde_json::from_str(contents)?,
        InputFormat::Yaml => serde_yaml::from_str(contents)?,
    };
    Ok(value)
}

/// Resolve the path relative to the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.yaml")), InputFormat::Yaml);
        assert_eq!(InputFormat::from_path(Path::new("a.YML")), InputFormat::Yaml);
        assert_eq!(InputFormat::from_path(Path::new("a.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("input")), InputFormat::Json);
    }

    #[test]
    fn test_yaml_and_json_agree() {
        let yaml = parse_input("returns:\n  - 0.01\n  - -0.02\nfrequency: monthly\n", InputFormat::Yaml)
            .unwrap();
        let json = parse_input(
            r#"{"returns": [0.01, -0.02], "frequency": "monthly"}"#,
            InputFormat::Json,
        )
        .unwrap();
        assert_eq!(yaml, json);
        assert_eq!(json["frequency"], json!("monthly"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_input_value("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
