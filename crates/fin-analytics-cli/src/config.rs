use fin_analytics_core::{Language, ReportOptions};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::OutputFormat;

/// Defaults read from `--config <file.yaml>`.
///
/// ```yaml
/// language: ar
/// output: table
/// confidence_level: 0.99
/// risk_free_rate: 0.04
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub language: Option<Language>,
    pub output: Option<OutputFormat>,
    pub confidence_level: Option<Decimal>,
    pub risk_free_rate: Option<Decimal>,
}

/// Effective settings after flags are layered over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output: OutputFormat,
    pub options: ReportOptions,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        Self::parse(&contents)
            .map_err(|e| format!("Invalid config '{}': {}", path.display(), e).into())
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn resolve(
        self,
        output: Option<OutputFormat>,
        lang: Option<&str>,
    ) -> Result<Settings, Box<dyn std::error::Error>> {
        let mut options = ReportOptions::default();
        if let Some(language) = self.language {
            options.language = language;
        }
        if let Some(c) = self.confidence_level {
            options.confidence_level = c;
        }
        if let Some(r) = self.risk_free_rate {
            options.risk_free_rate = r;
        }
        if let Some(code) = lang {
            options.language = code.parse()?;
        }
        Ok(Settings {
            output: output.or(self.output).unwrap_or_default(),
            options,
        })
    }
}
