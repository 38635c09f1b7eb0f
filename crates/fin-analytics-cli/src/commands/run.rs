use clap::Args;
use fin_analytics_core::ReportOptions;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::Settings;
use crate::input;

/// Arguments for running one analysis
#[derive(Args)]
pub struct RunArgs {
    /// Analysis name as shown by `fina list` (e.g. beneish_m_score)
    pub name: String,

    /// Path to a JSON or YAML input file; JSON is read from stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Confidence level for tail-risk analyses (e.g. 0.99)
    #[arg(long)]
    pub confidence: Option<Decimal>,

    /// Annualised risk-free rate for performance analyses
    #[arg(long, allow_hyphen_values = true)]
    pub risk_free_rate: Option<Decimal>,
}

pub fn run_analysis(args: RunArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let input_value = match args.input.as_deref() {
        Some(path) => {
            tracing::debug!(path, "reading input file");
            input::file::read_input_value(path)?
        }
        None => input::stdin::read_stdin()?
            .ok_or("No input provided. Use --input <file> or pipe JSON on stdin")?,
    };

    let mut options = settings.options.clone();
    if let Some(c) = args.confidence {
        options.confidence_level = c;
    }
    if let Some(r) = args.risk_free_rate {
        options.risk_free_rate = r;
    }

    execute(&args.name, input_value, &options)
}

fn execute(
    name: &str,
    input_value: Value,
    options: &ReportOptions,
) -> Result<Value, Box<dyn std::error::Error>> {
    let result = fin_analytics_core::run_analysis(name, input_value, options)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fin_analytics_core::Language;
    use serde_json::json;

    fn amounts() -> Value {
        json!({ "amounts": (1..=300).map(|i| i * 53 + 7).collect::<Vec<_>>() })
    }

    #[test]
    fn test_execute_renders_report_json() {
        let out = execute("benford_analysis", amounts(), &ReportOptions::default()).unwrap();
        assert_eq!(out["name"], "benford_analysis");
        assert_eq!(out["language"], "en");
        assert!(out["metrics"].as_array().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn test_execute_in_arabic() {
        let options = ReportOptions::with_language(Language::Arabic);
        let out = execute("benford_analysis", amounts(), &options).unwrap();
        assert_eq!(out["language"], "ar");
    }

    #[test]
    fn test_unknown_analysis_is_an_error() {
        let err = execute("crystal_ball", json!({}), &ReportOptions::default()).unwrap_err();
        assert!(err.to_string().contains("crystal_ball"));
    }
}
