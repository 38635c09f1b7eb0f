//! Name-addressable registry of every enabled analysis.
//!
//! Front-ends only know an analysis by its name and hand over JSON; the
//! catalogue deserializes the typed input, runs the calculation and returns
//! the localized [`AnalysisResult`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FinError;
use crate::report::{AnalysisCategory, AnalysisInfo, AnalysisResult, Language, ReportOptions};
use crate::FinResult;

pub type RunFn = fn(Value, &ReportOptions) -> FinResult<AnalysisResult>;

#[derive(Debug, Clone, Copy)]
pub struct AnalysisEntry {
    pub info: &'static AnalysisInfo,
    pub run: RunFn,
}

impl AnalysisEntry {
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn category(&self) -> AnalysisCategory {
        self.info.category
    }

    pub fn title(&self, lang: Language) -> &'static str {
        self.info.title(lang)
    }
}

/// Deserialize `input` into the analysis' own input type and render it.
pub(crate) fn run_typed<T: DeserializeOwned>(
    input: Value,
    options: &ReportOptions,
    report: fn(&T, &ReportOptions) -> FinResult<AnalysisResult>,
) -> FinResult<AnalysisResult> {
    let typed: T = serde_json::from_value(input)?;
    report(&typed, options)
}

/// Registry entry for a module exposing `INFO` and `report`.
macro_rules! entry {
    ($($module:ident)::+) => {
        $crate::catalogue::AnalysisEntry {
            info: &$($module)::+::INFO,
            run: |input, options| {
                $crate::catalogue::run_typed(input, options, $($module)::+::report)
            },
        }
    };
}
pub(crate) use entry;

/// All analyses compiled into this build.
#[allow(unused_mut)]
pub fn catalogue() -> Vec<AnalysisEntry> {
    let mut entries = Vec::new();
    #[cfg(feature = "fraud")]
    entries.extend(crate::fraud::entries());
    #[cfg(feature = "ratios")]
    entries.extend(crate::ratios::entries());
    #[cfg(feature = "cash_flow")]
    entries.extend(crate::cash_flow::entries());
    #[cfg(feature = "performance")]
    entries.extend(crate::performance::entries());
    #[cfg(feature = "portfolio_risk")]
    entries.extend(crate::portfolio_risk::entries());
    #[cfg(feature = "quant")]
    entries.extend(crate::quant::entries());
    entries
}

pub fn find_analysis(name: &str) -> Option<AnalysisEntry> {
    let wanted = name.trim().to_lowercase().replace('-', "_");
    catalogue().into_iter().find(|e| e.name() == wanted)
}

/// Catalogue listing as shown to callers choosing an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisListing {
    pub name: String,
    pub category: AnalysisCategory,
    pub title_en: String,
    pub title_ar: String,
    pub methodology: String,
}

pub fn list_analyses(category: Option<AnalysisCategory>) -> Vec<AnalysisListing> {
    catalogue()
        .into_iter()
        .filter(|e| category.map_or(true, |c| e.category() == c))
        .map(|e| AnalysisListing {
            name: e.info.name.to_string(),
            category: e.info.category,
            title_en: e.info.title_en.to_string(),
            title_ar: e.info.title_ar.to_string(),
            methodology: e.info.methodology.to_string(),
        })
        .collect()
}

/// Overlay an `options` object embedded in the input on top of `base`.
fn merge_options(base: &ReportOptions, embedded: Value) -> FinResult<ReportOptions> {
    let Value::Object(overrides) = embedded else {
        return Err(FinError::invalid("options", "Must be a JSON object"));
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(ref mut fields) = merged {
        fields.extend(overrides);
    }
    Ok(serde_json::from_value(merged)?)
}

/// Run an analysis by catalogue name.
pub fn run_analysis(
    name: &str,
    mut input: Value,
    options: &ReportOptions,
) -> FinResult<AnalysisResult> {
    let entry = find_analysis(name).ok_or_else(|| FinError::UnknownAnalysis(name.to_string()))?;

    let embedded = match input {
        Value::Object(ref mut fields) => fields.remove("options"),
        _ => None,
    };
    let options = match embedded {
        Some(overrides) => merge_options(options, overrides)?,
        None => options.clone(),
    };

    tracing::debug!(
        analysis = entry.name(),
        language = options.language.code(),
        "running analysis"
    );
    (entry.run)(input, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let all = catalogue();
        let names: HashSet<_> = all.iter().map(|e| e.name()).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_unknown_analysis() {
        let err = run_analysis("tea_leaf_reading", json!({}), &ReportOptions::default());
        match err.unwrap_err() {
            FinError::UnknownAnalysis(name) => assert_eq!(name, "tea_leaf_reading"),
            e => panic!("Expected UnknownAnalysis, got {e:?}"),
        }
    }

    #[test]
    fn test_embedded_options_merge() {
        let base = ReportOptions::default();
        let merged = merge_options(&base, json!({"language": "ar"})).unwrap();
        assert_eq!(merged.language, Language::Arabic);
        assert_eq!(merged.confidence_level, dec!(0.95));
        assert!(merge_options(&base, json!("ar")).is_err());
    }

    #[cfg(feature = "fraud")]
    #[test]
    fn test_run_by_name_with_embedded_language() {
        let input = json!({
            "amounts": (1..=400).map(|i| i * 37 + 11).collect::<Vec<_>>(),
            "options": {"language": "ar"}
        });
        let r = run_analysis("benford-analysis", input, &ReportOptions::default()).unwrap();
        assert_eq!(r.name, "benford_analysis");
        assert_eq!(r.language, Language::Arabic);
    }

    #[cfg(feature = "fraud")]
    #[test]
    fn test_bad_input_is_serialization_error() {
        let err = run_analysis("beneish_m_score", json!([1, 2, 3]), &ReportOptions::default());
        assert!(matches!(err.unwrap_err(), FinError::SerializationError(_)));
    }

    #[cfg(feature = "fraud")]
    #[test]
    fn test_list_by_category() {
        let fraud = list_analyses(Some(AnalysisCategory::Fraud));
        assert_eq!(fraud.len(), 6);
        assert!(fraud.iter().all(|l| l.category == AnalysisCategory::Fraud));
        assert!(list_analyses(None).len() >= fraud.len());
    }
}
