//! The report model shared by every analysis.
//!
//! Calculations produce typed outputs; the report layer turns them into an
//! [`AnalysisResult`]: a flat list of labelled metrics, a headline
//! [`Assessment`], interpretation text and recommendations, rendered in the
//! caller's [`Language`]. Metric keys and values are language-neutral so a
//! dashboard can chart them regardless of the display language.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::FinError;
use crate::types::Rate;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Display language for titles, labels and narrative text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "ar", alias = "arabic")]
    Arabic,
}

impl Language {
    /// Pick the variant of a piece of copy for this language.
    pub fn text(self, en: impl Into<String>, ar: impl Into<String>) -> String {
        match self {
            Language::English => en.into(),
            Language::Arabic => ar.into(),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }
}

impl FromStr for Language {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ar" | "arabic" => Ok(Language::Arabic),
            other => Err(FinError::invalid(
                "language",
                format!("Unsupported language '{other}'. Use 'en' or 'ar'"),
            )),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-call options shared by all analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub language: Language,
    /// Confidence level used by tail-risk analyses (0.95 = 95%)
    pub confidence_level: Rate,
    /// Annualised risk-free rate used by performance analyses
    pub risk_free_rate: Rate,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            language: Language::English,
            confidence_level: dec!(0.95),
            risk_free_rate: Decimal::ZERO,
        }
    }
}

impl ReportOptions {
    pub fn with_language(language: Language) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Result model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisCategory {
    Fraud,
    Ratios,
    CashFlow,
    Performance,
    PortfolioRisk,
    Quantitative,
}

impl AnalysisCategory {
    pub const ALL: [AnalysisCategory; 6] = [
        AnalysisCategory::Fraud,
        AnalysisCategory::Ratios,
        AnalysisCategory::CashFlow,
        AnalysisCategory::Performance,
        AnalysisCategory::PortfolioRisk,
        AnalysisCategory::Quantitative,
    ];

    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Fraud, Language::English) => "Fraud & Distress Detection",
            (Self::Fraud, Language::Arabic) => "كشف الاحتيال والتعثر",
            (Self::Ratios, Language::English) => "Financial Ratios",
            (Self::Ratios, Language::Arabic) => "النسب المالية",
            (Self::CashFlow, Language::English) => "Cash Flow Analysis",
            (Self::CashFlow, Language::Arabic) => "تحليل التدفقات النقدية",
            (Self::Performance, Language::English) => "Performance Measurement",
            (Self::Performance, Language::Arabic) => "قياس الأداء",
            (Self::PortfolioRisk, Language::English) => "Portfolio Risk",
            (Self::PortfolioRisk, Language::Arabic) => "مخاطر المحفظة",
            (Self::Quantitative, Language::English) => "Quantitative Models",
            (Self::Quantitative, Language::Arabic) => "النماذج الكمية",
        }
    }
}

impl FromStr for AnalysisCategory {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fraud" => Ok(Self::Fraud),
            "ratios" => Ok(Self::Ratios),
            "cash_flow" | "cashflow" => Ok(Self::CashFlow),
            "performance" => Ok(Self::Performance),
            "portfolio_risk" | "risk" => Ok(Self::PortfolioRisk),
            "quantitative" | "quant" => Ok(Self::Quantitative),
            other => Err(FinError::invalid(
                "category",
                format!("Unknown category '{other}'"),
            )),
        }
    }
}

/// Headline verdict of a report, from the reader's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Favourable,
    Neutral,
    Caution,
    Adverse,
}

impl Assessment {
    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::Favourable, Language::English) => "Favourable",
            (Self::Favourable, Language::Arabic) => "إيجابي",
            (Self::Neutral, Language::English) => "Neutral",
            (Self::Neutral, Language::Arabic) => "محايد",
            (Self::Caution, Language::English) => "Caution",
            (Self::Caution, Language::Arabic) => "يستدعي الحذر",
            (Self::Adverse, Language::English) => "Adverse",
            (Self::Adverse, Language::Arabic) => "سلبي",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Ratio,
    /// Stored as a fraction (0.12 = 12%)
    Percent,
    Currency,
    Days,
    Months,
    Score,
    Count,
    Years,
    Probability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub key: String,
    pub label: String,
    pub value: Decimal,
    pub unit: MetricUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<Decimal>,
}

/// Metadata stamped on every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// The structured report every analysis returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Catalogue name, e.g. `beneish_m_score`
    pub name: String,
    pub title: String,
    pub category: AnalysisCategory,
    pub language: Language,
    pub assessment: Assessment,
    /// Headline number, when the analysis has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Decimal>,
    pub metrics: Vec<Metric>,
    pub interpretation: String,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub methodology: String,
    pub metadata: ComputationMetadata,
}

impl AnalysisResult {
    pub fn metric(&self, key: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.key == key)
    }

    pub fn metric_value(&self, key: &str) -> Option<Decimal> {
        self.metric(key).map(|m| m.value)
    }
}

/// Static description of one analysis in the catalogue.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInfo {
    pub name: &'static str,
    pub category: AnalysisCategory,
    pub title_en: &'static str,
    pub title_ar: &'static str,
    pub methodology: &'static str,
}

impl AnalysisInfo {
    pub fn title(&self, lang: Language) -> &'static str {
        match lang {
            Language::English => self.title_en,
            Language::Arabic => self.title_ar,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Incrementally assembles an [`AnalysisResult`] in one language.
pub struct ReportBuilder {
    info: &'static AnalysisInfo,
    lang: Language,
    assessment: Assessment,
    score: Option<Decimal>,
    metrics: Vec<Metric>,
    interpretation: Vec<String>,
    recommendations: Vec<String>,
    warnings: Vec<String>,
    started: Instant,
}

impl ReportBuilder {
    pub fn new(info: &'static AnalysisInfo, lang: Language) -> Self {
        tracing::debug!(analysis = info.name, language = lang.code(), "building report");
        Self {
            info,
            lang,
            assessment: Assessment::Neutral,
            score: None,
            metrics: Vec::new(),
            interpretation: Vec::new(),
            recommendations: Vec::new(),
            warnings: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn lang(&self) -> Language {
        self.lang
    }

    pub fn metric(
        &mut self,
        key: &str,
        en: &str,
        ar: &str,
        value: Decimal,
        unit: MetricUnit,
    ) -> &mut Self {
        self.metrics.push(Metric {
            key: key.to_string(),
            label: self.lang.text(en, ar),
            value,
            unit,
            benchmark: None,
        });
        self
    }

    /// Attach a reference value to the most recently added metric.
    pub fn benchmark(&mut self, value: Decimal) -> &mut Self {
        if let Some(last) = self.metrics.last_mut() {
            last.benchmark = Some(value);
        }
        self
    }

    pub fn score(&mut self, score: Decimal) -> &mut Self {
        self.score = Some(score);
        self
    }

    pub fn assessment(&mut self, assessment: Assessment) -> &mut Self {
        self.assessment = assessment;
        self
    }

    /// Append a sentence to the interpretation paragraph.
    pub fn interpret(&mut self, en: impl Into<String>, ar: impl Into<String>) -> &mut Self {
        self.interpretation.push(self.lang.text(en, ar));
        self
    }

    pub fn recommend(&mut self, en: impl Into<String>, ar: impl Into<String>) -> &mut Self {
        self.recommendations.push(self.lang.text(en, ar));
        self
    }

    /// Computation warnings are technical notes and stay in English.
    pub fn warn(&mut self, warning: impl Into<String>) -> &mut Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn warnings(&mut self, warnings: Vec<String>) -> &mut Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn finish(self) -> AnalysisResult {
        let elapsed = self.started.elapsed().as_micros() as u64;
        if !self.warnings.is_empty() {
            tracing::warn!(
                analysis = self.info.name,
                count = self.warnings.len(),
                "analysis produced warnings"
            );
        }
        tracing::debug!(analysis = self.info.name, elapsed_us = elapsed, "report finished");

        AnalysisResult {
            name: self.info.name.to_string(),
            title: self.info.title(self.lang).to_string(),
            category: self.info.category,
            language: self.lang,
            assessment: self.assessment,
            score: self.score,
            metrics: self.metrics,
            interpretation: self.interpretation.join(" "),
            recommendations: self.recommendations,
            warnings: self.warnings,
            methodology: self.info.methodology.to_string(),
            metadata: ComputationMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                computation_time_us: elapsed,
                precision: "rust_decimal_128bit".to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Number formatting for narrative text
// ---------------------------------------------------------------------------

/// Two decimal places, e.g. `1.23`.
pub fn fmt_ratio(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

/// Fraction rendered as a percentage, e.g. `0.1234` -> `12.34%`.
pub fn fmt_pct(value: Decimal) -> String {
    format!("{}%", (value * dec!(100)).round_dp(2))
}

/// Whole currency units with thousands separators, e.g. `-1,234,567`.
pub fn fmt_money(value: Decimal) -> String {
    let rounded = value.round_dp(0);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    static TEST_INFO: AnalysisInfo = AnalysisInfo {
        name: "test_analysis",
        category: AnalysisCategory::Ratios,
        title_en: "Test Analysis",
        title_ar: "تحليل تجريبي",
        methodology: "Test methodology",
    };

    #[test]
    fn test_builder_english() {
        let mut b = ReportBuilder::new(&TEST_INFO, Language::English);
        b.metric("x", "X value", "قيمة س", dec!(1.5), MetricUnit::Ratio)
            .benchmark(dec!(1))
            .score(dec!(1.5))
            .assessment(Assessment::Favourable)
            .interpret("First.", "أولاً.")
            .interpret("Second.", "ثانياً.")
            .recommend("Do it", "افعلها");
        let r = b.finish();
        assert_eq!(r.title, "Test Analysis");
        assert_eq!(r.interpretation, "First. Second.");
        assert_eq!(r.metrics[0].label, "X value");
        assert_eq!(r.metrics[0].benchmark, Some(dec!(1)));
        assert_eq!(r.metric_value("x"), Some(dec!(1.5)));
        assert_eq!(r.recommendations, vec!["Do it".to_string()]);
    }

    #[test]
    fn test_builder_arabic() {
        let mut b = ReportBuilder::new(&TEST_INFO, Language::Arabic);
        b.metric("x", "X value", "قيمة س", dec!(1), MetricUnit::Ratio)
            .interpret("First.", "أولاً.");
        let r = b.finish();
        assert_eq!(r.title, "تحليل تجريبي");
        assert_eq!(r.metrics[0].label, "قيمة س");
        assert_eq!(r.metrics[0].key, "x");
        assert_eq!(r.interpretation, "أولاً.");
        assert_eq!(r.language, Language::Arabic);
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("AR".parse::<Language>().unwrap(), Language::Arabic);
        assert_eq!("english".parse::<Language>().unwrap(), Language::English);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serde_codes() {
        assert_eq!(serde_json::to_string(&Language::Arabic).unwrap(), "\"ar\"");
        let l: Language = serde_json::from_str("\"arabic\"").unwrap();
        assert_eq!(l, Language::Arabic);
    }

    #[test]
    fn test_options_defaults() {
        let o: ReportOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(o, ReportOptions::default());
        assert_eq!(o.confidence_level, dec!(0.95));
    }

    #[test]
    fn test_fmt_helpers() {
        assert_eq!(fmt_ratio(dec!(1.23456)), "1.23");
        assert_eq!(fmt_pct(dec!(0.1234)), "12.34%");
        assert_eq!(fmt_money(dec!(1234567.4)), "1,234,567");
        assert_eq!(fmt_money(dec!(-1234)), "-1,234");
        assert_eq!(fmt_money(dec!(999)), "999");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "portfolio-risk".parse::<AnalysisCategory>().unwrap(),
            AnalysisCategory::PortfolioRisk
        );
        assert!("astrology".parse::<AnalysisCategory>().is_err());
    }
}
