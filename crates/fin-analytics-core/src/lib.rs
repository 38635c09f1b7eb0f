//! Financial analysis catalogue.
//!
//! Every analysis takes domain data (company financials, return series,
//! portfolios), computes its metrics and renders an [`AnalysisResult`]
//! with interpretation text and recommendations in English or Arabic.

pub mod catalogue;
pub mod error;
pub mod report;
pub mod stats;
pub mod types;

#[cfg(feature = "fraud")]
pub mod fraud;

#[cfg(feature = "ratios")]
pub mod ratios;

#[cfg(feature = "cash_flow")]
pub mod cash_flow;

#[cfg(feature = "performance")]
pub mod performance;

#[cfg(feature = "portfolio_risk")]
pub mod portfolio_risk;

#[cfg(feature = "quant")]
pub mod quant;

pub use catalogue::{catalogue, find_analysis, list_analyses, run_analysis, AnalysisEntry};
pub use error::FinError;
pub use report::{
    AnalysisCategory, AnalysisResult, Assessment, Language, Metric, MetricUnit, ReportOptions,
};
pub use types::*;

/// Standard result type for all fin-analytics operations
pub type FinResult<T> = Result<T, FinError>;
