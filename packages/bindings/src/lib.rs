use fin_analytics_core::{AnalysisCategory, Language, ReportOptions};
use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse optional `ReportOptions` JSON, with `lang` taking precedence.
fn parse_options(options_json: Option<String>, lang: Option<String>) -> NapiResult<ReportOptions> {
    let mut options = match options_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => ReportOptions::default(),
    };
    if let Some(code) = lang {
        options.language = code.parse::<Language>().map_err(to_napi_error)?;
    }
    Ok(options)
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[napi]
pub fn list_analyses(category: Option<String>) -> NapiResult<String> {
    let category = category
        .as_deref()
        .map(str::parse::<AnalysisCategory>)
        .transpose()
        .map_err(to_napi_error)?;
    let listing = fin_analytics_core::list_analyses(category);
    serde_json::to_string(&listing).map_err(to_napi_error)
}

/// Run any analysis by catalogue name; returns the `AnalysisResult` as JSON.
#[napi]
pub fn run_analysis(
    name: String,
    input_json: String,
    lang: Option<String>,
    options_json: Option<String>,
) -> NapiResult<String> {
    let input: serde_json::Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let options = parse_options(options_json, lang)?;
    let result =
        fin_analytics_core::run_analysis(&name, input, &options).map_err(to_napi_error)?;
    serde_json::to_string(&result).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Raw calculations (typed output without the report layer)
// ---------------------------------------------------------------------------

#[napi]
pub fn altman_z_score(input_json: String) -> NapiResult<String> {
    let input: fin_analytics_core::fraud::altman::AltmanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fin_analytics_core::fraud::altman::calculate_altman_z_score(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn beneish_m_score(input_json: String) -> NapiResult<String> {
    let input: fin_analytics_core::PeriodComparison =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fin_analytics_core::fraud::beneish::calculate_beneish_m_score(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn liquidity_ratios(input_json: String) -> NapiResult<String> {
    let input: fin_analytics_core::FinancialStatements =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fin_analytics_core::ratios::liquidity::calculate_liquidity_ratios(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn free_cash_flow(input_json: String) -> NapiResult<String> {
    let input: fin_analytics_core::FinancialStatements =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fin_analytics_core::cash_flow::free_cash_flow::calculate_free_cash_flow(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn performance_metrics(input_json: String, options_json: Option<String>) -> NapiResult<String> {
    let input: fin_analytics_core::performance::metrics::PerformanceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let options = parse_options(options_json, None)?;
    let output = fin_analytics_core::performance::metrics::calculate_performance(&input, &options)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn value_at_risk(input_json: String, options_json: Option<String>) -> NapiResult<String> {
    let input: fin_analytics_core::portfolio_risk::var::TailRiskInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let options = parse_options(options_json, None)?;
    let output = fin_analytics_core::portfolio_risk::var::calculate_var(&input, &options)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn garch_volatility(input_json: String) -> NapiResult<String> {
    let input: fin_analytics_core::quant::garch::GarchInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fin_analytics_core::quant::garch::calculate_garch(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
