use fin_analytics_core::{
    find_analysis, list_analyses, run_analysis, AnalysisCategory, FinError, Language,
    ReportOptions,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ===========================================================================
// Fixtures
// ===========================================================================

fn statements() -> Value {
    json!({
        "revenue": "1500",
        "cogs": "900",
        "sga": "300",
        "depreciation": "50",
        "ebit": "100",
        "interest_expense": "20",
        "pretax_income": "80",
        "income_tax": "20",
        "net_income": "60",
        "cash": "120",
        "receivables": "150",
        "inventory": "100",
        "current_assets": "400",
        "ppe": "500",
        "total_assets": "1000",
        "accounts_payable": "90",
        "current_liabilities": "200",
        "short_term_debt": "50",
        "long_term_debt": "250",
        "total_liabilities": "500",
        "retained_earnings": "300",
        "shareholders_equity": "500",
        "shares_outstanding": "100",
        "operating_cash_flow": "130",
        "capital_expenditure": "40",
        "dividends_paid": "10",
        "share_price": "10"
    })
}

fn run(name: &str, input: Value, lang: Language) -> fin_analytics_core::AnalysisResult {
    run_analysis(name, input, &ReportOptions::with_language(lang)).unwrap()
}

// ===========================================================================
// Registry
// ===========================================================================

#[test]
fn test_default_build_lists_fraud_and_ratios() {
    let fraud = list_analyses(Some(AnalysisCategory::Fraud));
    let ratios = list_analyses(Some(AnalysisCategory::Ratios));
    assert_eq!(fraud.len(), 6);
    assert_eq!(ratios.len(), 6);
    assert!(list_analyses(None).len() >= 12);
}

#[test]
fn test_lookup_normalises_name() {
    let entry = find_analysis("  Liquidity-Ratios ").unwrap();
    assert_eq!(entry.name(), "liquidity_ratios");
    assert_eq!(entry.title(Language::Arabic), "نسب السيولة");
    assert!(find_analysis("horoscope").is_none());
}

#[test]
fn test_unknown_name_is_reported() {
    let err = run_analysis("horoscope", json!({}), &ReportOptions::default()).unwrap_err();
    assert!(matches!(err, FinError::UnknownAnalysis(ref n) if n == "horoscope"));
}

// ===========================================================================
// Language neutrality
// ===========================================================================

#[test]
fn test_metrics_are_language_neutral() {
    let en = run("liquidity_ratios", statements(), Language::English);
    let ar = run("liquidity_ratios", statements(), Language::Arabic);

    let keys = |r: &fin_analytics_core::AnalysisResult| {
        r.metrics.iter().map(|m| (m.key.clone(), m.value)).collect::<Vec<_>>()
    };
    assert_eq!(keys(&en), keys(&ar));
    assert_eq!(en.assessment, ar.assessment);
    assert_ne!(en.title, ar.title);
    assert_ne!(en.interpretation, ar.interpretation);
    assert_eq!(en.language, Language::English);
    assert_eq!(ar.language, Language::Arabic);
}

#[test]
fn test_embedded_options_select_language() {
    let mut input = statements();
    input["options"] = json!({"language": "ar"});
    let r = run_analysis("leverage_ratios", input, &ReportOptions::default()).unwrap();
    assert_eq!(r.language, Language::Arabic);
}

#[test]
fn test_altman_through_catalogue() {
    let input = json!({ "financials": statements(), "is_public": true });
    let r = run("altman_z_score", input, Language::English);
    // 1.2(0.2) + 1.4(0.3) + 3.3(0.1) + 0.6(1000/500) + 1.0(1.5) = 3.69
    assert_eq!(r.score, Some(rust_decimal_macros::dec!(3.69)));
    assert!(r.warnings.is_empty());
}

#[test]
fn test_result_serializes_for_front_ends() {
    let r = run("liquidity_ratios", statements(), Language::English);
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["name"], "liquidity_ratios");
    assert_eq!(v["category"], "ratios");
    assert_eq!(v["language"], "en");
    assert_eq!(v["metrics"][0]["key"], "current_ratio");
    assert_eq!(v["metrics"][0]["value"], "2");
}

// ===========================================================================
// Feature-gated domains
// ===========================================================================

#[cfg(feature = "cash_flow")]
#[test]
fn test_free_cash_flow_through_catalogue() {
    let r = run("free_cash_flow", statements(), Language::English);
    assert_eq!(r.metric_value("fcf"), Some(rust_decimal_macros::dec!(90)));
}

#[cfg(feature = "performance")]
#[test]
fn test_performance_respects_options_risk_free_rate() {
    let input = json!({
        "returns": ["0.02", "-0.01", "0.03", "0.01", "0.00", "0.02"],
        "frequency": "monthly"
    });
    let base = run_analysis("sharpe_ratio", input.clone(), &ReportOptions::default()).unwrap();
    let options = ReportOptions {
        risk_free_rate: rust_decimal_macros::dec!(0.05),
        ..Default::default()
    };
    let with_rf = run_analysis("sharpe_ratio", input, &options).unwrap();
    assert!(with_rf.metric_value("sharpe_ratio") < base.metric_value("sharpe_ratio"));
}

#[cfg(feature = "performance")]
#[test]
fn test_long_high_return_series_errors_instead_of_panicking() {
    let returns: Vec<&str> = (0..800).map(|i| if i % 2 == 0 { "0.12" } else { "0.08" }).collect();
    for name in ["sharpe_ratio", "performance_summary", "max_drawdown"] {
        let input = json!({ "returns": returns, "frequency": "daily" });
        let err = run_analysis(name, input, &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, FinError::FinancialImpossibility(_)), "{name}: {err:?}");
    }
}

#[cfg(feature = "quant")]
#[test]
fn test_seeded_monte_carlo_is_pure() {
    let input = json!({
        "initial_price": "50",
        "expected_return": "0.06",
        "volatility": "0.25",
        "horizon_years": "2",
        "simulations": 2000,
        "seed": 11
    });
    let a = run("monte_carlo_price", input.clone(), Language::English);
    let b = run("monte_carlo_price", input, Language::Arabic);
    let values = |r: &fin_analytics_core::AnalysisResult| {
        r.metrics.iter().map(|m| (m.key.clone(), m.value)).collect::<Vec<_>>()
    };
    assert_eq!(values(&a), values(&b));
    assert!(a.warnings.is_empty());
}
