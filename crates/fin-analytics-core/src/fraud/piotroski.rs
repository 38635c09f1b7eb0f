//! Piotroski F-Score: nine binary signals of financial strength.
//!
//! Profitability (ROA, CFO, ΔROA, accruals), leverage and liquidity
//! (Δleverage, Δcurrent ratio, no dilution) and operating efficiency
//! (Δgross margin, Δasset turnover). 7-9 strong, 4-6 moderate, 0-3 weak.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::report::{
    AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit, ReportBuilder,
    ReportOptions,
};
use crate::stats::{safe_div, validate_positive};
use crate::types::PeriodComparison;
use crate::FinResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStrength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiotroskiSignal {
    pub key: String,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiotroskiOutput {
    pub signals: Vec<PiotroskiSignal>,
    /// Total score (0-9).
    pub f_score: u8,
    pub strength: FinancialStrength,
}

fn classify(score: u8) -> FinancialStrength {
    match score {
        7..=9 => FinancialStrength::Strong,
        4..=6 => FinancialStrength::Moderate,
        _ => FinancialStrength::Weak,
    }
}

/// Compute the Piotroski F-Score (9 binary signals, score 0-9).
pub fn calculate_piotroski_f_score(input: &PeriodComparison) -> FinResult<PiotroskiOutput> {
    let cur = &input.current;
    let pri = &input.prior;
    validate_positive(cur.total_assets, "current.total_assets")?;
    validate_positive(pri.total_assets, "prior.total_assets")?;
    validate_positive(cur.revenue, "current.revenue")?;
    validate_positive(pri.revenue, "prior.revenue")?;

    let roa = safe_div(cur.net_income, cur.total_assets, "ROA")?;
    let prior_roa = safe_div(pri.net_income, pri.total_assets, "prior ROA")?;

    let leverage = safe_div(cur.long_term_debt, cur.total_assets, "leverage")?;
    let prior_leverage = safe_div(pri.long_term_debt, pri.total_assets, "prior leverage")?;

    let current_ratio = safe_div(
        cur.current_assets,
        cur.current_liabilities,
        "current ratio",
    )?;
    let prior_current_ratio = safe_div(
        pri.current_assets,
        pri.current_liabilities,
        "prior current ratio",
    )?;

    let gross_margin = safe_div(cur.gross_profit(), cur.revenue, "gross margin")?;
    let prior_gross_margin = safe_div(pri.gross_profit(), pri.revenue, "prior gross margin")?;

    let asset_turnover = safe_div(cur.revenue, cur.total_assets, "asset turnover")?;
    let prior_asset_turnover = safe_div(pri.revenue, pri.total_assets, "prior asset turnover")?;

    let signals = vec![
        PiotroskiSignal {
            key: "roa_positive".into(),
            passed: roa > Decimal::ZERO,
        },
        PiotroskiSignal {
            key: "cfo_positive".into(),
            passed: cur.operating_cash_flow > Decimal::ZERO,
        },
        PiotroskiSignal {
            key: "roa_improving".into(),
            passed: roa > prior_roa,
        },
        PiotroskiSignal {
            key: "cfo_exceeds_net_income".into(),
            passed: cur.operating_cash_flow > cur.net_income,
        },
        PiotroskiSignal {
            key: "leverage_decreasing".into(),
            passed: leverage < prior_leverage,
        },
        PiotroskiSignal {
            key: "current_ratio_improving".into(),
            passed: current_ratio > prior_current_ratio,
        },
        PiotroskiSignal {
            key: "no_equity_dilution".into(),
            passed: cur.shares_outstanding <= pri.shares_outstanding,
        },
        PiotroskiSignal {
            key: "gross_margin_improving".into(),
            passed: gross_margin > prior_gross_margin,
        },
        PiotroskiSignal {
            key: "asset_turnover_improving".into(),
            passed: asset_turnover > prior_asset_turnover,
        },
    ];
    let f_score = signals.iter().filter(|s| s.passed).count() as u8;

    Ok(PiotroskiOutput {
        signals,
        f_score,
        strength: classify(f_score),
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "piotroski_f_score",
    category: AnalysisCategory::Fraud,
    title_en: "Piotroski F-Score Financial Strength",
    title_ar: "مؤشر بيوتروسكي F للقوة المالية",
    methodology: "Piotroski (2000) nine-signal fundamental score",
};

fn signal_label(key: &str) -> (&'static str, &'static str) {
    match key {
        "roa_positive" => ("Positive return on assets", "عائد موجب على الأصول"),
        "cfo_positive" => ("Positive operating cash flow", "تدفق نقدي تشغيلي موجب"),
        "roa_improving" => ("Improving return on assets", "تحسن العائد على الأصول"),
        "cfo_exceeds_net_income" => (
            "Operating cash flow exceeds net income",
            "التدفق النقدي التشغيلي يتجاوز صافي الدخل",
        ),
        "leverage_decreasing" => ("Falling long-term leverage", "انخفاض الرافعة طويلة الأجل"),
        "current_ratio_improving" => ("Improving current ratio", "تحسن نسبة التداول"),
        "no_equity_dilution" => ("No new shares issued", "عدم إصدار أسهم جديدة"),
        "gross_margin_improving" => ("Improving gross margin", "تحسن هامش الربح الإجمالي"),
        _ => ("Improving asset turnover", "تحسن معدل دوران الأصول"),
    }
}

pub fn report(input: &PeriodComparison, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_piotroski_f_score(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    let score = Decimal::from(out.f_score);
    b.score(score)
        .metric("f_score", "F-Score", "مؤشر F", score, MetricUnit::Score)
        .benchmark(Decimal::from(7));
    for s in &out.signals {
        let (en, ar) = signal_label(&s.key);
        let v = if s.passed { Decimal::ONE } else { Decimal::ZERO };
        b.metric(&s.key, en, ar, v, MetricUnit::Count);
    }

    let f = out.f_score;
    match out.strength {
        FinancialStrength::Strong => {
            b.assessment(Assessment::Favourable).interpret(
                format!("An F-Score of {f}/9 indicates strong and improving fundamentals."),
                format!("يشير مؤشر F البالغ {f}/9 إلى أساسيات قوية ومتحسنة."),
            );
        }
        FinancialStrength::Moderate => {
            b.assessment(Assessment::Neutral).interpret(
                format!("An F-Score of {f}/9 indicates mixed fundamentals."),
                format!("يشير مؤشر F البالغ {f}/9 إلى أساسيات متباينة."),
            );
        }
        FinancialStrength::Weak => {
            b.assessment(Assessment::Adverse).interpret(
                format!("An F-Score of {f}/9 indicates weak and deteriorating fundamentals."),
                format!("يشير مؤشر F البالغ {f}/9 إلى أساسيات ضعيفة ومتراجعة."),
            );
        }
    }

    for s in out.signals.iter().filter(|s| !s.passed) {
        let (en, ar) = signal_label(&s.key);
        b.recommend(
            format!("Address the failed signal: {}.", en.to_lowercase()),
            format!("معالجة الإشارة غير المتحققة: {ar}."),
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FinancialStatements;
    use rust_decimal_macros::dec;

    fn strong_input() -> PeriodComparison {
        PeriodComparison {
            current: FinancialStatements {
                net_income: dec!(100),
                total_assets: dec!(1000),
                operating_cash_flow: dec!(150),
                long_term_debt: dec!(200),
                current_assets: dec!(500),
                current_liabilities: dec!(250),
                shares_outstanding: dec!(100),
                revenue: dec!(1200),
                cogs: dec!(600),
                ..Default::default()
            },
            prior: FinancialStatements {
                net_income: dec!(80),
                total_assets: dec!(1000),
                operating_cash_flow: dec!(120),
                long_term_debt: dec!(250),
                current_assets: dec!(450),
                current_liabilities: dec!(250),
                shares_outstanding: dec!(100),
                revenue: dec!(1100),
                cogs: dec!(605),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_perfect_score() {
        let out = calculate_piotroski_f_score(&strong_input()).unwrap();
        assert_eq!(out.f_score, 9);
        assert_eq!(out.strength, FinancialStrength::Strong);
    }

    #[test]
    fn test_dilution_fails_signal() {
        let mut input = strong_input();
        input.current.shares_outstanding = dec!(120);
        let out = calculate_piotroski_f_score(&input).unwrap();
        assert_eq!(out.f_score, 8);
        let s = out.signals.iter().find(|s| s.key == "no_equity_dilution").unwrap();
        assert!(!s.passed);
    }

    #[test]
    fn test_weak_company() {
        let mut input = strong_input();
        std::mem::swap(&mut input.current, &mut input.prior);
        input.current.net_income = dec!(-50);
        input.current.operating_cash_flow = dec!(-60);
        input.current.shares_outstanding = dec!(130);
        let out = calculate_piotroski_f_score(&input).unwrap();
        assert!(out.f_score <= 3, "score = {}", out.f_score);
        assert_eq!(out.strength, FinancialStrength::Weak);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(7), FinancialStrength::Strong);
        assert_eq!(classify(6), FinancialStrength::Moderate);
        assert_eq!(classify(4), FinancialStrength::Moderate);
        assert_eq!(classify(3), FinancialStrength::Weak);
    }

    #[test]
    fn test_zero_current_liabilities_error() {
        let mut input = strong_input();
        input.current.current_liabilities = Decimal::ZERO;
        assert!(calculate_piotroski_f_score(&input).is_err());
    }

    #[test]
    fn test_report_lists_failed_signals() {
        let mut input = strong_input();
        input.current.shares_outstanding = dec!(120);
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert_eq!(r.score, Some(dec!(8)));
        assert_eq!(r.recommendations.len(), 1);
        assert_eq!(r.metric_value("no_equity_dilution"), Some(Decimal::ZERO));
    }
}
