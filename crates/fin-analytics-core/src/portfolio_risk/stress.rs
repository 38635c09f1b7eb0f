//! Scenario stress testing.
//!
//! Each scenario maps shocks to symbols or asset classes. A position takes
//! the shock for its symbol, then for its asset class, then the scenario's
//! default shock.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_money, fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::safe_div;
use crate::types::{Money, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressPosition {
    pub symbol: String,
    pub value: Money,
    /// e.g. "equity", "fixed_income", "credit", "commodity", "real_estate", "cash"
    #[serde(default)]
    pub asset_class: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressScenario {
    pub name: String,
    /// Fractional price shocks keyed by symbol or asset class
    #[serde(default)]
    pub shocks: BTreeMap<String, Rate>,
    #[serde(default)]
    pub default_shock: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestInput {
    pub positions: Vec<StressPosition>,
    /// Built-in historical scenarios are used when empty
    #[serde(default)]
    pub scenarios: Vec<StressScenario>,
    /// Loss fraction above which a scenario is reported as a breach
    #[serde(default)]
    pub loss_limit: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionImpact {
    pub symbol: String,
    pub shock: Rate,
    pub pnl: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub pnl: Money,
    pub pnl_pct: Rate,
    pub breaches_limit: bool,
    pub impacts: Vec<PositionImpact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestOutput {
    pub portfolio_value: Money,
    pub results: Vec<ScenarioResult>,
    pub worst_case: ScenarioResult,
    pub average_pnl_pct: Rate,
    pub warnings: Vec<String>,
}

fn scenario(name: &str, shocks: &[(&str, Decimal)]) -> StressScenario {
    StressScenario {
        name: name.into(),
        shocks: shocks.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        default_shock: Decimal::ZERO,
    }
}

/// Historical episodes expressed as asset-class price moves.
pub fn builtin_scenarios() -> Vec<StressScenario> {
    vec![
        scenario(
            "GFC 2008",
            &[
                ("equity", dec!(-0.38)),
                ("credit", dec!(-0.15)),
                ("fixed_income", dec!(0.05)),
                ("commodity", dec!(-0.35)),
                ("real_estate", dec!(-0.30)),
            ],
        ),
        scenario(
            "COVID March 2020",
            &[
                ("equity", dec!(-0.34)),
                ("credit", dec!(-0.10)),
                ("fixed_income", dec!(0.03)),
                ("commodity", dec!(-0.25)),
                ("real_estate", dec!(-0.20)),
            ],
        ),
        scenario(
            "Dot-Com 2000",
            &[
                ("equity", dec!(-0.49)),
                ("fixed_income", dec!(0.08)),
                ("credit", dec!(-0.05)),
            ],
        ),
        scenario(
            "Rate Shock +300bp",
            &[
                ("equity", dec!(-0.12)),
                ("fixed_income", dec!(-0.15)),
                ("credit", dec!(-0.10)),
                ("real_estate", dec!(-0.18)),
            ],
        ),
    ]
}

fn shock_for(position: &StressPosition, scenario: &StressScenario) -> Rate {
    scenario
        .shocks
        .get(&position.symbol)
        .or_else(|| {
            position
                .asset_class
                .as_ref()
                .and_then(|class| scenario.shocks.get(class))
        })
        .copied()
        .unwrap_or(scenario.default_shock)
}

pub fn calculate_stress_test(input: &StressTestInput) -> FinResult<StressTestOutput> {
    if input.positions.is_empty() {
        return Err(FinError::InsufficientData(
            "At least one position required".into(),
        ));
    }
    for p in &input.positions {
        if p.value < Decimal::ZERO {
            return Err(FinError::invalid(
                &format!("positions.{}.value", p.symbol),
                "Position value must be non-negative",
            ));
        }
    }
    let mut warnings = Vec::new();
    let portfolio_value: Money = input.positions.iter().map(|p| p.value).sum();
    let limit = input.loss_limit.unwrap_or(dec!(0.10));

    let scenarios = if input.scenarios.is_empty() {
        warnings.push("No scenarios supplied; built-in historical scenarios applied.".into());
        builtin_scenarios()
    } else {
        input.scenarios.clone()
    };

    let mut results = Vec::with_capacity(scenarios.len());
    for s in &scenarios {
        if s.shocks.values().chain([&s.default_shock]).any(|v| *v < Decimal::NEGATIVE_ONE) {
            return Err(FinError::invalid(
                &format!("scenarios.{}.shocks", s.name),
                "A price cannot fall by more than 100%",
            ));
        }
        let impacts: Vec<PositionImpact> = input
            .positions
            .iter()
            .map(|p| {
                let shock = shock_for(p, s);
                PositionImpact {
                    symbol: p.symbol.clone(),
                    shock,
                    pnl: p.value * shock,
                }
            })
            .collect();
        let pnl: Money = impacts.iter().map(|i| i.pnl).sum();
        let pnl_pct = safe_div(pnl, portfolio_value, "stress P&L (portfolio value)")?;
        results.push(ScenarioResult {
            scenario: s.name.clone(),
            pnl,
            pnl_pct,
            breaches_limit: -pnl_pct > limit,
            impacts,
        });
    }

    let unshocked: Vec<&str> = input
        .positions
        .iter()
        .filter(|p| results.iter().all(|r| r.impacts.iter().any(|i| i.symbol == p.symbol && i.shock.is_zero())))
        .map(|p| p.symbol.as_str())
        .collect();
    if !unshocked.is_empty() {
        warnings.push(format!("No scenario shocks: {}.", unshocked.join(", ")));
    }

    let worst_case = results
        .iter()
        .min_by(|a, b| a.pnl.cmp(&b.pnl))
        .cloned()
        .ok_or_else(|| FinError::InsufficientData("At least one scenario required".into()))?;
    let average_pnl_pct =
        results.iter().map(|r| r.pnl_pct).sum::<Decimal>() / Decimal::from(results.len() as u64);

    Ok(StressTestOutput {
        portfolio_value,
        results,
        worst_case,
        average_pnl_pct,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "stress_test",
    category: AnalysisCategory::PortfolioRisk,
    title_en: "Portfolio Stress Test",
    title_ar: "اختبار الضغط للمحفظة",
    methodology: "Deterministic scenario shocks by symbol and asset class",
};

pub fn report(input: &StressTestInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_stress_test(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);
    let worst = &out.worst_case;

    b.score(worst.pnl_pct)
        .metric("worst_case_pnl", "Worst-case P&L", "أسوأ ربح/خسارة", worst.pnl, MetricUnit::Currency)
        .metric("worst_case_pnl_pct", "Worst-case P&L (%)", "أسوأ ربح/خسارة (%)", worst.pnl_pct, MetricUnit::Percent)
        .metric("average_pnl_pct", "Average scenario P&L", "متوسط ربح/خسارة السيناريوهات", out.average_pnl_pct, MetricUnit::Percent)
        .metric("portfolio_value", "Portfolio value", "قيمة المحفظة", out.portfolio_value, MetricUnit::Currency);
    for (i, r) in out.results.iter().enumerate() {
        b.metric(
            &format!("scenario_{}", i + 1),
            &r.scenario,
            &r.scenario,
            r.pnl_pct,
            MetricUnit::Percent,
        );
    }

    let loss = fmt_pct(-worst.pnl_pct);
    let amount = fmt_money(-worst.pnl);
    b.interpret(
        format!("The worst scenario, {}, would cost {loss} of the portfolio ({amount}).", worst.scenario),
        format!("أسوأ سيناريو هو {} وقد يكلف {loss} من المحفظة ({amount}).", worst.scenario),
    );

    let assessment = match -worst.pnl_pct {
        v if v < dec!(0.10) => Assessment::Favourable,
        v if v < dec!(0.20) => Assessment::Neutral,
        v if v < dec!(0.35) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment);

    let breaches = out.results.iter().filter(|r| r.breaches_limit).count();
    if breaches > 0 {
        b.interpret(
            format!("{breaches} of {} scenarios breach the loss limit.", out.results.len()),
            format!("{breaches} من أصل {} سيناريوهات تتجاوز حد الخسارة.", out.results.len()),
        );
        if let Some(top) = worst.impacts.iter().min_by(|a, b| a.pnl.cmp(&b.pnl)) {
            b.recommend(
                format!("Hedge or reduce {}, the largest loss driver under {}.", top.symbol, worst.scenario),
                format!("التحوط أو تقليص {}، أكبر مصدر للخسارة في سيناريو {}.", top.symbol, worst.scenario),
            );
        }
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<StressPosition> {
        vec![
            StressPosition { symbol: "SPY".into(), value: dec!(600000), asset_class: Some("equity".into()) },
            StressPosition { symbol: "AGG".into(), value: dec!(300000), asset_class: Some("fixed_income".into()) },
            StressPosition { symbol: "GLD".into(), value: dec!(100000), asset_class: Some("commodity".into()) },
        ]
    }

    #[test]
    fn test_symbol_overrides_class() {
        let input = StressTestInput {
            positions: positions(),
            scenarios: vec![StressScenario {
                name: "custom".into(),
                shocks: [("equity".to_string(), dec!(-0.20)), ("SPY".to_string(), dec!(-0.10))]
                    .into_iter()
                    .collect(),
                default_shock: dec!(-0.05),
            }],
            loss_limit: None,
        };
        let out = calculate_stress_test(&input).unwrap();
        let r = &out.results[0];
        // -60000 (SPY) - 15000 (AGG default) - 5000 (GLD default)
        assert_eq!(r.pnl, dec!(-80000));
        assert_eq!(r.pnl_pct, dec!(-0.08));
        assert!(!r.breaches_limit);
    }

    #[test]
    fn test_builtin_scenarios_worst_case() {
        let input = StressTestInput { positions: positions(), scenarios: vec![], loss_limit: None };
        let out = calculate_stress_test(&input).unwrap();
        assert_eq!(out.results.len(), builtin_scenarios().len());
        assert!(out.results.iter().all(|r| r.pnl >= out.worst_case.pnl));
        // Dot-Com: -294000 + 24000 + 0
        assert_eq!(out.worst_case.scenario, "Dot-Com 2000");
        assert_eq!(out.worst_case.pnl, dec!(-270000));
        assert!(out.warnings.iter().any(|w| w.contains("built-in")));
    }

    #[test]
    fn test_rejects_impossible_shock() {
        let input = StressTestInput {
            positions: positions(),
            scenarios: vec![StressScenario {
                name: "bad".into(),
                shocks: BTreeMap::new(),
                default_shock: dec!(-1.5),
            }],
            loss_limit: None,
        };
        assert!(calculate_stress_test(&input).is_err());
    }

    #[test]
    fn test_report_flags_breaches() {
        let input = StressTestInput { positions: positions(), scenarios: vec![], loss_limit: None };
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Caution);
        assert!(r.recommendations.iter().any(|s| s.contains("SPY")));
    }
}
