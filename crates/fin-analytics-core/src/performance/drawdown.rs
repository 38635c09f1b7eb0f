//! Maximum drawdown with peak, trough and recovery points.
//!
//! Accepts either periodic returns or a price series; prices are
//! converted to simple returns first.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{compound, require_observations, simple_returns};
use crate::types::Rate;
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownInput {
    #[serde(default)]
    pub returns: Option<Vec<Rate>>,
    #[serde(default)]
    pub prices: Option<Vec<Decimal>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownOutput {
    pub max_drawdown: Rate,
    /// Index on the wealth path (0 = start) of the peak before the worst drawdown
    pub peak_index: usize,
    pub trough_index: usize,
    /// First index at which the previous peak was regained
    pub recovery_index: Option<usize>,
    pub drawdown_periods: usize,
    pub recovery_periods: Option<usize>,
    pub current_drawdown: Rate,
}

fn resolve_returns(input: &DrawdownInput) -> FinResult<Vec<Rate>> {
    match (&input.returns, &input.prices) {
        (Some(r), _) => Ok(r.clone()),
        (None, Some(p)) => {
            require_observations(p, 3, "price")?;
            if p.iter().any(|x| *x <= Decimal::ZERO) {
                return Err(FinError::invalid("prices", "Prices must be positive"));
            }
            simple_returns(p)
        }
        (None, None) => Err(FinError::invalid("returns", "Supply either returns or prices")),
    }
}

pub fn calculate_max_drawdown(input: &DrawdownInput) -> FinResult<DrawdownOutput> {
    let returns = resolve_returns(input)?;
    require_observations(&returns, 2, "return")?;

    // Wealth path starting at 1
    let mut wealth = Vec::with_capacity(returns.len() + 1);
    wealth.push(Decimal::ONE);
    for r in &returns {
        let last = wealth[wealth.len() - 1];
        wealth.push(compound(last, *r)?);
    }

    let mut peak_idx = 0;
    let mut best = (Decimal::ZERO, 0usize, 0usize);
    for (i, w) in wealth.iter().enumerate() {
        if *w > wealth[peak_idx] {
            peak_idx = i;
        }
        let peak = wealth[peak_idx];
        if peak > Decimal::ZERO {
            let dd = (peak - w) / peak;
            if dd > best.0 {
                best = (dd, peak_idx, i);
            }
        }
    }
    let (max_drawdown, peak_index, trough_index) = best;

    let recovery_index = if max_drawdown.is_zero() {
        None
    } else {
        let peak_value = wealth[peak_index];
        (trough_index..wealth.len()).find(|&i| wealth[i] >= peak_value)
    };

    let running_peak = wealth.iter().copied().max().unwrap_or(Decimal::ONE);
    let last = wealth[wealth.len() - 1];
    let current_drawdown = if running_peak > Decimal::ZERO {
        (running_peak - last) / running_peak
    } else {
        Decimal::ZERO
    };

    Ok(DrawdownOutput {
        max_drawdown,
        peak_index,
        trough_index,
        recovery_index,
        drawdown_periods: trough_index - peak_index,
        recovery_periods: recovery_index.map(|r| r - trough_index),
        current_drawdown,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "max_drawdown",
    category: AnalysisCategory::Performance,
    title_en: "Maximum Drawdown",
    title_ar: "أقصى تراجع",
    methodology: "Largest peak-to-trough decline of the compounded wealth path",
};

pub fn report(input: &DrawdownInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_max_drawdown(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.max_drawdown)
        .metric("max_drawdown", "Maximum drawdown", "أقصى تراجع", out.max_drawdown, MetricUnit::Percent)
        .benchmark(dec!(0.20))
        .metric(
            "drawdown_periods",
            "Peak to trough (periods)",
            "من القمة إلى القاع (فترات)",
            Decimal::from(out.drawdown_periods as u64),
            MetricUnit::Count,
        )
        .metric(
            "current_drawdown",
            "Current drawdown",
            "التراجع الحالي",
            out.current_drawdown,
            MetricUnit::Percent,
        );
    if let Some(r) = out.recovery_periods {
        b.metric(
            "recovery_periods",
            "Trough to recovery (periods)",
            "من القاع إلى التعافي (فترات)",
            Decimal::from(r as u64),
            MetricUnit::Count,
        );
    }

    let dd = fmt_pct(out.max_drawdown);
    let assessment = match out.max_drawdown {
        x if x < dec!(0.10) => Assessment::Favourable,
        x if x < dec!(0.20) => Assessment::Neutral,
        x if x < dec!(0.35) => Assessment::Caution,
        _ => Assessment::Adverse,
    };
    b.assessment(assessment).interpret(
        format!("The worst peak-to-trough loss was {dd} over {} periods.", out.drawdown_periods),
        format!("بلغ أسوأ تراجع من القمة إلى القاع {dd} خلال {} فترة.", out.drawdown_periods),
    );
    match out.recovery_periods {
        Some(r) => {
            b.interpret(
                format!("The previous peak was regained {r} periods after the trough."),
                format!("تمت استعادة القمة السابقة بعد {r} فترة من القاع."),
            );
        }
        None if !out.max_drawdown.is_zero() => {
            b.interpret(
                "The portfolio has not yet recovered to its previous peak.",
                "لم تتعافَ المحفظة بعد إلى قمتها السابقة.",
            );
        }
        None => {}
    }
    if out.max_drawdown >= dec!(0.20) {
        b.recommend(
            "Set a drawdown limit that triggers de-risking before losses compound.",
            "وضع حد للتراجع يفعّل خفض المخاطر قبل تفاقم الخسائر.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawdown_and_recovery_from_prices() {
        let input = DrawdownInput {
            returns: None,
            prices: Some(vec![dec!(100), dec!(120), dec!(90), dec!(96), dec!(125)]),
        };
        let out = calculate_max_drawdown(&input).unwrap();
        assert_eq!(out.max_drawdown, dec!(0.25));
        assert_eq!(out.peak_index, 1);
        assert_eq!(out.trough_index, 2);
        assert_eq!(out.recovery_index, Some(4));
        assert_eq!(out.recovery_periods, Some(2));
        assert_eq!(out.current_drawdown, Decimal::ZERO);
    }

    #[test]
    fn test_unrecovered() {
        let input = DrawdownInput {
            returns: Some(vec![dec!(0.1), dec!(-0.2), dec!(0.05)]),
            prices: None,
        };
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert!(r.metric("recovery_periods").is_none());
        assert!(r.interpretation.contains("not yet recovered"));
        assert_eq!(r.assessment, Assessment::Caution);
    }

    #[test]
    fn test_wealth_path_overflow_is_an_error() {
        let input = DrawdownInput {
            returns: Some(vec![dec!(0.10); 800]),
            prices: None,
        };
        assert!(matches!(
            calculate_max_drawdown(&input),
            Err(FinError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_needs_some_series() {
        let input = DrawdownInput {
            returns: None,
            prices: None,
        };
        assert!(calculate_max_drawdown(&input).is_err());
    }
}
