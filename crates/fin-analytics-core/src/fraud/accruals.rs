//! Accrual-based earnings quality (Sloan 1996).
//!
//! Earnings backed by accruals rather than cash are less persistent and
//! more prone to manipulation. Three measures are reported: the
//! balance-sheet accrual ratio, the cash-flow accrual ratio and the Sloan
//! ratio, which also charges investing outflows against earnings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{safe_div, validate_positive};
use crate::types::PeriodComparison;
use crate::FinResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualZone {
    Safe,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualsOutput {
    pub balance_sheet_accruals: Decimal,
    pub balance_sheet_accrual_ratio: Decimal,
    pub cash_flow_accruals: Decimal,
    pub cash_flow_accrual_ratio: Decimal,
    pub sloan_ratio: Decimal,
    pub zone: AccrualZone,
}

const SAFE_BAND: Decimal = dec!(0.10);
const DANGER_BAND: Decimal = dec!(0.25);

pub fn calculate_accruals(input: &PeriodComparison) -> FinResult<AccrualsOutput> {
    let cur = &input.current;
    let pri = &input.prior;
    validate_positive(cur.total_assets, "current.total_assets")?;
    validate_positive(pri.total_assets, "prior.total_assets")?;

    let avg_assets = (cur.total_assets + pri.total_assets) / dec!(2);

    // Non-cash working capital change, net of short-term debt, less depreciation
    let delta_ca = cur.current_assets - pri.current_assets;
    let delta_cash = cur.cash - pri.cash;
    let delta_cl = cur.current_liabilities - pri.current_liabilities;
    let delta_std = cur.short_term_debt - pri.short_term_debt;
    let balance_sheet_accruals = (delta_ca - delta_cash) - (delta_cl - delta_std) - cur.depreciation;

    let cash_flow_accruals = cur.net_income - cur.operating_cash_flow;

    let balance_sheet_accrual_ratio =
        safe_div(balance_sheet_accruals, avg_assets, "balance-sheet accrual ratio")?;
    let cash_flow_accrual_ratio =
        safe_div(cash_flow_accruals, avg_assets, "cash-flow accrual ratio")?;
    let sloan_ratio = safe_div(
        cur.net_income - cur.operating_cash_flow + cur.capital_expenditure,
        cur.total_assets,
        "Sloan ratio",
    )?;

    let zone = if sloan_ratio.abs() <= SAFE_BAND {
        AccrualZone::Safe
    } else if sloan_ratio.abs() <= DANGER_BAND {
        AccrualZone::Warning
    } else {
        AccrualZone::Danger
    };

    Ok(AccrualsOutput {
        balance_sheet_accruals,
        balance_sheet_accrual_ratio,
        cash_flow_accruals,
        cash_flow_accrual_ratio,
        sloan_ratio,
        zone,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "accruals_quality",
    category: AnalysisCategory::Fraud,
    title_en: "Accruals Quality (Sloan Ratio)",
    title_ar: "جودة المستحقات (نسبة سلون)",
    methodology: "Sloan (1996) balance-sheet and cash-flow accrual ratios",
};

pub fn report(input: &PeriodComparison, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_accruals(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.sloan_ratio)
        .metric("sloan_ratio", "Sloan ratio", "نسبة سلون", out.sloan_ratio, MetricUnit::Percent)
        .benchmark(SAFE_BAND)
        .metric(
            "balance_sheet_accrual_ratio",
            "Balance-sheet accrual ratio",
            "نسبة المستحقات من الميزانية",
            out.balance_sheet_accrual_ratio,
            MetricUnit::Percent,
        )
        .metric(
            "cash_flow_accrual_ratio",
            "Cash-flow accrual ratio",
            "نسبة المستحقات من التدفقات النقدية",
            out.cash_flow_accrual_ratio,
            MetricUnit::Percent,
        )
        .metric(
            "cash_flow_accruals",
            "Net income less operating cash flow",
            "صافي الدخل ناقص التدفق النقدي التشغيلي",
            out.cash_flow_accruals,
            MetricUnit::Currency,
        );

    let sloan = fmt_pct(out.sloan_ratio);
    match out.zone {
        AccrualZone::Safe => {
            b.assessment(Assessment::Favourable).interpret(
                format!("A Sloan ratio of {sloan} is within ±10%: earnings are largely backed by cash."),
                format!("نسبة سلون البالغة {sloan} ضمن نطاق ±10%، والأرباح مدعومة بالنقد إلى حد كبير."),
            );
        }
        AccrualZone::Warning => {
            b.assessment(Assessment::Caution).interpret(
                format!("A Sloan ratio of {sloan} shows a meaningful accrual component in earnings."),
                format!("تظهر نسبة سلون البالغة {sloan} مكوناً ملموساً من المستحقات في الأرباح."),
            );
            b.recommend(
                "Track whether the accrual build-up reverses in the next period.",
                "متابعة ما إذا كانت المستحقات المتراكمة ستنعكس في الفترة التالية.",
            );
        }
        AccrualZone::Danger => {
            b.assessment(Assessment::Adverse).interpret(
                format!("A Sloan ratio of {sloan} is beyond ±25%: earnings are dominated by accruals and are unlikely to persist."),
                format!("نسبة سلون البالغة {sloan} تتجاوز ±25%، والأرباح تهيمن عليها المستحقات ومن غير المرجح استمرارها."),
            );
            b.recommend(
                "Analyse receivable, inventory and deferred-revenue movements behind the accruals.",
                "تحليل حركة الذمم المدينة والمخزون والإيرادات المؤجلة المسببة للمستحقات.",
            )
            .recommend(
                "Base valuation on cash earnings rather than reported net income.",
                "الاعتماد في التقييم على الأرباح النقدية بدلاً من صافي الدخل المعلن.",
            );
        }
    }

    if out.cash_flow_accruals > Decimal::ZERO && out.zone != AccrualZone::Safe {
        b.interpret(
            "Reported profit exceeds operating cash flow.",
            "الربح المعلن يتجاوز التدفق النقدي التشغيلي.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FinancialStatements;

    fn base() -> PeriodComparison {
        PeriodComparison {
            current: FinancialStatements {
                total_assets: dec!(1000),
                current_assets: dec!(400),
                cash: dec!(100),
                current_liabilities: dec!(200),
                short_term_debt: dec!(50),
                depreciation: dec!(30),
                net_income: dec!(80),
                operating_cash_flow: dec!(100),
                capital_expenditure: dec!(40),
                ..Default::default()
            },
            prior: FinancialStatements {
                total_assets: dec!(1000),
                current_assets: dec!(380),
                cash: dec!(90),
                current_liabilities: dec!(190),
                short_term_debt: dec!(50),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_balance_sheet_accruals() {
        let out = calculate_accruals(&base()).unwrap();
        // (20 - 10) - (10 - 0) - 30
        assert_eq!(out.balance_sheet_accruals, dec!(-30));
        assert_eq!(out.balance_sheet_accrual_ratio, dec!(-0.03));
    }

    #[test]
    fn test_sloan_ratio_safe() {
        let out = calculate_accruals(&base()).unwrap();
        assert_eq!(out.sloan_ratio, dec!(0.02));
        assert_eq!(out.zone, AccrualZone::Safe);
    }

    #[test]
    fn test_sloan_ratio_danger() {
        let mut input = base();
        input.current.net_income = dec!(400);
        input.current.operating_cash_flow = dec!(50);
        let out = calculate_accruals(&input).unwrap();
        assert_eq!(out.zone, AccrualZone::Danger);
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
        assert!(r.interpretation.contains("exceeds operating cash flow"));
    }

    #[test]
    fn test_zero_assets_rejected() {
        let mut input = base();
        input.prior.total_assets = Decimal::ZERO;
        assert!(calculate_accruals(&input).is_err());
    }
}
