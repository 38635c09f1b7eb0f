//! Short-term solvency: can current obligations be met from current assets?

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_money, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{safe_div, validate_positive};
use crate::types::{FinancialStatements, Money, Multiple};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityOutput {
    pub current_ratio: Multiple,
    pub quick_ratio: Multiple,
    pub cash_ratio: Multiple,
    pub working_capital: Money,
    pub operating_cash_flow_ratio: Multiple,
}

const CURRENT_BENCHMARK: Decimal = dec!(1.5);
const QUICK_BENCHMARK: Decimal = dec!(1.0);

pub fn calculate_liquidity_ratios(fs: &FinancialStatements) -> FinResult<LiquidityOutput> {
    validate_positive(fs.current_liabilities, "current_liabilities")?;
    let cl = fs.current_liabilities;

    Ok(LiquidityOutput {
        current_ratio: safe_div(fs.current_assets, cl, "current ratio")?,
        quick_ratio: safe_div(fs.current_assets - fs.inventory, cl, "quick ratio")?,
        cash_ratio: safe_div(fs.cash, cl, "cash ratio")?,
        working_capital: fs.working_capital(),
        operating_cash_flow_ratio: safe_div(fs.operating_cash_flow, cl, "OCF ratio")?,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "liquidity_ratios",
    category: AnalysisCategory::Ratios,
    title_en: "Liquidity Ratios",
    title_ar: "نسب السيولة",
    methodology: "Current, quick, cash and operating-cash-flow coverage of current liabilities",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_liquidity_ratios(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.current_ratio)
        .metric("current_ratio", "Current ratio", "نسبة التداول", out.current_ratio, MetricUnit::Ratio)
        .benchmark(CURRENT_BENCHMARK)
        .metric("quick_ratio", "Quick ratio", "النسبة السريعة", out.quick_ratio, MetricUnit::Ratio)
        .benchmark(QUICK_BENCHMARK)
        .metric("cash_ratio", "Cash ratio", "نسبة النقدية", out.cash_ratio, MetricUnit::Ratio)
        .metric(
            "working_capital",
            "Working capital",
            "رأس المال العامل",
            out.working_capital,
            MetricUnit::Currency,
        )
        .metric(
            "operating_cash_flow_ratio",
            "Operating cash flow ratio",
            "نسبة التدفق النقدي التشغيلي",
            out.operating_cash_flow_ratio,
            MetricUnit::Ratio,
        );

    let cr = fmt_ratio(out.current_ratio);
    let qr = fmt_ratio(out.quick_ratio);
    if out.current_ratio >= CURRENT_BENCHMARK && out.quick_ratio >= QUICK_BENCHMARK {
        b.assessment(Assessment::Favourable).interpret(
            format!("Current ratio of {cr}x and quick ratio of {qr}x show comfortable short-term liquidity."),
            format!("نسبة التداول {cr} والنسبة السريعة {qr} تعكسان سيولة قصيرة الأجل مريحة."),
        );
    } else if out.current_ratio >= Decimal::ONE {
        b.assessment(Assessment::Neutral).interpret(
            format!("Current assets cover current liabilities ({cr}x) but the quick ratio of {qr}x leaves little buffer without inventory."),
            format!("الأصول المتداولة تغطي الخصوم المتداولة ({cr}) لكن النسبة السريعة {qr} لا تترك هامشاً كافياً دون المخزون."),
        );
        if out.quick_ratio < QUICK_BENCHMARK {
            b.recommend(
                "Reduce reliance on inventory liquidation to meet short-term obligations.",
                "تقليل الاعتماد على تسييل المخزون للوفاء بالالتزامات قصيرة الأجل.",
            );
        }
    } else {
        let assessment = if out.current_ratio >= dec!(0.8) {
            Assessment::Caution
        } else {
            Assessment::Adverse
        };
        b.assessment(assessment).interpret(
            format!("A current ratio of {cr}x means current liabilities exceed current assets."),
            format!("نسبة التداول {cr} تعني أن الخصوم المتداولة تتجاوز الأصول المتداولة."),
        );
        b.recommend(
            "Extend supplier terms or refinance short-term debt into long-term facilities.",
            "تمديد آجال الموردين أو إعادة تمويل الديون قصيرة الأجل بتسهيلات طويلة الأجل.",
        )
        .recommend(
            "Accelerate receivable collection to rebuild cash.",
            "تسريع تحصيل الذمم المدينة لإعادة بناء النقدية.",
        );
    }

    if out.working_capital < Decimal::ZERO {
        let wc = fmt_money(out.working_capital);
        b.interpret(
            format!("Working capital is negative at {wc}."),
            format!("رأس المال العامل سالب بقيمة {wc}."),
        );
    }
    if out.operating_cash_flow_ratio < Decimal::ZERO {
        b.warn("Operating cash flow is negative; liquidity is being funded from the balance sheet.");
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinError;
    use crate::report::Language;

    fn sample() -> FinancialStatements {
        FinancialStatements {
            current_assets: dec!(500),
            inventory: dec!(150),
            cash: dec!(100),
            current_liabilities: dec!(250),
            operating_cash_flow: dec!(125),
            ..Default::default()
        }
    }

    #[test]
    fn test_ratios() {
        let out = calculate_liquidity_ratios(&sample()).unwrap();
        assert_eq!(out.current_ratio, dec!(2));
        assert_eq!(out.quick_ratio, dec!(1.4));
        assert_eq!(out.cash_ratio, dec!(0.4));
        assert_eq!(out.working_capital, dec!(250));
        assert_eq!(out.operating_cash_flow_ratio, dec!(0.5));
    }

    #[test]
    fn test_zero_liabilities_rejected() {
        let mut fs = sample();
        fs.current_liabilities = Decimal::ZERO;
        match calculate_liquidity_ratios(&fs).unwrap_err() {
            FinError::InvalidInput { field, .. } => assert_eq!(field, "current_liabilities"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_shortfall_is_adverse() {
        let mut fs = sample();
        fs.current_assets = dec!(150);
        let r = report(&fs, &ReportOptions::with_language(Language::Arabic)).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
        assert_eq!(r.recommendations.len(), 2);
        assert!(r.interpretation.contains("سالب"));
    }
}
