//! Capital structure and debt-servicing capacity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{safe_div, validate_positive};
use crate::types::{FinancialStatements, Multiple, Rate};
use crate::FinResult;

/// Coverage reported when there is no interest to cover.
const COVERAGE_CAP: Decimal = dec!(999);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageOutput {
    pub debt_to_equity: Option<Multiple>,
    pub debt_to_assets: Rate,
    pub equity_multiplier: Option<Multiple>,
    pub interest_coverage: Multiple,
    pub net_debt_to_ebitda: Option<Multiple>,
    pub warnings: Vec<String>,
}

pub fn calculate_leverage_ratios(fs: &FinancialStatements) -> FinResult<LeverageOutput> {
    validate_positive(fs.total_assets, "total_assets")?;
    let mut warnings = Vec::new();
    let debt = fs.total_debt();

    let (debt_to_equity, equity_multiplier) = if fs.shareholders_equity > Decimal::ZERO {
        (
            Some(debt / fs.shareholders_equity),
            Some(fs.total_assets / fs.shareholders_equity),
        )
    } else {
        warnings.push("Shareholders' equity is not positive; equity-based ratios omitted.".into());
        (None, None)
    };

    let interest_coverage = if fs.interest_expense.is_zero() {
        warnings.push("Interest expense is zero; coverage capped at 999x.".into());
        COVERAGE_CAP
    } else {
        safe_div(fs.ebit, fs.interest_expense, "EBIT / interest")?
    };

    let ebitda = fs.ebitda();
    let net_debt_to_ebitda = if ebitda > Decimal::ZERO {
        Some(fs.net_debt() / ebitda)
    } else {
        warnings.push("EBITDA is not positive; net debt / EBITDA omitted.".into());
        None
    };

    Ok(LeverageOutput {
        debt_to_equity,
        debt_to_assets: safe_div(debt, fs.total_assets, "debt / assets")?,
        equity_multiplier,
        interest_coverage,
        net_debt_to_ebitda,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "leverage_ratios",
    category: AnalysisCategory::Ratios,
    title_en: "Leverage & Solvency Ratios",
    title_ar: "نسب الرافعة المالية والملاءة",
    methodology: "Balance-sheet gearing and EBIT interest coverage",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_leverage_ratios(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    if let Some(de) = out.debt_to_equity {
        b.score(de)
            .metric("debt_to_equity", "Debt to equity", "الدين إلى حقوق الملكية", de, MetricUnit::Ratio)
            .benchmark(dec!(1));
    }
    b.metric("debt_to_assets", "Debt to assets", "الدين إلى الأصول", out.debt_to_assets, MetricUnit::Percent);
    if let Some(em) = out.equity_multiplier {
        b.metric("equity_multiplier", "Equity multiplier", "مضاعف حقوق الملكية", em, MetricUnit::Ratio);
    }
    b.metric(
        "interest_coverage",
        "Interest coverage",
        "تغطية الفوائد",
        out.interest_coverage,
        MetricUnit::Ratio,
    )
    .benchmark(dec!(3));
    if let Some(nd) = out.net_debt_to_ebitda {
        b.metric("net_debt_to_ebitda", "Net debt / EBITDA", "صافي الدين إلى EBITDA", nd, MetricUnit::Ratio)
            .benchmark(dec!(3));
    }

    let cov = fmt_ratio(out.interest_coverage);
    let assessment = match out.debt_to_equity {
        None => Assessment::Adverse,
        Some(de) if de > dec!(2) || out.interest_coverage < dec!(1.5) => Assessment::Adverse,
        Some(de) if de > Decimal::ONE || out.interest_coverage < dec!(3) => Assessment::Caution,
        Some(de) if de > dec!(0.5) => Assessment::Neutral,
        Some(_) => Assessment::Favourable,
    };
    b.assessment(assessment);

    match out.debt_to_equity {
        Some(de) => {
            let de = fmt_ratio(de);
            b.interpret(
                format!("Debt stands at {de}x equity and EBIT covers interest {cov} times."),
                format!("يبلغ الدين {de} ضعف حقوق الملكية ويغطي الربح التشغيلي الفوائد {cov} مرة."),
            );
        }
        None => {
            b.interpret(
                "Equity is negative or zero, so the company is balance-sheet insolvent.",
                "حقوق الملكية سالبة أو صفرية، ما يعني عجز الميزانية عن الملاءة.",
            );
        }
    }

    if matches!(assessment, Assessment::Adverse | Assessment::Caution) {
        b.recommend(
            "Prioritise debt reduction from free cash flow before new borrowing.",
            "إعطاء الأولوية لخفض الدين من التدفق النقدي الحر قبل أي اقتراض جديد.",
        );
    }
    if out.interest_coverage < dec!(1.5) {
        b.recommend(
            "Negotiate covenant headroom or extend maturities; coverage is close to default territory.",
            "التفاوض على هامش التعهدات أو تمديد آجال الاستحقاق؛ التغطية قريبة من منطقة التعثر.",
        );
    }
    if out.net_debt_to_ebitda.is_some_and(|x| x > dec!(4)) {
        b.interpret(
            "Net debt exceeds four years of EBITDA.",
            "صافي الدين يتجاوز أربع سنوات من EBITDA.",
        );
    }
    b.warnings(out.warnings);

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FinancialStatements {
        FinancialStatements {
            total_assets: dec!(2000),
            shareholders_equity: dec!(800),
            short_term_debt: dec!(200),
            long_term_debt: dec!(600),
            cash: dec!(100),
            ebit: dec!(300),
            depreciation: dec!(50),
            interest_expense: dec!(60),
            ..Default::default()
        }
    }

    #[test]
    fn test_ratios() {
        let out = calculate_leverage_ratios(&sample()).unwrap();
        assert_eq!(out.debt_to_equity, Some(dec!(1)));
        assert_eq!(out.debt_to_assets, dec!(0.4));
        assert_eq!(out.equity_multiplier, Some(dec!(2.5)));
        assert_eq!(out.interest_coverage, dec!(5));
        assert_eq!(out.net_debt_to_ebitda, Some(dec!(2)));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_no_interest_caps_coverage() {
        let mut fs = sample();
        fs.interest_expense = Decimal::ZERO;
        let out = calculate_leverage_ratios(&fs).unwrap();
        assert_eq!(out.interest_coverage, COVERAGE_CAP);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_negative_equity_adverse() {
        let mut fs = sample();
        fs.shareholders_equity = dec!(-50);
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
        assert!(r.score.is_none());
    }

    #[test]
    fn test_moderate_gearing_neutral() {
        let mut fs = sample();
        fs.short_term_debt = Decimal::ZERO;
        fs.long_term_debt = dec!(600);
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Neutral);
    }
}
