//! Margin and return ratios.
//!
//! ROIC uses NOPAT = EBIT x (1 - effective tax rate) over invested capital
//! (equity + debt - cash).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_pct, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{safe_div, validate_positive};
use crate::types::{FinancialStatements, Rate};
use crate::FinResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitabilityOutput {
    pub gross_margin: Rate,
    pub operating_margin: Rate,
    pub net_margin: Rate,
    pub ebitda_margin: Rate,
    pub roa: Option<Rate>,
    pub roe: Option<Rate>,
    pub roic: Option<Rate>,
    pub warnings: Vec<String>,
}

pub fn calculate_profitability_ratios(fs: &FinancialStatements) -> FinResult<ProfitabilityOutput> {
    validate_positive(fs.revenue, "revenue")?;
    let mut warnings = Vec::new();

    let roa = if fs.total_assets > Decimal::ZERO {
        Some(fs.net_income / fs.total_assets)
    } else {
        warnings.push("Total assets not supplied; ROA omitted.".to_string());
        None
    };
    let roe = if fs.shareholders_equity > Decimal::ZERO {
        Some(fs.net_income / fs.shareholders_equity)
    } else {
        warnings.push("Shareholders' equity is not positive; ROE omitted.".to_string());
        None
    };
    let invested_capital = fs.shareholders_equity + fs.total_debt() - fs.cash;
    let roic = if invested_capital > Decimal::ZERO {
        let nopat = fs.ebit * (Decimal::ONE - fs.effective_tax_rate());
        Some(nopat / invested_capital)
    } else {
        warnings.push("Invested capital is not positive; ROIC omitted.".to_string());
        None
    };

    Ok(ProfitabilityOutput {
        gross_margin: safe_div(fs.gross_profit(), fs.revenue, "gross margin")?,
        operating_margin: safe_div(fs.ebit, fs.revenue, "operating margin")?,
        net_margin: safe_div(fs.net_income, fs.revenue, "net margin")?,
        ebitda_margin: safe_div(fs.ebitda(), fs.revenue, "EBITDA margin")?,
        roa,
        roe,
        roic,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "profitability_ratios",
    category: AnalysisCategory::Ratios,
    title_en: "Profitability Ratios",
    title_ar: "نسب الربحية",
    methodology: "Margins on revenue; ROA, ROE and ROIC on period-end balances",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_profitability_ratios(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.net_margin)
        .metric("gross_margin", "Gross margin", "هامش الربح الإجمالي", out.gross_margin, MetricUnit::Percent)
        .metric(
            "operating_margin",
            "Operating margin",
            "هامش الربح التشغيلي",
            out.operating_margin,
            MetricUnit::Percent,
        )
        .metric("net_margin", "Net margin", "هامش صافي الربح", out.net_margin, MetricUnit::Percent)
        .benchmark(dec!(0.10))
        .metric("ebitda_margin", "EBITDA margin", "هامش EBITDA", out.ebitda_margin, MetricUnit::Percent);
    if let Some(roa) = out.roa {
        b.metric("roa", "Return on assets", "العائد على الأصول", roa, MetricUnit::Percent)
            .benchmark(dec!(0.05));
    }
    if let Some(roe) = out.roe {
        b.metric("roe", "Return on equity", "العائد على حقوق الملكية", roe, MetricUnit::Percent)
            .benchmark(dec!(0.15));
    }
    if let Some(roic) = out.roic {
        b.metric("roic", "Return on invested capital", "العائد على رأس المال المستثمر", roic, MetricUnit::Percent);
    }

    let nm = fmt_pct(out.net_margin);
    match out.net_margin {
        m if m < Decimal::ZERO => {
            b.assessment(Assessment::Adverse).interpret(
                format!("The company is loss-making with a net margin of {nm}."),
                format!("الشركة تحقق خسائر بهامش صافي قدره {nm}."),
            );
            b.recommend(
                "Review pricing and the cost base to restore profitability.",
                "مراجعة التسعير وهيكل التكاليف لاستعادة الربحية.",
            );
        }
        m if m < dec!(0.05) => {
            b.assessment(Assessment::Caution).interpret(
                format!("A net margin of {nm} leaves little room to absorb cost shocks."),
                format!("هامش صافي قدره {nm} يترك مجالاً محدوداً لاستيعاب صدمات التكاليف."),
            );
            b.recommend(
                "Identify the cost lines growing faster than revenue.",
                "تحديد بنود التكاليف التي تنمو أسرع من الإيرادات.",
            );
        }
        m if m < dec!(0.15) => {
            b.assessment(Assessment::Neutral).interpret(
                format!("A net margin of {nm} is in line with a typical industrial business."),
                format!("هامش صافي قدره {nm} يتماشى مع المعتاد في الأنشطة الصناعية."),
            );
        }
        _ => {
            b.assessment(Assessment::Favourable).interpret(
                format!("A net margin of {nm} indicates strong pricing power."),
                format!("هامش صافي قدره {nm} يدل على قدرة تسعيرية قوية."),
            );
        }
    }

    if let (Some(roe), Some(roa)) = (out.roe, out.roa) {
        if roa > Decimal::ZERO && roe > roa * dec!(3) {
            b.interpret(
                format!("ROE of {} is well above ROA, so returns lean on leverage.", fmt_pct(roe)),
                format!("العائد على حقوق الملكية {} يفوق العائد على الأصول بكثير، ما يعني الاعتماد على الرافعة المالية.", fmt_pct(roe)),
            );
        }
    }
    if out.gross_margin > Decimal::ZERO && out.operating_margin < out.gross_margin * dec!(0.25) {
        b.recommend(
            "Operating expenses absorb most of the gross profit; review overhead efficiency.",
            "المصاريف التشغيلية تستهلك معظم الربح الإجمالي؛ يجب مراجعة كفاءة النفقات العامة.",
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
            revenue: dec!(1000),
            cogs: dec!(600),
            ebit: dec!(200),
            depreciation: dec!(50),
            pretax_income: dec!(180),
            income_tax: dec!(45),
            net_income: dec!(135),
            total_assets: dec!(1500),
            shareholders_equity: dec!(900),
            long_term_debt: dec!(400),
            cash: dec!(100),
            ..Default::default()
        }
    }

    #[test]
    fn test_margins() {
        let out = calculate_profitability_ratios(&sample()).unwrap();
        assert_eq!(out.gross_margin, dec!(0.4));
        assert_eq!(out.operating_margin, dec!(0.2));
        assert_eq!(out.net_margin, dec!(0.135));
        assert_eq!(out.ebitda_margin, dec!(0.25));
        assert_eq!(out.roa, Some(dec!(0.09)));
        assert_eq!(out.roe, Some(dec!(0.15)));
    }

    #[test]
    fn test_roic() {
        let out = calculate_profitability_ratios(&sample()).unwrap();
        // NOPAT 200 * 0.75 = 150 over 900 + 400 - 100
        assert_eq!(out.roic, Some(dec!(0.125)));
    }

    #[test]
    fn test_negative_equity_omits_roe() {
        let mut fs = sample();
        fs.shareholders_equity = dec!(-10);
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert!(r.metric("roe").is_none());
        assert!(!r.warnings.is_empty());
    }

    #[test]
    fn test_loss_making_is_adverse() {
        let mut fs = sample();
        fs.net_income = dec!(-20);
        let r = report(&fs, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
    }

    #[test]
    fn test_zero_revenue_rejected() {
        let mut fs = sample();
        fs.revenue = Decimal::ZERO;
        assert!(calculate_profitability_ratios(&fs).is_err());
    }
}
