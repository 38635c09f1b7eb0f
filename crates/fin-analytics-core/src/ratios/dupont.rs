//! DuPont decomposition of return on equity.
//!
//! Three-way: ROE = net margin x asset turnover x equity multiplier.
//! Five-way splits net margin further into tax burden (NI / EBT), interest
//! burden (EBT / EBIT) and EBIT margin. The primary driver is the
//! three-way factor furthest above its reference level.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_pct, fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, Language,
    MetricUnit, ReportBuilder, ReportOptions,
};
use crate::stats::{safe_div, validate_positive};
use crate::types::{FinancialStatements, Multiple, Rate};
use crate::FinResult;

// Reference levels used to judge which factor dominates
const REF_NET_MARGIN: Decimal = dec!(0.10);
const REF_ASSET_TURNOVER: Decimal = dec!(1.0);
const REF_EQUITY_MULTIPLIER: Decimal = dec!(2.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoeDriver {
    Profitability,
    Efficiency,
    Leverage,
}

impl RoeDriver {
    fn label(self, lang: Language) -> String {
        match self {
            RoeDriver::Profitability => lang.text("profit margin", "هامش الربح"),
            RoeDriver::Efficiency => lang.text("asset efficiency", "كفاءة استخدام الأصول"),
            RoeDriver::Leverage => lang.text("financial leverage", "الرافعة المالية"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiveWayDupont {
    pub tax_burden: Rate,
    pub interest_burden: Rate,
    pub ebit_margin: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DupontOutput {
    pub roe: Rate,
    pub net_margin: Rate,
    pub asset_turnover: Multiple,
    pub equity_multiplier: Multiple,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub five_way: Option<FiveWayDupont>,
    pub primary_driver: RoeDriver,
    pub warnings: Vec<String>,
}

pub fn calculate_dupont(fs: &FinancialStatements) -> FinResult<DupontOutput> {
    validate_positive(fs.revenue, "revenue")?;
    validate_positive(fs.total_assets, "total_assets")?;
    validate_positive(fs.shareholders_equity, "shareholders_equity")?;
    let mut warnings = Vec::new();

    let net_margin = fs.net_income / fs.revenue;
    let asset_turnover = fs.revenue / fs.total_assets;
    let equity_multiplier = fs.total_assets / fs.shareholders_equity;
    let roe = net_margin * asset_turnover * equity_multiplier;

    let five_way = if fs.pretax_income.is_zero() || fs.ebit.is_zero() {
        warnings.push("Pretax income or EBIT is zero; five-way decomposition omitted.".into());
        None
    } else {
        Some(FiveWayDupont {
            tax_burden: safe_div(fs.net_income, fs.pretax_income, "tax burden")?,
            interest_burden: safe_div(fs.pretax_income, fs.ebit, "interest burden")?,
            ebit_margin: fs.ebit / fs.revenue,
        })
    };

    let candidates = [
        (RoeDriver::Profitability, net_margin / REF_NET_MARGIN),
        (RoeDriver::Efficiency, asset_turnover / REF_ASSET_TURNOVER),
        (RoeDriver::Leverage, equity_multiplier / REF_EQUITY_MULTIPLIER),
    ];
    let primary_driver = candidates
        .iter()
        .max_by(|a, b| a.1.cmp(&b.1))
        .map(|(d, _)| *d)
        .unwrap_or(RoeDriver::Profitability);

    Ok(DupontOutput {
        roe,
        net_margin,
        asset_turnover,
        equity_multiplier,
        five_way,
        primary_driver,
        warnings,
    })
}

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "dupont_analysis",
    category: AnalysisCategory::Ratios,
    title_en: "DuPont ROE Decomposition",
    title_ar: "تحليل دوبونت للعائد على حقوق الملكية",
    methodology: "Three-way and five-way DuPont identity",
};

pub fn report(input: &FinancialStatements, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_dupont(input)?;
    let lang = options.language;
    let mut b = ReportBuilder::new(&INFO, lang);

    b.score(out.roe)
        .metric("roe", "Return on equity", "العائد على حقوق الملكية", out.roe, MetricUnit::Percent)
        .metric("net_margin", "Net margin", "هامش صافي الربح", out.net_margin, MetricUnit::Percent)
        .benchmark(REF_NET_MARGIN)
        .metric("asset_turnover", "Asset turnover", "معدل دوران الأصول", out.asset_turnover, MetricUnit::Ratio)
        .benchmark(REF_ASSET_TURNOVER)
        .metric(
            "equity_multiplier",
            "Equity multiplier",
            "مضاعف حقوق الملكية",
            out.equity_multiplier,
            MetricUnit::Ratio,
        )
        .benchmark(REF_EQUITY_MULTIPLIER);
    if let Some(f) = &out.five_way {
        b.metric("tax_burden", "Tax burden", "العبء الضريبي", f.tax_burden, MetricUnit::Ratio)
            .metric("interest_burden", "Interest burden", "عبء الفوائد", f.interest_burden, MetricUnit::Ratio)
            .metric("ebit_margin", "EBIT margin", "هامش الربح التشغيلي", f.ebit_margin, MetricUnit::Percent);
    }

    let roe = fmt_pct(out.roe);
    let driver = out.primary_driver.label(lang);
    b.interpret(
        format!(
            "ROE of {roe} = {} net margin x {}x turnover x {}x leverage; the main driver is {driver}.",
            fmt_pct(out.net_margin),
            fmt_ratio(out.asset_turnover),
            fmt_ratio(out.equity_multiplier),
        ),
        format!(
            "العائد على حقوق الملكية {roe} = هامش صافي {} × دوران {} × رافعة {}، والمحرك الرئيسي هو {driver}.",
            fmt_pct(out.net_margin),
            fmt_ratio(out.asset_turnover),
            fmt_ratio(out.equity_multiplier),
        ),
    );

    let assessment = match (out.roe, out.primary_driver) {
        (r, _) if r < Decimal::ZERO => Assessment::Adverse,
        (r, RoeDriver::Leverage) if r >= dec!(0.15) => Assessment::Caution,
        (r, _) if r >= dec!(0.15) => Assessment::Favourable,
        (r, _) if r >= dec!(0.08) => Assessment::Neutral,
        _ => Assessment::Caution,
    };
    b.assessment(assessment);

    if out.primary_driver == RoeDriver::Leverage {
        b.recommend(
            "Returns rely on borrowed capital; stress-test ROE against higher rates.",
            "العوائد تعتمد على رأس المال المقترض؛ يجب اختبار العائد تحت أسعار فائدة أعلى.",
        );
    }
    if let Some(f) = out.five_way.as_ref().filter(|f| f.interest_burden < dec!(0.7)) {
        b.recommend(
            format!(
                "Interest consumes {} of operating profit; refinancing would lift ROE.",
                fmt_pct(Decimal::ONE - f.interest_burden)
            ),
            format!(
                "تستهلك الفوائد {} من الربح التشغيلي؛ إعادة التمويل سترفع العائد.",
                fmt_pct(Decimal::ONE - f.interest_burden)
            ),
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
            net_income: dec!(80),
            pretax_income: dec!(100),
            ebit: dec!(125),
            total_assets: dec!(800),
            shareholders_equity: dec!(400),
            ..Default::default()
        }
    }

    #[test]
    fn test_three_way_identity() {
        let out = calculate_dupont(&sample()).unwrap();
        assert_eq!(out.net_margin, dec!(0.08));
        assert_eq!(out.asset_turnover, dec!(1.25));
        assert_eq!(out.equity_multiplier, dec!(2));
        assert_eq!(out.roe, dec!(0.2));
        assert_eq!(out.roe, sample().net_income / sample().shareholders_equity);
    }

    #[test]
    fn test_five_way() {
        let f = calculate_dupont(&sample()).unwrap().five_way.unwrap();
        assert_eq!(f.tax_burden, dec!(0.8));
        assert_eq!(f.interest_burden, dec!(0.8));
        assert_eq!(f.ebit_margin, dec!(0.125));
    }

    #[test]
    fn test_primary_driver() {
        // turnover 1.25 / 1.0 beats margin 0.8 and leverage 1.0
        assert_eq!(calculate_dupont(&sample()).unwrap().primary_driver, RoeDriver::Efficiency);
        let mut fs = sample();
        fs.shareholders_equity = dec!(100);
        assert_eq!(calculate_dupont(&fs).unwrap().primary_driver, RoeDriver::Leverage);
    }

    #[test]
    fn test_negative_equity_rejected() {
        let mut fs = sample();
        fs.shareholders_equity = dec!(-1);
        assert!(calculate_dupont(&fs).is_err());
    }
}
