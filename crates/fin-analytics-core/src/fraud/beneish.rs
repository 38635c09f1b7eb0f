//! Beneish M-Score model for detecting earnings manipulation.
//!
//! The 8-variable model from Messod D. Beneish (1999):
//! DSRI, GMI, AQI, SGI, DEPI, SGAI, LVGI, TATA.
//! M > -1.78 suggests likely manipulation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::{
    fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{safe_div, validate_positive};
use crate::types::PeriodComparison;
use crate::FinResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Beneish M-Score results with all 8 component ratios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeneishOutput {
    pub dsri: Decimal,
    pub gmi: Decimal,
    pub aqi: Decimal,
    pub sgi: Decimal,
    pub depi: Decimal,
    pub sgai: Decimal,
    pub lvgi: Decimal,
    pub tata: Decimal,
    pub m_score: Decimal,
    /// True when M-Score > -1.78, suggesting likely manipulation.
    pub manipulation_likely: bool,
}

// Coefficients
const INTERCEPT: Decimal = dec!(-4.84);
const C_DSRI: Decimal = dec!(0.920);
const C_GMI: Decimal = dec!(0.528);
const C_AQI: Decimal = dec!(0.404);
const C_SGI: Decimal = dec!(0.892);
const C_DEPI: Decimal = dec!(0.115);
const C_SGAI: Decimal = dec!(-0.172);
const C_TATA: Decimal = dec!(4.679);
const C_LVGI: Decimal = dec!(-0.327);
pub const THRESHOLD: Decimal = dec!(-1.78);

/// Per-index levels above which the index is treated as a red flag
/// (non-manipulator means from the 1999 sample, rounded up).
/// Order: DSRI, GMI, AQI, SGI, TATA.
const INDEX_FLAGS: [Decimal; 5] = [dec!(1.465), dec!(1.193), dec!(1.254), dec!(1.607), dec!(0.031)];

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute the Beneish M-Score (8-variable model).
pub fn calculate_beneish_m_score(input: &PeriodComparison) -> FinResult<BeneishOutput> {
    let cur = &input.current;
    let pri = &input.prior;
    validate_positive(cur.revenue, "current.revenue")?;
    validate_positive(pri.revenue, "prior.revenue")?;
    validate_positive(cur.total_assets, "current.total_assets")?;
    validate_positive(pri.total_assets, "prior.total_assets")?;

    // DSRI
    let recv_rev_cur = safe_div(cur.receivables, cur.revenue, "DSRI cur")?;
    let recv_rev_pri = safe_div(pri.receivables, pri.revenue, "DSRI pri")?;
    let dsri = safe_div(recv_rev_cur, recv_rev_pri, "DSRI ratio")?;

    // GMI
    let prior_gm = safe_div(pri.gross_profit(), pri.revenue, "GMI prior")?;
    let current_gm = safe_div(cur.gross_profit(), cur.revenue, "GMI current")?;
    let gmi = safe_div(prior_gm, current_gm, "GMI ratio")?;

    // AQI: 1 - (CA + PPE) / TA per period
    let aqi_cur =
        Decimal::ONE - safe_div(cur.current_assets + cur.ppe, cur.total_assets, "AQI cur")?;
    let aqi_pri =
        Decimal::ONE - safe_div(pri.current_assets + pri.ppe, pri.total_assets, "AQI pri")?;
    let aqi = safe_div(aqi_cur, aqi_pri, "AQI ratio")?;

    // SGI
    let sgi = safe_div(cur.revenue, pri.revenue, "SGI")?;

    // DEPI
    let pri_dep = safe_div(pri.depreciation, pri.ppe + pri.depreciation, "DEPI prior")?;
    let cur_dep = safe_div(cur.depreciation, cur.ppe + cur.depreciation, "DEPI current")?;
    let depi = safe_div(pri_dep, cur_dep, "DEPI ratio")?;

    // SGAI
    let sga_cur = safe_div(cur.sga, cur.revenue, "SGAI cur")?;
    let sga_pri = safe_div(pri.sga, pri.revenue, "SGAI pri")?;
    let sgai = safe_div(sga_cur, sga_pri, "SGAI ratio")?;

    // LVGI: (current liabilities + long-term debt) / total assets
    let lev_cur = safe_div(
        cur.current_liabilities + cur.long_term_debt,
        cur.total_assets,
        "LVGI cur",
    )?;
    let lev_pri = safe_div(
        pri.current_liabilities + pri.long_term_debt,
        pri.total_assets,
        "LVGI pri",
    )?;
    let lvgi = safe_div(lev_cur, lev_pri, "LVGI ratio")?;

    // TATA
    let tata = safe_div(
        cur.net_income - cur.operating_cash_flow,
        cur.total_assets,
        "TATA",
    )?;

    let m_score = INTERCEPT
        + C_DSRI * dsri
        + C_GMI * gmi
        + C_AQI * aqi
        + C_SGI * sgi
        + C_DEPI * depi
        + C_SGAI * sgai
        + C_TATA * tata
        + C_LVGI * lvgi;

    Ok(BeneishOutput {
        dsri,
        gmi,
        aqi,
        sgi,
        depi,
        sgai,
        lvgi,
        tata,
        m_score,
        manipulation_likely: m_score > THRESHOLD,
    })
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "beneish_m_score",
    category: AnalysisCategory::Fraud,
    title_en: "Beneish M-Score Earnings Manipulation",
    title_ar: "مؤشر بينيش M للتلاعب بالأرباح",
    methodology: "Beneish (1999) eight-variable probit model, threshold -1.78",
};

pub fn report(input: &PeriodComparison, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_beneish_m_score(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.m_score)
        .metric("m_score", "M-Score", "مؤشر M", out.m_score, MetricUnit::Score)
        .benchmark(THRESHOLD)
        .metric(
            "dsri",
            "Days Sales in Receivables Index",
            "مؤشر أيام المبيعات في الذمم المدينة",
            out.dsri,
            MetricUnit::Ratio,
        )
        .metric("gmi", "Gross Margin Index", "مؤشر هامش الربح الإجمالي", out.gmi, MetricUnit::Ratio)
        .metric("aqi", "Asset Quality Index", "مؤشر جودة الأصول", out.aqi, MetricUnit::Ratio)
        .metric("sgi", "Sales Growth Index", "مؤشر نمو المبيعات", out.sgi, MetricUnit::Ratio)
        .metric("depi", "Depreciation Index", "مؤشر الإهلاك", out.depi, MetricUnit::Ratio)
        .metric(
            "sgai",
            "SG&A Expense Index",
            "مؤشر المصاريف البيعية والإدارية",
            out.sgai,
            MetricUnit::Ratio,
        )
        .metric("lvgi", "Leverage Index", "مؤشر الرافعة المالية", out.lvgi, MetricUnit::Ratio)
        .metric(
            "tata",
            "Total Accruals to Total Assets",
            "إجمالي المستحقات إلى إجمالي الأصول",
            out.tata,
            MetricUnit::Ratio,
        );

    let m = fmt_ratio(out.m_score);
    if out.manipulation_likely {
        b.assessment(Assessment::Adverse).interpret(
            format!("The M-Score of {m} exceeds the -1.78 threshold: the earnings profile resembles that of known manipulators."),
            format!("يتجاوز مؤشر M البالغ {m} الحد -1.78، ويشبه نمط الأرباح نمط الشركات المعروفة بالتلاعب."),
        );
        b.recommend(
            "Perform detailed substantive testing of revenue recognition and receivables.",
            "إجراء اختبارات تفصيلية لإثبات الإيرادات والذمم المدينة.",
        )
        .recommend(
            "Reconcile reported earnings to operating cash flow for the last three years.",
            "مطابقة الأرباح المعلنة مع التدفق النقدي التشغيلي للسنوات الثلاث الأخيرة.",
        );
    } else {
        b.assessment(Assessment::Favourable).interpret(
            format!("The M-Score of {m} is below the -1.78 threshold; no strong signal of earnings manipulation."),
            format!("مؤشر M البالغ {m} أقل من الحد -1.78، ولا توجد إشارة قوية على التلاعب بالأرباح."),
        );
    }

    let indices = [
        ("DSRI", out.dsri),
        ("GMI", out.gmi),
        ("AQI", out.aqi),
        ("SGI", out.sgi),
        ("TATA", out.tata),
    ];
    let flagged: Vec<&str> = indices
        .iter()
        .zip(INDEX_FLAGS.iter())
        .filter(|((_, v), limit)| v > *limit)
        .map(|((k, _), _)| *k)
        .collect();
    if !flagged.is_empty() {
        let list = flagged.join(", ");
        b.interpret(
            format!("Elevated indices: {list}."),
            format!("المؤشرات المرتفعة: {list}."),
        );
        if !out.manipulation_likely {
            b.assessment(Assessment::Caution);
        }
        if flagged.contains(&"DSRI") {
            b.recommend(
                "Review credit terms and the ageing of receivables.",
                "مراجعة شروط الائتمان وأعمار الذمم المدينة.",
            );
        }
        if flagged.contains(&"TATA") {
            b.recommend(
                "Investigate the accruals driving the gap between profit and cash.",
                "التحقق من المستحقات المسببة للفجوة بين الربح والنقد.",
            );
        }
    }

    Ok(b.finish())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinError;
    use crate::types::FinancialStatements;

    fn period(
        receivables: Decimal,
        revenue: Decimal,
        cogs: Decimal,
        net_income: Decimal,
        cfo: Decimal,
    ) -> FinancialStatements {
        FinancialStatements {
            receivables,
            revenue,
            cogs,
            current_assets: dec!(400),
            ppe: dec!(800),
            total_assets: dec!(2000),
            depreciation: dec!(80),
            sga: revenue * dec!(0.15),
            current_liabilities: dec!(200),
            long_term_debt: dec!(300),
            net_income,
            operating_cash_flow: cfo,
            ..Default::default()
        }
    }

    fn unity_input() -> PeriodComparison {
        PeriodComparison {
            current: period(dec!(100), dec!(1000), dec!(600), dec!(100), dec!(100)),
            prior: period(dec!(100), dec!(1000), dec!(600), dec!(90), dec!(95)),
        }
    }

    #[test]
    fn test_all_ratios_one_yields_known_score() {
        let out = calculate_beneish_m_score(&unity_input()).unwrap();
        assert_eq!(out.dsri, Decimal::ONE);
        assert_eq!(out.gmi, Decimal::ONE);
        assert_eq!(out.tata, Decimal::ZERO);
        let expected =
            dec!(-4.84) + dec!(0.920) + dec!(0.528) + dec!(0.404) + dec!(0.892) + dec!(0.115)
                - dec!(0.172)
                - dec!(0.327);
        assert_eq!(out.m_score, expected);
        assert!(!out.manipulation_likely);
    }

    #[test]
    fn test_manipulation_flagged() {
        let input = PeriodComparison {
            current: period(dec!(300), dec!(1600), dec!(1200), dec!(200), dec!(20)),
            prior: period(dec!(95), dec!(950), dec!(570), dec!(90), dec!(95)),
        };
        let out = calculate_beneish_m_score(&input).unwrap();
        assert!(out.manipulation_likely, "M = {}", out.m_score);
        assert!(out.dsri > dec!(1.5));
    }

    #[test]
    fn test_zero_prior_revenue_rejected() {
        let mut input = unity_input();
        input.prior.revenue = Decimal::ZERO;
        match calculate_beneish_m_score(&input).unwrap_err() {
            FinError::InvalidInput { field, .. } => assert_eq!(field, "prior.revenue"),
            e => panic!("Expected InvalidInput, got {e}"),
        }
    }

    #[test]
    fn test_zero_receivables_prior_is_division_error() {
        let mut input = unity_input();
        input.prior.receivables = Decimal::ZERO;
        assert!(matches!(
            calculate_beneish_m_score(&input),
            Err(FinError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_report_flags_elevated_indices() {
        let input = PeriodComparison {
            current: period(dec!(300), dec!(1600), dec!(1200), dec!(200), dec!(20)),
            prior: period(dec!(95), dec!(950), dec!(570), dec!(90), dec!(95)),
        };
        let r = report(&input, &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
        assert!(r.interpretation.contains("DSRI"));
        assert_eq!(r.metric("m_score").unwrap().benchmark, Some(THRESHOLD));
    }

    #[test]
    fn test_report_clean_company() {
        let r = report(&unity_input(), &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Favourable);
        assert_eq!(r.metrics.len(), 9);
    }
}
