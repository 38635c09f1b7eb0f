//! Altman Z-Score bankruptcy prediction.
//!
//! Three variants: the original Z (public manufacturers), Z' (private
//! firms, book equity in X4) and Z'' (non-manufacturers and emerging
//! markets, no sales-turnover term). The variant matching the company
//! profile is reported as primary.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::report::{
    fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::safe_div;
use crate::types::{FinancialStatements, Money, Rate};
use crate::FinResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltmanInput {
    pub financials: FinancialStatements,
    /// Overrides `share_price * shares_outstanding` when given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Money>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub is_manufacturing: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreZone {
    Safe,
    Grey,
    Distress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreModel {
    Original,
    Private,
    NonManufacturing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZScoreComponent {
    pub name: String,
    pub ratio: Decimal,
    pub coefficient: Decimal,
    pub weighted_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZScoreResult {
    pub model: ZScoreModel,
    pub score: Decimal,
    pub zone: ZScoreZone,
    pub components: Vec<ZScoreComponent>,
    /// (distress_upper_bound, safe_lower_bound)
    pub zone_thresholds: (Decimal, Decimal),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltmanOutput {
    pub scores: Vec<ZScoreResult>,
    pub primary_model: ZScoreModel,
    pub primary_score: Decimal,
    pub primary_zone: ZScoreZone,
    /// Rough probability-of-default estimate mapped from the zone.
    pub probability_of_default_estimate: Rate,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

// Original Z-Score (public manufacturing)
const Z_COEFF: [Decimal; 5] = [dec!(1.2), dec!(1.4), dec!(3.3), dec!(0.6), dec!(1.0)];
// Z'-Score (private companies)
const ZP_COEFF: [Decimal; 5] = [dec!(0.717), dec!(0.847), dec!(3.107), dec!(0.420), dec!(0.998)];
// Z''-Score (non-manufacturing / emerging markets)
const ZPP_COEFF: [Decimal; 4] = [dec!(6.56), dec!(3.26), dec!(6.72), dec!(1.05)];

const Z_ZONES: (Decimal, Decimal) = (dec!(1.81), dec!(2.99));
const ZP_ZONES: (Decimal, Decimal) = (dec!(1.23), dec!(2.90));
const ZPP_ZONES: (Decimal, Decimal) = (dec!(1.10), dec!(2.60));

const X_NAMES: [&str; 5] = [
    "X1: Working Capital / Total Assets",
    "X2: Retained Earnings / Total Assets",
    "X3: EBIT / Total Assets",
    "X4: Equity / Total Liabilities",
    "X5: Revenue / Total Assets",
];

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute every Z-Score variant the input supports and pick the primary one.
pub fn calculate_altman_z_score(input: &AltmanInput) -> FinResult<AltmanOutput> {
    let fs = &input.financials;
    if fs.total_assets <= Decimal::ZERO {
        return Err(FinError::invalid("total_assets", "Total assets must be positive."));
    }
    if fs.total_liabilities <= Decimal::ZERO {
        return Err(FinError::invalid(
            "total_liabilities",
            "Total liabilities must be positive.",
        ));
    }

    let mut warnings = Vec::new();
    let ta = fs.total_assets;
    let x1 = safe_div(fs.working_capital(), ta, "X1")?;
    let x2 = safe_div(fs.retained_earnings, ta, "X2")?;
    let x3 = safe_div(fs.ebit, ta, "X3")?;
    let x5 = safe_div(fs.revenue, ta, "X5")?;
    let x4_book = safe_div(fs.shareholders_equity, fs.total_liabilities, "X4 book")?;

    let mut scores = Vec::new();

    let market_cap = input.market_cap.or_else(|| fs.market_cap());
    match market_cap {
        Some(mc) => {
            let x4 = safe_div(mc, fs.total_liabilities, "X4 market")?;
            scores.push(build_score(
                ZScoreModel::Original,
                &[x1, x2, x3, x4, x5],
                &Z_COEFF,
                Z_ZONES,
            ));
        }
        None if input.is_public => warnings.push(
            "Market capitalisation unavailable; original Z-Score skipped.".to_string(),
        ),
        None => {}
    }

    scores.push(build_score(
        ZScoreModel::Private,
        &[x1, x2, x3, x4_book, x5],
        &ZP_COEFF,
        ZP_ZONES,
    ));
    scores.push(build_score(
        ZScoreModel::NonManufacturing,
        &[x1, x2, x3, x4_book],
        &ZPP_COEFF,
        ZPP_ZONES,
    ));

    if fs.shareholders_equity <= Decimal::ZERO {
        warnings.push("Non-positive book equity depresses Z' and Z''.".to_string());
    }

    let target = if input.is_public && market_cap.is_some() {
        ZScoreModel::Original
    } else if input.is_manufacturing {
        ZScoreModel::Private
    } else {
        ZScoreModel::NonManufacturing
    };
    let primary = scores
        .iter()
        .find(|s| s.model == target)
        .unwrap_or(&scores[0])
        .clone();

    Ok(AltmanOutput {
        primary_model: primary.model,
        primary_score: primary.score,
        primary_zone: primary.zone,
        probability_of_default_estimate: estimate_pd(primary.zone),
        scores,
        warnings,
    })
}

fn build_score(
    model: ZScoreModel,
    ratios: &[Decimal],
    coefficients: &[Decimal],
    zones: (Decimal, Decimal),
) -> ZScoreResult {
    let components: Vec<ZScoreComponent> = ratios
        .iter()
        .zip(coefficients.iter())
        .zip(X_NAMES.iter())
        .map(|((ratio, coefficient), name)| ZScoreComponent {
            name: name.to_string(),
            ratio: *ratio,
            coefficient: *coefficient,
            weighted_value: ratio * coefficient,
        })
        .collect();
    let score: Decimal = components.iter().map(|c| c.weighted_value).sum();
    ZScoreResult {
        model,
        score,
        zone: classify_zone(score, zones.0, zones.1),
        components,
        zone_thresholds: zones,
    }
}

fn classify_zone(score: Decimal, distress_upper: Decimal, safe_lower: Decimal) -> ZScoreZone {
    if score > safe_lower {
        ZScoreZone::Safe
    } else if score < distress_upper {
        ZScoreZone::Distress
    } else {
        ZScoreZone::Grey
    }
}

/// Heuristic midpoints, not calibrated default probabilities.
fn estimate_pd(zone: ZScoreZone) -> Rate {
    match zone {
        ZScoreZone::Safe => dec!(0.03),
        ZScoreZone::Grey => dec!(0.22),
        ZScoreZone::Distress => dec!(0.65),
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "altman_z_score",
    category: AnalysisCategory::Fraud,
    title_en: "Altman Z-Score Bankruptcy Risk",
    title_ar: "مؤشر ألتمان Z لمخاطر الإفلاس",
    methodology: "Altman (1968, 1983, 1995) discriminant models Z, Z' and Z''",
};

pub fn report(input: &AltmanInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_altman_z_score(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.primary_score);
    for s in &out.scores {
        let (key, en, ar) = match s.model {
            ZScoreModel::Original => ("z_score", "Original Z-Score", "مؤشر Z الأصلي"),
            ZScoreModel::Private => ("z_prime", "Z' Score (private)", "مؤشر Z' للشركات الخاصة"),
            ZScoreModel::NonManufacturing => (
                "z_double_prime",
                "Z'' Score (non-manufacturing)",
                "مؤشر Z'' للشركات غير الصناعية",
            ),
        };
        b.metric(key, en, ar, s.score, MetricUnit::Score)
            .benchmark(s.zone_thresholds.1);
    }
    b.metric(
        "probability_of_default",
        "Indicative probability of default",
        "احتمال التعثر التقديري",
        out.probability_of_default_estimate,
        MetricUnit::Probability,
    );

    let score = fmt_ratio(out.primary_score);
    match out.primary_zone {
        ZScoreZone::Safe => {
            b.assessment(Assessment::Favourable).interpret(
                format!("The primary Z-Score of {score} sits in the safe zone; bankruptcy risk over the next two years is low."),
                format!("يقع مؤشر Z الرئيسي البالغ {score} في المنطقة الآمنة، ومخاطر الإفلاس خلال العامين المقبلين منخفضة."),
            );
            b.recommend(
                "Continue monitoring annually; no immediate solvency action is required.",
                "الاستمرار في المراقبة السنوية؛ لا يلزم أي إجراء فوري بشأن الملاءة.",
            );
        }
        ZScoreZone::Grey => {
            b.assessment(Assessment::Caution).interpret(
                format!("The primary Z-Score of {score} falls in the grey zone, where the model cannot separate healthy from distressed firms."),
                format!("يقع مؤشر Z الرئيسي البالغ {score} في المنطقة الرمادية حيث لا يميز النموذج بوضوح بين الشركات السليمة والمتعثرة."),
            );
            b.recommend(
                "Review working capital and profitability trends quarterly.",
                "مراجعة اتجاهات رأس المال العامل والربحية بشكل ربع سنوي.",
            )
            .recommend(
                "Stress-test debt service capacity under a revenue decline.",
                "اختبار قدرة خدمة الدين في ظل تراجع الإيرادات.",
            );
        }
        ZScoreZone::Distress => {
            b.assessment(Assessment::Adverse).interpret(
                format!("The primary Z-Score of {score} is in the distress zone, a pattern historically associated with bankruptcy within two years."),
                format!("يقع مؤشر Z الرئيسي البالغ {score} في منطقة التعثر، وهو نمط ارتبط تاريخياً بالإفلاس خلال عامين."),
            );
            b.recommend(
                "Prepare a liquidity plan and engage lenders early on covenant headroom.",
                "إعداد خطة للسيولة والتواصل المبكر مع المقرضين بشأن هوامش التعهدات.",
            )
            .recommend(
                "Prioritise restoring operating profitability (X3), the heaviest-weighted driver.",
                "إعطاء الأولوية لاستعادة الربحية التشغيلية (X3) وهي العامل الأعلى وزناً.",
            );
        }
    }

    if let Some(primary) = out.scores.iter().find(|s| s.model == out.primary_model) {
        if let Some(weakest) = primary
            .components
            .iter()
            .min_by(|a, b| a.weighted_value.cmp(&b.weighted_value))
        {
            b.interpret(
                format!("The weakest contributor is {}.", weakest.name),
                format!("أضعف المكونات مساهمة هو {}.", weakest.name),
            );
        }
    }

    b.warnings(out.warnings);
    Ok(b.finish())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
