//! Composite financial red-flag score.
//!
//! Combines signals across four categories into a 0-100 risk score:
//! earnings quality, growth quality, financial health and governance.
//! Earnings-quality and health signals reuse the Beneish, Altman and
//! Piotroski models when the supplied statements allow them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::altman::{calculate_altman_z_score, AltmanInput};
use super::beneish::calculate_beneish_m_score;
use super::piotroski::calculate_piotroski_f_score;
use crate::report::{
    fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, Language, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::div_or_zero;
use crate::types::PeriodComparison;
use crate::FinResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOpinion {
    #[default]
    Clean,
    Qualified,
    Adverse,
    Disclaimer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceSignals {
    pub audit_opinion: AuditOpinion,
    pub auditor_change: bool,
    pub related_party_transactions: bool,
    pub restatement_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlagInput {
    pub financials: PeriodComparison,
    #[serde(default)]
    pub governance: GovernanceSignals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagCategory {
    EarningsQuality,
    GrowthQuality,
    FinancialHealth,
    Governance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagCode {
    ManipulationLikely,
    NegativeCashConversion,
    LowCashConversion,
    WeakFScore,
    ReceivablesOutpaceRevenue,
    InventoryOutpacesRevenue,
    AggressiveGrowth,
    RisingOverheads,
    DistressZScore,
    ExtremeLeverage,
    HighLeverage,
    ThinInterestCover,
    AdverseOpinion,
    QualifiedOpinion,
    AuditorChange,
    RelatedParties,
    Restatements,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlag {
    pub code: FlagCode,
    pub category: FlagCategory,
    pub severity: Severity,
    pub points: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Clean,
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScores {
    pub earnings_quality: Decimal,
    pub growth_quality: Decimal,
    pub financial_health: Decimal,
    pub governance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlagOutput {
    pub composite_score: Decimal,
    pub risk_level: RiskLevel,
    pub flags: Vec<RedFlag>,
    pub category_scores: CategoryScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneish_m_score: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altman_z_score: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piotroski_f_score: Option<u8>,
}

const CATEGORY_CAP: Decimal = dec!(25);

struct FlagSink {
    flags: Vec<RedFlag>,
}

impl FlagSink {
    fn raise(&mut self, code: FlagCode, category: FlagCategory, severity: Severity, points: Decimal) {
        self.flags.push(RedFlag {
            code,
            category,
            severity,
            points,
        });
    }

    fn category_total(&self, category: FlagCategory) -> Decimal {
        self.flags
            .iter()
            .filter(|f| f.category == category)
            .map(|f| f.points)
            .sum::<Decimal>()
            .min(CATEGORY_CAP)
    }
}

fn growth(current: Decimal, prior: Decimal) -> Decimal {
    div_or_zero(current - prior, prior.abs())
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

pub fn calculate_red_flags(input: &RedFlagInput) -> FinResult<RedFlagOutput> {
    let cur = &input.financials.current;
    let pri = &input.financials.prior;
    let mut sink = FlagSink { flags: Vec::new() };

    // Optional model scores; missing fields simply skip the signal
    let beneish = calculate_beneish_m_score(&input.financials).ok();
    let piotroski = calculate_piotroski_f_score(&input.financials).ok();
    let altman = calculate_altman_z_score(&AltmanInput {
        financials: cur.clone(),
        market_cap: None,
        is_public: false,
        is_manufacturing: true,
    })
    .ok();

    // --- Earnings quality ---
    if let Some(b) = &beneish {
        if b.manipulation_likely {
            sink.raise(
                FlagCode::ManipulationLikely,
                FlagCategory::EarningsQuality,
                Severity::High,
                dec!(15),
            );
        }
    }
    if !cur.net_income.is_zero() {
        let cfo_to_ni = cur.operating_cash_flow / cur.net_income;
        if cfo_to_ni < Decimal::ZERO {
            sink.raise(
                FlagCode::NegativeCashConversion,
                FlagCategory::EarningsQuality,
                Severity::High,
                dec!(10),
            );
        } else if cfo_to_ni < dec!(0.5) {
            sink.raise(
                FlagCode::LowCashConversion,
                FlagCategory::EarningsQuality,
                Severity::Medium,
                dec!(5),
            );
        }
    }
    if let Some(p) = &piotroski {
        if p.f_score < 3 {
            sink.raise(
                FlagCode::WeakFScore,
                FlagCategory::EarningsQuality,
                Severity::Medium,
                dec!(5),
            );
        }
    }

    // --- Growth quality ---
    let revenue_growth = growth(cur.revenue, pri.revenue);
    if growth(cur.receivables, pri.receivables) > revenue_growth + dec!(0.05) {
        sink.raise(
            FlagCode::ReceivablesOutpaceRevenue,
            FlagCategory::GrowthQuality,
            Severity::Medium,
            dec!(8),
        );
    }
    if growth(cur.inventory, pri.inventory) > revenue_growth + dec!(0.05) {
        sink.raise(
            FlagCode::InventoryOutpacesRevenue,
            FlagCategory::GrowthQuality,
            Severity::Medium,
            dec!(7),
        );
    }
    if revenue_growth > dec!(0.50) {
        sink.raise(
            FlagCode::AggressiveGrowth,
            FlagCategory::GrowthQuality,
            Severity::Low,
            dec!(5),
        );
    }
    if div_or_zero(cur.sga, cur.revenue) > div_or_zero(pri.sga, pri.revenue) + dec!(0.02) {
        sink.raise(
            FlagCode::RisingOverheads,
            FlagCategory::GrowthQuality,
            Severity::Low,
            dec!(5),
        );
    }

    // --- Financial health ---
    if let Some(a) = &altman {
        if a.primary_score < dec!(1.23) {
            sink.raise(
                FlagCode::DistressZScore,
                FlagCategory::FinancialHealth,
                Severity::High,
                dec!(15),
            );
        }
    }
    if cur.shareholders_equity > Decimal::ZERO {
        let de = cur.total_debt() / cur.shareholders_equity;
        if de > dec!(5) {
            sink.raise(
                FlagCode::ExtremeLeverage,
                FlagCategory::FinancialHealth,
                Severity::High,
                dec!(10),
            );
        } else if de > dec!(3) {
            sink.raise(
                FlagCode::HighLeverage,
                FlagCategory::FinancialHealth,
                Severity::Medium,
                dec!(5),
            );
        }
    } else if !cur.total_debt().is_zero() {
        sink.raise(
            FlagCode::ExtremeLeverage,
            FlagCategory::FinancialHealth,
            Severity::High,
            dec!(10),
        );
    }
    if cur.interest_expense > Decimal::ZERO && cur.ebit / cur.interest_expense < dec!(1.5) {
        sink.raise(
            FlagCode::ThinInterestCover,
            FlagCategory::FinancialHealth,
            Severity::Medium,
            dec!(5),
        );
    }

    // --- Governance ---
    let gov = &input.governance;
    match gov.audit_opinion {
        AuditOpinion::Adverse | AuditOpinion::Disclaimer => sink.raise(
            FlagCode::AdverseOpinion,
            FlagCategory::Governance,
            Severity::High,
            dec!(15),
        ),
        AuditOpinion::Qualified => sink.raise(
            FlagCode::QualifiedOpinion,
            FlagCategory::Governance,
            Severity::High,
            dec!(10),
        ),
        AuditOpinion::Clean => {}
    }
    if gov.auditor_change {
        sink.raise(FlagCode::AuditorChange, FlagCategory::Governance, Severity::Medium, dec!(5));
    }
    if gov.related_party_transactions {
        sink.raise(FlagCode::RelatedParties, FlagCategory::Governance, Severity::Medium, dec!(5));
    }
    if gov.restatement_history {
        sink.raise(FlagCode::Restatements, FlagCategory::Governance, Severity::High, dec!(10));
    }

    let category_scores = CategoryScores {
        earnings_quality: sink.category_total(FlagCategory::EarningsQuality),
        growth_quality: sink.category_total(FlagCategory::GrowthQuality),
        financial_health: sink.category_total(FlagCategory::FinancialHealth),
        governance: sink.category_total(FlagCategory::Governance),
    };
    let composite_score = category_scores.earnings_quality
        + category_scores.growth_quality
        + category_scores.financial_health
        + category_scores.governance;

    let risk_level = match composite_score {
        s if s <= dec!(15) => RiskLevel::Clean,
        s if s <= dec!(30) => RiskLevel::Low,
        s if s <= dec!(50) => RiskLevel::Moderate,
        s if s <= dec!(75) => RiskLevel::High,
        _ => RiskLevel::Critical,
    };

    Ok(RedFlagOutput {
        composite_score,
        risk_level,
        flags: sink.flags,
        category_scores,
        beneish_m_score: beneish.map(|b| b.m_score),
        altman_z_score: altman.map(|a| a.primary_score),
        piotroski_f_score: piotroski.map(|p| p.f_score),
    })
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "fraud_red_flags",
    category: AnalysisCategory::Fraud,
    title_en: "Financial Red Flag Screening",
    title_ar: "فحص المؤشرات التحذيرية المالية",
    methodology: "Weighted red-flag composite over earnings, growth, health and governance (0-100)",
};

fn describe(code: FlagCode, lang: Language) -> String {
    let (en, ar) = match code {
        FlagCode::ManipulationLikely => (
            "Beneish M-Score indicates likely earnings manipulation",
            "مؤشر بينيش يشير إلى احتمال التلاعب بالأرباح",
        ),
        FlagCode::NegativeCashConversion => (
            "Operating cash flow has the opposite sign to net income",
            "التدفق النقدي التشغيلي عكس إشارة صافي الدخل",
        ),
        FlagCode::LowCashConversion => (
            "Less than half of net income converts to operating cash",
            "أقل من نصف صافي الدخل يتحول إلى نقد تشغيلي",
        ),
        FlagCode::WeakFScore => ("Piotroski F-Score below 3", "مؤشر بيوتروسكي أقل من 3"),
        FlagCode::ReceivablesOutpaceRevenue => (
            "Receivables growing faster than revenue",
            "الذمم المدينة تنمو أسرع من الإيرادات",
        ),
        FlagCode::InventoryOutpacesRevenue => (
            "Inventory growing faster than revenue",
            "المخزون ينمو أسرع من الإيرادات",
        ),
        FlagCode::AggressiveGrowth => (
            "Revenue growth above 50%",
            "نمو الإيرادات يتجاوز 50%",
        ),
        FlagCode::RisingOverheads => (
            "SG&A rising as a share of revenue",
            "ارتفاع المصاريف البيعية والإدارية كنسبة من الإيرادات",
        ),
        FlagCode::DistressZScore => (
            "Altman Z' score in the distress zone",
            "مؤشر ألتمان في منطقة التعثر",
        ),
        FlagCode::ExtremeLeverage => (
            "Debt exceeds five times equity",
            "الدين يتجاوز خمسة أضعاف حقوق الملكية",
        ),
        FlagCode::HighLeverage => (
            "Debt exceeds three times equity",
            "الدين يتجاوز ثلاثة أضعاف حقوق الملكية",
        ),
        FlagCode::ThinInterestCover => (
            "EBIT covers interest less than 1.5 times",
            "الربح التشغيلي يغطي الفوائد أقل من 1.5 مرة",
        ),
        FlagCode::AdverseOpinion => (
            "Adverse or disclaimed audit opinion",
            "رأي مراجعة سلبي أو امتناع عن إبداء الرأي",
        ),
        FlagCode::QualifiedOpinion => ("Qualified audit opinion", "رأي مراجعة متحفظ"),
        FlagCode::AuditorChange => ("Recent change of auditor", "تغيير حديث لمراجع الحسابات"),
        FlagCode::RelatedParties => (
            "Material related-party transactions",
            "معاملات جوهرية مع أطراف ذات علاقة",
        ),
        FlagCode::Restatements => (
            "History of financial restatements",
            "سجل سابق لإعادة إصدار القوائم المالية",
        ),
    };
    lang.text(en, ar)
}

pub fn report(input: &RedFlagInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = calculate_red_flags(input)?;
    let lang = options.language;
    let mut b = ReportBuilder::new(&INFO, lang);

    let cs = &out.category_scores;
    b.score(out.composite_score)
        .metric(
            "composite_score",
            "Composite red-flag score",
            "المؤشر المركب للمخاطر",
            out.composite_score,
            MetricUnit::Score,
        )
        .metric(
            "earnings_quality",
            "Earnings quality points",
            "نقاط جودة الأرباح",
            cs.earnings_quality,
            MetricUnit::Score,
        )
        .metric(
            "growth_quality",
            "Growth quality points",
            "نقاط جودة النمو",
            cs.growth_quality,
            MetricUnit::Score,
        )
        .metric(
            "financial_health",
            "Financial health points",
            "نقاط السلامة المالية",
            cs.financial_health,
            MetricUnit::Score,
        )
        .metric(
            "governance",
            "Governance points",
            "نقاط الحوكمة",
            cs.governance,
            MetricUnit::Score,
        )
        .metric(
            "flag_count",
            "Flags raised",
            "عدد المؤشرات التحذيرية",
            Decimal::from(out.flags.len() as u32),
            MetricUnit::Count,
        );

    let score = fmt_ratio(out.composite_score);
    let (assessment, en, ar) = match out.risk_level {
        RiskLevel::Clean => (
            Assessment::Favourable,
            format!("A composite score of {score}/100 shows no meaningful red flags."),
            format!("المؤشر المركب البالغ {score}/100 لا يظهر مؤشرات تحذيرية تذكر."),
        ),
        RiskLevel::Low => (
            Assessment::Neutral,
            format!("A composite score of {score}/100 indicates low fraud and distress risk."),
            format!("المؤشر المركب البالغ {score}/100 يدل على مخاطر احتيال وتعثر منخفضة."),
        ),
        RiskLevel::Moderate => (
            Assessment::Caution,
            format!("A composite score of {score}/100 indicates moderate risk that merits follow-up."),
            format!("المؤشر المركب البالغ {score}/100 يدل على مخاطر متوسطة تستدعي المتابعة."),
        ),
        RiskLevel::High | RiskLevel::Critical => (
            Assessment::Adverse,
            format!("A composite score of {score}/100 indicates high fraud and distress risk."),
            format!("المؤشر المركب البالغ {score}/100 يدل على مخاطر احتيال وتعثر مرتفعة."),
        ),
    };
    b.assessment(assessment).interpret(en, ar);

    let mut flags = out.flags.clone();
    flags.sort_by(|a, b| b.severity.cmp(&a.severity));
    for f in &flags {
        let text = describe(f.code, lang);
        b.interpret(format!("{text}."), format!("{text}."));
    }
    if flags.iter().any(|f| f.severity == Severity::High) {
        b.recommend(
            "Escalate high-severity flags to the audit committee for forensic review.",
            "رفع المؤشرات عالية الخطورة إلى لجنة المراجعة لإجراء فحص جنائي.",
        );
    }
    if cs.growth_quality > Decimal::ZERO {
        b.recommend(
            "Reconcile revenue growth with receivable and inventory build-up.",
            "مطابقة نمو الإيرادات مع تراكم الذمم المدينة والمخزون.",
        );
    }
    if cs.governance > Decimal::ZERO {
        b.recommend(
            "Review audit committee minutes and related-party disclosures.",
            "مراجعة محاضر لجنة المراجعة وإفصاحات الأطراف ذات العلاقة.",
        );
    }

    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FinancialStatements;

    fn healthy_period(revenue: Decimal) -> FinancialStatements {
        FinancialStatements {
            revenue,
            cogs: revenue * dec!(0.6),
            sga: revenue * dec!(0.15),
            depreciation: dec!(80),
            ebit: dec!(250),
            interest_expense: dec!(20),
            net_income: dec!(150),
            operating_cash_flow: dec!(190),
            receivables: revenue * dec!(0.1),
            inventory: revenue * dec!(0.08),
            current_assets: dec!(600),
            current_liabilities: dec!(300),
            ppe: dec!(800),
            total_assets: dec!(2000),
            long_term_debt: dec!(400),
            total_liabilities: dec!(900),
            retained_earnings: dec!(600),
            shareholders_equity: dec!(1100),
            shares_outstanding: dec!(100),
            ..Default::default()
        }
    }

    fn clean_input() -> RedFlagInput {
        RedFlagInput {
            financials: PeriodComparison {
                current: healthy_period(dec!(1100)),
                prior: healthy_period(dec!(1000)),
            },
            governance: GovernanceSignals::default(),
        }
    }

    #[test]
    fn test_clean_company() {
        let out = calculate_red_flags(&clean_input()).unwrap();
        assert_eq!(out.risk_level, RiskLevel::Clean, "flags: {:?}", out.flags);
        assert!(out.beneish_m_score.is_some());
        assert!(out.altman_z_score.is_some());
    }

    #[test]
    fn test_governance_flags() {
        let mut input = clean_input();
        input.governance = GovernanceSignals {
            audit_opinion: AuditOpinion::Disclaimer,
            auditor_change: true,
            related_party_transactions: true,
            restatement_history: true,
        };
        let out = calculate_red_flags(&input).unwrap();
        // 15 + 5 + 5 + 10 capped at 25
        assert_eq!(out.category_scores.governance, dec!(25));
    }

    #[test]
    fn test_receivables_outpace_revenue() {
        let mut input = clean_input();
        input.financials.current.receivables = dec!(250);
        let out = calculate_red_flags(&input).unwrap();
        assert!(out
            .flags
            .iter()
            .any(|f| f.code == FlagCode::ReceivablesOutpaceRevenue));
    }

    #[test]
    fn test_negative_equity_with_debt_is_extreme() {
        let mut input = clean_input();
        input.financials.current.shareholders_equity = dec!(-10);
        let out = calculate_red_flags(&input).unwrap();
        assert!(out.flags.iter().any(|f| f.code == FlagCode::ExtremeLeverage));
    }

    #[test]
    fn test_empty_statements_do_not_fail() {
        let input = RedFlagInput {
            financials: PeriodComparison::default(),
            governance: GovernanceSignals::default(),
        };
        let out = calculate_red_flags(&input).unwrap();
        assert!(out.beneish_m_score.is_none());
        assert_eq!(out.composite_score, Decimal::ZERO);
    }

    #[test]
    fn test_report_orders_high_severity_first() {
        let mut input = clean_input();
        input.governance.auditor_change = true;
        input.governance.restatement_history = true;
        let r = report(&input, &ReportOptions::default()).unwrap();
        let restate = r.interpretation.find("restatements").unwrap();
        let auditor = r.interpretation.find("change of auditor").unwrap();
        assert!(restate < auditor);
        assert!(!r.recommendations.is_empty());
    }
}
