//! Benford's Law digit analysis.
//!
//! Compares the leading-digit distribution of a set of reported amounts
//! (journal entries, invoices, expense claims) with the logarithmic
//! distribution natural data follows. Conformity is judged with a
//! chi-squared goodness-of-fit test and Nigrini's mean absolute deviation
//! bands; individual digits are tested with a continuity-corrected z-stat.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::FinError;
use crate::report::{
    fmt_ratio, AnalysisCategory, AnalysisInfo, AnalysisResult, Assessment, MetricUnit,
    ReportBuilder, ReportOptions,
};
use crate::stats::{from_f64, sqrt_decimal, to_f64};
use crate::FinResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitTest {
    #[default]
    FirstDigit,
    FirstTwoDigits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenfordInput {
    pub amounts: Vec<Decimal>,
    #[serde(default)]
    pub test: DigitTest,
    /// Significance level for the chi-squared test
    #[serde(default = "default_significance")]
    pub significance_level: Decimal,
}

fn default_significance() -> Decimal {
    dec!(0.05)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conformity {
    Close,
    Acceptable,
    Marginal,
    Nonconforming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitFrequency {
    pub digit: u32,
    pub observed_count: u32,
    pub observed: Decimal,
    pub expected: Decimal,
    pub z_stat: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenfordOutput {
    pub sample_size: u32,
    pub frequencies: Vec<DigitFrequency>,
    pub chi_squared: Decimal,
    pub degrees_of_freedom: u32,
    pub critical_value: Decimal,
    pub passes_chi_squared: bool,
    pub mean_absolute_deviation: Decimal,
    pub conformity: Conformity,
    /// Digits whose z-stat exceeds 1.96
    pub suspect_digits: Vec<u32>,
    pub warnings: Vec<String>,
}

const Z_CRITICAL: Decimal = dec!(1.96);
const MIN_RELIABLE_SAMPLE: usize = 300;

// ---------------------------------------------------------------------------
// Digit extraction
// ---------------------------------------------------------------------------

/// Leading significant digits of `|val|`, `count` digits long.
fn leading_digits(val: Decimal, count: usize) -> Option<u32> {
    if val.is_zero() {
        return None;
    }
    let digits: String = val
        .abs()
        .to_string()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .skip_while(|c| *c == '0')
        .take(count)
        .collect();
    if digits.len() < count {
        // 5 -> "50" for the two-digit test
        let padded = format!("{digits:0<count$}");
        return padded.parse().ok();
    }
    digits.parse().ok()
}

fn expected_frequency(d: u32) -> Decimal {
    (Decimal::ONE + Decimal::ONE / Decimal::from(d))
        .checked_log10()
        .unwrap_or(Decimal::ZERO)
}

/// Upper-tail chi-squared critical value at significance `alpha`.
fn chi_squared_critical(df: u32, alpha: Decimal) -> FinResult<Decimal> {
    let dist = ChiSquared::new(f64::from(df))
        .map_err(|e| FinError::invalid("degrees_of_freedom", e.to_string()))?;
    Ok(from_f64(dist.inverse_cdf(1.0 - to_f64(alpha))))
}

fn classify_mad(mad: Decimal, test: DigitTest) -> Conformity {
    let bands = match test {
        DigitTest::FirstDigit => [dec!(0.006), dec!(0.012), dec!(0.015)],
        DigitTest::FirstTwoDigits => [dec!(0.0012), dec!(0.0018), dec!(0.0022)],
    };
    if mad <= bands[0] {
        Conformity::Close
    } else if mad <= bands[1] {
        Conformity::Acceptable
    } else if mad <= bands[2] {
        Conformity::Marginal
    } else {
        Conformity::Nonconforming
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

pub fn analyze_benford(input: &BenfordInput) -> FinResult<BenfordOutput> {
    if input.significance_level <= Decimal::ZERO || input.significance_level >= Decimal::ONE {
        return Err(FinError::invalid(
            "significance_level",
            "Must be between 0 and 1 exclusive.",
        ));
    }
    let (width, start, end) = match input.test {
        DigitTest::FirstDigit => (1, 1u32, 9u32),
        DigitTest::FirstTwoDigits => (2, 10u32, 99u32),
    };
    let digits: Vec<u32> = input
        .amounts
        .iter()
        .filter_map(|v| leading_digits(*v, width))
        .collect();
    if digits.is_empty() {
        return Err(FinError::InsufficientData(
            "No non-zero amounts to analyse.".into(),
        ));
    }

    let mut warnings = Vec::new();
    if digits.len() < MIN_RELIABLE_SAMPLE {
        warnings.push(format!(
            "Sample of {} amounts is below {MIN_RELIABLE_SAMPLE}; conformity tests have low power.",
            digits.len()
        ));
    }

    let n = Decimal::from(digits.len() as u64);
    let mut frequencies = Vec::with_capacity((end - start + 1) as usize);
    let mut chi_sq = Decimal::ZERO;
    let mut total_abs_dev = Decimal::ZERO;
    let mut suspect_digits = Vec::new();

    for d in start..=end {
        let count = digits.iter().filter(|&&x| x == d).count() as u32;
        let observed = Decimal::from(count) / n;
        let expected = expected_frequency(d);
        let diff = observed - expected;

        let expected_count = expected * n;
        if expected_count > Decimal::ZERO {
            let c = Decimal::from(count) - expected_count;
            chi_sq += c * c / expected_count;
        }

        let se = sqrt_decimal(expected * (Decimal::ONE - expected) / n);
        let correction = Decimal::ONE / (dec!(2) * n);
        let z_stat = if se.is_zero() {
            Decimal::ZERO
        } else {
            ((diff.abs() - correction).max(Decimal::ZERO)) / se
        };
        if z_stat > Z_CRITICAL {
            suspect_digits.push(d);
        }

        total_abs_dev += diff.abs();
        frequencies.push(DigitFrequency {
            digit: d,
            observed_count: count,
            observed,
            expected,
            z_stat,
        });
    }

    let bins = end - start + 1;
    let df = bins - 1;
    let critical_value = chi_squared_critical(df, input.significance_level)?;
    let mad = total_abs_dev / Decimal::from(bins);

    Ok(BenfordOutput {
        sample_size: digits.len() as u32,
        frequencies,
        chi_squared: chi_sq,
        degrees_of_freedom: df,
        critical_value,
        passes_chi_squared: chi_sq < critical_value,
        mean_absolute_deviation: mad,
        conformity: classify_mad(mad, input.test),
        suspect_digits,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

pub static INFO: AnalysisInfo = AnalysisInfo {
    name: "benford_analysis",
    category: AnalysisCategory::Fraud,
    title_en: "Benford's Law Digit Analysis",
    title_ar: "تحليل الأرقام وفق قانون بنفورد",
    methodology: "Benford first-digit / first-two-digit test, chi-squared and Nigrini MAD",
};

pub fn report(input: &BenfordInput, options: &ReportOptions) -> FinResult<AnalysisResult> {
    let out = analyze_benford(input)?;
    let mut b = ReportBuilder::new(&INFO, options.language);

    b.score(out.mean_absolute_deviation)
        .metric(
            "sample_size",
            "Amounts analysed",
            "عدد المبالغ المحللة",
            Decimal::from(out.sample_size),
            MetricUnit::Count,
        )
        .metric(
            "chi_squared",
            "Chi-squared statistic",
            "إحصاءة مربع كاي",
            out.chi_squared,
            MetricUnit::Score,
        )
        .benchmark(out.critical_value)
        .metric(
            "mean_absolute_deviation",
            "Mean absolute deviation",
            "متوسط الانحراف المطلق",
            out.mean_absolute_deviation,
            MetricUnit::Ratio,
        )
        .metric(
            "suspect_digit_count",
            "Digits with significant deviation",
            "الأرقام ذات الانحراف الجوهري",
            Decimal::from(out.suspect_digits.len() as u32),
            MetricUnit::Count,
        );

    let mad = fmt_ratio(out.mean_absolute_deviation * dec!(100));
    match out.conformity {
        Conformity::Close | Conformity::Acceptable => {
            b.assessment(if out.passes_chi_squared {
                Assessment::Favourable
            } else {
                Assessment::Neutral
            })
            .interpret(
                format!("The digit distribution conforms to Benford's Law (MAD {mad} percentage points)."),
                format!("يتوافق توزيع الأرقام مع قانون بنفورد (متوسط الانحراف المطلق {mad} نقطة مئوية)."),
            );
        }
        Conformity::Marginal => {
            b.assessment(Assessment::Caution).interpret(
                format!("Conformity to Benford's Law is marginal (MAD {mad} percentage points)."),
                format!("التوافق مع قانون بنفورد هامشي (متوسط الانحراف المطلق {mad} نقطة مئوية)."),
            );
            b.recommend(
                "Sample transactions from the over-represented digits for vouching.",
                "اختيار عينة من المعاملات ذات الأرقام المفرطة التمثيل لفحص مستنداتها.",
            );
        }
        Conformity::Nonconforming => {
            b.assessment(Assessment::Adverse).interpret(
                format!("The amounts do not conform to Benford's Law (MAD {mad} percentage points), which can indicate fabricated or manipulated figures."),
                format!("لا تتوافق المبالغ مع قانون بنفورد (متوسط الانحراف المطلق {mad} نقطة مئوية)، وقد يدل ذلك على أرقام مختلقة أو متلاعب بها."),
            );
            b.recommend(
                "Extract and vouch every transaction beginning with the suspect digits.",
                "استخراج وفحص جميع المعاملات التي تبدأ بالأرقام المشتبه بها.",
            )
            .recommend(
                "Check for amounts clustered just below approval thresholds.",
                "التحقق من تجمع المبالغ تحت حدود الاعتماد مباشرة.",
            );
        }
    }

    if !out.suspect_digits.is_empty() {
        let list = out
            .suspect_digits
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        b.interpret(
            format!("Digits with statistically significant deviation: {list}."),
            format!("الأرقام ذات الانحراف الجوهري إحصائياً: {list}."),
        );
    }

    b.warnings(out.warnings);
    Ok(b.finish())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Amounts drawn so that each leading digit appears in Benford proportion
    /// (out of 1000): 301, 176, 125, 97, 79, 67, 58, 51, 46.
    fn benford_sample() -> Vec<Decimal> {
        let counts = [301, 176, 125, 97, 79, 67, 58, 51, 46];
        let mut out = Vec::new();
        for (i, c) in counts.iter().enumerate() {
            let lead = Decimal::from(i as u32 + 1);
            for k in 0..*c {
                out.push(lead * dec!(1000) + Decimal::from(k % 1000));
            }
        }
        out
    }

    fn uniform_sample() -> Vec<Decimal> {
        (0..900)
            .map(|i| Decimal::from((i % 9) + 1) * dec!(100) + Decimal::from(i % 100))
            .collect()
    }

    fn input(amounts: Vec<Decimal>) -> BenfordInput {
        BenfordInput {
            amounts,
            test: DigitTest::FirstDigit,
            significance_level: dec!(0.05),
        }
    }

    #[test]
    fn test_leading_digits() {
        assert_eq!(leading_digits(dec!(0.00452), 1), Some(4));
        assert_eq!(leading_digits(dec!(-987.6), 2), Some(98));
        assert_eq!(leading_digits(dec!(5), 2), Some(50));
        assert_eq!(leading_digits(Decimal::ZERO, 1), None);
    }

    #[test]
    fn test_expected_first_digit() {
        let p1 = expected_frequency(1);
        assert!((p1 - dec!(0.30103)).abs() < dec!(0.0001), "p1 = {p1}");
        let total: Decimal = (1..=9).map(expected_frequency).sum();
        assert!((total - Decimal::ONE).abs() < dec!(0.0001));
    }

    #[test]
    fn test_benford_data_conforms() {
        let out = analyze_benford(&input(benford_sample())).unwrap();
        assert!(out.passes_chi_squared, "chi2 = {}", out.chi_squared);
        assert_eq!(out.conformity, Conformity::Close);
        assert!(out.suspect_digits.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_uniform_data_does_not_conform() {
        let out = analyze_benford(&input(uniform_sample())).unwrap();
        assert!(!out.passes_chi_squared);
        assert_eq!(out.conformity, Conformity::Nonconforming);
        assert!(out.suspect_digits.contains(&1));
    }

    #[test]
    fn test_critical_values_follow_significance() {
        let close = |df, alpha, expected: Decimal| {
            let c = chi_squared_critical(df, alpha).unwrap();
            assert!((c - expected).abs() < dec!(0.005), "df {df}, alpha {alpha}: {c}");
        };
        close(8, dec!(0.01), dec!(20.090));
        close(8, dec!(0.05), dec!(15.507));
        close(8, dec!(0.20), dec!(11.030));
        close(8, dec!(0.50), dec!(7.344));
        close(89, dec!(0.05), dec!(112.022));
    }

    #[test]
    fn test_loose_significance_lowers_the_bar() {
        let mut i = input(benford_sample());
        i.significance_level = dec!(0.2);
        let out = analyze_benford(&i).unwrap();
        assert!((out.critical_value - dec!(11.030)).abs() < dec!(0.005));
        assert_eq!(out.passes_chi_squared, out.chi_squared < out.critical_value);
    }

    #[test]
    fn test_two_digit_bins() {
        let mut i = input(benford_sample());
        i.test = DigitTest::FirstTwoDigits;
        let out = analyze_benford(&i).unwrap();
        assert_eq!(out.frequencies.len(), 90);
        assert_eq!(out.degrees_of_freedom, 89);
    }

    #[test]
    fn test_all_zero_rejected() {
        assert!(matches!(
            analyze_benford(&input(vec![Decimal::ZERO; 5])),
            Err(FinError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_small_sample_warns() {
        let out = analyze_benford(&input(vec![dec!(123), dec!(245)])).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_report_nonconforming_is_adverse() {
        let r = report(&input(uniform_sample()), &ReportOptions::default()).unwrap();
        assert_eq!(r.assessment, Assessment::Adverse);
        assert!(r.recommendations.len() >= 2);
    }
}
