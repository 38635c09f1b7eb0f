use serde_json::Value;

use super::{format_value, is_report};

/// Print just the headline of the output.
///
/// Reports print `name: score (assessment)`, falling back to the first
/// metric when the analysis has no score. Listings print one name per line.
pub fn print_minimal(value: &Value) {
    println!("{}", render_minimal(value));
}

fn render_minimal(value: &Value) -> String {
    if is_report(value) {
        let name = value.get("name").map(format_value).unwrap_or_default();
        let assessment = value.get("assessment").map(format_value).unwrap_or_default();
        let headline = value
            .get("score")
            .filter(|s| !s.is_null())
            .or_else(|| {
                value
                    .get("metrics")
                    .and_then(|m| m.get(0))
                    .and_then(|m| m.get("value"))
            })
            .map(format_value)
            .unwrap_or_default();
        return format!("{name}: {headline} ({assessment})");
    }

    match value {
        Value::Array(arr) => arr
            .iter()
            .map(|item| item.get("name").map(format_value).unwrap_or_else(|| format_value(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => format_value(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_headline() {
        let report = json!({
            "name": "piotroski_f_score",
            "assessment": "favourable",
            "score": "8",
            "metrics": [{"key": "f", "value": "8"}]
        });
        assert_eq!(render_minimal(&report), "piotroski_f_score: 8 (favourable)");
    }

    #[test]
    fn test_report_without_score_uses_first_metric() {
        let report = json!({
            "name": "current_ratio",
            "assessment": "neutral",
            "metrics": [{"key": "current_ratio", "value": "1.4"}]
        });
        assert_eq!(render_minimal(&report), "current_ratio: 1.4 (neutral)");
    }

    #[test]
    fn test_listing_names() {
        let rows = json!([{"name": "var"}, {"name": "beta_analysis"}]);
        assert_eq!(render_minimal(&rows), "var\nbeta_analysis");
    }
}
