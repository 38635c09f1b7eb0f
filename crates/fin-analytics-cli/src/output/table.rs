use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{format_value, is_report};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        v if is_report(v) => print!("{}", render_report(v)),
        Value::Array(arr) => println!("{}", render_array(arr)),
        Value::Object(_) => println!("{}", render_flat_object(value)),
        _ => println!("{}", value),
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn render_report(report: &Value) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", text(report, "title")));
    let mut headline = format!("Assessment: {}", text(report, "assessment"));
    if let Some(score) = report.get("score").filter(|s| !s.is_null()) {
        headline.push_str(&format!("  Score: {}", format_value(score)));
    }
    out.push_str(&format!("{headline}\n\n"));

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value", "Unit", "Benchmark"]);
    if let Some(Value::Array(metrics)) = report.get("metrics") {
        for m in metrics {
            builder.push_record([
                text(m, "label").to_string(),
                m.get("value").map(format_value).unwrap_or_default(),
                text(m, "unit").to_string(),
                m.get("benchmark").map(format_value).unwrap_or_default(),
            ]);
        }
    }
    out.push_str(&format!("{}\n", Table::from(builder)));

    let interpretation = text(report, "interpretation");
    if !interpretation.is_empty() {
        out.push_str(&format!("\n{interpretation}\n"));
    }
    for (heading, key) in [("Recommendations", "recommendations"), ("Warnings", "warnings")] {
        if let Some(Value::Array(items)) = report.get(key) {
            if !items.is_empty() {
                out.push_str(&format!("\n{heading}:\n"));
                for item in items {
                    out.push_str(&format!("  - {}\n", format_value(item)));
                }
            }
        }
    }
    out.push_str(&format!("\nMethodology: {}\n", text(report, "methodology")));
    out
}

fn render_flat_object(value: &Value) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    if let Value::Object(map) = value {
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
    }
    Table::from(builder).to_string()
}

fn render_array(arr: &[Value]) -> String {
    let Some(Value::Object(first)) = arr.first() else {
        if arr.is_empty() {
            return "(empty)".to_string();
        }
        let items: Vec<String> = arr.iter().map(format_value).collect();
        return items.join("\n");
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    Table::from(builder).to_string()
}
