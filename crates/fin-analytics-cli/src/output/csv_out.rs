use serde_json::Value;
use std::io;

use super::{format_value, is_report};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output error: {}", e);
    }
}

pub fn write_csv<W: io::Write>(writer: W, value: &Value) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    match value {
        v if is_report(v) => {
            wtr.write_record(["key", "label", "value", "unit", "benchmark"])?;
            if let Some(Value::Array(metrics)) = v.get("metrics") {
                for m in metrics {
                    let field = |k: &str| m.get(k).map(format_value).unwrap_or_default();
                    wtr.write_record([
                        field("key"),
                        field("label"),
                        field("value"),
                        field("unit"),
                        field("benchmark"),
                    ])?;
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr)?,
        Value::Object(map) => {
            wtr.write_record(["field", "value"])?;
            for (key, val) in map {
                wtr.write_record([key.as_str(), &format_value(val)])?;
            }
        }
        _ => wtr.write_record([&format_value(value)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> Result<(), csv::Error> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&format_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_report_rows_per_metric() {
        let report = json!({
            "metrics": [
                {"key": "current_ratio", "label": "Current ratio", "value": "1.5", "unit": "ratio", "benchmark": "2"},
                {"key": "quick_ratio", "label": "Quick ratio", "value": "0.9", "unit": "ratio"}
            ]
        });
        assert_eq!(
            render(&report),
            "key,label,value,unit,benchmark\n\
             current_ratio,Current ratio,1.5,ratio,2\n\
             quick_ratio,Quick ratio,0.9,ratio,\n"
        );
    }

    #[test]
    fn test_listing_rows() {
        let rows = json!([{"name": "var", "title": "VaR"}, {"name": "beta_analysis", "title": "Beta"}]);
        let out = render(&rows);
        assert!(out.starts_with("name,title\n"));
        assert_eq!(out.lines().count(), 3);
    }
}
