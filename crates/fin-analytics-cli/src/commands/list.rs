use clap::Args;
use fin_analytics_core::{list_analyses, AnalysisCategory, Language};
use serde_json::{json, Value};

use crate::config::Settings;

/// Arguments for listing the catalogue
#[derive(Args)]
pub struct ListArgs {
    /// Only show one category: fraud, ratios, cash_flow, performance, portfolio_risk, quantitative
    #[arg(long)]
    pub category: Option<String>,
}

pub fn run_list(args: ListArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let category = args
        .category
        .as_deref()
        .map(str::parse::<AnalysisCategory>)
        .transpose()?;
    Ok(listing(category, settings.options.language))
}

fn listing(category: Option<AnalysisCategory>, lang: Language) -> Value {
    let rows: Vec<Value> = list_analyses(category)
        .into_iter()
        .map(|l| {
            let title = match lang {
                Language::English => l.title_en,
                Language::Arabic => l.title_ar,
            };
            json!({
                "name": l.name,
                "category": l.category.label(lang),
                "title": title,
            })
        })
        .collect();
    Value::Array(rows)
}
