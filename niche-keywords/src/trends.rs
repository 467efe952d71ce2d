//! Trends response reshaping

use crate::batch::KeywordMap;
use niche_core::{ErrorContext, KeywordTrends, NicheError, NicheResult, TrendPoint};
use serde_json::Value;

const GRAPH_ITEM_TYPE: &str = "google_trends_graph";

/// Attach every result of an explore response to each keyword it covers
///
/// A response without `tasks` is a provider-side failure and carries the
/// provider's `status_message`.
pub fn extract_trend_results(response: &Value) -> NicheResult<KeywordMap<Value>> {
    let Some(tasks) = response.get("tasks").and_then(Value::as_array) else {
        let status_message = response
            .get("status_message")
            .and_then(Value::as_str)
            .unwrap_or("response carried no tasks");
        return Err(NicheError::Provider {
            provider: "dataforseo".to_string(),
            message: status_message.to_string(),
            status: None,
            context: ErrorContext::new("trends").with_operation("extract_trend_results"),
        });
    };

    let mut results = KeywordMap::new();
    for task in tasks {
        let Some(task_results) = task.get("result").and_then(Value::as_array) else {
            continue;
        };
        for result in task_results {
            for keyword in result
                .get("keywords")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
            {
                results.insert(keyword, result.clone());
            }
        }
    }
    Ok(results)
}

/// Flatten graph items into one time series per keyword
///
/// Explore results list several keywords at once; a data point either has a
/// scalar `value` or a `values` array aligned with the result's `keywords`.
pub fn reshape_trends(results: &KeywordMap<Value>) -> KeywordMap<KeywordTrends> {
    results
        .iter()
        .map(|(keyword, result)| {
            let position = result
                .get("keywords")
                .and_then(Value::as_array)
                .and_then(|ks| ks.iter().position(|k| k.as_str() == Some(keyword)));

            let trends_data = result
                .get("items")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some(GRAPH_ITEM_TYPE))
                .flat_map(|item| {
                    item.get("data")
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                })
                .map(|point| trend_point(point, position))
                .collect();

            (keyword.to_string(), KeywordTrends { trends_data })
        })
        .collect()
}

fn trend_point(point: &Value, position: Option<usize>) -> TrendPoint {
    let value = point.get("value").and_then(Value::as_f64).or_else(|| {
        let values = point.get("values").and_then(Value::as_array)?;
        values.get(position.unwrap_or(0)).and_then(Value::as_f64)
    });

    TrendPoint {
        date_from: point.get("date_from").and_then(Value::as_str).map(str::to_string),
        date_to: point.get("date_to").and_then(Value::as_str).map(str::to_string),
        timestamp: point.get("timestamp").and_then(Value::as_i64),
        value,
    }
}
