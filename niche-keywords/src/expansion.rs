//! Keyword expansion inputs and outputs
//!
//! Converts the nested keywords-for-keywords response (`tasks[].result[]`)
//! into flat [`KeywordMetric`] records, and validates the flat record arrays
//! accepted by the scorer.

use niche_core::{validation_error, KeywordMetric, NicheResult};
use serde_json::Value;
use tracing::debug;

/// Split a comma separated keyword list, trimming and dropping blanks
pub fn parse_keyword_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Total number of `result` objects across all tasks
pub fn count_result_objects(response: &Value) -> usize {
    tasks(response)
        .map(|task| task.get("result").and_then(Value::as_array).map_or(0, Vec::len))
        .sum()
}

/// Flatten a keywords-for-keywords response into metric records
///
/// Items without a usable keyword are skipped; numeric fields that are null
/// or of the wrong type become absent.
pub fn extract_keyword_metrics(response: &Value) -> NicheResult<Vec<KeywordMetric>> {
    if !response.is_object() {
        return Err(validation_error!(
            "keyword expansion response must be a JSON object",
            "response",
            "keyword_expansion"
        ));
    }

    let mut metrics = Vec::new();
    let mut skipped = 0usize;

    for task in tasks(response) {
        let Some(items) = task.get("result").and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            match metric_from_item(item) {
                Some(metric) => metrics.push(metric),
                None => skipped += 1,
            }
        }
    }

    debug!(
        extracted = metrics.len(),
        skipped, "Extracted keyword metrics from expansion response"
    );
    Ok(metrics)
}

/// Parse the scorer's input contract: a JSON array of keyword records
///
/// Anything else is rejected as a whole; there is no partial recovery.
pub fn parse_metric_records(input: &Value) -> NicheResult<Vec<KeywordMetric>> {
    let Some(records) = input.as_array() else {
        return Err(validation_error!(
            "expected a JSON array of keyword records",
            "records",
            "keyword_records"
        ));
    };

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            if !record.is_object() {
                return Err(validation_error!(
                    format!("record {} is not an object", i),
                    format!("records[{}]", i),
                    "keyword_records"
                ));
            }
            metric_from_item(record).ok_or_else(|| {
                validation_error!(
                    format!("record {} has no non-empty 'keyword' string", i),
                    format!("records[{}].keyword", i),
                    "keyword_records"
                )
            })
        })
        .collect()
}

fn tasks(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("tasks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn metric_from_item(item: &Value) -> Option<KeywordMetric> {
    let keyword = item
        .get("keyword")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|k| !k.is_empty())?;

    Some(KeywordMetric {
        keyword: keyword.to_string(),
        competition: item
            .get("competition")
            .and_then(Value::as_str)
            .map(str::to_string),
        competition_index: item.get("competition_index").and_then(Value::as_f64),
        search_volume: non_negative(item.get("search_volume")).map(|v| v.round() as u64),
        cpc: non_negative(item.get("cpc")),
    })
}

fn non_negative(value: Option<&Value>) -> Option<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> Value {
        json!({
            "status_code": 20000,
            "tasks": [{
                "status_code": 20000,
                "result": [
                    {
                        "keyword": "standing desk",
                        "competition": "HIGH",
                        "competition_index": 100,
                        "search_volume": 135000,
                        "cpc": 2.71
                    },
                    {
                        "keyword": "cable management tray",
                        "competition": null,
                        "competition_index": null,
                        "search_volume": 2400,
                        "cpc": null
                    },
                    { "keyword": null, "search_volume": 10 },
                    { "keyword": "desk shelf", "search_volume": "lots", "cpc": -1 }
                ]
            }, {
                "status_code": 40501,
                "result": null
            }]
        })
    }

    #[test]
    fn test_parse_keyword_list() {
        assert_eq!(
            parse_keyword_list(" desk gadgets, office accessories ,,workplace tech "),
            vec!["desk gadgets", "office accessories", "workplace tech"]
        );
        assert!(parse_keyword_list(" , ").is_empty());
    }

    #[test]
    fn test_extract_keyword_metrics() {
        let metrics = extract_keyword_metrics(&sample_response()).unwrap();
        assert_eq!(metrics.len(), 3);

        assert_eq!(metrics[0].keyword, "standing desk");
        assert_eq!(metrics[0].competition.as_deref(), Some("HIGH"));
        assert_eq!(metrics[0].competition_index, Some(100.0));
        assert_eq!(metrics[0].search_volume, Some(135_000));
        assert_eq!(metrics[0].cpc, Some(2.71));

        assert_eq!(metrics[1].competition_index, None);
        assert_eq!(metrics[1].cpc, None);

        assert_eq!(metrics[2].keyword, "desk shelf");
        assert_eq!(metrics[2].search_volume, None);
        assert_eq!(metrics[2].cpc, None);
    }

    #[test]
    fn test_count_result_objects() {
        assert_eq!(count_result_objects(&sample_response()), 4);
        assert_eq!(count_result_objects(&json!({})), 0);
    }

    #[test]
    fn test_missing_tasks_yields_nothing() {
        let metrics = extract_keyword_metrics(&json!({"status_message": "oops"})).unwrap();
        assert!(metrics.is_empty());
        assert!(extract_keyword_metrics(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_metric_records_accepts_sparse_records() {
        let records = json!([
            {"keyword": "desk lamp", "search_volume": 2000, "competition_index": 30, "cpc": 1.5},
            {"keyword": "x"}
        ]);
        let metrics = parse_metric_records(&records).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].search_volume, Some(2000));
        assert_eq!(metrics[1], KeywordMetric::new("x"));
    }

    #[test]
    fn test_out_of_range_competition_reaches_the_scorer() {
        let records = json!([
            {"keyword": "negative", "competition_index": -5},
            {"keyword": "over", "competition_index": 130}
        ]);
        let metrics = parse_metric_records(&records).unwrap();
        assert_eq!(metrics[0].competition_index, Some(-5.0));
        assert_eq!(metrics[1].competition_index, Some(130.0));

        let scorer = crate::KeywordScorer::new();
        assert_eq!(scorer.normalize(&metrics[0]).competition, 100.0);
        assert_eq!(scorer.normalize(&metrics[1]).competition, 0.0);
    }

    #[test]
    fn test_parse_metric_records_rejects_malformed_input() {
        assert!(parse_metric_records(&json!({"keyword": "x"})).is_err());
        assert!(parse_metric_records(&json!([{"keyword": "ok"}, 7])).is_err());
        assert!(parse_metric_records(&json!([{"search_volume": 10}])).is_err());
        assert!(parse_metric_records(&json!([])).unwrap().is_empty());
    }
}
