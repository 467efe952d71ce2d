//! End-to-end checks of the scorer's input/output contract

use niche_keywords::{
    extract_keyword_metrics, parse_metric_records, partition, KeywordScorer, DEFAULT_TOP_N,
    TRENDS_BATCH_LIMIT,
};
use serde_json::{json, Value};

#[test]
fn test_records_in_scored_records_out() {
    let input = json!([
        {"keyword": "x", "search_volume": null, "competition_index": null, "cpc": null},
        {"keyword": "desk lamp", "search_volume": 2000, "competition_index": 30, "cpc": 1.5},
        {"keyword": "ergonomic chair", "search_volume": 246000, "competition_index": 100, "cpc": 3.2}
    ]);

    let scorer = KeywordScorer::new();
    let ranked = scorer.rank(parse_metric_records(&input).unwrap(), DEFAULT_TOP_N);
    let output: Value = serde_json::to_value(&ranked).unwrap();

    let rows = output.as_array().unwrap();
    assert_eq!(rows.len(), 3);

    // 0.4 * 100 + 0 + 0.2 * 32
    assert_eq!(rows[0]["keyword"], json!("ergonomic chair"));
    assert_eq!(rows[0]["composite_score"], json!(46.4));
    assert_eq!(rows[1]["keyword"], json!("desk lamp"));
    assert_eq!(rows[1]["composite_score"], json!(31.8));
    assert_eq!(rows[2]["keyword"], json!("x"));
    assert_eq!(rows[2]["composite_score"], json!(0.0));

    // Input fields survive next to the score
    assert_eq!(rows[1]["search_volume"], json!(2000));
    assert_eq!(rows[1]["cpc"], json!(1.5));
}

#[test]
fn test_expansion_response_to_shortlist() {
    let items: Vec<Value> = (0..100)
        .map(|i| {
            json!({
                "keyword": format!("desk accessory {}", i),
                "competition_index": (i * 7) % 101,
                "search_volume": i * 900,
                "cpc": (i as f64) / 20.0
            })
        })
        .collect();
    let response = json!({"tasks": [{"result": items}]});

    let scorer = KeywordScorer::new();
    let metrics = extract_keyword_metrics(&response).unwrap();
    assert_eq!(metrics.len(), 100);

    let shortlist = scorer.rank(metrics, DEFAULT_TOP_N);
    assert_eq!(shortlist.len(), DEFAULT_TOP_N);
    assert!(shortlist
        .windows(2)
        .all(|w| w[0].composite_score >= w[1].composite_score));
}

#[test]
fn test_select_top_never_exceeds_bounds() {
    let scorer = KeywordScorer::new();
    let input = json!([
        {"keyword": "a", "search_volume": 10},
        {"keyword": "b", "search_volume": 20},
        {"keyword": "c", "search_volume": 30}
    ]);
    let metrics = parse_metric_records(&input).unwrap();

    for n in 0..6 {
        let top = scorer.rank(metrics.clone(), n);
        assert!(top.len() <= n);
        assert!(top.len() <= metrics.len());
    }
}

#[test]
fn test_malformed_top_level_is_rejected() {
    let err = parse_metric_records(&json!({"records": []})).unwrap_err();
    assert!(err.to_string().contains("expected a JSON array"));
}

#[test]
fn test_batches_cover_every_keyword_once() {
    let keywords: Vec<String> = (0..23).map(|i| format!("k{}", i)).collect();
    let batches = partition(&keywords, TRENDS_BATCH_LIMIT);

    assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= TRENDS_BATCH_LIMIT));
    assert_eq!(batches.concat(), keywords);
}
