//! Niche Keywords - turning raw keyword metrics into a ranked shortlist
//!
//! - [`scorer`]: composite competitiveness score and top-N selection
//! - [`batch`]: provider-sized request batches and order-preserving merges
//! - [`expansion`]: keyword-for-keyword responses and scorer input records
//! - [`trends`]: interest-over-time responses flattened per keyword

pub mod batch;
pub mod expansion;
pub mod scorer;
pub mod trends;

pub use batch::{dedupe_keywords, merge_batches, partition, KeywordMap, TRENDS_BATCH_LIMIT};
pub use expansion::{
    count_result_objects, extract_keyword_metrics, parse_keyword_list, parse_metric_records,
};
pub use scorer::{
    KeywordScorer, NormalizedMetrics, ScoringWeights, DEFAULT_TOP_N, POLICY_WEIGHTS,
    SCORING_POLICY_VERSION,
};
pub use trends::{extract_trend_results, reshape_trends};
