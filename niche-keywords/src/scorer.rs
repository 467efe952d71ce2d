//! Composite keyword scoring
//!
//! Each raw metric is mapped onto 0..=100 with a scale factor and a cap, then
//! blended with fixed weights:
//!
//! | metric              | normalized                         | weight |
//! |---------------------|------------------------------------|--------|
//! | search volume       | `min(volume / 1000, 100)`          | 0.4    |
//! | competition index   | `100 - index` (absent counts as 0) | 0.4    |
//! | cost per click      | `min(cpc * 10, 100)`               | 0.2    |
//!
//! Absent metrics contribute zero. For competition this is the worst case,
//! not a neutral value. Changing a weight changes rankings and must bump
//! [`SCORING_POLICY_VERSION`].

use niche_core::{KeywordMetric, ScoredKeyword};
use tracing::debug;

/// Identifies the weights and caps below
pub const SCORING_POLICY_VERSION: &str = "comps-v1";

/// Shortlist size used by keyword expansion
pub const DEFAULT_TOP_N: usize = 40;

const SEARCH_VOLUME_SCALE: f64 = 1000.0;
const CPC_SCALE: f64 = 10.0;
const NORMALIZED_CAP: f64 = 100.0;

/// Blend weights; they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub search_volume: f64,
    pub competition: f64,
    pub cpc: f64,
}

pub const POLICY_WEIGHTS: ScoringWeights = ScoringWeights {
    search_volume: 0.4,
    competition: 0.4,
    cpc: 0.2,
};

/// Per-metric contributions on the common 0..=100 scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedMetrics {
    pub search_volume: f64,
    pub competition: f64,
    pub cpc: f64,
}

/// Stateless scorer for keyword candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn weights(&self) -> ScoringWeights {
        POLICY_WEIGHTS
    }

    /// Map raw metrics onto 0..=100; never fails
    pub fn normalize(&self, metric: &KeywordMetric) -> NormalizedMetrics {
        let search_volume = metric
            .search_volume
            .map(|v| (v as f64 / SEARCH_VOLUME_SCALE).min(NORMALIZED_CAP))
            .unwrap_or(0.0);

        let competition = metric
            .competition_index
            .filter(|ci| ci.is_finite())
            .map(|ci| NORMALIZED_CAP - ci.clamp(0.0, NORMALIZED_CAP))
            .unwrap_or(0.0);

        let cpc = metric
            .cpc
            .filter(|c| c.is_finite() && *c >= 0.0)
            .map(|c| (c * CPC_SCALE).min(NORMALIZED_CAP))
            .unwrap_or(0.0);

        NormalizedMetrics {
            search_volume,
            competition,
            cpc,
        }
    }

    /// Composite score rounded to two decimals
    pub fn score(&self, metric: &KeywordMetric) -> f64 {
        let n = self.normalize(metric);
        let w = self.weights();
        round2(w.search_volume * n.search_volume + w.competition * n.competition + w.cpc * n.cpc)
    }

    /// One scored entry per metric, in input order
    pub fn score_all(&self, metrics: Vec<KeywordMetric>) -> Vec<ScoredKeyword> {
        metrics
            .into_iter()
            .map(|metric| {
                let composite_score = self.score(&metric);
                ScoredKeyword {
                    metric,
                    composite_score,
                }
            })
            .collect()
    }

    /// Highest scores first, ties keep input order, at most `n` entries
    pub fn select_top(&self, mut scored: Vec<ScoredKeyword>, n: usize) -> Vec<ScoredKeyword> {
        // sort_by is stable, which is what keeps ties in input order
        scored.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
        scored.truncate(n);
        scored
    }

    /// Score and shortlist in one go
    pub fn rank(&self, metrics: Vec<KeywordMetric>, n: usize) -> Vec<ScoredKeyword> {
        let candidates = metrics.len();
        let ranked = self.select_top(self.score_all(metrics), n);
        debug!(
            candidates,
            selected = ranked.len(),
            top_n = n,
            policy = SCORING_POLICY_VERSION,
            "Ranked keyword candidates"
        );
        ranked
    }
}

/// Round the stored double to two decimals, deciding from its exact decimal
/// expansion; scaling by 100 first can push a value just below a half-cent
/// tie over it
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(keyword: &str, sv: Option<u64>, ci: Option<f64>, cpc: Option<f64>) -> KeywordMetric {
        KeywordMetric {
            keyword: keyword.to_string(),
            competition: None,
            competition_index: ci,
            search_volume: sv,
            cpc,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = POLICY_WEIGHTS;
        assert!((w.search_volume + w.competition + w.cpc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_desk_lamp_example() {
        let scorer = KeywordScorer::new();
        let m = metric("desk lamp", Some(2000), Some(30.0), Some(1.5));

        let n = scorer.normalize(&m);
        assert!((n.search_volume - 2.0).abs() < 1e-9);
        assert!((n.competition - 70.0).abs() < 1e-9);
        assert!((n.cpc - 15.0).abs() < 1e-9);
        assert_eq!(scorer.score(&m), 31.8);
    }

    #[test]
    fn test_all_absent_scores_zero() {
        let scorer = KeywordScorer::new();
        let m = metric("x", None, None, None);
        assert_eq!(
            scorer.normalize(&m),
            NormalizedMetrics {
                search_volume: 0.0,
                competition: 0.0,
                cpc: 0.0
            }
        );
        assert_eq!(scorer.score(&m), 0.0);
    }

    #[test]
    fn test_search_volume_saturates() {
        let scorer = KeywordScorer::new();
        for sv in [100_000u64, 100_001, 2_500_000, u64::MAX] {
            let n = scorer.normalize(&metric("big", Some(sv), None, None));
            assert_eq!(n.search_volume, 100.0, "volume {}", sv);
        }
        let n = scorer.normalize(&metric("small", Some(99_000), None, None));
        assert_eq!(n.search_volume, 99.0);
    }

    #[test]
    fn test_missing_competition_is_worst_case() {
        let scorer = KeywordScorer::new();
        let absent = scorer.normalize(&metric("a", Some(5000), None, Some(1.0)));
        let zero = scorer.normalize(&metric("a", Some(5000), Some(0.0), Some(1.0)));
        assert_eq!(absent.competition, 0.0);
        assert_eq!(zero.competition, 100.0);
    }

    #[test]
    fn test_cpc_caps_at_ten() {
        let scorer = KeywordScorer::new();
        assert_eq!(scorer.normalize(&metric("a", None, None, Some(10.0))).cpc, 100.0);
        assert_eq!(scorer.normalize(&metric("a", None, None, Some(37.5))).cpc, 100.0);
        assert_eq!(scorer.normalize(&metric("a", None, None, Some(0.0))).cpc, 0.0);
    }

    #[test]
    fn test_out_of_range_inputs_stay_on_scale() {
        let scorer = KeywordScorer::new();
        let n = scorer.normalize(&metric("a", None, Some(140.0), Some(-3.0)));
        assert_eq!(n.competition, 0.0);
        assert_eq!(n.cpc, 0.0);
        let n = scorer.normalize(&metric("a", None, Some(f64::NAN), None));
        assert_eq!(n.competition, 0.0);
    }

    #[test]
    fn test_rounding_uses_the_stored_value() {
        let scorer = KeywordScorer::new();
        // blends to 57.80499999999999972 as a double
        let m = metric("below tie", Some(67_231), Some(28.0), Some(1.0563));
        assert_eq!(scorer.score(&m), 57.8);

        assert_eq!(round2(31.8), 31.8);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(99.999), 100.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let scorer = KeywordScorer::new();
        let m = metric("standing desk", Some(74_000), Some(88.0), Some(2.37));
        assert_eq!(scorer.score(&m), scorer.score(&m.clone()));
    }

    #[test]
    fn test_maximum_score_is_one_hundred() {
        let scorer = KeywordScorer::new();
        let m = metric("best", Some(1_000_000), Some(0.0), Some(50.0));
        assert_eq!(scorer.score(&m), 100.0);
    }

    #[test]
    fn test_select_top_orders_and_truncates() {
        let scorer = KeywordScorer::new();
        let scored = scorer.score_all(vec![
            metric("low", Some(1000), Some(90.0), None),
            metric("high", Some(90_000), Some(10.0), Some(4.0)),
            metric("mid", Some(20_000), Some(50.0), Some(1.0)),
        ]);

        let top = scorer.select_top(scored.clone(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].keyword(), "high");
        assert_eq!(top[1].keyword(), "mid");

        let all = scorer.select_top(scored, 10);
        assert_eq!(all.len(), 3);
        assert!(all
            .windows(2)
            .all(|w| w[0].composite_score >= w[1].composite_score));
    }

    #[test]
    fn test_select_top_keeps_input_order_on_ties() {
        let scorer = KeywordScorer::new();
        let scored = scorer.score_all(vec![
            metric("first", Some(1000), Some(50.0), None),
            metric("better", Some(50_000), Some(50.0), None),
            metric("second", Some(1000), Some(50.0), None),
            metric("third", Some(1000), Some(50.0), None),
        ]);

        let names: Vec<_> = scorer
            .select_top(scored, 4)
            .iter()
            .map(|s| s.keyword().to_string())
            .collect();
        assert_eq!(names, vec!["better", "first", "second", "third"]);
    }

    #[test]
    fn test_select_top_edge_bounds() {
        let scorer = KeywordScorer::new();
        assert!(scorer.select_top(Vec::new(), DEFAULT_TOP_N).is_empty());

        let scored = scorer.score_all(vec![metric("only", Some(10), None, None)]);
        assert!(scorer.select_top(scored.clone(), 0).is_empty());
        assert_eq!(scorer.select_top(scored, DEFAULT_TOP_N).len(), 1);
    }

    #[test]
    fn test_rank_scores_every_candidate_once() {
        let scorer = KeywordScorer::new();
        let metrics: Vec<_> = (0..60)
            .map(|i| metric(&format!("kw{}", i), Some(i * 1500), Some((i % 100) as f64), None))
            .collect();

        let ranked = scorer.rank(metrics, DEFAULT_TOP_N);
        assert_eq!(ranked.len(), DEFAULT_TOP_N);

        let mut names: Vec<_> = ranked.iter().map(|s| s.keyword().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_TOP_N);
    }
}
