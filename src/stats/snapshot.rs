use crate::brand::Classifier;
use std::collections::BTreeMap;

/// One bucket of the brand histogram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandCount {
    pub label: String,
    pub count: u64,
}

/// Immutable copy of the brand histogram at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl StatsSnapshot {
    pub fn new(counts: BTreeMap<String, u64>, total: u64) -> Self {
        Self { counts, total }
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Number of counted users
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Percentage of counted users that fall under `count`
    pub fn share(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// All buckets ordered by count descending, then label ascending
    pub fn ranked(&self) -> Vec<BrandCount> {
        let mut ranked: Vec<BrandCount> = self
            .counts
            .iter()
            .map(|(label, count)| BrandCount {
                label: label.clone(),
                count: *count,
            })
            .collect();
        sort_ranked(&mut ranked);
        ranked
    }

    /// The `n` largest buckets in ranked order
    pub fn top_n(&self, n: usize) -> Vec<BrandCount> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// Splits the ranked buckets into recognized brands and everything else
    pub fn partition_known(&self, classifier: &dyn Classifier) -> (Vec<BrandCount>, Vec<BrandCount>) {
        self.ranked()
            .into_iter()
            .partition(|bucket| classifier.is_known(&bucket.label))
    }
}

fn sort_ranked(buckets: &mut [BrandCount]) {
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
}
