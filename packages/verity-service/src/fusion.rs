//! Reciprocal rank fusion: `score(key) = Σ 1 / (k + rank)` over every list that ranks the key.
//!
//! Fused scores depend on list lengths and `k`, so they are only comparable within one call.

use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use crate::SourceHit;

/// Accumulated fusion score per candidate key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusionResult {
	scores: HashMap<String, f64>,
}
impl FusionResult {
	pub fn get(&self, key: &str) -> Option<f64> {
		self.scores.get(key).copied()
	}

	pub fn contains(&self, key: &str) -> bool {
		self.scores.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.scores.len()
	}

	pub fn is_empty(&self) -> bool {
		self.scores.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.scores.iter().map(|(key, score)| (key.as_str(), *score))
	}
}

/// Fuses ranked lists by position. Keyless hits are skipped but still occupy their rank, and a
/// key repeated within one list only counts at its best rank.
pub fn fuse(ranked_lists: &[&[SourceHit]], k: u32) -> FusionResult {
	let mut scores: HashMap<String, f64> = HashMap::new();

	for list in ranked_lists {
		let mut seen_in_list = HashSet::new();

		for (idx, hit) in list.iter().enumerate() {
			if !hit.has_key() || !seen_in_list.insert(hit.key.as_str()) {
				continue;
			}

			*scores.entry(hit.key.clone()).or_insert(0.0) += rrf_contribution(idx + 1, k);
		}
	}

	FusionResult { scores }
}

pub fn rrf_contribution(rank: usize, k: u32) -> f64 {
	1.0 / (f64::from(k) + rank as f64)
}

pub fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
