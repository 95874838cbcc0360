use std::collections::HashMap;

use crate::retrieve::{Candidate, sort_and_rank};

/// Weighted Reciprocal Rank Fusion:
/// `score(doc) = Σ_source weight[source] / (k_rrf + rank_in_source)`.
///
/// Lists are fused by document id; the document body is taken from the first
/// list that carries it. The fused scores are normalized to the top score so
/// the margin gate works on a stable scale. Lineage to the originating lists
/// is not retained.
pub(crate) fn fuse_rrf(lists: &[(&[Candidate], f32)], k_rrf: f32) -> Vec<Candidate> {
	let mut scores: HashMap<&str, f32> = HashMap::new();
	let mut order: Vec<&str> = Vec::new();
	let mut docs: HashMap<&str, &Candidate> = HashMap::new();

	for (list, weight) in lists {
		for (idx, candidate) in list.iter().enumerate() {
			let rank = idx as f32 + 1.0;
			let contribution = weight / (k_rrf + rank);
			let entry = scores.entry(candidate.id.as_str()).or_insert_with(|| {
				order.push(candidate.id.as_str());
				docs.insert(candidate.id.as_str(), candidate);

				0.0
			});

			*entry += contribution;
		}
	}

	let mut fused: Vec<Candidate> = order
		.into_iter()
		.map(|id| {
			let mut candidate = docs[id].clone();

			candidate.score = scores[id];
			candidate.rank = 0;

			candidate
		})
		.collect();

	sort_and_rank(&mut fused);

	if let Some(top) = fused.first().map(|candidate| candidate.score)
		&& top > 0.0
	{
		for candidate in &mut fused {
			candidate.score /= top;
		}
	}

	fused
}
