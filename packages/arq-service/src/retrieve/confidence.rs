use crate::retrieve::Candidate;

/// The lexical confidence gate: accept top-1 over top-2 when the absolute
/// score clears the floor and the margin clears the gap. When the backend
/// returned no scores, a 1/rank proxy is used with the same thresholds, and
/// a rank gap of two or more is accepted outright.
pub(crate) fn confident_top1(candidates: &[Candidate], cfg: &arq_config::Confidence) -> bool {
	let Some(top1) = candidates.first() else {
		return false;
	};
	let top2 = candidates.get(1);

	let (score1, score2) = match top2 {
		Some(top2) if top1.score <= 0.0 && top2.score <= 0.0 => {
			if top2.rank.saturating_sub(top1.rank) >= 2 {
				return true;
			}

			(rank_proxy(top1), rank_proxy(top2))
		},
		Some(top2) => (top1.score, top2.score),
		None => {
			let score = if top1.score > 0.0 { top1.score } else { rank_proxy(top1) };

			return score >= cfg.min_top_score;
		},
	};

	score1 >= cfg.min_top_score && (score1 - score2) >= cfg.min_margin
}

/// The fused gate is margin-only: RRF scores have no meaningful absolute
/// scale, so there is no floor.
pub(crate) fn fused_confident_top1(candidates: &[Candidate], cfg: &arq_config::Confidence) -> bool {
	let Some(top1) = candidates.first() else {
		return false;
	};
	let Some(top2) = candidates.get(1) else {
		return true;
	};

	(top1.score - top2.score) >= cfg.fused_min_margin
}

fn rank_proxy(candidate: &Candidate) -> f32 {
	1.0 / candidate.rank.max(1) as f32
}
