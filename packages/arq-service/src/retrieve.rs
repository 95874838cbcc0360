pub mod confidence;
pub mod fusion;
pub mod rerank;

use arq_domain::{intent::IntentSet, normalize};
use arq_providers::FaqHit;

use crate::{ArqService, Result, TenantState};

/// A ranked FAQ document flowing through retrieval and re-ranking. The score
/// is mutable and accumulates reweighting and boosts; the rank is positional
/// only and assigned after sorting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
	pub id: String,
	pub slug: String,
	pub title: String,
	pub question: String,
	pub answer: String,
	pub aliases: Vec<String>,
	pub category: String,
	pub score: f32,
	pub rank: u32,
}

impl From<FaqHit> for Candidate {
	fn from(hit: FaqHit) -> Self {
		Self {
			id: hit.id,
			slug: hit.slug,
			title: hit.title,
			question: hit.question,
			answer: hit.answer,
			aliases: hit.aliases,
			category: hit.category,
			score: hit.score,
			rank: 0,
		}
	}
}

/// Outcome of the hybrid retrieval stage for one segment.
#[derive(Debug)]
pub(crate) enum Retrieved {
	/// Lexical top-1 passed the confidence gate; vector search was skipped.
	LexicalConfident(Candidate),
	/// RRF-fused top-1 passed the margin test.
	FusedConfident(Candidate),
	/// Near-tied candidates for the selector, score-descending.
	NeedsSelection(Vec<Candidate>),
	Empty,
}

impl ArqService {
	pub(crate) async fn retrieve(
		&self,
		tenant: &TenantState,
		query: &str,
		intents: &IntentSet,
	) -> Result<Retrieved> {
		let k = self.cfg.retrieval.candidate_k;
		let filter = intents.category_filter();
		let mut rows = self
			.providers
			.lexical
			.search(&self.cfg.providers.lexical, query, &tenant.name, filter.as_deref(), k)
			.await?;

		if let Some(requested) = filter.as_ref() {
			if rows.len() < self.cfg.retrieval.min_filtered_rows as usize {
				// Fallback A: the category filter starved the result set.
				let unfiltered = self
					.providers
					.lexical
					.search(&self.cfg.providers.lexical, query, &tenant.name, None, k)
					.await?;

				if unfiltered.len() > rows.len() {
					tracing::debug!(
						tenant = tenant.name.as_str(),
						filtered = rows.len(),
						unfiltered = unfiltered.len(),
						"Category filter starved lexical retrieval; kept unfiltered set."
					);

					rows = unfiltered;
				}
			} else if !top_rows_carry_category(&rows, requested, 3) {
				// Fallback B: the filter matched rows, but none of the head
				// rows belong to a requested category.
				rows = self
					.providers
					.lexical
					.search(&self.cfg.providers.lexical, query, &tenant.name, None, k)
					.await?;
			}
		}

		if rows.is_empty() {
			return Ok(Retrieved::Empty);
		}

		let mut candidates: Vec<Candidate> = rows.into_iter().map(Candidate::from).collect();

		reweight_fields(
			&mut candidates,
			query,
			self.cfg.retrieval.title_weight,
			self.cfg.retrieval.question_weight,
		);
		rerank::apply(&mut candidates, query, intents, &self.cfg.rerank);
		sort_and_rank(&mut candidates);
		candidates.truncate(self.cfg.retrieval.max_results as usize);

		if confidence::confident_top1(&candidates, &self.cfg.confidence) {
			let top = candidates.remove(0);

			return Ok(Retrieved::LexicalConfident(top));
		}

		if vector_skip_applies(tenant, intents) {
			return Ok(Retrieved::NeedsSelection(candidates));
		}

		let vector_query = expand_vector_query(query, intents, &self.cfg.retrieval.synonyms);
		let embedding = self.embedding_for(&vector_query).await?;
		let vector_rows = self
			.providers
			.vector
			.search(&self.cfg.providers.vector, &embedding, &tenant.name, filter.as_deref(), k)
			.await?;
		let vector_candidates: Vec<Candidate> =
			vector_rows.into_iter().map(Candidate::from).collect();
		let mut fused = fusion::fuse_rrf(
			&[
				(&candidates, self.cfg.fusion.lexical_weight),
				(&vector_candidates, self.cfg.fusion.vector_weight),
			],
			self.cfg.fusion.k_rrf,
		);

		fused.truncate(self.cfg.retrieval.max_results as usize);

		if confidence::fused_confident_top1(&fused, &self.cfg.confidence) {
			let top = fused.remove(0);

			return Ok(Retrieved::FusedConfident(top));
		}
		if fused.is_empty() {
			return Ok(Retrieved::Empty);
		}

		Ok(Retrieved::NeedsSelection(fused))
	}
}

/// Multiplies each candidate's score when the query (or one of its
/// significant tokens) appears in the title, else the question. Answer-body
/// matches carry no multiplier.
fn reweight_fields(
	candidates: &mut [Candidate],
	query: &str,
	title_weight: f32,
	question_weight: f32,
) {
	let folded_query = fold(query);
	let tokens = significant_tokens(&folded_query);

	for candidate in candidates {
		let title = fold(&candidate.title);

		if contains_query_or_token(&title, &folded_query, &tokens) {
			candidate.score *= title_weight;

			continue;
		}

		let question = fold(&candidate.question);

		if contains_query_or_token(&question, &folded_query, &tokens) {
			candidate.score *= question_weight;
		}
	}
}

fn contains_query_or_token(haystack: &str, query: &str, tokens: &[String]) -> bool {
	haystack.contains(query) || tokens.iter().any(|token| haystack.contains(token.as_str()))
}

/// Query tokens longer than two characters, with punctuation treated as
/// whitespace so "precio?" matches "precio".
fn significant_tokens(folded_query: &str) -> Vec<String> {
	let mut normalized = String::with_capacity(folded_query.len());

	for ch in folded_query.chars() {
		if ch.is_alphanumeric() {
			normalized.push(ch);
		} else {
			normalized.push(' ');
		}
	}

	normalized.split_whitespace().filter(|token| token.len() > 2).map(str::to_string).collect()
}

fn fold(text: &str) -> String {
	normalize::fold_accents(&text.to_lowercase())
}

fn top_rows_carry_category(rows: &[FaqHit], requested: &[String], head: usize) -> bool {
	rows.iter().take(head).any(|row| requested.iter().any(|category| *category == row.category))
}

fn vector_skip_applies(tenant: &TenantState, intents: &IntentSet) -> bool {
	if tenant.vector_skip.is_empty() {
		return false;
	}

	intents.intents().iter().all(|intent| tenant.vector_skip.contains(intent))
}

/// Appends the configured per-category synonym strings to the vector query.
fn expand_vector_query(
	query: &str,
	intents: &IntentSet,
	synonyms: &std::collections::HashMap<String, String>,
) -> String {
	if intents.is_unconstrained() {
		return query.to_string();
	}

	let mut out = query.to_string();

	for intent in intents.intents() {
		if let Some(extra) = synonyms.get(intent.as_str()) {
			let extra = extra.trim();

			if !extra.is_empty() {
				out.push(' ');
				out.push_str(extra);
			}
		}
	}

	out
}

pub(crate) fn sort_and_rank(candidates: &mut [Candidate]) {
	candidates.sort_by(|a, b| {
		b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
	});

	for (idx, candidate) in candidates.iter_mut().enumerate() {
		candidate.rank = idx as u32 + 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn candidate(id: &str, title: &str, question: &str, score: f32) -> Candidate {
		Candidate {
			id: id.to_string(),
			slug: id.to_string(),
			title: title.to_string(),
			question: question.to_string(),
			answer: String::new(),
			aliases: Vec::new(),
			category: "pricing".to_string(),
			score,
			rank: 0,
		}
	}

	#[test]
	fn title_match_outweighs_question_match() {
		let mut candidates = vec![
			candidate("a", "Retiro mínimo", "¿Cuál es el mínimo?", 0.5),
			candidate("b", "Otra cosa", "¿Cómo funciona el retiro?", 0.5),
		];

		reweight_fields(&mut candidates, "retiro", 2.0, 1.3);

		assert_eq!(candidates[0].score, 1.0);
		assert!((candidates[1].score - 0.65).abs() < 1e-6);
	}

	#[test]
	fn answer_only_matches_are_not_reweighted() {
		let mut candidates = vec![candidate("a", "Plataformas", "¿Qué soportan?", 0.5)];

		reweight_fields(&mut candidates, "retiro", 2.0, 1.3);

		assert_eq!(candidates[0].score, 0.5);
	}

	#[test]
	fn short_tokens_are_not_significant() {
		let tokens = significant_tokens("el la de retiro");

		assert_eq!(tokens, vec!["retiro".to_string()]);
	}

	#[test]
	fn punctuation_does_not_stick_to_tokens() {
		let tokens = significant_tokens("cual es el precio?");

		assert_eq!(tokens, vec!["cual".to_string(), "precio".to_string()]);
	}

	#[test]
	fn sort_assigns_positional_ranks() {
		let mut candidates = vec![
			candidate("a", "", "", 0.2),
			candidate("b", "", "", 0.9),
			candidate("c", "", "", 0.5),
		];

		sort_and_rank(&mut candidates);

		assert_eq!(candidates[0].id, "b");
		assert_eq!(candidates[0].rank, 1);
		assert_eq!(candidates[2].id, "a");
		assert_eq!(candidates[2].rank, 3);
	}

	#[test]
	fn vector_query_expansion_appends_synonyms_for_gated_intents() {
		use arq_domain::intent::{Intent, IntentSet};

		let mut synonyms = std::collections::HashMap::new();

		synonyms.insert("withdrawals".to_string(), "retiro payout cobro".to_string());

		let expanded = expand_vector_query(
			"como saco mi dinero",
			&IntentSet::of(vec![Intent::Withdrawals]),
			&synonyms,
		);

		assert_eq!(expanded, "como saco mi dinero retiro payout cobro");

		let unconstrained =
			expand_vector_query("como saco mi dinero", &IntentSet::unconstrained(), &synonyms);

		assert_eq!(unconstrained, "como saco mi dinero");
	}
}
