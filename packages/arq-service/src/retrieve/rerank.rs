use std::sync::LazyLock;

use regex::Regex;

use arq_domain::{
	intent::{self, Intent, IntentSet},
	normalize,
};

use crate::retrieve::Candidate;

/// Tracks additive boosts against a running cumulative cap. Each step raises
/// the cap by its own amount and can only consume the remaining headroom, so
/// no boost chain exceeds its declared cumulative cap.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoostLedger {
	applied: f32,
	cap: f32,
}

impl BoostLedger {
	pub(crate) fn new() -> Self {
		Self { applied: 0.0, cap: 0.0 }
	}

	pub(crate) fn grant(&mut self, amount: f32, matched: bool) -> f32 {
		self.cap += amount;

		if !matched || amount <= 0.0 {
			return 0.0;
		}

		let headroom = (self.cap - self.applied).max(0.0);
		let granted = amount.min(headroom);

		self.applied += granted;

		granted
	}

	pub(crate) fn applied(&self) -> f32 {
		self.applied
	}

	pub(crate) fn cap(&self) -> f32 {
		self.cap
	}
}

static NUMERIC_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\$?\d{1,3}(?:[.,]\d{3})+|\$?\d+\s*k\b|\$?\d{4,}")
		.expect("Numeric token pattern must compile.")
});

fn slug_keywords(intent: Intent) -> &'static [&'static str] {
	match intent {
		Intent::Withdrawals => &["withdrawal", "retiro", "payout", "cobro"],
		Intent::PaymentMethods => &["payment", "pago", "metodo"],
		Intent::Rules => &["rule", "regla", "drawdown", "consistency", "consistencia"],
		Intent::Pricing => &["price", "pricing", "precio", "cost"],
		Intent::Platforms => &["platform", "plataforma", "ninjatrader", "tradingview", "rithmic"],
		Intent::Discounts => &["discount", "descuento", "cupon", "promo"],
	}
}

/// The heuristic re-ranking pass over lexical candidates: capped additive
/// boosts, then the hard pair/category overrides that sit outside the cap.
pub(crate) fn apply(
	candidates: &mut [Candidate],
	query: &str,
	intents: &IntentSet,
	cfg: &arq_config::Rerank,
) {
	let folded_query = fold(query);
	let query_phrases = phrases(&folded_query);
	let query_numbers = numeric_tokens(&folded_query);
	let withdrawal_context = intent::has_withdrawal_tokens(&folded_query);

	for candidate in candidates.iter_mut() {
		let title = fold(&candidate.title);
		let question = fold(&candidate.question);
		let slug = fold(&candidate.slug);
		let mut ledger = BoostLedger::new();

		let alias_matched = candidate
			.aliases
			.iter()
			.any(|alias| !alias.trim().is_empty() && folded_query.contains(&fold(alias)));

		candidate.score += ledger.grant(cfg.alias_boost, alias_matched);
		candidate.score +=
			ledger.grant(cfg.title_phrase_boost, phrase_match(&query_phrases, &title));
		candidate.score +=
			ledger.grant(cfg.question_phrase_boost, phrase_match(&query_phrases, &question));

		let numbers_shared = !query_numbers.is_empty()
			&& numeric_tokens(&format!("{title} {question}"))
				.iter()
				.any(|token| query_numbers.contains(token));

		candidate.score += ledger.grant(cfg.numeric_boost, numbers_shared);

		// Slug agreement only means something when the gate actually
		// constrained the set.
		let gated = !intents.is_unconstrained();
		let slug_agrees = gated
			&& intents
				.intents()
				.iter()
				.any(|intent| slug_keywords(*intent).iter().any(|keyword| slug.contains(keyword)));

		candidate.score += ledger.grant(cfg.intent_slug_boost, slug_agrees);

		if gated && !slug_agrees {
			let slug_rivals = Intent::ALL
				.into_iter()
				.filter(|other| !intents.contains(*other))
				.any(|other| slug_keywords(other).iter().any(|keyword| slug.contains(keyword)));

			if slug_rivals {
				candidate.score -= cfg.intent_slug_demote;
			}
		}

		// Hard overrides below bypass the additive cap.
		let withdrawals_gated = gated && intents.contains(Intent::Withdrawals);

		for pair in &cfg.confusables {
			let triggered = withdrawals_gated
				|| pair.triggers.iter().any(|trigger| contains_word(&folded_query, trigger));

			if !triggered {
				continue;
			}

			if candidate.id == pair.boost_faq {
				candidate.score += pair.boost;
			} else if candidate.id == pair.demote_faq {
				candidate.score += pair.demote;
			}
		}

		if withdrawal_context && slug.contains("safety") {
			candidate.score -= cfg.safety_net_demote;
		}
	}
}

/// Consecutive 2- and 3-token phrases from the query; trigrams first so the
/// stronger match wins. Punctuation is treated as whitespace.
fn phrases(folded_query: &str) -> Vec<String> {
	let mut normalized = String::with_capacity(folded_query.len());

	for ch in folded_query.chars() {
		if ch.is_alphanumeric() {
			normalized.push(ch);
		} else {
			normalized.push(' ');
		}
	}

	let tokens: Vec<&str> =
		normalized.split_whitespace().filter(|token| token.len() > 2).collect();
	let mut out = Vec::new();

	for window in tokens.windows(3) {
		out.push(window.join(" "));
	}
	for window in tokens.windows(2) {
		out.push(window.join(" "));
	}

	out
}

fn phrase_match(query_phrases: &[String], text: &str) -> bool {
	query_phrases.iter().any(|phrase| text.contains(phrase.as_str()))
}

fn numeric_tokens(text: &str) -> Vec<String> {
	NUMERIC_TOKEN_RE
		.find_iter(text)
		.map(|m| m.as_str().replace([' ', '$'], "").replace(',', "."))
		.collect()
}

fn contains_word(text: &str, word: &str) -> bool {
	text.split_whitespace().any(|token| token.trim_matches(|ch: char| !ch.is_alphanumeric()) == word)
}

fn fold(text: &str) -> String {
	normalize::fold_accents(&text.to_lowercase())
}
