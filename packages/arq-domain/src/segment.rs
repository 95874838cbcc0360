use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\by tambien\b|\bademas\b|\bpor otro lado\b|[,;]|\.\s")
		.expect("Separator pattern must compile.")
});
static SENTENCE_BREAK_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[.;\n]+").expect("Sentence break pattern must compile."));

/// Topic extractors used when a long query has no explicit question or
/// separator structure. Evaluated in order.
static TOPIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	[
		r"precio|costo|cuanto|mensualidad",
		r"regla|norma|consistencia|contrato",
		r"retir\w*|payout|cobr\w*",
		r"cuenta\w*",
		r"pago\w*|metodo\w*",
		r"drawdown|riesgo|safety",
	]
	.into_iter()
	.map(|pattern| Regex::new(pattern).expect("Topic pattern must compile."))
	.collect()
});

pub fn needs_segmentation(text: &str, cfg: &arq_config::Preprocess) -> bool {
	if text.chars().count() > cfg.segment_trigger_chars as usize {
		return true;
	}
	if text.matches('?').count() > 1 {
		return true;
	}

	SEPARATOR_RE.is_match(text)
}

/// Extracts up to `max_segments` sub-questions: explicit `?` clauses first,
/// then separator splits, then topic-keyword sentences, then the whole text.
pub fn segment(text: &str, cfg: &arq_config::Preprocess) -> Vec<String> {
	let max = cfg.max_segments as usize;

	if text.matches('?').count() > 1 {
		let clauses = question_clauses(text, max);

		if clauses.len() > 1 {
			return clauses;
		}
	}

	let splits = separator_splits(text, max);

	if splits.len() > 1 {
		return splits;
	}

	let topics = topic_sentences(text, max);

	if topics.len() > 1 {
		return topics;
	}

	vec![text.trim().to_string()]
}

fn question_clauses(text: &str, max: usize) -> Vec<String> {
	let mut out = Vec::new();

	for clause in text.split('?') {
		let clause = clause.trim().trim_start_matches('¿').trim();

		if clause.split_whitespace().count() < 2 {
			continue;
		}

		out.push(format!("{clause}?"));

		if out.len() >= max {
			break;
		}
	}

	out
}

fn separator_splits(text: &str, max: usize) -> Vec<String> {
	let mut out = Vec::new();

	for part in SEPARATOR_RE.split(text) {
		let part = part.trim();

		if part.split_whitespace().count() < 2 {
			continue;
		}

		out.push(part.to_string());

		if out.len() >= max {
			break;
		}
	}

	out
}

fn topic_sentences(text: &str, max: usize) -> Vec<String> {
	let sentences: Vec<&str> = SENTENCE_BREAK_RE
		.split(text)
		.map(str::trim)
		.filter(|sentence| !sentence.is_empty())
		.collect();
	let mut out: Vec<String> = Vec::new();

	for pattern in TOPIC_PATTERNS.iter() {
		for sentence in &sentences {
			if !pattern.is_match(sentence) {
				continue;
			}
			if out.iter().any(|existing| existing == sentence) {
				continue;
			}

			out.push((*sentence).to_string());

			break;
		}

		if out.len() >= max {
			break;
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg() -> arq_config::Preprocess {
		arq_config::Preprocess {
			max_chars: 500,
			segment_trigger_chars: 100,
			max_segments: 3,
			short_query_max_words: 2,
		}
	}

	#[test]
	fn short_single_question_does_not_trigger() {
		assert!(!needs_segmentation("cual es el precio de la cuenta de 50k?", &cfg()));
	}

	#[test]
	fn multiple_question_marks_trigger() {
		assert!(needs_segmentation("cual es el precio? como retiro?", &cfg()));
	}

	#[test]
	fn long_text_triggers() {
		let text = "quiero saber el precio de la cuenta de cincuenta mil y como funcionan los retiros y que plataformas puedo usar con ustedes";

		assert!(needs_segmentation(text, &cfg()));
	}

	#[test]
	fn splits_on_question_marks_first() {
		let segments = segment("cual es el precio? como funciona el retiro?", &cfg());

		assert_eq!(segments.len(), 2);
		assert_eq!(segments[0], "cual es el precio?");
		assert_eq!(segments[1], "como funciona el retiro?");
	}

	#[test]
	fn splits_on_separators() {
		let segments = segment("quiero saber el precio y tambien las reglas de retiro", &cfg());

		assert_eq!(segments.len(), 2);
		assert!(segments[0].contains("precio"));
		assert!(segments[1].contains("reglas"));
	}

	#[test]
	fn caps_segment_count() {
		let segments = segment(
			"cual es el precio? como retiro? que reglas hay? que plataformas soportan?",
			&cfg(),
		);

		assert_eq!(segments.len(), 3);
	}

	#[test]
	fn falls_back_to_whole_text() {
		let text = "quisiera entender bien como funciona todo esto del fondeo antes de empezar con ustedes la verdad";
		let segments = segment(text, &cfg());

		assert_eq!(segments, vec![text.to_string()]);
	}

	#[test]
	fn extracts_topic_sentences_from_run_on_text() {
		let text = "me interesa el precio de la cuenta grande. la regla de consistencia no la entiendo. el drawdown diario me preocupa";
		let segments = segment(text, &cfg());

		assert_eq!(segments.len(), 3);
	}
}
