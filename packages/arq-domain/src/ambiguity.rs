#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clarification {
	pub text: String,
}

const FIRM_CLARIFICATION: &str = "¿Qué te gustaría saber? Puedo ayudarte con retiros, precios, reglas, plataformas o descuentos.";
const GENERIC_CLARIFICATION: &str = "Tu pregunta es muy breve y puede referirse a varios temas. ¿Podrías darme un poco más de detalle? Por ejemplo: retiros, precios, reglas o plataformas.";

/// Exact-match tokens that cannot be resolved without a follow-up question.
/// Matching one returns its pre-built clarification and skips retrieval.
const CANONICAL_AMBIGUOUS: &[(&str, &str)] = &[
	("apex", FIRM_CLARIFICATION),
	("topstep", FIRM_CLARIFICATION),
	("bulenox", FIRM_CLARIFICATION),
	("tradeify", FIRM_CLARIFICATION),
	("myfundedfutures", FIRM_CLARIFICATION),
	("info", GENERIC_CLARIFICATION),
	("informacion", GENERIC_CLARIFICATION),
	("help", GENERIC_CLARIFICATION),
	("ayuda", GENERIC_CLARIFICATION),
	("hi", GENERIC_CLARIFICATION),
	("hola", GENERIC_CLARIFICATION),
	("hello", GENERIC_CLARIFICATION),
	("buenas", GENERIC_CLARIFICATION),
	("?", GENERIC_CLARIFICATION),
	("¿?", GENERIC_CLARIFICATION),
];

/// Short phrases that are complete questions in this domain despite their
/// length. A two-word query on this list goes through retrieval normally.
const SHORT_PHRASE_ALLOWLIST: &[&str] = &[
	"safety net",
	"trailing drawdown",
	"drawdown diario",
	"drawdown maximo",
	"primer retiro",
	"primer payout",
	"minimo retiro",
	"retiro minimo",
	"metodos de pago",
	"reset cuenta",
	"cuenta pa",
	"drawdown",
	"payout",
	"retiro",
	"retiros",
	"consistencia",
	"precios",
	"precio",
	"descuentos",
	"plataformas",
	"ninjatrader",
	"tradingview",
	"rithmic",
	"tradovate",
];

/// Runs on sanitized+normalized text, before segmentation.
pub fn detect(normalized: &str, cfg: &arq_config::Preprocess) -> Option<Clarification> {
	let trimmed = normalized.trim().trim_end_matches(['?', '!', '.']).trim();
	let probe = if trimmed.is_empty() { normalized.trim() } else { trimmed };

	for (token, response) in CANONICAL_AMBIGUOUS {
		if probe == *token {
			return Some(Clarification { text: (*response).to_string() });
		}
	}

	let words = probe.split_whitespace().count();

	if words > 0 && words <= cfg.short_query_max_words as usize {
		if SHORT_PHRASE_ALLOWLIST.contains(&probe) {
			return None;
		}

		return Some(Clarification { text: GENERIC_CLARIFICATION.to_string() });
	}

	None
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
	fn bare_firm_name_is_ambiguous() {
		let clarification = detect("apex", &cfg()).expect("expected clarification");

		assert!(clarification.text.contains("retiros"));
	}

	#[test]
	fn firm_name_with_question_mark_is_ambiguous() {
		assert!(detect("apex?", &cfg()).is_some());
	}

	#[test]
	fn bare_question_mark_is_ambiguous() {
		assert!(detect("?", &cfg()).is_some());
	}

	#[test]
	fn short_generic_query_is_ambiguous() {
		assert!(detect("una pregunta", &cfg()).is_some());
	}

	#[test]
	fn allowlisted_short_phrases_pass() {
		assert!(detect("safety net", &cfg()).is_none());
		assert!(detect("trailing drawdown", &cfg()).is_none());
		assert!(detect("payout", &cfg()).is_none());
	}

	#[test]
	fn full_questions_pass() {
		assert!(detect("cual es el minimo para retirar en apex", &cfg()).is_none());
	}
}
