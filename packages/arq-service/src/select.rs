use serde_json::Value;

use crate::{Error, Result, retrieve::Candidate};

/// The selector's verdict, already checked against the presented set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
	Faq(String),
	None,
}

/// Builds the strict tie-break prompt: one line per candidate with its id,
/// question, and a truncated answer; JSON-only output.
pub(crate) fn build_messages(
	query: &str,
	candidates: &[Candidate],
	max_answer_chars: usize,
) -> Vec<Value> {
	let system_prompt = "You disambiguate between FAQ entries for a trading prop-firm support bot. \
Pick the single FAQ that answers the user's question, or NONE if none of them does. \
Output must be valid JSON only, matching exactly one of: \
{\"type\": \"FAQ_ID\", \"id\": \"<id>\"} or {\"type\": \"NONE\"}. \
Never invent an id that is not listed. Do not add explanations or extra fields.";
	let mut listing = String::new();

	for candidate in candidates {
		let answer = truncate_chars(&candidate.answer, max_answer_chars);

		listing.push_str(&format!(
			"- id: {}\n  question: {}\n  answer: {}\n",
			candidate.id, candidate.question, answer
		));
	}

	let user_prompt = format!("User question:\n{query}\n\nCandidates:\n{listing}");

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

/// Interprets the selector's JSON verdict. A malformed shape is a fatal
/// selector error; an id outside the presented set is treated as NONE, never
/// trusted.
pub(crate) fn parse_selection(raw: &Value, candidates: &[Candidate]) -> Result<Selection> {
	let kind = raw.get("type").and_then(|v| v.as_str()).ok_or_else(|| Error::Selector {
		message: "Selector output is missing the type field.".to_string(),
	})?;

	match kind {
		"NONE" => Ok(Selection::None),
		"FAQ_ID" => {
			let id = raw.get("id").and_then(|v| v.as_str()).ok_or_else(|| Error::Selector {
				message: "Selector output is missing the id field.".to_string(),
			})?;

			if candidates.iter().any(|candidate| candidate.id == id) {
				Ok(Selection::Faq(id.to_string()))
			} else {
				tracing::warn!(id, "Selector returned an out-of-set id; treating as NONE.");

				Ok(Selection::None)
			}
		},
		other => Err(Error::Selector {
			message: format!("Selector output has an unknown type: {other}."),
		}),
	}
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}

	let truncated: String = text.chars().take(max_chars).collect();

	format!("{truncated}…")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn candidate(id: &str) -> Candidate {
		Candidate {
			id: id.to_string(),
			slug: id.to_string(),
			title: String::new(),
			question: format!("¿Pregunta {id}?"),
			answer: "Respuesta.".to_string(),
			aliases: Vec::new(),
			category: "pricing".to_string(),
			score: 0.5,
			rank: 1,
		}
	}

	#[test]
	fn prompt_lists_every_candidate_id() {
		let candidates = vec![candidate("faq-1"), candidate("faq-2")];
		let messages = build_messages("cual es el precio", &candidates, 240);
		let user = messages[1]["content"].as_str().expect("user content");

		assert!(user.contains("faq-1"));
		assert!(user.contains("faq-2"));
		assert!(user.contains("cual es el precio"));
	}

	#[test]
	fn long_answers_are_truncated_in_the_prompt() {
		let mut long = candidate("faq-1");

		long.answer = "x".repeat(1_000);

		let messages = build_messages("precio", &[long], 100);
		let user = messages[1]["content"].as_str().expect("user content");

		assert!(user.len() < 1_000);
	}

	#[test]
	fn accepts_an_in_set_id() {
		let candidates = vec![candidate("faq-1")];
		let raw = serde_json::json!({ "type": "FAQ_ID", "id": "faq-1" });

		assert_eq!(
			parse_selection(&raw, &candidates).expect("parse failed"),
			Selection::Faq("faq-1".to_string())
		);
	}

	#[test]
	fn out_of_set_id_becomes_none() {
		let candidates = vec![candidate("faq-1")];
		let raw = serde_json::json!({ "type": "FAQ_ID", "id": "faq-999" });

		assert_eq!(parse_selection(&raw, &candidates).expect("parse failed"), Selection::None);
	}

	#[test]
	fn none_verdict_is_none() {
		let raw = serde_json::json!({ "type": "NONE" });

		assert_eq!(parse_selection(&raw, &[]).expect("parse failed"), Selection::None);
	}

	#[test]
	fn malformed_output_is_a_fatal_selector_error() {
		let raw = serde_json::json!({ "verdict": "yes" });

		assert!(matches!(
			parse_selection(&raw, &[]),
			Err(Error::Selector { .. })
		));
	}
}
