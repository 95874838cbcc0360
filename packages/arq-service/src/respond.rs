use crate::retrieve::Candidate;

/// Which stage produced the answer. Terminal; never retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
	Pin,
	LexicalConfident,
	FusedConfident,
	LlmSelect,
	None,
}
impl DecisionSource {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pin => "pin",
			Self::LexicalConfident => "lexical_confident",
			Self::FusedConfident => "fused_confident",
			Self::LlmSelect => "llm_select",
			Self::None => "none",
		}
	}
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Decision {
	pub source: DecisionSource,
	pub faq_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
	Db,
	None,
}

/// The user-facing result record. Built by the formatter only; the formatter
/// performs no retrieval and no scoring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Reply {
	pub found: bool,
	pub source: ReplySource,
	pub faq_id: Option<String>,
	pub text: String,
}

pub fn format_found(candidate: &Candidate) -> Reply {
	Reply {
		found: true,
		source: ReplySource::Db,
		faq_id: Some(candidate.id.clone()),
		text: candidate.answer.clone(),
	}
}

pub fn format_not_found(fallback: &str) -> Reply {
	Reply { found: false, source: ReplySource::None, faq_id: None, text: fallback.to_string() }
}
