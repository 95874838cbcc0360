use crate::{
	ambiguity::{self, Clarification},
	normalize, sanitize,
	sanitize::{RejectCode, SuspicionFlag},
	segment,
};

/// The preprocessed form of one incoming query.
#[derive(Debug, Clone)]
pub struct Preprocessed {
	/// Sanitized + normalized text.
	pub text: String,
	/// Present when the query is canonically ambiguous; retrieval must be
	/// skipped and this response returned as-is.
	pub clarification: Option<Clarification>,
	/// Pipeline inputs. Empty when ambiguous, otherwise at least one entry.
	pub segments: Vec<String>,
	/// Best-effort language tag, for logging only.
	pub lang: &'static str,
	/// Suspicious-input flags for the caller to log.
	pub flags: Vec<SuspicionFlag>,
}

/// Sanitize, normalize, detect ambiguity, segment — in that order. The only
/// error is a query that sanitizes down to nothing.
pub fn preprocess(raw: &str, cfg: &arq_config::Preprocess) -> Result<Preprocessed, RejectCode> {
	let sanitized = sanitize::sanitize(raw, cfg)?;
	let lang = normalize::language_tag(&sanitized.text);
	let text = normalize::normalize(&sanitized.text);

	if text.is_empty() {
		return Err(RejectCode::RejectEmpty);
	}

	if let Some(clarification) = ambiguity::detect(&text, cfg) {
		return Ok(Preprocessed {
			text,
			clarification: Some(clarification),
			segments: Vec::new(),
			lang,
			flags: sanitized.flags,
		});
	}

	let segments = if segment::needs_segmentation(&text, cfg) {
		segment::segment(&text, cfg)
	} else {
		vec![text.clone()]
	};

	Ok(Preprocessed { text, clarification: None, segments, lang, flags: sanitized.flags })
}
