use regex::Regex;

use crate::normalize;

/// A deterministic regex override. Pins bypass retrieval entirely and always
/// win over statistical ranking.
#[derive(Debug)]
pub struct PinRule {
	pattern: Regex,
	faq_id: String,
}

#[derive(Debug, Default)]
pub struct PinSet {
	rules: Vec<PinRule>,
}

/// A rule whose pattern failed to compile. Reported to the caller for
/// logging; never fatal.
#[derive(Debug, Clone)]
pub struct SkippedPin {
	pub pattern: String,
	pub error: String,
}

impl PinSet {
	/// Compiles the ordered rule list. Malformed patterns are skipped and
	/// returned so the caller can log them.
	pub fn compile(raw: &[arq_config::RawPinRule]) -> (Self, Vec<SkippedPin>) {
		let mut rules = Vec::with_capacity(raw.len());
		let mut skipped = Vec::new();

		for rule in raw {
			match Regex::new(&rule.re) {
				Ok(pattern) => rules.push(PinRule { pattern, faq_id: rule.faq_id.clone() }),
				Err(err) => skipped.push(SkippedPin {
					pattern: rule.re.clone(),
					error: err.to_string(),
				}),
			}
		}

		(Self { rules }, skipped)
	}

	/// First matching rule wins. The query is accent-folded and lowercased
	/// before matching, so rules are written against folded text.
	pub fn resolve(&self, query: &str) -> Option<&str> {
		let folded = normalize::fold_accents(&query.to_lowercase());

		self.rules
			.iter()
			.find(|rule| rule.pattern.is_match(&folded))
			.map(|rule| rule.faq_id.as_str())
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}
