use arq_domain::{intent, preprocess, sanitize::RejectCode};

use crate::{
	ArqService, Error, Result, TenantState,
	respond::{self, Decision, DecisionSource, Reply, ReplySource},
	retrieve::{Candidate, Retrieved},
	select::{self, Selection},
};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolveRequest {
	pub tenant: String,
	pub query: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResolveResponse {
	pub found: bool,
	pub source: ReplySource,
	pub faq_id: Option<String>,
	pub text: String,
	/// One decision per pipeline run (segment), in segment order.
	pub decisions: Vec<Decision>,
}

#[derive(Debug)]
struct SegmentOutcome {
	decision: Decision,
	reply: Reply,
}

impl ArqService {
	/// Resolves one user question to a canonical FAQ answer, a clarification,
	/// or the fallback. Validation problems become user-facing replies;
	/// backend and selector failures propagate as errors.
	pub async fn resolve(&self, req: ResolveRequest) -> Result<ResolveResponse> {
		let tenant_name = req.tenant.trim();

		if tenant_name.is_empty() {
			return Err(Error::InvalidRequest { message: "tenant is required.".to_string() });
		}

		let Some(tenant) = self.tenant(tenant_name) else {
			return Err(Error::UnknownTenant { tenant: tenant_name.to_string() });
		};

		let pre = match preprocess::preprocess(&req.query, &self.cfg.preprocess) {
			Ok(pre) => pre,
			Err(RejectCode::RejectEmpty) => {
				tracing::info!(tenant = tenant.name.as_str(), "Query sanitized to nothing.");

				return Ok(clarify_response(&self.cfg.service.clarify_text));
			},
		};

		for flag in &pre.flags {
			tracing::warn!(
				tenant = tenant.name.as_str(),
				flag = flag.as_str(),
				"Suspicious pattern in query input."
			);
		}

		if let Some(clarification) = &pre.clarification {
			tracing::info!(
				tenant = tenant.name.as_str(),
				lang = pre.lang,
				"Ambiguous query; retrieval skipped."
			);

			return Ok(clarify_response(&clarification.text));
		}

		let mut outcomes = Vec::with_capacity(pre.segments.len());

		for segment in &pre.segments {
			outcomes.push(self.resolve_segment(tenant, segment).await?);
		}

		Ok(combine(outcomes, &pre.segments, &self.cfg.service.fallback_text))
	}

	async fn resolve_segment(
		&self,
		tenant: &TenantState,
		segment: &str,
	) -> Result<SegmentOutcome> {
		if let Some(faq_id) = tenant.pins.resolve(segment) {
			let fetched = self
				.providers
				.lexical
				.fetch(&self.cfg.providers.lexical, &tenant.name, faq_id)
				.await?;

			match fetched {
				Some(hit) => {
					let candidate = Candidate::from(hit);

					return Ok(SegmentOutcome {
						decision: Decision {
							source: DecisionSource::Pin,
							faq_id: Some(faq_id.to_string()),
						},
						reply: respond::format_found(&candidate),
					});
				},
				None => {
					// The pin targets a document the corpus no longer has;
					// the statistical path still gets a chance.
					tracing::warn!(
						tenant = tenant.name.as_str(),
						faq_id,
						"Pinned FAQ is missing from the corpus."
					);
				},
			}
		}

		let intents = intent::classify(segment);

		match self.retrieve(tenant, segment, &intents).await? {
			Retrieved::LexicalConfident(candidate) => {
				Ok(found_outcome(DecisionSource::LexicalConfident, candidate))
			},
			Retrieved::FusedConfident(candidate) => {
				Ok(found_outcome(DecisionSource::FusedConfident, candidate))
			},
			Retrieved::Empty => Ok(none_outcome(&self.cfg.service.fallback_text)),
			Retrieved::NeedsSelection(mut candidates) => {
				candidates.truncate(tenant.selector_top_k as usize);

				let messages = select::build_messages(
					segment,
					&candidates,
					self.cfg.providers.selector.max_answer_chars as usize,
				);
				let raw = self
					.providers
					.selector
					.select(&self.cfg.providers.selector, &messages)
					.await
					.map_err(|err| Error::Selector { message: err.to_string() })?;

				match select::parse_selection(&raw, &candidates)? {
					Selection::Faq(id) => {
						let candidate = candidates
							.into_iter()
							.find(|candidate| candidate.id == id)
							.ok_or_else(|| Error::Selector {
								message: "Selected candidate vanished from the set.".to_string(),
							})?;

						Ok(found_outcome(DecisionSource::LlmSelect, candidate))
					},
					Selection::None => Ok(none_outcome(&self.cfg.service.fallback_text)),
				}
			},
		}
	}
}

fn found_outcome(source: DecisionSource, candidate: Candidate) -> SegmentOutcome {
	SegmentOutcome {
		decision: Decision { source, faq_id: Some(candidate.id.clone()) },
		reply: respond::format_found(&candidate),
	}
}

fn none_outcome(fallback: &str) -> SegmentOutcome {
	SegmentOutcome {
		decision: Decision { source: DecisionSource::None, faq_id: None },
		reply: respond::format_not_found(fallback),
	}
}

fn clarify_response(text: &str) -> ResolveResponse {
	ResolveResponse {
		found: false,
		source: ReplySource::None,
		faq_id: None,
		text: text.to_string(),
		decisions: vec![Decision { source: DecisionSource::None, faq_id: None }],
	}
}

/// Merges per-segment outcomes. Multi-segment answers are concatenated with a
/// per-segment header; segments that resolved to nothing are dropped as long
/// as at least one segment succeeded.
fn combine(outcomes: Vec<SegmentOutcome>, segments: &[String], fallback: &str) -> ResolveResponse {
	let decisions: Vec<Decision> = outcomes.iter().map(|o| o.decision.clone()).collect();

	if outcomes.len() == 1 {
		let outcome = outcomes.into_iter().next().expect("one outcome");

		return ResolveResponse {
			found: outcome.reply.found,
			source: outcome.reply.source,
			faq_id: outcome.reply.faq_id,
			text: outcome.reply.text,
			decisions,
		};
	}

	let successes: Vec<(&String, &SegmentOutcome)> = segments
		.iter()
		.zip(outcomes.iter())
		.filter(|(_, outcome)| outcome.reply.found)
		.collect();

	if successes.is_empty() {
		return ResolveResponse {
			found: false,
			source: ReplySource::None,
			faq_id: None,
			text: fallback.to_string(),
			decisions,
		};
	}

	let faq_id = if successes.len() == 1 {
		successes[0].1.reply.faq_id.clone()
	} else {
		Option::None
	};
	let text = successes
		.iter()
		.enumerate()
		.map(|(idx, (segment, outcome))| {
			format!("{}. {}\n{}", idx + 1, segment, outcome.reply.text)
		})
		.collect::<Vec<_>>()
		.join("\n\n");

	ResolveResponse { found: true, source: ReplySource::Db, faq_id, text, decisions }
}
