use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::FaqHit;

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
	embedding: &'a [f32],
	tenant: &'a str,
	categories: Option<&'a [String]>,
	k: u32,
}

/// Vector rows score under `vscore`; converted to the shared hit shape with
/// similarity as the score.
#[derive(Debug, Deserialize)]
struct VectorRow {
	id: String,
	slug: String,
	title: String,
	question: String,
	answer: String,
	#[serde(default)]
	aliases: Vec<String>,
	category: String,
	vscore: f32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
	results: Vec<VectorRow>,
}

/// Cosine-ranked similarity retrieval over the same FAQ corpus.
pub async fn search(
	cfg: &arq_config::VectorProviderConfig,
	embedding: &[f32],
	tenant: &str,
	categories: Option<&[String]>,
	k: u32,
) -> Result<Vec<FaqHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = SearchBody { embedding, tenant, categories, k };
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let parsed: SearchResponse = res.error_for_status()?.json().await?;

	Ok(parsed.results.into_iter().map(into_hit).collect())
}

fn into_hit(row: VectorRow) -> FaqHit {
	FaqHit {
		id: row.id,
		slug: row.slug,
		title: row.title,
		question: row.question,
		answer: row.answer,
		aliases: row.aliases,
		category: row.category,
		score: row.vscore,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vscore_becomes_the_hit_score() {
		let raw = serde_json::json!({
			"results": [{
				"id": "faq-9",
				"slug": "platforms-supported",
				"title": "Plataformas soportadas",
				"question": "¿Qué plataformas puedo usar?",
				"answer": "NinjaTrader, TradingView y Rithmic.",
				"category": "platforms",
				"vscore": 0.91
			}]
		});
		let parsed: SearchResponse = serde_json::from_value(raw).expect("parse failed");
		let hit = into_hit(parsed.results.into_iter().next().expect("missing row"));

		assert_eq!(hit.score, 0.91);
		assert_eq!(hit.slug, "platforms-supported");
	}
}
