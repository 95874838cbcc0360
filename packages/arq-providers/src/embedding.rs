use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Embeds a single query text. The caller owns caching; this function always
/// hits the remote endpoint.
pub async fn embed(cfg: &arq_config::EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": text,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vector = parse_embedding_response(json)?;

	if vector.len() != cfg.dimensions as usize {
		return Err(eyre::eyre!("Embedding vector dimension mismatch."));
	}

	Ok(vector)
}

fn parse_embedding_response(json: Value) -> Result<Vec<f32>> {
	let embedding = json
		.get("data")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|item| item.get("embedding"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing an embedding array."))?;
	let mut out = Vec::with_capacity(embedding.len());

	for value in embedding {
		let number =
			value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;

		out.push(number as f32);
	}

	Ok(out)
}
