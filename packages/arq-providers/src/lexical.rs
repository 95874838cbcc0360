use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::FaqHit;

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
	query: &'a str,
	tenant: &'a str,
	categories: Option<&'a [String]>,
	k: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
	results: Vec<FaqHit>,
}

#[derive(Debug, Serialize)]
struct FetchBody<'a> {
	tenant: &'a str,
	id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
	result: Option<FaqHit>,
}

/// Relevance-ranked full-text retrieval, optionally category-filtered.
pub async fn search(
	cfg: &arq_config::LexicalProviderConfig,
	query: &str,
	tenant: &str,
	categories: Option<&[String]>,
	k: u32,
) -> Result<Vec<FaqHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = SearchBody { query, tenant, categories, k };
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let parsed: SearchResponse = res.error_for_status()?.json().await?;

	Ok(parsed.results)
}

/// Fetches one canonical FAQ document by id. Used to materialize pin hits.
pub async fn fetch(
	cfg: &arq_config::LexicalProviderConfig,
	tenant: &str,
	faq_id: &str,
) -> Result<Option<FaqHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.fetch_path);
	let body = FetchBody { tenant, id: faq_id };
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let parsed: FetchResponse = res.error_for_status()?.json().await?;

	Ok(parsed.result)
}
