pub mod embedding;
pub mod lexical;
pub mod selector;
pub mod vector;

use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// A canonical FAQ document as returned by the search backend.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FaqHit {
	pub id: String,
	pub slug: String,
	pub title: String,
	pub question: String,
	pub answer: String,
	#[serde(default)]
	pub aliases: Vec<String>,
	pub category: String,
	#[serde(default)]
	pub score: f32,
}

pub(crate) fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header values must be strings."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
