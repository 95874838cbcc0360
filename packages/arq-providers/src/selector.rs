use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// One chat-completion call at the configured temperature. The response body
/// must be a JSON object; anything else is an error — the pipeline treats
/// selector failures as fatal for the request, never as "not found".
pub async fn select(cfg: &arq_config::SelectorProviderConfig, messages: &[Value]) -> Result<Value> {
	if cfg.api_key.trim().is_empty() {
		return Err(eyre::eyre!("Selector api_key is missing."));
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_selector_json(json)
}

fn parse_selector_json(json: Value) -> Result<Value> {
	let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	else {
		return Err(eyre::eyre!("Selector response is missing message content."));
	};
	let parsed: Value = serde_json::from_str(content.trim())
		.map_err(|_| eyre::eyre!("Selector content is not valid JSON."))?;

	if !parsed.is_object() {
		return Err(eyre::eyre!("Selector content is not a JSON object."));
	}

	Ok(parsed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_strict_json_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"type\": \"FAQ_ID\", \"id\": \"faq-1\"}" } }
			]
		});
		let parsed = parse_selector_json(json).expect("parse failed");

		assert_eq!(parsed.get("type").and_then(|v| v.as_str()), Some("FAQ_ID"));
		assert_eq!(parsed.get("id").and_then(|v| v.as_str()), Some("faq-1"));
	}

	#[test]
	fn rejects_prose_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "I think the answer is faq-1." } }
			]
		});

		assert!(parse_selector_json(json).is_err());
	}

	#[test]
	fn rejects_missing_choices() {
		assert!(parse_selector_json(serde_json::json!({})).is_err());
	}
}
