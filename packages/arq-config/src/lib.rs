mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Confidence, Config, ConfusablePair, EmbeddingCache, EmbeddingProviderConfig, Fusion,
	LexicalProviderConfig, PinRuleFile, Preprocess, Providers, RawPinRule, Rerank, Retrieval,
	SelectorProviderConfig, Service, TenantBundle, TenantConfig, Tenants, VectorProviderConfig,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Loads every `<tenant>.json` file in the tenant directory, pairing each with
/// its optional `<tenant>.pins.json` sibling.
pub fn load_tenants(dir: &Path) -> Result<Vec<TenantBundle>> {
	let entries = fs::read_dir(dir)
		.map_err(|err| Error::ReadTenant { path: dir.to_path_buf(), source: err })?;
	let mut out = Vec::new();

	for entry in entries {
		let entry =
			entry.map_err(|err| Error::ReadTenant { path: dir.to_path_buf(), source: err })?;
		let path = entry.path();
		let Some(name) = path.file_name().and_then(|name| name.to_str()) else { continue };

		if !name.ends_with(".json") || name.ends_with(".pins.json") {
			continue;
		}

		let raw = fs::read_to_string(&path)
			.map_err(|err| Error::ReadTenant { path: path.clone(), source: err })?;
		let config: TenantConfig = serde_json::from_str(&raw)
			.map_err(|err| Error::ParseTenant { path: path.clone(), source: err })?;

		validate_tenant(&config)?;

		let pins_path = path.with_file_name(format!(
			"{}.pins.json",
			name.trim_end_matches(".json")
		));
		let pins = if pins_path.exists() {
			let raw = fs::read_to_string(&pins_path)
				.map_err(|err| Error::ReadTenant { path: pins_path.clone(), source: err })?;
			let file: PinRuleFile = serde_json::from_str(&raw)
				.map_err(|err| Error::ParseTenant { path: pins_path.clone(), source: err })?;

			if file.tenant != config.tenant {
				return Err(Error::Validation {
					message: format!(
						"Pin rules file {pins_path:?} names tenant {} but belongs to {}.",
						file.tenant, config.tenant
					),
				});
			}

			file.rules
		} else {
			Vec::new()
		};

		out.push(TenantBundle { config, pins });
	}

	out.sort_by(|a, b| a.config.tenant.cmp(&b.config.tenant));

	Ok(out)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.fallback_text.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.fallback_text must be non-empty.".to_string(),
		});
	}
	if cfg.service.clarify_text.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.clarify_text must be non-empty.".to_string(),
		});
	}
	if cfg.preprocess.max_chars == 0 {
		return Err(Error::Validation {
			message: "preprocess.max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.preprocess.max_segments == 0 {
		return Err(Error::Validation {
			message: "preprocess.max_segments must be greater than zero.".to_string(),
		});
	}
	if cfg.preprocess.segment_trigger_chars == 0 {
		return Err(Error::Validation {
			message: "preprocess.segment_trigger_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.candidate_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.candidate_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_results == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.title_weight < 1.0 || !cfg.retrieval.title_weight.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.title_weight must be a finite number of at least 1.0.".to_string(),
		});
	}
	if cfg.retrieval.question_weight < 1.0 || !cfg.retrieval.question_weight.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.question_weight must be a finite number of at least 1.0."
				.to_string(),
		});
	}

	for (path, value) in [
		("rerank.alias_boost", cfg.rerank.alias_boost),
		("rerank.title_phrase_boost", cfg.rerank.title_phrase_boost),
		("rerank.question_phrase_boost", cfg.rerank.question_phrase_boost),
		("rerank.numeric_boost", cfg.rerank.numeric_boost),
		("rerank.intent_slug_boost", cfg.rerank.intent_slug_boost),
		("rerank.intent_slug_demote", cfg.rerank.intent_slug_demote),
		("rerank.safety_net_demote", cfg.rerank.safety_net_demote),
	] {
		if !value.is_finite() || value < 0.0 {
			return Err(Error::Validation {
				message: format!("{path} must be a finite number of zero or greater."),
			});
		}
	}

	for pair in &cfg.rerank.confusables {
		if pair.boost_faq.trim().is_empty() || pair.demote_faq.trim().is_empty() {
			return Err(Error::Validation {
				message: "rerank.confusables entries must name both FAQ ids.".to_string(),
			});
		}
		if !pair.boost.is_finite() || !pair.demote.is_finite() {
			return Err(Error::Validation {
				message: "rerank.confusables adjustments must be finite numbers.".to_string(),
			});
		}
	}

	if cfg.confidence.min_top_score < 0.0 || !cfg.confidence.min_top_score.is_finite() {
		return Err(Error::Validation {
			message: "confidence.min_top_score must be a finite number of zero or greater."
				.to_string(),
		});
	}
	if cfg.confidence.min_margin <= 0.0 || !cfg.confidence.min_margin.is_finite() {
		return Err(Error::Validation {
			message: "confidence.min_margin must be a finite number greater than zero.".to_string(),
		});
	}
	if cfg.confidence.fused_min_margin <= 0.0 || !cfg.confidence.fused_min_margin.is_finite() {
		return Err(Error::Validation {
			message: "confidence.fused_min_margin must be a finite number greater than zero."
				.to_string(),
		});
	}
	if cfg.fusion.k_rrf <= 0.0 || !cfg.fusion.k_rrf.is_finite() {
		return Err(Error::Validation {
			message: "fusion.k_rrf must be a finite number greater than zero.".to_string(),
		});
	}
	if cfg.fusion.lexical_weight <= 0.0 || cfg.fusion.vector_weight <= 0.0 {
		return Err(Error::Validation {
			message: "fusion weights must be greater than zero.".to_string(),
		});
	}
	if cfg.embedding_cache.capacity == 0 {
		return Err(Error::Validation {
			message: "embedding_cache.capacity must be greater than zero.".to_string(),
		});
	}
	if cfg.embedding_cache.key_prefix_chars == 0 {
		return Err(Error::Validation {
			message: "embedding_cache.key_prefix_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.selector.max_answer_chars == 0 {
		return Err(Error::Validation {
			message: "providers.selector.max_answer_chars must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("lexical", &cfg.providers.lexical.api_key),
		("vector", &cfg.providers.vector.api_key),
		("embedding", &cfg.providers.embedding.api_key),
		("selector", &cfg.providers.selector.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn validate_tenant(tenant: &TenantConfig) -> Result<()> {
	if tenant.tenant.trim().is_empty() {
		return Err(Error::Validation {
			message: "Tenant file must name a non-empty tenant.".to_string(),
		});
	}
	if tenant.selector_top_k == 0 {
		return Err(Error::Validation {
			message: format!(
				"Tenant {} selector_top_k must be greater than zero.",
				tenant.tenant
			),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for base in [
		&mut cfg.providers.lexical.api_base,
		&mut cfg.providers.vector.api_base,
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.selector.api_base,
	] {
		while base.ends_with('/') {
			base.pop();
		}
	}
}
