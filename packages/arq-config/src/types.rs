use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub preprocess: Preprocess,
	pub retrieval: Retrieval,
	pub rerank: Rerank,
	pub confidence: Confidence,
	pub fusion: Fusion,
	pub embedding_cache: EmbeddingCache,
	pub providers: Providers,
	pub tenants: Tenants,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Returned verbatim when the pipeline exhausts without a match or fails.
	pub fallback_text: String,
	/// Returned when sanitation leaves nothing of the query.
	pub clarify_text: String,
}

#[derive(Debug, Deserialize)]
pub struct Preprocess {
	pub max_chars: u32,
	pub segment_trigger_chars: u32,
	pub max_segments: u32,
	pub short_query_max_words: u32,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub candidate_k: u32,
	pub min_filtered_rows: u32,
	pub max_results: u32,
	pub title_weight: f32,
	pub question_weight: f32,
	/// Per-category synonym strings appended to the vector query.
	pub synonyms: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct Rerank {
	pub alias_boost: f32,
	pub title_phrase_boost: f32,
	pub question_phrase_boost: f32,
	pub numeric_boost: f32,
	pub intent_slug_boost: f32,
	pub intent_slug_demote: f32,
	pub safety_net_demote: f32,
	pub confusables: Vec<ConfusablePair>,
}

/// A known confusable FAQ pair with hard boost/demote adjustments applied
/// when a trigger token or the withdrawals intent is present.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfusablePair {
	pub boost_faq: String,
	pub demote_faq: String,
	pub boost: f32,
	pub demote: f32,
	pub triggers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Confidence {
	pub min_top_score: f32,
	pub min_margin: f32,
	pub fused_min_margin: f32,
}

#[derive(Debug, Deserialize)]
pub struct Fusion {
	pub k_rrf: f32,
	pub lexical_weight: f32,
	pub vector_weight: f32,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingCache {
	pub capacity: u32,
	pub key_prefix_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub lexical: LexicalProviderConfig,
	pub vector: VectorProviderConfig,
	pub embedding: EmbeddingProviderConfig,
	pub selector: SelectorProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct LexicalProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub fetch_path: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct VectorProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct SelectorProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_answer_chars: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Tenants {
	pub dir: PathBuf,
}

/// Per-tenant JSON file: `<tenant>.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantConfig {
	pub tenant: String,
	pub vector_skip_intents: Vec<String>,
	pub selector_top_k: u32,
}

/// Per-tenant pin rules file: `<tenant>.pins.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PinRuleFile {
	pub tenant: String,
	pub rules: Vec<RawPinRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPinRule {
	pub re: String,
	pub faq_id: String,
}

/// A tenant's config plus its (possibly empty) pin rules.
#[derive(Debug, Clone)]
pub struct TenantBundle {
	pub config: TenantConfig,
	pub pins: Vec<RawPinRule>,
}
