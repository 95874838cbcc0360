//! Scriptable providers and config builders for exercising the resolution
//! pipeline without any live backend.

use std::{
	collections::HashMap,
	sync::atomic::{AtomicUsize, Ordering},
};

use serde_json::{Map, Value};

use arq_config::{
	Confidence, Config, EmbeddingCache, EmbeddingProviderConfig, Fusion, LexicalProviderConfig,
	Preprocess, Providers, RawPinRule, Rerank, Retrieval, SelectorProviderConfig, Service,
	TenantBundle, TenantConfig, Tenants, VectorProviderConfig,
};
use arq_providers::FaqHit;
use arq_service::BoxFuture;

pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:8090".to_string(),
			log_level: "info".to_string(),
			fallback_text: "No pude procesar tu pregunta. ¿Podrías reformularla?".to_string(),
			clarify_text: "¿Podrías darme un poco más de detalle?".to_string(),
		},
		preprocess: Preprocess {
			max_chars: 500,
			segment_trigger_chars: 100,
			max_segments: 3,
			short_query_max_words: 2,
		},
		retrieval: Retrieval {
			candidate_k: 8,
			min_filtered_rows: 6,
			max_results: 8,
			title_weight: 2.0,
			question_weight: 1.3,
			synonyms: HashMap::from([(
				"withdrawals".to_string(),
				"retiro payout cobro".to_string(),
			)]),
		},
		rerank: Rerank {
			alias_boost: 0.15,
			title_phrase_boost: 0.10,
			question_phrase_boost: 0.06,
			numeric_boost: 0.06,
			intent_slug_boost: 0.07,
			intent_slug_demote: 0.12,
			safety_net_demote: 0.35,
			confusables: vec![arq_config::ConfusablePair {
				boost_faq: "faq-minimum-withdrawal".to_string(),
				demote_faq: "faq-safety-net-general".to_string(),
				boost: 0.35,
				demote: -0.50,
				triggers: vec![
					"min".to_string(),
					"minimo".to_string(),
					"primer".to_string(),
					"payout".to_string(),
					"cobro".to_string(),
					"retiro".to_string(),
				],
			}],
		},
		confidence: Confidence { min_top_score: 0.45, min_margin: 0.12, fused_min_margin: 0.10 },
		fusion: Fusion { k_rrf: 50.0, lexical_weight: 1.4, vector_weight: 1.0 },
		embedding_cache: EmbeddingCache { capacity: 64, key_prefix_chars: 80 },
		providers: Providers {
			lexical: LexicalProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/search/lexical".to_string(),
				fetch_path: "/faq/fetch".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			vector: VectorProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/search/vector".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/embeddings".to_string(),
				model: "m".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			selector: SelectorProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/chat/completions".to_string(),
				model: "m".to_string(),
				temperature: 0.0,
				max_answer_chars: 240,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		tenants: Tenants { dir: "tenants".into() },
	}
}

pub fn tenant_bundle(
	tenant: &str,
	pins: Vec<RawPinRule>,
	vector_skip_intents: Vec<String>,
	selector_top_k: u32,
) -> TenantBundle {
	TenantBundle {
		config: TenantConfig { tenant: tenant.to_string(), vector_skip_intents, selector_top_k },
		pins,
	}
}

pub fn pin_rule(re: &str, faq_id: &str) -> RawPinRule {
	RawPinRule { re: re.to_string(), faq_id: faq_id.to_string() }
}

pub fn faq(
	id: &str,
	slug: &str,
	title: &str,
	question: &str,
	answer: &str,
	category: &str,
	score: f32,
) -> FaqHit {
	FaqHit {
		id: id.to_string(),
		slug: slug.to_string(),
		title: title.to_string(),
		question: question.to_string(),
		answer: answer.to_string(),
		aliases: Vec::new(),
		category: category.to_string(),
		score,
	}
}

/// A lexical backend with fixed result sets per filter mode and a fetch-by-id
/// corpus. Every call is counted.
#[derive(Default)]
pub struct ScriptedLexical {
	pub filtered: Vec<FaqHit>,
	pub unfiltered: Vec<FaqHit>,
	pub docs: HashMap<String, FaqHit>,
	pub filtered_calls: AtomicUsize,
	pub unfiltered_calls: AtomicUsize,
	pub fetch_calls: AtomicUsize,
}

impl ScriptedLexical {
	pub fn new(filtered: Vec<FaqHit>, unfiltered: Vec<FaqHit>) -> Self {
		Self { filtered, unfiltered, ..Self::default() }
	}

	pub fn with_docs(mut self, docs: Vec<FaqHit>) -> Self {
		for doc in docs {
			self.docs.insert(doc.id.clone(), doc);
		}

		self
	}

	pub fn search_count(&self) -> usize {
		self.filtered_calls.load(Ordering::SeqCst) + self.unfiltered_calls.load(Ordering::SeqCst)
	}
}

impl arq_service::LexicalProvider for ScriptedLexical {
	fn search<'a>(
		&'a self,
		_cfg: &'a LexicalProviderConfig,
		_query: &'a str,
		_tenant: &'a str,
		categories: Option<&'a [String]>,
		_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<FaqHit>>> {
		let rows = if categories.is_some() {
			self.filtered_calls.fetch_add(1, Ordering::SeqCst);

			self.filtered.clone()
		} else {
			self.unfiltered_calls.fetch_add(1, Ordering::SeqCst);

			self.unfiltered.clone()
		};

		Box::pin(async move { Ok(rows) })
	}

	fn fetch<'a>(
		&'a self,
		_cfg: &'a LexicalProviderConfig,
		_tenant: &'a str,
		faq_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<FaqHit>>> {
		self.fetch_calls.fetch_add(1, Ordering::SeqCst);

		let doc = self.docs.get(faq_id).cloned();

		Box::pin(async move { Ok(doc) })
	}
}

/// A vector backend with one fixed result set. Calls are counted.
#[derive(Default)]
pub struct ScriptedVector {
	pub rows: Vec<FaqHit>,
	pub calls: AtomicUsize,
}

impl ScriptedVector {
	pub fn new(rows: Vec<FaqHit>) -> Self {
		Self { rows, calls: AtomicUsize::new(0) }
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl arq_service::VectorProvider for ScriptedVector {
	fn search<'a>(
		&'a self,
		_cfg: &'a VectorProviderConfig,
		_embedding: &'a [f32],
		_tenant: &'a str,
		_categories: Option<&'a [String]>,
		_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<FaqHit>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let rows = self.rows.clone();

		Box::pin(async move { Ok(rows) })
	}
}

/// Returns a constant vector of the configured dimension. Calls are counted
/// so tests can prove the embedding leg was skipped or cached.
#[derive(Default)]
pub struct CountingEmbedding {
	pub calls: AtomicUsize,
}

impl CountingEmbedding {
	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl arq_service::EmbeddingProvider for CountingEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vector = vec![0.01; cfg.dimensions as usize];

		Box::pin(async move { Ok(vector) })
	}
}

/// Replies with a fixed verdict. Calls are counted.
pub struct ScriptedSelector {
	pub verdict: Value,
	pub calls: AtomicUsize,
}

impl ScriptedSelector {
	pub fn new(verdict: Value) -> Self {
		Self { verdict, calls: AtomicUsize::new(0) }
	}

	pub fn choose(faq_id: &str) -> Self {
		Self::new(serde_json::json!({ "type": "FAQ_ID", "id": faq_id }))
	}

	pub fn none() -> Self {
		Self::new(serde_json::json!({ "type": "NONE" }))
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl arq_service::SelectorProvider for ScriptedSelector {
	fn select<'a>(
		&'a self,
		_cfg: &'a SelectorProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let verdict = self.verdict.clone();

		Box::pin(async move { Ok(verdict) })
	}
}

/// Fails every call, for exercising the fatal selector path.
pub struct FailingSelector;

impl arq_service::SelectorProvider for FailingSelector {
	fn select<'a>(
		&'a self,
		_cfg: &'a SelectorProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("Selector credentials are missing.")) })
	}
}
