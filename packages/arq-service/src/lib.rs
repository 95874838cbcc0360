pub mod embed_cache;
pub mod resolve;
pub mod respond;
pub mod retrieve;
pub mod select;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use arq_config::{
	Config, EmbeddingProviderConfig, LexicalProviderConfig, SelectorProviderConfig, TenantBundle,
	VectorProviderConfig,
};
use arq_domain::{intent::Intent, pin::PinSet};
use arq_providers::FaqHit;

use crate::embed_cache::EmbedCache;
pub use crate::{
	resolve::{ResolveRequest, ResolveResponse},
	respond::{Decision, DecisionSource, Reply, ReplySource},
	retrieve::Candidate,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown tenant: {tenant}.")]
	UnknownTenant { tenant: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Selector error: {message}")]
	Selector { message: String },
}
impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

pub trait LexicalProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a LexicalProviderConfig,
		query: &'a str,
		tenant: &'a str,
		categories: Option<&'a [String]>,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<FaqHit>>>;

	fn fetch<'a>(
		&'a self,
		cfg: &'a LexicalProviderConfig,
		tenant: &'a str,
		faq_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<FaqHit>>>;
}

pub trait VectorProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a VectorProviderConfig,
		embedding: &'a [f32],
		tenant: &'a str,
		categories: Option<&'a [String]>,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<FaqHit>>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait SelectorProvider
where
	Self: Send + Sync,
{
	fn select<'a>(
		&'a self,
		cfg: &'a SelectorProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

struct DefaultProviders;

impl LexicalProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a LexicalProviderConfig,
		query: &'a str,
		tenant: &'a str,
		categories: Option<&'a [String]>,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<FaqHit>>> {
		Box::pin(arq_providers::lexical::search(cfg, query, tenant, categories, k))
	}

	fn fetch<'a>(
		&'a self,
		cfg: &'a LexicalProviderConfig,
		tenant: &'a str,
		faq_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<FaqHit>>> {
		Box::pin(arq_providers::lexical::fetch(cfg, tenant, faq_id))
	}
}

impl VectorProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a VectorProviderConfig,
		embedding: &'a [f32],
		tenant: &'a str,
		categories: Option<&'a [String]>,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<FaqHit>>> {
		Box::pin(arq_providers::vector::search(cfg, embedding, tenant, categories, k))
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(arq_providers::embedding::embed(cfg, text))
	}
}

impl SelectorProvider for DefaultProviders {
	fn select<'a>(
		&'a self,
		cfg: &'a SelectorProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(arq_providers::selector::select(cfg, messages))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub lexical: Arc<dyn LexicalProvider>,
	pub vector: Arc<dyn VectorProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub selector: Arc<dyn SelectorProvider>,
}
impl Providers {
	pub fn new(
		lexical: Arc<dyn LexicalProvider>,
		vector: Arc<dyn VectorProvider>,
		embedding: Arc<dyn EmbeddingProvider>,
		selector: Arc<dyn SelectorProvider>,
	) -> Self {
		Self { lexical, vector, embedding, selector }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			lexical: provider.clone(),
			vector: provider.clone(),
			embedding: provider.clone(),
			selector: provider,
		}
	}
}

/// Startup-compiled per-tenant state: pins and retrieval knobs.
pub struct TenantState {
	pub name: String,
	pub selector_top_k: u32,
	pub vector_skip: Vec<Intent>,
	pub pins: PinSet,
}

pub struct ArqService {
	pub cfg: Config,
	tenants: HashMap<String, TenantState>,
	pub providers: Providers,
	embed_cache: EmbedCache,
}

impl ArqService {
	pub fn new(cfg: Config, bundles: Vec<TenantBundle>) -> Self {
		Self::with_providers(cfg, bundles, Providers::default())
	}

	pub fn with_providers(cfg: Config, bundles: Vec<TenantBundle>, providers: Providers) -> Self {
		let tenants = build_tenants(bundles);
		let embed_cache = EmbedCache::new(
			cfg.embedding_cache.capacity as usize,
			cfg.embedding_cache.key_prefix_chars as usize,
		);

		Self { cfg, tenants, providers, embed_cache }
	}

	pub fn tenant(&self, name: &str) -> Option<&TenantState> {
		self.tenants.get(name)
	}

	pub fn tenant_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.tenants.keys().map(String::as_str).collect();

		names.sort();

		names
	}

	pub(crate) async fn embedding_for(&self, text: &str) -> Result<Vec<f32>> {
		if let Some(cached) = self.embed_cache.get(text) {
			return Ok(cached);
		}

		let vector = self.providers.embedding.embed(&self.cfg.providers.embedding, text).await?;

		self.embed_cache.put(text, vector.clone());

		Ok(vector)
	}
}

fn build_tenants(bundles: Vec<TenantBundle>) -> HashMap<String, TenantState> {
	let mut out = HashMap::new();

	for bundle in bundles {
		let (pins, skipped) = PinSet::compile(&bundle.pins);

		for rule in &skipped {
			tracing::warn!(
				tenant = bundle.config.tenant.as_str(),
				pattern = rule.pattern.as_str(),
				error = rule.error.as_str(),
				"Skipped malformed pin rule."
			);
		}

		let mut vector_skip = Vec::new();

		for label in &bundle.config.vector_skip_intents {
			match Intent::parse(label) {
				Some(intent) => vector_skip.push(intent),
				None => {
					tracing::warn!(
						tenant = bundle.config.tenant.as_str(),
						intent = label.as_str(),
						"Skipped unknown vector-skip intent."
					);
				},
			}
		}

		let state = TenantState {
			name: bundle.config.tenant.clone(),
			selector_top_k: bundle.config.selector_top_k,
			vector_skip,
			pins,
		};

		out.insert(bundle.config.tenant, state);
	}

	out
}
