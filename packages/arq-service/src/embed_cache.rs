use std::{num::NonZeroUsize, sync::Mutex};

use lru::LruCache;

/// The only process-wide mutable state in the pipeline: a bounded LRU of
/// query embeddings, keyed by a lowercased prefix of the embedded text.
/// Safe for concurrent access.
pub struct EmbedCache {
	entries: Mutex<LruCache<String, Vec<f32>>>,
	key_prefix_chars: usize,
}

impl EmbedCache {
	pub fn new(capacity: usize, key_prefix_chars: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity.max(1)).expect("Capacity is at least one.");

		Self { entries: Mutex::new(LruCache::new(capacity)), key_prefix_chars }
	}

	fn key(&self, text: &str) -> String {
		text.to_lowercase().chars().take(self.key_prefix_chars).collect()
	}

	pub fn get(&self, text: &str) -> Option<Vec<f32>> {
		let key = self.key(text);
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.get(&key).cloned()
	}

	pub fn put(&self, text: &str, vector: Vec<f32>) {
		let key = self.key(text);
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.put(key, vector);
	}

	pub fn len(&self) -> usize {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
