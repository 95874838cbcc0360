use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
	RejectEmpty,
}

/// Patterns that look like tampering. They are flagged for the caller to log
/// and the query continues through sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspicionFlag {
	SqlLike,
	ScriptTag,
	PathTraversal,
	SpecialDensity,
}
impl SuspicionFlag {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::SqlLike => "sql_like",
			Self::ScriptTag => "script_tag",
			Self::PathTraversal => "path_traversal",
			Self::SpecialDensity => "special_density",
		}
	}
}

#[derive(Debug, Clone)]
pub struct Sanitized {
	pub text: String,
	pub flags: Vec<SuspicionFlag>,
}

static SCRIPT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?is)<\s*script[^>]*>.*?<\s*/\s*script\s*>|<\s*script[^>]*>")
		.expect("Script tag pattern must compile.")
});
static HTML_TAG_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<[^>]{0,200}>").expect("HTML tag pattern must compile."));
static URL_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").expect("URL pattern must compile."));
static SQL_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"(?i)\b(select|insert|update|delete|drop|union|exec)\b\s*[('";]|['";)(]\s*\b(select|insert|update|delete|drop|union|exec|or|and)\b"#,
	)
	.expect("SQL pattern must compile.")
});
static PATH_TRAVERSAL_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\.\./|\.\.\\").expect("Traversal pattern must compile."));

/// Truncates, strips markup/URLs/control characters/emoji, collapses repeated
/// punctuation. Suspicious input is flagged, not rejected; only a query that
/// sanitizes down to nothing is an error.
pub fn sanitize(raw: &str, cfg: &arq_config::Preprocess) -> Result<Sanitized, RejectCode> {
	let truncated: String = raw.chars().take(cfg.max_chars as usize).collect();
	let flags = suspicion_flags(&truncated);
	let text = SCRIPT_TAG_RE.replace_all(&truncated, " ");
	let text = HTML_TAG_RE.replace_all(&text, " ");
	let text = URL_RE.replace_all(&text, " ");
	let text: String = text.chars().filter(|ch| !ch.is_control() && !is_emoji(*ch)).collect();
	let text = collapse_punctuation_runs(&text);
	let text = text.trim();

	if text.is_empty() {
		return Err(RejectCode::RejectEmpty);
	}

	Ok(Sanitized { text: text.to_string(), flags })
}

fn suspicion_flags(text: &str) -> Vec<SuspicionFlag> {
	let mut flags = Vec::new();

	if SQL_LIKE_RE.is_match(text) {
		flags.push(SuspicionFlag::SqlLike);
	}
	if SCRIPT_TAG_RE.is_match(text) {
		flags.push(SuspicionFlag::ScriptTag);
	}
	if PATH_TRAVERSAL_RE.is_match(text) {
		flags.push(SuspicionFlag::PathTraversal);
	}
	if special_char_density(text) > 0.20 {
		flags.push(SuspicionFlag::SpecialDensity);
	}

	flags
}

fn special_char_density(text: &str) -> f32 {
	let mut total = 0_usize;
	let mut special = 0_usize;

	for ch in text.chars() {
		if ch.is_whitespace() {
			continue;
		}

		total += 1;

		if !ch.is_alphanumeric() {
			special += 1;
		}
	}

	if total == 0 {
		return 0.0;
	}

	special as f32 / total as f32
}

fn is_punctuation(ch: char) -> bool {
	matches!(ch, '!' | '?' | '¿' | '¡' | '.' | ',' | ';' | ':')
}

/// Keeps the first character of any run of identical punctuation.
fn collapse_punctuation_runs(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut last: Option<char> = None;

	for ch in text.chars() {
		if is_punctuation(ch) && last == Some(ch) {
			continue;
		}

		out.push(ch);

		last = Some(ch);
	}

	out
}

fn is_emoji(ch: char) -> bool {
	matches!(
		u32::from(ch),
		0x1F000..=0x1FAFF // pictographs, emoticons, symbols
			| 0x2600..=0x27BF // misc symbols, dingbats
			| 0xFE00..=0xFE0F // variation selectors
			| 0x2190..=0x21FF // arrows
	)
}
