use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// English trading terms mapped to the Spanish wording the FAQ corpus is
/// indexed under. Phrases come before single words so they win replacement.
const TERM_MAP: &[(&str, &str)] = &[
	("payment methods", "metodos de pago"),
	("payment method", "metodo de pago"),
	("cash out", "retirar"),
	("how much does it cost", "cuanto cuesta"),
	("how much", "cuanto"),
	("account size", "tamano de cuenta"),
	("withdrawals", "retiros"),
	("withdrawal", "retiro"),
	("withdraw", "retirar"),
	("pricing", "precios"),
	("price", "precio"),
	("cost", "costo"),
	("rules", "reglas"),
	("rule", "regla"),
	("accounts", "cuentas"),
	("account", "cuenta"),
	("discounts", "descuentos"),
	("discount", "descuento"),
	("coupon", "cupon"),
	("platforms", "plataformas"),
	("platform", "plataforma"),
	("fees", "comisiones"),
	("fee", "comision"),
	("payment", "pago"),
];

static TERM_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
	TERM_MAP
		.iter()
		.map(|(en, es)| {
			let pattern = format!(r"\b{}\b", regex::escape(en));

			(Regex::new(&pattern).expect("Term pattern must compile."), *es)
		})
		.collect()
});
static WHITESPACE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\s+").expect("Whitespace pattern must compile."));

/// NFC-normalizes, lowercases, folds accents, maps English trading terms to
/// their Spanish equivalents, and collapses whitespace.
pub fn normalize(text: &str) -> String {
	let text: String = text.nfc().collect::<String>().to_lowercase();
	let mut text = fold_accents(&text);

	for (pattern, replacement) in TERM_PATTERNS.iter() {
		if pattern.is_match(&text) {
			text = pattern.replace_all(&text, *replacement).into_owned();
		}
	}

	WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Strips combining marks after NFD decomposition, so "retiró" matches
/// "retiro". The ñ is folded to n by the same rule.
pub fn fold_accents(text: &str) -> String {
	text.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

/// Best-effort language tag for logging. Never used to gate the pipeline.
pub fn language_tag(text: &str) -> &'static str {
	let Some(info) = whatlang::detect(text) else {
		return "unknown";
	};

	match info.lang() {
		whatlang::Lang::Spa => "es",
		whatlang::Lang::Eng => "en",
		_ => "other",
	}
}
