use std::sync::LazyLock;

use regex::Regex;

/// Topical buckets used to filter and bias retrieval, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	Withdrawals,
	PaymentMethods,
	Rules,
	Pricing,
	Platforms,
	Discounts,
}
impl Intent {
	pub const ALL: [Self; 6] = [
		Self::Withdrawals,
		Self::PaymentMethods,
		Self::Rules,
		Self::Pricing,
		Self::Platforms,
		Self::Discounts,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Withdrawals => "withdrawals",
			Self::PaymentMethods => "payment_methods",
			Self::Rules => "rules",
			Self::Pricing => "pricing",
			Self::Platforms => "platforms",
			Self::Discounts => "discounts",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|intent| intent.as_str() == value)
	}
}

/// The set of categories a query is gated to. Containing every bucket means
/// "unconstrained": the retriever must not filter at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentSet {
	intents: Vec<Intent>,
}
impl IntentSet {
	pub fn of(intents: Vec<Intent>) -> Self {
		Self { intents }
	}

	pub fn unconstrained() -> Self {
		Self { intents: Intent::ALL.to_vec() }
	}

	pub fn is_unconstrained(&self) -> bool {
		self.intents.len() == Intent::ALL.len()
	}

	pub fn contains(&self, intent: Intent) -> bool {
		self.intents.contains(&intent)
	}

	pub fn intents(&self) -> &[Intent] {
		&self.intents
	}

	/// The wire-level category filter: `None` when unconstrained, so the
	/// retriever never over-filters.
	pub fn category_filter(&self) -> Option<Vec<String>> {
		if self.is_unconstrained() {
			return None;
		}

		Some(self.intents.iter().map(|intent| intent.as_str().to_string()).collect())
	}
}

static WITHDRAWAL_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"retir\w*|\bwithdraw\w*|\bpayout\w*|\bcash\s*out\b|\bcobr(?:o|os|ar)\b")
		.expect("Withdrawal pattern must compile.")
});
static PAYMENT_METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"metodos? de pago|\btransferencia\b|\btarjeta\b|\bcrypto\b|\busdt\b|\bpaypal\b|\bwise\b")
		.expect("Payment method pattern must compile.")
});
static SAFETY_NET_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"safety\s*net|\bcolchon\b|\bumbral\b|\bthreshold\b|saldo minimo")
		.expect("Safety net pattern must compile.")
});
static RULES_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\bregla\w*|\bnorma\w*|\bdrawdown\b|\bconsistencia\b|\blimite\w*|safety\s*net|\bcontrato\w*")
		.expect("Rules pattern must compile.")
});
static PRICING_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\bprecio\w*|\bcosto\w*|\bcuota\w*|cuanto (?:cuesta|vale|sale)|\bmensualidad\b|\bactivacion\b")
		.expect("Pricing pattern must compile.")
});
static PLATFORMS_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\bplataforma\w*|\bninjatrader\b|\btradingview\b|\brithmic\b|\btradovate\b|\bquantower\b")
		.expect("Platforms pattern must compile.")
});
static DISCOUNTS_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\bdescuento\w*|\bcupon\w*|\bpromocion\w*|\boferta\w*|\bcodigo\b")
		.expect("Discounts pattern must compile.")
});

/// A precedence rule: when `trigger` matches and `unless` does not, the gate
/// short-circuits to exactly `outcome`.
struct PrecedenceRule {
	trigger: &'static LazyLock<Regex>,
	unless: Option<&'static LazyLock<Regex>>,
	outcome: Intent,
}

/// Withdrawal queries are the dominant disambiguation failure mode in this
/// domain, hence hard precedence over payment-method and safety-net signals.
static PRECEDENCE_RULES: [PrecedenceRule; 3] = [
	PrecedenceRule { trigger: &WITHDRAWAL_RE, unless: None, outcome: Intent::Withdrawals },
	PrecedenceRule {
		trigger: &PAYMENT_METHOD_RE,
		unless: Some(&WITHDRAWAL_RE),
		outcome: Intent::PaymentMethods,
	},
	PrecedenceRule {
		trigger: &SAFETY_NET_RE,
		unless: Some(&WITHDRAWAL_RE),
		outcome: Intent::Rules,
	},
];

fn bucket_pattern(intent: Intent) -> &'static Regex {
	match intent {
		Intent::Withdrawals => &WITHDRAWAL_RE,
		Intent::PaymentMethods => &PAYMENT_METHOD_RE,
		Intent::Rules => &RULES_RE,
		Intent::Pricing => &PRICING_RE,
		Intent::Platforms => &PLATFORMS_RE,
		Intent::Discounts => &DISCOUNTS_RE,
	}
}

/// Classifies a normalized query. Pure: identical input yields identical
/// output.
pub fn classify(text: &str) -> IntentSet {
	for rule in &PRECEDENCE_RULES {
		if !rule.trigger.is_match(text) {
			continue;
		}
		if rule.unless.map(|veto| veto.is_match(text)).unwrap_or(false) {
			continue;
		}

		return IntentSet::of(vec![rule.outcome]);
	}

	let matched: Vec<Intent> = Intent::ALL
		.into_iter()
		.filter(|intent| bucket_pattern(*intent).is_match(text))
		.collect();

	if matched.is_empty() {
		return IntentSet::unconstrained();
	}

	IntentSet::of(matched)
}

pub fn has_withdrawal_tokens(text: &str) -> bool {
	WITHDRAWAL_RE.is_match(text)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn withdrawal_tokens_win_over_everything() {
		let set = classify("cual es el safety net para retirar");

		assert_eq!(set.intents(), &[Intent::Withdrawals]);
	}

	#[test]
	fn withdrawal_tokens_win_over_payment_methods() {
		let set = classify("puedo retirar por transferencia");

		assert_eq!(set.intents(), &[Intent::Withdrawals]);
	}

	#[test]
	fn payment_methods_without_withdrawal_tokens() {
		let set = classify("aceptan tarjeta o crypto");

		assert_eq!(set.intents(), &[Intent::PaymentMethods]);
	}

	#[test]
	fn safety_net_without_withdrawal_tokens_maps_to_rules() {
		let set = classify("que es el safety net");

		assert_eq!(set.intents(), &[Intent::Rules]);
	}

	#[test]
	fn bucket_cascade_returns_matches_in_declaration_order() {
		let set = classify("que plataformas soportan y que descuentos hay");

		assert_eq!(set.intents(), &[Intent::Platforms, Intent::Discounts]);
	}

	#[test]
	fn no_match_is_unconstrained() {
		let set = classify("quien es el fundador de la empresa");

		assert!(set.is_unconstrained());
		assert!(set.category_filter().is_none());
	}

	#[test]
	fn constrained_set_produces_a_filter() {
		let set = classify("como funciona el payout");
		let filter = set.category_filter().expect("expected a filter");

		assert_eq!(filter, vec!["withdrawals".to_string()]);
	}

	#[test]
	fn classification_is_deterministic() {
		let first = classify("cuanto cuesta la cuenta de 50k");
		let second = classify("cuanto cuesta la cuenta de 50k");

		assert_eq!(first, second);
	}
}
