use std::sync::Arc;

use arq_providers::FaqHit;
use arq_service::{
	ArqService, DecisionSource, Error, Providers, ReplySource, ResolveRequest, SelectorProvider,
};
use arq_testkit::{
	CountingEmbedding, FailingSelector, ScriptedLexical, ScriptedSelector, ScriptedVector, faq,
	pin_rule, tenant_bundle, test_config,
};

struct Backend {
	lexical: Arc<ScriptedLexical>,
	vector: Arc<ScriptedVector>,
	embedding: Arc<CountingEmbedding>,
	selector: Arc<ScriptedSelector>,
}

fn service(backend: &Backend, bundle: arq_config::TenantBundle) -> ArqService {
	let providers = Providers::new(
		backend.lexical.clone(),
		backend.vector.clone(),
		backend.embedding.clone(),
		backend.selector.clone(),
	);

	ArqService::with_providers(test_config(), vec![bundle], providers)
}

fn backend(lexical: ScriptedLexical, vector: ScriptedVector, selector: ScriptedSelector) -> Backend {
	Backend {
		lexical: Arc::new(lexical),
		vector: Arc::new(vector),
		embedding: Arc::new(CountingEmbedding::default()),
		selector: Arc::new(selector),
	}
}

fn plain_tenant() -> arq_config::TenantBundle {
	tenant_bundle("apex", Vec::new(), Vec::new(), 4)
}

fn minimum_withdrawal_doc() -> FaqHit {
	faq(
		"faq-minimum-withdrawal",
		"minimum-withdrawal",
		"Retiro mínimo",
		"¿Cuál es el retiro mínimo?",
		"El retiro mínimo es de $50.",
		"withdrawals",
		0.50,
	)
}

fn safety_net_doc() -> FaqHit {
	faq(
		"faq-safety-net-general",
		"safety-net-general",
		"Safety net",
		"¿Qué es el safety net?",
		"El safety net es el umbral de saldo requerido.",
		"rules",
		0.60,
	)
}

fn withdrawal_fillers() -> Vec<FaqHit> {
	vec![
		faq("faq-w1", "payout-schedule", "Horario de pagos", "", "Se paga cada lunes.", "withdrawals", 0.10),
		faq("faq-w2", "payout-docs", "Documentos requeridos", "", "Necesitas tu identificación.", "withdrawals", 0.10),
		faq("faq-w3", "broker-fees", "Comisiones del broker", "", "La comisión es de $2.", "withdrawals", 0.10),
		faq("faq-w4", "payout-status", "Estado de solicitud", "", "Puedes revisarlo en el panel.", "withdrawals", 0.10),
	]
}

fn near_tie_rows() -> Vec<FaqHit> {
	vec![
		faq(
			"faq-a",
			"contacto-soporte",
			"Soporte por correo",
			"Como contacto al equipo",
			"Escríbenos a soporte.",
			"platforms",
			0.50,
		),
		faq(
			"faq-b",
			"horario-mercado",
			"Horario del mercado",
			"A que hora abre el mercado",
			"El mercado abre a las 18:00 CT.",
			"rules",
			0.46,
		),
	]
}

// Scenario: a pin rule resolves the query before any retrieval happens.
#[tokio::test]
async fn pin_match_short_circuits_retrieval() {
	let lexical = ScriptedLexical::default().with_docs(vec![minimum_withdrawal_doc()]);
	let backend = backend(lexical, ScriptedVector::default(), ScriptedSelector::none());
	let bundle = tenant_bundle(
		"apex",
		vec![pin_rule(r"primer\s+payout", "faq-minimum-withdrawal")],
		Vec::new(),
		4,
	);
	let service = service(&backend, bundle);
	let response = service
		.resolve(ResolveRequest { tenant: "apex".to_string(), query: "primer payout minimo".to_string() })
		.await
		.expect("resolve failed");

	assert!(response.found);
	assert_eq!(response.faq_id.as_deref(), Some("faq-minimum-withdrawal"));
	assert_eq!(response.decisions[0].source, DecisionSource::Pin);
	assert_eq!(backend.lexical.search_count(), 0);
	assert_eq!(backend.embedding.count(), 0);
	assert_eq!(backend.selector.count(), 0);
}

// Scenario: withdrawal tokens gate the intent, the safety-net rival is
// demoted, and the lexical gate accepts without touching the vector leg.
#[tokio::test]
async fn withdrawal_query_beats_safety_net_on_lexical_alone() {
	let mut rows = vec![minimum_withdrawal_doc(), safety_net_doc()];

	rows.extend(withdrawal_fillers());

	let backend = backend(
		ScriptedLexical::new(rows.clone(), rows),
		ScriptedVector::default(),
		ScriptedSelector::none(),
	);
	let service = service(&backend, plain_tenant());
	let response = service
		.resolve(ResolveRequest {
			tenant: "apex".to_string(),
			query: "cual es el safety net para retirar".to_string(),
		})
		.await
		.expect("resolve failed");

	assert!(response.found);
	assert_eq!(response.faq_id.as_deref(), Some("faq-minimum-withdrawal"));
	assert_eq!(response.decisions[0].source, DecisionSource::LexicalConfident);
	assert_eq!(backend.embedding.count(), 0);
	assert_eq!(backend.vector.count(), 0);
	assert_eq!(backend.selector.count(), 0);
}

// Scenario: a bare firm name returns the clarification and never retrieves.
#[tokio::test]
async fn bare_firm_name_is_clarified_without_retrieval() {
	let backend =
		backend(ScriptedLexical::default(), ScriptedVector::default(), ScriptedSelector::none());
	let service = service(&backend, plain_tenant());
	let response = service
		.resolve(ResolveRequest { tenant: "apex".to_string(), query: "apex".to_string() })
		.await
		.expect("resolve failed");

	assert!(!response.found);
	assert_eq!(response.source, ReplySource::None);
	assert!(response.text.contains("retiros"));
	assert_eq!(backend.lexical.search_count(), 0);
	assert_eq!(backend.lexical.fetch_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
	assert_eq!(backend.embedding.count(), 0);
	assert_eq!(backend.selector.count(), 0);
}

// Scenario: a 0.50 vs 0.46 near-tie fails the gate and goes to the selector.
#[tokio::test]
async fn near_tie_invokes_the_selector() {
	let rows = near_tie_rows();
	let backend = backend(
		ScriptedLexical::new(Vec::new(), rows),
		ScriptedVector::default(),
		ScriptedSelector::choose("faq-b"),
	);
	let service = service(&backend, plain_tenant());
	let response = service
		.resolve(ResolveRequest {
			tenant: "apex".to_string(),
			query: "quisiera info general sobre ustedes".to_string(),
		})
		.await
		.expect("resolve failed");

	assert!(response.found);
	assert_eq!(response.faq_id.as_deref(), Some("faq-b"));
	assert_eq!(response.decisions[0].source, DecisionSource::LlmSelect);
	assert_eq!(backend.selector.count(), 1);
	assert_eq!(backend.embedding.count(), 1);
	assert_eq!(backend.vector.count(), 1);
}

// Scenario: a category filter that starves retrieval falls back to the
// larger unfiltered set.
#[tokio::test]
async fn starved_category_filter_falls_back_to_unfiltered() {
	let mut unfiltered = vec![faq(
		"faq-discounts",
		"descuentos-activos",
		"Descuentos activos",
		"Hay alguna promocion vigente",
		"Usa el código SAVE20.",
		"discounts",
		0.90,
	)];

	unfiltered.extend(vec![
		faq("faq-f1", "soporte", "Soporte", "Donde contacto al equipo", "Por chat.", "platforms", 0.10),
		faq("faq-f2", "horarios", "Horarios", "Cuando abre el mercado", "A las 18:00 CT.", "rules", 0.10),
		faq("faq-f3", "brokers", "Brokers", "Con quien operan", "Con varios brokers.", "platforms", 0.10),
		faq("faq-f4", "pagos", "Medios de cobro", "Como pagan las ganancias", "Por transferencia.", "withdrawals", 0.10),
		faq("faq-f5", "contratos", "Contratos", "Cuantos contratos permiten", "Depende del plan.", "rules", 0.10),
	]);

	let backend = backend(
		ScriptedLexical::new(Vec::new(), unfiltered),
		ScriptedVector::default(),
		ScriptedSelector::none(),
	);
	let service = service(&backend, plain_tenant());
	let response = service
		.resolve(ResolveRequest {
			tenant: "apex".to_string(),
			query: "que descuentos tienen disponibles".to_string(),
		})
		.await
		.expect("resolve failed");

	assert!(response.found);
	assert_eq!(response.faq_id.as_deref(), Some("faq-discounts"));
	assert_eq!(response.decisions[0].source, DecisionSource::LexicalConfident);
	assert_eq!(backend.lexical.filtered_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
	assert_eq!(backend.lexical.unfiltered_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

// A vector list that confirms the lexical head lets the fused gate accept
// without the selector.
#[tokio::test]
async fn fused_margin_accepts_without_the_selector() {
	let rows = near_tie_rows();
	let vector_rows = vec![rows[0].clone()];
	let backend = backend(
		ScriptedLexical::new(Vec::new(), rows),
		ScriptedVector::new(vector_rows),
		ScriptedSelector::none(),
	);
	let service = service(&backend, plain_tenant());
	let response = service
		.resolve(ResolveRequest {
			tenant: "apex".to_string(),
			query: "quisiera info general sobre ustedes".to_string(),
		})
		.await
		.expect("resolve failed");

	assert!(response.found);
	assert_eq!(response.faq_id.as_deref(), Some("faq-a"));
	assert_eq!(response.decisions[0].source, DecisionSource::FusedConfident);
	assert_eq!(backend.selector.count(), 0);
	assert_eq!(backend.vector.count(), 1);
}

// Tenants can exempt whole intents from the vector leg.
#[tokio::test]
async fn vector_skip_intents_bypass_the_vector_leg() {
	let rows = vec![
		faq(
			"faq-d1",
			"descuentos-activos",
			"Descuentos activos",
			"Hay promociones ahora",
			"Usa el código SAVE20.",
			"discounts",
			0.30,
		),
		faq(
			"faq-d2",
			"descuentos-renovacion",
			"Descuentos de renovacion",
			"Hay rebaja al renovar",
			"La renovación tiene 15% de descuento.",
			"discounts",
			0.28,
		),
	];
	let backend = backend(
		ScriptedLexical::new(rows.clone(), rows),
		ScriptedVector::default(),
		ScriptedSelector::choose("faq-d2"),
	);
	let bundle = tenant_bundle("apex", Vec::new(), vec!["discounts".to_string()], 4);
	let service = service(&backend, bundle);
	let response = service
		.resolve(ResolveRequest {
			tenant: "apex".to_string(),
			query: "que descuentos tienen disponibles".to_string(),
		})
		.await
		.expect("resolve failed");

	assert!(response.found);
	assert_eq!(response.faq_id.as_deref(), Some("faq-d2"));
	assert_eq!(response.decisions[0].source, DecisionSource::LlmSelect);
	assert_eq!(backend.embedding.count(), 0);
	assert_eq!(backend.vector.count(), 0);
	assert_eq!(backend.selector.count(), 1);
}

// The embedding cache absorbs repeat vector queries.
#[tokio::test]
async fn repeat_queries_reuse_the_cached_embedding() {
	let rows = near_tie_rows();
	let backend = backend(
		ScriptedLexical::new(Vec::new(), rows),
		ScriptedVector::default(),
		ScriptedSelector::choose("faq-a"),
	);
	let service = service(&backend, plain_tenant());
	let request = ResolveRequest {
		tenant: "apex".to_string(),
		query: "quisiera info general sobre ustedes".to_string(),
	};

	service.resolve(request.clone()).await.expect("first resolve failed");
	service.resolve(request).await.expect("second resolve failed");

	assert_eq!(backend.embedding.count(), 1);
	assert_eq!(backend.selector.count(), 2);
}

// Selector failures are fatal for the request, never silently "not found".
#[tokio::test]
async fn selector_failure_fails_the_request() {
	let rows = near_tie_rows();
	let providers = Providers::new(
		Arc::new(ScriptedLexical::new(Vec::new(), rows)),
		Arc::new(ScriptedVector::default()),
		Arc::new(CountingEmbedding::default()),
		Arc::new(FailingSelector) as Arc<dyn SelectorProvider>,
	);
	let service = ArqService::with_providers(test_config(), vec![plain_tenant()], providers);
	let result = service
		.resolve(ResolveRequest {
			tenant: "apex".to_string(),
			query: "quisiera info general sobre ustedes".to_string(),
		})
		.await;

	assert!(matches!(result, Err(Error::Selector { .. })));
}

#[tokio::test]
async fn unknown_tenant_is_an_error() {
	let backend =
		backend(ScriptedLexical::default(), ScriptedVector::default(), ScriptedSelector::none());
	let service = service(&backend, plain_tenant());
	let result = service
		.resolve(ResolveRequest { tenant: "nadie".to_string(), query: "precio".to_string() })
		.await;

	assert!(matches!(result, Err(Error::UnknownTenant { .. })));
}

// Multi-question input runs the full pipeline per segment and concatenates
// the answers under per-segment headers.
#[tokio::test]
async fn multi_question_input_answers_each_segment() {
	let rows = vec![
		faq(
			"faq-pricing",
			"precio-mensual",
			"Precio mensual",
			"Cuanto vale la suscripcion",
			"La cuenta cuesta $167 al mes.",
			"pricing",
			0.90,
		),
		faq(
			"faq-withdrawal",
			"proceso-retiro",
			"Proceso de retiro",
			"Como pido mi dinero",
			"Solicitas el retiro desde el panel.",
			"withdrawals",
			0.85,
		),
		faq("faq-f1", "soporte", "Soporte", "Donde contacto al equipo", "Por chat.", "platforms", 0.05),
		faq("faq-f2", "horarios", "Horarios", "Cuando abre el mercado", "A las 18:00 CT.", "rules", 0.05),
		faq("faq-f3", "brokers", "Brokers", "Con quien operan", "Con varios brokers.", "platforms", 0.05),
		faq("faq-f4", "niveles", "Niveles", "Cuantos niveles hay", "Hay tres niveles.", "rules", 0.05),
	];
	let backend = backend(
		ScriptedLexical::new(rows.clone(), rows),
		ScriptedVector::default(),
		ScriptedSelector::none(),
	);
	let service = service(&backend, plain_tenant());
	let response = service
		.resolve(ResolveRequest {
			tenant: "apex".to_string(),
			query: "¿Cuál es el precio? ¿Cómo funciona el retiro?".to_string(),
		})
		.await
		.expect("resolve failed");

	assert!(response.found);
	assert_eq!(response.decisions.len(), 2);
	assert!(response.faq_id.is_none());
	assert!(response.text.contains("1. "));
	assert!(response.text.contains("2. "));
	assert!(response.text.contains("$167"));
	assert!(response.text.contains("panel"));
}
