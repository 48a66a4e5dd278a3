// API Integration Tests
//
// Purpose: Drive every endpoint through the router with a scripted model
// Run with: cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use greenbuild_rust::chat::ChatAssistant;
    use greenbuild_rust::recommend::{
        ModelError, RecommendationCache, RecommendationOrchestrator, RetryPolicy, ScriptedModel,
    };
    use greenbuild_rust::{create_router, AnalysisService, AppState, DecisionEngine, MaterialCatalog};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt; // for oneshot

    const RECOMMENDATION: &str = r#"{
        "hotspots": [{"material": "Concrete (Standard)", "reason": "Largest share of embodied carbon"}],
        "optimizations": [
            {"title": "Low-carbon concrete", "action": "Specify slag blend", "carbonSavingTons": 5.6,
             "costDeltaUsd": 2240, "durability": "High", "technicalExplanation": "Less clinker",
             "tradeoff": "Saves 38% frame carbon for +33% frame cost"}
        ],
        "impactSummary": "Frame concrete dominates",
        "policyInsight": "Check local embodied-carbon procurement rules"
    }"#;

    // Helper: Create test app around a scripted model
    fn create_test_app(model: Arc<ScriptedModel>) -> axum::Router {
        let orchestrator = RecommendationOrchestrator::new(
            model.clone(),
            RetryPolicy::default().with_backoff(Duration::ZERO),
        );
        let service = AnalysisService::new(
            DecisionEngine::reference(),
            Arc::new(MaterialCatalog::reference()),
            orchestrator,
            RecommendationCache::default(),
        );
        create_router(AppState::new(service, ChatAssistant::new(model)))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    // Helper: Parse JSON response
    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    // =========================================================================
    // Section 1: Health Check
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app(Arc::new(ScriptedModel::new(vec![])));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    // =========================================================================
    // Section 2: Analyze
    // =========================================================================

    #[tokio::test]
    async fn test_analyze_with_recommendation() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(RECOMMENDATION.to_string())]));
        let app = create_test_app(model.clone());

        let response = app
            .oneshot(post_json(
                "/api/analyze",
                json!({"type": "House", "area": 2500, "floors": 2, "location": "Austin, TX", "budget": "Medium"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;

        assert_eq!(body["recommendationStatus"], "available");
        assert_eq!(body["recommendation"]["hotspots"][0]["material"], "Concrete (Standard)");
        assert_eq!(body["recommendation"]["optimizations"][0]["durability"], "High");
        assert_eq!(body["baseline"]["allocations"].as_array().unwrap().len(), 7);
        assert_eq!(body["catalog"].as_array().unwrap().len(), 13);
        assert!(body["impact"]["class"].is_string());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_analyze_degrades_when_model_fails() {
        let model = Arc::new(ScriptedModel::failing(
            ModelError::Http { status: 503, message: "overloaded".to_string() },
            2,
        ));
        let app = create_test_app(model.clone());

        let response = app
            .oneshot(post_json("/api/analyze", json!({"type": "Office", "area": 10000, "floors": 4})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert!(body["recommendation"].is_null());
        assert_eq!(body["recommendationStatus"], "unavailable");
        assert!(body["baseline"]["totalCarbon"].as_f64().unwrap() > 0.0);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_analyze_session_reuses_recommendation() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(RECOMMENDATION.to_string())]));
        let app = create_test_app(model.clone());
        let request = json!({"type": "House", "area": 2500, "floors": 2, "sessionId": "session-1"});

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json("/api/analyze", request.clone()))
                .await
                .unwrap();
            let body = json_response(response).await;
            assert_eq!(body["recommendationStatus"], "available");
        }

        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_analyze_invalid_spec() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let app = create_test_app(model.clone());

        let response = app
            .oneshot(post_json("/api/analyze", json!({"type": "House", "area": -10, "floors": 2})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("area"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_unknown_type_uses_fallback() {
        let app = create_test_app(Arc::new(ScriptedModel::failing(
            ModelError::Authentication("no key".to_string()),
            1,
        )));

        let response = app
            .oneshot(post_json("/api/analyze", json!({"type": "Warehouse", "area": 2500, "floors": 2})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        // House fallback: 40 kg/area primary structure × 2500 × 1.12
        let primary = body["baseline"]["allocations"][0]["quantity"].as_f64().unwrap();
        assert!((primary - 112_000.0).abs() < 1e-6);
    }

    // =========================================================================
    // Section 3: Engine-only endpoints
    // =========================================================================

    #[tokio::test]
    async fn test_bill_endpoint_never_calls_model() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let app = create_test_app(model.clone());

        let response = app
            .oneshot(post_json(
                "/api/bill",
                json!({"spec": {"type": "School", "area": 40000, "floors": 2}, "bias": 0.9}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["bias"], 0.9);
        assert!(body["impact"]["equivalences"].as_array().unwrap().len() == 3);
        let substituted = body["allocations"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["substituted"] == true)
            .count();
        assert_eq!(substituted, 5);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_scenarios_endpoint() {
        let app = create_test_app(Arc::new(ScriptedModel::new(vec![])));

        let response = app
            .oneshot(post_json(
                "/api/scenarios",
                json!({"spec": {"type": "Hospital", "area": 20000, "floors": 6}, "bias": 0.5}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        let baseline = body["baseline"]["totalCarbon"].as_f64().unwrap();
        let best = body["bestCase"]["totalCarbon"].as_f64().unwrap();
        assert!(best < baseline);
        assert!(body["carbonSavingPct"].as_f64().unwrap() > 0.0);
        assert_eq!(body["strategy"]["materialSourcing"], "Standard Regional");
    }

    #[tokio::test]
    async fn test_unconfigured_building_type_is_422() {
        use greenbuild_rust::engine::EngineConfig;
        use greenbuild_rust::RatioTables;

        let engine = DecisionEngine::new(
            EngineConfig::reference().with_ratio_tables(RatioTables::reference().without_fallback()),
        );
        let model = Arc::new(ScriptedModel::new(vec![]));
        let service = AnalysisService::new(
            engine,
            Arc::new(MaterialCatalog::reference()),
            RecommendationOrchestrator::new(model.clone(), RetryPolicy::default()),
            RecommendationCache::default(),
        );
        let app = create_router(AppState::new(service, ChatAssistant::new(model)));

        let response = app
            .oneshot(post_json("/api/bill", json!({"spec": {"type": "Warehouse", "area": 100, "floors": 1}})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    // =========================================================================
    // Section 4: Chat
    // =========================================================================

    #[tokio::test]
    async fn test_chat_reply() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("Try cross-laminated timber.".to_string())]));
        let app = create_test_app(model.clone());

        let response = app
            .oneshot(post_json(
                "/api/chat",
                json!({"message": "Low-carbon floor options?", "history": [{"role": "user", "content": "Hi"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Try cross-laminated timber.");

        let prompt = &model.requests()[0].prompt;
        assert!(prompt.contains("User: Hi"));
    }

    #[tokio::test]
    async fn test_chat_empty_message() {
        let app = create_test_app(Arc::new(ScriptedModel::new(vec![])));

        let response = app
            .oneshot(post_json("/api/chat", json!({"message": ""})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_chat_fallback() {
        let app = create_test_app(Arc::new(ScriptedModel::failing(
            ModelError::Network("connection reset".to_string()),
            1,
        )));

        let response = app
            .oneshot(post_json("/api/chat", json!({"message": "Hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_response(response).await;
        assert_eq!(body["success"], false);
    }
}
