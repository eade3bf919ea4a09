// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leadsync::config::settings::{DeliveryProviderSettings, LlmSettings, ScrapeProviderSettings};
use leadsync::domain::gateways::delivery_provider::{DeliveryProviderGateway, RemoteLead};
use leadsync::domain::gateways::icebreaker_generator::IcebreakerGenerator;
use leadsync::domain::gateways::scrape_provider::{RunState, ScrapeProviderGateway};
use leadsync::domain::gateways::GatewayError;
use leadsync::domain::models::campaign::{CampaignStats, RemoteRunState};
use leadsync::domain::models::lead::LeadProfile;
use leadsync::domain::models::organization::PersonalizationContext;
use leadsync::infrastructure::gateways::apify_scrape_gateway::ApifyScrapeGateway;
use leadsync::infrastructure::gateways::instantly_delivery_gateway::InstantlyDeliveryGateway;
use leadsync::infrastructure::gateways::openai_icebreaker_generator::OpenAiIcebreakerGenerator;
use serde_json::{json, Map, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scrape_settings(server: &MockServer) -> ScrapeProviderSettings {
    ScrapeProviderSettings {
        base_url: server.uri(),
        api_token: Some("apify-token".to_string()),
        actor_id: "leads~finder".to_string(),
        page_size: 10,
        max_fetch_count: 1000,
        timeout_secs: 5,
    }
}

fn delivery_settings(server: &MockServer) -> DeliveryProviderSettings {
    DeliveryProviderSettings {
        base_url: server.uri(),
        api_key: Some("instantly-key".to_string()),
        timeout_secs: 5,
    }
}

fn llm_settings(server: &MockServer, api_key: Option<&str>) -> LlmSettings {
    LlmSettings {
        api_key: api_key.map(str::to_string),
        model: "gpt-4o-mini".to_string(),
        api_base_url: format!("{}/v1", server.uri()),
        timeout_secs: 5,
        max_tokens: 120,
    }
}

async fn last_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let request = requests.last().unwrap();
    serde_json::from_slice(&request.body).unwrap()
}

#[tokio::test]
async fn test_apify_start_search_posts_input_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/acts/leads~finder/runs"))
        .and(header("authorization", "Bearer apify-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-abc", "status": "READY" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ApifyScrapeGateway::new(&scrape_settings(&server)).unwrap();
    let mut input = Map::new();
    input.insert("contact_job_title".to_string(), json!(["CTO"]));
    input.insert("fetch_count".to_string(), json!(25));

    let run = gateway.start_search(&input).await.unwrap();
    assert_eq!(run.run_id, "run-abc");
    assert_eq!(last_body(&server).await["fetch_count"], 25);
}

#[tokio::test]
async fn test_apify_succeeded_run_reports_dataset_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "run-abc", "status": "SUCCEEDED" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-abc/dataset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "ds-1", "itemCount": 42 }
        })))
        .mount(&server)
        .await;

    let gateway = ApifyScrapeGateway::new(&scrape_settings(&server)).unwrap();
    let status = gateway.get_run_status("run-abc").await.unwrap();
    assert_eq!(status.state, RunState::Succeeded);
    assert_eq!(status.result_count, Some(42));
    assert!(status.failure_reason.is_none());
}

#[tokio::test]
async fn test_apify_failed_run_carries_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "run-bad", "status": "TIMED-OUT", "statusMessage": "Actor timed out" }
        })))
        .mount(&server)
        .await;

    let gateway = ApifyScrapeGateway::new(&scrape_settings(&server)).unwrap();
    let status = gateway.get_run_status("run-bad").await.unwrap();
    assert_eq!(status.state, RunState::TimedOut);
    assert_eq!(status.failure_reason.as_deref(), Some("Actor timed out"));
    assert!(status.result_count.is_none());
}

#[tokio::test]
async fn test_apify_results_page_offsets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-abc/dataset/items"))
        .and(query_param("offset", "20"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "email": "a@example.com", "first_name": "A" },
            "garbage",
            { "email": "b@example.com" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ApifyScrapeGateway::new(&scrape_settings(&server)).unwrap();
    let page = gateway.get_results("run-abc", 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["email"], "a@example.com");
}

#[tokio::test]
async fn test_apify_error_classification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-503"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-400"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad run id"))
        .mount(&server)
        .await;

    let gateway = ApifyScrapeGateway::new(&scrape_settings(&server)).unwrap();

    let err = gateway.get_run_status("run-503").await.unwrap_err();
    assert!(matches!(err, GatewayError::Unavailable(_)));
    assert!(err.is_transient());

    let err = gateway.get_run_status("run-400").await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected { status: 400, .. }));
    assert!(!err.is_transient());

    // Unmatched requests get a 404 from the mock server
    let err = gateway.get_run_status("run-missing").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn test_instantly_create_campaign_sends_name_and_schedule() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/campaigns"))
        .and(header("authorization", "Bearer instantly-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "camp-1", "name": "Q1 Founders", "status": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = InstantlyDeliveryGateway::new(&delivery_settings(&server)).unwrap();
    let id = gateway.create_campaign("Q1 Founders").await.unwrap();
    assert_eq!(id, "camp-1");

    let body = last_body(&server).await;
    assert_eq!(body["name"], "Q1 Founders");
    assert!(body["campaign_schedule"]["schedules"].is_array());
}

#[tokio::test]
async fn test_instantly_get_campaign_merges_analytics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/campaigns/camp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "camp-1", "name": "Q1 Founders", "status": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/campaigns/analytics"))
        .and(query_param("id", "camp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "campaign_id": "camp-1",
            "emails_sent_count": 120,
            "open_count": 60,
            "reply_count": 7
        }])))
        .mount(&server)
        .await;

    let gateway = InstantlyDeliveryGateway::new(&delivery_settings(&server)).unwrap();
    let snapshot = gateway.get_campaign("camp-1").await.unwrap();
    assert_eq!(snapshot.status.as_deref(), Some("active"));
    assert_eq!(
        snapshot.stats,
        CampaignStats {
            sent: 120,
            opened: 60,
            replied: 7
        }
    );
}

#[tokio::test]
async fn test_instantly_search_follows_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/campaigns"))
        .and(query_param("starting_after", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "c3", "name": "Outreach copy" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/campaigns"))
        .and(query_param("search", "Outreach"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "c1", "name": "Outreach", "status": 2 },
                { "id": "c2", "name": "Outreach v2" }
            ],
            "next_starting_after": "c2"
        })))
        .mount(&server)
        .await;

    let gateway = InstantlyDeliveryGateway::new(&delivery_settings(&server)).unwrap();
    let found = gateway.find_campaigns_by_name("Outreach").await.unwrap();
    let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    assert_eq!(found[0].status.as_deref(), Some("paused"));
}

#[tokio::test]
async fn test_instantly_add_leads_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/leads/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = InstantlyDeliveryGateway::new(&delivery_settings(&server)).unwrap();
    let lead = RemoteLead {
        email: "ada@example.com".to_string(),
        first_name: Some("Ada".to_string()),
        last_name: None,
        company_name: Some("Engines Ltd".to_string()),
        job_title: Some("CTO".to_string()),
        phone: None,
        linkedin_url: None,
        personalization: "Loved your talk on engines.".to_string(),
    };
    gateway.add_leads("camp-1", &[lead]).await.unwrap();

    let body = last_body(&server).await;
    assert_eq!(body["campaign_id"], "camp-1");
    assert_eq!(body["leads"][0]["email"], "ada@example.com");
    assert_eq!(
        body["leads"][0]["personalization"],
        "Loved your talk on engines."
    );
    assert_eq!(body["leads"][0]["custom_variables"]["job_title"], "CTO");

    // Empty batches never reach the wire
    gateway.add_leads("camp-1", &[]).await.unwrap();
}

#[tokio::test]
async fn test_instantly_set_status_and_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/campaigns/camp-1/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/campaigns/camp-1/pause"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let gateway = InstantlyDeliveryGateway::new(&delivery_settings(&server)).unwrap();
    gateway
        .set_status("camp-1", RemoteRunState::Active)
        .await
        .unwrap();

    let err = gateway
        .set_status("camp-1", RemoteRunState::Paused)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Unavailable(_)));
}

#[tokio::test]
async fn test_instantly_list_accounts_maps_flags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "email": "alice@send.io", "status": 1, "warmup_status": 1, "stat_warmup_score": 97.0, "daily_limit": 40 },
                { "email": "bob@send.io", "status": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let gateway = InstantlyDeliveryGateway::new(&delivery_settings(&server)).unwrap();
    let accounts = gateway.list_accounts().await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(accounts[0].active);
    assert!(accounts[0].warmup_enabled);
    assert_eq!(accounts[0].reputation_score, Some(97.0));
    assert!(!accounts[1].active);
    assert_eq!(accounts[1].daily_limit, None);
}

fn profile() -> LeadProfile {
    LeadProfile {
        full_name: Some("Ada Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
        title: Some("CTO".to_string()),
        company: Some("Analytical Engines".to_string()),
        ..Default::default()
    }
}

fn context() -> PersonalizationContext {
    PersonalizationContext {
        sender_company: Some("Acme".to_string()),
        value_proposition: Some("Book more meetings".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_openai_generator_returns_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  \"Your engine work is fascinating.\"  " } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = OpenAiIcebreakerGenerator::new(&llm_settings(&server, Some("sk-test"))).unwrap();
    let text = generator.generate(&profile(), &context()).await.unwrap();
    assert_eq!(text, "Your engine work is fascinating.");

    let body = last_body(&server).await;
    assert_eq!(body["model"], "gpt-4o-mini");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Analytical Engines"));
    assert!(prompt.contains("Book more meetings"));
}

#[tokio::test]
async fn test_openai_generator_rejects_empty_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "   " } }]
        })))
        .mount(&server)
        .await;

    let generator = OpenAiIcebreakerGenerator::new(&llm_settings(&server, Some("sk-test"))).unwrap();
    let err = generator.generate(&profile(), &context()).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_openai_generator_without_key_makes_no_request() {
    let server = MockServer::start().await;
    let generator = OpenAiIcebreakerGenerator::new(&llm_settings(&server, None)).unwrap();

    let err = generator.generate(&profile(), &context()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected { status: 401, .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_openai_generator_auth_failure_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let generator = OpenAiIcebreakerGenerator::new(&llm_settings(&server, Some("sk-bad"))).unwrap();
    let err = generator.generate(&profile(), &context()).await.unwrap_err();
    match err {
        GatewayError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("invalid api key"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}
