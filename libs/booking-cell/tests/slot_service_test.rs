use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::services::SlotService;
use shared_cache::InMemoryCache;
use shared_config::AppConfig;

// 2025-06-16 is a Monday
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

fn time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        supabase_url: base_url.to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        schedule_cache_ttl_secs: 60,
        max_daily_appointments_per_client: 3,
    }
}

fn monday_schedule_row(practitioner_id: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "practitioner_id": practitioner_id,
        "day_of_week": 1,
        "start_time": "08:00:00",
        "end_time": "19:00:00",
        "time_slot_interval_minutes": 30,
        "is_active": true,
        "is_deleted": false,
        "created_at": "2025-06-01T00:00:00Z",
        "updated_at": "2025-06-01T00:00:00Z"
    })
}

async fn mount_schedules(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/working_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

async fn mount_appointments(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

#[tokio::test]
async fn generates_full_day_of_slots_from_store_data() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_schedules(&server, json!([monday_schedule_row(&practitioner_id)])).await;
    mount_appointments(
        &server,
        json!([{ "start_time": "10:00:00", "end_time": "10:30:00" }]),
    )
    .await;

    let config = test_config(&server.uri());
    let service = SlotService::new(&config, Arc::new(InMemoryCache::new()));

    let slots = service.slots_for_date(&practitioner_id, monday(), 30).await;

    assert_eq!(slots.len(), 22);
    let ten = slots.iter().find(|s| s.time == time("10:00")).unwrap();
    assert!(!ten.available);
    assert_eq!(slots.iter().filter(|s| !s.available).count(), 1);
}

#[tokio::test]
async fn legacy_datetime_rows_are_normalized_before_conflict_checks() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_schedules(&server, json!([monday_schedule_row(&practitioner_id)])).await;
    mount_appointments(
        &server,
        json!([
            { "start_time": "2025-06-16T14:00:00Z", "end_time": "2025-06-16T15:00:00Z" },
            { "start_time": "bogus", "end_time": "also bogus" }
        ]),
    )
    .await;

    let config = test_config(&server.uri());
    let service = SlotService::new(&config, Arc::new(InMemoryCache::new()));

    let slots = service.slots_for_date(&practitioner_id, monday(), 30).await;

    // The unparsable row is skipped; the date-time row still blocks 14:00-15:00
    let blocked: Vec<_> = slots.iter().filter(|s| !s.available).map(|s| s.time).collect();
    assert_eq!(blocked, vec![time("14:00"), time("14:30")]);
}

#[tokio::test]
async fn store_failures_degrade_to_no_slots_without_error() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let service = SlotService::new(&config, Arc::new(InMemoryCache::new()));

    let slots = service.slots_for_date(&practitioner_id, monday(), 30).await;

    assert!(slots.is_empty());
}

#[tokio::test]
async fn schedules_are_served_from_cache_on_repeat_queries() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_schedules(&server, json!([monday_schedule_row(&practitioner_id)])).await;
    mount_appointments(&server, json!([])).await;

    let config = test_config(&server.uri());
    let cache = Arc::new(InMemoryCache::new());
    let service = SlotService::new(&config, cache.clone());

    let first = service.slots_for_date(&practitioner_id, monday(), 30).await;
    assert_eq!(first.len(), 22);

    // Drop every mock; only the cached schedule rows can produce slots now
    server.reset().await;

    let second = service.slots_for_date(&practitioner_id, monday(), 30).await;
    assert_eq!(second.len(), 22);
}

#[tokio::test]
async fn day_without_schedule_yields_empty_slot_list() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_schedules(&server, json!([])).await;
    mount_appointments(&server, json!([])).await;

    let config = test_config(&server.uri());
    let service = SlotService::new(&config, Arc::new(InMemoryCache::new()));

    let slots = service.slots_for_date(&practitioner_id, monday(), 30).await;

    assert!(slots.is_empty());
}
