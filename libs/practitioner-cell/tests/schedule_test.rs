use chrono::NaiveTime;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use practitioner_cell::models::{CreateWorkingScheduleRequest, UpdateWorkingScheduleRequest};
use practitioner_cell::services::ScheduleService;
use shared_config::AppConfig;

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        supabase_url: base_url.to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        schedule_cache_ttl_secs: 60,
        max_daily_appointments_per_client: 3,
    }
}

fn time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}

fn create_request(day_of_week: i32, start: &str, end: &str) -> CreateWorkingScheduleRequest {
    CreateWorkingScheduleRequest {
        day_of_week,
        start_time: time(start),
        end_time: time(end),
        time_slot_interval_minutes: Some(30),
        is_active: None,
    }
}

fn schedule_row(practitioner_id: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "practitioner_id": practitioner_id,
        "day_of_week": 1,
        "start_time": format!("{}:00", start),
        "end_time": format!("{}:00", end),
        "time_slot_interval_minutes": 30,
        "is_active": true,
        "is_deleted": false,
        "created_at": "2025-06-01T00:00:00Z",
        "updated_at": "2025-06-01T00:00:00Z"
    })
}

async fn mount_existing(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/working_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

#[tokio::test]
async fn rejects_window_with_inverted_times() {
    let server = MockServer::start().await;
    let service = ScheduleService::new(&test_config(&server.uri()));

    let result = service
        .create_schedule(&Uuid::new_v4().to_string(), create_request(1, "18:00", "09:00"), "token")
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Start time must be before end time"));
}

#[tokio::test]
async fn rejects_out_of_range_weekday() {
    let server = MockServer::start().await;
    let service = ScheduleService::new(&test_config(&server.uri()));

    let result = service
        .create_schedule(&Uuid::new_v4().to_string(), create_request(7, "09:00", "18:00"), "token")
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Day of week"));
}

#[tokio::test]
async fn rejects_nonpositive_slot_interval() {
    let server = MockServer::start().await;
    let service = ScheduleService::new(&test_config(&server.uri()));

    let mut request = create_request(1, "09:00", "18:00");
    request.time_slot_interval_minutes = Some(0);

    let result = service
        .create_schedule(&Uuid::new_v4().to_string(), request, "token")
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Slot interval"));
}

#[tokio::test]
async fn rejects_window_overlapping_existing_same_day_window() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_existing(&server, json!([schedule_row(&practitioner_id, "09:00", "12:00")])).await;

    let service = ScheduleService::new(&test_config(&server.uri()));

    let result = service
        .create_schedule(&practitioner_id, create_request(1, "10:00", "13:00"), "token")
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("conflicts with existing window"));
}

#[tokio::test]
async fn adjacent_windows_on_the_same_day_are_allowed() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_existing(&server, json!([schedule_row(&practitioner_id, "09:00", "12:00")])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/working_schedules"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([schedule_row(&practitioner_id, "12:00", "18:00")])),
        )
        .mount(&server)
        .await;

    let service = ScheduleService::new(&test_config(&server.uri()));

    // Starts exactly where the morning window ends
    let created = service
        .create_schedule(&practitioner_id, create_request(1, "12:00", "18:00"), "token")
        .await
        .unwrap();

    assert_eq!(created.start_time, time("12:00"));
}

#[tokio::test]
async fn creates_window_when_day_is_free() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_existing(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/working_schedules"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([schedule_row(&practitioner_id, "09:00", "18:00")])),
        )
        .mount(&server)
        .await;

    let service = ScheduleService::new(&test_config(&server.uri()));

    let created = service
        .create_schedule(&practitioner_id, create_request(1, "09:00", "18:00"), "token")
        .await
        .unwrap();

    assert_eq!(created.day_of_week, 1);
    assert!(created.is_active);
}

#[tokio::test]
async fn update_validates_the_resulting_window() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    // Current row 09:00-12:00; moving the start past the end must fail
    mount_existing(&server, json!([schedule_row(&practitioner_id, "09:00", "12:00")])).await;

    let service = ScheduleService::new(&test_config(&server.uri()));

    let request = UpdateWorkingScheduleRequest {
        start_time: Some(time("13:00")),
        end_time: None,
        time_slot_interval_minutes: None,
        is_active: None,
    };

    let result = service
        .update_schedule(&Uuid::new_v4().to_string(), request, "token")
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Start time must be before end time"));
}

#[tokio::test]
async fn list_returns_rows_in_store_order() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4().to_string();

    mount_existing(
        &server,
        json!([
            schedule_row(&practitioner_id, "09:00", "12:00"),
            schedule_row(&practitioner_id, "14:00", "18:00")
        ]),
    )
    .await;

    let service = ScheduleService::new(&test_config(&server.uri()));

    let schedules = service.list_schedules(&practitioner_id, None).await.unwrap();

    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0].start_time, time("09:00"));
    assert_eq!(schedules[1].start_time, time("14:00"));
}

#[tokio::test]
async fn delete_is_a_soft_delete() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/working_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = ScheduleService::new(&test_config(&server.uri()));

    let result = service.delete_schedule(&Uuid::new_v4().to_string(), "token").await;

    assert!(result.is_ok());

    let requests = server.received_requests().await.unwrap();
    let patch = requests.iter().find(|r| r.method.as_str() == "PATCH").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(body["is_deleted"], json!(true));
}
