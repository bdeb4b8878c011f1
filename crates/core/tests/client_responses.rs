//! Client normalisation of responses the sandbox never produces.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::NaiveDate;
use fhir::{AppointmentData, AppointmentStatus, Reference, ResourceId};
use radbook_core::{
    ApiError, BookingConfig, BookingController, BookingError, ClinicalRecordsApi,
    DuplicateCheckPolicy, HttpClinicalRecordsApi, NoticeKind, NotificationSurface, Phase,
};

const ACTIVE_REQUEST: &str = r#"{
    "resourceType": "ServiceRequest",
    "id": "SR-1",
    "status": "active",
    "priority": "routine",
    "subject": {"display": "Ana Torres"},
    "code": {"text": "CT Chest"}
}"#;

fn json(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn appointment_lookup(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "E500" | "SR-1" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "NULL" => json(StatusCode::OK, "null"),
        "EMPTY" => StatusCode::OK.into_response(),
        "ARR" => json(StatusCode::OK, "[]"),
        "LISTED" => json(
            StatusCode::OK,
            r#"[{"resourceType": "Appointment", "id": "A-7"}]"#,
        ),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn service_request(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "SR-1" => json(StatusCode::OK, ACTIVE_REQUEST),
        "NOID" => json(
            StatusCode::OK,
            r#"{"resourceType": "ServiceRequest", "status": "active"}"#,
        ),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_appointment() -> Response {
    json(StatusCode::CREATED, "{}")
}

async fn start_stub() -> String {
    let app = Router::new()
        .route("/servicerequest/:id", get(service_request))
        .route("/appointment/service-request/:id", get(appointment_lookup))
        .route("/appointment", post(create_appointment));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

fn id(value: &str) -> ResourceId {
    ResourceId::new(value).expect("valid id")
}

async fn stub_api() -> HttpClinicalRecordsApi {
    let base = start_stub().await;
    let cfg = BookingConfig::new(&base).expect("config");
    HttpClinicalRecordsApi::new(&cfg).expect("client builds")
}

#[derive(Default)]
struct Notices(Vec<NoticeKind>);

impl NotificationSurface for Notices {
    fn present(&mut self, _title: &str, _message: &str, kind: NoticeKind) {
        self.0.push(kind);
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
}

async fn controller(
    policy: DuplicateCheckPolicy,
) -> BookingController<HttpClinicalRecordsApi, Notices> {
    let base = start_stub().await;
    let cfg = BookingConfig::new(&base)
        .expect("config")
        .with_duplicate_check(policy);
    let api = HttpClinicalRecordsApi::new(&cfg).expect("client builds");
    BookingController::new(api, Notices::default(), cfg).with_clock(today)
}

#[tokio::test]
async fn appointment_lookup_server_error_is_unexpected_status() {
    let api = stub_api().await;

    let err = api
        .find_appointment_for_service_request(&id("E500"))
        .await
        .expect_err("500 is not an answer");

    assert!(matches!(
        err,
        ApiError::UnexpectedStatus {
            operation: "appointment lookup",
            status: 500
        }
    ));
}

#[tokio::test]
async fn appointment_lookup_without_content_means_no_appointment() {
    let api = stub_api().await;

    for request in ["NULL", "EMPTY", "ARR", "MISSING"] {
        let found = api
            .find_appointment_for_service_request(&id(request))
            .await
            .unwrap_or_else(|e| panic!("{request}: {e}"));
        assert_eq!(found, None, "{request}");
    }
    assert_eq!(
        api.find_appointment_for_service_request(&id("LISTED"))
            .await
            .expect("request completes"),
        Some(id("A-7"))
    );
}

#[tokio::test]
async fn fetched_request_without_id_is_malformed() {
    let api = stub_api().await;

    match api.get_service_request(&id("NOID")).await {
        Err(ApiError::Malformed { operation, detail }) => {
            assert_eq!(operation, "service request fetch");
            assert!(detail.contains("no id"), "{detail}");
        }
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[tokio::test]
async fn created_appointment_without_id_is_malformed() {
    let api = stub_api().await;
    let start = NaiveDate::from_ymd_opt(2026, 10, 20)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("valid start")
        .and_utc();
    let appointment = AppointmentData {
        id: None,
        status: AppointmentStatus::Booked,
        based_on: vec![Reference::to_resource("ServiceRequest", "SR-1", "Solicitud SR-1")],
        start,
        end: start + chrono::TimeDelta::minutes(30),
        appointment_type: None,
        description: None,
        participants: Vec::new(),
        patient_instruction: None,
    };

    let err = api
        .create_appointment(&appointment)
        .await
        .expect_err("no id in the created resource");
    assert!(matches!(
        err,
        ApiError::Malformed {
            operation: "appointment create",
            ..
        }
    ));
}

#[tokio::test]
async fn verify_request_without_id_fails_instead_of_using_typed_id() {
    let mut ctl = controller(DuplicateCheckPolicy::FailClosed).await;

    let err = ctl.verify("NOID").await.expect_err("server gave no id");

    assert!(matches!(
        err,
        BookingError::TransportFailure {
            operation: "service request fetch",
            ..
        }
    ));
    assert_eq!(ctl.phase(), Phase::Idle);
    assert!(ctl.held_request().is_none());
}

#[tokio::test]
async fn lookup_server_error_fails_closed_when_configured() {
    let mut ctl = controller(DuplicateCheckPolicy::FailClosed).await;

    let err = ctl.verify("SR-1").await.expect_err("lookup failed");

    assert!(matches!(
        err,
        BookingError::TransportFailure {
            operation: "appointment lookup",
            ..
        }
    ));
    assert_eq!(ctl.phase(), Phase::Idle);
    assert_eq!(ctl.surface().0, vec![NoticeKind::Error]);
}

#[tokio::test]
async fn lookup_server_error_fails_open_with_warning() {
    let mut ctl = controller(DuplicateCheckPolicy::FailOpen).await;

    let summary = ctl.verify("SR-1").await.expect("verification continues");

    assert_eq!(summary.request_id.as_str(), "SR-1");
    assert_eq!(ctl.phase(), Phase::Verified);
    assert_eq!(ctl.surface().0, vec![NoticeKind::Warning, NoticeKind::Success]);
}
