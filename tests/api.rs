mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{App, test};
use serde_json::{Value, json};

use common::*;
use hr_ledger::auth::jwt::generate_access_token;
use hr_ledger::config::Config;
use hr_ledger::model::role::Role;
use hr_ledger::routes;

const SECRET: &str = "test-secret";

fn config() -> Config {
    Config {
        database_url: None,
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        store_timeout_secs: 5,
        log_dir: "logs".into(),
    }
}

fn token(employee_id: &str, role: Role) -> String {
    generate_access_token(employee_id, role, SECRET, 900).unwrap()
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

macro_rules! app {
    () => {{
        let store = Arc::new(seeded_store());
        let engine = Data::new(engine_over(&store).await);
        let config = config();
        test::init_service(
            App::new()
                .app_data(engine)
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, &config)),
        )
        .await
    }};
}

fn authed(req: test::TestRequest, employee_id: &str, role: Role) -> test::TestRequest {
    req.peer_addr(peer()).insert_header((
        "Authorization",
        format!("Bearer {}", token(employee_id, role)),
    ))
}

#[actix_web::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/requests")
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/requests")
        .peer_addr(peer())
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn openapi_document_is_public() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api-doc/openapi.json")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["info"]["title"], "HR Ledger API");
    assert!(body["paths"]["/api/requests"].is_object());
}

#[actix_web::test]
async fn worker_submits_and_supervisor_approves() {
    let app = app!();

    let req = authed(test::TestRequest::post(), ALICE, Role::Worker)
        .uri("/api/requests")
        .set_json(json!({
            "type_id": "VACATION",
            "start_date": "2024-06-10",
            "end_date": "2024-06-12",
            "reason": "Family trip"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["employee_id"], ALICE);
    assert_eq!(body["data"]["created_by_admin"], false);
    assert_eq!(body["balance"]["result"], "unchanged");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let req = authed(test::TestRequest::put(), BOB, Role::Worker)
        .uri(&format!("/api/requests/{id}/approve"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = authed(test::TestRequest::put(), SUPERVISOR, Role::Supervisor)
        .uri(&format!("/api/requests/{id}/approve"))
        .set_json(json!({ "comment": "Enjoy" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "APPROVED");
    assert_eq!(body["data"]["admin_comment"], "Enjoy");
    assert_eq!(body["balance"]["result"], "applied");
    assert_eq!(body["balance"]["days_available"], "17");
    assert!(body.get("warning").is_none());

    let req = authed(test::TestRequest::get(), ALICE, Role::Worker)
        .uri(&format!("/api/employee/{ALICE}/ledger"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["delta_days"], "-3");
}

#[actix_web::test]
async fn workers_cannot_file_for_others_or_pick_a_status() {
    let app = app!();

    let req = authed(test::TestRequest::post(), ALICE, Role::Worker)
        .uri("/api/requests")
        .set_json(json!({
            "type_id": "SICK",
            "start_date": "2024-06-10",
            "employee_id": BOB
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = authed(test::TestRequest::post(), ALICE, Role::Worker)
        .uri("/api/requests")
        .set_json(json!({
            "type_id": "SICK",
            "start_date": "2024-06-10",
            "status": "APPROVED"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_files_adjustments_on_behalf_of_employees() {
    let app = app!();

    let req = authed(test::TestRequest::post(), ADMIN, Role::Admin)
        .uri("/api/requests")
        .set_json(json!({
            "type_id": "ADJUSTMENT_DAYS",
            "start_date": "2024-06-01",
            "hours": "-2",
            "employee_id": BOB
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["created_by_admin"], true);
    assert_eq!(body["balance"]["days_available"], "18");

    let req = authed(test::TestRequest::get(), BOB, Role::Worker)
        .uri(&format!("/api/employee/{BOB}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["days_available"], "18");
}

#[actix_web::test]
async fn only_admins_touch_balance_adjustments() {
    let app = app!();

    for (employee, role) in [(ALICE, Role::Worker), (SUPERVISOR, Role::Supervisor)] {
        let req = authed(test::TestRequest::post(), employee, role)
            .uri("/api/requests")
            .set_json(json!({
                "type_id": "ADJUSTMENT_DAYS",
                "start_date": "2024-06-01",
                "hours": "100"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    // an ordinary request cannot be turned into an adjustment either
    let req = authed(test::TestRequest::post(), ALICE, Role::Worker)
        .uri("/api/requests")
        .set_json(json!({ "type_id": "SICK", "start_date": "2024-06-10" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let sick_id = body["data"]["id"].as_str().unwrap().to_string();
    let req = authed(test::TestRequest::put(), ALICE, Role::Worker)
        .uri(&format!("/api/requests/{sick_id}"))
        .set_json(json!({
            "type_id": "ADJUSTMENT_OVERTIME",
            "start_date": "2024-06-10",
            "hours": "40"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // nor can the owner edit or withdraw an admin-issued deduction
    let req = authed(test::TestRequest::post(), ADMIN, Role::Admin)
        .uri("/api/requests")
        .set_json(json!({
            "type_id": "ADJUSTMENT_DAYS",
            "start_date": "2024-06-01",
            "hours": "-5",
            "employee_id": ALICE
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let adj_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = authed(test::TestRequest::put(), ALICE, Role::Worker)
        .uri(&format!("/api/requests/{adj_id}"))
        .set_json(json!({
            "type_id": "ADJUSTMENT_DAYS",
            "start_date": "2024-06-01",
            "hours": "5"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = authed(test::TestRequest::delete(), ALICE, Role::Worker)
        .uri(&format!("/api/requests/{adj_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = authed(test::TestRequest::get(), ALICE, Role::Worker)
        .uri(&format!("/api/employee/{ALICE}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["days_available"], "15");
    assert_eq!(body["overtime_hours"], "0");
}

#[actix_web::test]
async fn workers_only_see_their_own_requests() {
    let app = app!();

    for (employee, role) in [(ALICE, Role::Worker), (BOB, Role::Worker)] {
        let req = authed(test::TestRequest::post(), employee, role)
            .uri("/api/requests")
            .set_json(json!({ "type_id": "SICK", "start_date": "2024-06-10" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = authed(test::TestRequest::get(), BOB, Role::Worker)
        .uri(&format!("/api/requests?employee_id={ALICE}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["employee_id"], BOB);

    let req = authed(test::TestRequest::get(), SUPERVISOR, Role::Supervisor)
        .uri("/api/requests?status=PENDING&per_page=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = authed(test::TestRequest::get(), ALICE, Role::Worker)
        .uri(&format!("/api/employee/{BOB}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn ledger_errors_map_to_status_codes() {
    let app = app!();

    let req = authed(test::TestRequest::get(), ADMIN, Role::Admin)
        .uri("/api/requests/missing")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = authed(test::TestRequest::get(), SUPERVISOR, Role::Supervisor)
        .uri("/api/conflicts?year=2024&month=13")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "invalid month 2024-13");

    let req = authed(test::TestRequest::get(), ALICE, Role::Worker)
        .uri("/api/conflicts?year=2024&month=7")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn impact_preview_and_overtime_sources() {
    let app = app!();

    let req = authed(test::TestRequest::post(), ALICE, Role::Worker)
        .uri("/api/impact")
        .set_json(json!({
            "type_id": "VACATION",
            "start_date": "2024-06-10",
            "end_date": "2024-06-12"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["delta_days"], "-3");
    assert_eq!(body["delta_hours"], "0");

    let req = authed(test::TestRequest::get(), ALICE, Role::Worker)
        .uri("/api/overtime/sources")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));

    let req = authed(test::TestRequest::get(), ALICE, Role::Worker)
        .uri(&format!("/api/overtime/sources?employee_id={BOB}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn only_admins_configure_leave_types() {
    let app = app!();

    let payload = json!({ "label": "Parental", "subtracts_days": false });
    let req = authed(test::TestRequest::put(), SUPERVISOR, Role::Supervisor)
        .uri("/api/leave-types/PARENTAL")
        .set_json(payload.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = authed(test::TestRequest::put(), ADMIN, Role::Admin)
        .uri("/api/leave-types/PARENTAL")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = authed(test::TestRequest::get(), ALICE, Role::Worker)
        .uri("/api/leave-types")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["PARENTAL", "SICK", "VACATION", "XMAS"]);

    let req = authed(test::TestRequest::delete(), ADMIN, Role::Admin)
        .uri("/api/leave-types/NOPE")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
