//! Integration tests for the API server.

use std::sync::Arc;
use std::sync::OnceLock;

use api::config::Config;
use api::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with_state() -> (axum::Router, Arc<AppState<InMemoryOrderStore>>) {
    let store = Arc::new(InMemoryOrderStore::new());
    let (state, _processor) =
        api::create_default_state(store, &Config::default(), api::seed::house_menu());
    let app = api::create_app(Arc::clone(&state), get_metrics_handle());
    (app, state)
}

fn setup() -> axum::Router {
    setup_with_state().0
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn burger_order(service_type: &str, billing_type: &str) -> Value {
    json!({
        "service_type": service_type,
        "source": "PDV",
        "billing_type": billing_type,
        "items": [{ "product_name": "X-Burger", "quantity": 2, "price": 25.00 }]
    })
}

async fn place(app: &axum::Router, service_type: &str, billing_type: &str) -> Value {
    let (status, json) = send(app, "POST", "/orders", Some(burger_order(service_type, billing_type))).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json
}

async fn move_to(app: &axum::Router, id: &str, body: Value) -> (StatusCode, Value) {
    send(app, "PATCH", &format!("/orders/{id}/status"), Some(body)).await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "up");
}

#[tokio::test]
async fn test_create_and_get_order() {
    let app = setup();

    let created = place(&app, "BALCAO", "DINHEIRO").await;
    assert_eq!(created["status"], "PENDENTE");
    let code = created["code"].as_str().unwrap();
    assert_eq!(code.len(), 4);
    assert!(code.starts_with('A'));
    assert!(created["charge"].is_null());

    let id = created["id"].as_str().unwrap();
    let (status, order) = send(&app, "GET", &format!("/orders/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["code"], code);
    assert_eq!(order["amount_due"], 50.0);
    assert_eq!(order["items"][0]["price"], 25.0);
    assert_eq!(order["paid"], false);
}

#[tokio::test]
async fn test_pix_order_carries_charge() {
    let app = setup();

    let created = place(&app, "DELIVERY", "PIX").await;

    assert!(created["billing_error"].is_null());
    assert!(
        created["charge"]["qr_payload"]
            .as_str()
            .unwrap()
            .contains("br.gov.bcb.pix")
    );

    let id = created["id"].as_str().unwrap();
    let (status, payment) = send(&app, "GET", &format!("/orders/{id}/payment"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["amount_due"], 50.0);
    assert_eq!(payment["billing_type"], "PIX");
    assert_eq!(payment["charge_id"], created["charge"]["charge_id"]);
}

#[tokio::test]
async fn test_cash_order_is_not_chargeable() {
    let app = setup();
    let created = place(&app, "MESA", "DINHEIRO").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app, "POST", &format!("/orders/{id}/charge"), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
}

#[tokio::test]
async fn test_order_without_items_is_rejected() {
    let app = setup();

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({ "service_type": "BALCAO", "items": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let app = setup();

    for item in [
        json!({ "product_name": "X-Burger", "quantity": 2, "price": 5e16 }),
        json!({ "product_name": "X-Burger", "quantity": 2, "price": 60_000_000.0 }),
    ] {
        let (status, json) = send(
            &app,
            "POST",
            "/orders",
            Some(json!({ "service_type": "BALCAO", "items": [item] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "validation");
    }

    let (status, _) = send(&app, "GET", "/queue", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_charge_retry_keeps_existing_charge() {
    let app = setup();
    let created = place(&app, "DELIVERY", "PIX").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app, "POST", &format!("/orders/{id}/charge"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["charge"]["charge_id"], created["charge"]["charge_id"]);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let app = setup();
    let fake_id = uuid::Uuid::new_v4();

    let (status, json) = send(&app, "GET", &format!("/orders/{fake_id}"), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let app = setup();

    let (status, _) = send(&app, "GET", "/orders/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delivery_lifecycle_with_webhook_payment() {
    let app = setup();
    let created = place(&app, "DELIVERY", "PIX").await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = move_to(&app, id, json!({ "to": "EM_PREPARO" })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = move_to(&app, id, json!({ "to": "PRONTO" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = move_to(&app, id, json!({ "to": "SAIU_ENTREGA" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{json}");

    let (status, order) = move_to(
        &app,
        id,
        json!({ "to": "SAIU_ENTREGA", "courier": { "name": "Joao", "phone": "11999990000" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["motoboy_name"], "Joao");

    let delivered = json!({ "to": "ENTREGUE", "actor": { "id": "u1", "name": "Maria" } });
    let (status, json) = move_to(&app, id, delivered.clone()).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["amount_due"], 50.0);
    assert_eq!(json["billing_type"], "PIX");

    let (status, order) = send(
        &app,
        "POST",
        "/webhooks/billing",
        Some(json!({ "order_id": id, "status": "RECEIVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "SAIU_ENTREGA");
    assert_eq!(order["paid"], true);

    let (status, order) = move_to(&app, id, delivered).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "ENTREGUE");
    assert_eq!(order["delivered_by_name"], "Maria");
}

#[tokio::test]
async fn test_payment_override_on_delivery() {
    let app = setup();
    let created = place(&app, "BALCAO", "MAQUININHA").await;
    let id = created["id"].as_str().unwrap();

    move_to(&app, id, json!({ "to": "EM_PREPARO" })).await;
    move_to(&app, id, json!({ "to": "PRONTO" })).await;

    let (status, order) = move_to(
        &app,
        id,
        json!({
            "to": "ENTREGUE",
            "actor": { "id": "u7", "name": "Caixa" },
            "confirm_payment": true
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paid"], true);
    assert_eq!(order["payment_confirmed_by_id"], "u7");
    assert!(order["payment_confirmed_at"].is_string());
}

#[tokio::test]
async fn test_invalid_transition_reports_current_status() {
    let app = setup();
    let created = place(&app, "BALCAO", "DINHEIRO").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = move_to(&app, id, json!({ "to": "PRONTO" })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "invalid_transition");
    assert_eq!(json["current_status"], "PENDENTE");
}

#[tokio::test]
async fn test_stale_terminal_gets_conflict() {
    let app = setup();
    let created = place(&app, "BALCAO", "DINHEIRO").await;
    let id = created["id"].as_str().unwrap();

    move_to(&app, id, json!({ "to": "EM_PREPARO", "expected_from": "PENDENTE" })).await;
    let (status, json) = move_to(&app, id, json!({ "to": "EM_PREPARO", "expected_from": "PENDENTE" })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "conflicting_transition");
    assert_eq!(json["current_status"], "EM_PREPARO");
}

#[tokio::test]
async fn test_cancel_with_reason() {
    let app = setup();
    let created = place(&app, "MESA", "DINHEIRO").await;
    let id = created["id"].as_str().unwrap();

    let (status, order) =
        move_to(&app, id, json!({ "to": "CANCELADO", "reason": "cliente desistiu" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["cancel_reason"], "cliente desistiu");
}

#[tokio::test]
async fn test_list_orders_with_filters() {
    let app = setup();
    let first = place(&app, "BALCAO", "DINHEIRO").await;
    place(&app, "DELIVERY", "PIX").await;
    let third = place(&app, "BALCAO", "DINHEIRO").await;
    move_to(&app, third["id"].as_str().unwrap(), json!({ "to": "EM_PREPARO" })).await;

    let (status, all) = send(&app, "GET", "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert_eq!(all[0]["id"], first["id"]);

    let (_, balcao) = send(&app, "GET", "/orders?service_type=BALCAO", None).await;
    assert_eq!(balcao.as_array().unwrap().len(), 2);

    let (_, pendente) = send(&app, "GET", "/orders?status=PENDENTE&limit=1", None).await;
    assert_eq!(pendente.as_array().unwrap().len(), 1);
    assert_eq!(pendente[0]["id"], first["id"]);
}

#[tokio::test]
async fn test_list_accepts_huge_limit() {
    let app = setup();
    place(&app, "BALCAO", "DINHEIRO").await;

    let (status, json) = send(&app, "GET", "/orders?limit=18446744073709551615", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_queue_and_payment_due() {
    let app = setup();
    let waiting = place(&app, "BALCAO", "DINHEIRO").await;
    let ready = place(&app, "DELIVERY", "PIX").await;
    let ready_id = ready["id"].as_str().unwrap();
    move_to(&app, ready_id, json!({ "to": "EM_PREPARO" })).await;
    move_to(&app, ready_id, json!({ "to": "PRONTO" })).await;

    let (status, queue) = send(&app, "GET", "/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue["PENDENTE"].as_array().unwrap().len(), 1);
    assert_eq!(queue["PENDENTE"][0]["order_id"], waiting["id"]);
    assert!(queue["PENDENTE"][0]["payment_badge"].is_null());
    assert_eq!(queue["PRONTO"][0]["order_id"], ready["id"]);
    assert_eq!(queue["PRONTO"][0]["payment_badge"], "UNPAID");
    assert_eq!(queue["EM_PREPARO"].as_array().unwrap().len(), 0);

    let (status, due) = send(&app, "GET", "/queue/payment-due", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(due["entries"].as_array().unwrap().len(), 1);
    assert_eq!(due["total_due"], 50.0);
    assert!(due["entries"][0]["qr_payload"].is_string());

    send(
        &app,
        "POST",
        "/webhooks/billing",
        Some(json!({ "order_id": ready_id, "status": "PAYMENT_RECEIVED" })),
    )
    .await;
    let (_, due) = send(&app, "GET", "/queue/payment-due", None).await;
    assert_eq!(due["entries"].as_array().unwrap().len(), 0);
    let (_, queue) = send(&app, "GET", "/queue", None).await;
    assert_eq!(queue["PRONTO"][0]["payment_badge"], "PAID");
}

#[tokio::test]
async fn test_webhook_for_unknown_order() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/webhooks/billing",
        Some(json!({ "order_id": uuid::Uuid::new_v4(), "status": "RECEIVED" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tracking_by_code() {
    let app = setup();
    let created = place(&app, "DELIVERY", "PIX").await;
    let code = created["code"].as_str().unwrap().to_lowercase();

    let (status, view) = send(&app, "GET", &format!("/orders/track/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["order_id"], created["id"]);
    assert_eq!(view["active_step"], 0);
    assert_eq!(view["poll_after_secs"], 15);

    let (status, _) = send(&app, "GET", "/orders/track/Z999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/orders/track/1234", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_menu_and_cart_quote() {
    let (app, state) = setup_with_state();

    let (status, menu) = send(&app, "GET", "/menu", None).await;
    assert_eq!(status, StatusCode::OK);
    let salada = menu["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == "x-salada")
        .unwrap();
    assert_eq!(salada["effective_price"], 24.0);

    let (status, quote) = send(
        &app,
        "POST",
        "/cart/quote",
        Some(json!({
            "lines": [{
                "product_id": "x-burger",
                "quantity": 2,
                "selections": [
                    { "group_id": "ponto", "option_id": "mal" },
                    { "group_id": "adicionais", "option_id": "bacon" }
                ]
            }],
            "discount": { "type": "percent", "value": 10.0 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["subtotal"], 58.0);
    assert_eq!(quote["discount"], 5.8);
    assert_eq!(quote["total"], 52.2);
    assert_eq!(quote["items"][0]["total_price"], 58.0);

    // Cached: a second read does not reload the source.
    send(&app, "GET", "/menu", None).await;
    assert_eq!(state.catalog.source().load_count(), 1);

    let (status, _) = send(&app, "POST", "/menu/invalidate", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    send(&app, "GET", "/menu", None).await;
    assert_eq!(state.catalog.source().load_count(), 2);
}

#[tokio::test]
async fn test_quote_rejects_missing_choice() {
    let app = setup();

    let (status, json) = send(
        &app,
        "POST",
        "/cart/quote",
        Some(json!({ "lines": [{ "product_id": "x-burger", "quantity": 1 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Ponto da carne"));
}

#[tokio::test]
async fn test_admin_replace_and_delete_are_audited() {
    let app = setup();
    let created = place(&app, "BALCAO", "DINHEIRO").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/admin/orders/{id}");

    let replacement = json!({
        "actor": { "id": "adm1", "name": "Gerente" },
        "reason": "pedido lançado errado",
        "order": {
            "status": "PRONTO",
            "service_type": "MESA",
            "items": [{ "product_name": "X-Salada", "quantity": 1, "price": 28.00 }]
        }
    });
    let (status, order) = send(&app, "PUT", &uri, Some(replacement)).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["status"], "PRONTO");
    assert_eq!(order["code"], created["code"]);
    assert_eq!(order["amount_due"], 28.0);

    let (status, _) = send(
        &app,
        "DELETE",
        &uri,
        Some(json!({ "actor": { "id": "adm1", "name": "Gerente" } })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, audit) = send(&app, "GET", &format!("{uri}/audit"), None).await;
    assert_eq!(status, StatusCode::OK);
    let audit = audit.as_array().unwrap();
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[0]["action"], "replace");
    assert_eq!(audit[0]["before"]["status"], "PENDENTE");
    assert_eq!(audit[1]["action"], "delete");
    assert!(audit[1]["after"].is_null());
}

#[tokio::test]
async fn test_admin_override_requires_actor() {
    let app = setup();
    let created = place(&app, "BALCAO", "DINHEIRO").await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/admin/orders/{id}"),
        Some(json!({
            "actor": { "id": "", "name": "" },
            "order": {
                "status": "PRONTO",
                "service_type": "BALCAO",
                "items": [{ "product_name": "X-Burger", "quantity": 1, "price": 25.00 }]
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    place(&app, "BALCAO", "DINHEIRO").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_created_total"));
}
