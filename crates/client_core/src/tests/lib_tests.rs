use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::Query,
    http::StatusCode,
    routing::get,
    Form, Json, Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use shared::domain::CarTypeId;
use tokio::{net::TcpListener, sync::Mutex};

type Captured<T> = Arc<Mutex<Vec<T>>>;

async fn spawn_server(app: Router) -> std::io::Result<Url> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}/"))
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))
}

fn summary_json(policy_number: &str) -> Value {
    json!({
        "policy_number": policy_number,
        "insured": "Budi",
        "effective_date": "2024-01-01",
        "expiration_date": "2025-01-01",
        "car_name": "Toyota - Avanza",
        "car_year": "2021",
        "car_price": "200000000",
        "premium_price": 7000000
    })
}

fn create_form() -> CreatePolicyForm {
    CreatePolicyForm {
        policy_number: PolicyNumber::new("POL-1"),
        insured: "Ani".to_string(),
        effective_date: "2024-03-01".to_string(),
        expiration_date: "2025-03-01".to_string(),
        car_brand: BrandId::new("b1"),
        car_type: CarTypeId::new("t1"),
        car_year: 2022,
        car_price: Decimal::new(100_000_000, 0),
        premium_rate: "r1".to_string(),
        premium_price: Decimal::new(3_500_000, 0),
        created_by: ActorId::new("actor-9"),
    }
}

#[tokio::test]
async fn list_policies_reads_service_envelope() {
    let app = Router::new().route(
        "/policies",
        get(|| async {
            Json(json!({
                "StatusCode": 200,
                "Status": "OK",
                "Data": [summary_json("POL-1"), summary_json("POL-2")]
            }))
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");
    let client = HttpPolicyClient::new(&url);

    let policies = client.list_policies().await.expect("policies");
    assert_eq!(policies.len(), 2);
    assert_eq!(policies[0].policy_number, PolicyNumber::new("POL-1"));
    assert_eq!(policies[0].car_year, 2021);
    assert_eq!(policies[1].premium_price, Decimal::new(7_000_000, 0));
}

#[tokio::test]
async fn list_policies_surfaces_envelope_failure() {
    let app = Router::new().route(
        "/policies",
        get(|| async { Json(json!({ "StatusCode": 500, "Message": "database offline" })) }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    let err = HttpPolicyClient::new(&url)
        .list_policies()
        .await
        .expect_err("must fail");
    assert!(err.is_rejection());
    assert_eq!(err.to_string(), "database offline");
}

#[tokio::test]
async fn fetch_policy_sends_policy_number_query() {
    let queries: Captured<HashMap<String, String>> = Arc::default();
    let seen = queries.clone();
    let app = Router::new().route(
        "/policies",
        get(move |Query(query): Query<HashMap<String, String>>| {
            let seen = seen.clone();
            async move {
                seen.lock().await.push(query);
                let mut data = summary_json("POL-7");
                data["car_brand_uid"] = json!("b1");
                data["car_type_uid"] = json!("t1");
                data["premium_rate_uid"] = json!("r1");
                data["premium_rate"] = json!("3.5");
                Json(json!({ "StatusCode": 200, "Data": data }))
            }
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    let detail = HttpPolicyClient::new(&url)
        .fetch_policy(&PolicyNumber::new("POL-7"))
        .await
        .expect("detail");
    assert_eq!(detail.car_brand_uid, BrandId::new("b1"));
    assert_eq!(detail.premium_rate, Decimal::new(35, 1));

    let queries = queries.lock().await;
    assert_eq!(
        queries[0].get("policy_number").map(String::as_str),
        Some("POL-7")
    );
}

#[tokio::test]
async fn create_policy_posts_form_with_user_values() {
    let forms: Captured<HashMap<String, String>> = Arc::default();
    let seen = forms.clone();
    let app = Router::new().route(
        "/policies",
        axum::routing::post(move |Form(form): Form<HashMap<String, String>>| {
            let seen = seen.clone();
            async move {
                seen.lock().await.push(form);
                (
                    StatusCode::CREATED,
                    Json(json!({ "StatusCode": 201, "Message": "Policy created" })),
                )
            }
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    HttpPolicyClient::new(&url)
        .create_policy(&create_form())
        .await
        .expect("created");

    let forms = forms.lock().await;
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form.get("insured").map(String::as_str), Some("Ani"));
    assert_eq!(form.get("created_by").map(String::as_str), Some("actor-9"));
    assert_eq!(form.get("premium_rate").map(String::as_str), Some("r1"));
    assert_eq!(form.get("car_price").map(String::as_str), Some("100000000"));
    assert_eq!(form.get("car_year").map(String::as_str), Some("2022"));
}

#[tokio::test]
async fn create_policy_requires_created_status() {
    let app = Router::new().route(
        "/policies",
        axum::routing::post(|| async {
            Json(json!({ "StatusCode": 400, "Message": "Duplicate policy number" }))
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    let err = HttpPolicyClient::new(&url)
        .create_policy(&create_form())
        .await
        .expect_err("rejected");
    assert!(matches!(
        err,
        ServiceError::Rejected {
            status_code: 400,
            ..
        }
    ));
    assert_eq!(err.to_string(), "Duplicate policy number");
}

#[tokio::test]
async fn update_policy_puts_json_record() {
    let bodies: Captured<Value> = Arc::default();
    let seen = bodies.clone();
    let app = Router::new().route(
        "/policies",
        axum::routing::put(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            async move {
                seen.lock().await.push(body);
                Json(json!({ "StatusCode": 200 }))
            }
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");
    let form = create_form();
    let request = UpdatePolicyRequest {
        policy_number: form.policy_number,
        insured: form.insured,
        effective_date: form.effective_date,
        expiration_date: form.expiration_date,
        car_brand: form.car_brand,
        car_type: form.car_type,
        car_year: form.car_year,
        car_price: form.car_price,
        premium_rate: "4.25".to_string(),
        premium_price: Decimal::new(4_250_000, 0),
        updated_by: ActorId::new("actor-9"),
    };

    HttpPolicyClient::new(&url)
        .update_policy(&request)
        .await
        .expect("updated");

    let bodies = bodies.lock().await;
    assert_eq!(bodies[0]["updated_by"], json!("actor-9"));
    assert_eq!(bodies[0]["premium_rate"], json!("4.25"));
    assert_eq!(bodies[0]["policy_number"], json!("POL-1"));
}

#[tokio::test]
async fn delete_policy_sends_number_in_json_body() {
    let bodies: Captured<Value> = Arc::default();
    let seen = bodies.clone();
    let app = Router::new().route(
        "/policies",
        axum::routing::delete(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            async move {
                seen.lock().await.push(body);
                Json(json!({ "StatusCode": 200, "Message": "deleted" }))
            }
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    HttpPolicyClient::new(&url)
        .delete_policy(&PolicyNumber::new("POL-123"))
        .await
        .expect("deleted");
    assert_eq!(
        bodies.lock().await[0],
        json!({ "policy_number": "POL-123" })
    );
}

#[tokio::test]
async fn new_policy_number_reads_allocated_value() {
    let app = Router::new().route(
        "/policies/new-number",
        get(|| async {
            Json(json!({ "StatusCode": 200, "Data": { "policy_number": "POL-2024-0042" } }))
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    let allocated = HttpPolicyClient::new(&url)
        .new_policy_number()
        .await
        .expect("number");
    assert_eq!(allocated, PolicyNumber::new("POL-2024-0042"));
}

#[tokio::test]
async fn car_types_single_object_becomes_one_item_list() {
    let app = Router::new().route(
        "/car-types",
        get(|Query(query): Query<HashMap<String, String>>| async move {
            assert_eq!(query.get("brand").map(String::as_str), Some("b1"));
            Json(json!({ "StatusCode": 200, "Data": { "uid": "t1", "name": "Avanza" } }))
        }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    let car_types = HttpPolicyClient::new(&url)
        .list_car_types(&BrandId::new("b1"))
        .await
        .expect("types");
    assert_eq!(car_types.len(), 1);
    assert_eq!(car_types[0].uid, CarTypeId::new("t1"));
    assert_eq!(car_types[0].brand_uid, BrandId::new("b1"));
}

#[tokio::test]
async fn reference_list_without_data_is_empty() {
    let app = Router::new()
        .route("/car-brands", get(|| async { Json(json!({ "StatusCode": 204 })) }))
        .route(
            "/rates",
            get(|| async {
                Json(json!({ "StatusCode": 200, "Data": [{ "uid": "r1", "rate": 3.5 }] }))
            }),
        );
    let url = spawn_server(app).await.expect("spawn server");
    let client = HttpPolicyClient::new(&url);

    assert!(client.list_car_brands().await.expect("brands").is_empty());
    let rates = client.list_rates().await.expect("rates");
    assert_eq!(rates[0].rate, Decimal::new(35, 1));
}

#[tokio::test]
async fn non_json_error_page_is_a_rejection() {
    let app = Router::new().route(
        "/policies",
        get(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
    );
    let url = spawn_server(app).await.expect("spawn server");

    let err = HttpPolicyClient::new(&url)
        .list_policies()
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ServiceError::Rejected {
            status_code: 502,
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let url = Url::parse(&format!("http://{addr}")).expect("url");

    let err = HttpPolicyClient::new(&url)
        .list_policies()
        .await
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::Transport);
}
