mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;

use errata_resolver::resolver::ErrataResolver;
use errata_resolver::server::router;

use common::{scenario, FaultyCatalog};

async fn get(resolver: ErrataResolver, uri: &str) -> Response {
    router(resolver)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body(response: Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn resolver() -> ErrataResolver {
    ErrataResolver::new(Arc::new(scenario()))
}

#[tokio::test]
async fn errata_as_json() {
    let response = get(resolver(), "/errata?pkg=pkg-1.0-1.x86_64").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");

    let value: serde_json::Value = serde_json::from_str(&body(response).await).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{
            "advisory_name": "RHSA-2020:001",
            "package_id": 555,
            "evr": "2.0-1",
            "label": "rhel-x86_64-server-7",
        }])
    );
}

#[tokio::test]
async fn unknown_package_is_empty_array() {
    let response = get(resolver(), "/errata?pkg=unknown-1.0-1.x86_64").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await, "[]");
}

#[tokio::test]
async fn parameter_errors() {
    for (uri, message) in [
        ("/errata", "Package not specified."),
        ("/errata?pkg=", "Invalid pkg parameter."),
        ("/errata?pkg=a-1-1.x86_64&pkg=b-1-1.x86_64", "Multiple packages specified."),
        ("/errata?pkg=onlyname", "Failed to parse package identifier 'onlyname'"),
    ] {
        let response = get(resolver(), uri).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let text = body(response).await;
        assert!(text.starts_with(message), "{}: {}", uri, text);
        assert!(text.contains("curl http://"), "{}: {}", uri, text);
    }
}

#[tokio::test]
async fn backing_store_failure_is_500() {
    let mut catalog = FaultyCatalog::new(scenario());
    catalog.failing.push(String::from("pkg"));

    let response = get(
        ErrataResolver::new(Arc::new(catalog)),
        "/errata?pkg=pkg-1.0-1.x86_64",
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn usage_pages() {
    let response = get(resolver(), "/test").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).await.contains("/errata?pkg=<nevra>"));

    let response = get(resolver(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body(response).await;
    assert!(html.contains("errata-resolver"));
    assert!(html.contains("/errata?pkg=firefox-52.3.0-2.el7_4.i686"));
}
