use std::net::SocketAddr;

use askama::Template;
use axum::extract::{Query, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info};

use crate::error::ResolveError;
use crate::resolver::ErrataResolver;
use crate::templates::Index;

const EXAMPLE_PACKAGE: &str = "firefox-52.3.0-2.el7_4.i686";

fn usage(host: &str) -> String {
    format!("Example:\ncurl http://{}/errata?pkg=<nevra>\n", host)
}

fn host(headers: &HeaderMap) -> &str {
    headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("<FQDN>")
}

fn bad_request(message: &str, headers: &HeaderMap) -> Response {
    (
        StatusCode::BAD_REQUEST,
        format!("{}\n{}", message, usage(host(headers))),
    )
        .into_response()
}

async fn index(headers: HeaderMap) -> Response {
    let index = Index::new(host(&headers), EXAMPLE_PACKAGE);

    match index.render() {
        Ok(body) => Html(body).into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal template rendering error: {}", error),
        )
            .into_response(),
    }
}

async fn test(headers: HeaderMap) -> String {
    usage(host(&headers))
}

async fn errata(
    State(resolver): State<ErrataResolver>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let mut packages = params.iter().filter(|(key, _)| key == "pkg").map(|(_, value)| value);

    let package = match (packages.next(), packages.next()) {
        (None, _) => return bad_request("Package not specified.", &headers),
        (Some(_), Some(_)) => return bad_request("Multiple packages specified.", &headers),
        (Some(package), None) => package,
    };

    info!("Endpoint hit: errata - '{}'", package);

    if package.is_empty() {
        return bad_request("Invalid pkg parameter.", &headers);
    }

    match resolver.resolve(package).await {
        Ok(records) => Json(records).into_response(),
        Err(ResolveError::Parse(error)) => bad_request(&error.to_string(), &headers),
        Err(error) => {
            error!("Failed to resolve errata for {}: {}", package, error);

            let status = match error {
                ResolveError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };

            (status, format!("{}\n", error)).into_response()
        },
    }
}

pub fn router(resolver: ErrataResolver) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/test", get(test))
        .route("/errata", get(errata))
        .with_state(resolver)
}

pub async fn serve(resolver: ErrataResolver, address: &str) -> Result<(), String> {
    let address: SocketAddr = address
        .parse()
        .map_err(|error| format!("Invalid server address '{}': {}", address, error))?;

    let server = axum::Server::try_bind(&address).map_err(|error| error.to_string())?;

    info!("Serving errata API on http://{}/errata", address);

    server
        .serve(router(resolver).into_make_service())
        .await
        .map_err(|error| error.to_string())
}
