use std::future::Future;
use std::sync::Arc;

use log::{error, info};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::data::ErratumRecord;
use crate::error::{CatalogError, ResolveError};
use crate::parse::parse_nevra;
use crate::resolver::ErrataResolver;

#[derive(Debug)]
pub struct BatchOutcome {
    pub identifier: String,
    pub result: Result<Vec<ErratumRecord>, ResolveError>,
}

#[derive(Serialize)]
struct BatchLine<'a> {
    package: &'a str,
    #[serde(flatten)]
    record: &'a ErratumRecord,
}

impl BatchOutcome {
    /// One JSON object per erratum record, tagged with the queried package.
    pub fn to_json_lines(&self) -> Result<Vec<String>, String> {
        let records = match &self.result {
            Ok(records) => records,
            Err(error) => return Err(format!("{}: {}", &self.identifier, error)),
        };

        records
            .iter()
            .map(|record| {
                serde_json::to_string(&BatchLine {
                    package: &self.identifier,
                    record,
                })
                .map_err(|error| error.to_string())
            })
            .collect()
    }
}

/// Resolve every identifier with at most `workers` pipelines in flight.
///
/// Failures stay attached to their identifier and do not stop the batch.
/// Outcomes are returned in input order.
pub async fn run_batch(resolver: &ErrataResolver, identifiers: Vec<String>, workers: usize) -> Vec<BatchOutcome> {
    let permits = Arc::new(Semaphore::new(workers.max(1)));

    info!(
        "Resolving errata for {} package(s) with {} worker(s).",
        identifiers.len(),
        workers.max(1)
    );

    // spawn tasks eagerly, the semaphore bounds how many of them query at once
    let handles: Vec<_> = identifiers
        .into_iter()
        .map(|identifier| {
            let resolver = resolver.clone();
            let permits = permits.clone();

            let handle = tokio::spawn({
                let identifier = identifier.clone();
                async move {
                    let _permit = permits.acquire_owned().await.ok();
                    resolver.resolve(&identifier).await
                }
            });

            (identifier, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());

    for (identifier, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(ResolveError::BackingStore(CatalogError::Unavailable(format!(
                "worker task failed: {}",
                join_error
            )))),
        };

        if let Err(error) = &result {
            error!("Failed to resolve errata for {}: {}", &identifier, error);
        }

        outcomes.push(BatchOutcome { identifier, result });
    }

    outcomes
}

/// Resolve a single identifier, obtaining the resolver from `connect` only once
/// the identifier has parsed.
pub async fn run_single<F, Fut>(identifier: &str, connect: F) -> Result<Vec<ErratumRecord>, String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ErrataResolver, String>>,
{
    let package = parse_nevra(identifier).map_err(|error| error.to_string())?;

    let resolver = connect().await?;

    resolver
        .resolve_package(&package)
        .await
        .map_err(|error| error.to_string())
}
