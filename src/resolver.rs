use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::catalog::Catalog;
use crate::data::{CandidatePackage, ChannelFamilyId, ChannelId, ErratumRecord, PackageIdentifier};
use crate::error::{CatalogError, ResolveError};
use crate::parse::parse_nevra;
use crate::version::{CompatibleOrdering, EvrOrdering};

/// Channels currently carrying exactly this package. No channel is a valid result.
pub async fn resolve_channels(
    catalog: &dyn Catalog,
    package: &PackageIdentifier,
) -> Result<BTreeSet<ChannelId>, CatalogError> {
    Ok(catalog.channels_with_package(package).await?.into_iter().collect())
}

pub async fn resolve_families(
    catalog: &dyn Catalog,
    channels: &BTreeSet<ChannelId>,
) -> Result<BTreeSet<ChannelFamilyId>, CatalogError> {
    if channels.is_empty() {
        return Ok(BTreeSet::new());
    }

    let channels: Vec<ChannelId> = channels.iter().copied().collect();
    Ok(catalog.families_of_channels(&channels).await?.into_iter().collect())
}

/// Builds of the same name and arch, published anywhere in the given channel
/// families, that are newer than `package` according to `ordering`.
///
/// Each package id is returned once, no matter how many channels carry it.
pub async fn resolve_candidates(
    catalog: &dyn Catalog,
    ordering: &dyn EvrOrdering,
    package: &PackageIdentifier,
    families: &BTreeSet<ChannelFamilyId>,
) -> Result<Vec<CandidatePackage>, CatalogError> {
    if families.is_empty() {
        return Ok(Vec::new());
    }

    let families: Vec<ChannelFamilyId> = families.iter().copied().collect();
    let base = package.evr();

    let candidates: BTreeMap<i64, CandidatePackage> = catalog
        .packages_in_families(&package.name, &package.arch, &families)
        .await?
        .into_iter()
        .filter(|candidate| ordering.is_newer(&candidate.evr, &base))
        .map(|candidate| (candidate.package_id, candidate))
        .collect();

    Ok(candidates.into_values().collect())
}

/// Security errata for the candidates. Records for the same advisory and package
/// are kept once per channel.
pub async fn aggregate_errata(
    catalog: &dyn Catalog,
    candidates: &[CandidatePackage],
) -> Result<Vec<ErratumRecord>, CatalogError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = candidates.iter().map(|candidate| candidate.package_id).collect();

    let mut records = catalog.security_errata(&ids).await?;
    records.sort();

    Ok(records)
}

#[derive(Clone, Copy, Debug)]
struct Deadline {
    at: Instant,
    budget: Duration,
}

/// Runs the errata pipeline (parse, channels, families, candidates, errata) for
/// one package at a time. Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct ErrataResolver {
    catalog: Arc<dyn Catalog>,
    ordering: Arc<dyn EvrOrdering>,
    timeout: Option<Duration>,
}

impl ErrataResolver {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        ErrataResolver {
            catalog,
            ordering: Arc::new(CompatibleOrdering),
            timeout: None,
        }
    }

    pub fn with_ordering(mut self, ordering: Arc<dyn EvrOrdering>) -> Self {
        self.ordering = ordering;
        self
    }

    /// Upper bound for one complete pipeline run, shared by all of its stages.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve(&self, raw: &str) -> Result<Vec<ErratumRecord>, ResolveError> {
        let package = parse_nevra(raw)?;
        self.resolve_package(&package).await
    }

    pub async fn resolve_package(&self, package: &PackageIdentifier) -> Result<Vec<ErratumRecord>, ResolveError> {
        let deadline = self.timeout.map(|budget| Deadline {
            at: Instant::now() + budget,
            budget,
        });
        let catalog = &*self.catalog;

        let channels = run_stage(deadline, resolve_channels(catalog, package)).await?;
        debug!("{}: found in {} channel(s)", package, channels.len());

        let families = run_stage(deadline, resolve_families(catalog, &channels)).await?;
        debug!("{}: {} channel family(ies)", package, families.len());

        let candidates = run_stage(
            deadline,
            resolve_candidates(catalog, &*self.ordering, package, &families),
        )
        .await?;
        debug!("{}: {} newer package(s)", package, candidates.len());

        let errata = run_stage(deadline, aggregate_errata(catalog, &candidates)).await?;
        debug!("{}: {} security erratum record(s)", package, errata.len());

        Ok(errata)
    }
}

async fn run_stage<T>(
    deadline: Option<Deadline>,
    stage: impl Future<Output = Result<T, CatalogError>>,
) -> Result<T, ResolveError> {
    match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline.at, stage).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ResolveError::Timeout(deadline.budget)),
        },
        None => Ok(stage.await?),
    }
}
