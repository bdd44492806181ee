#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use errata_resolver::catalog::{Catalog, SECURITY_ADVISORY};
use errata_resolver::data::{CandidatePackage, ChannelFamilyId, ChannelId, ErratumRecord, PackageIdentifier};
use errata_resolver::error::CatalogError;
use errata_resolver::memory::MemoryCatalog;
use errata_resolver::parse::parse_nevra;

/// Catalog with two channels of one family, one update and one security advisory:
///
/// - `pkg-1.0-1.x86_64` (id 100) in channels 10 and 20
/// - `pkg-2.0-1.x86_64` (id 555) in channel 10, fixed by RHSA-2020:001
/// - `pkg-1.5-1.x86_64` (id 300) in channel 20, only a bug fix advisory
pub fn scenario() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();

    catalog
        .add_channel(10, "rhel-x86_64-server-7")
        .add_channel(20, "rhel-x86_64-server-optional-7")
        .add_channel(30, "rhel-x86_64-server-8")
        .add_family_member(1, 10)
        .add_family_member(1, 20)
        .add_family_member(2, 30)
        .add_package(100, nevra("pkg-1.0-1.x86_64"))
        .add_package(555, nevra("pkg-2.0-1.x86_64"))
        .add_package(300, nevra("pkg-1.5-1.x86_64"))
        .add_package(800, nevra("pkg-3.0-1.x86_64"))
        .publish(10, 100)
        .publish(20, 100)
        .publish(10, 555)
        .publish(20, 300)
        .publish(30, 800)
        .add_erratum("RHSA-2020:001", SECURITY_ADVISORY, &[555])
        .add_erratum("RHBA-2020:002", "Bug Fix Advisory", &[300])
        .add_erratum("RHSA-2020:003", SECURITY_ADVISORY, &[800]);

    catalog
}

pub fn nevra(string: &str) -> PackageIdentifier {
    parse_nevra(string).unwrap()
}

/// Wraps a catalog, failing or stalling lookups for selected package names.
pub struct FaultyCatalog {
    pub inner: MemoryCatalog,
    pub failing: Vec<String>,
    pub stall: Option<Duration>,
    pub exact_lookups: AtomicUsize,
}

impl FaultyCatalog {
    pub fn new(inner: MemoryCatalog) -> Self {
        FaultyCatalog {
            inner,
            failing: Vec::new(),
            stall: None,
            exact_lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.exact_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for FaultyCatalog {
    async fn channels_with_package(&self, package: &PackageIdentifier) -> Result<Vec<ChannelId>, CatalogError> {
        self.exact_lookups.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&package.name) {
            return Err(CatalogError::Unavailable(String::from("connection reset")));
        }

        self.inner.channels_with_package(package).await
    }

    async fn families_of_channels(&self, channels: &[ChannelId]) -> Result<Vec<ChannelFamilyId>, CatalogError> {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }

        self.inner.families_of_channels(channels).await
    }

    async fn packages_in_families(
        &self,
        name: &str,
        arch: &str,
        families: &[ChannelFamilyId],
    ) -> Result<Vec<CandidatePackage>, CatalogError> {
        self.inner.packages_in_families(name, arch, families).await
    }

    async fn security_errata(&self, packages: &[i64]) -> Result<Vec<ErratumRecord>, CatalogError> {
        self.inner.security_errata(packages).await
    }
}
