use async_trait::async_trait;

use crate::data::{CandidatePackage, ChannelFamilyId, ChannelId, ErratumRecord, PackageIdentifier};
use crate::error::CatalogError;

pub const SECURITY_ADVISORY: &str = "Security Advisory";

/// Epoch predicate for exact package lookups.
///
/// A queried package without an epoch matches catalog rows with any epoch,
/// including rows without one. An explicit epoch only matches that epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EpochFilter {
    Any,
    Exact(String),
}

impl EpochFilter {
    pub fn of(package: &PackageIdentifier) -> Self {
        match &package.epoch {
            Some(epoch) => EpochFilter::Exact(epoch.clone()),
            None => EpochFilter::Any,
        }
    }

    pub fn matches(&self, epoch: Option<&str>) -> bool {
        match self {
            EpochFilter::Any => true,
            EpochFilter::Exact(expected) => epoch == Some(expected.as_str()),
        }
    }
}

/// Read-only view of the package catalog (channels, channel families, packages, errata).
///
/// Implementations hold no per-request state; every call reads the current
/// catalog contents.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Channels that carry a package exactly matching name, version, release,
    /// arch and [`EpochFilter::of`] the given package.
    async fn channels_with_package(&self, package: &PackageIdentifier) -> Result<Vec<ChannelId>, CatalogError>;

    /// Channel families that have at least one of the given channels as a member.
    async fn families_of_channels(&self, channels: &[ChannelId]) -> Result<Vec<ChannelFamilyId>, CatalogError>;

    /// All builds with the given name and arch that are published into any
    /// channel of the given families, regardless of their EVR.
    async fn packages_in_families(
        &self,
        name: &str,
        arch: &str,
        families: &[ChannelFamilyId],
    ) -> Result<Vec<CandidatePackage>, CatalogError>;

    /// Security advisories referencing any of the given packages, one record per
    /// channel that carries the referenced package.
    async fn security_errata(&self, packages: &[i64]) -> Result<Vec<ErratumRecord>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_nevra;

    #[test]
    fn absent_epoch_matches_anything() {
        let filter = EpochFilter::of(&parse_nevra("pkg-1.0-1.x86_64").unwrap());

        assert_eq!(filter, EpochFilter::Any);
        assert!(filter.matches(None));
        assert!(filter.matches(Some("0")));
        assert!(filter.matches(Some("3")));
    }

    #[test]
    fn explicit_epoch_matches_exactly() {
        let filter = EpochFilter::of(&parse_nevra("0:pkg-1.0-1.x86_64").unwrap());

        assert_eq!(filter, EpochFilter::Exact(String::from("0")));
        assert!(filter.matches(Some("0")));
        assert!(!filter.matches(None));
        assert!(!filter.matches(Some("1")));
    }
}
