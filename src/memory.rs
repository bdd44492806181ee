use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::catalog::{Catalog, EpochFilter, SECURITY_ADVISORY};
use crate::data::{CandidatePackage, ChannelFamilyId, ChannelId, ErratumRecord, PackageIdentifier};
use crate::error::CatalogError;

#[derive(Debug)]
struct Erratum {
    advisory_name: String,
    advisory_type: String,
    packages: Vec<i64>,
}

/// Catalog held entirely in memory, with the same query semantics as [`crate::postgres::PgCatalog`].
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    channels: BTreeMap<ChannelId, String>,
    members: BTreeSet<(ChannelFamilyId, ChannelId)>,
    packages: BTreeMap<i64, PackageIdentifier>,
    published: BTreeSet<(ChannelId, i64)>,
    errata: Vec<Erratum>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&mut self, channel: i64, label: &str) -> &mut Self {
        self.channels.insert(ChannelId(channel), label.to_string());
        self
    }

    pub fn add_family_member(&mut self, family: i64, channel: i64) -> &mut Self {
        self.members.insert((ChannelFamilyId(family), ChannelId(channel)));
        self
    }

    pub fn add_package(&mut self, id: i64, package: PackageIdentifier) -> &mut Self {
        self.packages.insert(id, package);
        self
    }

    pub fn publish(&mut self, channel: i64, package: i64) -> &mut Self {
        self.published.insert((ChannelId(channel), package));
        self
    }

    pub fn add_erratum(&mut self, advisory_name: &str, advisory_type: &str, packages: &[i64]) -> &mut Self {
        self.errata.push(Erratum {
            advisory_name: advisory_name.to_string(),
            advisory_type: advisory_type.to_string(),
            packages: packages.to_vec(),
        });
        self
    }

    fn channels_of(&self, package: i64) -> impl Iterator<Item = ChannelId> + '_ {
        self.published
            .iter()
            .filter(move |(_, id)| *id == package)
            .map(|(channel, _)| *channel)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn channels_with_package(&self, package: &PackageIdentifier) -> Result<Vec<ChannelId>, CatalogError> {
        let epoch = EpochFilter::of(package);

        let matching: BTreeSet<i64> = self
            .packages
            .iter()
            .filter(|(_, stored)| {
                stored.name == package.name
                    && stored.version == package.version
                    && stored.release == package.release
                    && stored.arch == package.arch
                    && epoch.matches(stored.epoch.as_deref())
            })
            .map(|(id, _)| *id)
            .collect();

        let channels: BTreeSet<ChannelId> = self
            .published
            .iter()
            .filter(|(_, id)| matching.contains(id))
            .map(|(channel, _)| *channel)
            .collect();

        Ok(channels.into_iter().collect())
    }

    async fn families_of_channels(&self, channels: &[ChannelId]) -> Result<Vec<ChannelFamilyId>, CatalogError> {
        let families: BTreeSet<ChannelFamilyId> = self
            .members
            .iter()
            .filter(|(_, channel)| channels.contains(channel))
            .map(|(family, _)| *family)
            .collect();

        Ok(families.into_iter().collect())
    }

    async fn packages_in_families(
        &self,
        name: &str,
        arch: &str,
        families: &[ChannelFamilyId],
    ) -> Result<Vec<CandidatePackage>, CatalogError> {
        let channels: BTreeSet<ChannelId> = self
            .members
            .iter()
            .filter(|(family, _)| families.contains(family))
            .map(|(_, channel)| *channel)
            .collect();

        let ids: BTreeSet<i64> = self
            .published
            .iter()
            .filter(|(channel, _)| channels.contains(channel))
            .map(|(_, id)| *id)
            .collect();

        Ok(ids
            .into_iter()
            .filter_map(|id| self.packages.get(&id).map(|package| (id, package)))
            .filter(|(_, package)| package.name == name && package.arch == arch)
            .map(|(package_id, package)| CandidatePackage {
                package_id,
                evr: package.evr(),
            })
            .collect())
    }

    async fn security_errata(&self, packages: &[i64]) -> Result<Vec<ErratumRecord>, CatalogError> {
        let mut records = Vec::new();

        for erratum in self.errata.iter().filter(|e| e.advisory_type == SECURITY_ADVISORY) {
            for id in erratum.packages.iter().filter(|id| packages.contains(*id)) {
                let package = match self.packages.get(id) {
                    Some(package) => package,
                    None => continue,
                };

                for channel in self.channels_of(*id) {
                    if let Some(label) = self.channels.get(&channel) {
                        records.push(ErratumRecord {
                            advisory_name: erratum.advisory_name.clone(),
                            package_id: *id,
                            evr: package.evr().to_string(),
                            channel_label: label.clone(),
                        });
                    }
                }
            }
        }

        Ok(records)
    }
}
