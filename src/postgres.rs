use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use retry::delay::Fibonacci;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::catalog::{Catalog, EpochFilter, SECURITY_ADVISORY};
use crate::config::DatabaseConfig;
use crate::data::{CandidatePackage, ChannelFamilyId, ChannelId, ErratumRecord, Evr, PackageIdentifier};
use crate::error::CatalogError;

const CHANNELS_SQL: &str = "
    select distinct cp.channel_id::bigint
    from rhnchannelpackage cp
    join rhnpackage p on p.id = cp.package_id
    join rhnpackagename pn on pn.id = p.name_id
    join rhnpackageevr evr on evr.id = p.evr_id
    join rhnpackagearch pa on pa.id = p.package_arch_id
    where pn.name = ";

const FAMILIES_SQL: &str = "
    select distinct fm.channel_family_id::bigint
    from rhnchannelfamilymembers fm
    where fm.channel_id::bigint = any($1)";

const PACKAGES_SQL: &str = "
    select distinct p.id::bigint, evr.epoch, evr.version, evr.release
    from rhnchannelpackage cp
    join rhnchannelfamilymembers fm on fm.channel_id = cp.channel_id
    join rhnpackage p on p.id = cp.package_id
    join rhnpackagename pn on pn.id = p.name_id
    join rhnpackageevr evr on evr.id = p.evr_id
    join rhnpackagearch pa on pa.id = p.package_arch_id
    where fm.channel_family_id::bigint = any($1)
    and pn.name = $2
    and pa.label = $3";

const ERRATA_SQL: &str = "
    select e.advisory_name, ep.package_id::bigint, evr.epoch, evr.version, evr.release, c.label
    from rhnerrata e
    join rhnerratapackage ep on ep.errata_id = e.id
    join rhnpackage p on p.id = ep.package_id
    join rhnpackageevr evr on evr.id = p.evr_id
    join rhnchannelpackage cp on cp.package_id = p.id
    join rhnchannel c on c.id = cp.channel_id
    where e.advisory_type = $1
    and ep.package_id::bigint = any($2)";

type ErratumRow = (String, i64, Option<String>, String, String, String);

impl EpochFilter {
    fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            EpochFilter::Any => {},
            EpochFilter::Exact(epoch) => {
                builder.push(" and evr.epoch = ");
                builder.push_bind(epoch.clone());
            },
        }
    }
}

fn channels_query(package: &PackageIdentifier) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(CHANNELS_SQL);

    builder.push_bind(package.name.clone());
    builder.push(" and evr.version = ");
    builder.push_bind(package.version.clone());
    builder.push(" and evr.release = ");
    builder.push_bind(package.release.clone());
    builder.push(" and pa.label = ");
    builder.push_bind(package.arch.clone());

    EpochFilter::of(package).push_predicate(&mut builder);

    builder
}

/// Catalog backed by a Spacewalk / Satellite PostgreSQL schema.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        PgCatalog { pool }
    }

    /// Connect to the database, retrying with a bounded Fibonacci backoff.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgCatalog, CatalogError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let mut delays = Fibonacci::from_millis(500).take(config.connect_retries);

        loop {
            let attempt = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(config.connect_timeout))
                .connect_with(options.clone())
                .await;

            match attempt {
                Ok(pool) => {
                    info!(
                        "Connected to database {} on {}:{}.",
                        &config.name, &config.host, config.port
                    );
                    return Ok(PgCatalog::new(pool));
                },
                Err(error) => match delays.next() {
                    Some(delay) => {
                        warn!("Failed to connect to database ({}), retrying in {:?}.", error, delay);
                        tokio::time::sleep(delay).await;
                    },
                    None => return Err(CatalogError::Unavailable(error.to_string())),
                },
            }
        }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn channels_with_package(&self, package: &PackageIdentifier) -> Result<Vec<ChannelId>, CatalogError> {
        let mut builder = channels_query(package);

        let rows: Vec<(i64,)> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|(id,)| ChannelId(id)).collect())
    }

    async fn families_of_channels(&self, channels: &[ChannelId]) -> Result<Vec<ChannelFamilyId>, CatalogError> {
        let ids: Vec<i64> = channels.iter().map(|channel| channel.0).collect();

        let rows: Vec<(i64,)> = sqlx::query_as(FAMILIES_SQL).bind(ids).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|(id,)| ChannelFamilyId(id)).collect())
    }

    async fn packages_in_families(
        &self,
        name: &str,
        arch: &str,
        families: &[ChannelFamilyId],
    ) -> Result<Vec<CandidatePackage>, CatalogError> {
        let ids: Vec<i64> = families.iter().map(|family| family.0).collect();

        let rows: Vec<(i64, Option<String>, String, String)> = sqlx::query_as(PACKAGES_SQL)
            .bind(ids)
            .bind(name)
            .bind(arch)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(package_id, epoch, version, release)| CandidatePackage {
                package_id,
                evr: Evr {
                    epoch,
                    version,
                    release,
                },
            })
            .collect())
    }

    async fn security_errata(&self, packages: &[i64]) -> Result<Vec<ErratumRecord>, CatalogError> {
        let rows: Vec<ErratumRow> = sqlx::query_as(ERRATA_SQL)
            .bind(SECURITY_ADVISORY)
            .bind(packages.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(advisory_name, package_id, epoch, version, release, label)| ErratumRecord {
                advisory_name,
                package_id,
                evr: Evr {
                    epoch,
                    version,
                    release,
                }
                .to_string(),
                channel_label: label,
            })
            .collect())
    }
}
