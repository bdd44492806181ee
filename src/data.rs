use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured form of an RPM package identifier (name, epoch, version, release, arch).
///
/// An absent epoch is kept as `None` and is never folded into `"0"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageIdentifier {
    pub name: String,
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl PackageIdentifier {
    pub fn evr(&self) -> Evr {
        Evr {
            epoch: self.epoch.clone(),
            version: self.version.clone(),
            release: self.release.clone(),
        }
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.epoch {
            Some(epoch) => write!(
                f,
                "{}:{}-{}-{}.{}",
                epoch, self.name, self.version, self.release, self.arch
            ),
            None => write!(f, "{}-{}-{}.{}", self.name, self.version, self.release, self.arch),
        }
    }
}

/// Epoch / version / release triple of a package build.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Evr {
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
}

impl Evr {
    pub fn new(epoch: Option<&str>, version: &str, release: &str) -> Self {
        Evr {
            epoch: epoch.map(String::from),
            version: version.to_string(),
            release: release.to_string(),
        }
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.epoch {
            Some(epoch) => write!(f, "{}:{}-{}", epoch, self.version, self.release),
            None => write!(f, "{}-{}", self.version, self.release),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelFamilyId(pub i64);

/// A newer build of the queried package, found in one of the resolved channel families.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CandidatePackage {
    pub package_id: i64,
    pub evr: Evr,
}

/// One (security advisory, affected package, channel) tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct ErratumRecord {
    pub advisory_name: String,
    pub package_id: i64,
    pub evr: String,
    #[serde(rename = "label")]
    pub channel_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evr_display() {
        assert_eq!(Evr::new(None, "2.0", "1").to_string(), "2.0-1");
        assert_eq!(Evr::new(Some("1"), "2.0", "1").to_string(), "1:2.0-1");
    }

    #[test]
    fn erratum_json_field_names() {
        let record = ErratumRecord {
            advisory_name: String::from("RHSA-2020:001"),
            package_id: 555,
            evr: String::from("2.0-1"),
            channel_label: String::from("rhel-x86_64-server-7"),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "advisory_name": "RHSA-2020:001",
                "package_id": 555,
                "evr": "2.0-1",
                "label": "rhel-x86_64-server-7",
            })
        );
    }
}
