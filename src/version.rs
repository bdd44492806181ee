use std::cmp::Ordering;
use std::sync::Arc;

use serde::Deserialize;

use crate::data::Evr;

/// Compare two version (or release) strings segment by segment.
///
/// Strings are split into maximal runs of ASCII digits or ASCII letters; any
/// other character only separates runs. Numeric runs compare as integers
/// (leading zeros are ignored), alphabetic runs compare lexically, and a numeric
/// run is always newer than an alphabetic one. When one side runs out of
/// segments, the side with a numeric run left over is newer and the side with an
/// alphabetic run left over is older. A `~` sorts before anything, including the
/// end of the string.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut one = a;
    let mut two = b;

    loop {
        one = one.trim_start_matches(is_separator);
        two = two.trim_start_matches(is_separator);

        match (one.strip_prefix('~'), two.strip_prefix('~')) {
            (Some(rest_one), Some(rest_two)) => {
                one = rest_one;
                two = rest_two;
                continue;
            },
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {},
        }

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one.starts_with(|c: char| c.is_ascii_digit());

        let (seg_one, rest_one) = if numeric {
            split_run(one, |c| c.is_ascii_digit())
        } else {
            split_run(one, |c| c.is_ascii_alphabetic())
        };
        let (seg_two, rest_two) = if numeric {
            split_run(two, |c| c.is_ascii_digit())
        } else {
            split_run(two, |c| c.is_ascii_alphabetic())
        };

        // segments of different types: numeric is newer
        if seg_two.is_empty() {
            return if numeric { Ordering::Greater } else { Ordering::Less };
        }

        let ordering = if numeric {
            let seg_one = seg_one.trim_start_matches('0');
            let seg_two = seg_two.trim_start_matches('0');
            seg_one.len().cmp(&seg_two.len()).then_with(|| seg_one.cmp(seg_two))
        } else {
            seg_one.cmp(seg_two)
        };

        if ordering != Ordering::Equal {
            return ordering;
        }

        one = rest_one;
        two = rest_two;
    }

    match (leftover_kind(one), leftover_kind(two)) {
        (None, None) => Ordering::Equal,
        (Some(Run::Numeric), _) | (_, Some(Run::Alphabetic)) => Ordering::Greater,
        (Some(Run::Alphabetic), _) | (_, Some(Run::Numeric)) => Ordering::Less,
    }
}

enum Run {
    Numeric,
    Alphabetic,
}

fn is_separator(c: char) -> bool {
    !c.is_ascii_alphanumeric() && c != '~'
}

fn split_run(string: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = string.find(|c: char| !pred(c)).unwrap_or(string.len());
    string.split_at(end)
}

fn leftover_kind(rest: &str) -> Option<Run> {
    let first = rest.chars().next()?;
    if first.is_ascii_digit() {
        Some(Run::Numeric)
    } else {
        Some(Run::Alphabetic)
    }
}

/// Total order over EVR triples; an absent epoch counts as epoch `0`.
pub fn compare_evr(a: &Evr, b: &Evr) -> Ordering {
    let epoch_a = a.epoch.as_deref().unwrap_or("0");
    let epoch_b = b.epoch.as_deref().unwrap_or("0");

    vercmp(epoch_a, epoch_b).then_with(|| compare_vr(a, b))
}

/// Order by version, then release, ignoring epochs.
pub fn compare_vr(a: &Evr, b: &Evr) -> Ordering {
    vercmp(&a.version, &b.version).then_with(|| vercmp(&a.release, &b.release))
}

/// Decides whether a catalog build is an update of the queried build.
pub trait EvrOrdering: Send + Sync {
    /// `true` if `candidate` sorts strictly after `base`.
    fn is_newer(&self, candidate: &Evr, base: &Evr) -> bool;
}

/// Standard RPM ordering: absent epochs are epoch `0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictOrdering;

impl EvrOrdering for StrictOrdering {
    fn is_newer(&self, candidate: &Evr, base: &Evr) -> bool {
        compare_evr(candidate, base) == Ordering::Greater
    }
}

/// Ordering used by the Satellite errata queries: when the queried build has no
/// epoch, epochs are not compared at all and version / release alone decide.
///
/// This differs from standard RPM semantics and is kept for compatibility with
/// existing result sets. Use [`StrictOrdering`] for plain RPM ordering.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompatibleOrdering;

impl EvrOrdering for CompatibleOrdering {
    fn is_newer(&self, candidate: &Evr, base: &Evr) -> bool {
        let ordering = if base.epoch.is_none() {
            compare_vr(candidate, base)
        } else {
            compare_evr(candidate, base)
        };

        ordering == Ordering::Greater
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochPolicy {
    #[default]
    Compatible,
    Strict,
}

impl EpochPolicy {
    pub fn ordering(self) -> Arc<dyn EvrOrdering> {
        match self {
            EpochPolicy::Compatible => Arc::new(CompatibleOrdering),
            EpochPolicy::Strict => Arc::new(StrictOrdering),
        }
    }
}
