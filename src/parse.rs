use crate::data::PackageIdentifier;
use crate::error::ParseError;

const RPM_SUFFIX: &str = ".rpm";

/// Parse a package file name or NEVRA string into its components.
///
/// Accepted forms (each with an optional trailing `.rpm`):
///
/// - `name-version-release.arch`
/// - `epoch:name-version-release.arch`
/// - `name-epoch:version-release.arch` (as printed by dnf)
///
/// Fields are split off from the right, because names may contain dashes.
/// No normalization is done on any of the components.
pub fn parse_nevra(input: &str) -> Result<PackageIdentifier, ParseError> {
    let nevra = input.strip_suffix(RPM_SUFFIX).unwrap_or(input);

    let mut nevr_a: Vec<&str> = nevra.rsplitn(2, '.').collect();

    if nevr_a.len() != 2 {
        return Err(ParseError::new(input, "missing architecture"));
    };

    // rsplitn returns things in reverse order
    let a = nevr_a.remove(0);
    let nevr = nevr_a.remove(0);

    // a dash after the last dot means the string ended without an arch token
    if a.is_empty() || a.contains('-') || a.contains(':') {
        return Err(ParseError::new(input, "missing architecture"));
    }

    let mut n_v_r: Vec<&str> = nevr.rsplitn(3, '-').collect();

    if n_v_r.len() != 3 {
        return Err(ParseError::new(input, "expected name, version and release"));
    };

    // rsplitn returns things in reverse order
    let r = n_v_r.remove(0);
    let v = n_v_r.remove(0);
    let n = n_v_r.remove(0);

    let (e, n, v) = if let Some((e, n)) = n.split_once(':') {
        (Some(e), n, v)
    } else if let Some((e, v)) = v.split_once(':') {
        (Some(e), n, v)
    } else {
        (None, n, v)
    };

    if e.map_or(false, str::is_empty) {
        return Err(ParseError::new(input, "empty epoch"));
    }
    if n.is_empty() {
        return Err(ParseError::new(input, "empty name"));
    }
    if v.is_empty() {
        return Err(ParseError::new(input, "empty version"));
    }
    if r.is_empty() {
        return Err(ParseError::new(input, "empty release"));
    }

    Ok(PackageIdentifier {
        name: n.to_string(),
        epoch: e.map(String::from),
        version: v.to_string(),
        release: r.to_string(),
        arch: a.to_string(),
    })
}
