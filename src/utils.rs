use std::path::Path;

/// Read package identifiers from a file, one per line. Blank lines are skipped
/// and surrounding whitespace is removed.
pub fn read_identifiers(path: &Path) -> Result<Vec<String>, String> {
    if !path.exists() {
        return Err(format!("Package list does not exist: {}", path.to_string_lossy()));
    }

    let string = match std::fs::read_to_string(path) {
        Ok(string) => string,
        Err(error) => return Err(format!("Failed to read package list: {}", error)),
    };

    Ok(string
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
