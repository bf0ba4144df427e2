//! Configuration loading and resolution.

use std::path::PathBuf;

/// Environment variable naming the store file.
pub const STORE_FILE_ENV: &str = "BUCKET_SERIES_FILE";

/// Resolve the store file path: explicit flag, then env var, then a store in
/// the working directory, then one under the home directory.
pub fn resolve_store_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var(STORE_FILE_ENV) {
        if !env_path.is_empty() {
            return env_path;
        }
    }

    let cwd_store = PathBuf::from(".bucket-series/events.bkts");
    if cwd_store.exists() {
        return cwd_store.display().to_string();
    }

    resolve_default_store_path()
}

fn resolve_default_store_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.bucket-series/events.bkts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(resolve_store_path(Some("/tmp/x.bkts")), "/tmp/x.bkts");
    }

    #[test]
    fn test_default_path_shape() {
        assert!(resolve_default_store_path().ends_with("/.bucket-series/events.bkts"));
    }
}
