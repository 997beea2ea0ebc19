use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::results::ResultBuckets;

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub open: PathBuf,
    pub redirects: PathBuf,
    pub forbidden: PathBuf,
}

impl ExportPaths {
    pub fn new(dir: &Path, stamp: &str) -> Self {
        Self {
            json: dir.join(format!("apibrute_results_{}.json", stamp)),
            open: dir.join(format!("open_200_{}.txt", stamp)),
            redirects: dir.join(format!("redirects_3xx_{}.txt", stamp)),
            forbidden: dir.join(format!("forbidden_401_403_{}.txt", stamp)),
        }
    }
}

/// Write the JSON summary plus one flat list per bucket into `dir`.
pub fn export_results(dir: &Path, buckets: &ResultBuckets, stamp: &str) -> anyhow::Result<ExportPaths> {
    crate::utils::ensure_dir(dir)
        .with_context(|| format!("failed to create results directory {}", dir.display()))?;
    let paths = ExportPaths::new(dir, stamp);

    let json = serde_json::to_string_pretty(buckets)?;
    write_file(&paths.json, &json)?;
    write_file(&paths.open, &lines(&buckets.open))?;
    write_file(&paths.redirects, &lines(&buckets.redirect_lines()))?;
    write_file(&paths.forbidden, &lines(&buckets.forbidden_lines()))?;

    tracing::info!(json = %paths.json.display(), entries = buckets.len(), "results exported");
    Ok(paths)
}

/// Newline-terminated; an empty list gives an empty file.
fn lines(items: &[String]) -> String {
    let mut out = items.join("\n");
    if !items.is_empty() {
        out.push('\n');
    }
    out
}

fn write_file(path: &Path, body: &str) -> anyhow::Result<()> {
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::outcome::StatusEntry;

    #[test]
    fn writes_json_and_flat_lists() {
        let dir = std::env::temp_dir().join(format!("api_brute_export_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let buckets = ResultBuckets {
            open: vec!["https://example.test/admin".into(), "https://example.test/api".into()],
            redirect: vec![StatusEntry { url: "https://example.test/login".into(), status: 302 }],
            forbidden: vec![],
        };

        let paths = export_results(&dir, &buckets, "20240101_000000").unwrap();
        assert!(paths.json.ends_with("apibrute_results_20240101_000000.json"));

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json["3xx"][0], "https://example.test/login -> 302");
        assert_eq!(
            fs::read_to_string(&paths.open).unwrap(),
            "https://example.test/admin\nhttps://example.test/api\n"
        );
        assert_eq!(fs::read_to_string(&paths.redirects).unwrap(), "https://example.test/login -> 302\n");
        assert_eq!(fs::read_to_string(&paths.forbidden).unwrap(), "");
        let _ = fs::remove_dir_all(&dir);
    }
}
