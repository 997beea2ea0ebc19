use anyhow::{bail, Context};
use std::fs;
use std::path::Path;

/// Built-in starter list written by `init-wordlist`.
pub const DEFAULT_WORDLIST: &[&str] = &[
    "admin",
    "login",
    "dashboard",
    "index.php",
    "test",
    "api",
    "v1",
    "v2",
    "v3",
    ".git",
    ".env",
    "config.php",
    "wp-admin",
    "panel",
    "robots.txt",
    "sitemap.xml",
    "user",
    "public",
];

/// Read one candidate path per line, trimmed, blank lines dropped, order kept.
pub fn load_wordlist(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read wordlist {}", path.display()))?;
    Ok(parse_wordlist(&data))
}

pub fn parse_wordlist(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Write [`DEFAULT_WORDLIST`] to `path`, creating parent directories.
pub fn write_default_wordlist(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        crate::utils::ensure_dir(parent)?;
    }
    let mut body = DEFAULT_WORDLIST.join("\n");
    body.push('\n');
    fs::write(path, body).with_context(|| format!("failed to write wordlist {}", path.display()))?;
    Ok(())
}
