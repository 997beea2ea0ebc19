use std::fmt::Write as _;

use crate::output::results::ResultBuckets;
use crate::output::style::{paint, Tone};

/// Closing report listing every bucket. Not-found results are left out.
pub fn render_summary(buckets: &ResultBuckets, color: bool) -> String {
    let mut out = String::new();
    if buckets.open.is_empty() {
        let _ = writeln!(out, "\n{}\n", paint("[-] Scan complete.", Tone::Failure, color));
    } else {
        let _ = writeln!(out, "\n{}\n", paint("[+] Scan complete.", Tone::Success, color));
    }

    let _ = writeln!(out, "{}", paint("==== Results Summary (excluding Not Found) ====", Tone::Info, color));
    section(&mut out, "Open (200):", &buckets.open, Tone::Success, color);
    section(&mut out, "Redirects (3xx):", &buckets.redirect_lines(), Tone::Info, color);
    section(&mut out, "Forbidden/Unauthorized (401/403):", &buckets.forbidden_lines(), Tone::Warning, color);
    out
}

fn section(out: &mut String, title: &str, items: &[String], tone: Tone, color: bool) {
    let _ = writeln!(out, "{}", paint(title, tone, color));
    if items.is_empty() {
        let _ = writeln!(out, "{}", paint("(none)", Tone::Failure, color));
        return;
    }
    for it in items {
        let _ = writeln!(out, " - {}", it);
    }
    let _ = writeln!(out, " Total: {}\n", items.len());
}

pub fn print_summary(buckets: &ResultBuckets, color: bool) {
    print!("{}", render_summary(buckets, color));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::outcome::StatusEntry;

    #[test]
    fn lists_each_bucket_or_none() {
        let buckets = ResultBuckets {
            open: vec!["https://example.test/admin".into()],
            redirect: vec![StatusEntry { url: "https://example.test/login".into(), status: 302 }],
            forbidden: vec![],
        };
        let text = render_summary(&buckets, false);
        assert!(text.contains("[+] Scan complete."));
        assert!(text.contains("Open (200):\n - https://example.test/admin\n Total: 1\n"));
        assert!(text.contains("Redirects (3xx):\n - https://example.test/login -> 302\n Total: 1\n"));
        assert!(text.contains("Forbidden/Unauthorized (401/403):\n(none)\n"));
    }

    #[test]
    fn empty_scan_reports_negative_completion() {
        let text = render_summary(&ResultBuckets::default(), false);
        assert!(text.starts_with("\n[-] Scan complete.\n"));
    }
}
