use serde::Serialize;
use std::fmt;

use crate::output::style::Tone;

pub const REDIRECT_CODES: [u16; 4] = [301, 302, 307, 308];
pub const FORBIDDEN_CODES: [u16; 2] = [401, 403];

/// Description used when a probe is skipped or abandoned by cancellation.
pub const CANCELLED: &str = "scan cancelled";

/// What one probe found. Produced exactly once per candidate path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Open { url: String },
    Redirect { url: String, status: u16 },
    Forbidden { url: String, status: u16 },
    NotFound { url: String, status: u16 },
    TransportError { url: String, error: String },
}

impl ProbeOutcome {
    /// Classify a raw status code. Only the code matters, never the body.
    pub fn classify(url: String, status: u16) -> Self {
        match status {
            200 => ProbeOutcome::Open { url },
            s if REDIRECT_CODES.contains(&s) => ProbeOutcome::Redirect { url, status },
            s if FORBIDDEN_CODES.contains(&s) => ProbeOutcome::Forbidden { url, status },
            _ => ProbeOutcome::NotFound { url, status },
        }
    }

    pub fn cancelled(url: String) -> Self {
        ProbeOutcome::TransportError { url, error: CANCELLED.to_string() }
    }

    pub fn url(&self) -> &str {
        match self {
            ProbeOutcome::Open { url }
            | ProbeOutcome::Redirect { url, .. }
            | ProbeOutcome::Forbidden { url, .. }
            | ProbeOutcome::NotFound { url, .. }
            | ProbeOutcome::TransportError { url, .. } => url,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Open { .. } => Some(200),
            ProbeOutcome::Redirect { status, .. }
            | ProbeOutcome::Forbidden { status, .. }
            | ProbeOutcome::NotFound { status, .. } => Some(*status),
            ProbeOutcome::TransportError { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProbeOutcome::TransportError { error, .. } if error == CANCELLED)
    }

    /// Bucket entry for actionable findings; `None` for not-found and errors.
    pub fn bucket_entry(&self) -> Option<BucketEntry> {
        match self {
            ProbeOutcome::Open { url } => Some(BucketEntry::Open(url.clone())),
            ProbeOutcome::Redirect { url, status } => {
                Some(BucketEntry::Redirect(StatusEntry { url: url.clone(), status: *status }))
            }
            ProbeOutcome::Forbidden { url, status } => {
                Some(BucketEntry::Forbidden(StatusEntry { url: url.clone(), status: *status }))
            }
            ProbeOutcome::NotFound { .. } | ProbeOutcome::TransportError { .. } => None,
        }
    }

    /// The line printed when the probe concludes.
    pub fn final_line(&self) -> String {
        match self {
            ProbeOutcome::Open { url } => format!("[+] OPEN : {}", url),
            ProbeOutcome::Redirect { url, status } => format!("[>] REDIRECT [{}]: {}", status, url),
            ProbeOutcome::Forbidden { url, status } => format!("[!] FORBIDDEN [{}]: {}", status, url),
            ProbeOutcome::NotFound { url, status } => format!("[-] Not Found [{}]: {}", status, url),
            ProbeOutcome::TransportError { url, error } => format!("[ERR] {} → {}", url, error),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            ProbeOutcome::Open { .. } => Tone::Success,
            ProbeOutcome::Redirect { .. } => Tone::Info,
            ProbeOutcome::Forbidden { .. } => Tone::Warning,
            ProbeOutcome::NotFound { .. } | ProbeOutcome::TransportError { .. } => Tone::Failure,
        }
    }
}

/// A bucketed URL together with the status that put it there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub url: String,
    pub status: u16,
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.url, self.status)
    }
}

impl Serialize for StatusEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketEntry {
    Open(String),
    Redirect(StatusEntry),
    Forbidden(StatusEntry),
}
