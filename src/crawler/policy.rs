//! Failure policy for the crawl
//!
//! Every per-URL problem is expressed as an [`Issue`] and mapped to a
//! [`Disposition`] in one place. Only an output root that stops accepting
//! writes aborts a run; everything else is contained to the URL it concerns.

use crate::crawler::fetcher::TransportKind;
use std::fmt;
use url::Url;

/// Problems a worker can run into while processing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Discovered link points outside the crawl origin
    ScopeRejection { url: Url },

    /// Discovered link was already claimed
    DuplicateRejection { url: Url },

    /// Server answered with a non-2xx status
    BadStatus { url: Url, status_code: u16 },

    /// A redirect was not followed: its target leaves the origin, or is
    /// mirrored through another item already
    RedirectStopped {
        url: Url,
        location: Url,
        offsite: bool,
    },

    /// Timeout, connection, TLS or body read failure
    TransportFailure {
        url: Url,
        kind: TransportKind,
        error: String,
    },

    /// Non-empty HTML body yielded no links at all
    ParseDegradation { url: Url, bytes: usize },

    /// Writing the response body failed
    PersistenceFailure {
        url: Url,
        error: String,
        /// The output root itself no longer accepts writes
        root_unwritable: bool,
    },
}

impl Issue {
    /// The URL the issue concerns
    pub fn url(&self) -> &Url {
        match self {
            Self::ScopeRejection { url }
            | Self::DuplicateRejection { url }
            | Self::BadStatus { url, .. }
            | Self::RedirectStopped { url, .. }
            | Self::TransportFailure { url, .. }
            | Self::ParseDegradation { url, .. }
            | Self::PersistenceFailure { url, .. } => url,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScopeRejection { url } => write!(f, "out of scope: {}", url),
            Self::DuplicateRejection { url } => write!(f, "already seen: {}", url),
            Self::BadStatus { url, status_code } => {
                write!(f, "HTTP {} for {}", status_code, url)
            }
            Self::RedirectStopped {
                url,
                location,
                offsite: true,
            } => write!(f, "redirect from {} to {} leaves the crawl origin", url, location),
            Self::RedirectStopped { url, location, .. } => {
                write!(f, "redirect from {} to {} is already claimed", url, location)
            }
            Self::TransportFailure { url, kind, error } => {
                write!(f, "{} failure for {}: {}", kind, url, error)
            }
            Self::ParseDegradation { url, bytes } => {
                write!(f, "no links found in {} bytes of HTML at {}", bytes, url)
            }
            Self::PersistenceFailure { url, error, .. } => {
                write!(f, "failed to save {}: {}", url, error)
            }
        }
    }
}

/// What the crawler does after an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Drop the URL silently
    Ignore,
    /// Keep processing the current item
    Continue,
    /// Give up on the current item; the crawl goes on
    Skip,
    /// Stop the whole crawl
    Abort,
}

/// Maps an issue to the action the crawler takes
///
/// Nothing is retried. This is a pure function; see [`report`] for the
/// logging counterpart.
pub fn disposition(issue: &Issue) -> Disposition {
    match issue {
        Issue::ScopeRejection { .. } | Issue::DuplicateRejection { .. } => Disposition::Ignore,
        Issue::ParseDegradation { .. } => Disposition::Continue,
        Issue::BadStatus { .. }
        | Issue::RedirectStopped { .. }
        | Issue::TransportFailure { .. } => Disposition::Skip,
        Issue::PersistenceFailure {
            root_unwritable, ..
        } => {
            if *root_unwritable {
                Disposition::Abort
            } else {
                Disposition::Skip
            }
        }
    }
}

/// Logs an issue at the level matching its severity and returns its disposition
pub fn report(issue: &Issue) -> Disposition {
    let action = disposition(issue);

    match (issue, action) {
        (Issue::ScopeRejection { .. } | Issue::DuplicateRejection { .. }, _) => {
            tracing::trace!("Ignoring link, {}", issue);
        }
        (Issue::ParseDegradation { .. }, _) => {
            tracing::debug!("{}", issue);
        }
        (Issue::BadStatus { .. }, _)
        | (Issue::RedirectStopped { offsite: true, .. }, _) => {
            tracing::warn!("Skipping, {}", issue);
        }
        (Issue::RedirectStopped { .. }, _) => {
            tracing::debug!("Skipping, {}", issue);
        }
        (_, Disposition::Abort) => {
            tracing::error!("Aborting crawl, {}", issue);
        }
        _ => {
            tracing::error!("Skipping, {}", issue);
        }
    }

    action
}
