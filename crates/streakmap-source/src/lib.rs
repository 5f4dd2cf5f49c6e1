//! Where daily contribution counts come from.
//!
//! Two providers share one payload shape: the public contributions endpoint
//! (no credentials) and the GitHub GraphQL API (token required). The run
//! makes one attempt at the primary and, only if that fails, one attempt at
//! the fallback.

mod graphql;
mod payload;
mod public;

use std::time::Duration;

use time::Date;

pub use graphql::GraphQlSource;
pub use payload::{ContributionPayload, DayEntry};
pub use public::PublicApiSource;

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{provider}: request failed: {error}")]
    Transport {
        provider: &'static str,
        #[source]
        error: ureq::Error,
    },
    #[error("{provider}: http status {status}")]
    Http { provider: &'static str, status: u16 },
    #[error("{provider}: malformed response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("{provider}: api error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },
}

impl SourceError {
    pub(crate) fn from_ureq(provider: &'static str, error: ureq::Error) -> Self {
        match error {
            ureq::Error::StatusCode(status) => SourceError::Http { provider, status },
            other => SourceError::Transport {
                provider,
                error: other,
            },
        }
    }

    pub(crate) fn decode(provider: &'static str, error: impl std::fmt::Display) -> Self {
        SourceError::Decode {
            provider,
            message: error.to_string(),
        }
    }
}

// ── Provider trait ──

/// A provider of daily contribution counts.
pub trait ContributionSource {
    /// Short identifier used in logs and the report footer.
    fn name(&self) -> &'static str;

    /// Fetch the history needed to report on `today`.
    fn fetch(&self, today: Date) -> Result<ContributionPayload, SourceError>;
}

/// A payload together with the provider that produced it.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub payload: ContributionPayload,
    pub provider: &'static str,
}

/// Try `primary` once, then `fallback` once if the primary failed.
///
/// When there is no fallback, or the fallback fails too, the primary's error
/// is returned; the fallback's error is only logged.
pub fn fetch_with_fallback(
    primary: &dyn ContributionSource,
    fallback: Option<&dyn ContributionSource>,
    today: Date,
) -> Result<Fetched, SourceError> {
    let primary_err = match primary.fetch(today) {
        Ok(payload) => {
            return Ok(Fetched {
                payload,
                provider: primary.name(),
            })
        }
        Err(e) => e,
    };

    let Some(fallback) = fallback else {
        return Err(primary_err);
    };

    tracing::warn!(
        error = %primary_err,
        fallback = fallback.name(),
        "primary source failed, trying fallback"
    );
    match fallback.fetch(today) {
        Ok(payload) => Ok(Fetched {
            payload,
            provider: fallback.name(),
        }),
        Err(fallback_err) => {
            tracing::warn!(error = %fallback_err, "fallback source failed");
            Err(primary_err)
        }
    }
}

pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use time::macros::date;

    struct Scripted {
        name: &'static str,
        result: fn() -> Result<ContributionPayload, SourceError>,
        calls: Cell<u32>,
    }

    impl Scripted {
        fn new(
            name: &'static str,
            result: fn() -> Result<ContributionPayload, SourceError>,
        ) -> Self {
            Self {
                name,
                result,
                calls: Cell::new(0),
            }
        }
    }

    impl ContributionSource for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn fetch(&self, _today: Date) -> Result<ContributionPayload, SourceError> {
            self.calls.set(self.calls.get() + 1);
            (self.result)()
        }
    }

    fn one_day() -> Result<ContributionPayload, SourceError> {
        Ok(ContributionPayload {
            contributions: vec![DayEntry {
                date: "2024-05-01".into(),
                count: 3,
            }],
            total: Default::default(),
        })
    }

    fn primary_down() -> Result<ContributionPayload, SourceError> {
        Err(SourceError::Http {
            provider: "primary",
            status: 503,
        })
    }

    fn fallback_down() -> Result<ContributionPayload, SourceError> {
        Err(SourceError::Api {
            provider: "fallback",
            message: "bad credentials".into(),
        })
    }

    const TODAY: Date = date!(2024 - 05 - 01);

    #[test]
    fn primary_success_skips_fallback() {
        let primary = Scripted::new("primary", one_day);
        let fallback = Scripted::new("fallback", one_day);
        let fetched = fetch_with_fallback(&primary, Some(&fallback), TODAY).unwrap();
        assert_eq!(fetched.provider, "primary");
        assert_eq!(primary.calls.get(), 1);
        assert_eq!(fallback.calls.get(), 0);
    }

    #[test]
    fn fallback_used_once_when_primary_fails() {
        let primary = Scripted::new("primary", primary_down);
        let fallback = Scripted::new("fallback", one_day);
        let fetched = fetch_with_fallback(&primary, Some(&fallback), TODAY).unwrap();
        assert_eq!(fetched.provider, "fallback");
        assert_eq!(fetched.payload.contributions.len(), 1);
        assert_eq!(primary.calls.get(), 1);
        assert_eq!(fallback.calls.get(), 1);
    }

    #[test]
    fn primary_error_surfaces_without_fallback() {
        let primary = Scripted::new("primary", primary_down);
        let err = fetch_with_fallback(&primary, None, TODAY).unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 503, .. }));
        assert_eq!(primary.calls.get(), 1);
    }

    #[test]
    fn primary_error_surfaces_when_fallback_fails() {
        let primary = Scripted::new("primary", primary_down);
        let fallback = Scripted::new("fallback", fallback_down);
        let err = fetch_with_fallback(&primary, Some(&fallback), TODAY).unwrap_err();
        assert_eq!(err.to_string(), "primary: http status 503");
        assert_eq!(fallback.calls.get(), 1);
    }
}
