use std::time::Duration;

use time::Date;

use crate::{agent, ContributionPayload, ContributionSource, SourceError};

const NAME: &str = "contributions-api";

/// Unauthenticated public endpoint: `GET {base_url}/{username}`.
#[derive(Debug, Clone)]
pub struct PublicApiSource {
    base_url: String,
    username: String,
    timeout: Duration,
}

impl PublicApiSource {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            timeout,
        }
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.username)
    }
}

impl ContributionSource for PublicApiSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fetch(&self, _today: Date) -> Result<ContributionPayload, SourceError> {
        let url = self.url();
        tracing::debug!(%url, "fetching public contributions");
        let mut resp = agent(self.timeout)
            .get(&url)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| SourceError::from_ureq(NAME, e))?;
        let payload: ContributionPayload = resp
            .body_mut()
            .read_json()
            .map_err(|e| SourceError::decode(NAME, e))?;
        tracing::debug!(days = payload.contributions.len(), "public contributions received");
        Ok(payload)
    }
}
