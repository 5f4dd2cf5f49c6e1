use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use time::Date;

use crate::{agent, ContributionPayload, ContributionSource, DayEntry, SourceError};

const NAME: &str = "github-graphql";

const CONTRIBUTIONS_QUERY: &str = "query($login:String!,$from:DateTime!){\
user(login:$login){\
contributionsCollection(from:$from){\
contributionCalendar{weeks{contributionDays{date contributionCount}}}\
}\
}\
}";

/// Authenticated GitHub GraphQL provider.
///
/// The token is held only to build the `Authorization` header; never log it.
#[derive(Clone)]
pub struct GraphQlSource {
    endpoint: String,
    username: String,
    token: String,
    timeout: Duration,
}

impl std::fmt::Debug for GraphQlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlSource")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GraphQlSource {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            token: token.into(),
            timeout,
        }
    }

    fn request_body(&self, today: Date) -> serde_json::Value {
        let since = today - time::Duration::days(365);
        serde_json::json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": {
                "login": self.username,
                "from": format!("{since}T00:00:00Z"),
            },
        })
    }
}

impl ContributionSource for GraphQlSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fetch(&self, today: Date) -> Result<ContributionPayload, SourceError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching contributions via graphql");
        let mut resp = agent(self.timeout)
            .post(&self.endpoint)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .send_json(self.request_body(today))
            .map_err(|e| SourceError::from_ureq(NAME, e))?;
        let body: GraphQlResponse = resp
            .body_mut()
            .read_json()
            .map_err(|e| SourceError::decode(NAME, e))?;
        into_payload(body, today)
    }
}

fn into_payload(body: GraphQlResponse, today: Date) -> Result<ContributionPayload, SourceError> {
    if !body.errors.is_empty() {
        let message = body
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SourceError::Api {
            provider: NAME,
            message,
        });
    }

    let user = body
        .data
        .and_then(|d| d.user)
        .ok_or_else(|| SourceError::Api {
            provider: NAME,
            message: "response has no user".to_string(),
        })?;

    let contributions: Vec<DayEntry> = user
        .contributions_collection
        .contribution_calendar
        .weeks
        .into_iter()
        .flat_map(|w| w.contribution_days)
        .map(|d| DayEntry {
            date: d.date,
            count: d.contribution_count,
        })
        .collect();

    // The API has no per-year total here; sum this year's days instead.
    let year = today.year().to_string();
    let year_total: u64 = contributions
        .iter()
        .filter(|e| e.date.starts_with(&year))
        .map(|e| e.count)
        .sum();
    let mut total = BTreeMap::new();
    total.insert(year, year_total);

    Ok(ContributionPayload {
        contributions,
        total,
    })
}

// ── Response shape ──

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Vec<GraphQlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    user: Option<GraphQlUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlUser {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: String,
    contribution_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 01 - 02);

    fn calendar_json() -> serde_json::Value {
        serde_json::json!({
            "data": {"user": {"contributionsCollection": {"contributionCalendar": {"weeks": [
                {"contributionDays": [
                    {"date": "2023-12-31", "contributionCount": 9},
                ]},
                {"contributionDays": [
                    {"date": "2024-01-01", "contributionCount": 2},
                    {"date": "2024-01-02", "contributionCount": 3},
                ]},
            ]}}}}
        })
    }

    fn source(server: &MockServer) -> GraphQlSource {
        GraphQlSource::new(
            server.url("/graphql"),
            "octocat",
            "tok123",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn flattens_weeks_and_sums_current_year() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .header("authorization", "Bearer tok123");
            then.status(200).json_body(calendar_json());
        });

        let payload = source(&server).fetch(TODAY).unwrap();
        mock.assert();
        let dates: Vec<&str> = payload.contributions.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, ["2023-12-31", "2024-01-01", "2024-01-02"]);
        assert_eq!(payload.total.get("2024"), Some(&5));
        assert_eq!(payload.total.len(), 1);
    }

    #[test]
    fn graphql_errors_fail_the_fetch() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200).json_body(serde_json::json!({
                "data": null,
                "errors": [{"message": "Could not resolve to a User"}]
            }));
        });

        let err = source(&server).fetch(TODAY).unwrap_err();
        assert!(
            matches!(
                err,
                SourceError::Api { ref message, .. } if message.contains("Could not resolve")
            ),
            "{err}"
        );
    }

    #[test]
    fn unauthorized_maps_to_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(401);
        });

        let err = source(&server).fetch(TODAY).unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 401, .. }), "{err}");
    }

    #[test]
    fn missing_user_is_an_api_error() {
        let body: GraphQlResponse =
            serde_json::from_value(serde_json::json!({"data": {"user": null}})).unwrap();
        assert!(matches!(
            into_payload(body, TODAY),
            Err(SourceError::Api { .. })
        ));
    }

    #[test]
    fn request_asks_for_last_365_days() {
        let src = GraphQlSource::new("http://x", "octocat", "t", Duration::from_secs(1));
        let body = src.request_body(date!(2024 - 03 - 01));
        assert_eq!(body["variables"]["from"], "2023-03-02T00:00:00Z");
        assert_eq!(body["variables"]["login"], "octocat");
    }

    #[test]
    fn debug_output_hides_token() {
        let src = GraphQlSource::new("http://x", "octocat", "secret-token", Duration::from_secs(1));
        assert!(!format!("{src:?}").contains("secret-token"));
    }
}
