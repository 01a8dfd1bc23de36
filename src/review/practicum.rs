use async_trait::async_trait;

use super::{FetchError, ReviewClient, Snapshot};
use crate::store::SubmissionStatus;

/// Production endpoint for homework statuses.
pub const PRACTICUM_ENDPOINT: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Practicum homework-statuses API client.
///
/// Authenticates with an OAuth token and always requests the full snapshot
/// (`from_date=0`); diffing against previous polls is the poll loop's job,
/// not the client's.
pub struct PracticumClient {
    token: String,
    endpoint: String,
    client: reqwest::Client,
}

impl PracticumClient {
    pub fn new(token: String, endpoint: String) -> Self {
        Self {
            token,
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Extract submission snapshots from a decoded API response.
    fn parse_response(payload: &serde_json::Value) -> Result<Vec<Snapshot>, FetchError> {
        let Some(obj) = payload.as_object() else {
            return Err(FetchError::Parse(format!(
                "response is not a JSON object: {payload}"
            )));
        };

        let homeworks = obj
            .get("homeworks")
            .ok_or_else(|| FetchError::Parse("response is missing 'homeworks'".into()))?;
        let homeworks = homeworks.as_array().ok_or_else(|| {
            FetchError::Parse(format!("'homeworks' is not a list: {homeworks}"))
        })?;

        if !obj.contains_key("current_date") {
            return Err(FetchError::Parse(
                "response is missing 'current_date'".into(),
            ));
        }

        homeworks.iter().map(Self::parse_homework).collect()
    }

    fn parse_homework(homework: &serde_json::Value) -> Result<Snapshot, FetchError> {
        let id = match homework.get("id") {
            Some(v) if v.is_u64() => v.to_string(),
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(FetchError::Parse(format!(
                    "homework entry has no usable id: {homework}"
                )))
            }
        };

        let status_str = homework
            .get("status")
            .and_then(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                FetchError::Parse(format!("homework entry has no status: {homework}"))
            })?;
        let status: SubmissionStatus = serde_json::from_value(serde_json::Value::String(
            status_str.to_string(),
        ))
        .map_err(|_| {
            FetchError::Parse(format!(
                "undocumented homework status '{status_str}': {homework}"
            ))
        })?;

        let name = homework
            .get("homework_name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                FetchError::Parse(format!("homework entry has no title: {homework}"))
            })?
            .to_string();

        let reviewer_comment = homework
            .get("reviewer_comment")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Snapshot {
            id,
            name,
            status,
            reviewer_comment,
        })
    }
}

#[async_trait]
impl ReviewClient for PracticumClient {
    async fn fetch_statuses(&self) -> Result<Vec<Snapshot>, FetchError> {
        tracing::debug!("requesting homework statuses from {}", self.endpoint);

        let resp = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", "0")])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Auth(format!("{status}: {body}")));
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "unexpected response status {status} from {}",
                self.endpoint
            )));
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Parse(format!("invalid JSON body: {e}")))?;

        Self::parse_response(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_response() -> serde_json::Value {
        serde_json::json!({
            "homeworks": [
                {
                    "id": 124,
                    "homework_name": "final_project",
                    "status": "approved",
                    "reviewer_comment": "Looks good!"
                },
                {
                    "id": 123,
                    "homework_name": "api_bot",
                    "status": "reviewing"
                }
            ],
            "current_date": 1_700_000_000
        })
    }

    #[test]
    fn parse_full_response() {
        let snapshots = PracticumClient::parse_response(&sample_response()).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].id, "124");
        assert_eq!(snapshots[0].name, "final_project");
        assert_eq!(snapshots[0].status, SubmissionStatus::Approved);
        assert_eq!(snapshots[0].reviewer_comment.as_deref(), Some("Looks good!"));
        assert_eq!(snapshots[1].status, SubmissionStatus::Reviewing);
        assert!(snapshots[1].reviewer_comment.is_none());
    }

    #[test]
    fn parse_empty_homeworks_is_valid() {
        let payload = serde_json::json!({ "homeworks": [], "current_date": 1 });
        let snapshots = PracticumClient::parse_response(&payload).unwrap();
        assert!(snapshots.is_empty());
    }

    #[test]
    fn parse_rejects_non_object() {
        let err = PracticumClient::parse_response(&serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn parse_rejects_missing_homeworks() {
        let payload = serde_json::json!({ "current_date": 1 });
        let err = PracticumClient::parse_response(&payload).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
        assert!(err.to_string().contains("homeworks"));
    }

    #[test]
    fn parse_rejects_non_list_homeworks() {
        let payload = serde_json::json!({ "homeworks": "nope", "current_date": 1 });
        let err = PracticumClient::parse_response(&payload).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn parse_rejects_missing_current_date() {
        let payload = serde_json::json!({ "homeworks": [] });
        let err = PracticumClient::parse_response(&payload).unwrap_err();
        assert!(err.to_string().contains("current_date"));
    }

    #[test]
    fn parse_rejects_unknown_status() {
        let payload = serde_json::json!({
            "homeworks": [
                { "id": 1, "homework_name": "hw", "status": "in_limbo" }
            ],
            "current_date": 1
        });
        let err = PracticumClient::parse_response(&payload).unwrap_err();
        assert!(err.to_string().contains("in_limbo"));
    }

    #[test]
    fn parse_rejects_missing_name() {
        let payload = serde_json::json!({
            "homeworks": [ { "id": 1, "status": "approved" } ],
            "current_date": 1
        });
        let err = PracticumClient::parse_response(&payload).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn parse_rejects_missing_id() {
        let payload = serde_json::json!({
            "homeworks": [ { "homework_name": "hw", "status": "approved" } ],
            "current_date": 1
        });
        let err = PracticumClient::parse_response(&payload).unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[tokio::test]
    async fn fetch_sends_auth_header_and_from_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user_api/homework_statuses/"))
            .and(header("Authorization", "OAuth secret_token"))
            .and(query_param("from_date", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .expect(1)
            .mount(&server)
            .await;

        let client = PracticumClient::new(
            "secret_token".into(),
            format!("{}/api/user_api/homework_statuses/", server.uri()),
        );
        let snapshots = client.fetch_statuses().await.unwrap();
        assert_eq!(snapshots.len(), 2);
    }

    #[tokio::test]
    async fn fetch_maps_401_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = PracticumClient::new("wrong".into(), server.uri());
        let err = client.fetch_statuses().await.unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));
    }

    #[tokio::test]
    async fn fetch_maps_500_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = PracticumClient::new("tok".into(), server.uri());
        let err = client.fetch_statuses().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn fetch_maps_bad_json_to_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = PracticumClient::new("tok".into(), server.uri());
        let err = client.fetch_statuses().await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn fetch_maps_unresolvable_host_to_network_error() {
        // RFC 2606 reserves .invalid: resolution always fails.
        let client = PracticumClient::new("tok".into(), "http://host.invalid/".into());
        let err = client.fetch_statuses().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
