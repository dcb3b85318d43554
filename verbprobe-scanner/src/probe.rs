use crate::method::HttpMethod;
use crate::result::{MethodResult, ProbeOutcome, Unavailable};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

/// Sends single-method requests and classifies what comes back.
///
/// Cloning is cheap: the client pool and the concurrency limiter are
/// shared between clones.
#[derive(Clone)]
pub struct Prober {
    client: Client,
    limiter: Arc<Semaphore>,
    timeout: Duration,
}

impl Prober {
    pub fn new(client: Client, limiter: Arc<Semaphore>, timeout: Duration) -> Self {
        Self {
            client,
            limiter,
            timeout,
        }
    }

    /// Probe `url` with `method`. Never fails: every error becomes an
    /// unavailable outcome. No body is sent and the response body is not read.
    pub async fn probe(&self, url: &Url, method: HttpMethod) -> MethodResult {
        let Ok(_permit) = self.limiter.acquire().await else {
            return MethodResult::new(
                method,
                ProbeOutcome::Unavailable(Unavailable::Request("probe limiter closed".to_string())),
            );
        };

        let request = self
            .client
            .request(method.into(), url.clone())
            .timeout(self.timeout)
            .send();

        let outcome = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => ProbeOutcome::from_status(response.status().as_u16()),
            Ok(Err(e)) => ProbeOutcome::Unavailable(categorize_error(&e)),
            Err(_) => ProbeOutcome::Unavailable(Unavailable::Timeout),
        };

        match &outcome {
            ProbeOutcome::Status(code) => debug!("{} {} -> {}", method, url, code),
            ProbeOutcome::Unavailable(reason) => debug!("{} {} unavailable: {}", method, url, reason),
        }

        MethodResult::new(method, outcome)
    }
}

fn categorize_error(error: &reqwest::Error) -> Unavailable {
    if error.is_timeout() {
        Unavailable::Timeout
    } else if error.is_connect() {
        Unavailable::Connect
    } else {
        Unavailable::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn prober(timeout: Duration) -> Prober {
        Prober::new(Client::new(), Arc::new(Semaphore::new(4)), timeout)
    }

    #[tokio::test]
    async fn test_probe_reports_status_code() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/items", mock_server.uri())).unwrap();
        let result = prober(Duration::from_secs(5)).probe(&url, HttpMethod::Put).await;

        assert_eq!(result.method, HttpMethod::Put);
        assert_eq!(result.outcome, ProbeOutcome::Status(201));
    }

    #[tokio::test]
    async fn test_probe_treats_405_as_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let result = prober(Duration::from_secs(5)).probe(&url, HttpMethod::Delete).await;

        assert_eq!(
            result.outcome,
            ProbeOutcome::Unavailable(Unavailable::MethodNotAllowed)
        );
        assert!(!result.is_available());
    }

    #[tokio::test]
    async fn test_probe_counts_server_errors_as_available() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let result = prober(Duration::from_secs(5)).probe(&url, HttpMethod::Patch).await;

        assert_eq!(result.status(), Some(500));
    }

    #[tokio::test]
    async fn test_probe_sends_no_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        prober(Duration::from_secs(5)).probe(&url, HttpMethod::Post).await;

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_probe_times_out_as_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let result = prober(Duration::from_millis(200)).probe(&url, HttpMethod::Get).await;

        assert_eq!(result.outcome, ProbeOutcome::Unavailable(Unavailable::Timeout));
    }

    #[tokio::test]
    async fn test_probe_connection_refused_is_unavailable() {
        // Bind then drop a listener to get a port with nothing behind it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let result = prober(Duration::from_secs(5)).probe(&url, HttpMethod::Options).await;

        assert!(!result.is_available());
    }
}
