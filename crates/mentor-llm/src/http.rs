use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_MIN_DELAY: Duration = Duration::from_millis(100);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Plain client with a connect timeout. Overall deadlines are applied per call.
pub fn base_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|error| {
            log::warn!("Falling back to default HTTP client: {}", error);
            Client::new()
        })
}

/// Wraps `client` with transient-failure retries: exponential backoff between
/// 100ms and 5s, at most `max_retries` attempts after the first.
pub fn retrying_client(client: Client, max_retries: u32) -> ClientWithMiddleware {
    let backoff = ExponentialBackoff::builder()
        .retry_bounds(RETRY_MIN_DELAY, RETRY_MAX_DELAY)
        .build_with_max_retries(max_retries);
    let retries = RetryTransientMiddleware::new_with_policy(backoff);

    ClientBuilder::new(client).with(retries).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn retries_transient_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = retrying_client(Client::new(), 3);
        let response = client
            .get(format!("{}/flaky", server.uri()))
            .send()
            .await
            .expect("request should eventually succeed");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = retrying_client(Client::new(), 3);
        let response = client
            .get(format!("{}/bad", server.uri()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
    }
}
