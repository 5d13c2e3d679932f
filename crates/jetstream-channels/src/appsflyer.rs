//! AppsFlyer S2S in-app-event delivery transport.

use std::time::Duration;

use async_trait::async_trait;
use jetstream_core::config::AppsFlyerConfig;
use jetstream_core::traits::DeliveryTransport;
use jetstream_core::types::{DeliveryFailure, EventPayload};

/// Per-call delivery bound; a slow endpoint must not hold a tick
/// longer than this.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for `POST {endpoint}/{bundle}` with the dev key in the
/// `authentication` header.
pub struct AppsFlyerClient {
    endpoint: String,
    client: reqwest::Client,
}

impl AppsFlyerClient {
    pub fn new(config: &AppsFlyerConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn event_url(&self, bundle: &str) -> std::result::Result<reqwest::Url, DeliveryFailure> {
        let mut url = reqwest::Url::parse(&self.endpoint).map_err(|e| DeliveryFailure {
            status: None,
            message: format!("Invalid endpoint {}: {e}", self.endpoint),
        })?;
        url.path_segments_mut()
            .map_err(|_| DeliveryFailure {
                status: None,
                message: format!("Endpoint cannot take a path: {}", self.endpoint),
            })?
            .push(bundle);
        Ok(url)
    }
}

#[async_trait]
impl DeliveryTransport for AppsFlyerClient {
    async fn deliver(
        &self,
        bundle: &str,
        credential: &str,
        payload: &EventPayload,
    ) -> std::result::Result<(), DeliveryFailure> {
        let url = self.event_url(bundle)?;

        let response = self
            .client
            .post(url)
            .header("authentication", credential)
            .json(payload)
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await
            .map_err(|e| DeliveryFailure {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DeliveryFailure {
                status: Some(status.as_u16()),
                message: body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_url_appends_encoded_bundle() {
        let client = AppsFlyerClient::new(&AppsFlyerConfig::default());
        let url = client.event_url("com.example.app").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api2.appsflyer.com/inappevent/com.example.app"
        );

        let odd = client.event_url("com.example app").unwrap();
        assert_eq!(
            odd.as_str(),
            "https://api2.appsflyer.com/inappevent/com.example%20app"
        );
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = AppsFlyerClient::new(&AppsFlyerConfig {
            endpoint: "https://api2.appsflyer.com/inappevent/".into(),
        });
        let url = client.event_url("com.example.app").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api2.appsflyer.com/inappevent/com.example.app"
        );
    }
}
