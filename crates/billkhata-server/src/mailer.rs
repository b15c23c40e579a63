// SPDX-License-Identifier: Apache-2.0

//! Thin client for a hosted transactional-email API. Delivery is best
//! effort; failures are logged and never surface to the caller.

use serde_json::json;
use std::time::Duration;
use tracing::warn;

pub struct Mailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| format!("mailer http client: {e}"))?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) {
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": body,
        });
        let result = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(status = %response.status(), to = %to, "email send rejected");
            }
            Err(e) => {
                warn!(error = %e, to = %to, "email send failed");
            }
        }
    }
}
