//! Daraja (M-PESA) gateway client
//!
//! Two calls per initiation: an OAuth client-credentials exchange over HTTP
//! Basic, then the STK push itself with the bearer token. A non-200 push
//! response surfaces the gateway's own error message so the caller sees why
//! the prompt never reached the handset.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use portal_core::error::DomainError;
use portal_core::gateways::{PaymentGateway, StkPushAck, StkPushOrder};
use portal_shared::config::AppConfig;

const OAUTH_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

#[derive(Debug, Deserialize)]
struct OauthResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DarajaErrorResponse {
    #[serde(rename = "errorMessage", default)]
    error_message: String,
}

#[derive(Debug, Serialize)]
struct StkPushRequest<'a> {
    #[serde(rename = "BusinessShortCode")]
    business_short_code: u64,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "TransactionType")]
    transaction_type: &'static str,
    #[serde(rename = "Amount")]
    amount: u64,
    #[serde(rename = "PartyA")]
    party_a: u64,
    #[serde(rename = "PartyB")]
    party_b: u64,
    #[serde(rename = "PhoneNumber")]
    phone_number: u64,
    #[serde(rename = "CallBackURL")]
    callback_url: &'a str,
    #[serde(rename = "AccountReference")]
    account_reference: &'a str,
    #[serde(rename = "TransactionDesc")]
    transaction_desc: &'a str,
}

pub struct DarajaClient {
    http: Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    passkey: String,
    business_short_code: String,
    callback_url: String,
}

impl DarajaClient {
    pub fn new(
        base_url: String,
        consumer_key: String,
        consumer_secret: String,
        passkey: String,
        business_short_code: String,
        callback_url: String,
    ) -> Self {
        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            consumer_key,
            consumer_secret,
            passkey,
            business_short_code,
            callback_url,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.daraja_environment.base_url().to_string(),
            config.daraja_consumer_key.clone(),
            config.daraja_consumer_secret.clone(),
            config.daraja_passkey.clone(),
            config.daraja_business_short_code.clone(),
            config.daraja_callback_url.clone(),
        )
    }

    async fn access_token(&self) -> Result<String, DomainError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, OAUTH_PATH))
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .send()
            .await
            .map_err(|e| {
                error!("Daraja OAuth request failed: {}", e);
                DomainError::Upstream("Failed to reach the payment gateway".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Daraja OAuth rejected: {}", status);
            return Err(DomainError::Upstream(
                "Failed to authenticate with the payment gateway".to_string(),
            ));
        }

        let oauth: OauthResponse = response.json().await.map_err(|e| {
            error!("Daraja OAuth response unreadable: {}", e);
            DomainError::Upstream("Unexpected response from the payment gateway".to_string())
        })?;

        Ok(oauth.access_token)
    }
}

#[async_trait]
impl PaymentGateway for DarajaClient {
    async fn stk_push(&self, order: &StkPushOrder) -> Result<StkPushAck, DomainError> {
        let token = self.access_token().await?;

        let short_code: u64 = self.business_short_code.parse().map_err(|_| {
            DomainError::Internal("business short code is not numeric".to_string())
        })?;
        let phone: u64 = order.phone_number.parse().map_err(|_| {
            DomainError::Validation("Invalid phone number format".to_string())
        })?;

        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let password = BASE64.encode(format!(
            "{}{}{}",
            self.business_short_code, self.passkey, timestamp
        ));

        let request = StkPushRequest {
            business_short_code: short_code,
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount: order.amount,
            party_a: phone,
            party_b: short_code,
            phone_number: phone,
            callback_url: &self.callback_url,
            account_reference: &order.account_reference,
            transaction_desc: &order.description,
        };

        let response = self
            .http
            .post(format!("{}{}", self.base_url, STK_PUSH_PATH))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Daraja STK push request failed: {}", e);
                DomainError::Upstream("Failed to reach the payment gateway".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Daraja STK push rejected ({}): {}", status, body);
            let message = serde_json::from_str::<DarajaErrorResponse>(&body)
                .map(|e| e.error_message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Failed to initiate M-PESA payment".to_string());
            return Err(DomainError::Upstream(message));
        }

        let ack: StkPushAck = response.json().await.map_err(|e| {
            error!("Daraja STK push response unreadable: {}", e);
            DomainError::Upstream("Unexpected response from the payment gateway".to_string())
        })?;

        info!(
            "STK push accepted by gateway: checkout_request_id={}",
            ack.checkout_request_id
        );
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> DarajaClient {
        DarajaClient::new(
            base_url,
            "key".to_string(),
            "secret".to_string(),
            "passkey".to_string(),
            "174379".to_string(),
            "https://portal.example.com/mpesa/callback".to_string(),
        )
    }

    fn order() -> StkPushOrder {
        StkPushOrder {
            amount: 6000,
            phone_number: "254712345678".to_string(),
            account_reference: "PLT-17".to_string(),
            description: "Payment of Installment".to_string(),
        }
    }

    async fn mount_oauth(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/oauth/v1/generate"))
            .and(basic_auth("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "test-token",
                "expires_in": "3599"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn stk_push_carries_bearer_token_and_order_fields() {
        let server = MockServer::start().await;
        mount_oauth(&server).await;
        Mock::given(method("POST"))
            .and(path("/mpesa/stkpush/v1/processrequest"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "BusinessShortCode": 174379,
                "TransactionType": "CustomerPayBillOnline",
                "Amount": 6000,
                "PhoneNumber": 254712345678u64,
                "AccountReference": "PLT-17"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_1",
                "ResponseCode": "0",
                "ResponseDescription": "Success. Request accepted for processing",
                "CustomerMessage": "Success. Request accepted for processing"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client(server.uri()).stk_push(&order()).await.unwrap();
        assert_eq!(ack.checkout_request_id, "ws_CO_1");
        assert_eq!(ack.response_code, "0");
    }

    #[tokio::test]
    async fn gateway_rejection_surfaces_its_error_message() {
        let server = MockServer::start().await;
        mount_oauth(&server).await;
        Mock::given(method("POST"))
            .and(path("/mpesa/stkpush/v1/processrequest"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "requestId": "r-1",
                "errorCode": "500.001.1001",
                "errorMessage": "Unable to lock subscriber"
            })))
            .mount(&server)
            .await;

        let err = client(server.uri()).stk_push(&order()).await.unwrap_err();
        match err {
            DomainError::Upstream(msg) => assert_eq!(msg, "Unable to lock subscriber"),
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn oauth_failure_is_a_transient_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/v1/generate"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(server.uri()).stk_push(&order()).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream(_)));
    }
}
