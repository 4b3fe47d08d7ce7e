//! Stripe checkout integration.
//!
//! Payment collection is delegated entirely to Stripe Checkout: the server
//! creates a hosted session and hands the session URL back to the client.
//! Secrets are handled via `secrecy::SecretString`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider misconfigured: {0}")]
    Misconfigured(&'static str),

    #[error("Payment provider unreachable: {0}")]
    Network(String),

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    secret_key: SecretString,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    /// Create configuration from the `STRIPE_SECRET_KEY` environment variable.
    pub fn from_env() -> Result<Self, PaymentError> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Misconfigured("STRIPE_SECRET_KEY"))?;

        Ok(Self {
            secret_key: SecretString::new(secret_key),
            api_base_url: "https://api.stripe.com".to_string(),
        })
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// One purchasable item in a checkout session.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub name: String,
    pub amount_cents: i64,
    pub quantity: u32,
}

/// A hosted checkout session created by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

pub struct StripeClient {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a one-time payment checkout session for the given items.
    ///
    /// The user id rides along in session metadata so a later reconciliation
    /// job can attribute completed payments.
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        items: &[LineItem],
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let params = checkout_form_params(user_id, items)?;

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(format!("Failed to parse Stripe response: {}", e)))?;

        Ok(session)
    }
}

/// Convert a decimal price to integer minor units (cents).
pub fn price_to_cents(price: Decimal) -> Result<i64, PaymentError> {
    if price < Decimal::ZERO {
        return Err(PaymentError::InvalidAmount(
            "Price cannot be negative".to_string(),
        ));
    }
    (price * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| PaymentError::InvalidAmount(format!("Price out of range: {}", price)))
}

/// Build the form-encoded parameter list for a checkout session request.
fn checkout_form_params(
    user_id: Uuid,
    items: &[LineItem],
) -> Result<Vec<(String, String)>, PaymentError> {
    if items.is_empty() {
        return Err(PaymentError::InvalidAmount(
            "Checkout requires at least one item".to_string(),
        ));
    }

    let checkout = &config::config().checkout;
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), checkout.success_url.clone()),
        ("cancel_url".to_string(), checkout.cancel_url.clone()),
        ("metadata[user_id]".to_string(), user_id.to_string()),
    ];

    for (i, item) in items.iter().enumerate() {
        if item.amount_cents <= 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "Item '{}' has a non-positive amount",
                item.name
            )));
        }
        params.push((
            format!("line_items[{}][price_data][currency]", i),
            checkout.currency.clone(),
        ));
        params.push((
            format!("line_items[{}][price_data][unit_amount]", i),
            item.amount_cents.to_string(),
        ));
        params.push((
            format!("line_items[{}][price_data][product_data][name]", i),
            item.name.clone(),
        ));
        params.push((
            format!("line_items[{}][quantity]", i),
            item.quantity.to_string(),
        ));
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lookup<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    // Single test: STRIPE_SECRET_KEY is process-global and tests run in parallel
    #[test]
    fn config_comes_from_env() {
        std::env::remove_var("STRIPE_SECRET_KEY");
        assert!(matches!(
            StripeConfig::from_env(),
            Err(PaymentError::Misconfigured("STRIPE_SECRET_KEY"))
        ));

        std::env::set_var("STRIPE_SECRET_KEY", "sk_test_123");
        let config = StripeConfig::from_env()
            .unwrap()
            .with_base_url("http://localhost:12111");
        assert_eq!(config.api_base_url, "http://localhost:12111");
        std::env::remove_var("STRIPE_SECRET_KEY");
    }

    #[test]
    fn cents_conversion_rounds_to_minor_units() {
        assert_eq!(price_to_cents(dec!(1250.00)).unwrap(), 125000);
        assert_eq!(price_to_cents(dec!(19.99)).unwrap(), 1999);
        assert_eq!(price_to_cents(dec!(0.005)).unwrap(), 0);
        assert!(price_to_cents(dec!(-1)).is_err());
    }

    #[test]
    fn form_params_describe_one_time_payment() {
        let user_id = Uuid::new_v4();
        let items = vec![
            LineItem {
                name: "Sunset Over Water".to_string(),
                amount_cents: 125000,
                quantity: 1,
            },
            LineItem {
                name: "Blue Study".to_string(),
                amount_cents: 48000,
                quantity: 1,
            },
        ];
        let params = checkout_form_params(user_id, &items).unwrap();

        assert_eq!(lookup(&params, "mode"), Some("payment"));
        assert_eq!(
            lookup(&params, "metadata[user_id]"),
            Some(user_id.to_string().as_str())
        );
        assert_eq!(
            lookup(&params, "line_items[0][price_data][unit_amount]"),
            Some("125000")
        );
        assert_eq!(
            lookup(&params, "line_items[1][price_data][product_data][name]"),
            Some("Blue Study")
        );
        assert_eq!(lookup(&params, "line_items[1][quantity]"), Some("1"));
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let err = checkout_form_params(Uuid::new_v4(), &[]).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidAmount(_)));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let items = vec![LineItem {
            name: "Free Sketch".to_string(),
            amount_cents: 0,
            quantity: 1,
        }];
        let err = checkout_form_params(Uuid::new_v4(), &items).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidAmount(_)));
    }
}
