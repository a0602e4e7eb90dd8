//! Exchange rates looked up through an OpenAI-compatible chat completions API
//! with structured JSON output.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::{strip_code_fence, with_retry};
use crate::core::config::AiProviderConfig;
use crate::core::currency::RatePair;
use crate::core::rates::{RateProvider, RateTable};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const RETRY_DELAY_MS: u64 = 500;

const SYSTEM_PROMPT: &str =
    "You are a financial data assistant. Answer only with the requested JSON object.";

pub struct AiRateProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    retries: usize,
}

impl AiRateProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, retries: usize) -> Self {
        AiRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            retries,
        }
    }

    pub fn from_config(config: &AiProviderConfig) -> Self {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            debug!(
                env = %config.api_key_env,
                "No API key configured, sending unauthenticated requests"
            );
        }
        Self::new(&config.base_url, &config.model, api_key, config.retries)
    }

    fn request_body(&self) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt() },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "exchange_rates",
                    "strict": true,
                    "schema": rate_schema(),
                },
            },
        })
    }
}

fn build_prompt() -> String {
    let mut prompt = String::from("Look up the current market exchange rates for:\n");
    for pair in RatePair::ALL {
        prompt.push_str(&format!(
            "- {} to {} ({} to {}), as {}\n",
            pair.base(),
            pair.quote(),
            pair.base().name(),
            pair.quote().name(),
            pair.key()
        ));
    }
    prompt.push_str("Return the exact current quotes from the financial markets.");
    prompt
}

fn rate_schema() -> Value {
    let properties: Map<String, Value> = RatePair::ALL
        .iter()
        .map(|pair| {
            let description = format!("Price of one {} in {}", pair.base(), pair.quote());
            (
                pair.key().to_string(),
                json!({ "type": "number", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = RatePair::ALL.iter().map(|pair| pair.key()).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateQuotes {
    #[serde(rename = "USDBRL")]
    usd_brl: Option<f64>,
    #[serde(rename = "EURBRL")]
    eur_brl: Option<f64>,
    #[serde(rename = "EURUSD")]
    eur_usd: Option<f64>,
    #[serde(rename = "USDEUR")]
    usd_eur: Option<f64>,
}

impl RateQuotes {
    fn get(&self, pair: RatePair) -> Option<f64> {
        match pair {
            RatePair::UsdBrl => self.usd_brl,
            RatePair::EurBrl => self.eur_brl,
            RatePair::EurUsd => self.eur_usd,
            RatePair::UsdEur => self.usd_eur,
        }
    }

    fn into_table(self) -> RateTable {
        let mut table = RateTable::new();
        for pair in RatePair::ALL {
            if let Some(rate) = self.get(pair) {
                table.insert(pair, rate);
            }
        }
        table
    }
}

fn parse_rates(content: &str) -> Result<RateTable> {
    let quotes: RateQuotes = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| anyhow!("Failed to parse exchange rates from model output: {}", e))?;
    Ok(quotes.into_table())
}

#[async_trait]
impl RateProvider for AiRateProvider {
    #[instrument(
        name = "AiRateFetch",
        skip(self),
        fields(model = %self.model)
    )]
    async fn fetch_rates(&self) -> Result<RateTable> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("cambio/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let body = self.request_body();

        let client = &client;
        let body = &body;
        let url_ref = url.as_str();
        let api_key = self.api_key.as_deref();
        let response = with_retry(
            move || async move {
                let mut request = client.post(url_ref).json(body);
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }
                request.send().await?.error_for_status()
            },
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| anyhow!("Exchange rate request failed: {} URL: {}", e, url))?;

        let text = response.text().await?;
        let data: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse chat completion response: {}", e))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("No exchange rate content in response"))?;
        debug!(%content, "Received exchange rates");

        parse_rates(&content)
    }
}
