//! HTTP client for the analytics backend
//!
//! Thin typed wrapper over the backend's REST API. Every method returns
//! the domain payload; status and decode failures are folded into
//! [`Error::Api`] so callers can apply their own recovery policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::layout::LayoutCell;

use super::types::{
    AnomaliesResponse, AnomalyRecord, CategoriesResponse, ChatResponse, ForecastResponse,
    LayoutTemplateResponse, LoginResponse, OptimizeLayoutRequest, OptimizeLayoutResponse,
    PerformanceResponse, ProductPair, ProductPairsResponse, RiskResponse, StockExchangesResponse,
    StockForecast, StockPerformance, SupplierRecommendation, SupplierRecommendationsResponse,
};
use super::{AnalyticsBackend, AuthBackend, LayoutBackend, RecommendationBackend};

/// Fixed system context prepended to every chat prompt. The user only
/// ever sees their own text; the preamble travels on the wire.
const CHAT_CONTEXT: &str = "You are a Smart Stock Decision Assistant (Chatbot) for the \
    Financial Director of a retail group, using the storepulse console. Respond clearly \
    and concisely using financial insight when needed.";

/// HTTP client for the analytics backend API
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    bearer: Option<String>,
}

impl ApiClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            bearer: None,
        })
    }

    /// Attach (or drop) the bearer token sent on authenticated calls.
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_header(&self) -> Result<Option<HeaderValue>> {
        match &self.bearer {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| Error::Config(format!("invalid bearer token: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.http_client.get(self.url(path)).query(query);
        if let Some(auth) = self.auth_header()? {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed: {}", e)))?;

        Self::decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let mut request = self.http_client.post(self.url(path)).json(body);
        if let Some(auth) = self.auth_header()? {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed: {}", e)))?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Api(format!("API error ({}): {}", status, error_text)))
        }
    }

    /// List the known stock exchange labels
    pub async fn stock_exchanges(&self) -> Result<Vec<String>> {
        let resp: StockExchangesResponse = self.get_json("/api/stock_exchanges", &[]).await?;
        Ok(resp.stock_exchanges)
    }

    /// List the known product categories
    pub async fn categories(&self) -> Result<Vec<String>> {
        let resp: CategoriesResponse = self.get_json("/api/categories", &[]).await?;
        Ok(resp.categories)
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .http_client
            .post(self.url("/api/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        // The backend answers rejected credentials with a 400/401 whose
        // body is still a LoginResponse; surface those as outcomes, not
        // transport errors.
        if status.is_success()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::BAD_REQUEST
        {
            response
                .json()
                .await
                .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Api(format!("API error ({}): {}", status, error_text)))
        }
    }
}

#[async_trait]
impl AnalyticsBackend for ApiClient {
    async fn chat(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest {
            prompt: String,
        }

        let full_prompt = format!("{}\n\nUser: {}\nAssistant:", CHAT_CONTEXT, prompt);
        let resp: ChatResponse = self
            .post_json(
                "/api/stock/chatbot",
                &ChatRequest {
                    prompt: full_prompt,
                },
            )
            .await?;
        Ok(resp.response)
    }

    async fn anomalies(&self, stock: &str) -> Result<Vec<AnomalyRecord>> {
        let resp: AnomaliesResponse = self
            .get_json("/api/stock/anomalies", &[("stock", stock.to_string())])
            .await?;
        Ok(resp.anomalies)
    }

    async fn performance(&self, stock: &str) -> Result<StockPerformance> {
        let resp: PerformanceResponse = self
            .get_json("/api/stock/performance", &[("stock", stock.to_string())])
            .await?;
        Ok(resp.performance)
    }

    async fn forecast(&self, stock: &str) -> Result<StockForecast> {
        let resp: ForecastResponse = self
            .get_json("/api/stock/forecast", &[("stock", stock.to_string())])
            .await?;
        Ok(resp.forecast)
    }

    async fn risk(&self, stock: &str) -> Result<f64> {
        let resp: RiskResponse = self
            .get_json("/api/stock/risk", &[("stock", stock.to_string())])
            .await?;
        Ok(resp.var_1day_95pct)
    }
}

#[async_trait]
impl LayoutBackend for ApiClient {
    async fn generate_layout(
        &self,
        width: f64,
        height: f64,
        cell_size: f64,
    ) -> Result<LayoutTemplateResponse> {
        self.get_json(
            "/api/generate_layout_template",
            &[
                ("width", width.to_string()),
                ("height", height.to_string()),
                ("cell_size", cell_size.to_string()),
            ],
        )
        .await
    }

    async fn optimize_layout(
        &self,
        grid: &[Vec<LayoutCell>],
        rows: usize,
        cols: usize,
        cell_size: f64,
    ) -> Result<Vec<Vec<LayoutCell>>> {
        let request = OptimizeLayoutRequest {
            grid,
            rows,
            cols,
            cell_size,
        };
        let resp: OptimizeLayoutResponse = self.post_json("/api/optimize_layout", &request).await?;
        Ok(resp.grid)
    }
}

#[async_trait]
impl RecommendationBackend for ApiClient {
    async fn recommend_suppliers(
        &self,
        category: &str,
        n: usize,
        preferred_country: &str,
    ) -> Result<Vec<SupplierRecommendation>> {
        let resp: SupplierRecommendationsResponse = self
            .get_json(
                "/api/recommend_suppliers",
                &[
                    ("category", category.to_string()),
                    ("n", n.to_string()),
                    ("preferred_country", preferred_country.to_string()),
                ],
            )
            .await?;
        Ok(resp.recommendations)
    }

    async fn recommend_product_pairs(&self, n: usize) -> Result<Vec<ProductPair>> {
        let resp: ProductPairsResponse = self
            .get_json("/api/recommend_product_pairs", &[("n", n.to_string())])
            .await?;
        Ok(resp.top_product_pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_valid_config() {
        let config = ApiConfig {
            base_url: "".to_string(),
            ..Default::default()
        };
        assert!(ApiClient::new(&config).is_err());
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:5000/".to_string(),
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url("/api/login"), "http://localhost:5000/api/login");
    }

    #[test]
    fn test_chat_context_is_prefixed() {
        // The displayed question never carries the preamble; the wire
        // prompt always does.
        let full = format!("{}\n\nUser: {}\nAssistant:", CHAT_CONTEXT, "How is ACME doing?");
        assert!(full.starts_with("You are a Smart Stock Decision Assistant"));
        assert!(full.contains("User: How is ACME doing?"));
    }
}
