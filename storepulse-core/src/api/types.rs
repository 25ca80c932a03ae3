//! Wire types for the analytics backend API
//!
//! Field names mirror the backend payloads exactly; the backend keys are
//! PascalCase for the analytics endpoints and snake_case elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::layout::LayoutCell;

/// Response from POST /api/login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Whether the credentials were accepted
    pub success: bool,
    /// Bearer token, present on success
    #[serde(default)]
    pub access_token: Option<String>,
    /// Human-readable rejection message, present on failure
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from POST /api/stock/chatbot
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Mongo extended-JSON date wrapper (`{"$date": ...}`) used by the
/// anomaly records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MongoDate {
    #[serde(rename = "$date")]
    pub value: DateTime<Utc>,
}

/// One detected anomaly for a stock
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyRecord {
    #[serde(rename = "SEDate")]
    pub se_date: MongoDate,
    #[serde(rename = "LastPrice")]
    pub last_price: f64,
    #[serde(rename = "TradingVolume")]
    pub trading_volume: f64,
    #[serde(rename = "Reason")]
    pub reason: String,
}

/// Response from GET /api/stock/anomalies
#[derive(Debug, Deserialize)]
pub struct AnomaliesResponse {
    pub anomalies: Vec<AnomalyRecord>,
}

/// Performance metrics for a stock
#[derive(Debug, Clone, Deserialize)]
pub struct StockPerformance {
    #[serde(rename = "AverageReturn")]
    pub average_return: f64,
    #[serde(rename = "Volatility")]
    pub volatility: f64,
    #[serde(rename = "Trend")]
    pub trend: String,
}

/// Response from GET /api/stock/performance
#[derive(Debug, Deserialize)]
pub struct PerformanceResponse {
    pub performance: StockPerformance,
}

/// Seven-day forecast for a stock
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StockForecast {
    #[serde(rename = "PredictedChange")]
    pub predicted_change: f64,
    #[serde(rename = "Confidence")]
    pub confidence: f64,
}

/// Response from GET /api/stock/forecast
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub forecast: StockForecast,
}

/// Response from GET /api/stock/risk
#[derive(Debug, Deserialize)]
pub struct RiskResponse {
    /// 1-day value at risk at 95% confidence, in percent
    #[serde(rename = "VaR_1day_95pct")]
    pub var_1day_95pct: f64,
}

/// Response from GET /api/stock_exchanges
#[derive(Debug, Deserialize)]
pub struct StockExchangesResponse {
    pub stock_exchanges: Vec<String>,
}

/// Response from GET /api/categories
#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// One recommended supplier for a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecommendation {
    #[serde(rename = "SupplierName")]
    pub supplier_name: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "AvgSupplierPrice")]
    pub avg_supplier_price: Option<f64>,
    /// "Has Disputes" / "No Disputes" on the wire
    #[serde(rename = "HasDisputes")]
    pub has_disputes: Option<String>,
    #[serde(rename = "NumberOfTransactions")]
    pub number_of_transactions: Option<i64>,
}

impl SupplierRecommendation {
    /// Placeholder row shown when the recommendation call fails.
    pub fn placeholder() -> Self {
        Self {
            supplier_name: "Error loading data".to_string(),
            country: "-".to_string(),
            avg_supplier_price: None,
            has_disputes: None,
            number_of_transactions: None,
        }
    }
}

/// Response from GET /api/recommend_suppliers
#[derive(Debug, Deserialize)]
pub struct SupplierRecommendationsResponse {
    pub recommendations: Vec<SupplierRecommendation>,
}

/// One co-purchase product pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPair {
    pub product1_name: String,
    pub product2_name: String,
    pub score: Option<f64>,
}

impl ProductPair {
    /// Placeholder row shown when the recommendation call fails.
    pub fn placeholder() -> Self {
        Self {
            product1_name: "Error loading data".to_string(),
            product2_name: "-".to_string(),
            score: None,
        }
    }
}

/// Response from GET /api/recommend_product_pairs
#[derive(Debug, Deserialize)]
pub struct ProductPairsResponse {
    pub top_product_pairs: Vec<ProductPair>,
}

/// Response from GET /api/generate_layout_template
#[derive(Debug, Deserialize)]
pub struct LayoutTemplateResponse {
    pub grid: Vec<Vec<LayoutCell>>,
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f64,
}

/// Request body for POST /api/optimize_layout
#[derive(Debug, Serialize)]
pub struct OptimizeLayoutRequest<'a> {
    pub grid: &'a [Vec<LayoutCell>],
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f64,
}

/// Response from POST /api/optimize_layout
#[derive(Debug, Deserialize)]
pub struct OptimizeLayoutResponse {
    pub grid: Vec<Vec<LayoutCell>>,
}
