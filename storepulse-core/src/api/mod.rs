//! Analytics backend API
//!
//! The backend owns every actual computation (anomaly detection,
//! forecasting, recommendation scoring, layout optimization); this module
//! only speaks its HTTP protocol. Each consumer seam is an async trait so
//! the session, dispatcher, layout model, and recommendation panels can be
//! tested against in-memory fakes.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{
    AnomalyRecord, LayoutTemplateResponse, LoginResponse, ProductPair, StockForecast,
    StockPerformance, SupplierRecommendation,
};

use async_trait::async_trait;

use crate::error::Result;
use crate::layout::LayoutCell;

/// Login endpoint seam
#[async_trait]
pub trait AuthBackend {
    /// Exchange credentials for a bearer token.
    ///
    /// Rejected credentials come back as a `LoginResponse` with
    /// `success == false`; only transport faults are errors.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;
}

/// Finance analytics seams consumed by the query dispatcher
#[async_trait]
pub trait AnalyticsBackend {
    async fn chat(&self, prompt: &str) -> Result<String>;
    async fn anomalies(&self, stock: &str) -> Result<Vec<AnomalyRecord>>;
    async fn performance(&self, stock: &str) -> Result<StockPerformance>;
    async fn forecast(&self, stock: &str) -> Result<StockForecast>;
    async fn risk(&self, stock: &str) -> Result<f64>;
}

/// Layout generation/optimization seam consumed by the grid model
#[async_trait]
pub trait LayoutBackend {
    async fn generate_layout(
        &self,
        width: f64,
        height: f64,
        cell_size: f64,
    ) -> Result<LayoutTemplateResponse>;

    async fn optimize_layout(
        &self,
        grid: &[Vec<LayoutCell>],
        rows: usize,
        cols: usize,
        cell_size: f64,
    ) -> Result<Vec<Vec<LayoutCell>>>;
}

/// Recommendation seams consumed by the supplier and sales panels
#[async_trait]
pub trait RecommendationBackend {
    async fn recommend_suppliers(
        &self,
        category: &str,
        n: usize,
        preferred_country: &str,
    ) -> Result<Vec<SupplierRecommendation>>;

    async fn recommend_product_pairs(&self, n: usize) -> Result<Vec<ProductPair>>;
}
