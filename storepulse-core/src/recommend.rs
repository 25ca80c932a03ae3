//! Supplier and sales recommendation panels
//!
//! Each panel owns its last-fetched rows and a single-flight guard. A
//! failed fetch degrades to a placeholder row instead of surfacing an
//! error; the panels are informational and must never block the console.

use crate::api::{ProductPair, RecommendationBackend, SupplierRecommendation};
use crate::config::RecommendConfig;
use crate::types::RequestState;

/// What a panel refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOutcome {
    /// Rows replaced with fresh data
    Updated,
    /// The fetch failed; rows replaced with a placeholder
    Degraded,
    /// Missing selection or zero count; nothing happened
    Skipped,
    /// A fetch is already in flight; nothing happened
    Busy,
}

/// Supplier recommendations for a selected category.
pub struct SupplierPanel<B: RecommendationBackend> {
    backend: B,
    count: usize,
    preferred_country: String,
    state: RequestState,
    rows: Vec<SupplierRecommendation>,
}

impl<B: RecommendationBackend> SupplierPanel<B> {
    pub fn new(backend: B, config: &RecommendConfig) -> Self {
        Self {
            backend,
            count: config.suppliers,
            preferred_country: config.preferred_country.clone(),
            state: RequestState::Idle,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[SupplierRecommendation] {
        &self.rows
    }

    /// Fetch recommendations for a category. A blank category is a
    /// no-op, mirroring an unset dropdown.
    pub async fn refresh(&mut self, category: &str) -> PanelOutcome {
        if self.state == RequestState::InFlight {
            return PanelOutcome::Busy;
        }
        let category = category.trim();
        if category.is_empty() {
            return PanelOutcome::Skipped;
        }

        self.state = RequestState::InFlight;
        let result = self
            .backend
            .recommend_suppliers(category, self.count, &self.preferred_country)
            .await;
        self.state = RequestState::Idle;

        match result {
            Ok(rows) => {
                self.rows = rows;
                PanelOutcome::Updated
            }
            Err(e) => {
                tracing::warn!(category, error = %e, "Failed to load supplier recommendations");
                self.rows = vec![SupplierRecommendation::placeholder()];
                PanelOutcome::Degraded
            }
        }
    }
}

/// Top co-purchase product pairs.
pub struct SalesPanel<B: RecommendationBackend> {
    backend: B,
    state: RequestState,
    rows: Vec<ProductPair>,
}

impl<B: RecommendationBackend> SalesPanel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: RequestState::Idle,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[ProductPair] {
        &self.rows
    }

    /// Fetch the top `count` product pairs. A zero count is a no-op.
    pub async fn refresh(&mut self, count: usize) -> PanelOutcome {
        if self.state == RequestState::InFlight {
            return PanelOutcome::Busy;
        }
        if count == 0 {
            return PanelOutcome::Skipped;
        }

        self.state = RequestState::InFlight;
        let result = self.backend.recommend_product_pairs(count).await;
        self.state = RequestState::Idle;

        match result {
            Ok(rows) => {
                self.rows = rows;
                PanelOutcome::Updated
            }
            Err(e) => {
                tracing::warn!(count, error = %e, "Failed to load product pair recommendations");
                self.rows = vec![ProductPair::placeholder()];
                PanelOutcome::Degraded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeRecommender {
        suppliers: Option<Vec<SupplierRecommendation>>,
        pairs: Option<Vec<ProductPair>>,
    }

    #[async_trait]
    impl RecommendationBackend for FakeRecommender {
        async fn recommend_suppliers(
            &self,
            _category: &str,
            _n: usize,
            _preferred_country: &str,
        ) -> Result<Vec<SupplierRecommendation>> {
            self.suppliers
                .clone()
                .ok_or_else(|| Error::Api("recommender down".to_string()))
        }

        async fn recommend_product_pairs(&self, _n: usize) -> Result<Vec<ProductPair>> {
            self.pairs
                .clone()
                .ok_or_else(|| Error::Api("recommender down".to_string()))
        }
    }

    fn supplier(name: &str) -> SupplierRecommendation {
        SupplierRecommendation {
            supplier_name: name.to_string(),
            country: "France".to_string(),
            avg_supplier_price: Some(10.0),
            has_disputes: Some("No Disputes".to_string()),
            number_of_transactions: Some(12),
        }
    }

    #[tokio::test]
    async fn test_supplier_panel_updates_rows() {
        let backend = FakeRecommender {
            suppliers: Some(vec![supplier("Delice"), supplier("Vitalait")]),
            ..Default::default()
        };
        let mut panel = SupplierPanel::new(backend, &RecommendConfig::default());

        assert_eq!(panel.refresh("Beverages").await, PanelOutcome::Updated);
        assert_eq!(panel.rows().len(), 2);
        assert_eq!(panel.rows()[0].supplier_name, "Delice");
    }

    #[tokio::test]
    async fn test_supplier_panel_degrades_on_failure() {
        let mut panel =
            SupplierPanel::new(FakeRecommender::default(), &RecommendConfig::default());

        assert_eq!(panel.refresh("Beverages").await, PanelOutcome::Degraded);
        assert_eq!(panel.rows().len(), 1);
        assert_eq!(panel.rows()[0].supplier_name, "Error loading data");
    }

    #[tokio::test]
    async fn test_supplier_panel_blank_category_is_a_no_op() {
        let mut panel =
            SupplierPanel::new(FakeRecommender::default(), &RecommendConfig::default());

        assert_eq!(panel.refresh("  ").await, PanelOutcome::Skipped);
        assert!(panel.rows().is_empty());
    }

    #[tokio::test]
    async fn test_sales_panel_zero_count_is_a_no_op() {
        let mut panel = SalesPanel::new(FakeRecommender::default());
        assert_eq!(panel.refresh(0).await, PanelOutcome::Skipped);
        assert!(panel.rows().is_empty());
    }

    #[tokio::test]
    async fn test_sales_panel_degrades_on_failure() {
        let mut panel = SalesPanel::new(FakeRecommender::default());
        assert_eq!(panel.refresh(5).await, PanelOutcome::Degraded);
        assert_eq!(panel.rows()[0].product1_name, "Error loading data");
    }
}
