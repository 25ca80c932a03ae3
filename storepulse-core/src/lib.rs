//! # storepulse-core
//!
//! Core library for storepulse - a retail analytics console client.
//!
//! This library provides:
//! - Two-tier bearer-token storage and the session claims lifecycle
//! - Role-gated access decisions for protected views
//! - The multi-modal query dispatcher with typed response formatting
//!   and chat fallback recovery
//! - The store layout grid model (generate, edit, optimize)
//! - A typed HTTP client for the analytics backend
//! - Configuration management and logging infrastructure
//!
//! All actual analytics (anomaly detection, forecasting, recommendation
//! scoring, layout optimization) run on the backend; this crate only
//! authenticates, dispatches, and formats.
//!
//! ## Example
//!
//! ```rust,no_run
//! use storepulse_core::{ApiClient, Config, FileTokenStore, Session};
//!
//! let config = Config::load().expect("failed to load config");
//! let session = Session::new(FileTokenStore::at_default_paths());
//! let client = ApiClient::new(&config.api)
//!     .expect("failed to create client")
//!     .with_bearer(session.token());
//! ```

// Re-export commonly used items at the crate root
pub use access::{authorize, AccessDecision};
pub use api::ApiClient;
pub use config::Config;
pub use dispatch::{Dispatcher, DispatchState, QueryMode, SubmitOutcome};
pub use error::{Error, Result};
pub use layout::{LayoutCell, LayoutGrid, LayoutModel, LayoutSnapshot, ZoneType};
pub use recommend::{PanelOutcome, SalesPanel, SupplierPanel};
pub use session::{login, LoginOutcome, Session};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::*;

// Public modules
pub mod access;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod layout;
pub mod logging;
pub mod recommend;
pub mod session;
pub mod token;
pub mod types;
