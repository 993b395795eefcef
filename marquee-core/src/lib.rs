//! # Marquee Core
//!
//! State coordination between a UI and a cookie/session based media catalog.
//!
//! ## Overview
//!
//! - **Session**: one authoritative auth state with throttled re-validation
//!   and failure-triggered recovery ([`session::SessionCoordinator`])
//! - **Discovery**: a debounced, paginated search/discover pipeline that
//!   never lets a stale response overwrite a fresh one
//!   ([`discovery::DiscoveryPipeline`])
//! - **Filters**: persisted query facets ([`filters::FilterState`])
//! - **Catalog**: the capability everything above talks through
//!   ([`catalog::CatalogClient`])
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use marquee_core::{
//!     catalog::CatalogClient,
//!     discovery::{DiscoveryPipeline, DiscoverySettings},
//!     filters::FilterState,
//!     session::{SessionCoordinator, SessionSettings},
//!     testing::StubCatalog,
//! };
//!
//! # async fn demo() {
//! let client: Arc<dyn CatalogClient> = Arc::new(StubCatalog::new());
//! let session =
//!     SessionCoordinator::with_client(SessionSettings::default(), client.clone());
//! let pipeline = DiscoveryPipeline::spawn(
//!     client,
//!     session,
//!     FilterState::default(),
//!     DiscoverySettings::default(),
//! );
//!
//! pipeline.set_search_text("heat").await;
//! let snapshot = pipeline.settled().await;
//! println!("{} results", snapshot.primary.items.len());
//! pipeline.shutdown().await;
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Catalog capability, wire types and the HTTP client
pub mod catalog;

/// Search/discover pipeline actor and trending feed
pub mod discovery;

/// Error types
pub mod error;

/// Query facets and their persistence
pub mod filters;

/// Per-list pagination cursor
pub mod paging;

/// Session state and coordination
pub mod session;

/// Programmable test doubles
pub mod testing;

pub use error::{CatalogError, CatalogResult};
