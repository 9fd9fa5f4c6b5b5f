//! Common transport-layer types shared between the backend crates.
//! The analytics and dashboard handlers return these shapes, and the
//! compute crate produces them, so they live here rather than in either.

mod analytics;
mod range;

pub use analytics::{
    AnalyticsSummary, CommissionSummary, SalesmanOverviewRow, ShopkeeperLedgerRow,
};
pub use range::DateRange;
