use crate::range::DateRange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-shopkeeper ledger row merged in memory from the orders,
/// recoveries and receipts queries. Each source query sees its own
/// snapshot; the merge offers no cross-collection consistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopkeeperLedgerRow {
    pub shopkeeper_id: i32,
    pub shopkeeper_name: String,
    /// Sum of order totals in the range.
    pub ordered: Decimal,
    /// Amount paid at order time.
    pub paid_at_order: Decimal,
    /// Sum of recoveries in the range.
    pub recovered: Decimal,
    /// Sum of receipt amounts in the range.
    pub receipted: Decimal,
    /// ordered - paid_at_order - recovered.
    pub outstanding: Decimal,
}

/// Range-wide totals plus the per-shopkeeper breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSummary {
    pub range: DateRange,
    pub revenue: Decimal,
    pub outstanding: Decimal,
    pub commission: Decimal,
    pub recovered: Decimal,
    pub order_count: u64,
    pub rows: Vec<ShopkeeperLedgerRow>,
}

/// Commission earned by one salesman over a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommissionSummary {
    pub salesman_id: i32,
    pub range: DateRange,
    pub order_count: u64,
    pub total_sales: Decimal,
    pub commission: Decimal,
}

/// One row of the admin distribution overview: a salesman and the
/// aggregate state of the shopkeepers assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesmanOverviewRow {
    pub salesman_id: i32,
    pub salesman_name: String,
    pub shopkeeper_count: u64,
    pub order_count: u64,
    pub total_sales: Decimal,
    pub outstanding: Decimal,
    pub commission: Decimal,
}
