//! Sequence-derived document numbers for orders and receipts.
//!
//! Numbers come from a row count at creation time (count + 1, zero
//! padded). There is no reservation step, so two concurrent creations
//! can observe the same count and collide on the unique column. This
//! mirrors the original numbering scheme on purpose.

use crate::error::Result;
use model::entities::{customer_order, receipt, shopkeeper_order};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

/// Next shopkeeper order number, e.g. `ORD-00042`.
pub async fn next_order_number<C: ConnectionTrait>(db: &C) -> Result<String> {
    let count = shopkeeper_order::Entity::find().count(db).await?;
    Ok(format!("ORD-{:05}", count + 1))
}

/// Next direct customer order number, e.g. `CORD-00007`.
pub async fn next_customer_order_number<C: ConnectionTrait>(db: &C) -> Result<String> {
    let count = customer_order::Entity::find().count(db).await?;
    Ok(format!("CORD-{:05}", count + 1))
}

/// Next receipt number, e.g. `RCP-00013`.
pub async fn next_receipt_number<C: ConnectionTrait>(db: &C) -> Result<String> {
    let count = receipt::Entity::find().count(db).await?;
    Ok(format!("RCP-{:05}", count + 1))
}
