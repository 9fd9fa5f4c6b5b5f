//! Running-balance arithmetic on `users.pending_amount`.
//!
//! Each function is a single read-modify-write against the users table.
//! Callers run these after persisting the order/recovery row; the two
//! writes share no transaction, so a failure here leaves the already
//! committed row in place and the derived balance to be reconciled out
//! of band.

use crate::error::{ComputeError, Result};
use model::entities::user;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use tracing::{info, instrument};

/// Add a newly placed order's pending amount to the shopkeeper's
/// running balance. Returns the new balance.
#[instrument(skip(db))]
pub async fn charge_shopkeeper<C: ConnectionTrait>(
    db: &C,
    shopkeeper_id: i32,
    amount: Decimal,
) -> Result<Decimal> {
    adjust_balance(db, shopkeeper_id, amount).await
}

/// Subtract a collected payment (recovery or order payment) from the
/// shopkeeper's running balance. Returns the new balance.
#[instrument(skip(db))]
pub async fn credit_shopkeeper<C: ConnectionTrait>(
    db: &C,
    shopkeeper_id: i32,
    amount: Decimal,
) -> Result<Decimal> {
    adjust_balance(db, shopkeeper_id, -amount).await
}

async fn adjust_balance<C: ConnectionTrait>(
    db: &C,
    shopkeeper_id: i32,
    delta: Decimal,
) -> Result<Decimal> {
    let shopkeeper = user::Entity::find_by_id(shopkeeper_id)
        .one(db)
        .await?
        .ok_or(ComputeError::UserNotFound(shopkeeper_id))?;

    let new_balance = shopkeeper.pending_amount + delta;

    let mut active: user::ActiveModel = shopkeeper.into();
    active.pending_amount = Set(new_balance);
    active.update(db).await?;

    info!(shopkeeper_id, %delta, %new_balance, "Shopkeeper balance adjusted");
    Ok(new_balance)
}
