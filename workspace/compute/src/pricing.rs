//! Order pricing: resolving line items against the catalog, validating
//! stock, and deriving commission and payment status. All arithmetic is
//! `rust_decimal`; nothing here writes to the database.

use crate::error::{ComputeError, Result};
use model::entities::product;
use model::entities::shopkeeper_order::PaymentStatus;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, EntityTrait};
use tracing::instrument;

/// Default commission percentage applied when a salesman has no
/// explicit rate configured.
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// A requested line item as submitted by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemInput {
    pub product_id: i32,
    pub quantity: i32,
    /// Overrides the catalog price when present.
    pub custom_price: Option<Decimal>,
}

/// A line item priced against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// The result of pricing a full item list.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub items: Vec<PricedItem>,
    pub total_amount: Decimal,
}

/// Price an item list against the current catalog. Rejects unknown or
/// inactive products, non-positive quantities and quantities exceeding
/// stock. Stock itself is not decremented here; that happens through
/// the dedicated stock endpoint.
#[instrument(skip(db))]
pub async fn price_items<C: ConnectionTrait>(
    db: &C,
    inputs: &[OrderItemInput],
) -> Result<PricedOrder> {
    if inputs.is_empty() {
        return Err(ComputeError::Amount("order has no items".to_string()));
    }

    let mut items = Vec::with_capacity(inputs.len());
    let mut total_amount = Decimal::ZERO;

    for input in inputs {
        if input.quantity <= 0 {
            return Err(ComputeError::InvalidQuantity {
                product_id: input.product_id,
                quantity: input.quantity,
            });
        }

        let product = product::Entity::find_by_id(input.product_id)
            .one(db)
            .await?
            .ok_or(ComputeError::ProductNotFound(input.product_id))?;

        if !product.is_active {
            return Err(ComputeError::ProductNotFound(input.product_id));
        }

        if product.stock < input.quantity {
            return Err(ComputeError::InsufficientStock {
                product_id: input.product_id,
                requested: input.quantity,
                available: product.stock,
            });
        }

        let unit_price = input.custom_price.unwrap_or(product.price);
        if unit_price < Decimal::ZERO {
            return Err(ComputeError::Amount(format!(
                "negative unit price for product {}",
                input.product_id
            )));
        }

        let total_price = unit_price * Decimal::from(input.quantity);
        total_amount += total_price;

        items.push(PricedItem {
            product_id: input.product_id,
            quantity: input.quantity,
            unit_price,
            total_price,
        });
    }

    Ok(PricedOrder {
        items,
        total_amount,
    })
}

/// Commission owed to the salesman: `total * rate / 100`, with the
/// default rate when none is configured.
pub fn commission_for(total_amount: Decimal, commission_rate: Option<Decimal>) -> Decimal {
    let rate = commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE);
    total_amount * rate / Decimal::ONE_HUNDRED
}

/// Derive the order's own pending amount and payment status from what
/// was paid up front. Paid iff fully covered, partial iff anything but
/// not everything was paid, pending otherwise.
pub fn derive_payment(total_amount: Decimal, amount_paid: Decimal) -> (Decimal, PaymentStatus) {
    let pending = total_amount - amount_paid;
    let status = if amount_paid >= total_amount {
        PaymentStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    };
    (pending, status)
}
