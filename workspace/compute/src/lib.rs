pub mod analytics;
pub mod balance;
pub mod error;
pub mod numbering;
pub mod pricing;

pub use error::{ComputeError, Result};
pub use pricing::{
    commission_for, derive_payment, price_items, OrderItemInput, PricedItem, PricedOrder,
    DEFAULT_COMMISSION_RATE,
};
