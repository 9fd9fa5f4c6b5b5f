use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Referenced product does not exist or is inactive
    #[error("Product {0} not found")]
    ProductNotFound(i32),

    /// Not enough stock to cover the requested quantity
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i32,
        requested: i32,
        available: i32,
    },

    /// Quantities must be strictly positive
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i32, quantity: i32 },

    /// Referenced user does not exist
    #[error("User {0} not found")]
    UserNotFound(i32),

    /// Error from amount arithmetic or validation
    #[error("Amount error: {0}")]
    Amount(String),
}

impl ComputeError {
    /// True for errors the caller can correct (400-class), as opposed
    /// to database failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ComputeError::Database(_))
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
