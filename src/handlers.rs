pub mod analytics;
pub mod assignments;
pub mod auth;
pub mod categories;
pub mod cities;
pub mod customer_orders;
pub mod distribution;
pub mod health;
pub mod notifications;
pub mod products;
pub mod receipts;
pub mod recoveries;
pub mod sales;
pub mod shopkeeper_orders;
pub mod shopkeepers;
pub mod users;
