//! Root for all SeaORM entity modules of the order/distribution domain:
//! users (all four roles in one table), the product catalog, the two order
//! variants with their line items, recoveries, receipts, notifications and
//! the salesman/shopkeeper assignment table.

pub mod assignment;
pub mod category;
pub mod city;
pub mod customer_order;
pub mod customer_order_item;
pub mod notification;
pub mod product;
pub mod receipt;
pub mod recovery;
pub mod shopkeeper_order;
pub mod shopkeeper_order_item;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::assignment::Entity as Assignment;
    pub use super::category::Entity as Category;
    pub use super::city::Entity as City;
    pub use super::customer_order::Entity as CustomerOrder;
    pub use super::customer_order_item::Entity as CustomerOrderItem;
    pub use super::notification::Entity as Notification;
    pub use super::product::Entity as Product;
    pub use super::receipt::Entity as Receipt;
    pub use super::recovery::Entity as Recovery;
    pub use super::shopkeeper_order::Entity as ShopkeeperOrder;
    pub use super::shopkeeper_order_item::Entity as ShopkeeperOrderItem;
    pub use super::user::Entity as User;
}
