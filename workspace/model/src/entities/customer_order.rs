use sea_orm::entity::prelude::*;

use super::shopkeeper_order::OrderStatus;

/// A direct customer order: no shopkeeper, no salesman, no commission
/// and no balance accounting. Priced the same way as shopkeeper orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customer_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::customer_order_item::Entity")]
    Item,
}

impl Related<super::customer_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
