use sea_orm::entity::prelude::*;

/// A printed receipt for a payment. `receipt_number` is derived from a
/// row count at creation time; the numbering is not reserved atomically,
/// so concurrent creations can collide (known limitation carried over
/// from the original scheme).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub receipt_number: String,
    pub shopkeeper_id: i32,
    pub order_id: Option<i32>,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    /// User who issued the receipt.
    pub issued_by: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ShopkeeperId",
        to = "super::user::Column::Id"
    )]
    Shopkeeper,
    #[sea_orm(
        belongs_to = "super::shopkeeper_order::Entity",
        from = "Column::OrderId",
        to = "super::shopkeeper_order::Column::Id"
    )]
    Order,
}

impl ActiveModelBehavior for ActiveModel {}
