use sea_orm::entity::prelude::*;

/// A payment-collection event: a salesman collecting money from a
/// shopkeeper against their outstanding balance. Recording one reduces
/// `users.pending_amount` through a separate write.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recoveries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub shopkeeper_id: i32,
    pub salesman_id: i32,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    /// The day the money changed hands, which may predate the record.
    pub recovered_at: Date,
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
        belongs_to = "super::user::Entity",
        from = "Column::SalesmanId",
        to = "super::user::Column::Id"
    )]
    Salesman,
}

impl ActiveModelBehavior for ActiveModel {}
