use sea_orm::entity::prelude::*;

/// Links a salesman to a shopkeeper. An active assignment is the
/// authorization basis for placing orders on a shopkeeper's behalf;
/// a shopkeeper without one cannot order at all.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub salesman_id: i32,
    pub shopkeeper_id: i32,
    pub assigned_by: i32,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SalesmanId",
        to = "super::user::Column::Id"
    )]
    Salesman,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ShopkeeperId",
        to = "super::user::Column::Id"
    )]
    Shopkeeper,
}

impl ActiveModelBehavior for ActiveModel {}
