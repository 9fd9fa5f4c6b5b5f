use sea_orm::entity::prelude::*;

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum NotificationKind {
    #[sea_orm(string_value = "order")]
    Order,
    #[sea_orm(string_value = "recovery")]
    Recovery,
    #[sea_orm(string_value = "system")]
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Order => "order",
            NotificationKind::Recovery => "recovery",
            NotificationKind::System => "system",
        }
    }
}

/// An in-app notification. Created best-effort after order and recovery
/// writes; creation failures are logged and never surfaced to the caller.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub recipient_id: i32,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    /// Id of the order or recovery this refers to, when applicable.
    pub reference_id: Option<i32>,
    #[sea_orm(default_value = "false")]
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
