use sea_orm::entity::prelude::*;
use std::str::FromStr;

/// Role of an account in the distribution hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[sea_orm(string_value = "superadmin")]
    Superadmin,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "salesman")]
    Salesman,
    #[sea_orm(string_value = "shopkeeper")]
    Shopkeeper,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Salesman => "salesman",
            Role::Shopkeeper => "shopkeeper",
        }
    }

    /// True for roles allowed to manage the whole system.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Superadmin | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "salesman" => Ok(Role::Salesman),
            "shopkeeper" => Ok(Role::Shopkeeper),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user of the system. All four roles live in one table; the
/// shopkeeper balance fields and the salesman commission rate are
/// nullable and only meaningful for their role.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    /// Commission percentage for salesmen, e.g. 5 means 5%.
    pub commission_rate: Option<Decimal>,
    /// Running unpaid balance for shopkeepers.
    pub pending_amount: Decimal,
    pub credit_limit: Option<Decimal>,
    pub address: Option<String>,
    pub city: Option<String>,
    /// The admin who created this account, if any.
    pub assigned_by: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Back-reference to the creating admin.
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::AssignedBy",
        to = "Column::Id"
    )]
    CreatedBy,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl ActiveModelBehavior for ActiveModel {}
