use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table (all roles live here)
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Name))
                    .col(string(Users::Email).unique_key())
                    .col(string_null(Users::Phone))
                    .col(string(Users::PasswordHash))
                    .col(string_len(Users::Role, 20))
                    .col(boolean(Users::IsActive).default(true))
                    .col(decimal_null(Users::CommissionRate))
                    .col(decimal(Users::PendingAmount).default(0))
                    .col(decimal_null(Users::CreditLimit))
                    .col(string_null(Users::Address))
                    .col(string_null(Users::City))
                    .col(integer_null(Users::AssignedBy))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_assigned_by")
                            .from(Users::Table, Users::AssignedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(string(Categories::Name).unique_key())
                    .col(string_null(Categories::Description))
                    .to_owned(),
            )
            .await?;

        // Create cities table
        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(pk_auto(Cities::Id))
                    .col(string(Cities::Name).unique_key())
                    .col(boolean(Cities::IsActive).default(true))
                    .to_owned(),
            )
            .await?;

        // Create products table
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_auto(Products::Id))
                    .col(string(Products::Name))
                    .col(string_null(Products::Description))
                    .col(decimal(Products::Price))
                    .col(integer(Products::Stock).default(0))
                    .col(integer_null(Products::CategoryId))
                    .col(string_null(Products::ImageUrl))
                    .col(boolean(Products::IsActive).default(true))
                    .col(timestamp_with_time_zone(Products::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_category")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create assignments table
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(pk_auto(Assignments::Id))
                    .col(integer(Assignments::SalesmanId))
                    .col(integer(Assignments::ShopkeeperId))
                    .col(integer(Assignments::AssignedBy))
                    .col(boolean(Assignments::IsActive).default(true))
                    .col(timestamp_with_time_zone(Assignments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_salesman")
                            .from(Assignments::Table, Assignments::SalesmanId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_shopkeeper")
                            .from(Assignments::Table, Assignments::ShopkeeperId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_assigned_by")
                            .from(Assignments::Table, Assignments::AssignedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create shopkeeper_orders table
        manager
            .create_table(
                Table::create()
                    .table(ShopkeeperOrders::Table)
                    .if_not_exists()
                    .col(pk_auto(ShopkeeperOrders::Id))
                    .col(string(ShopkeeperOrders::OrderNumber).unique_key())
                    .col(integer(ShopkeeperOrders::ShopkeeperId))
                    .col(integer(ShopkeeperOrders::SalesmanId))
                    .col(decimal(ShopkeeperOrders::TotalAmount))
                    .col(decimal(ShopkeeperOrders::AmountPaid).default(0))
                    .col(decimal(ShopkeeperOrders::PendingAmount))
                    .col(decimal(ShopkeeperOrders::Commission))
                    .col(string_len(ShopkeeperOrders::PaymentStatus, 10))
                    .col(string_len(ShopkeeperOrders::Status, 20))
                    .col(string_null(ShopkeeperOrders::PaymentMethod))
                    .col(string_null(ShopkeeperOrders::DeliveryAddress))
                    .col(string_null(ShopkeeperOrders::Notes))
                    .col(timestamp_with_time_zone(ShopkeeperOrders::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopkeeper_order_shopkeeper")
                            .from(ShopkeeperOrders::Table, ShopkeeperOrders::ShopkeeperId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopkeeper_order_salesman")
                            .from(ShopkeeperOrders::Table, ShopkeeperOrders::SalesmanId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create shopkeeper_order_items table
        manager
            .create_table(
                Table::create()
                    .table(ShopkeeperOrderItems::Table)
                    .if_not_exists()
                    .col(pk_auto(ShopkeeperOrderItems::Id))
                    .col(integer(ShopkeeperOrderItems::OrderId))
                    .col(integer(ShopkeeperOrderItems::ProductId))
                    .col(integer(ShopkeeperOrderItems::Quantity))
                    .col(decimal(ShopkeeperOrderItems::UnitPrice))
                    .col(decimal(ShopkeeperOrderItems::TotalPrice))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopkeeper_order_item_order")
                            .from(ShopkeeperOrderItems::Table, ShopkeeperOrderItems::OrderId)
                            .to(ShopkeeperOrders::Table, ShopkeeperOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopkeeper_order_item_product")
                            .from(ShopkeeperOrderItems::Table, ShopkeeperOrderItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create customer_orders table
        manager
            .create_table(
                Table::create()
                    .table(CustomerOrders::Table)
                    .if_not_exists()
                    .col(pk_auto(CustomerOrders::Id))
                    .col(string(CustomerOrders::OrderNumber).unique_key())
                    .col(string(CustomerOrders::CustomerName))
                    .col(string_null(CustomerOrders::CustomerPhone))
                    .col(string_null(CustomerOrders::DeliveryAddress))
                    .col(decimal(CustomerOrders::TotalAmount))
                    .col(string_len(CustomerOrders::Status, 20))
                    .col(string_null(CustomerOrders::Notes))
                    .col(timestamp_with_time_zone(CustomerOrders::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create customer_order_items table
        manager
            .create_table(
                Table::create()
                    .table(CustomerOrderItems::Table)
                    .if_not_exists()
                    .col(pk_auto(CustomerOrderItems::Id))
                    .col(integer(CustomerOrderItems::OrderId))
                    .col(integer(CustomerOrderItems::ProductId))
                    .col(integer(CustomerOrderItems::Quantity))
                    .col(decimal(CustomerOrderItems::UnitPrice))
                    .col(decimal(CustomerOrderItems::TotalPrice))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_order_item_order")
                            .from(CustomerOrderItems::Table, CustomerOrderItems::OrderId)
                            .to(CustomerOrders::Table, CustomerOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_order_item_product")
                            .from(CustomerOrderItems::Table, CustomerOrderItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recoveries table
        manager
            .create_table(
                Table::create()
                    .table(Recoveries::Table)
                    .if_not_exists()
                    .col(pk_auto(Recoveries::Id))
                    .col(integer(Recoveries::ShopkeeperId))
                    .col(integer(Recoveries::SalesmanId))
                    .col(decimal(Recoveries::Amount))
                    .col(string_null(Recoveries::PaymentMethod))
                    .col(string_null(Recoveries::Notes))
                    .col(date(Recoveries::RecoveredAt))
                    .col(timestamp_with_time_zone(Recoveries::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recovery_shopkeeper")
                            .from(Recoveries::Table, Recoveries::ShopkeeperId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recovery_salesman")
                            .from(Recoveries::Table, Recoveries::SalesmanId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create receipts table
        manager
            .create_table(
                Table::create()
                    .table(Receipts::Table)
                    .if_not_exists()
                    .col(pk_auto(Receipts::Id))
                    .col(string(Receipts::ReceiptNumber).unique_key())
                    .col(integer(Receipts::ShopkeeperId))
                    .col(integer_null(Receipts::OrderId))
                    .col(decimal(Receipts::Amount))
                    .col(string_null(Receipts::PaymentMethod))
                    .col(integer(Receipts::IssuedBy))
                    .col(timestamp_with_time_zone(Receipts::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipt_shopkeeper")
                            .from(Receipts::Table, Receipts::ShopkeeperId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipt_order")
                            .from(Receipts::Table, Receipts::OrderId)
                            .to(ShopkeeperOrders::Table, ShopkeeperOrders::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipt_issued_by")
                            .from(Receipts::Table, Receipts::IssuedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notifications table
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(pk_auto(Notifications::Id))
                    .col(integer(Notifications::RecipientId))
                    .col(string(Notifications::Title))
                    .col(string(Notifications::Body))
                    .col(string_len(Notifications::Kind, 10))
                    .col(integer_null(Notifications::ReferenceId))
                    .col(boolean(Notifications::IsRead).default(false))
                    .col(timestamp_with_time_zone(Notifications::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_recipient")
                            .from(Notifications::Table, Notifications::RecipientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Receipts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recoveries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerOrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopkeeperOrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopkeeperOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    Phone,
    PasswordHash,
    Role,
    IsActive,
    CommissionRate,
    PendingAmount,
    CreditLimit,
    Address,
    City,
    AssignedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Cities {
    Table,
    Id,
    Name,
    IsActive,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Description,
    Price,
    Stock,
    CategoryId,
    ImageUrl,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
    Table,
    Id,
    SalesmanId,
    ShopkeeperId,
    AssignedBy,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ShopkeeperOrders {
    Table,
    Id,
    OrderNumber,
    ShopkeeperId,
    SalesmanId,
    TotalAmount,
    AmountPaid,
    PendingAmount,
    Commission,
    PaymentStatus,
    Status,
    PaymentMethod,
    DeliveryAddress,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ShopkeeperOrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    Quantity,
    UnitPrice,
    TotalPrice,
}

#[derive(DeriveIden)]
enum CustomerOrders {
    Table,
    Id,
    OrderNumber,
    CustomerName,
    CustomerPhone,
    DeliveryAddress,
    TotalAmount,
    Status,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CustomerOrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    Quantity,
    UnitPrice,
    TotalPrice,
}

#[derive(DeriveIden)]
enum Recoveries {
    Table,
    Id,
    ShopkeeperId,
    SalesmanId,
    Amount,
    PaymentMethod,
    Notes,
    RecoveredAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Receipts {
    Table,
    Id,
    ReceiptNumber,
    ShopkeeperId,
    OrderId,
    Amount,
    PaymentMethod,
    IssuedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    RecipientId,
    Title,
    Body,
    Kind,
    ReferenceId,
    IsRead,
    CreatedAt,
}
