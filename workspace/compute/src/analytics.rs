//! Read-only reporting over orders, recoveries and receipts.
//!
//! Each summary runs several independent queries and merges the rows in
//! process memory keyed by shopkeeper or salesman id. The queries see
//! independent snapshots; there is no consistency guarantee across the
//! collections that compose one response.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use common::{AnalyticsSummary, CommissionSummary, DateRange, SalesmanOverviewRow, ShopkeeperLedgerRow};
use model::entities::{assignment, receipt, recovery, shopkeeper_order, user};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use std::collections::BTreeMap;
use tracing::instrument;

/// Inclusive date range as half-open UTC timestamp bounds.
fn range_bounds(range: &DateRange) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = range.start.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = (range.end + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    (start, end)
}

#[derive(Default)]
struct LedgerAccumulator {
    ordered: Decimal,
    paid_at_order: Decimal,
    recovered: Decimal,
    receipted: Decimal,
}

/// Revenue/outstanding/commission summary over a date range, with a
/// per-shopkeeper breakdown merged from the three source collections.
#[instrument(skip(db))]
pub async fn summary<C: ConnectionTrait>(db: &C, range: DateRange) -> Result<AnalyticsSummary> {
    let (start, end) = range_bounds(&range);

    let orders = shopkeeper_order::Entity::find()
        .filter(shopkeeper_order::Column::CreatedAt.gte(start))
        .filter(shopkeeper_order::Column::CreatedAt.lt(end))
        .all(db)
        .await?;

    let recoveries = recovery::Entity::find()
        .filter(recovery::Column::RecoveredAt.gte(range.start))
        .filter(recovery::Column::RecoveredAt.lte(range.end))
        .all(db)
        .await?;

    let receipts = receipt::Entity::find()
        .filter(receipt::Column::CreatedAt.gte(start))
        .filter(receipt::Column::CreatedAt.lt(end))
        .all(db)
        .await?;

    let mut per_shopkeeper: BTreeMap<i32, LedgerAccumulator> = BTreeMap::new();
    let mut revenue = Decimal::ZERO;
    let mut commission = Decimal::ZERO;
    let order_count = orders.len() as u64;

    for order in &orders {
        revenue += order.total_amount;
        commission += order.commission;
        let entry = per_shopkeeper.entry(order.shopkeeper_id).or_default();
        entry.ordered += order.total_amount;
        entry.paid_at_order += order.amount_paid;
    }

    let mut recovered = Decimal::ZERO;
    for r in &recoveries {
        recovered += r.amount;
        per_shopkeeper.entry(r.shopkeeper_id).or_default().recovered += r.amount;
    }

    for r in &receipts {
        per_shopkeeper.entry(r.shopkeeper_id).or_default().receipted += r.amount;
    }

    // Resolve shopkeeper names for the rows we collected.
    let ids: Vec<i32> = per_shopkeeper.keys().copied().collect();
    let names: BTreeMap<i32, String> = if ids.is_empty() {
        BTreeMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect()
    };

    let mut outstanding = Decimal::ZERO;
    let rows: Vec<ShopkeeperLedgerRow> = per_shopkeeper
        .into_iter()
        .map(|(shopkeeper_id, acc)| {
            let row_outstanding = acc.ordered - acc.paid_at_order - acc.recovered;
            outstanding += row_outstanding;
            ShopkeeperLedgerRow {
                shopkeeper_id,
                shopkeeper_name: names.get(&shopkeeper_id).cloned().unwrap_or_default(),
                ordered: acc.ordered,
                paid_at_order: acc.paid_at_order,
                recovered: acc.recovered,
                receipted: acc.receipted,
                outstanding: row_outstanding,
            }
        })
        .collect();

    Ok(AnalyticsSummary {
        range,
        revenue,
        outstanding,
        commission,
        recovered,
        order_count,
        rows,
    })
}

/// Commission earned by one salesman over a date range.
#[instrument(skip(db))]
pub async fn commission_summary<C: ConnectionTrait>(
    db: &C,
    salesman_id: i32,
    range: DateRange,
) -> Result<CommissionSummary> {
    let (start, end) = range_bounds(&range);

    let orders = shopkeeper_order::Entity::find()
        .filter(shopkeeper_order::Column::SalesmanId.eq(salesman_id))
        .filter(shopkeeper_order::Column::CreatedAt.gte(start))
        .filter(shopkeeper_order::Column::CreatedAt.lt(end))
        .all(db)
        .await?;

    let mut total_sales = Decimal::ZERO;
    let mut commission = Decimal::ZERO;
    for order in &orders {
        total_sales += order.total_amount;
        commission += order.commission;
    }

    Ok(CommissionSummary {
        salesman_id,
        range,
        order_count: orders.len() as u64,
        total_sales,
        commission,
    })
}

/// Admin distribution overview: one row per active salesman with the
/// aggregate state of their shopkeepers and orders.
#[instrument(skip(db))]
pub async fn distribution_overview<C: ConnectionTrait>(db: &C) -> Result<Vec<SalesmanOverviewRow>> {
    let salesmen = user::Entity::find()
        .filter(user::Column::Role.eq(user::Role::Salesman))
        .all(db)
        .await?;

    let mut rows = Vec::with_capacity(salesmen.len());
    for salesman in salesmen {
        let shopkeeper_count = assignment::Entity::find()
            .filter(assignment::Column::SalesmanId.eq(salesman.id))
            .filter(assignment::Column::IsActive.eq(true))
            .count(db)
            .await?;

        let orders = shopkeeper_order::Entity::find()
            .filter(shopkeeper_order::Column::SalesmanId.eq(salesman.id))
            .all(db)
            .await?;

        let mut total_sales = Decimal::ZERO;
        let mut outstanding = Decimal::ZERO;
        let mut commission = Decimal::ZERO;
        for order in &orders {
            total_sales += order.total_amount;
            outstanding += order.pending_amount;
            commission += order.commission;
        }

        rows.push(SalesmanOverviewRow {
            salesman_id: salesman.id,
            salesman_name: salesman.name,
            shopkeeper_count,
            order_count: orders.len() as u64,
            total_sales,
            outstanding,
            commission,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Migrations failed");
        db
    }

    async fn seed_user(db: &DatabaseConnection, name: &str, email: &str, role: user::Role) -> user::Model {
        user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            phone: Set(None),
            password_hash: Set("x".to_string()),
            role: Set(role),
            is_active: Set(true),
            commission_rate: Set(None),
            pending_amount: Set(Decimal::ZERO),
            credit_limit: Set(None),
            address: Set(None),
            city: Set(None),
            assigned_by: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed user")
    }

    async fn seed_order(
        db: &DatabaseConnection,
        number: &str,
        shopkeeper_id: i32,
        salesman_id: i32,
        total: Decimal,
        paid: Decimal,
        commission: Decimal,
    ) -> shopkeeper_order::Model {
        shopkeeper_order::ActiveModel {
            order_number: Set(number.to_string()),
            shopkeeper_id: Set(shopkeeper_id),
            salesman_id: Set(salesman_id),
            total_amount: Set(total),
            amount_paid: Set(paid),
            pending_amount: Set(total - paid),
            commission: Set(commission),
            payment_status: Set(shopkeeper_order::PaymentStatus::Partial),
            status: Set(shopkeeper_order::OrderStatus::Pending),
            payment_method: Set(None),
            delivery_address: Set(None),
            notes: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed order")
    }

    fn this_month() -> DateRange {
        let today = Utc::now().date_naive();
        DateRange::new(today - Duration::days(15), today + Duration::days(15))
    }

    #[tokio::test]
    async fn summary_merges_orders_and_recoveries() {
        let db = setup_db().await;
        let salesman = seed_user(&db, "Sam", "sam@example.com", user::Role::Salesman).await;
        let shop = seed_user(&db, "Shop", "shop@example.com", user::Role::Shopkeeper).await;

        seed_order(
            &db,
            "ORD-00001",
            shop.id,
            salesman.id,
            Decimal::new(30000, 2),
            Decimal::new(10000, 2),
            Decimal::new(1500, 2),
        )
        .await;

        recovery::ActiveModel {
            shopkeeper_id: Set(shop.id),
            salesman_id: Set(salesman.id),
            amount: Set(Decimal::new(5000, 2)),
            payment_method: Set(None),
            notes: Set(None),
            recovered_at: Set(Utc::now().date_naive()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let summary = summary(&db, this_month()).await.unwrap();

        assert_eq!(summary.order_count, 1);
        assert_eq!(summary.revenue, Decimal::new(30000, 2));
        assert_eq!(summary.commission, Decimal::new(1500, 2));
        assert_eq!(summary.recovered, Decimal::new(5000, 2));
        // 300 ordered - 100 paid - 50 recovered
        assert_eq!(summary.outstanding, Decimal::new(15000, 2));

        assert_eq!(summary.rows.len(), 1);
        let row = &summary.rows[0];
        assert_eq!(row.shopkeeper_id, shop.id);
        assert_eq!(row.shopkeeper_name, "Shop");
        assert_eq!(row.outstanding, Decimal::new(15000, 2));
    }

    #[tokio::test]
    async fn summary_excludes_out_of_range_recoveries() {
        let db = setup_db().await;
        let salesman = seed_user(&db, "Sam", "sam@example.com", user::Role::Salesman).await;
        let shop = seed_user(&db, "Shop", "shop@example.com", user::Role::Shopkeeper).await;

        recovery::ActiveModel {
            shopkeeper_id: Set(shop.id),
            salesman_id: Set(salesman.id),
            amount: Set(Decimal::new(5000, 2)),
            payment_method: Set(None),
            notes: Set(None),
            recovered_at: Set(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let summary = summary(&db, this_month()).await.unwrap();
        assert_eq!(summary.recovered, Decimal::ZERO);
        assert!(summary.rows.is_empty());
    }

    #[tokio::test]
    async fn commission_summary_only_counts_own_orders() {
        let db = setup_db().await;
        let sam = seed_user(&db, "Sam", "sam@example.com", user::Role::Salesman).await;
        let tom = seed_user(&db, "Tom", "tom@example.com", user::Role::Salesman).await;
        let shop = seed_user(&db, "Shop", "shop@example.com", user::Role::Shopkeeper).await;

        seed_order(
            &db,
            "ORD-00001",
            shop.id,
            sam.id,
            Decimal::new(30000, 2),
            Decimal::ZERO,
            Decimal::new(1500, 2),
        )
        .await;
        seed_order(
            &db,
            "ORD-00002",
            shop.id,
            tom.id,
            Decimal::new(10000, 2),
            Decimal::ZERO,
            Decimal::new(500, 2),
        )
        .await;

        let result = commission_summary(&db, sam.id, this_month()).await.unwrap();
        assert_eq!(result.order_count, 1);
        assert_eq!(result.total_sales, Decimal::new(30000, 2));
        assert_eq!(result.commission, Decimal::new(1500, 2));
    }

    #[tokio::test]
    async fn distribution_overview_lists_salesmen() {
        let db = setup_db().await;
        let admin = seed_user(&db, "Admin", "admin@example.com", user::Role::Admin).await;
        let sam = seed_user(&db, "Sam", "sam@example.com", user::Role::Salesman).await;
        let shop = seed_user(&db, "Shop", "shop@example.com", user::Role::Shopkeeper).await;

        assignment::ActiveModel {
            salesman_id: Set(sam.id),
            shopkeeper_id: Set(shop.id),
            assigned_by: Set(admin.id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        seed_order(
            &db,
            "ORD-00001",
            shop.id,
            sam.id,
            Decimal::new(30000, 2),
            Decimal::new(10000, 2),
            Decimal::new(1500, 2),
        )
        .await;

        let rows = distribution_overview(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].salesman_name, "Sam");
        assert_eq!(rows[0].shopkeeper_count, 1);
        assert_eq!(rows[0].order_count, 1);
        assert_eq!(rows[0].outstanding, Decimal::new(20000, 2));
    }
}
