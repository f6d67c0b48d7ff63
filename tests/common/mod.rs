#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use polyflow_api::config::AppConfig;
use polyflow_api::entities::stock_location::LocationUsage;
use polyflow_api::entities::stock_move::MoveState;
use polyflow_api::entities::stock_picking::{PickingKind, PickingState};
use polyflow_api::entities::{
    product, stock_location, stock_lot, stock_move, stock_picking, work_center,
};
use polyflow_api::{db, events, AppState};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

/// Fresh state over a single-connection in-memory SQLite database.
/// One connection is mandatory: each new `sqlite::memory:` connection
/// would otherwise see its own empty database.
pub async fn test_state() -> AppState {
    let cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        0,
        "test".to_string(),
    );
    let pool = db::establish_connection_with_config(&db::DbConfig {
        url: cfg.database_url.clone(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("db connect");
    db::ensure_schema(&pool).await.expect("schema");

    let (sender, rx) = events::channel(256);
    tokio::spawn(events::process_events(rx));

    AppState::build(Arc::new(pool), cfg, sender)
}

pub fn at(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub async fn seed_location(db: &DatabaseConnection, name: &str, usage: LocationUsage) -> Uuid {
    let id = Uuid::new_v4();
    stock_location::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        usage: Set(usage),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert location");
    id
}

pub async fn seed_product(db: &DatabaseConnection, code: &str, grade: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        code: Set(code.to_string()),
        name: Set(format!("Product {code}")),
        grade: Set(grade.map(str::to_string)),
        raw_type: Set(None),
        category: Set(Some("HDPE".to_string())),
        unit_weight_kg: Set(None),
        purchase_ok: Set(true),
        sale_ok: Set(false),
        lead_time_days: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert product");
    id
}

pub async fn seed_lot(db: &DatabaseConnection, name: &str, product_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    stock_lot::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        product_id: Set(product_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert lot");
    id
}

pub async fn seed_picking(
    db: &DatabaseConnection,
    name: &str,
    kind: PickingKind,
    state: PickingState,
) -> Uuid {
    let id = Uuid::new_v4();
    stock_picking::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        kind: Set(kind),
        state: Set(state),
        partner_id: Set(None),
        party_id: Set(None),
        scheduled_date: Set(None),
        date_done: Set(None),
        origin: Set(None),
        invoice_number: Set(None),
        internal_batch_number: Set(None),
        supplier_batch_number: Set(None),
        mfi_value: Set(None),
        number_of_bags: Set(None),
        remarks: Set(None),
        delay_acknowledged: Set(false),
        delay_reason: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert picking");
    id
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_move(
    db: &DatabaseConnection,
    product_id: Uuid,
    qty: Decimal,
    source: Uuid,
    dest: Uuid,
    date: DateTime<Utc>,
    state: MoveState,
    picking_id: Option<Uuid>,
    lot_id: Option<Uuid>,
) -> Uuid {
    let id = Uuid::new_v4();
    stock_move::ActiveModel {
        id: Set(id),
        picking_id: Set(picking_id),
        product_id: Set(product_id),
        lot_id: Set(lot_id),
        party_id: Set(None),
        partner_id: Set(None),
        quantity: Set(qty),
        source_location_id: Set(source),
        dest_location_id: Set(dest),
        date: Set(date),
        state: Set(state),
        reference: Set(None),
        production_order_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert move");
    id
}

pub async fn seed_work_center(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    work_center::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        hourly_capacity: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert work center");
    id
}
