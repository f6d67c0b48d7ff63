mod common;

use chrono::{Datelike, Utc};
use common::*;
use polyflow_api::commands::packing::{CreatePackingMemoCommand, PackingMemoLineInput};
use polyflow_api::commands::Command;
use polyflow_api::entities::stock_location::LocationUsage;
use polyflow_api::entities::stock_move::MoveState;
use polyflow_api::entities::stock_picking::{PickingKind, PickingState};
use polyflow_api::errors::ServiceError;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

struct Fixture {
    delivery: Uuid,
    product: Uuid,
    lot: Uuid,
}

/// Delivery picking plus a lot holding 50 units in internal stock.
async fn fixture(state: &polyflow_api::AppState) -> Fixture {
    let db = &*state.db;
    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let stock = seed_location(db, "FG Store", LocationUsage::Internal).await;
    let product = seed_product(db, "FG100", None).await;
    let lot = seed_lot(db, "RM00250001", product).await;
    seed_move(db, product, dec!(50), supplier, stock, Utc::now(), MoveState::Done, None, Some(lot)).await;

    let delivery = seed_picking(db, "OUT/0001", PickingKind::Outgoing, PickingState::Draft).await;
    Fixture {
        delivery,
        product,
        lot,
    }
}

fn line(product: Uuid, lot: Option<Uuid>, selected: rust_decimal::Decimal) -> PackingMemoLineInput {
    PackingMemoLineInput {
        product_id: product,
        lot_id: lot,
        quantity: dec!(50),
        selected_qty: selected,
    }
}

#[tokio::test]
async fn memo_names_walk_the_pm_sequence() {
    let state = test_state().await;
    let f = fixture(&state).await;

    let year = Utc::now().year().rem_euclid(100);

    let first = CreatePackingMemoCommand {
        picking_id: f.delivery,
        lines: vec![line(f.product, Some(f.lot), dec!(10))],
    }
    .execute(&state.commands)
    .await
    .expect("first memo");
    assert_eq!(first.name, format!("PM{year:02}0001"));

    let second = CreatePackingMemoCommand {
        picking_id: f.delivery,
        lines: vec![line(f.product, Some(f.lot), dec!(5))],
    }
    .execute(&state.commands)
    .await
    .expect("second memo");
    assert_eq!(second.name, format!("PM{year:02}0002"));
}

#[tokio::test]
async fn a_line_without_a_lot_is_rejected() {
    let state = test_state().await;
    let f = fixture(&state).await;

    let err = CreatePackingMemoCommand {
        picking_id: f.delivery,
        lines: vec![line(f.product, None, dec!(10))],
    }
    .execute(&state.commands)
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn zero_selected_quantity_is_rejected() {
    let state = test_state().await;
    let f = fixture(&state).await;

    let err = CreatePackingMemoCommand {
        picking_id: f.delivery,
        lines: vec![line(f.product, Some(f.lot), dec!(0))],
    }
    .execute(&state.commands)
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn selection_beyond_lot_availability_is_rejected() {
    let state = test_state().await;
    let f = fixture(&state).await;

    let err = CreatePackingMemoCommand {
        picking_id: f.delivery,
        lines: vec![line(f.product, Some(f.lot), dec!(51))],
    }
    .execute(&state.commands)
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn lot_availability_nets_receipts_against_dispatches() {
    let state = test_state().await;
    let f = fixture(&state).await;
    let db = &*state.db;

    let customer = seed_location(db, "Customers", LocationUsage::Customer).await;
    let stock = polyflow_api::entities::stock_location::Entity::find()
        .all(db)
        .await
        .expect("locations")
        .into_iter()
        .find(|l| l.usage == LocationUsage::Internal)
        .expect("internal location");
    seed_move(db, f.product, dec!(20), stock.id, customer, Utc::now(), MoveState::Done, None, Some(f.lot)).await;

    let available = state
        .stock_service
        .lot_available(f.lot)
        .await
        .expect("availability");
    assert_eq!(available, dec!(30));

    let err = CreatePackingMemoCommand {
        picking_id: f.delivery,
        lines: vec![line(f.product, Some(f.lot), dec!(31))],
    }
    .execute(&state.commands)
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
