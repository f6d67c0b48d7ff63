mod common;

use common::*;
use polyflow_api::entities::stock_location::LocationUsage;
use polyflow_api::entities::stock_move::MoveState;
use polyflow_api::reports::grade_stock::{self, GradeStockParams};
use polyflow_api::reports::stock_sheet::{self, StockSheetParams};
use rust_decimal_macros::dec;

#[tokio::test]
async fn stock_sheet_moves_internal_transfers_between_location_groups() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let store = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let floor = seed_location(db, "Shop Floor", LocationUsage::Internal).await;
    let product = seed_product(db, "RM001-HD", Some("M60075")).await;

    seed_move(db, product, dec!(100), supplier, store, at(day(2025, 3, 1)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(40), store, floor, at(day(2025, 3, 2)), MoveState::Done, None, None).await;

    let output = stock_sheet::run(
        &state.materializer,
        &StockSheetParams {
            date: day(2025, 3, 31),
            party_id: None,
            location_id: None,
            product_id: None,
            rm_type: None,
            requested_by: "tester".to_string(),
        },
    )
    .await
    .expect("stock sheet");

    assert_eq!(output.rows.len(), 2);
    let store_row = output
        .rows
        .iter()
        .find(|r| r.location.as_deref() == Some("RM Store"))
        .expect("store group");
    let floor_row = output
        .rows
        .iter()
        .find(|r| r.location.as_deref() == Some("Shop Floor"))
        .expect("floor group");

    assert_eq!(store_row.kgs, dec!(60));
    assert_eq!(floor_row.kgs, dec!(40));

    // the sheet still nets to the company-wide balance
    let total: rust_decimal::Decimal = output.rows.iter().map(|r| r.kgs).sum();
    assert_eq!(total, dec!(100));
}

#[tokio::test]
async fn stock_sheet_drops_zero_balance_groups() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let store = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let customer = seed_location(db, "Customers", LocationUsage::Customer).await;
    let product = seed_product(db, "RM002", None).await;

    seed_move(db, product, dec!(10), supplier, store, at(day(2025, 3, 1)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(10), store, customer, at(day(2025, 3, 2)), MoveState::Done, None, None).await;

    let output = stock_sheet::run(
        &state.materializer,
        &StockSheetParams {
            date: day(2025, 3, 31),
            party_id: None,
            location_id: None,
            product_id: None,
            rm_type: None,
            requested_by: "tester".to_string(),
        },
    )
    .await
    .expect("stock sheet");

    assert!(output.rows.is_empty());
}

#[tokio::test]
async fn grade_filter_narrows_the_grade_wise_ledger() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let store = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let graded = seed_product(db, "RM003", Some("M60075")).await;
    let ungraded = seed_product(db, "RM004", Some("B56003")).await;

    seed_move(db, graded, dec!(25), supplier, store, at(day(2025, 3, 1)), MoveState::Done, None, None).await;
    seed_move(db, ungraded, dec!(99), supplier, store, at(day(2025, 3, 2)), MoveState::Done, None, None).await;

    let output = grade_stock::run(
        &state.materializer,
        &GradeStockParams {
            date_from: day(2025, 3, 1),
            date_to: day(2025, 3, 31),
            party_id: None,
            rm_type: None,
            grade: Some("M60075".to_string()),
            requested_by: "tester".to_string(),
        },
    )
    .await
    .expect("grade stock");

    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].grade.as_deref(), Some("M60075"));
    assert_eq!(output.rows[0].received_qty, dec!(25));
    assert_eq!(output.rows[0].balance_qty, dec!(25));
}

#[tokio::test]
async fn grade_ledger_keeps_internal_transfers_neutral() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let store = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let floor = seed_location(db, "Shop Floor", LocationUsage::Internal).await;
    let product = seed_product(db, "RM005", Some("M60075")).await;

    seed_move(db, product, dec!(30), supplier, store, at(day(2025, 3, 1)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(12), store, floor, at(day(2025, 3, 2)), MoveState::Done, None, None).await;

    let output = grade_stock::run(
        &state.materializer,
        &GradeStockParams {
            date_from: day(2025, 3, 1),
            date_to: day(2025, 3, 31),
            party_id: None,
            rm_type: None,
            grade: None,
            requested_by: "tester".to_string(),
        },
    )
    .await
    .expect("grade stock");

    assert_eq!(output.rows.len(), 2);
    let transfer = &output.rows[1];
    assert_eq!(transfer.received_qty, dec!(0));
    assert_eq!(transfer.issued_qty, dec!(0));
    assert_eq!(transfer.balance_qty, dec!(30));
}
