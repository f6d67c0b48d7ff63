mod common;

use common::*;
use polyflow_api::entities::stock_location::LocationUsage;
use polyflow_api::entities::stock_move::MoveState;
use polyflow_api::reports::store_book::{self, StoreBookParams};
use rust_decimal_macros::dec;

fn params(state_user: &str) -> StoreBookParams {
    StoreBookParams {
        date_from: day(2025, 3, 1),
        date_to: day(2025, 3, 31),
        product_id: None,
        party_id: None,
        location_id: None,
        raw_type: None,
        requested_by: state_user.to_string(),
    }
}

#[tokio::test]
async fn running_balance_follows_the_movement_sequence() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let stock = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let customer = seed_location(db, "Customers", LocationUsage::Customer).await;
    let product = seed_product(db, "RM001-HD", Some("M60075")).await;

    seed_move(db, product, dec!(100), supplier, stock, at(day(2025, 3, 1)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(30), stock, customer, at(day(2025, 3, 2)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(20), stock, customer, at(day(2025, 3, 3)), MoveState::Done, None, None).await;

    let output = store_book::run(&state.materializer, &params("tester"))
        .await
        .expect("report run");

    // opening row + one row per move
    assert_eq!(output.rows.len(), 4);
    assert_eq!(output.rows[0].particulars, "Opening Balance");
    assert_eq!(output.rows[0].balance_qty, dec!(0));
    assert_eq!(output.rows[1].received_qty, dec!(100));
    assert_eq!(output.rows[1].balance_qty, dec!(100));
    assert_eq!(output.rows[2].issued_qty, dec!(30));
    assert_eq!(output.rows[2].balance_qty, dec!(70));
    assert_eq!(output.rows[3].issued_qty, dec!(20));
    assert_eq!(output.rows[3].balance_qty, dec!(50));
}

#[tokio::test]
async fn moves_before_the_period_feed_the_opening_balance() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let stock = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let product = seed_product(db, "RM002-PP", None).await;

    seed_move(db, product, dec!(80), supplier, stock, at(day(2025, 2, 10)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(5), supplier, stock, at(day(2025, 3, 5)), MoveState::Done, None, None).await;

    let output = store_book::run(&state.materializer, &params("tester"))
        .await
        .expect("report run");

    assert_eq!(output.rows[0].balance_qty, dec!(80));
    assert_eq!(output.rows[1].balance_qty, dec!(85));
}

#[tokio::test]
async fn internal_transfers_are_neutral() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let stock = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let floor = seed_location(db, "Shop Floor Store", LocationUsage::Internal).await;
    let product = seed_product(db, "RM003-LD", None).await;

    seed_move(db, product, dec!(40), supplier, stock, at(day(2025, 3, 1)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(15), stock, floor, at(day(2025, 3, 2)), MoveState::Done, None, None).await;

    let output = store_book::run(&state.materializer, &params("tester"))
        .await
        .expect("report run");

    let transfer_row = &output.rows[2];
    assert_eq!(transfer_row.received_qty, dec!(0));
    assert_eq!(transfer_row.issued_qty, dec!(0));
    assert_eq!(transfer_row.balance_qty, dec!(40));
}

#[tokio::test]
async fn draft_moves_do_not_participate() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let stock = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let product = seed_product(db, "RM004", None).await;

    seed_move(db, product, dec!(10), supplier, stock, at(day(2025, 3, 1)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(99), supplier, stock, at(day(2025, 3, 2)), MoveState::Draft, None, None).await;

    let output = store_book::run(&state.materializer, &params("tester"))
        .await
        .expect("report run");

    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.rows[1].balance_qty, dec!(10));
}

#[tokio::test]
async fn reruns_are_idempotent_and_isolated_by_run_id() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let stock = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let product = seed_product(db, "RM005", None).await;
    seed_move(db, product, dec!(25), supplier, stock, at(day(2025, 3, 1)), MoveState::Done, None, None).await;

    let first = store_book::run(&state.materializer, &params("alice"))
        .await
        .expect("first run");
    let second = store_book::run(&state.materializer, &params("bob"))
        .await
        .expect("second run");

    assert_ne!(first.run.run_id, second.run.run_id);
    assert_eq!(first.rows, second.rows);

    let first_rows: Vec<store_book::StoreBookRow> = state
        .materializer
        .rows_for_run(first.run.run_id)
        .await
        .expect("rows for first run");
    let second_rows: Vec<store_book::StoreBookRow> = state
        .materializer
        .rows_for_run(second.run.run_id)
        .await
        .expect("rows for second run");

    assert_eq!(first_rows, first.rows);
    assert_eq!(second_rows, second.rows);
}

#[tokio::test]
async fn inverted_period_is_rejected() {
    let state = test_state().await;
    let mut bad = params("tester");
    bad.date_from = day(2025, 3, 31);
    bad.date_to = day(2025, 3, 1);

    let err = store_book::run(&state.materializer, &bad).await.unwrap_err();
    assert!(matches!(
        err,
        polyflow_api::errors::ServiceError::ValidationError(_)
    ));
}

#[tokio::test]
async fn empty_result_is_a_valid_report() {
    let state = test_state().await;

    let output = store_book::run(&state.materializer, &params("tester"))
        .await
        .expect("report run");

    // only the opening row
    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].balance_qty, dec!(0));
}
