mod common;

use common::*;
use polyflow_api::entities::stock_location::LocationUsage;
use polyflow_api::entities::stock_move::MoveState;
use polyflow_api::services::reorder::ReorderParams;
use rust_decimal_macros::dec;

fn params(min_avg_threshold: f64) -> ReorderParams {
    ReorderParams {
        months: 3,
        safety_factor: 0.0,
        category: None,
        min_avg_threshold,
        end_date: day(2025, 6, 30),
        requested_by: "tester".to_string(),
    }
}

#[tokio::test]
async fn reorder_suggests_replenishment_from_consumption_history() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let store = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let customer = seed_location(db, "Customers", LocationUsage::Customer).await;
    let product = seed_product(db, "RM001-HD", None).await;

    seed_move(db, product, dec!(610), supplier, store, at(day(2025, 4, 5)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(600), store, customer, at(day(2025, 5, 1)), MoveState::Done, None, None).await;

    let output = state
        .reorder_service
        .compute(&params(0.0))
        .await
        .expect("reorder plan");

    assert_eq!(output.rows.len(), 1);
    let row = &output.rows[0];
    assert_eq!(row.consumed_qty, 600.0);
    assert_eq!(row.avg_monthly_qty, 200.0);
    assert_eq!(row.on_hand_qty, 10.0);
    // no observed receipts-to-done lead, so the company default applies
    assert_eq!(row.lead_time_days, 7.0);
    // daily 200/30 over 7 days, no safety margin, minus 10 on hand
    assert!((row.required_qty - 36.666_666_666_666_664).abs() < 1e-6);
    assert_eq!(row.suggested_qty, 37.0);
}

#[tokio::test]
async fn slow_movers_fall_under_the_threshold() {
    let state = test_state().await;
    let db = &*state.db;

    let supplier = seed_location(db, "Vendors", LocationUsage::Supplier).await;
    let store = seed_location(db, "RM Store", LocationUsage::Internal).await;
    let customer = seed_location(db, "Customers", LocationUsage::Customer).await;
    let product = seed_product(db, "RM002", None).await;

    seed_move(db, product, dec!(50), supplier, store, at(day(2025, 4, 5)), MoveState::Done, None, None).await;
    seed_move(db, product, dec!(30), store, customer, at(day(2025, 5, 1)), MoveState::Done, None, None).await;

    let output = state
        .reorder_service
        .compute(&params(300.0))
        .await
        .expect("reorder plan");

    assert!(output.rows.is_empty());
}

#[tokio::test]
async fn an_invalid_analysis_period_is_rejected() {
    let state = test_state().await;

    let mut bad = params(0.0);
    bad.months = 0;
    let err = state.reorder_service.compute(&bad).await.unwrap_err();
    assert!(matches!(
        err,
        polyflow_api::errors::ServiceError::ValidationError(_)
    ));
}
