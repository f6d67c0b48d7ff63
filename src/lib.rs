//! Polyflow API Library
//!
//! Core functionality for the Polyflow plastics-manufacturing backend:
//! movement ledgers, batch numbering, packing memos, work-center
//! recording and the reporting wizards built on top of them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod ledger;
pub mod reports;
pub mod sequence;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub events: events::EventSender,
    pub materializer: reports::Materializer,
    pub commands: commands::CommandContext,
    pub stock_service: services::stock::StockService,
    pub reorder_service: services::reorder::ReorderService,
}

impl AppState {
    /// Wires the services and command context from the base dependencies.
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        events: events::EventSender,
    ) -> Self {
        let materializer = reports::Materializer::new(
            db.clone(),
            events.clone(),
            config.report_retention_hours,
        );
        let sequencer = Arc::new(sequence::BatchSequencer::new(
            config.batch_prefix_len,
            config.batch_suffix_width,
        ));
        let commands = commands::CommandContext {
            db: db.clone(),
            events: events.clone(),
            sequencer,
        };
        let stock_service = services::stock::StockService::new(db.clone());
        let reorder_service = services::reorder::ReorderService::new(
            materializer.clone(),
            config.default_lead_time_days,
        );

        Self {
            db,
            config,
            events,
            materializer,
            commands,
            stock_service,
            reorder_service,
        }
    }
}
