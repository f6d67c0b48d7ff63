use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published by commands and report wizards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PickingFinalized {
        picking_id: Uuid,
        moves_done: usize,
    },
    BatchNumberAssigned {
        picking_id: Uuid,
        code: String,
    },
    PackingMemoCreated {
        memo_id: Uuid,
        name: String,
        lines: usize,
    },
    DispatchDelayAcknowledged {
        picking_id: Uuid,
        reason: String,
    },
    DowntimeRecorded {
        work_center_id: Uuid,
        minutes: f64,
    },
    ReportGenerated {
        report: String,
        run_id: Uuid,
        rows: usize,
        generated_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background consumer for the event channel. Currently logs each event;
/// external delivery hangs off this single point.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ReportGenerated {
                report,
                run_id,
                rows,
                ..
            } => {
                info!(report = %report, run_id = %run_id, rows = rows, "report generated");
            }
            Event::BatchNumberAssigned { picking_id, code } => {
                info!(picking_id = %picking_id, code = %code, "internal batch number assigned");
            }
            other => info!(event = ?other, "event processed"),
        }
    }
    warn!("Event channel closed; processor exiting");
}

/// Convenience constructor for a sender/processor pair.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}
