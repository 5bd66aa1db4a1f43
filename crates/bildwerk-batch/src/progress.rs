// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress bus — fan progress events out to any number of observers.
//
// Observers see what the pipeline is doing; they never influence it.
// `publish` is synchronous. Observers that do real work hand the event to a
// channel (`ChannelObserver`).

use std::sync::Arc;

use bildwerk_core::types::{BatchId, BatchPhase, ProcessingStatus, Stage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Percentage of the batch done once record `index` (0-based) of `total`
/// has been handled: `round(100 * (index + 1) / total)`.
pub fn percent_done(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (100.0 * (index + 1) as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Something observable happened during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The batch moved to a new phase.
    Phase { batch: BatchId, phase: BatchPhase },
    /// A record entered a sub-step.
    Stage {
        name: String,
        stage: Stage,
        index: usize,
        total: usize,
        percent: u8,
    },
    /// A record reached its terminal status (`Success` or `Failed`).
    Finished {
        name: String,
        status: ProcessingStatus,
        index: usize,
        total: usize,
        percent: u8,
    },
}

/// Receives progress events.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Ordered list of observers.
#[derive(Clone, Default)]
pub struct ProgressBus {
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Builder form of [`ProgressBus::subscribe`].
    pub fn with(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.subscribe(observer);
        self
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliver `event` to every observer in subscription order.
    pub fn publish(&self, event: ProgressEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

impl std::fmt::Debug for ProgressBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

// -- Observers ----------------------------------------------------------------

/// Forwards events into an unbounded tokio channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_event(&self, event: &ProgressEvent) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(event.clone());
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Phase { batch, phase } => {
                info!(%batch, ?phase, "batch phase");
            }
            ProgressEvent::Stage {
                name,
                stage,
                index,
                total,
                percent,
            } => {
                debug!(record = %name, %stage, position = index + 1, total, percent, "record stage");
            }
            ProgressEvent::Finished {
                name,
                status,
                percent,
                ..
            } => match status {
                ProcessingStatus::Failed(reason) => {
                    warn!(record = %name, %reason, percent, "record failed");
                }
                _ => info!(record = %name, percent, "record done"),
            },
        }
    }
}
