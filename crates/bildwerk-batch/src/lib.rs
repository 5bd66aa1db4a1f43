// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk Batch — the working set of queued images and the pipeline that
// turns it into a document. Screening and order resolution are pure
// functions over the store; the pipeline is the only place that awaits.

pub mod intake;
pub mod order;
pub mod pipeline;
pub mod progress;
pub mod store;

pub use intake::{Accepted, IntakeOutcome, add_candidates, admit, screen};
pub use order::{Resolution, resolve};
pub use pipeline::{BatchReport, Pipeline, RecordOutcome};
pub use progress::{ChannelObserver, ProgressBus, ProgressEvent, ProgressObserver, TracingObserver};
pub use store::{BatchLease, ImageStore, OrderState};
