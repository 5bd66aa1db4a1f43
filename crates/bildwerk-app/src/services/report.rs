// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal output for progress events and human-readable messages.

use bildwerk_batch::ProgressEvent;
use bildwerk_core::human_errors::{HumanError, Severity};
use bildwerk_core::types::{BatchPhase, ProcessingStatus};

/// One status line for `event`, or `None` for events not worth a line.
pub fn render_event(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::Phase { phase, .. } => match phase {
            BatchPhase::Preparing => Some("Preparing images...".into()),
            BatchPhase::Finalizing => Some("Writing PDF...".into()),
            BatchPhase::Aborted => Some("Conversion stopped.".into()),
            BatchPhase::Idle | BatchPhase::Processing { .. } | BatchPhase::Done => None,
        },
        ProgressEvent::Stage {
            name,
            stage,
            index,
            total,
            percent,
        } => Some(format!(
            "[{percent:>3}%] {}/{total} {name}: {}",
            index + 1,
            stage.label()
        )),
        ProgressEvent::Finished {
            name,
            status,
            index,
            total,
            percent,
        } => {
            let outcome = match status {
                ProcessingStatus::Failed(reason) => format!("failed ({reason})"),
                _ => "done".to_string(),
            };
            Some(format!("[{percent:>3}%] {}/{total} {name}: {outcome}", index + 1))
        }
    }
}

pub fn print_event(event: &ProgressEvent) {
    if let Some(line) = render_event(event) {
        println!("{line}");
    }
}

/// Two-line rendering: the message, then the suggestion indented.
pub fn render_human(err: &HumanError) -> String {
    let label = match err.severity {
        Severity::Permanent => "error",
        Severity::ActionRequired => "action needed",
        Severity::Transient => "notice",
    };
    format!("{label}: {}\n  {}", err.message, err.suggestion)
}

pub fn print_human(err: &HumanError) {
    eprintln!("{}", render_human(err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::error::BatchError;
    use bildwerk_core::human_errors::humanize_batch;
    use bildwerk_core::types::{BatchId, Stage};

    #[test]
    fn stage_lines_carry_position_and_percent() {
        let line = render_event(&ProgressEvent::Stage {
            name: "b.jpg".into(),
            stage: Stage::Decoding,
            index: 1,
            total: 3,
            percent: 67,
        })
        .expect("line");
        assert!(line.starts_with("[ 67%] 2/3 b.jpg: "));
        assert!(line.ends_with(Stage::Decoding.label()));
    }

    #[test]
    fn failures_show_their_reason() {
        let line = render_event(&ProgressEvent::Finished {
            name: "c.heic".into(),
            status: ProcessingStatus::Failed("no transcoder".into()),
            index: 2,
            total: 3,
            percent: 100,
        })
        .expect("line");
        assert_eq!(line, "[100%] 3/3 c.heic: failed (no transcoder)");
    }

    #[test]
    fn quiet_phases_print_nothing() {
        let batch = BatchId::new();
        assert!(render_event(&ProgressEvent::Phase { batch, phase: BatchPhase::Done }).is_none());
        assert!(render_event(&ProgressEvent::Phase { batch, phase: BatchPhase::Preparing }).is_some());
    }

    #[test]
    fn human_messages_include_the_suggestion() {
        let text = render_human(&humanize_batch(&BatchError::EmptyBatch));
        let mut lines = text.lines();
        assert!(lines.next().is_some_and(|l| l.starts_with("action needed: ")));
        assert!(lines.next().is_some_and(|l| l.starts_with("  ")));
    }
}
