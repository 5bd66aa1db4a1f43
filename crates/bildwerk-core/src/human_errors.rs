// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for every rejection and failure.
//
// Severity drives presentation: transient and action-required messages
// clear themselves after a delay, permanent ones (failed records) stay.

use std::time::Duration;

use crate::error::{
    BatchError, BildwerkError, CapabilityError, DecodeError, RecordError, ValidationError,
};

/// Default lifetime of a self-clearing message.
pub const DEFAULT_CLEAR_AFTER: Duration = Duration::from_secs(5);

/// Severity of a message from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Try again and it may work (busy device, slow step).
    Transient,
    /// The user must do something: pick another file, add images.
    ActionRequired,
    /// This item cannot be converted as-is.
    Permanent,
}

/// A message with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
    /// `Some` when the message should disappear on its own.
    pub auto_clear: Option<Duration>,
}

impl HumanError {
    fn new(message: String, suggestion: impl Into<String>, severity: Severity) -> Self {
        let auto_clear = match severity {
            Severity::Permanent => None,
            Severity::Transient | Severity::ActionRequired => Some(DEFAULT_CLEAR_AFTER),
        };
        Self {
            message,
            suggestion: suggestion.into(),
            severity,
            auto_clear,
        }
    }

    /// Override the auto-clear delay of a self-clearing message.
    pub fn clear_after(mut self, delay: Duration) -> Self {
        if self.auto_clear.is_some() {
            self.auto_clear = Some(delay);
        }
        self
    }
}

/// Message for a candidate rejected at intake.
pub fn humanize_validation(err: &ValidationError) -> HumanError {
    match err {
        ValidationError::UnsupportedType { name } => HumanError::new(
            format!("{name} is not supported."),
            "Only JPEG, PNG and HEIC/HEIF images can be added.",
            Severity::ActionRequired,
        ),
        ValidationError::EmptyFile { name } => HumanError::new(
            format!("{name} is empty."),
            "The file has no content. Choose the original photo again.",
            Severity::ActionRequired,
        ),
    }
}

/// Message for a record that failed during conversion. The record stays
/// marked as failed, so these never clear on their own.
pub fn humanize_record(name: &str, err: &RecordError) -> HumanError {
    let (message, suggestion) = match err {
        RecordError::Capability(CapabilityError::TranscoderUnavailable) => (
            format!("{name}: HEIC images can't be converted here."),
            "HEIC support is not installed. Convert the photo to JPEG first.".to_string(),
        ),
        RecordError::Capability(CapabilityError::TranscodeFailed(detail)) => (
            format!("{name}: the HEIC image couldn't be converted."),
            format!("The file may be damaged. ({detail})"),
        ),
        RecordError::Decode(DecodeError::ReadFailed(_)) => (
            format!("{name}: the file couldn't be read."),
            "It may have been moved or deleted. Add it again.".to_string(),
        ),
        RecordError::Decode(DecodeError::DecodeFailed(_)) => (
            format!("{name}: the image couldn't be loaded."),
            "The image may be damaged. Try saving it as JPEG or PNG first.".to_string(),
        ),
        RecordError::Decode(DecodeError::OversizedForPlatform { limit, .. }) => (
            format!("{name}: the image is too large for this device."),
            format!(
                "Images above {} MiB can't be loaded here. Reduce its size first.",
                limit / (1024 * 1024)
            ),
        ),
        RecordError::InvalidRotation(degrees) => (
            format!("{name}: rotation of {degrees} degrees isn't possible."),
            "Use the rotate button, which turns images in 90-degree steps.".to_string(),
        ),
        RecordError::Layout(_) => (
            format!("{name}: the image couldn't be placed on a page."),
            "The image has no visible area.".to_string(),
        ),
        RecordError::TimedOut { stage, .. } => (
            format!("{name}: {stage} took too long."),
            "Try converting this image on its own.".to_string(),
        ),
        RecordError::Internal(_) => (
            format!("{name}: processing failed."),
            "Try again. If this keeps happening, please report it.".to_string(),
        ),
    };
    HumanError::new(message, suggestion, Severity::Permanent)
}

/// Message for a batch that produced no document.
pub fn humanize_batch(err: &BatchError) -> HumanError {
    match err {
        BatchError::EmptyBatch => HumanError::new(
            "There are no images to convert.".into(),
            "Add one or more JPEG, PNG or HEIC images first.",
            Severity::ActionRequired,
        ),
        BatchError::NoImagesProcessed => HumanError::new(
            "None of the images could be converted.".into(),
            "Check the messages for each image, then try different files.",
            Severity::ActionRequired,
        ),
    }
}

/// Convert any `BildwerkError` into a `HumanError`.
pub fn humanize_error(err: &BildwerkError) -> HumanError {
    match err {
        BildwerkError::Validation(inner) => humanize_validation(inner),
        BildwerkError::Record(inner) => humanize_record("image", inner),
        BildwerkError::Batch(inner) => humanize_batch(inner),
        BildwerkError::StoreLocked => HumanError::new(
            "The image list can't be changed right now.".into(),
            "Wait until the current conversion has finished.",
            Severity::Transient,
        ),
        BildwerkError::UnknownRecord(_) => HumanError::new(
            "That image is no longer in the list.".into(),
            "It may already have been removed.",
            Severity::ActionRequired,
        ),
        BildwerkError::PdfError(_) => HumanError::new(
            "The PDF couldn't be created.".into(),
            "Try again. If this keeps happening, try fewer images at once.",
            Severity::Transient,
        ),
        BildwerkError::Config(detail) => HumanError::new(
            "A setting has an invalid value.".into(),
            format!("Fix the setting and try again. ({detail})"),
            Severity::ActionRequired,
        ),
        BildwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError::new(
                    "The file couldn't be found.".into(),
                    "It may have been moved or deleted. Try choosing the file again.",
                    Severity::ActionRequired,
                )
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError::new(
                    "Permission denied.".into(),
                    "Check the file permissions, or choose a different folder.",
                    Severity::ActionRequired,
                )
            } else {
                HumanError::new(
                    "There was a problem reading or writing a file.".into(),
                    "Try again. If this keeps happening, your storage may be full.",
                    Severity::Transient,
                )
            }
        }
        BildwerkError::Serialization(_) => HumanError::new(
            "The settings file couldn't be read.".into(),
            "Delete the settings file to restore the defaults.",
            Severity::ActionRequired,
        ),
        BildwerkError::PlatformUnavailable => HumanError::new(
            "This feature isn't available on your device.".into(),
            "The document can still be saved to a folder.",
            Severity::Permanent,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    #[test]
    fn intake_rejections_clear_themselves() {
        let human = humanize_validation(&ValidationError::UnsupportedType { name: "a.gif".into() });
        assert_eq!(human.severity, Severity::ActionRequired);
        assert_eq!(human.auto_clear, Some(DEFAULT_CLEAR_AFTER));
        assert!(human.message.contains("a.gif"));
    }

    #[test]
    fn failed_records_stay_visible() {
        let err = RecordError::Decode(DecodeError::DecodeFailed("truncated".into()));
        let human = humanize_record("b.png", &err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.auto_clear.is_none());
        assert!(human.message.starts_with("b.png"));
    }

    #[test]
    fn oversized_message_reports_limit_in_mib() {
        let err = RecordError::Decode(DecodeError::OversizedForPlatform {
            size: 30 * 1024 * 1024,
            limit: 25 * 1024 * 1024,
        });
        assert!(humanize_record("big.jpg", &err).suggestion.contains("25 MiB"));
    }

    #[test]
    fn timeout_names_the_stage() {
        let err = RecordError::TimedOut { stage: Stage::Transcoding, secs: 30 };
        assert!(humanize_record("c.heic", &err).message.contains("converting HEIC"));
    }

    #[test]
    fn clear_after_does_not_make_permanent_messages_transient() {
        let human = humanize_batch(&BatchError::EmptyBatch).clear_after(Duration::from_secs(2));
        assert_eq!(human.auto_clear, Some(Duration::from_secs(2)));

        let permanent = humanize_record("x.jpg", &RecordError::Internal("boom".into()))
            .clear_after(Duration::from_secs(2));
        assert!(permanent.auto_clear.is_none());
    }

    #[test]
    fn store_locked_is_transient() {
        let human = humanize_error(&BildwerkError::StoreLocked);
        assert_eq!(human.severity, Severity::Transient);
    }
}
