// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion session — one image list, one settings snapshot, one platform.
//
// The session turns paths into candidates, applies the user's rotations and
// ordering, runs the pipeline and hands the finished PDF to the platform
// bridge. Messages meant for the user accumulate in `notices` until the
// front end takes them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bildwerk_batch::{BatchReport, ImageStore, IntakeOutcome, Pipeline, ProgressBus, add_candidates};
use bildwerk_bridge::{DesktopBridge, PlatformBridge, default_download_dir, deliver, platform_bridge};
use bildwerk_core::AppConfig;
use bildwerk_core::error::{BildwerkError, RecordError, Result};
use bildwerk_core::human_errors::{
    DEFAULT_CLEAR_AFTER, HumanError, Severity, humanize_error, humanize_record, humanize_validation,
};
use bildwerk_core::types::{ByteSource, Candidate, PlatformProfile, RecordId, Rotation};
use bildwerk_document::TranscoderAdapter;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

/// A document that reached the user.
#[derive(Debug)]
pub struct Delivered {
    pub path: PathBuf,
    pub report: BatchReport,
}

/// Pick the bridge for this run. An explicit output directory or a forced
/// mobile profile swaps in a desktop bridge configured accordingly.
pub fn select_bridge(config: &AppConfig, force_mobile: bool) -> Box<dyn PlatformBridge> {
    let native = platform_bridge();
    if config.output_dir.is_none() && !force_mobile {
        return native;
    }
    let dir = config.output_dir.clone().unwrap_or_else(default_download_dir);
    let profile = if force_mobile {
        PlatformProfile::mobile()
    } else {
        native.platform_profile()
    };
    Box::new(DesktopBridge::with_download_dir(dir).with_profile(profile))
}

/// Build a candidate for a file on disk. Bytes are read when the record is
/// processed, not here.
pub fn candidate_from_path(path: &Path) -> Result<Candidate> {
    let metadata = std::fs::metadata(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Candidate {
        name,
        size: metadata.len(),
        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        source: ByteSource::File(path.to_path_buf()),
    })
}

enum Lookup {
    Found(RecordId),
    Missing,
    Ambiguous(usize),
}

pub struct Session {
    config: AppConfig,
    store: ImageStore,
    bridge: Box<dyn PlatformBridge>,
    notices: Vec<HumanError>,
}

impl Session {
    pub fn new(config: AppConfig, bridge: Box<dyn PlatformBridge>) -> Self {
        let store = ImageStore::with_sort_key(config.sort_key);
        Self {
            config,
            store,
            bridge,
            notices: Vec::new(),
        }
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Drain the messages collected so far.
    pub fn take_notices(&mut self) -> Vec<HumanError> {
        std::mem::take(&mut self.notices)
    }

    // -- Intake -----------------------------------------------------------------

    /// Queue the files at `paths`. Unreadable paths and rejected files turn
    /// into notices; duplicates are dropped silently.
    #[instrument(skip_all, fields(paths = paths.len()))]
    pub fn add_files(&mut self, paths: &[PathBuf]) -> Result<IntakeOutcome> {
        let mut candidates = Vec::with_capacity(paths.len());
        for path in paths {
            match candidate_from_path(path) {
                Ok(candidate) => candidates.push(candidate),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot stat file");
                    self.notify(humanize_error(&err));
                }
            }
        }

        let outcome = add_candidates(&mut self.store, candidates)?;
        for rejection in &outcome.rejected {
            self.notify(humanize_validation(rejection));
        }
        info!(
            accepted = outcome.accepted_count(),
            rejected = outcome.rejected.len(),
            duplicates = outcome.duplicates.len(),
            "files queued"
        );
        Ok(outcome)
    }

    // -- Arrangement ------------------------------------------------------------

    /// Turn the image called `name` clockwise by `degrees`, a multiple of 90.
    pub fn apply_rotation(&mut self, name: &str, degrees: u16) -> Result<Rotation> {
        if degrees % 90 != 0 {
            return Err(RecordError::InvalidRotation(degrees).into());
        }
        let id = self
            .store
            .find_by_name(name)
            .map(|record| record.id.clone())
            .ok_or_else(|| BildwerkError::UnknownRecord(name.to_string()))?;

        let mut rotation = self.store.get(&id).map(|r| r.rotation).unwrap_or_default();
        for _ in 0..(degrees / 90) % 4 {
            rotation = self.store.rotate_clockwise(&id)?;
        }
        Ok(rotation)
    }

    /// Process images in the order of `entries`. An entry is a file path as
    /// it was queued or a display name. Entries matching nothing, and names
    /// shared by several images, are skipped; the order is then incomplete and
    /// the pipeline falls back to the active sort.
    pub fn apply_order(&mut self, entries: &[String]) -> Result<()> {
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.lookup(entry) {
                Lookup::Found(id) => ids.push(id),
                Lookup::Missing => warn!(%entry, "ordered image is not queued"),
                Lookup::Ambiguous(count) => {
                    warn!(%entry, count, "ordered name matches several images");
                    self.notify(HumanError {
                        message: format!("{count} images are called {entry}."),
                        suggestion: "Give their file paths in the page order instead of the name."
                            .into(),
                        severity: Severity::ActionRequired,
                        auto_clear: Some(DEFAULT_CLEAR_AFTER),
                    });
                }
            }
        }
        self.store.reorder(ids)
    }

    fn lookup(&self, entry: &str) -> Lookup {
        let records = self.store.records_natural();
        let by_path = records.iter().find(|record| {
            matches!(&record.source, ByteSource::File(path) if path.as_path() == Path::new(entry))
        });
        if let Some(record) = by_path {
            return Lookup::Found(record.id.clone());
        }

        let named: Vec<_> = records.iter().filter(|record| record.name == entry).collect();
        match named.as_slice() {
            [] => Lookup::Missing,
            [record] => Lookup::Found(record.id.clone()),
            many => Lookup::Ambiguous(many.len()),
        }
    }

    // -- Conversion -------------------------------------------------------------

    /// Run the batch and deliver the PDF. Per-image failures become notices;
    /// only batch-level failures are returned as errors.
    pub async fn convert(&mut self, bus: ProgressBus) -> Result<Delivered> {
        let transcoder = TranscoderAdapter::platform_default(self.config.transcode_quality);
        if !transcoder.is_available() {
            info!("no HEIC transcoder in this build");
        }
        let pipeline = Pipeline::new(&self.config, self.bridge.platform_profile(), transcoder)
            .with_progress(bus);

        let result = pipeline.run(&self.store).await;
        drop(pipeline);
        let report = result?;

        for outcome in report.failed() {
            if let Some(err) = &outcome.error {
                self.notify(humanize_record(&outcome.name, err));
            }
        }
        if report.order_fell_back {
            self.notify(HumanError {
                message: "The custom page order didn't match the image list.".into(),
                suggestion: "Pages follow the selected sort instead.".into(),
                severity: Severity::Transient,
                auto_clear: Some(Duration::from_secs(self.config.message_clear_secs)),
            });
        }

        let path = deliver(self.bridge.as_ref(), &report.document, &report.filename)?;
        Ok(Delivered { path, report })
    }

    fn notify(&mut self, notice: HumanError) {
        let notice = notice.clear_after(Duration::from_secs(self.config.message_clear_secs));
        self.notices.push(notice);
    }
}
