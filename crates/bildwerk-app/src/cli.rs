// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use bildwerk_core::AppConfig;
use bildwerk_core::types::{PageOrientation, SortKey};
use clap::Parser;

/// Turn JPEG, PNG and HEIC images into a single PDF, one image per page.
#[derive(Debug, Parser)]
#[command(name = "bildwerk", version, about)]
pub struct Cli {
    /// Images to convert.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Page orientation: portrait (p) or landscape (l).
    #[arg(long)]
    pub orientation: Option<PageOrientation>,

    /// Sort order when no explicit order is given: natural, name or date.
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Explicit page order, by file path or name. Must list every queued image.
    #[arg(long, num_args = 1.., value_name = "FILE")]
    pub order: Vec<String>,

    /// Rotate an image clockwise, e.g. `--rotate scan.jpg=90`. Repeatable.
    #[arg(long, value_name = "NAME=DEG", value_parser = parse_rotate)]
    pub rotate: Vec<RotateArg>,

    /// Directory the PDF is written to.
    #[arg(long, short, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Settings file to read (and write with --save-config).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Persist the effective settings after applying the flags above.
    #[arg(long)]
    pub save_config: bool,

    /// Apply mobile decoder limits regardless of the host platform.
    #[arg(long)]
    pub mobile: bool,
}

impl Cli {
    /// Override settings with the flags that were given.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(orientation) = self.orientation {
            config.page_orientation = orientation;
        }
        if let Some(sort) = self.sort {
            config.sort_key = sort;
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
    }
}

/// One `--rotate NAME=DEG` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotateArg {
    pub name: String,
    pub degrees: u16,
}

fn parse_rotate(raw: &str) -> Result<RotateArg, String> {
    let (name, degrees) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=DEG, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("missing file name in '{raw}'"));
    }
    let degrees = degrees
        .trim()
        .parse::<u16>()
        .map_err(|_| format!("'{degrees}' is not a number of degrees"))?;
    Ok(RotateArg {
        name: name.to_string(),
        degrees,
    })
}
