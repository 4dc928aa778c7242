//! Restart files and their decoding.
//!
//! A unified restart file (`.UNRST`, `.FUNRST`) holds one report step per
//! `SEQNUM` array. A non-unified file (`.X0005`, `.F0005`) holds a single
//! step whose report number is taken from the extension.

pub mod header;
pub mod state;
pub mod units;
pub mod well_state;

use std::fs::File;
use std::io::{Read, Seek};
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;

use crate::ecl::reader::ArrayFile;
use crate::ecl::types::error::{EclError, Result};
use crate::ecl::view::{ArrayView, SEQNUM_KW};

use self::header::RestartHeader;
use self::state::RestartState;
use self::units::UnitSystemTables;
use self::well_state::WellState;

/// Matches non-unified restart extensions like `X0012` or `F0012`.
static STEP_EXTENSION: OnceLock<Regex> = OnceLock::new();

fn step_extension_regex() -> &'static Regex {
    STEP_EXTENSION
        .get_or_init(|| Regex::new(r"^[XxFf](\d{4})$").expect("Invalid restart extension regex pattern"))
}

/// Report number encoded in a non-unified restart file name.
pub fn report_from_path(path: &Path) -> Option<i32> {
    let ext = path.extension()?.to_str()?;
    step_extension_regex().captures(ext)?[1].parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReportStep {
    report: i32,
    range: Range<usize>,
}

/// A restart file split into report steps.
#[derive(Debug)]
pub struct RestartFile<R = File> {
    file: ArrayFile<R>,
    steps: Vec<ReportStep>,
    unified: bool,
}

impl RestartFile<File> {
    /// Opens a unified or non-unified restart file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = ArrayFile::open(path)?;
        Self::from_array_file(file, report_from_path(path))
    }
}

impl<R: Read + Seek> RestartFile<R> {
    /// Splits an indexed file into report steps.
    ///
    /// `default_report` numbers the single step of a file without `SEQNUM`.
    pub fn from_array_file(file: ArrayFile<R>, default_report: Option<i32>) -> Result<Self> {
        let view = file.view();
        let parts = view.split_at_key(SEQNUM_KW);
        let unified = !parts.is_empty();
        let mut steps = Vec::with_capacity(parts.len().max(1));
        for part in &parts {
            let report = part
                .get_at::<i32>(0)?
                .first()
                .copied()
                .ok_or_else(|| EclError::InvalidFormat("empty SEQNUM array".to_string()))?;
            debug!("Report step {} spans entries {:?}", report, part.range());
            steps.push(ReportStep { report, range: part.range() });
        }
        if !unified && !file.is_empty() {
            steps.push(ReportStep { report: default_report.unwrap_or(0), range: view.range() });
        }
        info!(
            "Restart file {} has {} report steps ({})",
            file.path().display(),
            steps.len(),
            if unified { "unified" } else { "non-unified" }
        );
        Ok(Self { file, steps, unified })
    }

    /// View of the step with report number `report`.
    pub fn step(&self, report: i32) -> Option<ArrayView<'_, R>> {
        self.steps.iter().find(|s| s.report == report).map(|s| self.view_of(s))
    }

    /// View of the `index`-th step in file order.
    pub fn step_at(&self, index: usize) -> Option<ArrayView<'_, R>> {
        self.steps.get(index).map(|s| self.view_of(s))
    }

    fn view_of(&self, step: &ReportStep) -> ArrayView<'_, R> {
        ArrayView::new(&self.file, step.range.start, step.range.end)
    }

    fn require_step(&self, report: i32) -> Result<ArrayView<'_, R>> {
        self.step(report)
            .ok_or_else(|| EclError::MissingArray(format!("{} for report step {}", SEQNUM_KW, report)))
    }

    /// Header of the step with report number `report`.
    pub fn header(&self, report: i32) -> Result<RestartHeader> {
        RestartHeader::load(&self.require_step(report)?.global())
    }

    /// Decodes the step with report number `report`.
    pub fn load_state(&self, report: i32, tables: &UnitSystemTables) -> Result<RestartState> {
        RestartState::load(&self.require_step(report)?, tables)
    }

    /// Assembles the well states of a step, including every local grid.
    pub fn well_states(&self, report: i32, tables: &UnitSystemTables) -> Result<Vec<WellState>> {
        let step = self.require_step(report)?;
        let header = RestartHeader::load(&step.global())?;
        let lgr_names: Vec<String> = step.lgr_blocks()?.into_iter().map(|b| b.name).collect();
        WellState::load_all_with(&step, &header, &lgr_names, tables)
    }
}

impl<R> RestartFile<R> {
    /// Report numbers in file order.
    pub fn report_steps(&self) -> Vec<i32> {
        self.steps.iter().map(|s| s.report).collect()
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_unified(&self) -> bool {
        self.unified
    }

    pub fn file(&self) -> &ArrayFile<R> {
        &self.file
    }
}
