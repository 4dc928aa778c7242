//! Per-well state of one report step across the global grid and every
//! local grid refinement.
//!
//! Connections are grouped by the grid they complete in. Multi-segment
//! wells get a segment arena whose outlets are arena indices, plus the
//! branches cut out of it.

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};

use log::{debug, trace, warn};

use super::header::{RestartHeader, INTEHEAD_KW};
use super::state::{decode_wells, item, iwel, word, ConnectionArrays, ConnectionRecord, SegmentRecord, WellType, Windows};
use super::units::{Converter, UnitSystem, UnitSystemTables};
use crate::ecl::types::error::Result;
use crate::ecl::view::ArrayView;

/// Grid a connection belongs to.
///
/// `Lgr(n)` is the `n`-th local grid of the step, 0-based in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridId {
    Global,
    Lgr(usize),
}

/// A segment in the arena of a multi-segment well.
#[derive(Debug, Clone, PartialEq)]
pub struct WellSegment {
    /// 1-based segment number.
    pub number: usize,
    pub branch: usize,
    /// Arena index of the outlet segment.
    pub outlet: Option<usize>,
    pub length: f64,
    pub depth: f64,
    pub diameter: f64,
    /// Indices into the global connections completed in this segment.
    pub connections: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellBranch {
    pub id: usize,
    /// Arena indices of the segments on the branch, by segment number.
    pub segments: Vec<usize>,
    /// Arena index of the segment furthest from the outlet.
    pub start: usize,
    /// Arena index of the segment on another branch this one drains into.
    pub outlet: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellState {
    pub name: String,
    pub well_type: WellType,
    pub open: bool,
    /// 0-based wellhead column.
    pub head: (usize, usize),
    connections: BTreeMap<GridId, Vec<ConnectionRecord>>,
    segments: Vec<WellSegment>,
    branches: Vec<WellBranch>,
    lgr_names: Vec<String>,
}

impl WellState {
    /// Assembles the wells of a step with the standard unit tables.
    ///
    /// `lgr_names` lists the local grids to search, in step order.
    pub fn load_all<R: Read + Seek>(
        step: &ArrayView<'_, R>,
        header: &RestartHeader,
        lgr_names: &[String],
    ) -> Result<Vec<Self>> {
        Self::load_all_with(step, header, lgr_names, UnitSystemTables::standard())
    }

    pub fn load_all_with<R: Read + Seek>(
        step: &ArrayView<'_, R>,
        header: &RestartHeader,
        lgr_names: &[String],
        tables: &UnitSystemTables,
    ) -> Result<Vec<Self>> {
        if header.nwells == 0 {
            return Ok(Vec::new());
        }
        let conv = Converter::new(tables, UnitSystem::from_intehead(header.unit));
        let records = decode_wells(&step.global(), header, &conv, &[])?;

        let mut wells: Vec<Self> = records
            .into_iter()
            .map(|record| {
                let segments = build_segments(&record.segments, &record.connections);
                let branches = build_branches(&segments);
                let mut connections = BTreeMap::new();
                if !record.connections.is_empty() {
                    connections.insert(GridId::Global, record.connections);
                }
                Self {
                    name: record.name,
                    well_type: record.well_type,
                    open: record.open,
                    head: record.head,
                    connections,
                    segments,
                    branches,
                    lgr_names: lgr_names.to_vec(),
                }
            })
            .collect();

        for (n, lgr_name) in lgr_names.iter().enumerate() {
            let Some(lgr) = step.lgr(lgr_name)? else {
                warn!("Local grid {} not found in step", lgr_name);
                continue;
            };
            if !lgr.has_key("ICON") {
                trace!("Local grid {} has no connections", lgr_name);
                continue;
            }
            let lgr_header = match lgr.has_key(INTEHEAD_KW) {
                true => RestartHeader::load(&lgr)?,
                false => header.clone(),
            };
            let arrays = ConnectionArrays::load(&lgr, &lgr_header)?;
            let iwel_windows = Windows::flat("IWEL", lgr.get::<i32>("IWEL")?, lgr_header.nwells, lgr_header.niwelz)?;
            for well in wells.iter_mut() {
                let Some(nr) = lgr_well_nr(&well.name, &lgr, &lgr_header)? else { continue };
                let ncon = usize::try_from(item(iwel_windows.entity(nr)?, iwel::NCONN))
                    .unwrap_or(0)
                    .min(lgr_header.ncwmax);
                let found = arrays.decode(nr, ncon, &conv)?;
                if !found.is_empty() {
                    debug!("Well {} has {} connections in {}", well.name, found.len(), lgr_name);
                    well.connections.insert(GridId::Lgr(n), found);
                }
            }
        }
        Ok(wells)
    }

    /// Connections completed in `grid`.
    pub fn connections(&self, grid: GridId) -> &[ConnectionRecord] {
        self.connections.get(&grid).map_or(&[], Vec::as_slice)
    }

    /// Connections completed in the local grid called `lgr_name`.
    pub fn lgr_connections(&self, lgr_name: &str) -> &[ConnectionRecord] {
        match self.lgr_names.iter().position(|n| n == lgr_name) {
            Some(n) => self.connections(GridId::Lgr(n)),
            None => &[],
        }
    }

    /// Grids with at least one connection, global first.
    pub fn grids(&self) -> impl Iterator<Item = GridId> + '_ {
        self.connections.keys().copied()
    }

    pub fn num_connections(&self) -> usize {
        self.connections.values().map(Vec::len).sum()
    }

    pub fn is_msw(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn segments(&self) -> &[WellSegment] {
        &self.segments
    }

    pub fn branches(&self) -> &[WellBranch] {
        &self.branches
    }

    /// Arena index of segment number `number`.
    pub fn segment_index(&self, number: usize) -> Option<usize> {
        self.segments.iter().position(|s| s.number == number)
    }

    /// Arena indices of the segments whose outlet is `index`.
    pub fn inlets(&self, index: usize) -> Vec<usize> {
        (0..self.segments.len()).filter(|&i| self.segments[i].outlet == Some(index)).collect()
    }

    /// Arena indices from `index` up to the top segment, inclusive.
    pub fn path_to_top(&self, index: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = Some(index);
        while let Some(at) = current {
            if at >= self.segments.len() || path.contains(&at) {
                break;
            }
            path.push(at);
            current = self.segments[at].outlet;
        }
        path
    }
}

/// Index of well `name` in the well arrays of a local grid block.
///
/// `None` when the block has no INTEHEAD or ZWEL, or does not list the well.
pub fn well_nr_in_lgr<R: Read + Seek>(name: &str, lgr: &ArrayView<'_, R>) -> Result<Option<usize>> {
    if !lgr.has_key(INTEHEAD_KW) {
        debug!("Local grid block without {}", INTEHEAD_KW);
        return Ok(None);
    }
    let header = RestartHeader::load(lgr)?;
    lgr_well_nr(name, lgr, &header)
}

fn lgr_well_nr<R: Read + Seek>(name: &str, lgr: &ArrayView<'_, R>, header: &RestartHeader) -> Result<Option<usize>> {
    let Some(zwel) = lgr.get_opt::<String>("ZWEL")? else {
        return Ok(None);
    };
    let zwel = Windows::flat("ZWEL", zwel, header.nwells, header.nzwelz)?;
    let pos = zwel.iter().position(|w| word(w, 0) == name);
    Ok(pos)
}

fn build_segments(records: &[SegmentRecord], connections: &[ConnectionRecord]) -> Vec<WellSegment> {
    let by_number: HashMap<usize, usize> = records.iter().enumerate().map(|(i, s)| (s.number, i)).collect();
    records
        .iter()
        .map(|s| {
            let outlet = s.outlet.and_then(|o| {
                let found = by_number.get(&o).copied();
                if found.is_none() {
                    warn!("Segment {} drains into unknown segment {}", s.number, o);
                }
                found
            });
            WellSegment {
                number: s.number,
                branch: s.branch,
                outlet,
                length: s.length,
                depth: s.depth,
                diameter: s.diameter,
                connections: (0..connections.len()).filter(|&c| connections[c].segment == Some(s.number)).collect(),
            }
        })
        .collect()
}

fn build_branches(segments: &[WellSegment]) -> Vec<WellBranch> {
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, segment) in segments.iter().enumerate() {
        members.entry(segment.branch).or_default().push(index);
    }
    members
        .into_iter()
        .map(|(id, segs)| {
            // The start segment is not the outlet of any segment on its own branch.
            let is_outlet = |i: usize| segs.iter().any(|&s| segments[s].outlet == Some(i));
            let start = segs.iter().rev().copied().find(|&i| !is_outlet(i)).unwrap_or(segs[segs.len() - 1]);
            let outlet = segs
                .iter()
                .filter_map(|&s| segments[s].outlet)
                .find(|&o| segments[o].branch != id);
            WellBranch { id, segments: segs, start, outlet }
        })
        .collect()
}
