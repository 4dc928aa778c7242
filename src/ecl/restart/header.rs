//! Restart step headers.
//!
//! Every stride used to slice the flat restart arrays comes from INTEHEAD.
//! The positions below are 0-based indices into that array.

use std::io::{Read, Seek};

use log::warn;

use crate::ecl::types::error::Result;
use crate::ecl::view::ArrayView;

pub const INTEHEAD_KW: &str = "INTEHEAD";
pub const DOUBHEAD_KW: &str = "DOUBHEAD";
pub const LOGIHEAD_KW: &str = "LOGIHEAD";

/// INTEHEAD positions.
pub mod intehead {
    pub const UNIT: usize = 2;
    pub const NX: usize = 8;
    pub const NY: usize = 9;
    pub const NZ: usize = 10;
    pub const NACTIV: usize = 11;
    pub const PHASE: usize = 14;
    pub const NWELLS: usize = 16;
    pub const NCWMAX: usize = 17;
    pub const NGRP: usize = 18;
    pub const NWGMAX: usize = 19;
    pub const NGMAXZ: usize = 20;
    pub const NIWELZ: usize = 24;
    pub const NSWELZ: usize = 25;
    pub const NXWELZ: usize = 26;
    pub const NZWELZ: usize = 27;
    pub const NICONZ: usize = 32;
    pub const NSCONZ: usize = 33;
    pub const NXCONZ: usize = 34;
    pub const NIGRPZ: usize = 36;
    pub const NSGRPZ: usize = 37;
    pub const NXGRPZ: usize = 38;
    pub const NZGRPZ: usize = 39;
    pub const DAY: usize = 64;
    pub const MONTH: usize = 65;
    pub const YEAR: usize = 66;
    pub const NOACTNOD: usize = 129;
    pub const NOACTBR: usize = 130;
    pub const NODMAX: usize = 131;
    pub const NBRMAX: usize = 132;
    pub const NIBRAN: usize = 133;
    pub const NRBRAN: usize = 134;
    pub const NINODE: usize = 135;
    pub const NRNODE: usize = 136;
    pub const NZNODE: usize = 137;
    pub const NO_ACT: usize = 156;
    pub const MAX_LINES: usize = 157;
    pub const MAX_WORDS_PER_LINE: usize = 158;
    pub const NWMAXZ: usize = 163;
    pub const NSEGWL: usize = 174;
    pub const NSWLMX: usize = 175;
    pub const NSEGMX: usize = 176;
    pub const NLBRMX: usize = 177;
    pub const NISEGZ: usize = 178;
    pub const NRSEGZ: usize = 179;
    pub const NILBRZ: usize = 180;
    pub const MAX_ACT_COND: usize = 245;
    pub const NO_FIELD_UDQS: usize = 262;
    pub const NO_GROUP_UDQS: usize = 263;
    pub const NO_WELL_UDQS: usize = 266;
}

/// DOUBHEAD position of the elapsed simulation time in days.
pub const DOUBHEAD_SIM_DAYS: usize = 0;

/// Per-UDQ sizes of the UDQ arrays. These do not appear in INTEHEAD.
pub mod udq_sizes {
    /// Integer items per UDQ in `IUDQ`.
    pub const NIUDQ: usize = 3;
    /// Words per UDQ in `ZUDN`: name and unit.
    pub const NZUDN: usize = 2;
    /// Words per UDQ in `ZUDL`: the defining expression.
    pub const NZUDL: usize = 16;
}

/// Per-action and per-condition sizes of the ACTIONX arrays.
pub mod action_sizes {
    pub const NIACTZ: usize = 9;
    pub const NSACTZ: usize = 5;
    pub const NZACTZ: usize = 4;
    pub const NIACNZ: usize = 26;
    pub const NSACNZ: usize = 16;
    pub const NZACNZ: usize = 13;
}

/// Dimensions and metadata of one restart step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestartHeader {
    /// Raw INTEHEAD unit flag: 1 metric, 2 field, 3 lab, 4 PVT-M.
    pub unit: i32,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub nactive: usize,
    pub phase: i32,
    pub day: i32,
    pub month: i32,
    pub year: i32,

    pub nwells: usize,
    pub ncwmax: usize,
    pub ngrp: usize,
    pub nwgmax: usize,
    pub ngmaxz: usize,
    pub niwelz: usize,
    pub nswelz: usize,
    pub nxwelz: usize,
    pub nzwelz: usize,
    pub niconz: usize,
    pub nsconz: usize,
    pub nxconz: usize,
    pub nigrpz: usize,
    pub nsgrpz: usize,
    pub nxgrpz: usize,
    pub nzgrpz: usize,

    pub nsegwl: usize,
    pub nswlmx: usize,
    pub nsegmx: usize,
    pub nlbrmx: usize,
    pub nisegz: usize,
    pub nrsegz: usize,
    pub nilbrz: usize,

    pub no_field_udqs: usize,
    pub no_group_udqs: usize,
    pub no_well_udqs: usize,
    pub nwmaxz: usize,

    pub no_actions: usize,
    pub max_lines: usize,
    pub max_words_per_line: usize,
    pub max_conditions: usize,

    pub noactnod: usize,
    pub noactbr: usize,
    pub nodmax: usize,
    pub nbrmax: usize,
    pub nibran: usize,
    pub nrbran: usize,
    pub ninode: usize,
    pub nrnode: usize,
    pub nznode: usize,

    /// Elapsed simulation time in days.
    pub sim_days: f64,
    pub doubhead: Vec<f64>,
    pub logihead: Vec<bool>,
}

/// Reads INTEHEAD positions, defaulting missing ones to zero.
struct IntHead<'a> {
    values: &'a [i32],
    missing: Vec<usize>,
}

impl IntHead<'_> {
    fn raw(&mut self, index: usize) -> i32 {
        match self.values.get(index) {
            Some(v) => *v,
            None => {
                self.missing.push(index);
                0
            }
        }
    }

    /// A count or stride; negative values are treated as zero.
    fn dim(&mut self, index: usize) -> usize {
        usize::try_from(self.raw(index)).unwrap_or(0)
    }
}

impl RestartHeader {
    /// Builds a header from raw INTEHEAD (and optional DOUBHEAD/LOGIHEAD) values.
    ///
    /// Positions past the end of a short INTEHEAD read as zero.
    pub fn from_arrays(intehead: &[i32], doubhead: &[f64], logihead: &[bool]) -> Self {
        use self::intehead::*;
        let mut ih = IntHead { values: intehead, missing: Vec::new() };
        let header = Self {
            unit: ih.raw(UNIT),
            nx: ih.dim(NX),
            ny: ih.dim(NY),
            nz: ih.dim(NZ),
            nactive: ih.dim(NACTIV),
            phase: ih.raw(PHASE),
            day: ih.raw(DAY),
            month: ih.raw(MONTH),
            year: ih.raw(YEAR),
            nwells: ih.dim(NWELLS),
            ncwmax: ih.dim(NCWMAX),
            ngrp: ih.dim(NGRP),
            nwgmax: ih.dim(NWGMAX),
            ngmaxz: ih.dim(NGMAXZ),
            niwelz: ih.dim(NIWELZ),
            nswelz: ih.dim(NSWELZ),
            nxwelz: ih.dim(NXWELZ),
            nzwelz: ih.dim(NZWELZ),
            niconz: ih.dim(NICONZ),
            nsconz: ih.dim(NSCONZ),
            nxconz: ih.dim(NXCONZ),
            nigrpz: ih.dim(NIGRPZ),
            nsgrpz: ih.dim(NSGRPZ),
            nxgrpz: ih.dim(NXGRPZ),
            nzgrpz: ih.dim(NZGRPZ),
            nsegwl: ih.dim(NSEGWL),
            nswlmx: ih.dim(NSWLMX),
            nsegmx: ih.dim(NSEGMX),
            nlbrmx: ih.dim(NLBRMX),
            nisegz: ih.dim(NISEGZ),
            nrsegz: ih.dim(NRSEGZ),
            nilbrz: ih.dim(NILBRZ),
            no_field_udqs: ih.dim(NO_FIELD_UDQS),
            no_group_udqs: ih.dim(NO_GROUP_UDQS),
            no_well_udqs: ih.dim(NO_WELL_UDQS),
            nwmaxz: ih.dim(NWMAXZ),
            no_actions: ih.dim(NO_ACT),
            max_lines: ih.dim(MAX_LINES),
            max_words_per_line: ih.dim(MAX_WORDS_PER_LINE),
            max_conditions: ih.dim(MAX_ACT_COND),
            noactnod: ih.dim(NOACTNOD),
            noactbr: ih.dim(NOACTBR),
            nodmax: ih.dim(NODMAX),
            nbrmax: ih.dim(NBRMAX),
            nibran: ih.dim(NIBRAN),
            nrbran: ih.dim(NRBRAN),
            ninode: ih.dim(NINODE),
            nrnode: ih.dim(NRNODE),
            nznode: ih.dim(NZNODE),
            sim_days: doubhead.get(DOUBHEAD_SIM_DAYS).copied().unwrap_or(0.0),
            doubhead: doubhead.to_vec(),
            logihead: logihead.to_vec(),
        };
        if !ih.missing.is_empty() {
            warn!(
                "INTEHEAD has {} items; {} positions defaulted to zero (first: {})",
                intehead.len(),
                ih.missing.len(),
                ih.missing[0]
            );
        }
        header
    }

    /// Reads the header arrays of a restart step view.
    ///
    /// INTEHEAD is required; DOUBHEAD and LOGIHEAD are optional.
    pub fn load<R: Read + Seek>(view: &ArrayView<'_, R>) -> Result<Self> {
        let intehead = view.get::<i32>(INTEHEAD_KW)?;
        let doubhead = view.get_opt::<f64>(DOUBHEAD_KW)?.unwrap_or(&[]);
        let logihead = view.get_opt::<bool>(LOGIHEAD_KW)?.unwrap_or(&[]);
        Ok(Self::from_arrays(intehead, doubhead, logihead))
    }

    /// Total number of UDQs of all categories.
    pub fn no_udqs(&self) -> usize {
        self.no_field_udqs + self.no_group_udqs + self.no_well_udqs
    }

    /// Number of cells of the global grid.
    pub fn num_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }
}

