//! Decoding of one restart step into wells, groups, UDQs, actions and the
//! production network.
//!
//! Every flat array is cut into fixed-size windows whose sizes come from
//! [`RestartHeader`]. An array whose length disagrees with the header is a
//! [`EclError::DimensionMismatch`], never a silent truncation.

use std::io::{Read, Seek};

use log::{debug, info, warn};

use super::header::{action_sizes, udq_sizes, RestartHeader};
use super::units::{Converter, Quantity, UnitSystem, UnitSystemTables};
use crate::ecl::types::error::{EclError, Result};
use crate::ecl::types::models::NAME_LENGTH;
use crate::ecl::view::ArrayView;

/// Marks a UDQ value that was never set for an entity.
pub const UDQ_RESTART_DEFAULT: f64 = -0.3e21;

/// Line that closes the deck text of an action.
pub const ACTION_END: &str = "ENDACTIO";

/// IWEL item positions.
pub mod iwel {
    pub const IHEAD: usize = 0;
    pub const JHEAD: usize = 1;
    pub const FIRST_K: usize = 2;
    pub const LAST_K: usize = 3;
    pub const NCONN: usize = 4;
    pub const GROUP: usize = 5;
    pub const WTYPE: usize = 6;
    pub const ACT_CTRL: usize = 7;
    pub const STATUS: usize = 10;
    /// 1-based multi-segment well id, 0 for ordinary wells.
    pub const MSW_ID: usize = 70;
    pub const NWSEG: usize = 71;
}

/// SWEL item positions (targets and limits).
pub mod swel {
    pub const OIL: usize = 0;
    pub const WATER: usize = 1;
    pub const GAS: usize = 2;
    pub const LIQUID: usize = 3;
    pub const RESV: usize = 4;
    pub const THP: usize = 5;
    pub const BHP: usize = 6;
    pub const DATUM_DEPTH: usize = 9;
}

/// XWEL item positions (simulated rates and pressures).
pub mod xwel {
    pub const OIL: usize = 0;
    pub const WATER: usize = 1;
    pub const GAS: usize = 2;
    pub const LIQUID: usize = 3;
    pub const VOID: usize = 4;
    pub const BHP: usize = 6;
}

/// ICON item positions.
pub mod icon {
    pub const SEQ_INDEX: usize = 0;
    pub const I: usize = 1;
    pub const J: usize = 2;
    pub const K: usize = 3;
    pub const STATUS: usize = 5;
    pub const DIRECTION: usize = 13;
    pub const SEGMENT: usize = 14;
}

pub mod scon {
    pub const CONNECTION_FACTOR: usize = 0;
}

pub mod xcon {
    pub const OIL: usize = 0;
    pub const WATER: usize = 1;
    pub const GAS: usize = 2;
    pub const RESV: usize = 3;
    pub const PRESSURE: usize = 34;
}

pub mod iseg {
    pub const OUTLET: usize = 1;
    pub const INLET: usize = 2;
    pub const BRANCH: usize = 3;
}

pub mod rseg {
    pub const LENGTH: usize = 0;
    pub const DEPTH: usize = 1;
    pub const DIAMETER: usize = 2;
}

/// IGRP positions relative to `NWGMAX`.
pub mod igrp {
    pub const NCHILD: usize = 0;
    pub const GROUP_TYPE: usize = 26;
    pub const PARENT: usize = 28;
}

pub mod xgrp {
    pub const OIL: usize = 0;
    pub const WATER: usize = 1;
    pub const GAS: usize = 2;
}

pub mod iact {
    pub const MAX_RUNS: usize = 5;
}

pub mod sact {
    pub const MIN_WAIT: usize = 3;
}

pub mod iacn {
    pub const LHS_TYPE: usize = 10;
    pub const RHS_TYPE: usize = 11;
    pub const TERMINAL_LOGIC: usize = 13;
    pub const PAREN: usize = 15;
    pub const COMPARATOR: usize = 16;
}

pub mod zacn {
    pub const LHS_QUANTITY: usize = 0;
    pub const RHS_QUANTITY: usize = 1;
    pub const COMPARATOR: usize = 2;
    pub const LHS_WELL: usize = 3;
    pub const RHS_WELL: usize = 4;
    pub const LHS_GROUP: usize = 5;
    pub const RHS_GROUP: usize = 6;
}

pub mod sacn {
    pub const RHS_VALUE: usize = 2;
}

pub mod ibran {
    pub const DOWNTREE: usize = 0;
    pub const UPTREE: usize = 1;
    pub const VFP_TABLE: usize = 2;
}

pub mod rnode {
    pub const PRESSURE: usize = 0;
}

/// A flat array cut into windows of `stride` items.
///
/// Sub-entity `sub` of entity `entity` starts at
/// `stride * (sub + max_sub * entity)`.
#[derive(Debug)]
pub struct Windows<'a, T> {
    name: &'a str,
    data: &'a [T],
    entities: usize,
    max_sub: usize,
    stride: usize,
}

impl<T> Clone for Windows<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Windows<'_, T> {}

impl<'a, T> Windows<'a, T> {
    /// Checks that `data` holds exactly `entities * max_sub * stride` items.
    ///
    /// Dimensions whose product does not fit in `usize` are reported as a
    /// mismatch against `usize::MAX`.
    pub fn new(name: &'a str, data: &'a [T], entities: usize, max_sub: usize, stride: usize) -> Result<Self> {
        let expected = entities
            .checked_mul(max_sub)
            .and_then(|n| n.checked_mul(stride))
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(EclError::DimensionMismatch { array: name.to_string(), expected, actual: data.len() });
        }
        Ok(Self { name, data, entities, max_sub, stride })
    }

    /// One window per entity.
    pub fn flat(name: &'a str, data: &'a [T], entities: usize, stride: usize) -> Result<Self> {
        Self::new(name, data, entities, 1, stride)
    }

    pub fn len(&self) -> usize {
        self.entities
    }

    pub fn is_empty(&self) -> bool {
        self.entities == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Window of sub-entity `sub` of `entity`.
    pub fn get(&self, entity: usize, sub: usize) -> Result<&'a [T]> {
        if entity >= self.entities {
            return Err(EclError::IndexOutOfRange { index: entity, len: self.entities });
        }
        if sub >= self.max_sub {
            return Err(EclError::IndexOutOfRange { index: sub, len: self.max_sub });
        }
        let offset = self.stride * (sub + self.max_sub * entity);
        Ok(&self.data[offset..offset + self.stride])
    }

    /// Window of `entity` with sub-entity zero.
    pub fn entity(&self, entity: usize) -> Result<&'a [T]> {
        self.get(entity, 0)
    }

    /// All entity blocks in file order.
    pub fn iter(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        let block = self.stride * self.max_sub;
        let data = self.data;
        (0..self.entities).map(move |e| &data[e * block..(e + 1) * block])
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

/// Item `index` of a window, zero if the window is shorter.
pub(crate) fn item<T: Copy + Default>(window: &[T], index: usize) -> T {
    window.get(index).copied().unwrap_or_default()
}

/// Word `index` of a character window, empty if the window is shorter.
pub(crate) fn word(window: &[String], index: usize) -> String {
    window.get(index).cloned().unwrap_or_default()
}

/// Concatenates 8-character words, keeping their blank padding, and trims the end.
fn join_words(words: &[String]) -> String {
    let mut text = String::with_capacity(words.len() * NAME_LENGTH);
    for w in words {
        text.push_str(&format!("{:<width$}", w, width = NAME_LENGTH));
    }
    text.trim_end().to_string()
}

/// Converts a 1-based index item into a 0-based index.
pub(crate) fn one_based(value: i32) -> Option<usize> {
    usize::try_from(value).ok().filter(|v| *v > 0).map(|v| v - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellType {
    Producer,
    OilInjector,
    WaterInjector,
    GasInjector,
    Unknown(i32),
}

impl WellType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Producer,
            2 => Self::OilInjector,
            3 => Self::WaterInjector,
            4 => Self::GasInjector,
            other => Self::Unknown(other),
        }
    }

    pub fn is_injector(&self) -> bool {
        matches!(self, Self::OilInjector | Self::WaterInjector | Self::GasInjector)
    }
}

/// Simulated well rates and pressure, in SI units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WellRates {
    pub oil: f64,
    pub water: f64,
    pub gas: f64,
    pub liquid: f64,
    pub reservoir: f64,
    pub bhp: f64,
}

/// Well control targets, in SI units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WellTargets {
    pub oil: f64,
    pub water: f64,
    pub gas: f64,
    pub liquid: f64,
    pub reservoir: f64,
    pub thp: f64,
    pub bhp: f64,
    pub datum_depth: f64,
}

/// One well connection (completion).
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    /// 0-based cell index in the grid the connection belongs to.
    pub ijk: (usize, usize, usize),
    pub seq_index: i32,
    pub open: bool,
    pub direction: i32,
    /// 1-based segment number for multi-segment wells.
    pub segment: Option<usize>,
    pub connection_factor: f64,
    pub oil_rate: f64,
    pub water_rate: f64,
    pub gas_rate: f64,
    pub reservoir_rate: f64,
    pub pressure: f64,
}

/// One segment of a multi-segment well as stored in ISEG/RSEG.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    /// 1-based segment number.
    pub number: usize,
    /// Outlet segment number; `None` for the top segment.
    pub outlet: Option<usize>,
    /// First inlet segment on the same branch.
    pub inlet: Option<usize>,
    pub branch: usize,
    pub length: f64,
    pub depth: f64,
    pub diameter: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellRecord {
    pub name: String,
    /// Position in the well arrays.
    pub index: usize,
    /// 0-based wellhead column.
    pub head: (usize, usize),
    pub group: Option<String>,
    pub well_type: WellType,
    pub open: bool,
    pub active_control: i32,
    /// 0-based multi-segment well id.
    pub msw_id: Option<usize>,
    pub targets: Option<WellTargets>,
    pub rates: Option<WellRates>,
    pub connections: Vec<ConnectionRecord>,
    pub segments: Vec<SegmentRecord>,
}

impl WellRecord {
    pub fn is_msw(&self) -> bool {
        self.msw_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Children are wells.
    Well,
    /// Children are groups.
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub name: String,
    /// Window position in the group arrays.
    pub index: usize,
    pub kind: GroupKind,
    pub children: Vec<String>,
    pub parent: Option<String>,
    /// Oil, water and gas production rates in SI units, when XGRP is present.
    pub rates: Option<(f64, f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdqCategory {
    Well,
    Group,
    Field,
    Other(char),
}

impl UdqCategory {
    /// Category from the first letter of a UDQ name.
    pub fn from_name(name: &str) -> Self {
        match name.chars().next() {
            Some('W') => Self::Well,
            Some('G') => Self::Group,
            Some('F') => Self::Field,
            Some(c) => Self::Other(c),
            None => Self::Other(' '),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UdqRecord {
    pub name: String,
    pub unit: String,
    /// Defining expression text, as stored.
    pub expression: String,
    pub category: UdqCategory,
    /// Values per entity name; unset entities are left out.
    pub values: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    Invalid,
}

impl Comparator {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Greater,
            2 => Self::Less,
            3 => Self::GreaterEqual,
            4 => Self::LessEqual,
            5 => Self::Equal,
            _ => Self::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    End,
    And,
    Or,
}

impl Logic {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::And,
            2 => Self::Or,
            _ => Self::End,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionCondition {
    pub lhs_quantity: String,
    pub rhs_quantity: String,
    pub lhs_well: String,
    pub rhs_well: String,
    pub lhs_group: String,
    pub rhs_group: String,
    pub comparator: Comparator,
    /// Comparator text as written in the deck.
    pub comparator_text: String,
    pub rhs_value: f64,
    pub logic: Logic,
    pub lhs_type: i32,
    pub rhs_type: i32,
    pub paren: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub name: String,
    pub max_runs: i32,
    /// Minimum time between runs, in seconds.
    pub min_wait: f64,
    /// Deck lines of the action body, up to but excluding `ENDACTIO`.
    pub lines: Vec<String>,
    pub conditions: Vec<ActionCondition>,
}

impl ActionRecord {
    /// The body as deck text, closed by `ENDACTIO`.
    pub fn deck_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(ACTION_END);
        text.push('\n');
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkNode {
    pub name: String,
    /// Node pressure in Pa.
    pub pressure: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkBranch {
    pub downtree: String,
    pub uptree: String,
    pub vfp_table: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub nodes: Vec<NetworkNode>,
    pub branches: Vec<NetworkBranch>,
}

/// Everything decoded from one restart step.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartState {
    pub header: RestartHeader,
    pub unit_system: UnitSystem,
    pub groups: Vec<GroupRecord>,
    pub wells: Vec<WellRecord>,
    pub udqs: Vec<UdqRecord>,
    pub actions: Vec<ActionRecord>,
    pub network: Option<Network>,
}

impl RestartState {
    /// Decodes the global part of a restart step.
    ///
    /// Groups are always decoded, wells only when `NWELLS > 0`, segments when
    /// `ISEG` is present, UDQs when any UDQ count is positive, actions when
    /// `NO_ACT > 0` and the network when it has active nodes.
    pub fn load<R: Read + Seek>(view: &ArrayView<'_, R>, tables: &UnitSystemTables) -> Result<Self> {
        let view = view.global();
        let header = RestartHeader::load(&view)?;
        let unit_system = UnitSystem::from_intehead(header.unit);
        let conv = Converter::new(tables, unit_system);

        let well_names = well_names(&view, &header)?;
        let groups = decode_groups(&view, &header, &conv, &well_names)?;
        let group_names: Vec<(usize, String)> = groups.iter().map(|g| (g.index, g.name.clone())).collect();

        let wells = if header.nwells > 0 {
            decode_wells(&view, &header, &conv, &group_names)?
        } else {
            Vec::new()
        };
        let udqs = if header.no_udqs() > 0 {
            decode_udqs(&view, &header, &well_names, &group_names)?
        } else {
            Vec::new()
        };
        let actions = if header.no_actions > 0 {
            decode_actions(&view, &header, &conv)?
        } else {
            Vec::new()
        };
        let network = if header.noactnod > 0 {
            Some(decode_network(&view, &header, &conv)?)
        } else {
            None
        };

        info!(
            "Decoded restart step {}-{:02}-{:02}: {} wells, {} groups, {} UDQs, {} actions",
            header.year,
            header.month,
            header.day,
            wells.len(),
            groups.len(),
            udqs.len(),
            actions.len()
        );
        Ok(Self { header, unit_system, groups, wells, udqs, actions, network })
    }

    pub fn well(&self, name: &str) -> Option<&WellRecord> {
        self.wells.iter().find(|w| w.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&GroupRecord> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn udq(&self, name: &str) -> Option<&UdqRecord> {
        self.udqs.iter().find(|u| u.name == name)
    }
}

/// Names of the wells of a step, in well array order.
pub(crate) fn well_names<R: Read + Seek>(view: &ArrayView<'_, R>, header: &RestartHeader) -> Result<Vec<String>> {
    if header.nwells == 0 {
        return Ok(Vec::new());
    }
    let zwel = Windows::flat("ZWEL", view.get::<String>("ZWEL")?, header.nwells, header.nzwelz)?;
    Ok(zwel.iter().map(|w| word(w, 0)).collect())
}

fn decode_groups<R: Read + Seek>(
    view: &ArrayView<'_, R>,
    header: &RestartHeader,
    conv: &Converter<'_>,
    well_names: &[String],
) -> Result<Vec<GroupRecord>> {
    if header.ngmaxz == 0 {
        return Ok(Vec::new());
    }
    let igrp_windows = Windows::flat("IGRP", view.get::<i32>("IGRP")?, header.ngmaxz, header.nigrpz)?;
    let zgrp_windows = Windows::flat("ZGRP", view.get::<String>("ZGRP")?, header.ngmaxz, header.nzgrpz)?;
    let xgrp_windows = match view.get_opt::<f64>("XGRP")? {
        Some(xgrp) => Some(Windows::flat("XGRP", xgrp, header.ngmaxz, header.nxgrpz)?),
        None => None,
    };

    // FIELD always occupies the last window.
    let field = header.ngmaxz - 1;
    let mut indices: Vec<usize> = (0..header.ngrp.min(field)).collect();
    indices.push(field);

    let name_of = |index: usize| -> Result<String> { Ok(word(zgrp_windows.entity(index)?, 0)) };

    let mut groups = Vec::with_capacity(indices.len());
    for index in indices {
        let name = name_of(index)?;
        if name.is_empty() {
            continue;
        }
        let igrp = igrp_windows.entity(index)?;
        let base = header.nwgmax;
        let kind = if item(igrp, base + igrp::GROUP_TYPE) == 1 { GroupKind::Node } else { GroupKind::Well };
        let nchild = usize::try_from(item(igrp, base + igrp::NCHILD)).unwrap_or(0).min(header.nwgmax);

        let mut children = Vec::with_capacity(nchild);
        for &child in igrp.iter().take(nchild) {
            let Some(child) = one_based(child) else { continue };
            let child_name = match kind {
                GroupKind::Well => well_names.get(child).cloned(),
                GroupKind::Node if child < header.ngmaxz => Some(name_of(child)?),
                GroupKind::Node => None,
            };
            match child_name {
                Some(child_name) => children.push(child_name),
                None => warn!("Group {} refers to unknown child {}", name, child + 1),
            }
        }

        let parent = match one_based(item(igrp, base + igrp::PARENT)) {
            Some(parent) if parent < header.ngmaxz && parent != index => Some(name_of(parent)?),
            _ => None,
        };
        let rates = match &xgrp_windows {
            Some(windows) => {
                let xgrp = windows.entity(index)?;
                Some((
                    conv.to_si(Quantity::LiquidSurfaceRate, item(xgrp, xgrp::OIL)),
                    conv.to_si(Quantity::LiquidSurfaceRate, item(xgrp, xgrp::WATER)),
                    conv.to_si(Quantity::GasSurfaceRate, item(xgrp, xgrp::GAS)),
                ))
            }
            None => None,
        };
        debug!("Group {} ({:?}) with {} children", name, kind, children.len());
        groups.push(GroupRecord { name, index, kind, children, parent, rates });
    }
    Ok(groups)
}

/// Decodes the connections of well `well` from ICON/SCON/XCON windows.
pub(crate) fn decode_connections(
    icon: &Windows<'_, i32>,
    scon: Option<&Windows<'_, f32>>,
    xcon: Option<&Windows<'_, f64>>,
    well: usize,
    count: usize,
    conv: &Converter<'_>,
) -> Result<Vec<ConnectionRecord>> {
    let mut connections = Vec::with_capacity(count);
    for c in 0..count {
        let ic = icon.get(well, c)?;
        let ijk = (
            one_based(item(ic, icon::I)).unwrap_or(0),
            one_based(item(ic, icon::J)).unwrap_or(0),
            one_based(item(ic, icon::K)).unwrap_or(0),
        );
        let connection_factor = match scon {
            Some(scon) => f64::from(item(scon.get(well, c)?, scon::CONNECTION_FACTOR)),
            None => 0.0,
        };
        let xc = match xcon {
            Some(xcon) => xcon.get(well, c)?,
            None => &[],
        };
        let segment = usize::try_from(item(ic, icon::SEGMENT)).ok().filter(|s| *s > 0);
        connections.push(ConnectionRecord {
            ijk,
            seq_index: item(ic, icon::SEQ_INDEX),
            open: item(ic, icon::STATUS) > 0,
            direction: item(ic, icon::DIRECTION),
            segment,
            connection_factor,
            oil_rate: conv.to_si(Quantity::LiquidSurfaceRate, item(xc, xcon::OIL)),
            water_rate: conv.to_si(Quantity::LiquidSurfaceRate, item(xc, xcon::WATER)),
            gas_rate: conv.to_si(Quantity::GasSurfaceRate, item(xc, xcon::GAS)),
            reservoir_rate: conv.to_si(Quantity::ReservoirRate, item(xc, xcon::RESV)),
            pressure: conv.to_si(Quantity::Pressure, item(xc, xcon::PRESSURE)),
        });
    }
    Ok(connections)
}

/// The connection arrays of a view, checked against the header.
pub(crate) struct ConnectionArrays<'a> {
    pub icon: Windows<'a, i32>,
    pub scon: Option<Windows<'a, f32>>,
    pub xcon: Option<Windows<'a, f64>>,
}

impl<'a> ConnectionArrays<'a> {
    pub fn load<R: Read + Seek>(view: &ArrayView<'a, R>, header: &RestartHeader) -> Result<Self> {
        let (nw, nc) = (header.nwells, header.ncwmax);
        let icon = Windows::new("ICON", view.get::<i32>("ICON")?, nw, nc, header.niconz)?;
        let scon = match view.get_opt::<f32>("SCON")? {
            Some(data) => Some(Windows::new("SCON", data, nw, nc, header.nsconz)?),
            None => None,
        };
        let xcon = match view.get_opt::<f64>("XCON")? {
            Some(data) => Some(Windows::new("XCON", data, nw, nc, header.nxconz)?),
            None => None,
        };
        Ok(Self { icon, scon, xcon })
    }

    pub fn decode(&self, well: usize, count: usize, conv: &Converter<'_>) -> Result<Vec<ConnectionRecord>> {
        decode_connections(&self.icon, self.scon.as_ref(), self.xcon.as_ref(), well, count, conv)
    }
}

fn decode_segments(
    iseg: &Windows<'_, i32>,
    rseg: Option<&Windows<'_, f64>>,
    msw: usize,
    count: usize,
    conv: &Converter<'_>,
) -> Result<Vec<SegmentRecord>> {
    let mut segments = Vec::with_capacity(count);
    for s in 0..count {
        let is = iseg.get(msw, s)?;
        let rs = match rseg {
            Some(rseg) => rseg.get(msw, s)?,
            None => &[],
        };
        segments.push(SegmentRecord {
            number: s + 1,
            outlet: usize::try_from(item(is, iseg::OUTLET)).ok().filter(|o| *o > 0),
            inlet: usize::try_from(item(is, iseg::INLET)).ok().filter(|i| *i > 0),
            branch: usize::try_from(item(is, iseg::BRANCH)).unwrap_or(0),
            length: conv.to_si(Quantity::Length, item(rs, rseg::LENGTH)),
            depth: conv.to_si(Quantity::Length, item(rs, rseg::DEPTH)),
            diameter: conv.to_si(Quantity::Length, item(rs, rseg::DIAMETER)),
        });
    }
    Ok(segments)
}

pub(crate) fn decode_wells<R: Read + Seek>(
    view: &ArrayView<'_, R>,
    header: &RestartHeader,
    conv: &Converter<'_>,
    group_names: &[(usize, String)],
) -> Result<Vec<WellRecord>> {
    let nw = header.nwells;
    let names = well_names(view, header)?;
    let iwel_windows = Windows::flat("IWEL", view.get::<i32>("IWEL")?, nw, header.niwelz)?;
    let swel_windows = match view.get_opt::<f32>("SWEL")? {
        Some(data) => Some(Windows::flat("SWEL", data, nw, header.nswelz)?),
        None => None,
    };
    let xwel_windows = match view.get_opt::<f64>("XWEL")? {
        Some(data) => Some(Windows::flat("XWEL", data, nw, header.nxwelz)?),
        None => None,
    };
    let connections = if view.has_key("ICON") { Some(ConnectionArrays::load(view, header)?) } else { None };
    let iseg_windows = match view.get_opt::<i32>("ISEG")? {
        Some(data) => Some(Windows::new("ISEG", data, header.nswlmx, header.nsegmx, header.nisegz)?),
        None => None,
    };
    let rseg_windows = match view.get_opt::<f64>("RSEG")? {
        Some(data) if iseg_windows.is_some() => {
            Some(Windows::new("RSEG", data, header.nswlmx, header.nsegmx, header.nrsegz)?)
        }
        _ => None,
    };

    let mut wells = Vec::with_capacity(nw);
    for (index, name) in names.into_iter().enumerate() {
        let iw = iwel_windows.entity(index)?;
        let group = one_based(item(iw, iwel::GROUP))
            .and_then(|g| group_names.iter().find(|(i, _)| *i == g))
            .map(|(_, n)| n.clone());

        let targets = match &swel_windows {
            Some(windows) => {
                let sw = windows.entity(index)?;
                let v = |i: usize| f64::from(item(sw, i));
                Some(WellTargets {
                    oil: conv.to_si(Quantity::LiquidSurfaceRate, v(swel::OIL)),
                    water: conv.to_si(Quantity::LiquidSurfaceRate, v(swel::WATER)),
                    gas: conv.to_si(Quantity::GasSurfaceRate, v(swel::GAS)),
                    liquid: conv.to_si(Quantity::LiquidSurfaceRate, v(swel::LIQUID)),
                    reservoir: conv.to_si(Quantity::ReservoirRate, v(swel::RESV)),
                    thp: conv.to_si(Quantity::Pressure, v(swel::THP)),
                    bhp: conv.to_si(Quantity::Pressure, v(swel::BHP)),
                    datum_depth: conv.to_si(Quantity::Length, v(swel::DATUM_DEPTH)),
                })
            }
            None => None,
        };
        let rates = match &xwel_windows {
            Some(windows) => {
                let xw = windows.entity(index)?;
                Some(WellRates {
                    oil: conv.to_si(Quantity::LiquidSurfaceRate, item(xw, xwel::OIL)),
                    water: conv.to_si(Quantity::LiquidSurfaceRate, item(xw, xwel::WATER)),
                    gas: conv.to_si(Quantity::GasSurfaceRate, item(xw, xwel::GAS)),
                    liquid: conv.to_si(Quantity::LiquidSurfaceRate, item(xw, xwel::LIQUID)),
                    reservoir: conv.to_si(Quantity::ReservoirRate, item(xw, xwel::VOID)),
                    bhp: conv.to_si(Quantity::Pressure, item(xw, xwel::BHP)),
                })
            }
            None => None,
        };

        let ncon = usize::try_from(item(iw, iwel::NCONN)).unwrap_or(0).min(header.ncwmax);
        let well_connections = match &connections {
            Some(arrays) => arrays.decode(index, ncon, conv)?,
            None => Vec::new(),
        };

        let msw_id = one_based(item(iw, iwel::MSW_ID));
        let segments = match (msw_id, &iseg_windows) {
            (Some(msw), Some(iseg)) if msw < header.nswlmx => {
                let nseg = usize::try_from(item(iw, iwel::NWSEG)).unwrap_or(0).min(header.nsegmx);
                decode_segments(iseg, rseg_windows.as_ref(), msw, nseg, conv)?
            }
            (Some(msw), Some(_)) => {
                warn!("Well {} has segment id {} beyond NSWLMX={}", name, msw + 1, header.nswlmx);
                Vec::new()
            }
            _ => Vec::new(),
        };

        debug!("Well {}: {} connections, {} segments", name, well_connections.len(), segments.len());
        wells.push(WellRecord {
            name,
            index,
            head: (
                one_based(item(iw, iwel::IHEAD)).unwrap_or(0),
                one_based(item(iw, iwel::JHEAD)).unwrap_or(0),
            ),
            group,
            well_type: WellType::from_code(item(iw, iwel::WTYPE)),
            open: item(iw, iwel::STATUS) > 0,
            active_control: item(iw, iwel::ACT_CTRL),
            msw_id,
            targets,
            rates,
            connections: well_connections,
            segments,
        });
    }
    Ok(wells)
}

fn decode_udqs<R: Read + Seek>(
    view: &ArrayView<'_, R>,
    header: &RestartHeader,
    well_names: &[String],
    group_names: &[(usize, String)],
) -> Result<Vec<UdqRecord>> {
    use udq_sizes::*;

    let n = header.no_udqs();
    let zudn = Windows::flat("ZUDN", view.get::<String>("ZUDN")?, n, NZUDN)?;
    Windows::flat("IUDQ", view.get::<i32>("IUDQ")?, n, NIUDQ)?;
    let zudl = match view.get_opt::<String>("ZUDL")? {
        Some(data) => Some(Windows::flat("ZUDL", data, n, NZUDL)?),
        None => None,
    };
    let dudw = match view.get_opt::<f64>("DUDW")? {
        Some(data) if header.no_well_udqs > 0 => {
            Some(Windows::flat("DUDW", data, header.no_well_udqs, header.nwmaxz)?)
        }
        _ => None,
    };
    let dudg = match view.get_opt::<f64>("DUDG")? {
        Some(data) if header.no_group_udqs > 0 => {
            Some(Windows::flat("DUDG", data, header.no_group_udqs, header.ngmaxz)?)
        }
        _ => None,
    };
    let dudf = match view.get_opt::<f64>("DUDF")? {
        Some(data) if header.no_field_udqs > 0 => Some(Windows::flat("DUDF", data, header.no_field_udqs, 1)?),
        _ => None,
    };

    let (mut nwell, mut ngroup, mut nfield) = (0, 0, 0);
    let mut udqs = Vec::with_capacity(n);
    for u in 0..n {
        let zn = zudn.entity(u)?;
        let name = word(zn, 0);
        let unit = word(zn, 1);
        let expression = match &zudl {
            Some(zudl) => join_words(zudl.entity(u)?),
            None => String::new(),
        };
        let category = UdqCategory::from_name(&name);
        let mut values = Vec::new();
        match category {
            UdqCategory::Well => {
                if let Some(dudw) = dudw.as_ref().filter(|d| nwell < d.len()) {
                    let window = dudw.entity(nwell)?;
                    for (w, well) in well_names.iter().enumerate() {
                        let value = item(window, w);
                        if value != UDQ_RESTART_DEFAULT {
                            values.push((well.clone(), value));
                        }
                    }
                }
                nwell += 1;
            }
            UdqCategory::Group => {
                if let Some(dudg) = dudg.as_ref().filter(|d| ngroup < d.len()) {
                    let window = dudg.entity(ngroup)?;
                    for (g, group) in group_names {
                        let value = item(window, *g);
                        if value != UDQ_RESTART_DEFAULT {
                            values.push((group.clone(), value));
                        }
                    }
                }
                ngroup += 1;
            }
            UdqCategory::Field => {
                if let Some(dudf) = dudf.as_ref().filter(|d| nfield < d.len()) {
                    let value = item(dudf.entity(nfield)?, 0);
                    if value != UDQ_RESTART_DEFAULT {
                        values.push(("FIELD".to_string(), value));
                    }
                }
                nfield += 1;
            }
            UdqCategory::Other(_) => {}
        }
        debug!("UDQ {} [{}] = {}: {} values", name, unit, expression, values.len());
        udqs.push(UdqRecord { name, unit, expression, category, values });
    }

    for (counted, declared) in [
        (nwell, header.no_well_udqs),
        (ngroup, header.no_group_udqs),
        (nfield, header.no_field_udqs),
    ] {
        if counted != declared {
            return Err(EclError::DimensionMismatch { array: "ZUDN".to_string(), expected: declared, actual: counted });
        }
    }
    Ok(udqs)
}

fn decode_actions<R: Read + Seek>(
    view: &ArrayView<'_, R>,
    header: &RestartHeader,
    conv: &Converter<'_>,
) -> Result<Vec<ActionRecord>> {
    use action_sizes::*;

    let na = header.no_actions;
    let zact = Windows::flat("ZACT", view.get::<String>("ZACT")?, na, NZACTZ)?;
    let iact = Windows::flat("IACT", view.get::<i32>("IACT")?, na, NIACTZ)?;
    let sact = Windows::flat("SACT", view.get::<f32>("SACT")?, na, NSACTZ)?;
    let zlact = Windows::new(
        "ZLACT",
        view.get::<String>("ZLACT")?,
        na,
        header.max_lines,
        header.max_words_per_line,
    )?;
    let conditions = if header.max_conditions > 0 {
        let nc = header.max_conditions;
        Some((
            Windows::new("ZACN", view.get::<String>("ZACN")?, na, nc, NZACNZ)?,
            Windows::new("IACN", view.get::<i32>("IACN")?, na, nc, NIACNZ)?,
            Windows::new("SACN", view.get::<f32>("SACN")?, na, nc, NSACNZ)?,
        ))
    } else {
        None
    };

    let mut actions = Vec::with_capacity(na);
    for a in 0..na {
        let name = word(zact.entity(a)?, 0);

        let mut lines = Vec::new();
        for l in 0..header.max_lines {
            let line = join_words(zlact.get(a, l)?);
            if line.trim_start().starts_with(ACTION_END) {
                break;
            }
            lines.push(line);
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        let mut action_conditions = Vec::new();
        if let Some((zacn, iacn, sacn)) = &conditions {
            for c in 0..header.max_conditions {
                let zc = zacn.get(a, c)?;
                let lhs_quantity = word(zc, zacn::LHS_QUANTITY);
                if lhs_quantity.is_empty() {
                    break;
                }
                let ic = iacn.get(a, c)?;
                let sc = sacn.get(a, c)?;
                action_conditions.push(ActionCondition {
                    lhs_quantity,
                    rhs_quantity: word(zc, zacn::RHS_QUANTITY),
                    lhs_well: word(zc, zacn::LHS_WELL),
                    rhs_well: word(zc, zacn::RHS_WELL),
                    lhs_group: word(zc, zacn::LHS_GROUP),
                    rhs_group: word(zc, zacn::RHS_GROUP),
                    comparator: Comparator::from_code(item(ic, iacn::COMPARATOR)),
                    comparator_text: word(zc, zacn::COMPARATOR),
                    rhs_value: f64::from(item(sc, sacn::RHS_VALUE)),
                    logic: Logic::from_code(item(ic, iacn::TERMINAL_LOGIC)),
                    lhs_type: item(ic, iacn::LHS_TYPE),
                    rhs_type: item(ic, iacn::RHS_TYPE),
                    paren: item(ic, iacn::PAREN),
                });
            }
        }

        debug!("Action {}: {} lines, {} conditions", name, lines.len(), action_conditions.len());
        actions.push(ActionRecord {
            name,
            max_runs: item(iact.entity(a)?, iact::MAX_RUNS),
            min_wait: conv.to_si(Quantity::Time, f64::from(item(sact.entity(a)?, sact::MIN_WAIT))),
            lines,
            conditions: action_conditions,
        });
    }
    Ok(actions)
}

fn decode_network<R: Read + Seek>(
    view: &ArrayView<'_, R>,
    header: &RestartHeader,
    conv: &Converter<'_>,
) -> Result<Network> {
    let znode = Windows::flat("ZNODE", view.get::<String>("ZNODE")?, header.nodmax, header.nznode)?;
    let rnode = match view.get_opt::<f64>("RNODE")? {
        Some(data) => Some(Windows::flat("RNODE", data, header.nodmax, header.nrnode)?),
        None => None,
    };

    let count = header.noactnod.min(header.nodmax);
    let mut nodes = Vec::with_capacity(count);
    for n in 0..count {
        let pressure = match &rnode {
            Some(rnode) => conv.to_si(Quantity::Pressure, item(rnode.entity(n)?, rnode::PRESSURE)),
            None => 0.0,
        };
        nodes.push(NetworkNode { name: word(znode.entity(n)?, 0), pressure });
    }

    let mut branches = Vec::new();
    if header.noactbr > 0 {
        let ibran_windows = Windows::flat("IBRAN", view.get::<i32>("IBRAN")?, header.nbrmax, header.nibran)?;
        let node_name = |value: i32| one_based(value).and_then(|i| nodes.get(i)).map(|n| n.name.clone());
        for b in 0..header.noactbr.min(header.nbrmax) {
            let ib = ibran_windows.entity(b)?;
            match (node_name(item(ib, ibran::DOWNTREE)), node_name(item(ib, ibran::UPTREE))) {
                (Some(downtree), Some(uptree)) => branches.push(NetworkBranch {
                    downtree,
                    uptree,
                    vfp_table: item(ib, ibran::VFP_TABLE),
                }),
                _ => warn!("Network branch {} refers to an unknown node", b + 1),
            }
        }
    }
    debug!("Network with {} nodes and {} branches", nodes.len(), branches.len());
    Ok(Network { nodes, branches })
}
