//! Vertical flow performance (lift curve) tables.
//!
//! A production table gives bottom hole pressure over five axes: flow rate,
//! tubing head pressure, water fraction, gas fraction and artificial lift
//! quantity. Values are kept in deck units.

use std::io::{BufRead, Seek};

use log::{debug, warn};

use crate::ecl::format::grdecl::{read_keyword_name, read_records, seek_keyword, DEFAULT_ITEM};
use crate::ecl::types::error::{EclError, Result};

pub const VFPPROD_KW: &str = "VFPPROD";

/// Records of a VFPPROD keyword before the BHP records.
const VFPPROD_HEADER_RECORDS: usize = 6;

/// The five axes of a table, each strictly ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VfpAxes {
    pub flow: Vec<f64>,
    pub thp: Vec<f64>,
    pub wfr: Vec<f64>,
    pub gfr: Vec<f64>,
    pub alq: Vec<f64>,
}

impl VfpAxes {
    fn named(&self) -> [(&'static str, &[f64]); 5] {
        [
            ("THP", &self.thp),
            ("WFR", &self.wfr),
            ("GFR", &self.gfr),
            ("ALQ", &self.alq),
            ("FLOW", &self.flow),
        ]
    }

    /// Axis lengths in storage order `(t, w, g, a, f)`.
    pub fn shape(&self) -> [usize; 5] {
        [self.thp.len(), self.wfr.len(), self.gfr.len(), self.alq.len(), self.flow.len()]
    }
}

/// Position of one BHP-over-THP slice, `(w, g, a, f)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfpSlice {
    pub w: usize,
    pub g: usize,
    pub a: usize,
    pub f: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VfpTable {
    id: u32,
    datum_depth: f64,
    axes: VfpAxes,
    values: Vec<f64>,
    strides: [usize; 5],
    violations: Vec<VfpSlice>,
}

impl VfpTable {
    /// Builds a table from axes and a row-major `(t, w, g, a, f)` value buffer.
    ///
    /// BHP decreasing with THP is accepted and logged; see
    /// [`monotonicity_violations`](Self::monotonicity_violations).
    pub fn new(id: u32, datum_depth: f64, axes: VfpAxes, values: Vec<f64>) -> Result<Self> {
        let invalid = |reason: String| EclError::InvalidVfpTable { table: id, reason };

        for (name, axis) in axes.named() {
            if axis.is_empty() {
                return Err(invalid(format!("{} axis is empty", name)));
            }
            if let Some(pos) = axis.windows(2).position(|p| !(p[0] < p[1])) {
                return Err(invalid(format!(
                    "{} axis is not ascending at position {} ({} then {})",
                    name,
                    pos + 1,
                    axis[pos],
                    axis[pos + 1]
                )));
            }
        }

        let shape = axes.shape();
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(invalid(format!("expected {} values, found {}", expected, values.len())));
        }

        let mut strides = [1usize; 5];
        for d in (0..4).rev() {
            strides[d] = strides[d + 1] * shape[d + 1];
        }

        let mut table = Self { id, datum_depth, axes, values, strides, violations: Vec::new() };
        if let Some(flat) = table.values.iter().position(|v| !v.is_finite()) {
            let [t, w, g, a, f] = table.unflatten(flat);
            return Err(EclError::MissingVfpValue { table: id, t, w, g, a, f });
        }
        table.violations = table.find_violations();
        if !table.violations.is_empty() {
            warn!(
                "VFP table {} has {} slices where BHP decreases with THP (first at w={}, g={}, a={}, f={})",
                id,
                table.violations.len(),
                table.violations[0].w,
                table.violations[0].g,
                table.violations[0].a,
                table.violations[0].f
            );
        }
        debug!("VFP table {} with shape {:?}", id, shape);
        Ok(table)
    }

    fn unflatten(&self, mut flat: usize) -> [usize; 5] {
        let mut index = [0usize; 5];
        for (d, stride) in self.strides.iter().enumerate() {
            index[d] = flat / stride;
            flat %= stride;
        }
        index
    }

    fn find_violations(&self) -> Vec<VfpSlice> {
        let [nt, nw, ng, na, nf] = self.axes.shape();
        let mut violations = Vec::new();
        for w in 0..nw {
            for g in 0..ng {
                for a in 0..na {
                    for f in 0..nf {
                        let at = |t: usize| self.values[self.flat(t, w, g, a, f)];
                        if (1..nt).any(|t| at(t) < at(t - 1)) {
                            violations.push(VfpSlice { w, g, a, f });
                        }
                    }
                }
            }
        }
        violations
    }

    fn flat(&self, t: usize, w: usize, g: usize, a: usize, f: usize) -> usize {
        t * self.strides[0] + w * self.strides[1] + g * self.strides[2] + a * self.strides[3] + f
    }

    /// Flat buffer index of a cell, `None` outside the table.
    pub fn index(&self, t: usize, w: usize, g: usize, a: usize, f: usize) -> Option<usize> {
        let shape = self.axes.shape();
        let within = [t, w, g, a, f].iter().zip(shape).all(|(i, n)| *i < n);
        within.then(|| self.flat(t, w, g, a, f))
    }

    pub fn get(&self, t: usize, w: usize, g: usize, a: usize, f: usize) -> Option<f64> {
        self.index(t, w, g, a, f).map(|i| self.values[i])
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn datum_depth(&self) -> f64 {
        self.datum_depth
    }

    pub fn axes(&self) -> &VfpAxes {
        &self.axes
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Slices in which BHP decreases as THP increases.
    pub fn monotonicity_violations(&self) -> &[VfpSlice] {
        &self.violations
    }

    /// Builds a production table from the records of a VFPPROD keyword.
    ///
    /// Record 1 holds the table number and datum depth, records 2 to 6 the
    /// flow, THP, WFR, GFR and ALQ axes. Each following record starts with
    /// the 1-based THP, WFR, GFR and ALQ indices and then lists BHP for
    /// every flow value. Cells without a record stay unset.
    pub fn from_vfpprod_records(records: &[Vec<String>]) -> Result<Self> {
        let bad = |reason: String| EclError::InvalidVfpTable { table: 0, reason };
        if records.len() < VFPPROD_HEADER_RECORDS {
            return Err(bad(format!("VFPPROD needs {} header records, found {}", VFPPROD_HEADER_RECORDS, records.len())));
        }
        let first = &records[0];
        let id: u32 = first
            .first()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| bad("missing table number".to_string()))?;
        let datum_depth = first
            .get(1)
            .and_then(|v| parse_number(v))
            .ok_or_else(|| EclError::InvalidVfpTable { table: id, reason: "missing datum depth".to_string() })?;

        let axis = |index: usize, name: &str| -> Result<Vec<f64>> {
            records[index]
                .iter()
                .map(|v| {
                    parse_number(v).ok_or_else(|| EclError::InvalidVfpTable {
                        table: id,
                        reason: format!("bad {} axis value '{}'", name, v),
                    })
                })
                .collect()
        };
        let axes = VfpAxes {
            flow: axis(1, "FLOW")?,
            thp: axis(2, "THP")?,
            wfr: axis(3, "WFR")?,
            gfr: axis(4, "GFR")?,
            alq: axis(5, "ALQ")?,
        };

        let [nt, nw, ng, na, nf] = axes.shape();
        let mut values = vec![f64::NAN; nt * nw * ng * na * nf];
        for record in &records[VFPPROD_HEADER_RECORDS..] {
            let invalid = |reason: String| EclError::InvalidVfpTable { table: id, reason };
            if record.len() < 4 {
                return Err(invalid(format!("BHP record with {} items", record.len())));
            }
            let mut at = [0usize; 4];
            for (slot, (item, n)) in at.iter_mut().zip(record.iter().zip([nt, nw, ng, na])) {
                *slot = item
                    .parse::<usize>()
                    .ok()
                    .filter(|i| (1..=n).contains(i))
                    .map(|i| i - 1)
                    .ok_or_else(|| invalid(format!("BHP record index '{}' out of range 1..={}", item, n)))?;
            }
            let [t, w, g, a] = at;
            for (f, item) in record[4..].iter().take(nf).enumerate() {
                if let Some(value) = parse_number(item) {
                    values[(((t * nw + w) * ng + g) * na + a) * nf + f] = value;
                }
            }
        }
        Self::new(id, datum_depth, axes, values)
    }
}

/// Parses a deck number; `*` defaults read as unset.
fn parse_number(item: &str) -> Option<f64> {
    if item == DEFAULT_ITEM {
        return None;
    }
    item.replace(['d', 'D'], "E").parse().ok()
}

/// Reads the next VFPPROD keyword of a deck.
///
/// Returns `None` when the deck has no further VFPPROD keyword.
pub fn read_vfpprod<R: BufRead + Seek>(stream: &mut R) -> Result<Option<VfpTable>> {
    if !seek_keyword(VFPPROD_KW, false, stream)? {
        return Ok(None);
    }
    read_keyword_name(stream)?;
    let mut records = read_records(stream, VFPPROD_HEADER_RECORDS)?;
    let count: usize = records[2..VFPPROD_HEADER_RECORDS].iter().map(Vec::len).product();
    records.extend(read_records(stream, count)?);
    VfpTable::from_vfpprod_records(&records).map(Some)
}
