//! Unit system conversion tables.
//!
//! Restart values are stored in the deck's unit system. The decoder converts
//! them to SI through an immutable table set that callers pass in; the
//! standard tables are built once per process.

use std::sync::OnceLock;

use log::warn;

/// Seconds per day.
const DAY: f64 = 86_400.0;
/// Cubic metres per stock tank barrel.
const STB: f64 = 0.158_987_294_928;
/// Cubic metres per thousand standard cubic feet.
const MSCF: f64 = 28.316_846_592;
/// Pascal per bar.
const BAR: f64 = 1.0e5;
/// Pascal per psi.
const PSI: f64 = 6_894.757_293_168;
/// Pascal per standard atmosphere.
const ATM: f64 = 101_325.0;
/// Metres per foot.
const FOOT: f64 = 0.3048;

/// Unit system of a restart file, from INTEHEAD `UNIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    #[default]
    Metric,
    Field,
    Lab,
    PvtM,
}

impl UnitSystem {
    /// Maps the INTEHEAD flag; unknown values fall back to metric.
    pub fn from_intehead(flag: i32) -> Self {
        match flag {
            1 => Self::Metric,
            2 => Self::Field,
            3 => Self::Lab,
            4 => Self::PvtM,
            other => {
                warn!("Unknown unit system flag {}; assuming METRIC", other);
                Self::Metric
            }
        }
    }
}

/// Physical quantities that appear in decoded restart records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Pressure,
    LiquidSurfaceRate,
    GasSurfaceRate,
    ReservoirRate,
    Length,
    Time,
}

/// SI factors for one unit system: `si = value * factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitTable {
    pub pressure: f64,
    pub liquid_surface_rate: f64,
    pub gas_surface_rate: f64,
    pub reservoir_rate: f64,
    pub length: f64,
    pub time: f64,
}

impl UnitTable {
    pub fn factor(&self, quantity: Quantity) -> f64 {
        match quantity {
            Quantity::Pressure => self.pressure,
            Quantity::LiquidSurfaceRate => self.liquid_surface_rate,
            Quantity::GasSurfaceRate => self.gas_surface_rate,
            Quantity::ReservoirRate => self.reservoir_rate,
            Quantity::Length => self.length,
            Quantity::Time => self.time,
        }
    }
}

/// Conversion tables for every supported unit system.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSystemTables {
    pub metric: UnitTable,
    pub field: UnitTable,
    pub lab: UnitTable,
    pub pvt_m: UnitTable,
}

static STANDARD: OnceLock<UnitSystemTables> = OnceLock::new();

impl UnitSystemTables {
    /// The standard ECLIPSE unit definitions.
    pub fn standard() -> &'static UnitSystemTables {
        STANDARD.get_or_init(|| UnitSystemTables {
            metric: UnitTable {
                pressure: BAR,
                liquid_surface_rate: 1.0 / DAY,
                gas_surface_rate: 1.0 / DAY,
                reservoir_rate: 1.0 / DAY,
                length: 1.0,
                time: DAY,
            },
            field: UnitTable {
                pressure: PSI,
                liquid_surface_rate: STB / DAY,
                gas_surface_rate: MSCF / DAY,
                reservoir_rate: STB / DAY,
                length: FOOT,
                time: DAY,
            },
            lab: UnitTable {
                pressure: ATM,
                liquid_surface_rate: 1.0e-6 / 3600.0,
                gas_surface_rate: 1.0e-6 / 3600.0,
                reservoir_rate: 1.0e-6 / 3600.0,
                length: 0.01,
                time: 3600.0,
            },
            pvt_m: UnitTable {
                pressure: ATM,
                liquid_surface_rate: 1.0 / DAY,
                gas_surface_rate: 1.0 / DAY,
                reservoir_rate: 1.0 / DAY,
                length: 1.0,
                time: DAY,
            },
        })
    }

    pub fn table(&self, system: UnitSystem) -> &UnitTable {
        match system {
            UnitSystem::Metric => &self.metric,
            UnitSystem::Field => &self.field,
            UnitSystem::Lab => &self.lab,
            UnitSystem::PvtM => &self.pvt_m,
        }
    }

    /// Converts `value` of `quantity` from `system` units to SI.
    pub fn to_si(&self, system: UnitSystem, quantity: Quantity, value: f64) -> f64 {
        value * self.table(system).factor(quantity)
    }
}

/// A unit system bound to its table, used while decoding one step.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    pub system: UnitSystem,
    table: &'a UnitTable,
}

impl<'a> Converter<'a> {
    pub fn new(tables: &'a UnitSystemTables, system: UnitSystem) -> Self {
        Self { system, table: tables.table(system) }
    }

    pub fn to_si(&self, quantity: Quantity, value: f64) -> f64 {
        value * self.table.factor(quantity)
    }
}
