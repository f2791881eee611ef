// src/model.rs

use std::{fmt, ops::RangeInclusive};

/// End-of-life fate of plastic waste. Labels are the simulation column names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fate {
    Landfill,
    Incineration,
    Mismanaged,
    Recycling,
}

impl Fate {
    pub const ALL: [Fate; 4] = [
        Fate::Landfill,
        Fate::Incineration,
        Fate::Mismanaged,
        Fate::Recycling,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Fate::Landfill => "eolLandfillMT",
            Fate::Incineration => "eolIncinerationMT",
            Fate::Mismanaged => "eolMismanagedMT",
            Fate::Recycling => "eolRecyclingMT",
        }
    }
}

/// Consumption sector. The label is the simulation column name, which is
/// also the value the polymer matrix carries in its `sector` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sector {
    Transportation,
    Packaging,
    Construction,
    Electronic,
    HouseholdLeisureSports,
    Agriculture,
    Other,
}

impl Sector {
    pub const ALL: [Sector; 7] = [
        Sector::Transportation,
        Sector::Packaging,
        Sector::Construction,
        Sector::Electronic,
        Sector::HouseholdLeisureSports,
        Sector::Agriculture,
        Sector::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Sector::Transportation => "consumptionTransportationMT",
            Sector::Packaging => "consumptionPackagingMT",
            Sector::Construction => "consumptionConstructionMT",
            Sector::Electronic => "consumptionElectronicMT",
            Sector::HouseholdLeisureSports => "consumptionHouseholdLeisureSportsMT",
            Sector::Agriculture => "consumptionAgricultureMT",
            Sector::Other => "consumptionOtherMT",
        }
    }
}

/// Plastic resin. Labels are the polymer matrix column names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Polymer {
    Ldpe,
    Hdpe,
    Pp,
    Ps,
    Pvc,
    Pet,
    Pur,
    OtherThermoplastics,
    OtherThermosets,
}

impl Polymer {
    pub const ALL: [Polymer; 9] = [
        Polymer::Ldpe,
        Polymer::Hdpe,
        Polymer::Pp,
        Polymer::Ps,
        Polymer::Pvc,
        Polymer::Pet,
        Polymer::Pur,
        Polymer::OtherThermoplastics,
        Polymer::OtherThermosets,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Polymer::Ldpe => "ldpe",
            Polymer::Hdpe => "hdpe",
            Polymer::Pp => "pp",
            Polymer::Ps => "ps",
            Polymer::Pvc => "pvc",
            Polymer::Pet => "pet",
            Polymer::Pur => "pur",
            Polymer::OtherThermoplastics => "other thermoplastics",
            Polymer::OtherThermosets => "other thermosets",
        }
    }
}

macro_rules! display_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_label!(Fate, Sector, Polymer);

/// Key of the fate, sector and total-waste tables.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionYear {
    pub region: String,
    pub year: u32,
}

impl RegionYear {
    pub fn new(region: impl Into<String>, year: u32) -> Self {
        Self {
            region: region.into(),
            year,
        }
    }
}

impl fmt::Display for RegionYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.year)
    }
}

/// Key of the sector-polymer table. `sector` is the matrix label exactly as
/// read, with no trimming or case folding. A label that is not a
/// [`Sector::label`] is never looked up, so the allocator reports that sector
/// as [`crate::error::Error::MissingKey`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionSector {
    pub region: String,
    pub sector: String,
}

impl RegionSector {
    pub fn new(region: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            sector: sector.into(),
        }
    }
}

impl fmt::Display for RegionSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.sector)
    }
}

/// Mass attributed to one (region, year, sector, polymer, fate).
#[derive(Clone, Debug, PartialEq)]
pub struct EstimatedRecord {
    pub region: String,
    pub year: u32,
    pub sector: Sector,
    pub polymer: Polymer,
    pub fate: Fate,
    pub mass: f64,
}

/// Grouping key of the output: an estimate with the sector dropped.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputKey {
    pub region: String,
    pub year: u32,
    pub polymer: Polymer,
    pub fate: Fate,
}

impl From<&EstimatedRecord> for OutputKey {
    fn from(est: &EstimatedRecord) -> Self {
        Self {
            region: est.region.clone(),
            year: est.year,
            polymer: est.polymer,
            fate: est.fate,
        }
    }
}

/// One line of the output file.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    pub region: String,
    pub year: u32,
    pub polymer: Polymer,
    pub fate: Fate,
    pub amount: f64,
}

impl OutputRecord {
    pub fn from_key(key: OutputKey, amount: f64) -> Self {
        Self {
            region: key.region,
            year: key.year,
            polymer: key.polymer,
            fate: key.fate,
            amount,
        }
    }
}

pub const DEFAULT_REGIONS: [&str; 4] = ["china", "eu30", "na", "mw"];
pub const DEFAULT_YEARS: RangeInclusive<u32> = 2011..=2050;

/// The regions and years the allocator walks. Sectors, polymers and fates
/// are fixed enumerations.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationSpace {
    pub regions: Vec<String>,
    pub years: RangeInclusive<u32>,
}

impl Default for IterationSpace {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            years: DEFAULT_YEARS,
        }
    }
}

impl IterationSpace {
    pub fn new(regions: Vec<String>, years: RangeInclusive<u32>) -> Self {
        Self { regions, years }
    }

    pub fn year_count(&self) -> usize {
        self.years.clone().count()
    }

    /// Every (region, year) pair, regions outermost.
    pub fn region_years(&self) -> impl Iterator<Item = RegionYear> + '_ {
        self.regions.iter().flat_map(move |region| {
            self.years
                .clone()
                .map(move |year| RegionYear::new(region.as_str(), year))
        })
    }

    /// Number of estimates the allocator produces over this space.
    pub fn estimate_count(&self) -> usize {
        self.output_count() * Sector::ALL.len()
    }

    /// Number of output records after summing over sectors.
    pub fn output_count(&self) -> usize {
        self.regions.len() * self.year_count() * Polymer::ALL.len() * Fate::ALL.len()
    }
}
