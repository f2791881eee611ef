// src/input.rs

use csv::{ReaderBuilder, Trim};
use serde::{de::DeserializeOwned, Deserialize};
use std::{fs::File, io::Read, path::Path};
use tracing::debug;

use crate::{
    error::{Error, Result},
    model::{Fate, Polymer, Sector},
    normalize::clean_str,
};

/// One (region, year) row of the simulation output. Masses stay as the
/// decimal strings the file carries until the indexer parses them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawSimulationRow {
    pub region: String,
    pub year: String,
    #[serde(rename = "eolLandfillMT")]
    pub eol_landfill: String,
    #[serde(rename = "eolIncinerationMT")]
    pub eol_incineration: String,
    #[serde(rename = "eolMismanagedMT")]
    pub eol_mismanaged: String,
    #[serde(rename = "eolRecyclingMT")]
    pub eol_recycling: String,
    #[serde(rename = "consumptionTransportationMT")]
    pub consumption_transportation: String,
    #[serde(rename = "consumptionPackagingMT")]
    pub consumption_packaging: String,
    #[serde(rename = "consumptionConstructionMT")]
    pub consumption_construction: String,
    #[serde(rename = "consumptionElectronicMT")]
    pub consumption_electronic: String,
    #[serde(rename = "consumptionHouseholdLeisureSportsMT")]
    pub consumption_household_leisure_sports: String,
    #[serde(rename = "consumptionAgricultureMT")]
    pub consumption_agriculture: String,
    #[serde(rename = "consumptionOtherMT")]
    pub consumption_other: String,
}

impl RawSimulationRow {
    pub fn fate_mass(&self, fate: Fate) -> &str {
        match fate {
            Fate::Landfill => &self.eol_landfill,
            Fate::Incineration => &self.eol_incineration,
            Fate::Mismanaged => &self.eol_mismanaged,
            Fate::Recycling => &self.eol_recycling,
        }
    }

    pub fn sector_mass(&self, sector: Sector) -> &str {
        match sector {
            Sector::Transportation => &self.consumption_transportation,
            Sector::Packaging => &self.consumption_packaging,
            Sector::Construction => &self.consumption_construction,
            Sector::Electronic => &self.consumption_electronic,
            Sector::HouseholdLeisureSports => &self.consumption_household_leisure_sports,
            Sector::Agriculture => &self.consumption_agriculture,
            Sector::Other => &self.consumption_other,
        }
    }
}

/// One (region, sector) row of the static polymer matrix, percentages as
/// strings such as `"12.5%"`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawPolymerRow {
    pub region: String,
    pub sector: String,
    pub ldpe: String,
    pub hdpe: String,
    pub pp: String,
    pub ps: String,
    pub pvc: String,
    pub pet: String,
    pub pur: String,
    #[serde(rename = "other thermoplastics")]
    pub other_thermoplastics: String,
    #[serde(rename = "other thermosets")]
    pub other_thermosets: String,
}

impl RawPolymerRow {
    pub fn percent(&self, polymer: Polymer) -> &str {
        match polymer {
            Polymer::Ldpe => &self.ldpe,
            Polymer::Hdpe => &self.hdpe,
            Polymer::Pp => &self.pp,
            Polymer::Ps => &self.ps,
            Polymer::Pvc => &self.pvc,
            Polymer::Pet => &self.pet,
            Polymer::Pur => &self.pur,
            Polymer::OtherThermoplastics => &self.other_thermoplastics,
            Polymer::OtherThermosets => &self.other_thermosets,
        }
    }
}

/// Parse a decimal mass. Non-finite values count as malformed.
pub fn parse_mass(field: &str, raw: &str) -> Result<f64> {
    let cleaned = clean_str(raw);
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::MalformedNumber {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Parse `"<number>%"` into a fraction (`"12.5%"` → `0.125`).
pub fn parse_percent(field: &str, raw: &str) -> Result<f64> {
    let cleaned = clean_str(raw);
    let number = cleaned.strip_suffix('%').unwrap_or(cleaned);
    parse_mass(field, number)
        .map(|v| v / 100.0)
        .map_err(|_| Error::MalformedNumber {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Parse a year label. `2020.0` is accepted, `2020.5` is not.
pub fn parse_year(raw: &str) -> Result<u32> {
    let cleaned = clean_str(raw);
    if let Ok(year) = cleaned.parse::<u32>() {
        return Ok(year);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
            Ok(v as u32)
        }
        _ => Err(Error::MalformedNumber {
            field: "year".to_string(),
            value: raw.to_string(),
        }),
    }
}

fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    rdr.deserialize().map(|r| r.map_err(Error::from)).collect()
}

/// Read simulation rows from any CSV source with a header row.
pub fn read_simulation_from<R: Read>(reader: R) -> Result<Vec<RawSimulationRow>> {
    read_rows(reader)
}

/// Read polymer matrix rows from any CSV source with a header row.
pub fn read_polymer_from<R: Read>(reader: R) -> Result<Vec<RawPolymerRow>> {
    read_rows(reader)
}

#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_simulation_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawSimulationRow>> {
    let rows = read_simulation_from(File::open(&path)?)?;
    debug!(rows = rows.len(), "read simulation rows");
    Ok(rows)
}

#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_polymer_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawPolymerRow>> {
    let rows = read_polymer_from(File::open(&path)?)?;
    debug!(rows = rows.len(), "read polymer matrix rows");
    Ok(rows)
}
