// src/index.rs

use serde::{Deserialize, Serialize};
use std::collections::{hash_map::Entry, BTreeMap, HashMap};
use std::hash::Hash;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    input::{parse_mass, parse_percent, parse_year, RawPolymerRow, RawSimulationRow},
    model::{Fate, Polymer, RegionSector, RegionYear, Sector},
    normalize::normalize_region,
};

pub type FatePropensity = HashMap<RegionYear, BTreeMap<Fate, f64>>;
pub type SectorPropensity = HashMap<RegionYear, BTreeMap<Sector, f64>>;
pub type TotalWaste = HashMap<RegionYear, f64>;
pub type SectorPolymerPropensity = HashMap<RegionSector, BTreeMap<Polymer, f64>>;

/// What to do when two rows land on the same key after region normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    LastWins,
}

fn insert_keyed<K, V>(
    table: &'static str,
    map: &mut HashMap<K, V>,
    key: K,
    value: V,
    policy: DuplicatePolicy,
) -> Result<()>
where
    K: Eq + Hash + std::fmt::Display,
{
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => match policy {
            DuplicatePolicy::Reject => {
                return Err(Error::DuplicateKey {
                    table,
                    key: slot.key().to_string(),
                })
            }
            DuplicatePolicy::LastWins => {
                warn!(table, key = %slot.key(), "duplicate key, keeping last row");
                slot.insert(value);
            }
        },
    }
    Ok(())
}

fn row_key(row: &RawSimulationRow) -> Result<RegionYear> {
    Ok(RegionYear::new(normalize_region(&row.region), parse_year(&row.year)?))
}

/// Parse the four fate masses of a row and return them with their sum.
fn fate_masses(row: &RawSimulationRow, key: &RegionYear) -> Result<(BTreeMap<Fate, f64>, f64)> {
    let mut masses = BTreeMap::new();
    for fate in Fate::ALL {
        let field = format!("{} ({})", fate.label(), key);
        masses.insert(fate, parse_mass(&field, row.fate_mass(fate))?);
    }
    let total: f64 = masses.values().sum();
    Ok((masses, total))
}

/// Divide every value by `total`, refusing an undefined share.
fn normalize_shares<C: Ord + Copy>(
    table: &'static str,
    key: &impl std::fmt::Display,
    values: BTreeMap<C, f64>,
    total: f64,
) -> Result<BTreeMap<C, f64>> {
    if total == 0.0 {
        return Err(Error::ZeroTotal {
            table,
            key: key.to_string(),
        });
    }
    Ok(values.into_iter().map(|(c, v)| (c, v / total)).collect())
}

/// Fraction of each (region, year)'s waste that goes to each fate.
pub fn build_fate_propensity(
    rows: &[RawSimulationRow],
    policy: DuplicatePolicy,
) -> Result<FatePropensity> {
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = row_key(row)?;
        let (masses, total) = fate_masses(row, &key)?;
        let shares = normalize_shares("fate_propensity", &key, masses, total)?;
        insert_keyed("fate_propensity", &mut out, key, shares, policy)?;
    }
    Ok(out)
}

/// Fraction of each (region, year)'s consumption that belongs to each sector.
pub fn build_sector_propensity(
    rows: &[RawSimulationRow],
    policy: DuplicatePolicy,
) -> Result<SectorPropensity> {
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = row_key(row)?;
        let mut masses = BTreeMap::new();
        for sector in Sector::ALL {
            let field = format!("{} ({})", sector.label(), key);
            masses.insert(sector, parse_mass(&field, row.sector_mass(sector))?);
        }
        let total: f64 = masses.values().sum();
        let shares = normalize_shares("sector_propensity", &key, masses, total)?;
        insert_keyed("sector_propensity", &mut out, key, shares, policy)?;
    }
    Ok(out)
}

/// Raw waste mass per (region, year): the sum of the four fate masses.
pub fn build_total_waste(rows: &[RawSimulationRow], policy: DuplicatePolicy) -> Result<TotalWaste> {
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = row_key(row)?;
        let (_, total) = fate_masses(row, &key)?;
        if total == 0.0 {
            return Err(Error::ZeroTotal {
                table: "total_waste",
                key: key.to_string(),
            });
        }
        insert_keyed("total_waste", &mut out, key, total, policy)?;
    }
    Ok(out)
}

/// Polymer composition per (region, sector), re-normalized so each row's
/// shares sum to one even when the source percentages are rounded.
pub fn build_sector_polymer_propensity(
    rows: &[RawPolymerRow],
    policy: DuplicatePolicy,
) -> Result<SectorPolymerPropensity> {
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = RegionSector::new(normalize_region(&row.region), row.sector.as_str());
        let mut fractions = BTreeMap::new();
        for polymer in Polymer::ALL {
            let field = format!("{} ({})", polymer.label(), key);
            fractions.insert(polymer, parse_percent(&field, row.percent(polymer))?);
        }
        let total: f64 = fractions.values().sum();
        if (total - 1.0).abs() > 0.01 {
            debug!(key = %key, total, "polymer percentages far from 100%");
        }
        let shares = normalize_shares("sector_polymer_propensity", &key, fractions, total)?;
        insert_keyed("sector_polymer_propensity", &mut out, key, shares, policy)?;
    }
    Ok(out)
}

/// The four read-only lookup tables, built once before allocation.
#[derive(Debug, Clone, Default)]
pub struct Index {
    pub fate_propensity: FatePropensity,
    pub sector_propensity: SectorPropensity,
    pub total_waste: TotalWaste,
    pub sector_polymer_propensity: SectorPolymerPropensity,
}

impl Index {
    #[tracing::instrument(level = "info", skip_all, fields(simulation = simulation.len(), polymers = polymers.len()))]
    pub fn build(
        simulation: &[RawSimulationRow],
        polymers: &[RawPolymerRow],
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        let index = Self {
            fate_propensity: build_fate_propensity(simulation, policy)?,
            sector_propensity: build_sector_propensity(simulation, policy)?,
            total_waste: build_total_waste(simulation, policy)?,
            sector_polymer_propensity: build_sector_polymer_propensity(polymers, policy)?,
        };
        info!(
            region_years = index.total_waste.len(),
            region_sectors = index.sector_polymer_propensity.len(),
            "built lookup tables"
        );
        Ok(index)
    }
}
