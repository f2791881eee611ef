// src/fixtures.rs
//! Synthetic rows shared by the unit tests.

use crate::{
    input::{RawPolymerRow, RawSimulationRow},
    model::{IterationSpace, Sector},
};

pub(crate) fn sim_row(
    region: &str,
    year: &str,
    fates: [&str; 4],
    sectors: [&str; 7],
) -> RawSimulationRow {
    RawSimulationRow {
        region: region.into(),
        year: year.into(),
        eol_landfill: fates[0].into(),
        eol_incineration: fates[1].into(),
        eol_mismanaged: fates[2].into(),
        eol_recycling: fates[3].into(),
        consumption_transportation: sectors[0].into(),
        consumption_packaging: sectors[1].into(),
        consumption_construction: sectors[2].into(),
        consumption_electronic: sectors[3].into(),
        consumption_household_leisure_sports: sectors[4].into(),
        consumption_agriculture: sectors[5].into(),
        consumption_other: sectors[6].into(),
    }
}

pub(crate) fn polymer_row(region: &str, sector: &str, pct: [&str; 9]) -> RawPolymerRow {
    RawPolymerRow {
        region: region.into(),
        sector: sector.into(),
        ldpe: pct[0].into(),
        hdpe: pct[1].into(),
        pp: pct[2].into(),
        ps: pct[3].into(),
        pvc: pct[4].into(),
        pet: pct[5].into(),
        pur: pct[6].into(),
        other_thermoplastics: pct[7].into(),
        other_thermosets: pct[8].into(),
    }
}

pub(crate) const HALF_LDPE_HALF_HDPE: [&str; 9] =
    ["50%", "50%", "0%", "0%", "0%", "0%", "0%", "0%", "0%"];

/// The single-region example: total waste 20, equal sectors, ldpe/hdpe 50/50.
pub(crate) fn example_inputs() -> (Vec<RawSimulationRow>, Vec<RawPolymerRow>) {
    let sim = vec![sim_row("test", "2020", ["10", "5", "3", "2"], ["1"; 7])];
    let polymers = Sector::ALL
        .iter()
        .map(|s| polymer_row("test", s.label(), HALF_LDPE_HALF_HDPE))
        .collect();
    (sim, polymers)
}

/// Rows covering every (region, year) and (region, sector) of `space`, with
/// masses that vary by position so no two groups are alike.
pub(crate) fn covering_inputs(
    space: &IterationSpace,
) -> (Vec<RawSimulationRow>, Vec<RawPolymerRow>) {
    let mut sim = Vec::new();
    for (r, region) in space.regions.iter().enumerate() {
        for year in space.years.clone() {
            let base = (r as u32 + 1) * 10 + (year % 13);
            let fates: Vec<String> = (0..4).map(|i| format!("{}.{}", base + i, i + 1)).collect();
            let sectors: Vec<String> = (0..7).map(|i| format!("{}.25", (base + i * 3) % 17 + 1)).collect();
            let fates: Vec<&str> = fates.iter().map(String::as_str).collect();
            let sectors: Vec<&str> = sectors.iter().map(String::as_str).collect();
            sim.push(sim_row(
                region,
                &year.to_string(),
                [fates[0], fates[1], fates[2], fates[3]],
                [sectors[0], sectors[1], sectors[2], sectors[3], sectors[4], sectors[5], sectors[6]],
            ));
        }
    }

    let mixes = [
        ["20%", "15%", "20%", "5%", "10%", "10%", "8%", "7%", "5%"],
        ["17.5%", "12.3%", "19.9%", "6%", "9%", "11%", "8%", "7%", "9%"],
        ["30%", "10%", "10%", "10%", "10%", "10%", "10%", "5.2%", "5.1%"],
    ];
    let mut polymers = Vec::new();
    for (r, region) in space.regions.iter().enumerate() {
        for (s, sector) in Sector::ALL.iter().enumerate() {
            polymers.push(polymer_row(region, sector.label(), mixes[(r + s) % mixes.len()]));
        }
    }
    (sim, polymers)
}
