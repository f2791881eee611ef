// src/aggregate.rs

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    allocate::Allocator,
    error::Result,
    index::TotalWaste,
    model::{EstimatedRecord, Fate, IterationSpace, OutputKey, OutputRecord, Polymer, RegionYear, Sector},
};

/// Sum estimates over the sector dimension.
///
/// One record comes out per distinct (region, year, polymer, fate) seen in
/// the stream, sorted by that key. The first error in the stream aborts.
pub fn aggregate<I>(estimates: I) -> Result<Vec<OutputRecord>>
where
    I: IntoIterator<Item = Result<EstimatedRecord>>,
{
    let mut groups: BTreeMap<OutputKey, f64> = BTreeMap::new();
    let mut seen = 0usize;
    for est in estimates {
        let est = est?;
        *groups.entry(OutputKey::from(&est)).or_insert(0.0) += est.mass;
        seen += 1;
    }
    debug!(estimates = seen, groups = groups.len(), "aggregated");
    Ok(groups
        .into_iter()
        .map(|(key, amount)| OutputRecord::from_key(key, amount))
        .collect())
}

/// Same result as [`aggregate`] over `allocator.estimates(space)`, with the
/// output groups spread over the rayon pool.
///
/// Each group sums its sectors in enumeration order from 0.0, so amounts are
/// bit-identical to the sequential path.
pub fn aggregate_parallel(allocator: &Allocator<'_>, space: &IterationSpace) -> Result<Vec<OutputRecord>> {
    let mut keys: Vec<OutputKey> = space
        .region_years()
        .flat_map(|ry| {
            Polymer::ALL.into_iter().flat_map(move |polymer| {
                let ry = ry.clone();
                Fate::ALL.into_iter().map(move |fate| OutputKey {
                    region: ry.region.clone(),
                    year: ry.year,
                    polymer,
                    fate,
                })
            })
        })
        .collect();
    keys.sort();
    keys.dedup();

    let records = keys
        .into_par_iter()
        .map(|key| -> Result<OutputRecord> {
            let mut amount = 0.0;
            for sector in Sector::ALL {
                amount += allocator.estimate(&key.region, key.year, sector, key.polymer, key.fate)?;
            }
            Ok(OutputRecord::from_key(key, amount))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(groups = records.len(), "aggregated in parallel");
    Ok(records)
}

/// A (region, year) whose output does not add back up to its total waste.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationGap {
    pub key: RegionYear,
    pub expected: f64,
    pub actual: f64,
}

/// Compare per-(region, year) output sums against total waste, returning
/// every key whose relative difference exceeds `tolerance`.
pub fn conservation_gaps(
    records: &[OutputRecord],
    total_waste: &TotalWaste,
    tolerance: f64,
) -> Vec<ConservationGap> {
    let mut sums: BTreeMap<RegionYear, f64> = BTreeMap::new();
    for rec in records {
        *sums
            .entry(RegionYear::new(rec.region.as_str(), rec.year))
            .or_insert(0.0) += rec.amount;
    }
    sums.into_iter()
        .filter_map(|(key, actual)| {
            let expected = total_waste.get(&key).copied().unwrap_or(0.0);
            let scale = expected.abs().max(1.0);
            if (actual - expected).abs() / scale > tolerance {
                Some(ConservationGap {
                    key,
                    expected,
                    actual,
                })
            } else {
                None
            }
        })
        .collect()
}
