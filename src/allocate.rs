// src/allocate.rs

use tracing::trace;

use crate::{
    error::{Error, Result},
    index::Index,
    model::{EstimatedRecord, Fate, IterationSpace, Polymer, RegionSector, RegionYear, Sector},
};

/// Attributes waste mass to (sector, polymer, fate) from the lookup tables.
///
/// Pure over a borrowed, already-built [`Index`]; nothing is cached.
#[derive(Debug, Clone, Copy)]
pub struct Allocator<'a> {
    index: &'a Index,
}

impl<'a> Allocator<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// `total_waste * fate_share * sector_share * polymer_share`
    pub fn estimate(
        &self,
        region: &str,
        year: u32,
        sector: Sector,
        polymer: Polymer,
        fate: Fate,
    ) -> Result<f64> {
        let ry = RegionYear::new(region, year);
        let rs = RegionSector::new(region, sector.label());

        let total = *self
            .index
            .total_waste
            .get(&ry)
            .ok_or_else(|| missing("total_waste", &ry))?;
        let fate_share = self
            .index
            .fate_propensity
            .get(&ry)
            .and_then(|shares| shares.get(&fate))
            .ok_or_else(|| missing("fate_propensity", &ry))?;
        let sector_share = self
            .index
            .sector_propensity
            .get(&ry)
            .and_then(|shares| shares.get(&sector))
            .ok_or_else(|| missing("sector_propensity", &ry))?;
        let polymer_share = self
            .index
            .sector_polymer_propensity
            .get(&rs)
            .and_then(|shares| shares.get(&polymer))
            .ok_or_else(|| missing("sector_polymer_propensity", &rs))?;

        let mass = total * fate_share * sector_share * polymer_share;
        trace!(key = %ry, %sector, %polymer, %fate, mass, "estimate");
        Ok(mass)
    }

    /// Every estimate over `space`, in region, year, sector, polymer, fate order.
    pub fn estimates<'s>(
        &'s self,
        space: &'s IterationSpace,
    ) -> impl Iterator<Item = Result<EstimatedRecord>> + 's {
        space.region_years().flat_map(move |ry| {
            Sector::ALL.into_iter().flat_map(move |sector| {
                let ry = ry.clone();
                Polymer::ALL.into_iter().flat_map(move |polymer| {
                    let ry = ry.clone();
                    Fate::ALL.into_iter().map(move |fate| {
                        self.estimate(&ry.region, ry.year, sector, polymer, fate)
                            .map(|mass| EstimatedRecord {
                                region: ry.region.clone(),
                                year: ry.year,
                                sector,
                                polymer,
                                fate,
                                mass,
                            })
                    })
                })
            })
        })
    }
}

fn missing(table: &'static str, key: &impl std::fmt::Display) -> Error {
    Error::MissingKey {
        table,
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fixtures::{covering_inputs, example_inputs, polymer_row, sim_row, HALF_LDPE_HALF_HDPE},
        index::DuplicatePolicy,
    };
    use std::collections::HashSet;

    #[test]
    fn example_estimate_matches_hand_computation() {
        let (sim, polymers) = example_inputs();
        let index = Index::build(&sim, &polymers, DuplicatePolicy::Reject).unwrap();
        let alloc = Allocator::new(&index);

        let mass = alloc
            .estimate("test", 2020, Sector::Packaging, Polymer::Ldpe, Fate::Landfill)
            .unwrap();
        let expected = 20.0 * (10.0 / 20.0) * (1.0 / 7.0) * 0.5;
        assert!((mass - expected).abs() < 1e-12);
        assert!((mass - 0.714285714285).abs() < 1e-9);

        let none = alloc
            .estimate("test", 2020, Sector::Other, Polymer::Pvc, Fate::Recycling)
            .unwrap();
        assert_eq!(none, 0.0);
    }

    #[test]
    fn missing_year_is_reported() {
        let (sim, polymers) = example_inputs();
        let index = Index::build(&sim, &polymers, DuplicatePolicy::Reject).unwrap();
        let err = Allocator::new(&index)
            .estimate("test", 2021, Sector::Packaging, Polymer::Ldpe, Fate::Landfill)
            .unwrap_err();
        match err {
            Error::MissingKey { table, key } => {
                assert_eq!(table, "total_waste");
                assert_eq!(key, "test/2021");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_sector_row_is_reported() {
        let sim = vec![sim_row("test", "2020", ["1", "1", "1", "1"], ["1"; 7])];
        let polymers = vec![polymer_row("test", "consumptionPackagingMT", HALF_LDPE_HALF_HDPE)];
        let index = Index::build(&sim, &polymers, DuplicatePolicy::Reject).unwrap();
        let err = Allocator::new(&index)
            .estimate("test", 2020, Sector::Agriculture, Polymer::Ldpe, Fate::Landfill)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingKey { table: "sector_polymer_propensity", .. }
        ));
    }

    #[test]
    fn mismatched_sector_label_is_a_missing_key() {
        let sim = vec![sim_row("test", "2020", ["1", "1", "1", "1"], ["1"; 7])];
        let polymers = vec![polymer_row("test", "consumptionothermt", HALF_LDPE_HALF_HDPE)];
        let index = Index::build(&sim, &polymers, DuplicatePolicy::Reject).unwrap();
        let err = Allocator::new(&index)
            .estimate("test", 2020, Sector::Other, Polymer::Ldpe, Fate::Landfill)
            .unwrap_err();
        match err {
            Error::MissingKey { table, key } => {
                assert_eq!(table, "sector_polymer_propensity");
                assert_eq!(key, "test/consumptionOtherMT");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn full_space_visits_each_tuple_once() {
        let space = IterationSpace::default();
        let (sim, polymers) = covering_inputs(&space);
        let index = Index::build(&sim, &polymers, DuplicatePolicy::Reject).unwrap();
        let alloc = Allocator::new(&index);

        let estimates: Vec<EstimatedRecord> = alloc
            .estimates(&space)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(estimates.len(), 40_320);

        let distinct: HashSet<_> = estimates
            .iter()
            .map(|e| (e.region.clone(), e.year, e.sector, e.polymer, e.fate))
            .collect();
        assert_eq!(distinct.len(), estimates.len());
        assert!(estimates.iter().all(|e| e.mass >= 0.0));

        let first = &estimates[0];
        assert_eq!((first.region.as_str(), first.year), ("china", 2011));
        assert_eq!(
            (first.sector, first.polymer, first.fate),
            (Sector::Transportation, Polymer::Ldpe, Fate::Landfill)
        );
    }

    #[test]
    fn estimate_stream_stops_on_first_gap() {
        let space = IterationSpace::new(vec!["test".into()], 2020..=2021);
        let (sim, polymers) = example_inputs();
        let index = Index::build(&sim, &polymers, DuplicatePolicy::Reject).unwrap();
        let result: Result<Vec<_>> = Allocator::new(&index).estimates(&space).collect();
        assert!(matches!(result, Err(Error::MissingKey { .. })));
    }
}
