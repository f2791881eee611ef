// src/config.rs

use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::{
    error::{Error, Result},
    index::DuplicatePolicy,
    model::{IterationSpace, DEFAULT_REGIONS, DEFAULT_YEARS},
    normalize::normalize_region,
    output::OutputFormat,
};

/// Run configuration. Every field has a compiled default, so an empty YAML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Simulation output table: local path or http(s) URL.
    pub simulation: String,
    /// Static polymer matrix: local path or http(s) URL.
    pub polymer_matrix: String,
    /// Where downloaded inputs are cached.
    pub cache_dir: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub regions: Vec<String>,
    pub start_year: u32,
    pub end_year: u32,
    pub duplicates: DuplicatePolicy,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: "data/simulation.csv".to_string(),
            polymer_matrix: "data/polymer_matrix.csv".to_string(),
            cache_dir: PathBuf::from("cache"),
            output: PathBuf::from("output/polymer_fates.csv"),
            format: OutputFormat::Csv,
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            start_year: *DEFAULT_YEARS.start(),
            end_year: *DEFAULT_YEARS.end(),
            duplicates: DuplicatePolicy::Reject,
            parallel: false,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub simulation: Option<String>,
    pub polymer_matrix: Option<String>,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub parallel: bool,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        // an empty document deserializes as unit, not as an empty map
        if text.trim().is_empty() {
            return Self::default().validated();
        }
        let config: Config = serde_yaml::from_str(text)?;
        config.validated()
    }

    /// Load from `path` if given, else use defaults; then apply overrides.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml(&fs::read_to_string(p)?)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validated()
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(s) = &overrides.simulation {
            self.simulation = s.clone();
        }
        if let Some(s) = &overrides.polymer_matrix {
            self.polymer_matrix = s.clone();
        }
        if let Some(o) = &overrides.output {
            self.output = o.clone();
        }
        if let Some(f) = overrides.format {
            self.format = f;
        }
        if overrides.parallel {
            self.parallel = true;
        }
    }

    /// Normalize region labels and check the year range.
    pub fn validated(mut self) -> Result<Self> {
        if self.start_year > self.end_year {
            return Err(Error::Config(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }
        if self.regions.is_empty() {
            return Err(Error::Config("no regions configured".to_string()));
        }
        let mut regions: Vec<String> = Vec::with_capacity(self.regions.len());
        for region in self.regions.iter().map(|r| normalize_region(r)) {
            if region.is_empty() {
                return Err(Error::Config("empty region label".to_string()));
            }
            if regions.contains(&region) {
                return Err(Error::Config(format!("region {} listed twice", region)));
            }
            regions.push(region);
        }
        self.regions = regions;
        Ok(self)
    }

    pub fn space(&self) -> IterationSpace {
        IterationSpace::new(self.regions.clone(), self.start_year..=self.end_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_yaml_gives_defaults() -> Result<()> {
        let config = Config::from_yaml("")?;
        assert_eq!(config, Config::default());
        assert_eq!(config.space(), IterationSpace::default());
        Ok(())
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() -> Result<()> {
        let config = Config::from_yaml(
            "regions: [NAFTA, RoW]\nstart_year: 2020\nend_year: 2021\nformat: parquet\nduplicates: last_wins\n",
        )?;
        assert_eq!(config.regions, vec!["na", "mw"]);
        assert_eq!(config.space().year_count(), 2);
        assert_eq!(config.format, OutputFormat::Parquet);
        assert_eq!(config.duplicates, DuplicatePolicy::LastWins);
        assert_eq!(config.simulation, "data/simulation.csv");
        assert!(!config.parallel);
        Ok(())
    }

    #[test]
    fn bad_ranges_and_regions_are_rejected() {
        assert!(matches!(
            Config::from_yaml("start_year: 2051\nend_year: 2050\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_yaml("regions: []\n"), Err(Error::Config(_))));
        assert!(matches!(
            Config::from_yaml("regions: [na, NAFTA]\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_yaml("colour: blue\n"), Err(Error::Yaml(_))));
    }

    #[test]
    fn overrides_win_over_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "simulation: https://example.org/sim.csv")?;
        writeln!(file, "output: out/a.csv")?;
        let overrides = Overrides {
            output: Some(PathBuf::from("out/b.parquet")),
            format: Some(OutputFormat::Parquet),
            parallel: true,
            ..Default::default()
        };
        let config = Config::load(Some(file.path()), &overrides)?;
        assert_eq!(config.simulation, "https://example.org/sim.csv");
        assert_eq!(config.output, PathBuf::from("out/b.parquet"));
        assert_eq!(config.format, OutputFormat::Parquet);
        assert!(config.parallel);
        Ok(())
    }
}
