//! CSV ingestion of the cleaned exoplanet archive export
//!
//! Produces typed records for [`crate::storage::ExoplanetDb::import`]. Empty
//! cells and `NaN` become unknown values; cohort flags become cohort tags.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::IngestConfig;
use crate::error::Result;
use crate::types::{Discovery, FeatureId, HostStar, Planet};

/// Cohort flag columns and the cohort tag each one sets
pub const COHORT_COLUMNS: [(&str, &str); 4] = [
    ("in_stage1", "stage1"),
    ("in_stage1c", "stage1c"),
    ("in_stage2", "stage2"),
    ("in_stage2c", "stage2c"),
];

/// Typed records from one CSV file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestBatch {
    pub stars: Vec<HostStar>,
    pub planets: Vec<Planet>,
    pub discoveries: Vec<Discovery>,
}

impl IngestBatch {
    /// Build a batch from planets alone, synthesizing bare host stars
    pub fn from_planets(planets: Vec<Planet>) -> Self {
        let mut hosts: BTreeMap<String, HostStar> = BTreeMap::new();
        for planet in &planets {
            hosts
                .entry(planet.host_name.clone())
                .or_insert_with(|| HostStar {
                    host_name: planet.host_name.clone(),
                    distance_pc: None,
                });
        }

        Self {
            stars: hosts.into_values().collect(),
            planets,
            discoveries: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveRow {
    pl_name: Option<String>,
    hostname: Option<String>,
    #[serde(default)]
    sy_dist: Option<f64>,
    #[serde(default)]
    pl_masse: Option<f64>,
    #[serde(default)]
    pl_rade: Option<f64>,
    #[serde(default)]
    pl_orbper: Option<f64>,
    #[serde(default)]
    pl_eqt: Option<f64>,
    #[serde(default)]
    density: Option<f64>,
    #[serde(default)]
    discoverymethod: Option<String>,
    #[serde(default)]
    disc_year: Option<f64>,
    #[serde(default)]
    in_stage1: Option<String>,
    #[serde(default)]
    in_stage1c: Option<String>,
    #[serde(default)]
    in_stage2: Option<String>,
    #[serde(default)]
    in_stage2c: Option<String>,
}

impl ArchiveRow {
    fn flag(&self, column: &str) -> bool {
        let value = match column {
            "in_stage1" => &self.in_stage1,
            "in_stage1c" => &self.in_stage1c,
            "in_stage2" => &self.in_stage2,
            "in_stage2c" => &self.in_stage2c,
            _ => return false,
        };
        value.as_deref().map_or(false, parse_flag)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "1.0" | "yes" | "y" | "t"
    )
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Four-digit calendar year, rounded; anything else is unknown
fn discovery_year(value: Option<f64>, line: usize) -> Option<i32> {
    let raw = finite(value)?;
    let year = raw.round();
    if (1000.0..=9999.0).contains(&year) {
        Some(year as i32)
    } else {
        tracing::warn!("Row {}: discovery year {} out of range, storing as unknown", line, raw);
        None
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("nan"))
}

/// Read the archive CSV at `path`
pub fn load_csv<P: AsRef<Path>>(path: P, config: &IngestConfig) -> Result<IngestBatch> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let batch = read_rows(reader, config)?;
    tracing::info!(
        "Read {} planets and {} host stars from {}",
        batch.planets.len(),
        batch.stars.len(),
        path.display()
    );
    Ok(batch)
}

/// Read archive rows from any reader
pub fn read_csv<R: std::io::Read>(input: R, config: &IngestConfig) -> Result<IngestBatch> {
    let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    read_rows(reader, config)
}

fn read_rows<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    config: &IngestConfig,
) -> Result<IngestBatch> {
    let mut stars: BTreeMap<String, HostStar> = BTreeMap::new();
    let mut planets = Vec::new();
    let mut discoveries = Vec::new();

    for (line, record) in reader.deserialize::<ArchiveRow>().enumerate() {
        let row = record?;

        let (Some(name), Some(host)) = (non_empty(row.pl_name.clone()), non_empty(row.hostname.clone()))
        else {
            tracing::warn!("Row {}: missing planet or host name, skipping", line + 1);
            continue;
        };

        let star = stars.entry(host.clone()).or_insert_with(|| HostStar {
            host_name: host.clone(),
            distance_pc: None,
        });
        if star.distance_pc.is_none() {
            star.distance_pc = finite(row.sy_dist);
        }

        let mut planet = Planet::new(name.clone(), host);
        planet.set_feature(FeatureId::Mass, row.pl_masse);
        planet.set_feature(FeatureId::Radius, row.pl_rade);
        planet.set_feature(FeatureId::OrbitalPeriod, row.pl_orbper);
        planet.set_feature(FeatureId::EquilibriumTemperature, row.pl_eqt);
        planet.set_feature(FeatureId::Density, row.density);

        if config.derive_density && planet.density.is_none() {
            planet.density = planet.derived_density();
        }

        for (column, cohort) in COHORT_COLUMNS {
            if row.flag(column) {
                planet.cohorts.insert(cohort.to_string());
            }
        }

        let method = non_empty(row.discoverymethod.clone());
        let year = discovery_year(row.disc_year, line + 1);
        if method.is_some() || year.is_some() {
            discoveries.push(Discovery {
                planet_name: name,
                method,
                year,
            });
        }

        planets.push(planet);
    }

    Ok(IngestBatch {
        stars: stars.into_values().collect(),
        planets,
        discoveries,
    })
}
