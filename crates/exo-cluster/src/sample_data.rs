//! # Sample Exoplanet Data
//!
//! A small set of well-known confirmed planets with values rounded from the
//! NASA Exoplanet Archive Planetary Systems table.
//!
//! Fields: name, host, sy_dist (pc), pl_masse, pl_rade, pl_orbper (days),
//! pl_eqt (K), discovery method, discovery year, curated
//!
//! Cohorts follow the archive export: every planet with radius, period, and
//! temperature is in `stage1`, planets that also have a mass are in `stage2`,
//! and the curated subset of each forms `stage1c` / `stage2c`.

use crate::ingest::IngestBatch;
use crate::types::{Discovery, FeatureId, Planet};

type Row = (
    &'static str,
    &'static str,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    f64,
    Option<f64>,
    &'static str,
    i32,
    bool,
);

const ROWS: &[Row] = &[
    // Temperate transiting planets without a measured mass
    ("Kepler-22 b", "Kepler-22", Some(194.0), None, Some(2.10), 289.86, Some(262.0), "Transit", 2011, true),
    ("Kepler-452 b", "Kepler-452", Some(552.0), None, Some(1.63), 384.84, Some(265.0), "Transit", 2015, true),
    ("Kepler-186 f", "Kepler-186", Some(177.6), None, Some(1.17), 129.94, Some(188.0), "Transit", 2014, true),
    ("Kepler-62 f", "Kepler-62", Some(300.9), None, Some(1.41), 267.29, Some(208.0), "Transit", 2013, true),
    ("Kepler-442 b", "Kepler-442", Some(370.5), None, Some(1.34), 112.30, Some(233.0), "Transit", 2015, true),
    ("Kepler-69 c", "Kepler-69", Some(730.0), None, Some(1.71), 242.46, Some(299.0), "Transit", 2013, false),
    ("TOI-700 d", "TOI-700", Some(31.1), None, Some(1.07), 37.43, Some(269.0), "Transit", 2020, true),
    ("Kepler-90 h", "Kepler-90", Some(855.0), None, Some(11.3), 331.60, Some(292.0), "Transit", 2013, true),
    // Kepler-10 and Kepler-11 systems
    ("Kepler-10 b", "Kepler-10", Some(185.5), Some(3.26), Some(1.47), 0.837, Some(2169.0), "Transit", 2011, true),
    ("Kepler-10 c", "Kepler-10", Some(185.5), Some(7.37), Some(2.35), 45.29, Some(584.0), "Transit", 2011, true),
    ("Kepler-11 b", "Kepler-11", Some(613.0), Some(1.9), Some(1.80), 10.30, Some(900.0), "Transit", 2010, true),
    ("Kepler-11 c", "Kepler-11", Some(613.0), Some(2.9), Some(2.87), 13.02, Some(833.0), "Transit", 2010, true),
    ("Kepler-11 d", "Kepler-11", Some(613.0), Some(7.3), Some(3.12), 22.69, Some(692.0), "Transit", 2010, true),
    ("Kepler-11 e", "Kepler-11", Some(613.0), Some(8.0), Some(4.19), 31.99, Some(617.0), "Transit", 2010, true),
    ("Kepler-11 f", "Kepler-11", Some(613.0), Some(2.0), Some(2.49), 46.69, Some(544.0), "Transit", 2010, true),
    // TRAPPIST-1 system
    ("TRAPPIST-1 b", "TRAPPIST-1", Some(12.43), Some(1.374), Some(1.116), 1.51, Some(398.0), "Transit", 2016, true),
    ("TRAPPIST-1 c", "TRAPPIST-1", Some(12.43), Some(1.308), Some(1.097), 2.42, Some(341.0), "Transit", 2016, true),
    ("TRAPPIST-1 d", "TRAPPIST-1", Some(12.43), Some(0.388), Some(0.788), 4.05, Some(288.0), "Transit", 2016, true),
    ("TRAPPIST-1 e", "TRAPPIST-1", Some(12.43), Some(0.692), Some(0.920), 6.10, Some(250.0), "Transit", 2017, true),
    ("TRAPPIST-1 f", "TRAPPIST-1", Some(12.43), Some(1.039), Some(1.045), 9.21, Some(218.0), "Transit", 2017, true),
    ("TRAPPIST-1 g", "TRAPPIST-1", Some(12.43), Some(1.321), Some(1.129), 12.35, Some(197.0), "Transit", 2017, true),
    ("TRAPPIST-1 h", "TRAPPIST-1", Some(12.43), Some(0.326), Some(0.755), 18.77, Some(172.0), "Transit", 2017, false),
    // Small planets with measured masses
    ("GJ 1214 b", "GJ 1214", Some(14.6), Some(8.17), Some(2.74), 1.58, Some(596.0), "Transit", 2009, true),
    ("55 Cnc e", "55 Cnc", Some(12.6), Some(7.99), Some(1.88), 0.737, Some(1958.0), "Radial Velocity", 2004, true),
    ("LHS 1140 b", "LHS 1140", Some(15.0), Some(5.6), Some(1.64), 24.74, Some(226.0), "Transit", 2017, true),
    ("K2-18 b", "K2-18", Some(38.0), Some(8.63), Some(2.61), 32.94, Some(255.0), "Transit", 2015, true),
    ("GJ 436 b", "GJ 436", Some(9.76), Some(22.1), Some(4.17), 2.64, Some(686.0), "Radial Velocity", 2004, true),
    ("HAT-P-11 b", "HAT-P-11", Some(37.8), Some(26.7), Some(4.36), 4.89, Some(878.0), "Transit", 2009, true),
    // Giants
    ("HD 209458 b", "HD 209458", Some(48.3), Some(219.0), Some(15.6), 3.52, Some(1449.0), "Transit", 1999, true),
    ("HD 189733 b", "HD 189733", Some(19.8), Some(362.0), Some(12.7), 2.22, Some(1209.0), "Transit", 2005, true),
    ("WASP-12 b", "WASP-12", Some(427.0), Some(467.0), Some(21.3), 1.09, Some(2580.0), "Transit", 2008, true),
    ("WASP-121 b", "WASP-121", Some(272.0), Some(371.0), Some(19.6), 1.27, Some(2358.0), "Transit", 2015, false),
    ("Kepler-7 b", "Kepler-7", Some(918.0), Some(137.0), Some(18.1), 4.89, Some(1540.0), "Transit", 2010, true),
    ("Kepler-16 b", "Kepler-16", Some(75.0), Some(105.8), Some(8.45), 228.78, Some(188.0), "Transit", 2011, true),
    // Radial velocity detections without a radius
    ("51 Peg b", "51 Peg", Some(15.5), Some(150.0), None, 4.23, Some(1260.0), "Radial Velocity", 1995, true),
    ("Proxima Cen b", "Proxima Cen", Some(1.30), Some(1.07), None, 11.19, Some(234.0), "Radial Velocity", 2016, true),
];

fn to_planet(row: &Row) -> Planet {
    let &(name, host, _, mass, radius, period, teq, _, _, curated) = row;

    let mut planet = Planet::new(name, host);
    planet.set_feature(FeatureId::Mass, mass);
    planet.set_feature(FeatureId::Radius, radius);
    planet.set_feature(FeatureId::OrbitalPeriod, Some(period));
    planet.set_feature(FeatureId::EquilibriumTemperature, teq);
    planet.density = planet.derived_density();

    let stage1 = planet.has_features(&[
        FeatureId::Radius,
        FeatureId::OrbitalPeriod,
        FeatureId::EquilibriumTemperature,
    ]);
    let stage2 = stage1 && planet.has_features(&[FeatureId::Mass, FeatureId::Density]);

    if stage1 {
        planet.cohorts.insert("stage1".to_string());
        if curated {
            planet.cohorts.insert("stage1c".to_string());
        }
    }
    if stage2 {
        planet.cohorts.insert("stage2".to_string());
        if curated {
            planet.cohorts.insert("stage2c".to_string());
        }
    }

    planet
}

/// Returns the embedded planet dataset
pub fn sample_planets() -> Vec<Planet> {
    ROWS.iter().map(to_planet).collect()
}

/// Returns the embedded dataset with host stars and discoveries
pub fn sample_batch() -> IngestBatch {
    let mut batch = IngestBatch::from_planets(sample_planets());

    for star in &mut batch.stars {
        star.distance_pc = ROWS
            .iter()
            .find(|row| row.1 == star.host_name)
            .and_then(|row| row.2);
    }

    batch.discoveries = ROWS
        .iter()
        .map(|&(name, _, _, _, _, _, _, method, year, _)| Discovery {
            planet_name: name.to_string(),
            method: Some(method.to_string()),
            year: Some(year),
        })
        .collect();

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohort_size(planets: &[Planet], cohort: &str) -> usize {
        planets.iter().filter(|p| p.has_cohort(cohort)).count()
    }

    #[test]
    fn test_cohorts_large_enough_for_default_catalog() {
        let planets = sample_planets();
        assert_eq!(planets.len(), ROWS.len());

        for cohort in ["stage1", "stage1c", "stage2", "stage2c"] {
            assert!(cohort_size(&planets, cohort) >= 10, "cohort {} too small", cohort);
        }
    }

    #[test]
    fn test_missing_radius_outside_cohorts() {
        let planets = sample_planets();
        let peg = planets.iter().find(|p| p.name == "51 Peg b").unwrap();
        assert_eq!(peg.radius, None);
        assert_eq!(peg.density, None);
        assert!(peg.cohorts.is_empty());
    }

    #[test]
    fn test_batch_is_consistent() {
        let batch = sample_batch();
        assert_eq!(batch.discoveries.len(), batch.planets.len());
        assert!(batch
            .planets
            .iter()
            .all(|p| batch.stars.iter().any(|s| s.host_name == p.host_name)));
        assert!(batch.stars.iter().all(|s| s.distance_pc.is_some()));
    }
}
