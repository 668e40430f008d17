//! Planet, host star, and discovery records supplied by ingestion

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Physical attribute a tier can require
///
/// Serialized with the archive column names so tier configs read like the
/// source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureId {
    /// Planet mass (Earth masses)
    #[serde(rename = "pl_masse", alias = "mass")]
    Mass,
    /// Planet radius (Earth radii)
    #[serde(rename = "pl_rade", alias = "radius")]
    Radius,
    /// Orbital period (days)
    #[serde(rename = "pl_orbper", alias = "orbital_period")]
    OrbitalPeriod,
    /// Equilibrium temperature (K)
    #[serde(rename = "pl_eqt", alias = "equilibrium_temperature")]
    EquilibriumTemperature,
    /// Bulk density
    #[serde(rename = "density")]
    Density,
}

impl FeatureId {
    /// Every attribute in the planet vocabulary
    pub const ALL: [FeatureId; 5] = [
        FeatureId::Mass,
        FeatureId::Radius,
        FeatureId::OrbitalPeriod,
        FeatureId::EquilibriumTemperature,
        FeatureId::Density,
    ];

    /// Archive column name
    pub fn column_name(&self) -> &'static str {
        match self {
            FeatureId::Mass => "pl_masse",
            FeatureId::Radius => "pl_rade",
            FeatureId::OrbitalPeriod => "pl_orbper",
            FeatureId::EquilibriumTemperature => "pl_eqt",
            FeatureId::Density => "density",
        }
    }

    /// Human-readable name with units
    pub fn description(&self) -> &'static str {
        match self {
            FeatureId::Mass => "Mass (Earth masses)",
            FeatureId::Radius => "Radius (Earth radii)",
            FeatureId::OrbitalPeriod => "Orbital Period (days)",
            FeatureId::EquilibriumTemperature => "Equilibrium Temperature (K)",
            FeatureId::Density => "Density",
        }
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// A confirmed planet keyed by its unique name
///
/// `None` marks an unknown attribute. Unknown is never the same as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Planet name (natural key)
    pub name: String,
    /// Host star name (natural key of the owning [`HostStar`])
    pub host_name: String,
    /// Mass (Earth masses)
    pub mass: Option<f64>,
    /// Radius (Earth radii)
    pub radius: Option<f64>,
    /// Orbital period (days)
    pub orbital_period: Option<f64>,
    /// Equilibrium temperature (K)
    pub equilibrium_temperature: Option<f64>,
    /// Bulk density
    pub density: Option<f64>,
    /// Population flags assigned at ingestion (e.g. "stage1", "stage2c")
    #[serde(default)]
    pub cohorts: BTreeSet<String>,
}

impl Planet {
    /// Create a planet with every attribute unknown
    pub fn new(name: impl Into<String>, host_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_name: host_name.into(),
            mass: None,
            radius: None,
            orbital_period: None,
            equilibrium_temperature: None,
            density: None,
            cohorts: BTreeSet::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_feature(mut self, feature: FeatureId, value: f64) -> Self {
        self.set_feature(feature, Some(value));
        self
    }

    /// Builder-style cohort flag
    pub fn in_cohort(mut self, cohort: impl Into<String>) -> Self {
        self.cohorts.insert(cohort.into());
        self
    }

    /// Set an attribute. Non-finite values are stored as unknown.
    pub fn set_feature(&mut self, feature: FeatureId, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        match feature {
            FeatureId::Mass => self.mass = value,
            FeatureId::Radius => self.radius = value,
            FeatureId::OrbitalPeriod => self.orbital_period = value,
            FeatureId::EquilibriumTemperature => self.equilibrium_temperature = value,
            FeatureId::Density => self.density = value,
        }
    }

    /// Read an attribute
    pub fn feature(&self, feature: FeatureId) -> Option<f64> {
        let value = match feature {
            FeatureId::Mass => self.mass,
            FeatureId::Radius => self.radius,
            FeatureId::OrbitalPeriod => self.orbital_period,
            FeatureId::EquilibriumTemperature => self.equilibrium_temperature,
            FeatureId::Density => self.density,
        };
        value.filter(|v| v.is_finite())
    }

    /// True when every listed attribute is known
    pub fn has_features(&self, features: &[FeatureId]) -> bool {
        features.iter().all(|f| self.feature(*f).is_some())
    }

    /// Check membership in an ingestion cohort
    pub fn has_cohort(&self, cohort: &str) -> bool {
        self.cohorts.contains(cohort)
    }

    /// Earth-relative bulk density (`mass / radius³`) when both are known
    pub fn derived_density(&self) -> Option<f64> {
        match (self.mass, self.radius) {
            (Some(m), Some(r)) if r > 0.0 => Some(m / r.powi(3)),
            _ => None,
        }
    }
}

/// Host star keyed by its unique name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostStar {
    /// Host name (natural key)
    pub host_name: String,
    /// Distance from Earth (parsecs)
    pub distance_pc: Option<f64>,
}

/// Discovery metadata, one per planet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    /// Planet name (natural key of the owning [`Planet`])
    pub planet_name: String,
    /// Discovery method (e.g. "Transit", "Radial Velocity")
    pub method: Option<String>,
    /// Discovery year
    pub year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_access() {
        let planet = Planet::new("Kepler-22 b", "Kepler-22")
            .with_feature(FeatureId::Radius, 2.1)
            .with_feature(FeatureId::OrbitalPeriod, 289.86);

        assert_eq!(planet.feature(FeatureId::Radius), Some(2.1));
        assert_eq!(planet.feature(FeatureId::Mass), None);
        assert!(planet.has_features(&[FeatureId::Radius, FeatureId::OrbitalPeriod]));
        assert!(!planet.has_features(&[FeatureId::Radius, FeatureId::Mass]));
    }

    #[test]
    fn test_non_finite_is_unknown() {
        let planet = Planet::new("X", "Y").with_feature(FeatureId::Density, f64::NAN);
        assert_eq!(planet.feature(FeatureId::Density), None);
        assert_eq!(planet.density, None);
    }

    #[test]
    fn test_zero_is_known() {
        let planet = Planet::new("X", "Y").with_feature(FeatureId::Mass, 0.0);
        assert_eq!(planet.feature(FeatureId::Mass), Some(0.0));
    }

    #[test]
    fn test_feature_serde_names() {
        let json = serde_json::to_string(&FeatureId::EquilibriumTemperature).unwrap();
        assert_eq!(json, "\"pl_eqt\"");

        let parsed: FeatureId = serde_json::from_str("\"radius\"").unwrap();
        assert_eq!(parsed, FeatureId::Radius);
    }

    #[test]
    fn test_derived_density() {
        let earth = Planet::new("Earth", "Sun")
            .with_feature(FeatureId::Mass, 1.0)
            .with_feature(FeatureId::Radius, 1.0);
        assert_eq!(earth.derived_density(), Some(1.0));

        let no_radius = Planet::new("X", "Y").with_feature(FeatureId::Mass, 1.0);
        assert_eq!(no_radius.derived_density(), None);
    }
}
