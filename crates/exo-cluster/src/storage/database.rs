//! SQLite store for planets, host stars, discoveries, and tier assignments
//!
//! Every statement is parameterized. Tier label columns are stored as values
//! of `cluster_assignments.label_column`, so no identifier is ever built from
//! configuration text.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ingest::IngestBatch;
use crate::tiers::Tier;
use crate::types::{ClusterAssignment, Discovery, HostStar, PersistedAssignment, Planet};

use super::{AssignmentStore, PersistStats, TierRunRecord};

/// SQLite-backed exoplanet store
pub struct ExoplanetDb {
    conn: Arc<Mutex<Connection>>,
}

/// Counts from an ingestion import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub stars: usize,
    pub planets: usize,
    pub discoveries: usize,
    /// Planets skipped because their host star is unknown
    pub skipped_planets: usize,
    /// Discoveries skipped because their planet was not imported
    pub skipped_discoveries: usize,
}

/// Referential integrity summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub stars: usize,
    pub planets: usize,
    pub discoveries: usize,
    pub assignments: usize,
    pub planets_without_host: usize,
    pub planets_without_discovery: usize,
}

impl ExoplanetDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Internal(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#).map_err(|e| Error::Internal(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS stars (
                host_name TEXT PRIMARY KEY,
                distance_pc REAL
            );

            CREATE TABLE IF NOT EXISTS planets (
                name TEXT PRIMARY KEY,
                host_name TEXT NOT NULL REFERENCES stars(host_name),
                mass REAL,
                radius REAL,
                orbital_period REAL,
                equilibrium_temperature REAL,
                density REAL,
                cohorts TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX IF NOT EXISTS idx_planets_host_name ON planets(host_name);

            CREATE TABLE IF NOT EXISTS discoveries (
                planet_name TEXT PRIMARY KEY REFERENCES planets(name) ON DELETE CASCADE,
                method TEXT,
                year INTEGER
            );

            -- One row per (planet, tier label column); absent row = unknown
            CREATE TABLE IF NOT EXISTS cluster_assignments (
                planet_name TEXT NOT NULL REFERENCES planets(name) ON DELETE CASCADE,
                label_column TEXT NOT NULL,
                rank INTEGER NOT NULL CHECK (rank >= 1),
                label TEXT NOT NULL,
                PRIMARY KEY (planet_name, label_column)
            );

            CREATE INDEX IF NOT EXISTS idx_cluster_assignments_column
                ON cluster_assignments(label_column, rank);

            -- Audit log of tier outcomes
            CREATE TABLE IF NOT EXISTS tier_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                tier TEXT NOT NULL,
                label_column TEXT NOT NULL,
                status TEXT NOT NULL,
                eligible INTEGER NOT NULL,
                k INTEGER NOT NULL,
                clusters INTEGER,
                failure_kind TEXT,
                reason TEXT,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tier_runs_run_id ON tier_runs(run_id);
        "#)
        .map_err(|e| Error::Internal(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // ==================== Ingestion ====================

    /// Upsert stars, planets, and discoveries by natural key in one transaction
    pub fn import(&self, batch: &IngestBatch) -> Result<ImportStats> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut stats = ImportStats::default();

        for star in &batch.stars {
            upsert_star(&tx, star)?;
            stats.stars += 1;
        }

        let mut imported = HashSet::new();
        for planet in &batch.planets {
            if !star_exists(&tx, &planet.host_name)? {
                tracing::warn!(
                    "Host star '{}' not found, skipping planet '{}'",
                    planet.host_name,
                    planet.name
                );
                stats.skipped_planets += 1;
                continue;
            }
            upsert_planet(&tx, planet)?;
            imported.insert(planet.name.as_str());
            stats.planets += 1;
        }

        for discovery in &batch.discoveries {
            if !imported.contains(discovery.planet_name.as_str())
                && !planet_exists(&tx, &discovery.planet_name)?
            {
                stats.skipped_discoveries += 1;
                continue;
            }
            upsert_discovery(&tx, discovery)?;
            stats.discoveries += 1;
        }

        tx.commit()?;

        tracing::info!(
            "Imported {} stars, {} planets, {} discoveries ({} planets skipped)",
            stats.stars,
            stats.planets,
            stats.discoveries,
            stats.skipped_planets
        );
        Ok(stats)
    }

    /// All planets ordered by name
    pub fn load_planets(&self) -> Result<Vec<Planet>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT name, host_name, mass, radius, orbital_period, equilibrium_temperature, density, cohorts
             FROM planets ORDER BY name",
        )?;

        let planets = stmt
            .query_map([], row_to_planet)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(planets)
    }

    /// Look up one planet by name
    pub fn get_planet(&self, name: &str) -> Result<Option<Planet>> {
        let conn = self.conn.lock();

        let planet = conn
            .query_row(
                "SELECT name, host_name, mass, radius, orbital_period, equilibrium_temperature, density, cohorts
                 FROM planets WHERE name = ?1",
                params![name],
                row_to_planet,
            )
            .optional()?;

        Ok(planet)
    }

    /// Look up one host star by name
    pub fn get_star(&self, host_name: &str) -> Result<Option<HostStar>> {
        let conn = self.conn.lock();

        let star = conn
            .query_row(
                "SELECT host_name, distance_pc FROM stars WHERE host_name = ?1",
                params![host_name],
                |row| {
                    Ok(HostStar {
                        host_name: row.get(0)?,
                        distance_pc: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(star)
    }

    /// Look up a planet's discovery record
    pub fn get_discovery(&self, planet_name: &str) -> Result<Option<Discovery>> {
        let conn = self.conn.lock();

        let discovery = conn
            .query_row(
                "SELECT planet_name, method, year FROM discoveries WHERE planet_name = ?1",
                params![planet_name],
                |row| {
                    Ok(Discovery {
                        planet_name: row.get(0)?,
                        method: row.get(1)?,
                        year: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(discovery)
    }

    // ==================== Assignments ====================

    /// Persisted ranks for one label column, ordered by rank then name
    pub fn load_assignments(&self, label_column: &str) -> Result<Vec<PersistedAssignment>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT planet_name, rank, label FROM cluster_assignments
             WHERE label_column = ?1 ORDER BY rank, planet_name",
        )?;

        let rows = stmt
            .query_map(params![label_column], |row| {
                let rank: i64 = row.get(1)?;
                Ok(PersistedAssignment {
                    planet_name: row.get(0)?,
                    rank: rank as usize,
                    label: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Persisted rank of one planet in one label column
    pub fn get_rank(&self, planet_name: &str, label_column: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock();

        let rank: Option<i64> = conn
            .query_row(
                "SELECT rank FROM cluster_assignments WHERE planet_name = ?1 AND label_column = ?2",
                params![planet_name, label_column],
                |row| row.get(0),
            )
            .optional()?;

        Ok(rank.map(|r| r as usize))
    }

    /// Number of tier_runs rows for a run
    pub fn count_runs(&self, run_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tier_runs WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Table sizes and referential integrity counts
    pub fn verify(&self) -> Result<IntegrityReport> {
        let conn = self.conn.lock();

        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(IntegrityReport {
            stars: count("SELECT COUNT(*) FROM stars")?,
            planets: count("SELECT COUNT(*) FROM planets")?,
            discoveries: count("SELECT COUNT(*) FROM discoveries")?,
            assignments: count("SELECT COUNT(*) FROM cluster_assignments")?,
            planets_without_host: count(
                "SELECT COUNT(*) FROM planets p
                 LEFT JOIN stars s ON p.host_name = s.host_name
                 WHERE s.host_name IS NULL",
            )?,
            planets_without_discovery: count(
                "SELECT COUNT(*) FROM planets p
                 LEFT JOIN discoveries d ON p.name = d.planet_name
                 WHERE d.planet_name IS NULL",
            )?,
        })
    }
}

impl AssignmentStore for ExoplanetDb {
    fn persist_tier(&self, tier: &Tier, assignments: &[ClusterAssignment]) -> Result<PersistStats> {
        let mut conn = self.conn.lock();
        let column = tier.label_column.as_str();

        match write_assignments(&mut conn, column, assignments) {
            Ok(stats) => Ok(stats),
            Err(e) if is_constraint_violation(&e) => {
                tracing::warn!(
                    "{}: store rejected assignments ({}); retrying with known planet keys",
                    tier.name,
                    e
                );

                let known = known_planet_names(&conn)?;
                let corrected: Vec<ClusterAssignment> = assignments
                    .iter()
                    .filter(|a| known.contains(&a.planet_name))
                    .cloned()
                    .collect();
                let rejected = assignments.len() - corrected.len();

                let mut stats = write_assignments(&mut conn, column, &corrected)
                    .map_err(|e| Error::persistence_conflict(column, e.to_string()))?;
                stats.rejected = rejected;
                Ok(stats)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn clear_ineligible(&self, tier: &Tier, eligible: &[&str]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let keep: BTreeSet<&str> = eligible.iter().copied().collect();

        let cleared = delete_outside(&tx, &tier.label_column, &keep)?;
        tx.commit()?;

        if cleared > 0 {
            tracing::info!(
                "{}: cleared {} assignments no longer eligible for {}",
                tier.name,
                cleared,
                tier.label_column
            );
        }
        Ok(cleared)
    }

    fn record_run(&self, record: &TierRunRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO tier_runs (
                run_id, tier, label_column, status, eligible, k, clusters,
                failure_kind, reason, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.run_id.to_string(),
                record.tier,
                record.label_column,
                record.status,
                record.eligible as i64,
                record.k as i64,
                record.clusters.map(|c| c as i64),
                record.failure_kind.map(|k| k.to_string()),
                record.reason,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }
}

/// Replace one label column's contents in a single transaction
///
/// Planets absent from `assignments` lose their row (unknown), the rest are
/// upserted by natural key.
fn write_assignments(
    conn: &mut Connection,
    label_column: &str,
    assignments: &[ClusterAssignment],
) -> rusqlite::Result<PersistStats> {
    let tx = conn.transaction()?;
    let incoming: BTreeSet<&str> = assignments.iter().map(|a| a.planet_name.as_str()).collect();

    let cleared = delete_outside(&tx, label_column, &incoming)?;

    {
        let mut upsert = tx.prepare(
            r#"
            INSERT INTO cluster_assignments (planet_name, label_column, rank, label)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(planet_name, label_column) DO UPDATE SET
                rank = excluded.rank,
                label = excluded.label
            "#,
        )?;
        for a in assignments {
            upsert.execute(params![a.planet_name, label_column, a.rank as i64, a.label])?;
        }
    }

    tx.commit()?;

    Ok(PersistStats {
        written: incoming.len(),
        cleared,
        rejected: 0,
    })
}

/// Delete rows of `label_column` whose planet is not in `keep`
fn delete_outside(
    tx: &Transaction<'_>,
    label_column: &str,
    keep: &BTreeSet<&str>,
) -> rusqlite::Result<usize> {
    let existing: Vec<String> = {
        let mut stmt =
            tx.prepare("SELECT planet_name FROM cluster_assignments WHERE label_column = ?1")?;
        let rows = stmt
            .query_map(params![label_column], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        rows
    };

    let mut delete = tx.prepare(
        "DELETE FROM cluster_assignments WHERE planet_name = ?1 AND label_column = ?2",
    )?;
    let mut cleared = 0;
    for name in existing.iter().filter(|n| !keep.contains(n.as_str())) {
        cleared += delete.execute(params![name, label_column])?;
    }
    Ok(cleared)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn known_planet_names(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM planets")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<String>>>()?;
    Ok(names)
}

fn upsert_star(tx: &Transaction<'_>, star: &HostStar) -> rusqlite::Result<()> {
    tx.execute(
        r#"
        INSERT INTO stars (host_name, distance_pc) VALUES (?1, ?2)
        ON CONFLICT(host_name) DO UPDATE SET distance_pc = excluded.distance_pc
        "#,
        params![star.host_name, star.distance_pc],
    )?;
    Ok(())
}

fn upsert_planet(tx: &Transaction<'_>, planet: &Planet) -> Result<()> {
    let cohorts = serde_json::to_string(&planet.cohorts)?;

    tx.execute(
        r#"
        INSERT INTO planets (
            name, host_name, mass, radius, orbital_period, equilibrium_temperature, density, cohorts
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(name) DO UPDATE SET
            host_name = excluded.host_name,
            mass = excluded.mass,
            radius = excluded.radius,
            orbital_period = excluded.orbital_period,
            equilibrium_temperature = excluded.equilibrium_temperature,
            density = excluded.density,
            cohorts = excluded.cohorts
        "#,
        params![
            planet.name,
            planet.host_name,
            planet.mass,
            planet.radius,
            planet.orbital_period,
            planet.equilibrium_temperature,
            planet.density,
            cohorts,
        ],
    )?;
    Ok(())
}

fn upsert_discovery(tx: &Transaction<'_>, discovery: &Discovery) -> rusqlite::Result<()> {
    tx.execute(
        r#"
        INSERT INTO discoveries (planet_name, method, year) VALUES (?1, ?2, ?3)
        ON CONFLICT(planet_name) DO UPDATE SET
            method = excluded.method,
            year = excluded.year
        "#,
        params![discovery.planet_name, discovery.method, discovery.year],
    )?;
    Ok(())
}

fn star_exists(tx: &Transaction<'_>, host_name: &str) -> rusqlite::Result<bool> {
    tx.query_row(
        "SELECT 1 FROM stars WHERE host_name = ?1",
        params![host_name],
        |_| Ok(()),
    )
    .optional()
    .map(|r| r.is_some())
}

fn planet_exists(tx: &Transaction<'_>, name: &str) -> rusqlite::Result<bool> {
    tx.query_row("SELECT 1 FROM planets WHERE name = ?1", params![name], |_| Ok(()))
        .optional()
        .map(|r| r.is_some())
}

fn row_to_planet(row: &rusqlite::Row) -> rusqlite::Result<Planet> {
    let cohorts_json: String = row.get(7)?;

    Ok(Planet {
        name: row.get(0)?,
        host_name: row.get(1)?,
        mass: row.get(2)?,
        radius: row.get(3)?,
        orbital_period: row.get(4)?,
        equilibrium_temperature: row.get(5)?,
        density: row.get(6)?,
        cohorts: serde_json::from_str(&cohorts_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::types::FeatureId;
    use uuid::Uuid;

    fn seeded_db() -> ExoplanetDb {
        let db = ExoplanetDb::in_memory().unwrap();
        let batch = IngestBatch {
            stars: vec![HostStar {
                host_name: "Kepler-11".to_string(),
                distance_pc: Some(613.0),
            }],
            planets: ["b", "c", "d"]
                .iter()
                .map(|s| {
                    Planet::new(format!("Kepler-11 {}", s), "Kepler-11")
                        .with_feature(FeatureId::Radius, 2.0)
                })
                .collect(),
            discoveries: vec![Discovery {
                planet_name: "Kepler-11 b".to_string(),
                method: Some("Transit".to_string()),
                year: Some(2011),
            }],
        };
        db.import(&batch).unwrap();
        db
    }

    fn tier() -> Tier {
        Tier::new("t", vec![FeatureId::Radius], 2, "cluster_t")
    }

    fn assignment(name: &str, rank: usize) -> ClusterAssignment {
        ClusterAssignment {
            planet_name: name.to_string(),
            raw_index: rank - 1,
            rank,
            label: crate::types::rank_label(rank, 2),
        }
    }

    #[test]
    fn test_import_and_load() {
        let db = seeded_db();

        let planets = db.load_planets().unwrap();
        assert_eq!(planets.len(), 3);
        assert_eq!(planets[0].radius, Some(2.0));
        assert_eq!(planets[0].mass, None);

        let star = db.get_star("Kepler-11").unwrap().unwrap();
        assert_eq!(star.distance_pc, Some(613.0));

        let discovery = db.get_discovery("Kepler-11 b").unwrap().unwrap();
        assert_eq!(discovery.year, Some(2011));
    }

    #[test]
    fn test_import_is_upsert() {
        let db = seeded_db();
        let batch = IngestBatch {
            stars: vec![],
            planets: vec![Planet::new("Kepler-11 b", "Kepler-11")
                .with_feature(FeatureId::Radius, 1.8)
                .in_cohort("stage1")],
            discoveries: vec![],
        };
        db.import(&batch).unwrap();

        let planet = db.get_planet("Kepler-11 b").unwrap().unwrap();
        assert_eq!(planet.radius, Some(1.8));
        assert!(planet.has_cohort("stage1"));
        assert_eq!(db.load_planets().unwrap().len(), 3);
    }

    #[test]
    fn test_import_skips_unknown_host() {
        let db = ExoplanetDb::in_memory().unwrap();
        let batch = IngestBatch {
            stars: vec![],
            planets: vec![Planet::new("Orphan b", "Nowhere")],
            discoveries: vec![Discovery {
                planet_name: "Orphan b".to_string(),
                method: None,
                year: None,
            }],
        };

        let stats = db.import(&batch).unwrap();
        assert_eq!(stats.planets, 0);
        assert_eq!(stats.skipped_planets, 1);
        assert_eq!(stats.skipped_discoveries, 1);
    }

    #[test]
    fn test_persist_is_idempotent() {
        let db = seeded_db();
        let assignments = vec![assignment("Kepler-11 b", 1), assignment("Kepler-11 c", 2)];

        db.persist_tier(&tier(), &assignments).unwrap();
        let first = db.load_assignments("cluster_t").unwrap();

        let stats = db.persist_tier(&tier(), &assignments).unwrap();
        let second = db.load_assignments("cluster_t").unwrap();

        assert_eq!(first, second);
        assert_eq!(stats.written, 2);
        assert_eq!(stats.cleared, 0);
    }

    #[test]
    fn test_rerun_clears_no_longer_eligible() {
        let db = seeded_db();
        db.persist_tier(&tier(), &[assignment("Kepler-11 b", 1), assignment("Kepler-11 c", 2)])
            .unwrap();

        let stats = db.persist_tier(&tier(), &[assignment("Kepler-11 c", 1)]).unwrap();

        assert_eq!(stats.cleared, 1);
        assert_eq!(db.get_rank("Kepler-11 b", "cluster_t").unwrap(), None);
        assert_eq!(db.get_rank("Kepler-11 c", "cluster_t").unwrap(), Some(1));
    }

    #[test]
    fn test_columns_are_independent() {
        let db = seeded_db();
        let other = Tier::new("u", vec![FeatureId::Radius], 2, "cluster_u");

        db.persist_tier(&tier(), &[assignment("Kepler-11 b", 2)]).unwrap();
        db.persist_tier(&other, &[assignment("Kepler-11 d", 1)]).unwrap();

        assert_eq!(db.get_rank("Kepler-11 b", "cluster_t").unwrap(), Some(2));
        assert_eq!(db.get_rank("Kepler-11 b", "cluster_u").unwrap(), None);
        assert_eq!(db.load_assignments("cluster_u").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_key_retried_once() {
        let db = seeded_db();
        let assignments = vec![assignment("Kepler-11 b", 1), assignment("Ghost b", 2)];

        let stats = db.persist_tier(&tier(), &assignments).unwrap();

        assert_eq!(stats.written, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(db.get_rank("Kepler-11 b", "cluster_t").unwrap(), Some(1));
    }

    #[test]
    fn test_persistent_conflict_reported() {
        let db = seeded_db();
        db.persist_tier(&tier(), &[assignment("Kepler-11 b", 1)]).unwrap();

        let bad = ClusterAssignment {
            planet_name: "Kepler-11 c".to_string(),
            raw_index: 0,
            rank: 0,
            label: "invalid".to_string(),
        };
        let err = db.persist_tier(&tier(), &[bad]).unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::PersistenceConflict);

        // rolled back: previous state intact
        assert_eq!(db.get_rank("Kepler-11 b", "cluster_t").unwrap(), Some(1));
    }

    #[test]
    fn test_clear_ineligible_keeps_eligible_rows() {
        let db = seeded_db();
        db.persist_tier(&tier(), &[assignment("Kepler-11 b", 1), assignment("Kepler-11 c", 2)])
            .unwrap();

        let cleared = db.clear_ineligible(&tier(), &["Kepler-11 c"]).unwrap();

        assert_eq!(cleared, 1);
        assert_eq!(db.get_rank("Kepler-11 b", "cluster_t").unwrap(), None);
        assert_eq!(db.get_rank("Kepler-11 c", "cluster_t").unwrap(), Some(2));
        assert_eq!(db.clear_ineligible(&tier(), &["Kepler-11 c"]).unwrap(), 0);
    }

    #[test]
    fn test_malformed_cohorts_fail_loudly() {
        let db = seeded_db();
        db.conn
            .lock()
            .execute(
                "UPDATE planets SET cohorts = 'stage1,stage2' WHERE name = ?1",
                params!["Kepler-11 b"],
            )
            .unwrap();

        assert!(matches!(db.load_planets(), Err(Error::Database(_))));
        assert!(db.get_planet("Kepler-11 b").is_err());
        assert!(db.get_planet("Kepler-11 c").unwrap().is_some());
    }

    #[test]
    fn test_record_run() {
        let db = seeded_db();
        let run_id = Uuid::new_v4();
        db.record_run(&TierRunRecord {
            run_id,
            tier: "t".to_string(),
            label_column: "cluster_t".to_string(),
            status: "failed".to_string(),
            eligible: 3,
            k: 4,
            clusters: None,
            failure_kind: Some(FailureKind::IneligiblePopulation),
            reason: Some("too few".to_string()),
        })
        .unwrap();

        assert_eq!(db.count_runs(&run_id.to_string()).unwrap(), 1);
    }

    #[test]
    fn test_verify() {
        let db = seeded_db();
        db.persist_tier(&tier(), &[assignment("Kepler-11 b", 1)]).unwrap();

        let report = db.verify().unwrap();
        assert_eq!(report.stars, 1);
        assert_eq!(report.planets, 3);
        assert_eq!(report.discoveries, 1);
        assert_eq!(report.assignments, 1);
        assert_eq!(report.planets_without_host, 0);
        assert_eq!(report.planets_without_discovery, 2);
    }
}
