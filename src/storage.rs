use crate::error::AppError;
use crate::models::CostScenario;
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::path::Path;

/// Local key-value cache of scenarios, keyed by name.
pub struct Storage {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioEntry {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

fn parse_ts(raw: &str, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        let this = Self { conn };
        this.init()?;
        Ok(this)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, AppError> {
        let this = Self {
            conn: Connection::open_in_memory()?,
        };
        this.init()?;
        Ok(this)
    }

    fn init(&self) -> Result<(), AppError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scenarios (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 0,
                payload TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Insert or replace by name. An active scenario deactivates the rest;
    /// replacing an active scenario with an inactive copy keeps it active.
    pub fn save_scenario(&mut self, scenario: &CostScenario) -> Result<(), AppError> {
        let payload = serde_json::to_string(scenario)?;
        let tx = self.conn.transaction()?;
        if scenario.active {
            tx.execute("UPDATE scenarios SET active = 0 WHERE name <> ?", [&scenario.name])?;
        }
        tx.execute(
            "INSERT INTO scenarios (name, created_at, active, payload) VALUES (?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                created_at = excluded.created_at,
                active = MAX(active, excluded.active),
                payload = excluded.payload",
            params![
                scenario.name,
                scenario.created_at.to_rfc3339(),
                scenario.active,
                payload,
            ],
        )?;
        tx.commit()?;
        tracing::info!(scenario = %scenario.name, active = scenario.active, "saved scenario");
        Ok(())
    }

    pub fn load_scenario(&self, name: &str) -> Result<CostScenario, AppError> {
        let row: Option<(String, bool)> = self
            .conn
            .query_row(
                "SELECT payload, active FROM scenarios WHERE name = ?",
                [name],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let (payload, active) =
            row.ok_or_else(|| AppError::NotFound(format!("Scenario '{name}' does not exist.")))?;
        let mut scenario: CostScenario = serde_json::from_str(&payload)?;
        // The column is authoritative; set_active does not rewrite payloads.
        scenario.active = active;
        Ok(scenario)
    }

    pub fn list_scenarios(&self) -> Result<Vec<ScenarioEntry>, AppError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, created_at, active FROM scenarios ORDER BY created_at, name")?;
        let rows = stmt
            .query_map([], |r| {
                Ok(ScenarioEntry {
                    name: r.get(0)?,
                    created_at: parse_ts(&r.get::<_, String>(1)?, 1)?,
                    active: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn active_scenario_name(&self) -> Result<Option<String>, AppError> {
        let name = self
            .conn
            .query_row("SELECT name FROM scenarios WHERE active = 1 LIMIT 1", [], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(name)
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), AppError> {
        let tx = self.conn.transaction()?;
        let updated = tx.execute("UPDATE scenarios SET active = (name = ?)", [name])?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM scenarios WHERE name = ?)",
            [name],
            |r| r.get(0),
        )?;
        if !exists {
            // Dropping the transaction rolls back the cleared flags.
            return Err(AppError::NotFound(format!("Scenario '{name}' does not exist.")));
        }
        tx.commit()?;
        tracing::info!(scenario = %name, rows = updated, "activated scenario");
        Ok(())
    }

    pub fn delete_scenario(&mut self, name: &str) -> Result<(), AppError> {
        let removed = self
            .conn
            .execute("DELETE FROM scenarios WHERE name = ?", [name])?;
        if removed == 0 {
            return Err(AppError::NotFound(format!("Scenario '{name}' does not exist.")));
        }
        tracing::info!(scenario = %name, "deleted scenario");
        Ok(())
    }
}
