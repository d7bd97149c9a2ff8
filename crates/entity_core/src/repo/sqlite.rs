//! SQLite-backed entity store.
//!
//! # Responsibility
//! - Persist entities in the `entities` table created by `db::migrations`.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - The connection is owned behind a `Mutex`; every operation holds it for
//!   its whole duration.
//! - Read paths reject rows that break entity invariants instead of masking
//!   them.

use crate::clock::{Clock, SystemClock};
use crate::db::migrations::{current_version, latest_version};
use crate::model::entity::Entity;
use crate::repo::entity_repo::{EntityRepository, RepoError, RepoResult};
use rusqlite::{ffi, params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const ENTITIES_TABLE: &str = "entities";
const REQUIRED_COLUMNS: &[&str] = &["id", "name", "created_at", "updated_at"];

const ENTITY_SELECT_SQL: &str = "SELECT
    id,
    name,
    created_at,
    updated_at
FROM entities";

/// Entity store over a migrated SQLite connection.
pub struct SqliteEntityRepository {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteEntityRepository {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema does
    ///   not match what this store reads and writes.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        Self::try_with_clock(conn, Arc::new(SystemClock))
    }

    pub fn try_with_clock(conn: Connection, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl EntityRepository for SqliteEntityRepository {
    fn create(&self, entity: &Entity) -> RepoResult<()> {
        let conn = self.lock()?;
        let now = self.clock.now_ms();

        let inserted = conn.execute(
            "INSERT INTO entities (id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3);",
            params![entity.id.as_str(), entity.name.as_str(), now],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_primary_key_violation(&err) => {
                Err(RepoError::Conflict(entity.id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Entity> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{ENTITY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;

        let Some(row) = rows.next()? else {
            return Err(RepoError::NotFound(id.to_string()));
        };
        parse_entity_row(row)
    }

    fn update(&self, entity: &Entity) -> RepoResult<()> {
        let conn = self.lock()?;
        let now = self.clock.now_ms();

        let changed = conn.execute(
            "UPDATE entities
             SET
                name = ?1,
                updated_at = MAX(updated_at, ?2)
             WHERE id = ?3;",
            params![entity.name.as_str(), now, entity.id.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entity.id.clone()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM entities WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list(&self) -> RepoResult<Vec<Entity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{ENTITY_SELECT_SQL} ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut entities = Vec::new();

        while let Some(row) = rows.next()? {
            entities.push(parse_entity_row(row)?);
        }

        Ok(entities)
    }
}

fn ensure_schema(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [ENTITIES_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(ENTITIES_TABLE));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({ENTITIES_TABLE});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;

    for &column in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: ENTITIES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_entity_row(row: &Row<'_>) -> RepoResult<Entity> {
    let entity = Entity {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };

    if entity.validate().is_err() {
        return Err(RepoError::InvalidData(format!(
            "empty name for entity `{}` in entities.name",
            entity.id
        )));
    }
    if entity.updated_at < entity.created_at {
        return Err(RepoError::InvalidData(format!(
            "updated_at ({}) earlier than created_at ({}) for entity `{}`",
            entity.updated_at, entity.created_at, entity.id
        )));
    }

    Ok(entity)
}
