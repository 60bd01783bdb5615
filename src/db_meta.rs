use rusqlite::OptionalExtension;
use rusqlite::{Connection, Result, TransactionBehavior};

use crate::schema::{self, Migration};

/// Brings the database up to date with `migrations`.
///
/// Returns `Ok(false)` when the database was written by a newer version.
pub fn ensure_schema(conn: &mut Connection, migrations: &[Migration]) -> Result<bool> {
    trace!("trying to get schema version");

    conn.execute_batch(schema::META_SCHEMA)?;

    if schema_version(conn)? == migrations.len() {
        return Ok(true);
    }

    // Another process may be migrating concurrently, so re-read under the write lock.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let version = schema_version(&tx)?;

    if version > migrations.len() {
        error!(
            "schema version {} is newer than supported {}",
            version,
            migrations.len()
        );
        return Ok(false);
    }

    for migration in &migrations[version..] {
        apply(&tx, migration)?;
    }

    tx.execute(
        "INSERT OR REPLACE INTO Dstream (key, value) VALUES ('schema', ?)",
        [migrations.len() as i64],
    )?;

    tx.commit()?;

    info!(
        "migrated schema from version {} to {}",
        version,
        migrations.len()
    );

    Ok(true)
}

fn schema_version(conn: &Connection) -> Result<usize> {
    let version: Option<i64> = conn
        .query_row("SELECT value FROM Dstream WHERE key = 'schema'", [], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(version.unwrap_or(0) as usize)
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    match *migration {
        Migration::Execute(sql) => {
            debug!("execute migration");
            conn.execute_batch(sql)
        }
        Migration::AddColumn {
            table,
            column,
            definition,
        } => {
            // Databases from before the version table may already have it.
            if column_exists(conn, table, column)? {
                debug!("column {}.{} already present", table, column);
                return Ok(());
            }

            debug!("add column {}.{} {}", table, column, definition);
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                table, column, definition
            ))
        }
    }
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut st = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = st.query([])?;

    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }

    Ok(false)
}
