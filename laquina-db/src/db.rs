use anyhow::{Context, Result};
use rusqlite::{Connection, Row};
use std::path::Path;

use crate::models::{BacktestRecord, Draw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    contest   INTEGER PRIMARY KEY,
    date      TEXT NOT NULL,
    ball_1    INTEGER NOT NULL,
    ball_2    INTEGER NOT NULL,
    ball_3    INTEGER NOT NULL,
    ball_4    INTEGER NOT NULL,
    ball_5    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS backtest_results (
    run_id            TEXT NOT NULL,
    contest           INTEGER NOT NULL,
    params_json       TEXT NOT NULL,
    predictions_json  TEXT NOT NULL,
    outcome_json      TEXT NOT NULL,
    PRIMARY KEY (run_id, contest)
);
";

const DRAW_COLUMNS: &str = "contest, date, ball_1, ball_2, ball_3, ball_4, ball_5";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("laquina.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn draw_from_row(row: &Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        contest: row.get(0)?,
        date: row.get(1)?,
        balls: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
        ],
    })
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (contest, date, ball_1, ball_2, ball_3, ball_4, ball_5)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            draw.contest,
            draw.date,
            draw.balls[0],
            draw.balls[1],
            draw.balls[2],
            draw.balls[3],
            draw.balls[4],
        ],
    ).with_context(|| format!("Échec de l'insertion du concours {}", draw.contest))?;
    Ok(changed > 0)
}

/// Historique complet, du plus ancien au plus récent concours.
pub fn fetch_history(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("SELECT {DRAW_COLUMNS} FROM draws ORDER BY contest ASC"))?;
    let draws = stmt
        .query_map([], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Lecture de l'historique impossible")?;
    Ok(draws)
}

/// Les `limit` derniers tirages, le plus récent en tête.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY contest DESC LIMIT ?1"
    ))?;
    let draws = stmt
        .query_map([limit], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

/// Un nouveau passage sur le même `(run_id, contest)` remplace l'ancien.
pub fn insert_backtest_result(conn: &Connection, record: &BacktestRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO backtest_results (run_id, contest, params_json, predictions_json, outcome_json)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            record.run_id,
            record.contest,
            record.params_json,
            record.predictions_json,
            record.outcome_json,
        ],
    ).with_context(|| format!("Échec de l'enregistrement du backtest {} / {}", record.run_id, record.contest))?;
    Ok(())
}

pub fn fetch_backtest_results(conn: &Connection, run_id: &str) -> Result<Vec<BacktestRecord>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, contest, params_json, predictions_json, outcome_json
         FROM backtest_results WHERE run_id = ?1 ORDER BY contest ASC",
    )?;
    let rows = stmt
        .query_map([run_id], |row| {
            Ok(BacktestRecord {
                run_id: row.get(0)?,
                contest: row.get(1)?,
                params_json: row.get(2)?,
                predictions_json: row.get(3)?,
                outcome_json: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
