use anyhow::{Context, Result, bail};
use laquina_db::rusqlite::Connection;
use log::warn;
use std::path::Path;

use laquina_db::db::insert_draw;
use laquina_db::models::{Draw, PICK_COUNT, validate_draw};

/// Ligne attendue : `concours;JJ/MM/AAAA;n1;n2;n3;n4;n5`.
fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let contest_str = get(0)?;
    let contest: u32 = contest_str
        .parse()
        .with_context(|| format!("Numéro de concours invalide : '{}'", contest_str))?;
    let date = parse_date(&get(1)?)?;

    let mut balls = [0u8; PICK_COUNT];
    for (i, ball) in balls.iter_mut().enumerate() {
        let s = get(2 + i)?;
        *ball = s
            .parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, 2 + i))?;
    }
    validate_draw(&balls).with_context(|| format!("Concours {}", contest))?;

    Ok(Draw { contest, date, balls })
}

fn parse_date(raw: &str) -> Result<String> {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        bail!("Format de date invalide: '{}'", raw);
    }
    Ok(format!("{}-{}-{}", parts[2], parts[1], parts[0]))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_records(conn, reader)
}

fn import_records<R: std::io::Read>(conn: &Connection, mut reader: csv::Reader<R>) -> Result<ImportResult> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        warn!("Erreur insertion ligne {}: {:#}", line, e);
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    warn!("Erreur parsing ligne {}: {:#}", line, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                warn!("Erreur lecture ligne {}: {}", line, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use laquina_db::db::{count_draws, fetch_history, migrate};

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("17/02/2026").unwrap(), "2026-02-17");
        assert_eq!(parse_date("01/01/2020").unwrap(), "2020-01-01");
        assert!(parse_date("2020-01-01").is_err());
    }

    #[test]
    fn test_parse_record() {
        let record = csv::StringRecord::from(vec!["6512", "15/07/2024", "44", " 3", "71", "18", "9"]);
        let draw = parse_record(&record).unwrap();
        assert_eq!(draw.contest, 6512);
        assert_eq!(draw.date, "2024-07-15");
        assert_eq!(draw.balls, [44, 3, 71, 18, 9]);
    }

    #[test]
    fn test_parse_record_rejects_bad_numbers() {
        let record = csv::StringRecord::from(vec!["1", "15/07/2024", "44", "3", "81", "18", "9"]);
        assert!(parse_record(&record).is_err());
        let record = csv::StringRecord::from(vec!["1", "15/07/2024", "44", "3"]);
        assert!(parse_record(&record).is_err());
    }

    #[test]
    fn test_import_counts() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let data = "concours;date;n1;n2;n3;n4;n5\n\
                    2;02/01/2024;6;7;8;9;10\n\
                    1;01/01/2024;1;2;3;4;5\n\
                    1;01/01/2024;1;2;3;4;5\n\
                    3;03/01/2024;1;1;3;4;5\n\
                    x;04/01/2024;1;2;3;4;5\n";

        let result = import_records(&conn, reader(data)).unwrap();
        assert_eq!(
            result,
            ImportResult { total_records: 5, inserted: 2, skipped: 1, errors: 2 }
        );
        assert_eq!(count_draws(&conn).unwrap(), 2);
        let history = fetch_history(&conn).unwrap();
        assert_eq!(history[0].contest, 1);
        assert_eq!(history[1].date, "2024-01-02");
    }
}
