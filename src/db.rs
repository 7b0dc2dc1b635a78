use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::parser::{Excerpt, ExcerptKind, ProcessedReport};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            lead         TEXT PRIMARY KEY,
            hazard       TEXT,
            country      TEXT,
            region       TEXT,
            date         TEXT,
            boilerplate  TEXT NOT NULL DEFAULT '[]',
            sections     INTEGER NOT NULL DEFAULT 0,
            processed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS excerpts (
            id           INTEGER PRIMARY KEY,
            lead         TEXT NOT NULL REFERENCES documents(lead) ON DELETE CASCADE,
            position     INTEGER NOT NULL,
            kind         TEXT NOT NULL CHECK(kind IN ('Challenges','Lessons Learnt')),
            text         TEXT NOT NULL,
            section      TEXT NOT NULL,
            sector_id    TEXT NOT NULL,
            sector_name  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_excerpts_lead ON excerpts(lead);
        CREATE INDEX IF NOT EXISTS idx_excerpts_sector ON excerpts(sector_id);
        ",
    )?;
    Ok(())
}

/// Store processed reports, replacing whatever an earlier run kept for the same leads.
pub fn save_reports(conn: &Connection, reports: &[ProcessedReport]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut clear = tx.prepare("DELETE FROM excerpts WHERE lead = ?1")?;
        let mut d_stmt = tx.prepare(
            "INSERT OR REPLACE INTO documents
             (lead, hazard, country, region, date, boilerplate, sections, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))",
        )?;
        let mut e_stmt = tx.prepare(
            "INSERT INTO excerpts
             (lead, position, kind, text, section, sector_id, sector_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for r in reports {
            clear.execute([&r.lead])?;
            let boilerplate = serde_json::to_string(&r.boilerplate)?;
            d_stmt.execute(rusqlite::params![
                r.lead, r.hazard, r.country, r.region, r.date, boilerplate, r.sections as i64,
            ])?;
            for e in &r.excerpts {
                e_stmt.execute(rusqlite::params![
                    e.lead, e.position as i64, e.kind.label(), e.text, e.section,
                    e.sector_id, e.sector_name,
                ])?;
                count += 1;
            }
        }
    }
    tx.commit()?;
    Ok(count)
}

fn row_to_excerpt(row: &rusqlite::Row) -> rusqlite::Result<Excerpt> {
    let kind: String = row.get(2)?;
    let kind = ExcerptKind::from_label(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown excerpt kind {kind:?}").into(),
        )
    })?;
    let position: i64 = row.get(1)?;
    Ok(Excerpt {
        lead: row.get(0)?,
        position: position as usize,
        kind,
        text: row.get(3)?,
        section: row.get(4)?,
        sector_id: row.get(5)?,
        sector_name: row.get(6)?,
    })
}

const EXCERPT_COLUMNS: &str = "lead, position, kind, text, section, sector_id, sector_name";

pub fn fetch_excerpts(conn: &Connection, lead: &str) -> Result<Vec<Excerpt>> {
    let sql = format!("SELECT {EXCERPT_COLUMNS} FROM excerpts WHERE lead = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([lead], row_to_excerpt)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_all_excerpts(conn: &Connection) -> Result<Vec<Excerpt>> {
    let sql = format!("SELECT {EXCERPT_COLUMNS} FROM excerpts ORDER BY lead, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], row_to_excerpt)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct DocumentRow {
    pub lead: String,
    pub hazard: Option<String>,
    pub country: Option<String>,
    pub date: Option<String>,
    pub sections: usize,
}

pub fn fetch_document(conn: &Connection, lead: &str) -> Result<Option<DocumentRow>> {
    let mut stmt =
        conn.prepare("SELECT lead, hazard, country, date, sections FROM documents WHERE lead = ?1")?;
    let mut rows = stmt.query_map([lead], |row| {
        let sections: i64 = row.get(4)?;
        Ok(DocumentRow {
            lead: row.get(0)?,
            hazard: row.get(1)?,
            country: row.get(2)?,
            date: row.get(3)?,
            sections: sections as usize,
        })
    })?;
    let doc = rows.next().transpose()?;
    Ok(doc)
}

// ── Stats ──

pub struct Stats {
    pub documents: usize,
    pub excerpts: usize,
    pub by_kind: Vec<(String, usize)>,
    pub by_sector: Vec<(String, usize)>,
}

fn grouped_counts(conn: &Connection, column: &str) -> Result<Vec<(String, usize)>> {
    let sql = format!(
        "SELECT {column}, COUNT(*) AS n FROM excerpts GROUP BY {column} ORDER BY n DESC, {column}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let documents: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let excerpts: usize = conn.query_row("SELECT COUNT(*) FROM excerpts", [], |r| r.get(0))?;
    Ok(Stats {
        documents,
        excerpts,
        by_kind: grouped_counts(conn, "kind")?,
        by_sector: grouped_counts(conn, "sector_name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn excerpt(lead: &str, text: &str, kind: ExcerptKind, sector: &str) -> Excerpt {
        Excerpt {
            position: 10,
            text: text.into(),
            kind,
            section: "Health".into(),
            sector_id: sector.into(),
            sector_name: sector.into(),
            lead: lead.into(),
        }
    }

    fn report(lead: &str, excerpts: Vec<Excerpt>) -> ProcessedReport {
        ProcessedReport {
            lead: lead.into(),
            hazard: Some("Flood".into()),
            country: Some("Bolivia".into()),
            region: None,
            date: Some("2021-02-15".into()),
            boilerplate: Vec::new(),
            sections: 2,
            excerpts,
        }
    }

    #[test]
    fn excerpts_round_trip_in_order() {
        let conn = memory_db();
        let saved = save_reports(
            &conn,
            &[report(
                "MDRBO014",
                vec![
                    excerpt("MDRBO014", "Roads were flooded.", ExcerptKind::Challenge, "Health"),
                    excerpt("MDRBO014", "Plan earlier.", ExcerptKind::LessonLearnt, "Health"),
                ],
            )],
        )
        .unwrap();
        assert_eq!(saved, 2);

        let rows = fetch_excerpts(&conn, "MDRBO014").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "Roads were flooded.");
        assert_eq!(rows[1].kind, ExcerptKind::LessonLearnt);

        let doc = fetch_document(&conn, "MDRBO014").unwrap().unwrap();
        assert_eq!(doc.hazard.as_deref(), Some("Flood"));
        assert_eq!(doc.sections, 2);
        assert!(fetch_document(&conn, "MDRXX999").unwrap().is_none());
    }

    #[test]
    fn rerun_replaces_rows() {
        let conn = memory_db();
        let first = vec![excerpt("A1", "Old challenge text.", ExcerptKind::Challenge, "WASH")];
        save_reports(&conn, &[report("A1", first)]).unwrap();
        let second = vec![excerpt("A1", "New challenge text.", ExcerptKind::Challenge, "WASH")];
        save_reports(&conn, &[report("A1", second)]).unwrap();

        let rows = fetch_all_excerpts(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "New challenge text.");
    }

    #[test]
    fn stats_group_by_kind_and_sector() {
        let conn = memory_db();
        save_reports(
            &conn,
            &[
                report(
                    "A1",
                    vec![
                        excerpt("A1", "One.", ExcerptKind::Challenge, "WASH"),
                        excerpt("A1", "Two.", ExcerptKind::Challenge, "Health"),
                    ],
                ),
                report("A2", vec![excerpt("A2", "Three.", ExcerptKind::LessonLearnt, "WASH")]),
            ],
        )
        .unwrap();

        let s = get_stats(&conn).unwrap();
        assert_eq!(s.documents, 2);
        assert_eq!(s.excerpts, 3);
        assert_eq!(
            s.by_kind,
            vec![("Challenges".to_string(), 2), ("Lessons Learnt".to_string(), 1)]
        );
        assert_eq!(s.by_sector[0], ("WASH".to_string(), 2));
    }
}
