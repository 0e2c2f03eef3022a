use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::parse_datetime,
    models::{ActiveActivity, ActivityRecord},
};
use crate::tracker::store::HistoryStore;

fn row_to_record(row: &Row) -> Result<ActivityRecord> {
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;

    let record = ActivityRecord::restore(
        row.get("activity_name")?,
        parse_datetime(&start_time, "start_time")?,
        parse_datetime(&end_time, "end_time")?,
        row.get("duration_secs")?,
        row.get("day_of_week")?,
        row.get("hour_of_day")?,
    )?;
    Ok(record)
}

impl Database {
    pub async fn count_activity_records(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM activity_records", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}

impl HistoryStore for Database {
    fn load(&self) -> Result<Vec<ActivityRecord>> {
        self.execute_blocking(|conn| {
            let mut stmt = conn.prepare(
                "SELECT activity_name, start_time, end_time, duration_secs, day_of_week, hour_of_day
                 FROM activity_records
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row).context("corrupt activity record")?);
            }

            Ok(records)
        })
    }

    fn save(&self, records: &[ActivityRecord]) -> Result<()> {
        let records = records.to_vec();
        self.execute_blocking(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM activity_records", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO activity_records (activity_name, start_time, end_time, duration_secs, day_of_week, hour_of_day)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for record in &records {
                    stmt.execute(params![
                        record.activity_name(),
                        record.start_time().to_rfc3339(),
                        record.end_time().to_rfc3339(),
                        record.duration_secs(),
                        record.day_of_week(),
                        record.hour_of_day(),
                    ])?;
                }
            }
            tx.commit().context("failed to commit activity history")?;
            Ok(())
        })
    }

    fn load_active(&self) -> Result<Option<ActiveActivity>> {
        self.execute_blocking(|conn| {
            let row = conn
                .query_row(
                    "SELECT activity_name, started_at FROM active_activity WHERE id = 1",
                    [],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;

            match row {
                Some((activity_name, started_at)) => Ok(Some(ActiveActivity {
                    activity_name,
                    started_at: parse_datetime(&started_at, "started_at")?,
                })),
                None => Ok(None),
            }
        })
    }

    fn save_active(&self, active: Option<&ActiveActivity>) -> Result<()> {
        let active = active.cloned();
        self.execute_blocking(move |conn| {
            match active {
                Some(active) => {
                    conn.execute(
                        "INSERT INTO active_activity (id, activity_name, started_at)
                         VALUES (1, ?1, ?2)
                         ON CONFLICT(id) DO UPDATE SET
                             activity_name = excluded.activity_name,
                             started_at = excluded.started_at",
                        params![active.activity_name, active.started_at.to_rfc3339()],
                    )?;
                }
                None => {
                    conn.execute("DELETE FROM active_activity", [])?;
                }
            }
            Ok(())
        })
    }
}
