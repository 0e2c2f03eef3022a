use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{decode_days, encode_days, parse_datetime, parse_time_of_day},
    models::{routine::validation, Routine, RoutineInput},
};

fn row_to_routine(row: &Row) -> Result<Routine> {
    let days: String = row.get("days")?;
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Routine {
        id: row.get("id")?,
        name: row.get("name")?,
        activity: row.get("activity")?,
        days: decode_days(&days)?,
        start: parse_time_of_day(&start_time, "start_time")?,
        end: parse_time_of_day(&end_time, "end_time")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn fetch_routine(conn: &rusqlite::Connection, routine_id: &str) -> Result<Option<Routine>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, activity, days, start_time, end_time, created_at, updated_at
         FROM routines
         WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![routine_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_routine(row)?)),
        None => Ok(None),
    }
}

impl Database {
    /// Create a new routine
    pub async fn create_routine(&self, input: RoutineInput) -> Result<Routine> {
        let input = validation::normalize(input)?;
        self.execute(move |conn| {
            let now = Utc::now();
            let routine_id = Uuid::new_v4().to_string();

            conn.execute(
                "INSERT INTO routines (id, name, activity, days, start_time, end_time, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    routine_id,
                    input.name,
                    input.activity,
                    encode_days(&input.days),
                    input.start.to_string(),
                    input.end.to_string(),
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;

            fetch_routine(conn, &routine_id)?
                .ok_or_else(|| anyhow!("Routine not found after insert"))
        })
        .await
    }

    /// All routines, oldest first
    pub async fn list_routines(&self) -> Result<Vec<Routine>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, activity, days, start_time, end_time, created_at, updated_at
                 FROM routines
                 ORDER BY created_at ASC, id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut routines = Vec::new();
            while let Some(row) = rows.next()? {
                routines.push(row_to_routine(row)?);
            }

            Ok(routines)
        })
        .await
    }

    pub async fn get_routine(&self, routine_id: &str) -> Result<Option<Routine>> {
        let routine_id = routine_id.to_string();
        self.execute(move |conn| fetch_routine(conn, &routine_id))
            .await
    }

    /// Replace every editable field of a routine
    pub async fn update_routine(&self, routine_id: &str, input: RoutineInput) -> Result<Routine> {
        let input = validation::normalize(input)?;
        let routine_id = routine_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE routines
                 SET name = ?1,
                     activity = ?2,
                     days = ?3,
                     start_time = ?4,
                     end_time = ?5,
                     updated_at = ?6
                 WHERE id = ?7",
                params![
                    input.name,
                    input.activity,
                    encode_days(&input.days),
                    input.start.to_string(),
                    input.end.to_string(),
                    Utc::now().to_rfc3339(),
                    routine_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Routine not found"));
            }

            fetch_routine(conn, &routine_id)?
                .ok_or_else(|| anyhow!("Routine not found after update"))
        })
        .await
    }

    pub async fn delete_routine(&self, routine_id: &str) -> Result<()> {
        let routine_id = routine_id.to_string();
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM routines WHERE id = ?1", params![routine_id])?;

            if rows_affected == 0 {
                return Err(anyhow!("Routine not found"));
            }

            Ok(())
        })
        .await
    }

    pub async fn clear_routines(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM routines", [])?;
            Ok(())
        })
        .await
    }
}
