//! Pending and approved activities.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, opt_time_col, opt_ts, time_col, ts, uuid_col};
use crate::error::Result;
use crate::models::{Activity, ActivityType, PendingActivity};

fn pending_from_row(row: &Row) -> rusqlite::Result<PendingActivity> {
    Ok(PendingActivity {
        id: uuid_col(row, "id")?,
        creator_id: uuid_col(row, "creator_id")?,
        activity_type: enum_col(row, "activity_type", ActivityType::from_str)?,
        title: row.get("title")?,
        description: row.get("description")?,
        answer: row.get("answer")?,
        location: row.get("location")?,
        start_date: opt_time_col(row, "start_date")?,
        end_date: opt_time_col(row, "end_date")?,
        created_at: time_col(row, "created_at")?,
    })
}

fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: uuid_col(row, "id")?,
        creator_id: uuid_col(row, "creator_id")?,
        activity_type: enum_col(row, "activity_type", ActivityType::from_str)?,
        title: row.get("title")?,
        description: row.get("description")?,
        answer: row.get("answer")?,
        location: row.get("location")?,
        start_date: opt_time_col(row, "start_date")?,
        end_date: opt_time_col(row, "end_date")?,
        xp_reward: row.get("xp_reward")?,
        created_at: time_col(row, "created_at")?,
        approved_at: time_col(row, "approved_at")?,
    })
}

pub fn get_pending(conn: &Connection, id: Uuid) -> Result<Option<PendingActivity>> {
    Ok(conn
        .query_row(
            "SELECT * FROM pending_activities WHERE id = ?1",
            params![id.to_string()],
            pending_from_row,
        )
        .optional()?)
}

/// Moderation queue, oldest submission first.
pub fn list_pending(conn: &Connection) -> Result<Vec<PendingActivity>> {
    let mut stmt = conn.prepare("SELECT * FROM pending_activities ORDER BY created_at")?;
    let rows = stmt
        .query_map([], pending_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn list_pending_by_creator(conn: &Connection, creator_id: Uuid) -> Result<Vec<PendingActivity>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM pending_activities WHERE creator_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt
        .query_map(params![creator_id.to_string()], pending_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn insert_pending(conn: &Connection, pending: &PendingActivity) -> Result<()> {
    conn.execute(
        "INSERT INTO pending_activities
            (id, creator_id, activity_type, title, description, answer, location,
             start_date, end_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            pending.id.to_string(),
            pending.creator_id.to_string(),
            pending.activity_type.as_str(),
            pending.title,
            pending.description,
            pending.answer,
            pending.location,
            opt_ts(&pending.start_date),
            opt_ts(&pending.end_date),
            ts(&pending.created_at),
        ],
    )?;
    Ok(())
}

pub fn delete_pending(conn: &Connection, id: Uuid) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM pending_activities WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(deleted > 0)
}

pub fn get_activity(conn: &Connection, id: Uuid) -> Result<Option<Activity>> {
    Ok(conn
        .query_row(
            "SELECT * FROM activities WHERE id = ?1",
            params![id.to_string()],
            activity_from_row,
        )
        .optional()?)
}

pub fn insert_activity(conn: &Connection, activity: &Activity) -> Result<()> {
    conn.execute(
        "INSERT INTO activities
            (id, creator_id, activity_type, title, description, answer, location,
             start_date, end_date, xp_reward, created_at, approved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            activity.id.to_string(),
            activity.creator_id.to_string(),
            activity.activity_type.as_str(),
            activity.title,
            activity.description,
            activity.answer,
            activity.location,
            opt_ts(&activity.start_date),
            opt_ts(&activity.end_date),
            activity.xp_reward,
            ts(&activity.created_at),
            ts(&activity.approved_at),
        ],
    )?;
    Ok(())
}

/// Persists the mutable parts of an approved activity.
pub fn update_activity(conn: &Connection, activity: &Activity) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE activities SET description = ?1, xp_reward = ?2 WHERE id = ?3",
        params![
            activity.description,
            activity.xp_reward,
            activity.id.to_string()
        ],
    )?;
    Ok(updated > 0)
}
