//! Users, skills and creation counters.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, time_col, ts, uuid_col};
use crate::error::Result;
use crate::models::{ActivityType, CreationCounter, Skill, User};

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_col(row, "id")?,
        email: row.get("email")?,
        xp: row.get("xp")?,
        level: row.get("level")?,
        special_title: row.get("special_title")?,
        created_at: time_col(row, "created_at")?,
    })
}

fn skill_from_row(row: &Row) -> rusqlite::Result<Skill> {
    Ok(Skill {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        activity_type: enum_col(row, "activity_type", ActivityType::from_str)?,
        level: row.get("level")?,
    })
}

fn counter_from_row(row: &Row) -> rusqlite::Result<CreationCounter> {
    Ok(CreationCounter {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        activity_type: enum_col(row, "activity_type", ActivityType::from_str)?,
        created_at: time_col(row, "created_at")?,
    })
}

pub fn get_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            "SELECT * FROM users WHERE id = ?1",
            params![id.to_string()],
            user_from_row,
        )
        .optional()?)
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, xp, level, special_title, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.email,
            user.xp,
            user.level,
            user.special_title,
            ts(&user.created_at),
        ],
    )?;
    Ok(())
}

/// Adds a signed amount to a user's XP. Returns the new total.
pub fn add_xp(conn: &Connection, user_id: Uuid, delta: i64) -> Result<i64> {
    Ok(conn.query_row(
        "UPDATE users SET xp = xp + ?1 WHERE id = ?2 RETURNING xp",
        params![delta, user_id.to_string()],
        |row| row.get(0),
    )?)
}

pub fn update_progression(
    conn: &Connection,
    user_id: Uuid,
    level: u32,
    special_title: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE users SET level = ?1, special_title = ?2 WHERE id = ?3",
        params![level, special_title, user_id.to_string()],
    )?;
    Ok(())
}

pub fn get_skills(conn: &Connection, user_id: Uuid) -> Result<Vec<Skill>> {
    let mut stmt = conn.prepare("SELECT * FROM skills WHERE user_id = ?1 ORDER BY activity_type")?;
    let skills = stmt
        .query_map(params![user_id.to_string()], skill_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(skills)
}

pub fn get_skill(
    conn: &Connection,
    user_id: Uuid,
    activity_type: ActivityType,
) -> Result<Option<Skill>> {
    Ok(conn
        .query_row(
            "SELECT * FROM skills WHERE user_id = ?1 AND activity_type = ?2",
            params![user_id.to_string(), activity_type.as_str()],
            skill_from_row,
        )
        .optional()?)
}

/// Skill level for the type, `None` when the user never invested in it.
pub fn skill_level(
    conn: &Connection,
    user_id: Uuid,
    activity_type: ActivityType,
) -> Result<Option<u8>> {
    Ok(get_skill(conn, user_id, activity_type)?.map(|skill| skill.level))
}

pub fn upsert_skill(conn: &Connection, skill: &Skill) -> Result<()> {
    conn.execute(
        "INSERT INTO skills (id, user_id, activity_type, level) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, activity_type) DO UPDATE SET level = excluded.level",
        params![
            skill.id.to_string(),
            skill.user_id.to_string(),
            skill.activity_type.as_str(),
            skill.level,
        ],
    )?;
    Ok(())
}

pub fn get_counters(
    conn: &Connection,
    user_id: Uuid,
    activity_type: ActivityType,
) -> Result<Vec<CreationCounter>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM creation_counters WHERE user_id = ?1 AND activity_type = ?2
         ORDER BY created_at",
    )?;
    let counters = stmt
        .query_map(
            params![user_id.to_string(), activity_type.as_str()],
            counter_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(counters)
}

pub fn insert_counter(conn: &Connection, counter: &CreationCounter) -> Result<()> {
    conn.execute(
        "INSERT INTO creation_counters (id, user_id, activity_type, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            counter.id.to_string(),
            counter.user_id.to_string(),
            counter.activity_type.as_str(),
            ts(&counter.created_at),
        ],
    )?;
    Ok(())
}

/// Deletes a user's counters created at or before `cutoff`. Returns how many went.
pub fn purge_counters(conn: &Connection, user_id: Uuid, cutoff: DateTime<Utc>) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM creation_counters WHERE user_id = ?1 AND created_at <= ?2",
        params![user_id.to_string(), ts(&cutoff)],
    )?)
}
