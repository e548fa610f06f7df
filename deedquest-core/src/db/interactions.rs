//! Per-user interactions with approved activities: challenge answers, puzzle
//! solutions, attendances and reviews. Each is unique per (user, activity).

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, time_col, ts, uuid_col};
use crate::error::Result;
use crate::models::{Attendance, ChallengeAnswer, PuzzleAnswer, Review, ReviewType};

fn answer_from_row(row: &Row) -> rusqlite::Result<ChallengeAnswer> {
    Ok(ChallengeAnswer {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        activity_id: uuid_col(row, "activity_id")?,
        description: row.get("description")?,
        confirmed: row.get("confirmed")?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}

fn puzzle_answer_from_row(row: &Row) -> rusqlite::Result<PuzzleAnswer> {
    Ok(PuzzleAnswer {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        activity_id: uuid_col(row, "activity_id")?,
        created_at: time_col(row, "created_at")?,
    })
}

fn attendance_from_row(row: &Row) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        activity_id: uuid_col(row, "activity_id")?,
        confirmed: row.get("confirmed")?,
        created_at: time_col(row, "created_at")?,
    })
}

fn review_from_row(row: &Row) -> rusqlite::Result<Review> {
    Ok(Review {
        id: uuid_col(row, "id")?,
        user_id: uuid_col(row, "user_id")?,
        activity_id: uuid_col(row, "activity_id")?,
        review_type: enum_col(row, "review_type", ReviewType::from_str)?,
        created_at: time_col(row, "created_at")?,
        updated_at: time_col(row, "updated_at")?,
    })
}

// --- Challenge answers ---

pub fn get_answer(conn: &Connection, id: Uuid) -> Result<Option<ChallengeAnswer>> {
    Ok(conn
        .query_row(
            "SELECT * FROM challenge_answers WHERE id = ?1",
            params![id.to_string()],
            answer_from_row,
        )
        .optional()?)
}

pub fn find_answer(
    conn: &Connection,
    user_id: Uuid,
    activity_id: Uuid,
) -> Result<Option<ChallengeAnswer>> {
    Ok(conn
        .query_row(
            "SELECT * FROM challenge_answers WHERE user_id = ?1 AND activity_id = ?2",
            params![user_id.to_string(), activity_id.to_string()],
            answer_from_row,
        )
        .optional()?)
}

pub fn list_answers(conn: &Connection, activity_id: Uuid) -> Result<Vec<ChallengeAnswer>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM challenge_answers WHERE activity_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map(params![activity_id.to_string()], answer_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn insert_answer(conn: &Connection, answer: &ChallengeAnswer) -> Result<()> {
    conn.execute(
        "INSERT INTO challenge_answers
            (id, user_id, activity_id, description, confirmed, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            answer.id.to_string(),
            answer.user_id.to_string(),
            answer.activity_id.to_string(),
            answer.description,
            answer.confirmed,
            ts(&answer.created_at),
            ts(&answer.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_answer(conn: &Connection, answer: &ChallengeAnswer) -> Result<()> {
    conn.execute(
        "UPDATE challenge_answers SET description = ?1, confirmed = ?2, updated_at = ?3
         WHERE id = ?4",
        params![
            answer.description,
            answer.confirmed,
            ts(&answer.updated_at),
            answer.id.to_string(),
        ],
    )?;
    Ok(())
}

pub fn delete_answer(conn: &Connection, id: Uuid) -> Result<()> {
    conn.execute(
        "DELETE FROM challenge_answers WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

// --- Puzzle answers ---

pub fn find_puzzle_answer(
    conn: &Connection,
    user_id: Uuid,
    activity_id: Uuid,
) -> Result<Option<PuzzleAnswer>> {
    Ok(conn
        .query_row(
            "SELECT * FROM puzzle_answers WHERE user_id = ?1 AND activity_id = ?2",
            params![user_id.to_string(), activity_id.to_string()],
            puzzle_answer_from_row,
        )
        .optional()?)
}

pub fn insert_puzzle_answer(conn: &Connection, answer: &PuzzleAnswer) -> Result<()> {
    conn.execute(
        "INSERT INTO puzzle_answers (id, user_id, activity_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            answer.id.to_string(),
            answer.user_id.to_string(),
            answer.activity_id.to_string(),
            ts(&answer.created_at),
        ],
    )?;
    Ok(())
}

// --- Attendances ---

pub fn find_attendance(
    conn: &Connection,
    user_id: Uuid,
    activity_id: Uuid,
) -> Result<Option<Attendance>> {
    Ok(conn
        .query_row(
            "SELECT * FROM attendances WHERE user_id = ?1 AND activity_id = ?2",
            params![user_id.to_string(), activity_id.to_string()],
            attendance_from_row,
        )
        .optional()?)
}

pub fn list_attendances(conn: &Connection, activity_id: Uuid) -> Result<Vec<Attendance>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM attendances WHERE activity_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map(params![activity_id.to_string()], attendance_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn insert_attendance(conn: &Connection, attendance: &Attendance) -> Result<()> {
    conn.execute(
        "INSERT INTO attendances (id, user_id, activity_id, confirmed, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            attendance.id.to_string(),
            attendance.user_id.to_string(),
            attendance.activity_id.to_string(),
            attendance.confirmed,
            ts(&attendance.created_at),
        ],
    )?;
    Ok(())
}

pub fn confirm_attendance(conn: &Connection, id: Uuid) -> Result<()> {
    conn.execute(
        "UPDATE attendances SET confirmed = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

pub fn delete_attendance(conn: &Connection, id: Uuid) -> Result<()> {
    conn.execute("DELETE FROM attendances WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

// --- Reviews ---

pub fn find_review(
    conn: &Connection,
    user_id: Uuid,
    activity_id: Uuid,
) -> Result<Option<Review>> {
    Ok(conn
        .query_row(
            "SELECT * FROM reviews WHERE user_id = ?1 AND activity_id = ?2",
            params![user_id.to_string(), activity_id.to_string()],
            review_from_row,
        )
        .optional()?)
}

pub fn list_reviews(conn: &Connection, activity_id: Uuid) -> Result<Vec<Review>> {
    let mut stmt = conn.prepare("SELECT * FROM reviews WHERE activity_id = ?1 ORDER BY created_at")?;
    let rows = stmt
        .query_map(params![activity_id.to_string()], review_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn insert_review(conn: &Connection, review: &Review) -> Result<()> {
    conn.execute(
        "INSERT INTO reviews (id, user_id, activity_id, review_type, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            review.id.to_string(),
            review.user_id.to_string(),
            review.activity_id.to_string(),
            review.review_type.as_str(),
            ts(&review.created_at),
            ts(&review.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_review(conn: &Connection, review: &Review) -> Result<()> {
    conn.execute(
        "UPDATE reviews SET review_type = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            review.review_type.as_str(),
            ts(&review.updated_at),
            review.id.to_string(),
        ],
    )?;
    Ok(())
}
