//! Media rows for every owner kind.

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{enum_col, time_col, ts, uuid_col};
use crate::error::Result;
use crate::models::{Media, MediaOwner};

fn media_from_row(row: &Row) -> rusqlite::Result<Media> {
    Ok(Media {
        id: uuid_col(row, "id")?,
        owner: enum_col(row, "owner", MediaOwner::from_str)?,
        owner_id: uuid_col(row, "owner_id")?,
        public_id: row.get("public_id")?,
        url: row.get("url")?,
        created_at: time_col(row, "created_at")?,
    })
}

pub fn list_media(conn: &Connection, owner: MediaOwner, owner_id: Uuid) -> Result<Vec<Media>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM media WHERE owner = ?1 AND owner_id = ?2 ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map(params![owner.as_str(), owner_id.to_string()], media_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn insert_media(conn: &Connection, media: &Media) -> Result<()> {
    conn.execute(
        "INSERT INTO media (id, owner, owner_id, public_id, url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            media.id.to_string(),
            media.owner.as_str(),
            media.owner_id.to_string(),
            media.public_id,
            media.url,
            ts(&media.created_at),
        ],
    )?;
    Ok(())
}

/// Moves every media row from one owner to another. Returns how many moved.
pub fn reassign_media(
    conn: &Connection,
    from: (MediaOwner, Uuid),
    to: (MediaOwner, Uuid),
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE media SET owner = ?1, owner_id = ?2 WHERE owner = ?3 AND owner_id = ?4",
        params![
            to.0.as_str(),
            to.1.to_string(),
            from.0.as_str(),
            from.1.to_string()
        ],
    )?)
}

/// Deletes an owner's media rows and returns the public ids to clean up.
pub fn take_media(conn: &Connection, owner: MediaOwner, owner_id: Uuid) -> Result<Vec<String>> {
    let public_ids = list_media(conn, owner, owner_id)?
        .into_iter()
        .map(|media| media.public_id)
        .collect();
    conn.execute(
        "DELETE FROM media WHERE owner = ?1 AND owner_id = ?2",
        params![owner.as_str(), owner_id.to_string()],
    )?;
    Ok(public_ids)
}
