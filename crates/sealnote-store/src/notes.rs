//! Note store: owner-scoped CRUD with encrypt-on-write, decrypt-on-read
//!
//! Every operation matches on both note id and owner id, so a note owned by
//! someone else is indistinguishable from a note that does not exist.
//!
//! The unencrypted `preview` column (first 50 chars of the body, for list
//! views that must not decrypt everything) and the encrypted envelope are
//! produced together by [`Store::seal_body`]; no mutation path can update one
//! without the other.

use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use sealnote_core::types::Note;

use crate::error::{StoreError, StoreResult};
use crate::users::{format_ts, now_utc, parse_ts, parse_uuid};
use crate::Store;

/// Maximum preview length in chars
const PREVIEW_CHARS: usize = 50;

/// Partial note update; `None` fields are left untouched. Tags, when present,
/// replace the existing set wholesale.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Stored row, body still sealed
struct NoteRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    body_envelope: String,
    tags: Vec<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl Store {
    /// Encrypt and persist a new note, returning it with the plaintext body
    /// (built in memory, not re-read from storage).
    pub async fn create_note(
        &self,
        owner_id: Uuid,
        title: &str,
        body: &str,
        tags: Vec<String>,
    ) -> StoreResult<Note> {
        let (preview, envelope) = self.seal_body(body);
        let now = now_utc();
        let id = Uuid::new_v4();

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO notes (id, owner_id, title, preview, body_envelope, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                owner_id.to_string(),
                title,
                preview,
                envelope,
                encode_tags(&tags)?,
                format_ts(&now),
                format_ts(&now),
            ],
        )?;
        tracing::debug!(note_id = %id, owner_id = %owner_id, "note created");

        Ok(Note {
            id,
            owner_id,
            title: title.to_string(),
            content: body.to_string(),
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    /// All of an owner's notes, newest update first, bodies decrypted.
    ///
    /// A non-empty `tag_filter` keeps only notes whose tag set intersects it
    /// (OR semantics).
    pub async fn list_notes(
        &self,
        owner_id: Uuid,
        tag_filter: &[String],
    ) -> StoreResult<Vec<Note>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, title, body_envelope, tags, created_at, updated_at
             FROM notes WHERE owner_id = ?1 ORDER BY updated_at DESC",
        )?;
        let rows = stmt
            .query_map(params![owner_id.to_string()], row_to_note)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut notes = Vec::with_capacity(rows.len());
        for row in rows {
            let row = row?;
            if !tag_filter.is_empty() && !row.tags.iter().any(|t| tag_filter.contains(t)) {
                continue;
            }
            notes.push(self.unseal(row)?);
        }
        Ok(notes)
    }

    /// Apply a patch to one of the owner's notes.
    ///
    /// A new body regenerates preview and envelope together; `updated_at` is
    /// refreshed on every successful update. The returned note carries the
    /// submitted body, or the decrypted stored body when the patch had none.
    pub async fn update_note(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
        patch: NotePatch,
    ) -> StoreResult<Note> {
        let conn = self.conn.lock().await;
        let row = fetch_note(&conn, note_id, owner_id)?.ok_or(StoreError::NoteNotFound)?;

        let title = patch.title.unwrap_or(row.title);
        let tags = patch.tags.unwrap_or(row.tags);
        let now = now_utc();

        let (content, preview, envelope) = match patch.content {
            Some(body) => {
                let (preview, envelope) = self.seal_body(&body);
                (body, preview, envelope)
            }
            None => {
                let body = self.cipher.decrypt(&row.body_envelope)?;
                let preview = preview_of(&body);
                (body, preview, row.body_envelope)
            }
        };

        conn.execute(
            "UPDATE notes
             SET title = ?1, preview = ?2, body_envelope = ?3, tags = ?4, updated_at = ?5
             WHERE id = ?6 AND owner_id = ?7",
            params![
                title,
                preview,
                envelope,
                encode_tags(&tags)?,
                format_ts(&now),
                note_id.to_string(),
                owner_id.to_string(),
            ],
        )?;
        tracing::debug!(note_id = %note_id, "note updated");

        Ok(Note {
            id: note_id,
            owner_id,
            title,
            content,
            tags,
            created_at: row.created_at,
            updated_at: now,
        })
    }

    /// Delete one of the owner's notes.
    pub async fn delete_note(&self, note_id: Uuid, owner_id: Uuid) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
            params![note_id.to_string(), owner_id.to_string()],
        )?;
        if deleted == 0 {
            return Err(StoreError::NoteNotFound);
        }
        tracing::debug!(note_id = %note_id, "note deleted");
        Ok(())
    }

    /// Sorted unique tags across all of the owner's notes.
    pub async fn list_tags(&self, owner_id: Uuid) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT tags FROM notes WHERE owner_id = ?1")?;
        let tag_columns = stmt
            .query_map(params![owner_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut unique = BTreeSet::new();
        for column in tag_columns {
            unique.extend(decode_tags(&column)?);
        }
        Ok(unique.into_iter().collect())
    }

    /// The single write path for body representations: preview and envelope
    /// are always derived from the same plaintext.
    fn seal_body(&self, body: &str) -> (String, String) {
        (preview_of(body), self.cipher.encrypt(body))
    }

    fn unseal(&self, row: NoteRow) -> StoreResult<Note> {
        let content = self.cipher.decrypt(&row.body_envelope)?;
        Ok(Note {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            content,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn preview_of(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}

fn encode_tags(tags: &[String]) -> StoreResult<String> {
    serde_json::to_string(tags).map_err(|e| StoreError::Corrupt(format!("tags encode: {e}")))
}

fn decode_tags(column: &str) -> StoreResult<Vec<String>> {
    serde_json::from_str(column).map_err(|e| StoreError::Corrupt(format!("invalid tags JSON: {e}")))
}

fn fetch_note(conn: &Connection, note_id: Uuid, owner_id: Uuid) -> StoreResult<Option<NoteRow>> {
    conn.query_row(
        "SELECT id, owner_id, title, body_envelope, tags, created_at, updated_at
         FROM notes WHERE id = ?1 AND owner_id = ?2",
        params![note_id.to_string(), owner_id.to_string()],
        row_to_note,
    )
    .optional()?
    .transpose()
}

type RowResult = StoreResult<NoteRow>;

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<RowResult> {
    let id: String = row.get(0)?;
    let owner_id: String = row.get(1)?;
    let title: String = row.get(2)?;
    let body_envelope: String = row.get(3)?;
    let tags: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(build_row(
        id,
        owner_id,
        title,
        body_envelope,
        tags,
        created_at,
        updated_at,
    ))
}

fn build_row(
    id: String,
    owner_id: String,
    title: String,
    body_envelope: String,
    tags: String,
    created_at: String,
    updated_at: String,
) -> RowResult {
    Ok(NoteRow {
        id: parse_uuid(&id)?,
        owner_id: parse_uuid(&owner_id)?,
        title,
        body_envelope,
        tags: decode_tags(&tags)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
