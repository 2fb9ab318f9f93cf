//! Library store keyed by sample id.

use super::sample_repo::RepoResult;
use crate::model::records::{Library, LibraryId};
use crate::model::sample::SampleId;
use rusqlite::{params, Connection};

pub trait LibraryRepository: Send + Sync {
    /// Libraries of one sample ordered by id.
    fn list_by_sample_id(&self, conn: &Connection, sample_id: SampleId) -> RepoResult<Vec<Library>>;
    fn insert_library(&self, conn: &Connection, library: &Library) -> RepoResult<LibraryId>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteLibraryRepository;

impl LibraryRepository for SqliteLibraryRepository {
    fn list_by_sample_id(&self, conn: &Connection, sample_id: SampleId) -> RepoResult<Vec<Library>> {
        let mut stmt = conn.prepare(
            "SELECT library_id, sample_id, name, alias, description
             FROM libraries
             WHERE sample_id = ?1
             ORDER BY library_id ASC;",
        )?;
        let mut rows = stmt.query([sample_id])?;
        let mut libraries = Vec::new();
        while let Some(row) = rows.next()? {
            libraries.push(Library {
                id: Some(row.get("library_id")?),
                sample_id: row.get("sample_id")?,
                name: row.get("name")?,
                alias: row.get("alias")?,
                description: row.get("description")?,
            });
        }
        Ok(libraries)
    }

    fn insert_library(&self, conn: &Connection, library: &Library) -> RepoResult<LibraryId> {
        conn.execute(
            "INSERT INTO libraries (sample_id, name, alias, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                library.sample_id,
                library.name.as_str(),
                library.alias.as_str(),
                library.description.as_deref(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
