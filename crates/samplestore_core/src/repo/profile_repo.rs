//! Access-control profile store.

use super::sample_repo::{RepoError, RepoResult};
use crate::model::records::{ProfileId, SecurityProfile};
use rusqlite::{params, Connection, OptionalExtension};

/// Store resolving and persisting security profiles.
pub trait SecurityProfileRepository: Send + Sync {
    fn get_profile(&self, conn: &Connection, id: ProfileId) -> RepoResult<Option<SecurityProfile>>;
    /// Inserts an unsaved profile or updates a saved one; returns its id.
    fn save_profile(&self, conn: &Connection, profile: &SecurityProfile) -> RepoResult<ProfileId>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSecurityProfileRepository;

impl SecurityProfileRepository for SqliteSecurityProfileRepository {
    fn get_profile(&self, conn: &Connection, id: ProfileId) -> RepoResult<Option<SecurityProfile>> {
        let profile = conn
            .query_row(
                "SELECT profile_id, owner, allow_all_internal
                 FROM security_profiles
                 WHERE profile_id = ?1;",
                [id],
                |row| {
                    Ok(SecurityProfile {
                        profile_id: Some(row.get(0)?),
                        owner: row.get(1)?,
                        allow_all_internal: row.get::<_, i64>(2)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn save_profile(&self, conn: &Connection, profile: &SecurityProfile) -> RepoResult<ProfileId> {
        match profile.profile_id {
            None => {
                conn.execute(
                    "INSERT INTO security_profiles (owner, allow_all_internal) VALUES (?1, ?2);",
                    params![profile.owner.as_deref(), profile.allow_all_internal],
                )?;
                Ok(conn.last_insert_rowid())
            }
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE security_profiles
                     SET owner = ?2, allow_all_internal = ?3
                     WHERE profile_id = ?1;",
                    params![id, profile.owner.as_deref(), profile.allow_all_internal],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: "security profile",
                        id,
                    });
                }
                Ok(id)
            }
        }
    }
}
