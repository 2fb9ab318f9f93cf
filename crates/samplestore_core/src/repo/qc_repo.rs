//! Sample QC store keyed by sample id.

use super::sample_repo::RepoResult;
use crate::model::records::{QcId, SampleQc};
use crate::model::sample::SampleId;
use rusqlite::{params, Connection};

pub trait SampleQcRepository: Send + Sync {
    /// QC records of one sample, oldest first.
    fn list_by_sample_id(&self, conn: &Connection, sample_id: SampleId)
        -> RepoResult<Vec<SampleQc>>;
    fn insert_qc(&self, conn: &Connection, qc: &SampleQc) -> RepoResult<QcId>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSampleQcRepository;

impl SampleQcRepository for SqliteSampleQcRepository {
    fn list_by_sample_id(
        &self,
        conn: &Connection,
        sample_id: SampleId,
    ) -> RepoResult<Vec<SampleQc>> {
        let mut stmt = conn.prepare(
            "SELECT qc_id, sample_id, qc_type, results, qc_date, creator
             FROM sample_qcs
             WHERE sample_id = ?1
             ORDER BY qc_date ASC, qc_id ASC;",
        )?;
        let mut rows = stmt.query([sample_id])?;
        let mut qcs = Vec::new();
        while let Some(row) = rows.next()? {
            qcs.push(SampleQc {
                id: Some(row.get("qc_id")?),
                sample_id: row.get("sample_id")?,
                qc_type: row.get("qc_type")?,
                results: row.get("results")?,
                qc_date: row.get("qc_date")?,
                creator: row.get("creator")?,
            });
        }
        Ok(qcs)
    }

    fn insert_qc(&self, conn: &Connection, qc: &SampleQc) -> RepoResult<QcId> {
        conn.execute(
            "INSERT INTO sample_qcs (sample_id, qc_type, results, qc_date, creator)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                qc.sample_id,
                qc.qc_type.as_str(),
                qc.results,
                qc.qc_date,
                qc.creator.as_deref(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
