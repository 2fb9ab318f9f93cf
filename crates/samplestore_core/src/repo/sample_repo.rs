//! Primary sample store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own identity and scalar fields of samples (`samples`,
//!   `sample_additional_info`).
//! - Answer the hierarchy queries creation depends on (max sibling number,
//!   alias counts).
//!
//! # Invariants
//! - Never reads or writes collaborator-owned collections; loaded samples
//!   always come back with them empty.
//! - `sample_additional_info` is written in lockstep with the sample row.

use crate::db::DbError;
use crate::model::sample::{Sample, SampleAdditionalInfo, SampleId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SAMPLE_SELECT_SQL: &str = "SELECT
    s.sample_id AS sample_id,
    s.name AS name,
    s.alias AS alias,
    s.description AS description,
    s.scientific_name AS scientific_name,
    s.sample_type AS sample_type,
    s.identification_barcode AS identification_barcode,
    s.project_id AS project_id,
    s.received_date AS received_date,
    s.box_position_id AS box_position_id,
    s.experiment_id AS experiment_id,
    s.submission_id AS submission_id,
    s.parent_id AS parent_id,
    s.security_profile_id AS security_profile_id,
    sai.sample_id AS info_sample_id,
    sai.sample_class_id AS sample_class_id,
    sai.sibling_number AS sibling_number
FROM samples s
LEFT JOIN sample_additional_info sai ON sai.sample_id = s.sample_id";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error shared by the primary and collaborator stores.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { entity: &'static str, id: i64 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Single-row lookups by a unique attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLookup<'a> {
    Barcode(&'a str),
    BoxPosition(i64),
}

/// List filter criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SampleFilter {
    #[default]
    All,
    Ids(Vec<SampleId>),
    Barcodes(Vec<String>),
    Alias(String),
    ProjectId(i64),
    ExperimentId(i64),
    SubmissionId(i64),
    ParentId(SampleId),
    /// SQL `LIKE` pattern matched against barcode, name, alias, description
    /// and scientific name. The pattern is bound as given, so callers supply
    /// their own `%`/`_` wildcards.
    Search(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SampleOrder {
    #[default]
    IdAsc,
    ReceivedDateDesc,
}

/// Query options for listing samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleListQuery {
    pub filter: SampleFilter,
    pub order: SampleOrder,
    pub limit: Option<u32>,
}

impl SampleListQuery {
    pub fn filtered(filter: SampleFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

/// Primary store for sample identity and scalar fields.
pub trait SampleRepository: Send + Sync {
    /// Inserts a new row and returns the generated id. `sample.id` is ignored.
    fn insert_sample(&self, conn: &Connection, sample: &Sample) -> RepoResult<SampleId>;
    fn update_sample(&self, conn: &Connection, sample: &Sample) -> RepoResult<()>;
    fn delete_sample(&self, conn: &Connection, id: SampleId) -> RepoResult<()>;
    fn get_sample(&self, conn: &Connection, id: SampleId) -> RepoResult<Option<Sample>>;
    fn find_sample(&self, conn: &Connection, lookup: SampleLookup<'_>)
        -> RepoResult<Option<Sample>>;
    fn list_samples(&self, conn: &Connection, query: &SampleListQuery) -> RepoResult<Vec<Sample>>;
    /// Highest sibling number among children of `parent_id` in `sample_class_id`.
    fn max_sibling_number(
        &self,
        conn: &Connection,
        parent_id: SampleId,
        sample_class_id: i64,
    ) -> RepoResult<Option<i64>>;
    /// Number of rows (including uncommitted ones in `conn`) using `alias`.
    fn count_by_alias(&self, conn: &Connection, alias: &str) -> RepoResult<u64>;
    fn count_samples(&self, conn: &Connection) -> RepoResult<u64>;
    fn list_sample_types(&self, conn: &Connection) -> RepoResult<Vec<String>>;
}

/// SQLite-backed primary sample store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSampleRepository;

impl SampleRepository for SqliteSampleRepository {
    fn insert_sample(&self, conn: &Connection, sample: &Sample) -> RepoResult<SampleId> {
        conn.execute(
            "INSERT INTO samples (
                name,
                alias,
                description,
                scientific_name,
                sample_type,
                identification_barcode,
                project_id,
                received_date,
                box_position_id,
                experiment_id,
                submission_id,
                parent_id,
                security_profile_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                sample.name.as_str(),
                sample.alias.as_str(),
                sample.description.as_deref(),
                sample.scientific_name.as_deref(),
                sample.sample_type.as_deref(),
                sample.identification_barcode.as_deref(),
                sample.project_id,
                sample.received_date,
                sample.box_position_id,
                sample.experiment_id,
                sample.submission_id,
                sample.parent_id,
                sample.security_profile_id,
            ],
        )?;
        let id = conn.last_insert_rowid();

        if let Some(info) = sample.additional_info.as_ref() {
            write_additional_info(conn, id, info)?;
        }
        Ok(id)
    }

    fn update_sample(&self, conn: &Connection, sample: &Sample) -> RepoResult<()> {
        let changed = conn.execute(
            "UPDATE samples
             SET
                name = ?2,
                alias = ?3,
                description = ?4,
                scientific_name = ?5,
                sample_type = ?6,
                identification_barcode = ?7,
                project_id = ?8,
                received_date = ?9,
                box_position_id = ?10,
                experiment_id = ?11,
                submission_id = ?12,
                parent_id = ?13,
                security_profile_id = ?14,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE sample_id = ?1;",
            params![
                sample.id,
                sample.name.as_str(),
                sample.alias.as_str(),
                sample.description.as_deref(),
                sample.scientific_name.as_deref(),
                sample.sample_type.as_deref(),
                sample.identification_barcode.as_deref(),
                sample.project_id,
                sample.received_date,
                sample.box_position_id,
                sample.experiment_id,
                sample.submission_id,
                sample.parent_id,
                sample.security_profile_id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "sample",
                id: sample.id,
            });
        }

        match sample.additional_info.as_ref() {
            Some(info) => write_additional_info(conn, sample.id, info)?,
            None => {
                conn.execute(
                    "DELETE FROM sample_additional_info WHERE sample_id = ?1;",
                    [sample.id],
                )?;
            }
        }
        Ok(())
    }

    fn delete_sample(&self, conn: &Connection, id: SampleId) -> RepoResult<()> {
        let changed = conn.execute("DELETE FROM samples WHERE sample_id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "sample",
                id,
            });
        }
        Ok(())
    }

    fn get_sample(&self, conn: &Connection, id: SampleId) -> RepoResult<Option<Sample>> {
        let mut stmt = conn.prepare(&format!("{SAMPLE_SELECT_SQL} WHERE s.sample_id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sample_row(row)?));
        }
        Ok(None)
    }

    fn find_sample(
        &self,
        conn: &Connection,
        lookup: SampleLookup<'_>,
    ) -> RepoResult<Option<Sample>> {
        let (predicate, value) = match lookup {
            SampleLookup::Barcode(barcode) => (
                "s.identification_barcode = ?1",
                Value::Text(barcode.to_string()),
            ),
            SampleLookup::BoxPosition(position_id) => {
                ("s.box_position_id = ?1", Value::Integer(position_id))
            }
        };
        let mut stmt = conn.prepare(&format!("{SAMPLE_SELECT_SQL} WHERE {predicate};"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sample_row(row)?));
        }
        Ok(None)
    }

    fn list_samples(&self, conn: &Connection, query: &SampleListQuery) -> RepoResult<Vec<Sample>> {
        let mut sql = format!("{SAMPLE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match &query.filter {
            SampleFilter::All => {}
            SampleFilter::Ids(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                sql.push_str(&format!(" AND s.sample_id IN ({})", placeholders(ids.len())));
                bind_values.extend(ids.iter().map(|id| Value::Integer(*id)));
            }
            SampleFilter::Barcodes(barcodes) => {
                if barcodes.is_empty() {
                    return Ok(Vec::new());
                }
                sql.push_str(&format!(
                    " AND s.identification_barcode IN ({})",
                    placeholders(barcodes.len())
                ));
                bind_values.extend(barcodes.iter().map(|value| Value::Text(value.clone())));
            }
            SampleFilter::Alias(alias) => {
                sql.push_str(" AND s.alias = ?");
                bind_values.push(Value::Text(alias.clone()));
            }
            SampleFilter::ProjectId(id) => {
                sql.push_str(" AND s.project_id = ?");
                bind_values.push(Value::Integer(*id));
            }
            SampleFilter::ExperimentId(id) => {
                sql.push_str(" AND s.experiment_id = ?");
                bind_values.push(Value::Integer(*id));
            }
            SampleFilter::SubmissionId(id) => {
                sql.push_str(" AND s.submission_id = ?");
                bind_values.push(Value::Integer(*id));
            }
            SampleFilter::ParentId(id) => {
                sql.push_str(" AND s.parent_id = ?");
                bind_values.push(Value::Integer(*id));
            }
            SampleFilter::Search(pattern) => {
                sql.push_str(
                    " AND (s.identification_barcode LIKE ?1
                       OR s.name LIKE ?1
                       OR s.alias LIKE ?1
                       OR s.description LIKE ?1
                       OR s.scientific_name LIKE ?1)",
                );
                bind_values.push(Value::Text(pattern.clone()));
            }
        }

        match query.order {
            SampleOrder::IdAsc => sql.push_str(" ORDER BY s.sample_id ASC"),
            SampleOrder::ReceivedDateDesc => {
                sql.push_str(" ORDER BY s.received_date DESC, s.sample_id ASC")
            }
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut samples = Vec::new();
        while let Some(row) = rows.next()? {
            samples.push(parse_sample_row(row)?);
        }
        Ok(samples)
    }

    fn max_sibling_number(
        &self,
        conn: &Connection,
        parent_id: SampleId,
        sample_class_id: i64,
    ) -> RepoResult<Option<i64>> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(sai.sibling_number)
             FROM sample_additional_info sai
             INNER JOIN samples s ON s.sample_id = sai.sample_id
             WHERE s.parent_id = ?1
               AND sai.sample_class_id = ?2;",
            params![parent_id, sample_class_id],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    fn count_by_alias(&self, conn: &Connection, alias: &str) -> RepoResult<u64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM samples WHERE alias = ?1;",
            [alias],
            |row| row.get(0),
        )?;
        to_count(count)
    }

    fn count_samples(&self, conn: &Connection) -> RepoResult<u64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM samples;", [], |row| row.get(0))?;
        to_count(count)
    }

    fn list_sample_types(&self, conn: &Connection) -> RepoResult<Vec<String>> {
        let mut stmt = conn.prepare("SELECT name FROM sample_types ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }
}

fn write_additional_info(
    conn: &Connection,
    sample_id: SampleId,
    info: &SampleAdditionalInfo,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO sample_additional_info (sample_id, sample_class_id, sibling_number)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(sample_id) DO UPDATE SET
            sample_class_id = excluded.sample_class_id,
            sibling_number = excluded.sibling_number;",
        params![sample_id, info.sample_class_id, info.sibling_number],
    )?;
    Ok(())
}

fn parse_sample_row(row: &Row<'_>) -> RepoResult<Sample> {
    let additional_info = match row.get::<_, Option<i64>>("info_sample_id")? {
        Some(_) => Some(SampleAdditionalInfo {
            sample_class_id: row.get("sample_class_id")?,
            sibling_number: row.get("sibling_number")?,
            children: Vec::new(),
        }),
        None => None,
    };

    let mut sample = Sample::new(row.get::<_, String>("alias")?);
    sample.id = row.get("sample_id")?;
    sample.name = row.get("name")?;
    sample.description = row.get("description")?;
    sample.scientific_name = row.get("scientific_name")?;
    sample.sample_type = row.get("sample_type")?;
    sample.identification_barcode = row.get("identification_barcode")?;
    sample.project_id = row.get("project_id")?;
    sample.received_date = row.get("received_date")?;
    sample.box_position_id = row.get("box_position_id")?;
    sample.experiment_id = row.get("experiment_id")?;
    sample.submission_id = row.get("submission_id")?;
    sample.parent_id = row.get("parent_id")?;
    sample.security_profile_id = row.get("security_profile_id")?;
    sample.additional_info = additional_info;
    Ok(sample)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn to_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}
