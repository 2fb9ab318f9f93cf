use rusqlite::Connection;
use samplestore_core::db::{open_db_in_memory, UnitOfWork};
use samplestore_core::repo::library_repo::{LibraryRepository, SqliteLibraryRepository};
use samplestore_core::repo::profile_repo::{
    SecurityProfileRepository, SqliteSecurityProfileRepository,
};
use samplestore_core::{
    Cache, CacheManager, DefaultSampleNamingScheme, InMemoryCache, Library, Note, Sample,
    SampleAdditionalInfo, SampleService, SampleServiceError, SampleStoreConfig, SampleStores,
    SecurityProfile,
};
use std::sync::Arc;

fn service_with_cache(cache: Option<Arc<InMemoryCache>>) -> SampleService {
    let manager = cache.map(|cache| {
        let manager = CacheManager::new();
        manager.register("projectCache", cache);
        Arc::new(manager)
    });
    SampleService::new(
        SampleStores::sqlite(),
        Arc::new(DefaultSampleNamingScheme::new()),
        manager,
        &SampleStoreConfig::default(),
    )
}

fn update_committed(service: &SampleService, conn: &mut Connection, sample: &mut Sample) {
    let mut uow = UnitOfWork::begin(conn).unwrap();
    service.update(&mut uow, sample).unwrap();
    uow.commit().unwrap();
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn update_writes_scalars_without_duplicating_notes() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service_with_cache(None);

    let mut sample = Sample::new("buffy-coat");
    sample.notes.push(Note::new("initial note", 1_000));
    let id = service.save_committed(&mut conn, &mut sample).unwrap();
    let name = sample.name.clone();

    sample.description = Some("re-labelled".to_string());
    sample.notes[0].text = "edited note".to_string();
    update_committed(&service, &mut conn, &mut sample);
    update_committed(&service, &mut conn, &mut sample);

    let stored = service.get(&conn, id).unwrap().unwrap();
    assert_eq!(stored.name, name);
    assert_eq!(stored.description.as_deref(), Some("re-labelled"));
    assert_eq!(stored.notes.len(), 1);
    assert_eq!(stored.notes[0].text, "edited note");
    assert_eq!(count_rows(&conn, "sample_notes"), 1);
}

#[test]
fn update_reads_back_profile_id_and_persists_unsaved_profile() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service_with_cache(None);

    let existing_profile_id = SqliteSecurityProfileRepository
        .save_profile(&conn, &SecurityProfile::owned_by("carol"))
        .unwrap();

    let mut sample = Sample::new("profiled");
    let id = service.save_committed(&mut conn, &mut sample).unwrap();
    assert_eq!(sample.security_profile_id, None);

    sample.security_profile = Some(SecurityProfile {
        profile_id: Some(existing_profile_id),
        owner: Some("carol".to_string()),
        allow_all_internal: false,
    });
    update_committed(&service, &mut conn, &mut sample);
    assert_eq!(sample.security_profile_id, Some(existing_profile_id));

    sample.security_profile = Some(SecurityProfile::owned_by("dave"));
    update_committed(&service, &mut conn, &mut sample);
    let new_profile_id = sample.security_profile_id.unwrap();
    assert_ne!(new_profile_id, existing_profile_id);

    let stored = service.get(&conn, id).unwrap().unwrap();
    assert_eq!(
        stored.security_profile.and_then(|p| p.owner).as_deref(),
        Some("dave")
    );
}

#[test]
fn update_requires_a_saved_existing_sample() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service_with_cache(None);

    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    let err = service
        .update(&mut uow, &mut Sample::new("never-saved"))
        .unwrap_err();
    assert!(matches!(err, SampleServiceError::NotSaved));
    assert!(!uow.is_aborted());

    let mut ghost = Sample::new("ghost");
    ghost.id = 999;
    ghost.name = "SAM999".to_string();
    let err = service.update(&mut uow, &mut ghost).unwrap_err();
    assert!(matches!(err, SampleServiceError::NotFound(999)));
    assert!(uow.is_aborted());
}

#[test]
fn update_into_a_taken_alias_is_rejected_and_restored() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service_with_cache(None);

    service
        .save_committed(&mut conn, &mut Sample::new("taken"))
        .unwrap();
    let mut sample = Sample::new("free");
    let id = service.save_committed(&mut conn, &mut sample).unwrap();

    sample.alias = "taken".to_string();
    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    let err = service.update(&mut uow, &mut sample).unwrap_err();
    assert!(err.is_duplicate_alias());
    assert_eq!(sample.alias, "taken", "restored to the value passed in");
    assert!(uow.commit().is_err());

    let stored = service.get_lazy(&conn, id).unwrap().unwrap();
    assert_eq!(stored.alias, "free");
}

#[test]
fn writes_invalidate_the_owning_project_cache_entry() {
    let mut conn = open_db_in_memory().unwrap();
    let cache = Arc::new(InMemoryCache::new());
    let service = service_with_cache(Some(cache.clone()));

    let mut sample = Sample::new("cached");
    sample.project_id = Some(4);
    service.save_committed(&mut conn, &mut sample).unwrap();

    cache.put("project:4", "stale".to_string());
    sample.description = Some("changed".to_string());
    update_committed(&service, &mut conn, &mut sample);
    assert_eq!(cache.get("project:4"), None);

    cache.put("project:4", "stale again".to_string());
    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    service.delete(&mut uow, &sample).unwrap();
    uow.commit().unwrap();
    assert!(cache.is_empty());
}

#[test]
fn delete_removes_primary_record_and_reports_orphans() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service_with_cache(None);

    let mut sample = Sample::new("to-delete");
    sample.additional_info = Some(SampleAdditionalInfo::new(1));
    sample.notes.push(Note::new("keep me", 1_000));
    let id = service.save_committed(&mut conn, &mut sample).unwrap();
    SqliteLibraryRepository
        .insert_library(
            &conn,
            &Library {
                id: None,
                sample_id: id,
                name: "LIB9".to_string(),
                alias: "lib-nine".to_string(),
                description: None,
            },
        )
        .unwrap();

    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    let outcome = service.delete(&mut uow, &sample).unwrap();
    uow.commit().unwrap();

    assert_eq!(outcome.sample_id, id);
    assert_eq!(outcome.orphaned_libraries, 1);
    assert_eq!(outcome.orphaned_notes, 1);
    assert_eq!(outcome.orphaned_qcs, 0);
    assert!(outcome.has_orphans());

    assert_eq!(service.get(&conn, id).unwrap(), None);
    assert_eq!(count_rows(&conn, "sample_additional_info"), 0);
    assert_eq!(count_rows(&conn, "libraries"), 1);
    assert_eq!(count_rows(&conn, "sample_notes"), 1);
}

#[test]
fn deleting_a_parent_with_children_fails() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service_with_cache(None);

    let mut parent = Sample::new("parent");
    parent.additional_info = Some(SampleAdditionalInfo::new(1));
    let parent_id = service.save_committed(&mut conn, &mut parent).unwrap();
    service
        .save_committed(&mut conn, &mut Sample::child_of(parent_id, 2, "child"))
        .unwrap();

    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    let err = service.delete(&mut uow, &parent).unwrap_err();
    assert!(matches!(err, SampleServiceError::Storage(_)), "got {err}");
    assert!(uow.is_aborted());
    drop(uow);

    assert!(service.get_lazy(&conn, parent_id).unwrap().is_some());
}

#[test]
fn delete_rejects_unsaved_and_missing_samples() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service_with_cache(None);

    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    let err = service.delete(&mut uow, &Sample::new("unsaved")).unwrap_err();
    assert!(matches!(err, SampleServiceError::NotSaved));

    let mut missing = Sample::new("missing");
    missing.id = 31;
    let err = service.delete(&mut uow, &missing).unwrap_err();
    assert!(matches!(err, SampleServiceError::NotFound(31)));
}
