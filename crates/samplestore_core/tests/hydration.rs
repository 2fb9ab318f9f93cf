use rusqlite::Connection;
use samplestore_core::db::open_db_in_memory;
use samplestore_core::repo::change_log_repo::{ChangeLogRepository, SqliteChangeLogRepository};
use samplestore_core::repo::library_repo::{LibraryRepository, SqliteLibraryRepository};
use samplestore_core::repo::qc_repo::{SampleQcRepository, SqliteSampleQcRepository};
use samplestore_core::{
    ChangeLogEntry, DefaultSampleNamingScheme, Library, Note, Sample, SampleAdditionalInfo,
    SampleQc, SampleService, SampleStoreConfig, SampleStores, SecurityProfile,
};
use std::sync::Arc;

fn default_service() -> SampleService {
    SampleService::new(
        SampleStores::sqlite(),
        Arc::new(DefaultSampleNamingScheme::new()),
        None,
        &SampleStoreConfig::default(),
    )
}

fn seed_collaborators(conn: &Connection, sample_id: i64) {
    SqliteLibraryRepository
        .insert_library(
            conn,
            &Library {
                id: None,
                sample_id,
                name: "LIB1".to_string(),
                alias: "lib-one".to_string(),
                description: None,
            },
        )
        .unwrap();
    SqliteSampleQcRepository
        .insert_qc(
            conn,
            &SampleQc {
                id: None,
                sample_id,
                qc_type: "Qubit".to_string(),
                results: 12.5,
                qc_date: 1_700_000_000_000,
                creator: Some("qc-bot".to_string()),
            },
        )
        .unwrap();
    SqliteChangeLogRepository
        .record_change(
            conn,
            &ChangeLogEntry {
                id: None,
                entity_type: "Sample".to_string(),
                entity_id: sample_id,
                summary: "received".to_string(),
                user_name: Some("admin".to_string()),
                time: 1_700_000_000_000,
            },
        )
        .unwrap();
}

fn hydrated_fixture(service: &SampleService, conn: &mut Connection) -> i64 {
    let mut sample = Sample::new("fixture");
    sample.security_profile = Some(SecurityProfile::owned_by("alice"));
    sample.notes.push(Note::new("first note", 1_000));
    sample.notes.push(Note::new("second note", 2_000));
    let id = service.save_committed(conn, &mut sample).unwrap();
    seed_collaborators(conn, id);
    id
}

#[test]
fn full_fetch_populates_collaborator_data_and_lazy_fetch_does_not() {
    let mut conn = open_db_in_memory().unwrap();
    let service = default_service();
    let id = hydrated_fixture(&service, &mut conn);

    let full = service.get(&conn, id).unwrap().unwrap();
    assert_eq!(
        full.security_profile.as_ref().and_then(|p| p.owner.as_deref()),
        Some("alice")
    );
    assert_eq!(full.libraries.len(), 1);
    assert_eq!(full.libraries[0].alias, "lib-one");
    assert_eq!(full.qcs.len(), 1);
    assert_eq!(full.qcs[0].qc_type, "Qubit");
    assert_eq!(
        full.notes.iter().map(|n| n.text.as_str()).collect::<Vec<_>>(),
        vec!["first note", "second note"]
    );
    assert_eq!(full.change_log.len(), 1);

    let lazy = service.get_lazy(&conn, id).unwrap().unwrap();
    assert_eq!(lazy.security_profile, None);
    assert!(lazy.libraries.is_empty());
    assert!(lazy.qcs.is_empty());
    assert!(lazy.notes.is_empty());
    assert!(lazy.change_log.is_empty());
    assert_eq!(lazy.security_profile_id, full.security_profile_id);
}

#[test]
fn hydrating_twice_yields_identical_samples() {
    let mut conn = open_db_in_memory().unwrap();
    let service = default_service();
    let id = hydrated_fixture(&service, &mut conn);

    let first = service.get(&conn, id).unwrap().unwrap();
    let second = service.get(&conn, id).unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn hierarchy_samples_carry_unhydrated_children_in_id_order() {
    let mut conn = open_db_in_memory().unwrap();
    let service = default_service();

    let mut parent = Sample::new("tissue");
    parent.additional_info = Some(SampleAdditionalInfo::new(1));
    let parent_id = service.save_committed(&mut conn, &mut parent).unwrap();

    let mut child_ids = Vec::new();
    for alias in ["aliquot-a", "aliquot-b"] {
        let mut child = Sample::child_of(parent_id, 2, alias);
        child.notes.push(Note::new("child note", 5_000));
        child_ids.push(service.save_committed(&mut conn, &mut child).unwrap());
    }

    let loaded = service.get(&conn, parent_id).unwrap().unwrap();
    let children = loaded.additional_info.unwrap().children;
    assert_eq!(
        children.iter().map(|c| c.id).collect::<Vec<_>>(),
        child_ids
    );
    assert!(children.iter().all(|c| c.notes.is_empty()));
    assert_eq!(children[1].sibling_number(), Some(2));

    let plain = service.get(&conn, child_ids[0]).unwrap().unwrap();
    assert_eq!(plain.parent_id, Some(parent_id));
    assert!(plain.additional_info.unwrap().children.is_empty());
}

#[test]
fn missing_sample_reads_as_none() {
    let conn = open_db_in_memory().unwrap();
    let service = default_service();
    assert_eq!(service.get(&conn, 404).unwrap(), None);
    assert_eq!(service.get_lazy(&conn, 404).unwrap(), None);
    assert_eq!(service.get_by_barcode(&conn, "nope").unwrap(), None);
}

#[test]
fn list_queries_filter_order_and_limit() {
    let mut conn = open_db_in_memory().unwrap();
    let service = default_service();

    let fixtures = [
        ("alpha", Some(1), Some(100), Some("BC-A"), Some(10)),
        ("beta", Some(1), Some(300), Some("BC-B"), None),
        ("gamma", Some(2), Some(200), None, Some(11)),
    ];
    let mut ids = Vec::new();
    for (alias, project_id, received_date, barcode, box_position) in fixtures {
        let mut sample = Sample::new(alias);
        sample.project_id = project_id;
        sample.received_date = received_date;
        sample.identification_barcode = barcode.map(str::to_string);
        sample.box_position_id = box_position;
        sample.experiment_id = Some(7);
        sample.submission_id = project_id;
        sample.scientific_name = Some(format!("Homo sapiens {alias}"));
        ids.push(service.save_committed(&mut conn, &mut sample).unwrap());
    }
    let aliases = |samples: Vec<Sample>| {
        samples
            .into_iter()
            .map(|sample| sample.alias)
            .collect::<Vec<_>>()
    };

    assert_eq!(service.count(&conn).unwrap(), 3);
    assert_eq!(aliases(service.list_all(&conn).unwrap()), ["alpha", "beta", "gamma"]);
    assert_eq!(aliases(service.list_all_with_limit(&conn, 2).unwrap()), ["alpha", "beta"]);
    assert_eq!(
        aliases(service.list_all_by_received_date(&conn, 2).unwrap()),
        ["beta", "gamma"]
    );
    assert_eq!(aliases(service.list_by_project_id(&conn, 1).unwrap()), ["alpha", "beta"]);
    assert_eq!(aliases(service.list_by_submission_id(&conn, 2).unwrap()), ["gamma"]);
    assert_eq!(service.list_by_experiment_id(&conn, 7).unwrap().len(), 3);
    assert_eq!(aliases(service.list_by_alias(&conn, "beta").unwrap()), ["beta"]);
    assert_eq!(aliases(service.get_by_ids(&conn, &[ids[2], ids[0]]).unwrap()), ["alpha", "gamma"]);
    assert!(service.get_by_ids(&conn, &[]).unwrap().is_empty());
    assert_eq!(
        aliases(
            service
                .get_by_barcodes(&conn, &["BC-B".to_string(), "BC-missing".to_string()])
                .unwrap()
        ),
        ["beta"]
    );
    assert_eq!(
        service
            .get_by_box_position(&conn, 11)
            .unwrap()
            .map(|sample| sample.alias),
        Some("gamma".to_string())
    );
}

#[test]
fn search_binds_the_like_pattern_as_given() {
    let mut conn = open_db_in_memory().unwrap();
    let service = default_service();

    let mut liver = Sample::new("liver-01");
    liver.description = Some("EDTA plasma, spun twice".to_string());
    service.save_committed(&mut conn, &mut liver).unwrap();
    let mut serum = Sample::new("serum-01");
    serum.scientific_name = Some("Mus musculus".to_string());
    service.save_committed(&mut conn, &mut serum).unwrap();

    let hits = |pattern: &str| {
        service
            .list_by_search(&conn, pattern)
            .unwrap()
            .into_iter()
            .map(|sample| sample.alias)
            .collect::<Vec<_>>()
    };
    assert_eq!(hits("liver%"), ["liver-01"]);
    assert_eq!(hits("%musculus"), ["serum-01"]);
    assert_eq!(hits("%-01"), ["liver-01", "serum-01"]);
    assert_eq!(hits("_erum-01"), ["serum-01"]);
    assert!(hits("liver").is_empty(), "no implicit substring wildcards");
    assert!(hits("spun").is_empty());
    assert_eq!(hits("%spun%"), ["liver-01"]);
}

#[test]
fn sample_types_are_listed_alphabetically() {
    let conn = open_db_in_memory().unwrap();
    let types = default_service().list_sample_types(&conn).unwrap();
    assert_eq!(types.first().map(String::as_str), Some("GENOMIC"));
    assert!(types.contains(&"TRANSCRIPTOMIC".to_string()));
    assert!(types.windows(2).all(|pair| pair[0] <= pair[1]));
}
