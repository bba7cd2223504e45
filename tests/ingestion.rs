mod common;

use std::sync::Arc;

use common::{cols, dump, engine, sqlite, ScriptedStore};
use tabload::error::{EngineError, ErrorKind};
use tabload::ingestion::{ingest_file, CollisionPolicy, IngestionOptions};
use tabload::introspection::{columns_for, types_for};
use tabload::store::{IdentifierPolicy, Store};
use tabload::types::{FileStatus, InferredType, UploadedFile};

#[test]
fn orders_file_creates_target_and_loads_rows() {
    let store = sqlite();
    let engine = engine(store.clone(), IngestionOptions::default());

    let report = engine
        .ingest(&[UploadedFile::new("orders.csv", "id,amount\n1,10.50\n2,7\n")])
        .unwrap();
    assert_eq!(report.loaded(), 1);
    assert_eq!(report.rows_written(), 2);

    let columns = columns_for(store.as_ref(), &["orders"]).unwrap();
    assert_eq!(columns["orders"], cols(&["id", "amount"]));

    let types = types_for(store.as_ref(), &["orders"]).unwrap();
    assert_eq!(types["orders"].get("id"), Some(InferredType::Integer));
    assert_eq!(types["orders"].get("amount"), Some(InferredType::Decimal));

    assert_eq!(
        dump(store.as_ref(), "orders"),
        vec![
            vec![Some("1".to_string()), Some("10.50".to_string())],
            vec![Some("2".to_string()), Some("7".to_string())],
        ]
    );
}

#[test]
fn header_only_file_never_provisions() {
    let scripted = Arc::new(ScriptedStore::new(sqlite()));
    let engine = engine(scripted.clone(), IngestionOptions::default());

    let report = engine
        .ingest(&[UploadedFile::new("empty.csv", "id,amount\n")])
        .unwrap();

    let outcome = report.outcome("empty.csv").unwrap();
    assert!(matches!(outcome.error(), Some(EngineError::EmptyFile { .. })));
    assert_eq!(outcome.error().unwrap().kind(), ErrorKind::Parse);
    assert_eq!(scripted.count_starting_with("CREATE"), 0);
    assert_eq!(scripted.count_starting_with("INSERT"), 0);
    assert!(columns_for(&*scripted, &["empty"]).unwrap().is_empty());
}

#[test]
fn malformed_file_fails_before_provisioning() {
    let scripted = Arc::new(ScriptedStore::new(sqlite()));
    let err = ingest_file(
        &*scripted,
        &UploadedFile::new("bad.csv", b"a,b\n1,\xff\n".to_vec()),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(scripted.count_starting_with("CREATE"), 0);
}

#[test]
fn failed_insert_keeps_earlier_rows_and_spares_siblings() {
    let inner = sqlite();
    let mut scripted = ScriptedStore::new(inner.clone());
    scripted.fail_insert_at = Some(2);
    let scripted = Arc::new(scripted);

    // One worker so insert numbering is deterministic.
    let engine = tabload::execution::IngestionEngine::new(
        scripted.clone(),
        tabload::execution::ExecutionOptions {
            num_threads: Some(1),
            max_in_flight_files: 1,
        },
        IngestionOptions::default(),
    )
    .unwrap();

    let report = engine
        .ingest(&[
            UploadedFile::new("big.csv", "n\n1\n2\n3\n4\n"),
            UploadedFile::new("small.csv", "n\n9\n"),
        ])
        .unwrap();

    match report.outcome("big.csv").unwrap().error() {
        Some(EngineError::Load { rows_written, .. }) => assert_eq!(*rows_written, 2),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(dump(inner.as_ref(), "big").len(), 2);
    assert!(report.outcome("small.csv").unwrap().is_ok());
    assert_eq!(dump(inner.as_ref(), "small").len(), 1);

    let summary = report.summary();
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.files[0].status, FileStatus::Failed);
    assert_eq!(summary.files[0].rows, Some(2));
    assert_eq!(summary.files[0].error.as_ref().unwrap().kind, ErrorKind::Storage);
}

#[test]
fn failed_provisioning_is_a_storage_error() {
    let mut scripted = ScriptedStore::new(sqlite());
    scripted.fail_create = true;
    let err = ingest_file(
        &scripted,
        &UploadedFile::new("orders.csv", "id\n1\n"),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(scripted.count_starting_with("INSERT"), 0);
}

#[test]
fn second_file_with_other_columns_is_rejected_by_default() {
    let store = sqlite();
    let opts = IngestionOptions::default();
    ingest_file(store.as_ref(), &UploadedFile::new("data.csv", "a,b\n1,2\n"), &opts).unwrap();

    let err = ingest_file(store.as_ref(), &UploadedFile::new("data.csv", "c\n3\n"), &opts).unwrap_err();
    match &err {
        EngineError::SchemaConflict { existing, incoming, .. } => {
            assert_eq!(existing, &cols(&["a", "b"]));
            assert_eq!(incoming, &cols(&["c"]));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(dump(store.as_ref(), "data").len(), 1);
    assert_eq!(columns_for(store.as_ref(), &["data"]).unwrap()["data"], cols(&["a", "b"]));
}

#[test]
fn first_wins_loads_against_existing_columns() {
    let store = sqlite();
    let opts = IngestionOptions {
        collisions: CollisionPolicy::FirstWins,
        ..Default::default()
    };
    ingest_file(store.as_ref(), &UploadedFile::new("data.csv", "a,b\n1,2\n"), &opts).unwrap();
    let stats =
        ingest_file(store.as_ref(), &UploadedFile::new("data.csv", "b,c\n5,6\n"), &opts).unwrap();
    assert_eq!(stats.rows, 1);

    assert_eq!(
        dump(store.as_ref(), "data"),
        vec![
            vec![Some("1".to_string()), Some("2".to_string())],
            vec![None, Some("5".to_string())],
        ]
    );
}

#[test]
fn case_variant_file_name_reaches_the_same_target() {
    let store = sqlite();
    let opts = IngestionOptions::default();
    ingest_file(store.as_ref(), &UploadedFile::new("orders.csv", "id,amount\n1,2\n"), &opts).unwrap();

    let stats =
        ingest_file(store.as_ref(), &UploadedFile::new("Orders.csv", "id,amount\n3,4\n"), &opts).unwrap();
    assert_eq!(stats.rows, 1);
    assert_eq!(dump(store.as_ref(), "orders").len(), 2);
    assert_eq!(
        columns_for(store.as_ref(), &["Orders"]).unwrap()["Orders"],
        cols(&["id", "amount"])
    );

    let err =
        ingest_file(store.as_ref(), &UploadedFile::new("ORDERS.csv", "sku\n9\n"), &opts).unwrap_err();
    assert!(matches!(err, EngineError::SchemaConflict { .. }));

    let first_wins = IngestionOptions {
        collisions: CollisionPolicy::FirstWins,
        ..Default::default()
    };
    ingest_file(store.as_ref(), &UploadedFile::new("ORDERS.csv", "amount\n5\n"), &first_wins).unwrap();
    assert_eq!(dump(store.as_ref(), "orders").len(), 3);
}

#[test]
fn concurrent_files_with_one_name_and_different_headers_are_rejected_once() {
    let store = sqlite();
    let engine = engine(store.clone(), IngestionOptions::default());
    let report = engine
        .ingest(&[
            UploadedFile::new("data.csv", "a,b\n1,2\n"),
            UploadedFile::new("upload/data.csv", "b,c\n3,4\n"),
        ])
        .unwrap();

    assert_eq!(report.loaded(), 1);
    assert_eq!(report.failed(), 1);
    let loser = report.outcomes.iter().find(|o| !o.is_ok()).unwrap();
    assert!(matches!(loser.error(), Some(EngineError::SchemaConflict { .. })));
    let summary = report.summary();
    let failed = summary.files.iter().find(|f| f.status == FileStatus::Failed).unwrap();
    assert_eq!(failed.rows.unwrap_or(0), 0);

    let stored = columns_for(store.as_ref(), &["data"]).unwrap().remove("data").unwrap();
    assert!(stored == cols(&["a", "b"]) || stored == cols(&["b", "c"]));
    assert_eq!(dump(store.as_ref(), "data").len(), 1);
}

#[test]
fn concurrent_files_with_one_name_load_against_the_winner_under_first_wins() {
    let store = sqlite();
    let engine = engine(
        store.clone(),
        IngestionOptions {
            collisions: CollisionPolicy::FirstWins,
            ..Default::default()
        },
    );
    let report = engine
        .ingest(&[
            UploadedFile::new("data.csv", "a,b\n1,2\n"),
            UploadedFile::new("upload/data.csv", "b,c\n3,4\n"),
        ])
        .unwrap();
    assert_eq!(report.loaded(), 2);

    let stored = columns_for(store.as_ref(), &["data"]).unwrap().remove("data").unwrap();
    assert!(stored == cols(&["a", "b"]) || stored == cols(&["b", "c"]));
    let b_values: Vec<_> = store
        .execute("SELECT \"b\" FROM \"data\" ORDER BY \"b\"", &[])
        .unwrap()
        .into_iter()
        .map(|r| r.get("b").map(str::to_owned))
        .collect();
    assert_eq!(b_values, vec![Some("2".to_string()), Some("3".to_string())]);
}

#[test]
fn files_sharing_a_target_in_one_call_both_load() {
    let store = sqlite();
    let engine = engine(store.clone(), IngestionOptions::default());
    let report = engine
        .ingest(&[
            UploadedFile::new("events.csv", "id,kind\n1,a\n2,b\n"),
            UploadedFile::new("uploads/events.CSV", "id,kind\n3,c\n"),
        ])
        .unwrap();
    assert_eq!(report.loaded(), 2);
    assert_eq!(report.outcomes[1].target, "events");
    assert_eq!(dump(store.as_ref(), "events").len(), 3);
}

#[test]
fn empty_ingest_request_is_an_ingestion_error() {
    let engine = engine(sqlite(), IngestionOptions::default());
    let err = engine.ingest(&[]).unwrap_err();
    assert!(matches!(err, EngineError::NoFiles));
    assert_eq!(err.kind(), ErrorKind::Ingestion);
}

#[test]
fn awkward_names_are_quoted_not_interpolated() {
    let store = sqlite();
    let file = UploadedFile::new("my report.csv", "first name,\"say \"\"hi\"\"\"\nAda,hello\n");
    ingest_file(store.as_ref(), &file, &IngestionOptions::default()).unwrap();

    let columns = columns_for(store.as_ref(), &["my report"]).unwrap();
    assert_eq!(columns["my report"], cols(&["first name", "say \"hi\""]));
}

#[test]
fn strict_policy_rejects_unsafe_identifiers_before_touching_the_store() {
    let scripted = ScriptedStore::new(sqlite());
    let opts = IngestionOptions {
        identifiers: IdentifierPolicy::Strict,
        ..Default::default()
    };

    let err = ingest_file(&scripted, &UploadedFile::new("my-report.csv", "a\n1\n"), &opts).unwrap_err();
    assert!(matches!(err, EngineError::InvalidIdentifier { .. }));
    assert_eq!(err.kind(), ErrorKind::Query);

    let err = ingest_file(&scripted, &UploadedFile::new("ok.csv", "a b\n1\n"), &opts).unwrap_err();
    assert!(matches!(err, EngineError::InvalidIdentifier { ref name, .. } if name == "a b"));
    assert!(scripted.statements().is_empty());
}

#[test]
fn control_characters_are_rejected_under_default_policy() {
    let store = sqlite();
    let err = ingest_file(
        store.as_ref(),
        &UploadedFile::new("bad\u{7}.csv", "a\n1\n"),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidIdentifier { .. }));
}

#[test]
fn missing_trailing_fields_load_as_null() {
    let store = sqlite();
    ingest_file(
        store.as_ref(),
        &UploadedFile::from_path("tests/fixtures/people.csv").unwrap(),
        &IngestionOptions::default(),
    )
    .unwrap();

    let rows = dump(store.as_ref(), "people");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][2], Some(String::new()));
    assert_eq!(rows[2][2], None);
}

#[test]
fn custom_delimiter_applies_to_every_file() {
    let store = sqlite();
    let opts = IngestionOptions {
        csv: tabload::ingestion::CsvOptions {
            delimiter: b';',
            ..Default::default()
        },
        ..Default::default()
    };
    let stats = ingest_file(
        store.as_ref(),
        &UploadedFile::from_path("tests/fixtures/cities.csv").unwrap(),
        &opts,
    )
    .unwrap();
    assert_eq!(stats.rows, 2);
    let rows = store
        .execute("SELECT \"city\" FROM \"cities\" ORDER BY rowid", &[])
        .unwrap();
    assert_eq!(rows[0].get("city"), Some("Paris; FR"));
}
