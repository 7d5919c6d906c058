mod common;

use common::*;
use std::sync::Arc;
use stubscope_api::models::ids::{FileId, IndexId};
use stubscope_api::models::scope::{IdFilter, SearchScope};
use stubscope_api::ContentSource;
use stubscope_core::{RebuildPolicy, StubEngine, StubscopeError};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn hits(engine: &StubEngine, index: &IndexId, key: &str) -> Vec<(FileId, String)> {
    hits_in(engine, index, key, &SearchScope::everything(), None)
}

fn hits_in(
    engine: &StubEngine,
    index: &IndexId,
    key: &str,
    scope: &SearchScope,
    id_filter: Option<&IdFilter>,
) -> Vec<(FileId, String)> {
    let mut out = Vec::new();
    engine
        .process_elements(
            index,
            key,
            scope,
            id_filter,
            None,
            &CancellationToken::new(),
            &mut |stub| {
                let name = payload_name(stub.payload.as_ref()).unwrap_or_default();
                out.push((stub.file_id, name.to_string()));
                true
            },
        )
        .unwrap();
    out
}

fn indexed_engine(dir: &TempDir) -> (StubEngine, Arc<MemorySource>) {
    let source = MemorySource::new();
    source.put(mock_file(1, "class Foo\nfn helper\n"));
    source.put(mock_file(2, "class Foo\nclass Bar\n"));
    let (engine, _) = build_engine(dir.path(), source.clone(), false, RebuildPolicy::Deferred);
    for content in source.all_files() {
        engine.schedule_update(content);
    }
    (engine, source)
}

#[test]
fn keys_resolve_to_stubs_across_files() {
    let dir = TempDir::new().unwrap();
    let (engine, _source) = indexed_engine(&dir);

    assert_eq!(
        hits(&engine, &class_index(), "Foo"),
        vec![(FileId(1), "Foo".to_string()), (FileId(2), "Foo".to_string())]
    );
    assert_eq!(
        hits(&engine, &name_index(), "helper"),
        vec![(FileId(1), "helper".to_string())]
    );
    // Functions never reach the class index.
    assert!(hits(&engine, &class_index(), "helper").is_empty());
    assert!(hits(&engine, &name_index(), "absent").is_empty());
}

#[test]
fn required_kind_passes_matching_stubs_through() {
    let dir = TempDir::new().unwrap();
    let (engine, _source) = indexed_engine(&dir);

    let mut kinds = Vec::new();
    let complete = engine
        .process_elements(
            &class_index(),
            "Bar",
            &SearchScope::everything(),
            None,
            Some("mock.class"),
            &CancellationToken::new(),
            &mut |stub| {
                kinds.push(stub.external_id.clone());
                true
            },
        )
        .unwrap();
    assert!(complete);
    assert_eq!(kinds, vec!["mock.class".to_string()]);
}

#[test]
fn scope_and_id_filter_restrict_results() {
    let dir = TempDir::new().unwrap();
    let (engine, _source) = indexed_engine(&dir);

    let scope = SearchScope::files([FileId(2)]);
    assert_eq!(
        hits_in(&engine, &class_index(), "Foo", &scope, None),
        vec![(FileId(2), "Foo".to_string())]
    );

    let filter = IdFilter::new([FileId(1)]);
    assert_eq!(
        hits_in(
            &engine,
            &class_index(),
            "Foo",
            &SearchScope::everything(),
            Some(&filter)
        ),
        vec![(FileId(1), "Foo".to_string())]
    );
}

#[test]
fn processor_can_stop_early() {
    let dir = TempDir::new().unwrap();
    let (engine, _source) = indexed_engine(&dir);

    let mut seen = 0;
    let complete = engine
        .process_elements(
            &class_index(),
            "Foo",
            &SearchScope::everything(),
            None,
            None,
            &CancellationToken::new(),
            &mut |_| {
                seen += 1;
                false
            },
        )
        .unwrap();
    assert!(!complete);
    assert_eq!(seen, 1);
}

#[test]
fn cancellation_aborts_the_query() {
    let dir = TempDir::new().unwrap();
    let (engine, _source) = indexed_engine(&dir);

    let token = CancellationToken::new();
    token.cancel();
    let err = engine
        .process_elements(
            &class_index(),
            "Foo",
            &SearchScope::everything(),
            None,
            None,
            &token,
            &mut |_| true,
        )
        .unwrap_err();
    assert!(matches!(err, StubscopeError::Cancelled));
}

#[test]
fn all_keys_are_enumerated_sorted_and_scoped() {
    let dir = TempDir::new().unwrap();
    let (engine, _source) = indexed_engine(&dir);

    assert_eq!(
        engine.get_all_keys(&name_index()).unwrap(),
        vec!["Bar".to_string(), "Foo".to_string(), "helper".to_string()]
    );

    let mut keys = Vec::new();
    engine
        .process_all_keys(
            &name_index(),
            &SearchScope::files([FileId(2)]),
            None,
            &CancellationToken::new(),
            &mut |key| {
                keys.push(key.to_string());
                true
            },
        )
        .unwrap();
    assert_eq!(keys, vec!["Bar".to_string(), "Foo".to_string()]);
}

#[test]
fn unknown_index_is_an_internal_error() {
    let dir = TempDir::new().unwrap();
    let (engine, _source) = indexed_engine(&dir);
    let err = engine.get_all_keys(&IndexId::new("nope")).unwrap_err();
    assert!(matches!(err, StubscopeError::Internal(_)));
}

#[test]
fn binary_files_are_indexed_and_queryable() {
    let dir = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.put(blob_file(5, b"Widget"));
    let (engine, _) = build_engine(dir.path(), source.clone(), false, RebuildPolicy::Deferred);
    engine.schedule_update(source.file(FileId(5)).unwrap());

    assert_eq!(
        hits(&engine, &name_index(), "Widget"),
        vec![(FileId(5), "Widget".to_string())]
    );
}

#[test]
fn removal_erases_a_files_contribution() {
    let dir = TempDir::new().unwrap();
    let (engine, source) = indexed_engine(&dir);
    assert_eq!(hits(&engine, &class_index(), "Foo").len(), 2);

    source.remove(FileId(2));
    engine.schedule_removal(FileId(2));

    assert_eq!(
        hits(&engine, &class_index(), "Foo"),
        vec![(FileId(1), "Foo".to_string())]
    );
    assert!(hits(&engine, &class_index(), "Bar").is_empty());
    assert_eq!(
        engine.get_all_keys(&name_index()).unwrap(),
        vec!["Foo".to_string(), "helper".to_string()]
    );
}
