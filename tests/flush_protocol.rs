use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use index_queue::content::ContentObject;
use index_queue::content::memory::MemoryContentStore;
use index_queue::engine::CatalogQuery;
use index_queue::engine::recording::{EngineCall, RecordingEngine};
use index_queue::error::Result;
use index_queue::gateway::config::{GatewayConfig, IndexingMode};
use index_queue::gateway::{IndexingGateway, UnitState};
use index_queue::operation::{Attributes, TargetId};

struct Fixture {
    engine: Arc<RecordingEngine>,
    content: MemoryContentStore,
    gateway: Arc<IndexingGateway>,
}

fn fixture(config: GatewayConfig) -> Fixture {
    let engine = Arc::new(RecordingEngine::new());
    let content = MemoryContentStore::new();
    let gateway = Arc::new(IndexingGateway::new(
        engine.clone(),
        Arc::new(content.clone()),
        config,
    ));
    Fixture {
        engine,
        content,
        gateway,
    }
}

fn put(content: &MemoryContentStore, path: &str, title: &str) -> ContentObject {
    let object = ContentObject::new(path)
        .with_attribute("title", title)
        .with_attribute("body", "lorem ipsum");
    content.insert(object.clone());
    object
}

#[test]
fn index_then_unindex_never_reaches_the_engine() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let obj1 = put(&f.content, "/obj1", "one");

    let mut uow = f.gateway.begin();
    uow.request_index(&obj1)?;
    uow.request_unindex(&obj1)?;
    let report = uow.flush()?;

    assert!(report.is_empty());
    assert!(f.engine.calls_for(&obj1.id).is_empty());
    assert_eq!(f.gateway.generation(), 0);
    uow.commit()?;
    Ok(())
}

#[test]
fn partial_reindexes_merge_their_attributes() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let obj2 = put(&f.content, "/obj2", "two");

    let mut uow = f.gateway.begin();
    uow.request_reindex(&obj2, Attributes::only(["title"]))?;
    uow.request_reindex(&obj2, Attributes::only(["body"]))?;
    uow.flush()?;

    let expected: BTreeSet<String> = ["title".to_string(), "body".to_string()].into();
    assert_eq!(
        f.engine.calls(),
        vec![EngineCall::Reindex {
            target: obj2.id.clone(),
            attributes: Some(expected),
        }]
    );
    uow.commit()?;
    Ok(())
}

#[test]
fn unindex_then_index_becomes_full_reindex() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let obj3 = put(&f.content, "/obj3", "three");

    let mut uow = f.gateway.begin();
    uow.request_unindex(&obj3)?;
    uow.request_index(&obj3)?;
    uow.flush()?;

    assert_eq!(
        f.engine.calls(),
        vec![EngineCall::Reindex {
            target: obj3.id.clone(),
            attributes: None,
        }]
    );
    uow.commit()?;
    Ok(())
}

#[test]
fn aborted_unit_of_work_applies_nothing() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let obj4 = put(&f.content, "/obj4", "four");

    let mut uow = f.gateway.begin();
    uow.request_index(&obj4)?;
    assert_eq!(uow.abort(), 1);

    assert!(f.engine.calls().is_empty());
    assert_eq!(f.gateway.generation(), 0);
    Ok(())
}

#[test]
fn queries_see_the_unit_of_works_own_writes() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let doc = put(&f.content, "/news/rust", "Rust 2024 released");

    let mut uow = f.gateway.begin();
    uow.request_index(&doc)?;
    assert!(f.engine.calls().is_empty());

    let results = uow
        .catalog()
        .search(&CatalogQuery::new().term("title", "rust"))?;
    assert!(results.contains(&doc.id));
    assert_eq!(uow.state(), UnitState::Flushed);

    // Nothing pending: the next read does not call the engine again.
    uow.catalog().search(&CatalogQuery::new())?;
    assert_eq!(f.engine.calls().len(), 1);
    assert_eq!(f.engine.search_count(), 2);

    let report = uow.commit()?;
    assert_eq!(report.dispatch.applied, 1);
    Ok(())
}

#[test]
fn query_after_unindex_no_longer_finds_the_object() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let doc = put(&f.content, "/news/old", "Old news");

    let mut setup = f.gateway.begin();
    setup.request_index(&doc)?;
    setup.commit()?;

    let mut uow = f.gateway.begin();
    f.content.remove(&doc.id);
    uow.request_unindex(&doc)?;
    let results = uow.catalog().search(&CatalogQuery::new().any("old"))?;
    assert_eq!(results.total_hits, 0);
    uow.commit()?;
    Ok(())
}

#[test]
fn discarded_operations_are_not_visible_to_other_units_of_work() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let doc = put(&f.content, "/draft", "Draft");

    let mut writer = f.gateway.begin();
    writer.request_index(&doc)?;

    let mut reader = f.gateway.begin();
    let results = reader.catalog().search(&CatalogQuery::new().any("draft"))?;
    assert_eq!(results.total_hits, 0);

    writer.discard();
    writer.commit()?;

    let results = reader.catalog().search(&CatalogQuery::new().any("draft"))?;
    assert_eq!(results.total_hits, 0);
    reader.commit()?;
    Ok(())
}

#[test]
fn empty_flush_keeps_the_generation() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let mut uow = f.gateway.begin();

    let report = uow.flush()?;
    assert!(report.is_empty());
    assert_eq!(report.generation, 0);
    assert_eq!(uow.state(), UnitState::Empty);
    uow.commit()?;
    assert_eq!(f.gateway.generation(), 0);
    Ok(())
}

#[test]
fn units_of_work_can_run_in_different_modes() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let a = put(&f.content, "/a", "a");
    let b = put(&f.content, "/b", "b");

    let mut queued = f.gateway.begin();
    let mut immediate = f.gateway.begin();
    immediate.set_mode(IndexingMode::Immediate)?;

    assert_eq!(queued.mode(), IndexingMode::Queued);
    queued.request_index(&a)?;
    immediate.request_index(&b)?;
    assert_eq!(f.engine.calls(), vec![EngineCall::Index { target: b.id.clone() }]);

    queued.commit()?;
    immediate.commit()?;
    assert_eq!(f.engine.calls().len(), 2);
    Ok(())
}

#[test]
fn generation_counts_non_empty_flushes() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..100 {
        let f = fixture(GatewayConfig::default());
        let objects: Vec<ContentObject> = (0..5)
            .map(|i| put(&f.content, &format!("/doc{i}"), &format!("title {i}")))
            .collect();

        let mut uow = f.gateway.begin();
        let mut expected = 0u64;

        for _ in 0..rng.random_range(1..40) {
            match rng.random_range(0..10) {
                0..=6 => {
                    let object = &objects[rng.random_range(0..objects.len())];
                    match rng.random_range(0..3) {
                        0 => uow.request_index(object)?,
                        1 => uow.request_unindex(object)?,
                        _ => uow.request_reindex(object, Attributes::only(["title"]))?,
                    };
                }
                7 | 8 => {
                    let pending = uow.pending().len();
                    let report = uow.flush()?;
                    assert_eq!(report.dispatch.attempted, pending);
                    assert!(report.is_success());
                    if pending > 0 {
                        expected += 1;
                    }
                    assert_eq!(report.generation, expected);
                }
                _ => {
                    uow.discard();
                }
            }
            assert_eq!(f.gateway.generation(), expected);
        }

        let pending = uow.pending().len();
        uow.commit()?;
        if pending > 0 {
            expected += 1;
        }
        assert_eq!(f.gateway.generation(), expected);
    }
    Ok(())
}

#[test]
fn failed_targets_are_reported_and_not_retried() -> Result<()> {
    let f = fixture(GatewayConfig::default());
    let good = put(&f.content, "/good", "good");
    let bad = put(&f.content, "/bad", "bad");
    f.engine.fail_on(bad.id.clone());

    let mut uow = f.gateway.begin();
    uow.request_index(&bad)?;
    uow.request_index(&good)?;
    let report = uow.flush()?;

    assert_eq!(report.dispatch.failed_targets(), vec![&bad.id]);
    assert!(uow.pending().is_empty());

    f.engine.recover(&bad.id);
    let report = uow.flush()?;
    assert!(report.is_empty());
    assert_eq!(f.engine.calls_for(&bad.id).len(), 1);

    let indexed: Vec<TargetId> = f.engine.catalog().snapshot().into_keys().collect();
    assert_eq!(indexed, vec![good.id.clone()]);
    uow.commit()?;
    Ok(())
}
