use std::sync::Arc;
use std::thread;

use index_queue::content::ContentObject;
use index_queue::content::memory::MemoryContentStore;
use index_queue::engine::memory::MemoryCatalog;
use index_queue::engine::{CatalogQuery, IndexEngine};
use index_queue::error::Result;
use index_queue::gateway::IndexingGateway;
use index_queue::gateway::config::GatewayConfig;
use index_queue::operation::Attributes;

const THREADS: usize = 8;
const DOCS_PER_THREAD: usize = 25;

#[test]
fn parallel_units_of_work_share_one_gateway() -> Result<()> {
    let catalog = Arc::new(MemoryCatalog::new());
    let content = MemoryContentStore::new();
    let gateway = Arc::new(IndexingGateway::new(
        catalog.clone(),
        Arc::new(content.clone()),
        GatewayConfig::default(),
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let gateway = Arc::clone(&gateway);
            let content = content.clone();
            thread::spawn(move || -> Result<usize> {
                let mut uow = gateway.begin();
                for i in 0..DOCS_PER_THREAD {
                    let doc = ContentObject::new(format!("/w{worker}/doc{i}"))
                        .with_attribute("title", format!("worker{worker} document"));
                    content.insert(doc.clone());
                    uow.request_index(&doc)?;
                    uow.request_reindex(&doc, Attributes::only(["title"]))?;
                    if i % 5 == 4 {
                        uow.request_unindex(&doc)?;
                    }
                }

                // Own writes are visible before commit.
                let own = uow
                    .catalog()
                    .search(&CatalogQuery::new().term("title", format!("worker{worker}")))?;
                let report = uow.commit()?;
                assert!(report.is_success());
                Ok(own.total_hits)
            })
        })
        .collect();

    let expected_per_thread = DOCS_PER_THREAD - DOCS_PER_THREAD / 5;
    for handle in handles {
        let visible = handle.join().expect("worker thread panicked")?;
        assert_eq!(visible, expected_per_thread);
    }

    assert_eq!(catalog.len(), THREADS * expected_per_thread);
    // One flush per unit of work: the read flushed everything, commit had nothing left.
    assert_eq!(gateway.generation(), THREADS as u64);
    assert_eq!(catalog.counter(), (THREADS * expected_per_thread) as u64);
    Ok(())
}
