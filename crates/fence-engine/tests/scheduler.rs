use std::sync::Arc;
use std::time::Duration;

use fence_config::FenceConfig;
use fence_engine::{EpochRunner, MemoryStore, Scheduler};

fn config(run_on_start: bool) -> FenceConfig {
    let mut config = FenceConfig::default();
    config.epoch.interval_secs = 3600;
    config.epoch.run_on_start = run_on_start;
    config
}

async fn wait_for_assignments(store: &MemoryStore, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.assignments().len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn manual_trigger_runs_an_epoch() {
    let store = MemoryStore::new();
    store.put_polygon(1, "depot", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    store.report_position("taxi-1", 0.5, 0.5);
    let config = config(false);
    let runner = Arc::new(EpochRunner::new(Arc::new(store), &config).unwrap());

    let (handle, task) = Scheduler::new(Arc::clone(&runner), &config.epoch).spawn();
    assert!(runner.store().assignments().is_empty());

    assert!(handle.trigger());
    wait_for_assignments(runner.store(), 1).await;

    handle.shutdown();
    let completed = task.await.unwrap();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn run_on_start_fires_immediately() {
    let store = MemoryStore::new();
    store.put_polygon(1, "depot", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    store.report_position("taxi-1", 0.5, 0.5);
    let config = config(true);
    let runner = Arc::new(EpochRunner::new(Arc::new(store), &config).unwrap());

    let (handle, task) = Scheduler::new(Arc::clone(&runner), &config.epoch).spawn();
    wait_for_assignments(runner.store(), 1).await;

    handle.shutdown();
    assert!(task.await.unwrap() >= 1);
}
