//! Startup orchestration: readiness barrier, fail-fast, and end-to-end
//! serving over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use catalog_server::db::{MemoryStore, SessionFactory};
use catalog_server::{start_with, PersistenceError, StartupConfig, StartupError, WorkerPool};
use serde_json::{json, Value};
use tokio::sync::oneshot;

fn loopback_config() -> StartupConfig {
    StartupConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..StartupConfig::default()
    }
}

fn memory_factory() -> Arc<dyn SessionFactory> {
    Arc::new(MemoryStore::new())
}

#[tokio::test]
async fn ready_when_both_subsystems_succeed() {
    let ready = start_with(&loopback_config(), WorkerPool::current(), async {
        Ok::<_, PersistenceError>(memory_factory())
    })
    .await
    .expect("startup should succeed");

    assert_ne!(ready.local_addr().port(), 0);
    assert!(ready.gateway().find_all().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn waits_for_slow_persistence() {
    let (release, gate) = oneshot::channel::<()>();

    let startup = tokio::spawn(async move {
        start_with(&loopback_config(), WorkerPool::current(), async move {
            let _ = gate.await;
            Ok::<_, PersistenceError>(memory_factory())
        })
        .await
    });

    // The listener binds quickly; startup must still be pending.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!startup.is_finished());

    release.send(()).unwrap();
    let ready = startup.await.unwrap();
    assert!(ready.is_ok());
}

#[tokio::test]
async fn persistence_failure_is_not_masked_by_listener() {
    let result = start_with(&loopback_config(), WorkerPool::current(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err::<Arc<dyn SessionFactory>, _>(PersistenceError::transient("connection refused"))
    })
    .await;

    match result {
        Err(StartupError::Persistence(err)) => assert!(err.is_retryable()),
        Err(other) => panic!("unexpected startup error: {other}"),
        Ok(_) => panic!("startup must fail when persistence fails"),
    }
}

#[tokio::test]
async fn listener_closed_when_persistence_fails_after_bind() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = StartupConfig {
        bind_addr: addr,
        ..StartupConfig::default()
    };

    // The bind completes first; persistence fails afterwards.
    let result = start_with(&config, WorkerPool::current(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err::<Arc<dyn SessionFactory>, _>(PersistenceError::transient("connection refused"))
    })
    .await;
    assert!(matches!(result, Err(StartupError::Persistence(_))));

    let rebound = std::net::TcpListener::bind(addr);
    assert!(rebound.is_ok(), "port still held after failed startup: {rebound:?}");
}

#[tokio::test]
async fn listener_failure_fails_fast() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = StartupConfig {
        bind_addr: occupied.local_addr().unwrap(),
        ..StartupConfig::default()
    };

    // Persistence never becomes ready; the bind failure alone ends startup.
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        start_with(&config, WorkerPool::current(), async {
            std::future::pending::<()>().await;
            Ok::<_, PersistenceError>(memory_factory())
        }),
    )
    .await
    .expect("startup must not wait for persistence after a bind failure");

    match result {
        Err(StartupError::Listener { addr, .. }) => assert_eq!(addr, config.bind_addr),
        Err(other) => panic!("unexpected startup error: {other}"),
        Ok(_) => panic!("startup must fail when the listener cannot bind"),
    }
}

#[tokio::test]
async fn persistence_panic_is_aborted_error() {
    let result = start_with(&loopback_config(), WorkerPool::current(), async {
        if true {
            panic!("factory construction blew up");
        }
        Ok::<_, PersistenceError>(memory_factory())
    })
    .await;

    assert!(matches!(
        result,
        Err(StartupError::Aborted {
            subsystem: catalog_server::Subsystem::Persistence,
            ..
        })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_products_after_startup() {
    let ready = start_with(&loopback_config(), WorkerPool::current(), async {
        Ok::<_, PersistenceError>(memory_factory())
    })
    .await
    .unwrap();

    let base = format!("http://{}", ready.local_addr());
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(ready.serve(async move {
        let _ = stopped.await;
    }));

    let client = reqwest::Client::new();
    let created: Value = client
        .post(format!("{base}/products"))
        .json(&json!({"name": "Widget", "price": 9.99}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created, json!({"id": 1, "name": "Widget", "price": 9.99}));

    let fetched: Value = client
        .get(format!("{base}/products/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    drop(client);
    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
