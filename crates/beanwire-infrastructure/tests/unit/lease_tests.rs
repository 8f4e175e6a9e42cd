//! Lease manager tests: hot swap, stand-ins, registry outages and the
//! background renewal loop

use std::sync::Arc;
use std::time::Duration;

use beanwire_domain::error::Error;
use beanwire_infrastructure::LeasedService;
use beanwire_infrastructure::config::AppConfig;

use crate::fixtures::{Cluster, Echo, EchoApi, EchoProvider, echo_definition, exposed_echo, quiet_config};

/// Configuration renewing leases every 20ms
fn fast_renewal_config() -> AppConfig {
    let mut config = quiet_config("default");
    config.lease.renew_interval_ms = 20;
    config
}

async fn wait_for_generation(handle: &LeasedService<dyn Echo>, generation: u64) -> bool {
    for _ in 0..100 {
        if handle.generation() >= generation {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_leased_handle_follows_provider_swap() {
    let cluster = Cluster::new();
    let first = cluster.context("default");
    first
        .export_service(&echo_definition(), EchoProvider::partitions("p1", 1), exposed_echo)
        .await
        .expect("export p1");

    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");
    assert_eq!(handle.current().whoami().await.expect("call"), "p1#0");
    assert_eq!(handle.generation(), 0);

    let second = cluster.context("default");
    second
        .export_service(&echo_definition(), EchoProvider::partitions("p2", 1), exposed_echo)
        .await
        .expect("export p2");

    let report = consumer.lease_manager().renew_all().await;
    assert_eq!(report.rebound, 1);
    assert_eq!(report.failed, 0);

    let again = consumer.remote::<EchoApi>(None).await.expect("cached bean");
    assert!(Arc::ptr_eq(&handle, &again));
    assert_eq!(handle.current().whoami().await.expect("call"), "p2#0");
    assert_eq!(handle.generation(), 1);
}

#[tokio::test]
async fn test_unchanged_properties_keep_provider() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("p1", 1), exposed_echo)
        .await
        .expect("export");

    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");
    let before = handle.current();

    let report = consumer.lease_manager().renew_all().await;
    assert_eq!(report.unchanged, 1);
    assert!(Arc::ptr_eq(&before, &handle.current()));
}

#[tokio::test]
async fn test_missing_provider_binds_stand_in_until_registered() {
    let cluster = Cluster::new();
    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease never fails");

    let err = handle.current().whoami().await.expect_err("stand-in");
    assert!(matches!(err, Error::ServiceUnavailable { .. }), "{err:?}");
    assert!(handle.properties().is_none());

    let provider = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("late", 1), exposed_echo)
        .await
        .expect("export");
    consumer.lease_manager().renew_all().await;

    assert_eq!(handle.current().whoami().await.expect("call"), "late#0");
}

#[tokio::test]
async fn test_deregistered_provider_is_replaced_by_stand_in() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("p1", 1), exposed_echo)
        .await
        .expect("export");

    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");
    assert!(handle.current().whoami().await.is_ok());

    provider.shutdown().await;
    let report = consumer.lease_manager().renew_all().await;
    assert_eq!(report.rebound, 1);

    let err = handle.current().whoami().await.expect_err("provider gone");
    assert!(matches!(err, Error::ServiceUnavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn test_registry_outage_keeps_current_provider() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("p1", 1), exposed_echo)
        .await
        .expect("export");

    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");

    cluster.registry.fail(true);
    let report = consumer.lease_manager().renew_all().await;
    assert_eq!(report.failed, 1);
    assert_eq!(handle.current().whoami().await.expect("still bound"), "p1#0");
    assert_eq!(handle.generation(), 0);
}

#[tokio::test]
async fn test_registry_outage_at_startup_recovers() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("p1", 1), exposed_echo)
        .await
        .expect("export");

    cluster.registry.fail(true);
    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease never fails");
    let err = handle.current().whoami().await.expect_err("stand-in");
    assert!(matches!(err, Error::ServiceUnavailable { .. }), "{err:?}");

    cluster.registry.fail(false);
    let report = consumer.lease_manager().renew_all().await;
    assert_eq!(report.rebound, 1);
    assert_eq!(handle.current().whoami().await.expect("recovered"), "p1#0");
}

#[tokio::test]
async fn test_shutdown_stops_renewal_loop() {
    let cluster = Cluster::new();
    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");
    assert!(consumer.lease_manager().is_running());
    assert_eq!(consumer.lease_manager().leased_apis(), vec!["test.Echo".to_string()]);

    consumer.shutdown().await;
    assert!(!consumer.lease_manager().is_running());
    assert!(consumer.factory().is_destroyed());
    assert_eq!(consumer.lease_manager().lease_count(), 0);
    assert_eq!(Arc::strong_count(&handle), 1);
}

#[tokio::test]
async fn test_renewal_loop_swaps_provider_on_its_own() {
    let cluster = Cluster::new();
    let first = cluster.context("default");
    first
        .export_service(&echo_definition(), EchoProvider::partitions("p1", 1), exposed_echo)
        .await
        .expect("export p1");

    let consumer = cluster.context_with(fast_renewal_config());
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");
    assert_eq!(handle.current().whoami().await.expect("call"), "p1#0");

    let second = cluster.context("default");
    second
        .export_service(&echo_definition(), EchoProvider::partitions("p2", 1), exposed_echo)
        .await
        .expect("export p2");

    assert!(wait_for_generation(&handle, 1).await, "renewal loop never rebound");
    assert_eq!(handle.current().whoami().await.expect("call"), "p2#0");
    let again = consumer.remote::<EchoApi>(None).await.expect("cached bean");
    assert!(Arc::ptr_eq(&handle, &again));

    consumer.shutdown().await;
}

#[tokio::test]
async fn test_renewal_loop_resumes_after_repeated_registry_failures() {
    let cluster = Cluster::new();
    let first = cluster.context("default");
    first
        .export_service(&echo_definition(), EchoProvider::partitions("p1", 1), exposed_echo)
        .await
        .expect("export p1");

    let consumer = cluster.context_with(fast_renewal_config());
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");

    cluster.registry.fail(true);
    let second = cluster.context("default");
    second
        .export_service(&echo_definition(), EchoProvider::partitions("p2", 1), exposed_echo)
        .await
        .expect("export while the registry is down");

    // several renewal passes fail in a row
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(handle.generation(), 0);
    assert_eq!(handle.current().whoami().await.expect("still bound"), "p1#0");

    cluster.registry.fail(false);
    assert_eq!(second.exporter().register_all().await, 0);

    assert!(wait_for_generation(&handle, 1).await, "renewal never resumed");
    assert_eq!(handle.current().whoami().await.expect("call"), "p2#0");
    let again = consumer.remote::<EchoApi>(None).await.expect("cached bean");
    assert!(Arc::ptr_eq(&handle, &again));

    consumer.shutdown().await;
}
