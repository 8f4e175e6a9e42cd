//! Direct transport tests: routing, broadcast, endpoint lifecycle, timeouts

use std::sync::Arc;
use std::time::Duration;

use beanwire_application::ports::TransportComponent;
use beanwire_domain::error::Error;
use beanwire_domain::{RoutingKey, ServiceProperties};
use beanwire_infrastructure::ApplicationContext;
use beanwire_infrastructure::constants::{PROPERTY_DIRECT_ENDPOINT, PROPERTY_DIRECT_PARTITIONS};
use beanwire_infrastructure::transport::DirectTransportComponent;
use serde_json::json;

use crate::fixtures::{Cluster, EchoApi, EchoProvider, echo_definition, exposed_echo, quiet_config};

#[tokio::test]
async fn test_export_publishes_endpoint_properties() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    let properties = provider
        .export_service(&echo_definition(), EchoProvider::partitions("p", 3), exposed_echo)
        .await
        .expect("export");

    assert_eq!(properties.component, "direct");
    assert_eq!(properties.property(PROPERTY_DIRECT_PARTITIONS), Some("3"));
    assert!(properties.property(PROPERTY_DIRECT_ENDPOINT).is_some());
    assert_eq!(cluster.direct.endpoint_count(), 1);
}

#[tokio::test]
async fn test_routed_calls_reach_the_key_partition() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("p", 3), exposed_echo)
        .await
        .expect("export");

    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let echo = consumer.remote::<EchoApi>(None).await.expect("lease").current();

    for account in [1_u64, 7, 42, 1_000_003] {
        let expected = RoutingKey::from_value(&json!(account)).partition(3);
        assert_eq!(echo.owner(account).await.expect("call"), expected);
        assert_eq!(echo.owner(account).await.expect("repeat"), expected);
    }
    assert_eq!(echo.whoami().await.expect("unrouted"), "p#0");
}

#[tokio::test]
async fn test_broadcast_reaches_every_partition_in_order() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("p", 3), exposed_echo)
        .await
        .expect("export");

    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let echo = consumer.remote::<EchoApi>(None).await.expect("lease").current();

    assert_eq!(
        echo.collect("item".to_string()).await.expect("broadcast"),
        vec!["item-0", "item-1", "item-2"]
    );
}

#[tokio::test]
async fn test_unexported_endpoint_reports_service_unavailable() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    let properties = provider
        .export_service(&echo_definition(), EchoProvider::partitions("p", 1), exposed_echo)
        .await
        .expect("export");

    let consumer = cluster.context("default");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let echo = consumer.remote::<EchoApi>(None).await.expect("lease").current();
    assert!(echo.whoami().await.is_ok());

    cluster.direct.unexport(&properties).expect("unexport");
    let err = echo.whoami().await.expect_err("endpoint gone");
    assert!(matches!(err, Error::ServiceUnavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn test_connect_requires_endpoint_property() {
    let direct = DirectTransportComponent::new();
    let err = direct
        .connect("test.Echo", &ServiceProperties::new("direct"))
        .err()
        .expect("missing endpoint");
    assert!(matches!(err, Error::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn test_export_without_partitions_is_rejected() {
    let direct = DirectTransportComponent::new();
    let err = direct.export("test.Echo", Vec::new()).expect_err("no partitions");
    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
}

#[tokio::test]
async fn test_slow_provider_times_out_as_service_unavailable() {
    let direct: Arc<dyn TransportComponent> =
        Arc::new(DirectTransportComponent::new().with_timeout(Duration::from_millis(20)));
    let context = ApplicationContext::builder(quiet_config("default"))
        .with_component(direct)
        .build()
        .expect("context");
    context
        .export_service(&echo_definition(), EchoProvider::partitions("slow", 1), exposed_echo)
        .await
        .expect("export");
    context.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let echo = context.remote::<EchoApi>(None).await.expect("lease").current();

    assert!(echo.wait(1).await.is_ok());
    let err = echo.wait(500).await.expect_err("too slow");
    assert!(matches!(err, Error::ServiceUnavailable { .. }), "{err:?}");
}

#[tokio::test]
async fn test_broadcast_partition_timeout_is_service_unavailable() {
    let direct: Arc<dyn TransportComponent> =
        Arc::new(DirectTransportComponent::new().with_timeout(Duration::from_millis(50)));
    let context = ApplicationContext::builder(quiet_config("default"))
        .with_component(direct)
        .build()
        .expect("context");
    let partitions = EchoProvider::lagging("p", 3, Some((1, Duration::from_millis(500))));
    context
        .export_service(&echo_definition(), partitions, exposed_echo)
        .await
        .expect("export");
    context.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let echo = context.remote::<EchoApi>(None).await.expect("lease").current();

    let err = echo.collect("x".to_string()).await.expect_err("partition 1 too slow");
    assert!(
        matches!(&err, Error::ServiceUnavailable { service, .. } if service == "test.Echo"),
        "{err:?}"
    );
}
