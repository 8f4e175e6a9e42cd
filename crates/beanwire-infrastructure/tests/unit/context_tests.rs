//! Application context wiring: bean declarations, exports, version
//! negotiation and shutdown

use std::sync::Arc;

use beanwire_domain::error::Error;
use beanwire_domain::{BeanKey, ServiceDefinition};
use beanwire_infrastructure::config::AppConfig;
use beanwire_infrastructure::serializer::JsonSerializer;
use beanwire_infrastructure::{ApplicationContext, ServiceRegistryClient, init_context, service_key};
use serde_json::json;

use crate::fixtures::{
    Cluster, EchoApi, EchoProvider, Greeting, echo_definition, exposed_echo, quiet_config,
    versioned_echo_definition,
};

/// Version 2 of the api added an optional `locale` to `Greeting`
fn v2_serializer() -> Arc<JsonSerializer> {
    Arc::new(
        JsonSerializer::new(2)
            .with_upgrade("Greeting", 1, |mut value| {
                if value.get("locale").is_none() {
                    value["locale"] = json!("en");
                }
                Ok(value)
            })
            .with_downgrade("Greeting", 1, |mut value| {
                if let Some(object) = value.as_object_mut() {
                    object.remove("locale");
                }
                Ok(value)
            }),
    )
}

#[tokio::test]
async fn test_context_exposes_infrastructure_beans() {
    let context = init_context(quiet_config("billing")).expect("context");
    let config: Arc<AppConfig> = context.factory().get_bean().await.expect("config bean");
    assert_eq!(config.subsystem.name, "billing");
    let registry: ServiceRegistryClient = context.factory().get_bean().await.expect("registry bean");
    assert_eq!(registry.backend_name(), "memory");
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = AppConfig::default();
    config.registry.retry_interval_ms = config.registry.export_interval_ms + 1;
    let err = init_context(config).expect_err("invalid");
    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
}

#[tokio::test]
async fn test_remote_service_requires_matching_bean_key() {
    let context = init_context(quiet_config("default")).expect("context");
    let definition = ServiceDefinition::new(BeanKey::of::<String>(), "test.Echo", "direct");
    let err = context
        .remote_service::<EchoApi>(definition)
        .expect_err("wrong key");
    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
}

#[tokio::test]
async fn test_undeclared_remote_service_is_missing_bean() {
    let context = init_context(quiet_config("default")).expect("context");
    let err = context.remote::<EchoApi>(None).await.err().expect("not declared");
    assert!(matches!(err, Error::MissingBeanProvider { .. }), "{err:?}");
}

#[tokio::test]
async fn test_export_rejects_mismatched_table() {
    let context = init_context(quiet_config("default")).expect("context");
    let mut definition = echo_definition();
    definition.api = "test.Other".to_string();
    let err = context
        .export_service(&definition, EchoProvider::partitions("p", 1), exposed_echo)
        .await
        .expect_err("api mismatch");
    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
}

#[tokio::test]
async fn test_export_rejects_unknown_component() {
    let context = init_context(quiet_config("default")).expect("context");
    let mut definition = echo_definition();
    definition.transport_component = "carrier-pigeon".to_string();
    let err = context
        .export_service(&definition, EchoProvider::partitions("p", 1), exposed_echo)
        .await
        .expect_err("unknown component");
    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
}

#[tokio::test]
async fn test_qualified_providers_are_resolved_independently() {
    let cluster = Cluster::new();
    let provider = cluster.context("default");
    for region in ["eu", "us"] {
        let definition = ServiceDefinition::new(
            service_key::<EchoApi>(Some(region)),
            "test.Echo",
            "direct",
        )
        .dynamic_qualified();
        let properties = provider
            .export_service(&definition, EchoProvider::partitions(region, 1), exposed_echo)
            .await
            .expect("export");
        assert_eq!(properties.qualifier.as_deref(), Some(region));
    }

    let consumer = cluster.context("default");
    for region in ["eu", "us"] {
        let definition = ServiceDefinition::new(
            service_key::<EchoApi>(Some(region)),
            "test.Echo",
            "direct",
        )
        .dynamic_qualified();
        consumer.remote_service::<EchoApi>(definition).expect("declare");
    }

    let eu = consumer.remote::<EchoApi>(Some("eu")).await.expect("eu");
    let us = consumer.remote::<EchoApi>(Some("us")).await.expect("us");
    assert_eq!(eu.current().whoami().await.expect("call"), "eu#0");
    assert_eq!(us.current().whoami().await.expect("call"), "us#0");
}

#[tokio::test]
async fn test_old_client_calls_new_server() {
    let cluster = Cluster::new();
    let server = cluster
        .builder(quiet_config("default"))
        .with_serializer(2, v2_serializer())
        .build()
        .expect("server");
    let properties = server
        .export_service(&versioned_echo_definition(2), EchoProvider::partitions("v2", 1), exposed_echo)
        .await
        .expect("export");
    assert_eq!(properties.api_version(), Some(2));

    let client = cluster.context("default");
    client
        .remote_service::<EchoApi>(versioned_echo_definition(1))
        .expect("declare");
    let echo = client.remote::<EchoApi>(None).await.expect("lease").current();

    let reply = echo.greet(Greeting::new("bob")).await.expect("call");
    assert_eq!(reply.text, "hello bob [en]");
    assert_eq!(reply.locale, None);
}

#[tokio::test]
async fn test_new_client_calls_old_server() {
    let cluster = Cluster::new();
    let server = cluster.context("default");
    server
        .export_service(&versioned_echo_definition(1), EchoProvider::partitions("v1", 1), exposed_echo)
        .await
        .expect("export");

    let client = cluster
        .builder(quiet_config("default"))
        .with_serializer(2, v2_serializer())
        .build()
        .expect("client");
    client
        .remote_service::<EchoApi>(versioned_echo_definition(2))
        .expect("declare");
    let echo = client.remote::<EchoApi>(None).await.expect("lease").current();

    let greeting = Greeting {
        text: "ana".to_string(),
        locale: Some("pt".to_string()),
    };
    let reply = echo.greet(greeting).await.expect("call");
    assert_eq!(reply.text, "hello ana [-]");
    assert_eq!(reply.locale.as_deref(), Some("en"));
}

#[tokio::test]
async fn test_shutdown_deregisters_and_unexports() {
    let cluster = Cluster::new();
    let provider: ApplicationContext = cluster.context("default");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("p", 2), exposed_echo)
        .await
        .expect("export");
    assert!(provider.exporter().is_running());
    assert_eq!(cluster.direct.endpoint_count(), 1);

    let registry = provider.registry().clone();
    assert!(registry.lookup("test.Echo", None).await.expect("lookup").is_some());

    provider.shutdown().await;
    assert!(!provider.exporter().is_running());
    assert_eq!(registry.lookup("test.Echo", None).await.expect("lookup"), None);
    assert_eq!(cluster.direct.endpoint_count(), 0);

    provider.shutdown().await;
}
