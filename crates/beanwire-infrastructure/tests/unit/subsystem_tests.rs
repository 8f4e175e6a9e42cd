//! Subsystem isolation

use beanwire_domain::error::Error;

use crate::fixtures::{
    Cluster, EchoApi, EchoProvider, echo_definition, exposed_echo, quiet_config, subsystem,
    versioned_echo_definition,
};

#[tokio::test]
async fn test_unversioned_service_rejected_across_subsystems() {
    let cluster = Cluster::new();
    let billing = cluster.context("billing");
    billing
        .export_service(&echo_definition(), EchoProvider::partitions("billing", 1), exposed_echo)
        .await
        .expect("export");

    let shipping = cluster.context("shipping");
    shipping.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = shipping.remote::<EchoApi>(None).await.expect("lease");

    let err = handle.current().whoami().await.expect_err("boundary enforced");
    match err {
        Error::IllegalSubsystem {
            consumer_subsystem,
            provider_subsystem,
            ..
        } => {
            assert_eq!(consumer_subsystem, "shipping");
            assert_eq!(provider_subsystem, "billing");
        }
        other => panic!("expected IllegalSubsystem, got {other:?}"),
    }
}

#[tokio::test]
async fn test_versioned_service_allowed_across_subsystems() {
    let cluster = Cluster::new();
    let billing = cluster.context("billing");
    billing
        .export_service(
            &versioned_echo_definition(1),
            EchoProvider::partitions("billing", 1),
            exposed_echo,
        )
        .await
        .expect("export");

    let shipping = cluster.context("shipping");
    shipping
        .remote_service::<EchoApi>(versioned_echo_definition(1))
        .expect("declare");
    let handle = shipping.remote::<EchoApi>(None).await.expect("lease");
    assert_eq!(handle.current().whoami().await.expect("call"), "billing#0");
}

#[tokio::test]
async fn test_same_subsystem_allowed() {
    let cluster = Cluster::new();
    let provider = cluster.context("billing");
    provider
        .export_service(&echo_definition(), EchoProvider::partitions("billing", 1), exposed_echo)
        .await
        .expect("export");

    let consumer = cluster.context("billing");
    consumer.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = consumer.remote::<EchoApi>(None).await.expect("lease");
    assert_eq!(handle.current().whoami().await.expect("call"), "billing#0");
}

#[tokio::test]
async fn test_disabled_enforcement_allows_any_subsystem() {
    let cluster = Cluster::new();
    let billing = cluster.context("billing");
    billing
        .export_service(&echo_definition(), EchoProvider::partitions("billing", 1), exposed_echo)
        .await
        .expect("export");

    let mut config = quiet_config("shipping");
    config.subsystem = subsystem("shipping");
    config.subsystem.enforce_boundaries = false;
    let shipping = cluster.context_with(config);
    shipping.remote_service::<EchoApi>(echo_definition()).expect("declare");
    let handle = shipping.remote::<EchoApi>(None).await.expect("lease");
    assert_eq!(handle.current().whoami().await.expect("call"), "billing#0");
}
