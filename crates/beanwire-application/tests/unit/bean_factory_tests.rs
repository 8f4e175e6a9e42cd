//! Tests for bean resolution
//!
//! Covers lazy construction, singleton caching across a diamond graph,
//! cycle detection on direct, indirect and concurrently entered cycles, missing providers and
//! concurrent resolution.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use beanwire_application::bean_factory::{BeanFactory, BeanResolution, FactoryRegistry};
use beanwire_domain::BeanKey;
use beanwire_domain::error::Error;
use futures::FutureExt;

#[derive(Debug)]
struct Leaf;

#[derive(Debug)]
struct Left(Arc<Leaf>);

#[derive(Debug)]
struct Right(Arc<Leaf>);

#[derive(Debug)]
struct Root {
    left: Arc<Left>,
    right: Arc<Right>,
}

fn diamond_registry(leaf_builds: Arc<AtomicUsize>) -> Arc<FactoryRegistry> {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register(move |_r: BeanResolution| {
        let builds = Arc::clone(&leaf_builds);
        async move {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Leaf))
        }
    });
    registry.register(|r: BeanResolution| async move {
        Ok(Arc::new(Left(r.get::<Arc<Leaf>>().await?)))
    });
    registry.register(|r: BeanResolution| async move {
        Ok(Arc::new(Right(r.get::<Arc<Leaf>>().await?)))
    });
    registry.register(|r: BeanResolution| async move {
        Ok(Arc::new(Root {
            left: r.get::<Arc<Left>>().await?,
            right: r.get::<Arc<Right>>().await?,
        }))
    });
    registry
}

#[tokio::test]
async fn test_diamond_builds_shared_dependency_once() {
    let leaf_builds = Arc::new(AtomicUsize::new(0));
    let factory = BeanFactory::new(diamond_registry(Arc::clone(&leaf_builds)));

    let root: Arc<Root> = factory.get_bean().await.unwrap();

    assert_eq!(leaf_builds.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&root.left.0, &root.right.0));
    assert_eq!(factory.instance_count(), 4);
}

#[tokio::test]
async fn test_repeated_lookup_returns_same_instance() {
    let factory = BeanFactory::new(diamond_registry(Arc::new(AtomicUsize::new(0))));

    let first: Arc<Leaf> = factory.get_bean().await.unwrap();
    let second: Arc<Leaf> = factory.get_bean().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_beans_are_built_lazily() {
    let leaf_builds = Arc::new(AtomicUsize::new(0));
    let factory = BeanFactory::new(diamond_registry(Arc::clone(&leaf_builds)));

    assert_eq!(leaf_builds.load(Ordering::SeqCst), 0);
    assert!(!factory.is_instantiated(&BeanKey::of::<Arc<Leaf>>()));

    let _: Arc<Left> = factory.get_bean().await.unwrap();
    assert!(factory.is_instantiated(&BeanKey::of::<Arc<Leaf>>()));
    assert!(!factory.is_instantiated(&BeanKey::of::<Arc<Root>>()));
}

#[derive(Debug, Clone)]
struct SelfRef;

#[tokio::test]
async fn test_direct_cycle_is_detected() {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register(|r: BeanResolution| async move {
        r.get::<SelfRef>().await?;
        Ok(SelfRef)
    });
    let factory = BeanFactory::new(registry);

    let err = factory.get_bean::<SelfRef>().await.unwrap_err();

    match err {
        Error::CircularDependency { chain } => {
            assert_eq!(chain.len(), 2);
            assert_eq!(chain[0], chain[1]);
        }
        other => panic!("expected circular dependency, got {other:?}"),
    }
}

#[derive(Debug, Clone)]
struct A;
#[derive(Debug, Clone)]
struct B;
#[derive(Debug, Clone)]
struct C;

#[tokio::test]
async fn test_indirect_cycle_reports_full_chain() {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register(|r: BeanResolution| async move {
        r.get::<B>().await?;
        Ok(A)
    });
    registry.register(|r: BeanResolution| async move {
        r.get::<C>().await?;
        Ok(B)
    });
    registry.register(|r: BeanResolution| async move {
        r.get::<A>().await?;
        Ok(C)
    });
    let factory = BeanFactory::new(registry);

    let err = factory.get_bean::<A>().await.unwrap_err();

    let Error::CircularDependency { chain } = err else {
        panic!("expected circular dependency");
    };
    let expected: Vec<String> = [
        BeanKey::of::<A>(),
        BeanKey::of::<B>(),
        BeanKey::of::<C>(),
        BeanKey::of::<A>(),
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_eq!(chain, expected);
    assert_eq!(factory.instance_count(), 0);
}

#[tokio::test]
async fn test_unregistered_bean_is_missing_provider() {
    let factory = BeanFactory::new(Arc::new(FactoryRegistry::new()));

    let err = factory.get_bean::<A>().await.unwrap_err();

    assert!(matches!(err, Error::MissingBeanProvider { .. }));
}

#[derive(Debug, Clone)]
struct NeedsB {
    eager: bool,
}

#[tokio::test]
async fn test_missing_dependency_surfaces_only_when_requested() {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register_instance(false);
    registry.register(|r: BeanResolution| async move {
        let eager: bool = r.get().await?;
        if eager {
            r.get::<B>().await?;
        }
        Ok(NeedsB { eager })
    });
    let factory = BeanFactory::new(Arc::clone(&registry));
    let lazy: NeedsB = factory.get_bean().await.unwrap();
    assert!(!lazy.eager);

    let registry = Arc::new(FactoryRegistry::new());
    registry.register_instance(true);
    registry.register(|r: BeanResolution| async move {
        let eager: bool = r.get().await?;
        if eager {
            r.get::<B>().await?;
        }
        Ok(NeedsB { eager })
    });
    let factory = BeanFactory::new(registry);

    let err = factory.get_bean::<NeedsB>().await.unwrap_err();
    match err {
        Error::MissingBeanDependency { bean, dependency } => {
            assert_eq!(bean, BeanKey::of::<NeedsB>().to_string());
            assert_eq!(dependency, BeanKey::of::<B>().to_string());
        }
        other => panic!("expected missing dependency, got {other:?}"),
    }
}

#[tokio::test]
async fn test_qualified_beans_are_distinct() {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register_qualified("eu", |_r: BeanResolution| async { Ok("eu-endpoint".to_string()) });
    registry.register_qualified("us", |_r: BeanResolution| async { Ok("us-endpoint".to_string()) });
    let factory = BeanFactory::new(registry);

    let eu: String = factory.get_qualified_bean("eu").await.unwrap();
    let us: String = factory.get_qualified_bean("us").await.unwrap();

    assert_eq!(eu, "eu-endpoint");
    assert_eq!(us, "us-endpoint");
    assert!(factory.get_bean::<String>().await.is_err());
}

#[tokio::test]
async fn test_wrong_type_is_reported() {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register_provider(
        BeanKey::of::<u64>(),
        Arc::new(WrongTypeProvider),
    );
    let factory = BeanFactory::new(registry);

    let err = factory.get_bean::<u64>().await.unwrap_err();

    assert!(matches!(err, Error::BeanType { .. }));
}

struct WrongTypeProvider;

#[async_trait::async_trait]
impl beanwire_application::bean_factory::BeanProvider for WrongTypeProvider {
    async fn create(
        &self,
        _resolution: BeanResolution,
    ) -> beanwire_domain::Result<beanwire_application::bean_factory::Bean> {
        Ok(Arc::new("not a number"))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_builds_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(FactoryRegistry::new());
    let counter = Arc::clone(&builds);
    registry.register(move |_r: BeanResolution| {
        let counter = Arc::clone(&counter);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Leaf))
        }
    });
    let factory = BeanFactory::new(registry);

    let lookups = (0..16).map(|_| {
        let factory = factory.clone();
        tokio::spawn(async move { factory.get_bean::<Arc<Leaf>>().await })
    });
    let beans = futures::future::join_all(lookups).await;

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    let first = beans[0].as_ref().unwrap().as_ref().unwrap();
    for bean in &beans {
        assert!(Arc::ptr_eq(first, bean.as_ref().unwrap().as_ref().unwrap()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unrelated_chains_do_not_report_cycles() {
    let factory = BeanFactory::new(diamond_registry(Arc::new(AtomicUsize::new(0))));

    let left = {
        let factory = factory.clone();
        tokio::spawn(async move { factory.get_bean::<Arc<Left>>().await })
    };
    let right = {
        let factory = factory.clone();
        tokio::spawn(async move { factory.get_bean::<Arc<Right>>().await })
    };

    assert!(left.await.unwrap().is_ok());
    assert!(right.await.unwrap().is_ok());
}

#[derive(Debug)]
struct Alpha;

#[derive(Debug)]
struct Beta;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cycle_entered_from_both_ends_concurrently_fails() {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register(|r: BeanResolution| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        r.get::<Arc<Beta>>().await?;
        Ok(Arc::new(Alpha))
    });
    registry.register(|r: BeanResolution| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        r.get::<Arc<Alpha>>().await?;
        Ok(Arc::new(Beta))
    });
    let factory = BeanFactory::new(registry);

    let alpha = {
        let factory = factory.clone();
        tokio::spawn(async move { factory.get_bean::<Arc<Alpha>>().await })
    };
    let beta = {
        let factory = factory.clone();
        tokio::spawn(async move { factory.get_bean::<Arc<Beta>>().await })
    };

    let (alpha, beta) = tokio::time::timeout(Duration::from_secs(3), async {
        (alpha.await.unwrap(), beta.await.unwrap())
    })
    .await
    .expect("concurrent resolution of a cycle must not hang");

    assert!(matches!(alpha, Err(Error::CircularDependency { .. })));
    assert!(matches!(beta, Err(Error::CircularDependency { .. })));
    assert!(!factory.is_instantiated(&BeanKey::of::<Arc<Alpha>>()));
    assert!(!factory.is_instantiated(&BeanKey::of::<Arc<Beta>>()));
}

#[tokio::test]
async fn test_shutdown_hooks_run_in_reverse_order() {
    let factory = BeanFactory::new(Arc::new(FactoryRegistry::new()));
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    for name in ["first", "second"] {
        let order = Arc::clone(&order);
        factory.add_shutdown_hook(Box::new(move || async move { order.lock().push(name) }.boxed()));
    }

    factory.destroy().await;

    assert_eq!(*order.lock(), vec!["second", "first"]);
    assert!(factory.is_destroyed());
}
