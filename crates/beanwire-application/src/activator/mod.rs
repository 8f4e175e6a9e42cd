//! Service Activator
//!
//! Server-side dispatch: finds the published service named by the
//! `serviceApi` header, selects the method by its canonical signature,
//! decodes the arguments for the caller's api version and invokes the
//! provider.
//!
//! Every failure is returned as an [`InvocationResponse`] carrying the
//! failure's type name, message and a fresh correlation id; the full error
//! is logged under the same id.

pub mod exposed;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::ObjectSerializer;
use beanwire_domain::{InvocationRequest, InvocationResponse, Payload};
use dashmap::DashMap;
use futures::FutureExt;
use tracing::{debug, error, info};
use uuid::Uuid;

pub use exposed::{Arguments, ExposedApi};

use crate::remoting::MethodDescriptor;
use exposed::BoundHandler;

struct PublishedMethod {
    descriptor: MethodDescriptor,
    handler: BoundHandler,
}

/// One api published by one provider
pub struct PublishedService {
    api: String,
    serializer: Arc<dyn ObjectSerializer>,
    methods: HashMap<String, PublishedMethod>,
}

impl PublishedService {
    /// Api name
    pub fn api(&self) -> &str {
        &self.api
    }

    /// Canonical signatures of all published methods
    pub fn signatures(&self) -> Vec<String> {
        let mut signatures: Vec<String> = self.methods.keys().cloned().collect();
        signatures.sort();
        signatures
    }
}

/// Dispatches invocation requests to published providers
#[derive(Default)]
pub struct ServiceActivator {
    services: DashMap<String, Arc<PublishedService>>,
}

impl ServiceActivator {
    /// Activator with nothing published
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the apis a provider implements
    ///
    /// Republishing an api replaces its previous table.
    pub fn publish<S>(
        &self,
        provider: Arc<S>,
        serializer: Arc<dyn ObjectSerializer>,
        apis: impl IntoIterator<Item = ExposedApi<S>>,
    ) where
        S: ?Sized + Send + Sync + 'static,
    {
        for exposed in apis {
            let (api, methods) = exposed.bind(Arc::clone(&provider));
            let methods = methods
                .into_iter()
                .map(|(descriptor, handler)| {
                    (
                        descriptor.signature().canonical(),
                        PublishedMethod {
                            descriptor,
                            handler,
                        },
                    )
                })
                .collect::<HashMap<_, _>>();
            info!(api = %api, methods = methods.len(), "Published service");
            self.services.insert(
                api.clone(),
                Arc::new(PublishedService {
                    api,
                    serializer: Arc::clone(&serializer),
                    methods,
                }),
            );
        }
    }

    /// Stop serving an api
    pub fn unpublish(&self, api: &str) -> bool {
        self.services.remove(api).is_some()
    }

    /// Whether an api is published
    pub fn is_published(&self, api: &str) -> bool {
        self.services.contains_key(api)
    }

    /// Published service for an api
    pub fn service(&self, api: &str) -> Option<Arc<PublishedService>> {
        self.services.get(api).map(|entry| Arc::clone(entry.value()))
    }

    /// Names of all published apis
    pub fn published_apis(&self) -> Vec<String> {
        let mut apis: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        apis.sort();
        apis
    }

    /// Handle one request
    ///
    /// Never fails: errors are encoded into the response.
    pub async fn invoke_service(&self, request: InvocationRequest) -> InvocationResponse {
        let service_api = request.service_api().unwrap_or("<unknown>").to_string();
        let signature = request.method_signature().unwrap_or("<unknown>").to_string();

        let outcome = AssertUnwindSafe(self.dispatch(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::internal(panic_message(panic.as_ref()))));

        match outcome {
            Ok(Some(body)) => InvocationResponse::success(body),
            Ok(None) => InvocationResponse::void(),
            Err(err) => {
                let correlation_id = Uuid::new_v4().to_string();
                error!(
                    correlation_id = %correlation_id,
                    service = %service_api,
                    method = %signature,
                    error = ?err,
                    "Service invocation failed"
                );
                InvocationResponse::failure(err.exception_type(), err.wire_message(), correlation_id)
            }
        }
    }

    async fn dispatch(&self, request: InvocationRequest) -> Result<Option<Payload>> {
        let api = request.service_api()?;
        let service = self
            .service(api)
            .ok_or_else(|| Error::missing_service(api))?;
        let signature = request.method_signature()?;
        let method = service
            .methods
            .get(signature)
            .ok_or_else(|| Error::missing_service_method(api, signature))?;
        let version = request.api_version()?;
        debug!(api = %api, method = %signature, version, "Dispatching invocation");

        let arguments = Arguments::new(
            request.arguments,
            method.descriptor.parameter_types(),
            Arc::clone(&service.serializer),
            version,
        )?;
        let value = (method.handler)(arguments).await?;

        match method.descriptor.return_type() {
            Some(type_name) => service
                .serializer
                .serialize(&value, type_name, version)
                .map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for ServiceActivator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceActivator")
            .field("apis", &self.published_apis())
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("service panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("service panicked: {message}")
    } else {
        "service panicked".to_string()
    }
}
