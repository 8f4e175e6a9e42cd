//! Remoting Proxy
//!
//! Client-side dispatch. A client adapter calls one of the proxy's methods
//! with the [`MethodDescriptor`] of the method being invoked; the proxy
//! serializes the arguments for the bound api version, selects routing and
//! turns the response back into a value or an error.
//!
//! | Descriptor routing | Proxy call | Transport call |
//! |--------------------|------------|----------------|
//! | `Any` | `invoke` / `invoke_void` | `submit_routed(req, None)` |
//! | `Argument(i)` | `invoke` / `invoke_void` | `submit_routed(req, Some(key(arg i)))` |
//! | `Broadcast` | `broadcast` | `submit_broadcast(req)` + reducer |

use std::sync::Arc;

use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::{Admission, FaultTolerance, ObjectSerializer, Transport};
use beanwire_domain::{InvocationRequest, Payload, RemoteResult, RoutingKey};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use super::method::{MethodDescriptor, Routing};
use super::reducer::Reducer;
use super::rejecting::{PlainSerializer, RejectingTransport};
use crate::reactive::Reactive;

/// Arguments of one outgoing call, in parameter order
///
/// A value that fails to serialize is reported when the call is made.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    values: Vec<Value>,
    error: Option<Error>,
}

impl CallArgs {
    /// No arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.values.push(value),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(Error::serialization_with_source(
                        format!("Failed to encode argument {}", self.values.len()),
                        e,
                    ));
                }
            }
        }
        self
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn into_values(self) -> Result<Vec<Value>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.values),
        }
    }
}

/// Client-side dispatcher bound to one provider of one api
#[derive(Clone)]
pub struct RemotingProxy {
    inner: Arc<ProxyInner>,
}

struct ProxyInner {
    api: String,
    version: u32,
    serializer: Arc<dyn ObjectSerializer>,
    transport: Arc<dyn Transport>,
    fault_tolerance: Option<Arc<dyn FaultTolerance>>,
}

impl RemotingProxy {
    /// Proxy over a connected transport
    pub fn new(
        api: impl Into<String>,
        version: u32,
        serializer: Arc<dyn ObjectSerializer>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                api: api.into(),
                version,
                serializer,
                transport,
                fault_tolerance: None,
            }),
        }
    }

    /// Proxy whose every call fails with `error`
    ///
    /// Used for stand-ins when no provider is available or the provider
    /// belongs to another subsystem.
    pub fn rejecting(api: impl Into<String>, version: u32, error: Error) -> Self {
        Self::new(
            api,
            version,
            Arc::new(PlainSerializer),
            Arc::new(RejectingTransport::new(error)),
        )
    }

    /// Guard every call with admission control
    pub fn with_fault_tolerance(self, fault_tolerance: Arc<dyn FaultTolerance>) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(ProxyInner {
                api: inner.api.clone(),
                version: inner.version,
                serializer: Arc::clone(&inner.serializer),
                transport: Arc::clone(&inner.transport),
                fault_tolerance: Some(fault_tolerance),
            }),
        }
    }

    /// Api this proxy calls
    pub fn api(&self) -> &str {
        &self.inner.api
    }

    /// Api version sent with every request
    pub fn version(&self) -> u32 {
        self.inner.version
    }

    /// Invoke a method and decode its result
    pub async fn invoke<R>(&self, method: &MethodDescriptor, args: CallArgs) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let body = self.call(method, args).await?;
        self.decode(method, body)
    }

    /// Invoke a void method
    pub async fn invoke_void(&self, method: &MethodDescriptor, args: CallArgs) -> Result<()> {
        self.call(method, args).await.map(|_| ())
    }

    /// Invoke a method on every partition and fold the results
    pub async fn broadcast<T, R>(
        &self,
        method: &MethodDescriptor,
        args: CallArgs,
        reducer: &dyn Reducer<T, R>,
    ) -> Result<R>
    where
        T: DeserializeOwned,
    {
        let request = self.request(method, args)?.0;
        let _admission = self.admit().await?;
        debug!(api = %self.inner.api, method = method.name(), "Broadcasting call");

        let responses = self
            .inner
            .transport
            .submit_broadcast(request)
            .await
            .map_err(|e| self.unavailable(e))?;

        let results = responses
            .into_iter()
            .map(|response| {
                response
                    .map_err(|e| self.unavailable(e))
                    .and_then(|r| r.into_result())
                    .and_then(|body| self.decode::<T>(method, body))
            })
            .collect::<Vec<RemoteResult<T>>>();
        reducer.reduce(results)
    }

    /// Invoke a method without waiting; the outcome is pushed to subscribers
    pub fn submit<R>(&self, method: &MethodDescriptor, args: CallArgs) -> Reactive<R>
    where
        R: DeserializeOwned + Clone + Send + 'static,
    {
        let proxy = self.clone();
        let method = *method;
        Reactive::from_future(async move { proxy.invoke::<R>(&method, args).await })
    }

    /// Broadcast without waiting; the reduced outcome is pushed to subscribers
    pub fn submit_broadcast<T, R>(
        &self,
        method: &MethodDescriptor,
        args: CallArgs,
        reducer: Arc<dyn Reducer<T, R>>,
    ) -> Reactive<R>
    where
        T: DeserializeOwned + Send + 'static,
        R: Clone + Send + 'static,
    {
        let proxy = self.clone();
        let method = *method;
        Reactive::from_future(async move {
            proxy.broadcast(&method, args, reducer.as_ref()).await
        })
    }

    async fn call(&self, method: &MethodDescriptor, args: CallArgs) -> Result<Option<Payload>> {
        if method.is_broadcast() {
            return Err(Error::configuration(format!(
                "{}#{} is a broadcast method and needs a reducer",
                self.inner.api,
                method.signature()
            )));
        }
        let (request, routing_key) = self.request(method, args)?;
        let _admission = self.admit().await?;
        trace!(api = %self.inner.api, method = method.name(), ?routing_key, "Submitting call");

        let response = self
            .inner
            .transport
            .submit_routed(request, routing_key)
            .await
            .map_err(|e| self.unavailable(e))?;
        response.into_result()
    }

    fn request(
        &self,
        method: &MethodDescriptor,
        args: CallArgs,
    ) -> Result<(InvocationRequest, Option<RoutingKey>)> {
        let values = args.into_values()?;
        let parameter_types = method.parameter_types();
        if values.len() != parameter_types.len() {
            return Err(Error::serialization(format!(
                "{}#{} takes {} arguments, got {}",
                self.inner.api,
                method.signature(),
                parameter_types.len(),
                values.len()
            )));
        }

        let routing_key = match method.routing() {
            Routing::Argument(index) => {
                let value = values.get(index).ok_or_else(|| {
                    Error::configuration(format!(
                        "{}#{} routes by argument {index}, which does not exist",
                        self.inner.api,
                        method.signature()
                    ))
                })?;
                Some(RoutingKey::from_value(value))
            }
            Routing::Any | Routing::Broadcast => None,
        };

        let arguments = values
            .iter()
            .zip(parameter_types)
            .map(|(value, type_name)| {
                self.inner
                    .serializer
                    .serialize(value, type_name, self.inner.version)
            })
            .collect::<Result<Vec<_>>>()?;

        let request = InvocationRequest::new(&self.inner.api, &method.signature(), self.inner.version)
            .with_arguments(arguments);
        Ok((request, routing_key))
    }

    fn decode<R: DeserializeOwned>(&self, method: &MethodDescriptor, body: Option<Payload>) -> Result<R> {
        let value = match (body, method.return_type()) {
            (Some(payload), Some(type_name)) => {
                self.inner
                    .serializer
                    .deserialize(&payload, type_name, self.inner.version)?
            }
            _ => Value::Null,
        };
        serde_json::from_value(value).map_err(|e| {
            Error::serialization_with_source(
                format!(
                    "Failed to decode result of {}#{}",
                    self.inner.api,
                    method.signature()
                ),
                e,
            )
        })
    }

    fn unavailable(&self, err: Error) -> Error {
        if err.is_transport_failure() {
            debug!(api = %self.inner.api, error = %err, "Transport failure");
        }
        err.into_service_unavailable(&self.inner.api)
    }

    async fn admit(&self) -> Result<Option<Admission>> {
        match &self.inner.fault_tolerance {
            Some(ft) => ft.admit(&self.inner.api).await.map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for RemotingProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemotingProxy")
            .field("api", &self.inner.api)
            .field("version", &self.inner.version)
            .field("serializer", &self.inner.serializer.name())
            .field("partitions", &self.inner.transport.partition_count())
            .finish()
    }
}
