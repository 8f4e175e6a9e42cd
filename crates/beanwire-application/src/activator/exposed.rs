//! Exposed api tables
//!
//! An [`ExposedApi`] lists the methods of one api together with the handler
//! that calls the provider bean. Handlers receive the provider and the
//! request's [`Arguments`] and return any serializable value.

use std::future::Future;
use std::sync::Arc;

use beanwire_domain::Payload;
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::{ObjectSerializer, ObjectSerializerExt};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::remoting::MethodDescriptor;

/// Handler bound to a provider instance
pub(crate) type BoundHandler =
    Arc<dyn Fn(Arguments) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

type UnboundHandler<S> =
    Arc<dyn Fn(Arc<S>, Arguments) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Decoded view of a request's arguments
pub struct Arguments {
    payloads: Vec<Payload>,
    parameter_types: &'static [&'static str],
    serializer: Arc<dyn ObjectSerializer>,
    version: u32,
}

impl Arguments {
    pub(crate) fn new(
        payloads: Vec<Payload>,
        parameter_types: &'static [&'static str],
        serializer: Arc<dyn ObjectSerializer>,
        version: u32,
    ) -> Result<Self> {
        if payloads.len() != parameter_types.len() {
            return Err(Error::serialization(format!(
                "Expected {} arguments, got {}",
                parameter_types.len(),
                payloads.len()
            )));
        }
        Ok(Self {
            payloads,
            parameter_types,
            serializer,
            version,
        })
    }

    /// Decode the argument at `index`
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let (payload, type_name) = self
            .payloads
            .get(index)
            .zip(self.parameter_types.get(index))
            .ok_or_else(|| Error::serialization(format!("No argument at index {index}")))?;
        self.serializer.decode(payload, type_name, self.version)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Whether the method takes no arguments
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Api version the caller speaks
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("parameter_types", &self.parameter_types)
            .field("version", &self.version)
            .finish()
    }
}

/// Method table of one api implemented by a provider of type `S`
pub struct ExposedApi<S: ?Sized> {
    api: String,
    methods: Vec<(MethodDescriptor, UnboundHandler<S>)>,
}

impl<S: ?Sized + Send + Sync + 'static> ExposedApi<S> {
    /// Empty table for `api`
    pub fn new(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            methods: Vec::new(),
        }
    }

    /// Add a method
    pub fn method<F, Fut, R>(mut self, descriptor: MethodDescriptor, handler: F) -> Self
    where
        F: Fn(Arc<S>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Serialize,
    {
        let handler: UnboundHandler<S> = Arc::new(move |provider, args| {
            let call = handler(provider, args);
            async move {
                let value = call.await?;
                serde_json::to_value(&value).map_err(Error::from)
            }
            .boxed()
        });
        self.methods.push((descriptor, handler));
        self
    }

    /// Api name
    pub fn api(&self) -> &str {
        &self.api
    }

    /// Declared methods
    pub fn descriptors(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter().map(|(descriptor, _)| descriptor)
    }

    pub(crate) fn bind(self, provider: Arc<S>) -> (String, Vec<(MethodDescriptor, BoundHandler)>) {
        let methods = self
            .methods
            .into_iter()
            .map(|(descriptor, handler)| {
                let provider = Arc::clone(&provider);
                let bound: BoundHandler =
                    Arc::new(move |args| handler(Arc::clone(&provider), args));
                (descriptor, bound)
            })
            .collect();
        (self.api, methods)
    }
}
