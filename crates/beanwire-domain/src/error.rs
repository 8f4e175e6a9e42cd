//! Error handling types
//!
//! One error enum covers bean construction, dispatch, registry and transport
//! failures. Sources are reference counted so an error can be handed to every
//! subscriber of a reactive result and carried inside broadcast results.

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Shared error source
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync>;

/// Main error type for beanwire
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A bean was requested while it was already being constructed on the same call chain
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency {
        /// Bean keys forming the cycle, first and last entry are the same bean
        chain: Vec<String>,
    },

    /// No factory is registered for the requested bean
    #[error("No provider registered for bean {bean}")]
    MissingBeanProvider {
        /// The bean that was requested
        bean: String,
    },

    /// A factory asked for a dependency that nothing provides
    #[error("Bean {bean} depends on {dependency}, which has no provider")]
    MissingBeanDependency {
        /// The bean under construction
        bean: String,
        /// The dependency it asked for
        dependency: String,
    },

    /// A bean exists under the key but has a different type
    #[error("Bean {bean} is not of type {expected}")]
    BeanType {
        /// The bean key
        bean: String,
        /// The type the caller asked for
        expected: String,
    },

    /// A factory failed for a reason other than a missing dependency
    #[error("Failed to create bean {bean}: {message}")]
    BeanCreation {
        /// The bean under construction
        bean: String,
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<ErrorSource>,
    },

    /// The callee has no published service for the requested api
    #[error("Missing service: {service_api}")]
    MissingService {
        /// Requested service api
        service_api: String,
    },

    /// The published service has no method with the requested signature
    #[error("Missing service method: {service_api}#{signature}")]
    MissingServiceMethod {
        /// Requested service api
        service_api: String,
        /// Canonical method signature
        signature: String,
    },

    /// The remote provider cannot be reached right now
    #[error("Service unavailable: {service}: {message}")]
    ServiceUnavailable {
        /// Service api
        service: String,
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<ErrorSource>,
    },

    /// A consumer tried to use a non-versioned service owned by another subsystem
    #[error(
        "Illegal subsystem: {service} is provided by subsystem '{provider_subsystem}' and cannot be used from '{consumer_subsystem}'"
    )]
    IllegalSubsystem {
        /// Service api
        service: String,
        /// Subsystem of the calling process
        consumer_subsystem: String,
        /// Subsystem of the discovered provider
        provider_subsystem: String,
    },

    /// The remote side reported an exception
    #[error("Remote service error [{exception_type}]: {message} (correlation id: {})", .correlation_id.as_deref().unwrap_or("none"))]
    RemoteService {
        /// Fully qualified type name of the remote failure
        exception_type: String,
        /// Remote failure message
        message: String,
        /// Correlation id logged by the remote side
        correlation_id: Option<String>,
    },

    /// Business failure raised by a service implementation
    #[error("{message}")]
    Business {
        /// Fully qualified type name of the failure
        exception_type: String,
        /// Failure message
        message: String,
        /// Optional source error
        #[source]
        source: Option<ErrorSource>,
    },

    /// Payload (de)serialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error
        message: String,
        /// Optional source error
        #[source]
        source: Option<ErrorSource>,
    },

    /// Registry backend error
    #[error("Registry error: {message}")]
    Registry {
        /// Description of the registry error
        message: String,
        /// Optional source error
        #[source]
        source: Option<ErrorSource>,
    },

    /// Transport-level failure
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport error
        message: String,
        /// Optional source error
        #[source]
        source: Option<ErrorSource>,
    },

    /// Transport-level timeout
    #[error("Timed out: {message}")]
    Timeout {
        /// Description of the timed out operation
        message: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<ErrorSource>,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

// Bean construction errors
impl Error {
    /// Create a circular dependency error from the keys forming the cycle
    pub fn circular_dependency<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CircularDependency {
            chain: chain.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a missing bean provider error
    pub fn missing_bean_provider<S: Into<String>>(bean: S) -> Self {
        Self::MissingBeanProvider { bean: bean.into() }
    }

    /// Create a missing bean dependency error
    pub fn missing_bean_dependency<B: Into<String>, D: Into<String>>(bean: B, dependency: D) -> Self {
        Self::MissingBeanDependency {
            bean: bean.into(),
            dependency: dependency.into(),
        }
    }

    /// Create a bean type mismatch error
    pub fn bean_type<B: Into<String>, E: Into<String>>(bean: B, expected: E) -> Self {
        Self::BeanType {
            bean: bean.into(),
            expected: expected.into(),
        }
    }

    /// Create a bean creation error
    pub fn bean_creation<B: Into<String>, M: Into<String>>(bean: B, message: M) -> Self {
        Self::BeanCreation {
            bean: bean.into(),
            message: message.into(),
            source: None,
        }
    }
}

// Dispatch errors
impl Error {
    /// Create a missing service error
    pub fn missing_service<S: Into<String>>(service_api: S) -> Self {
        Self::MissingService {
            service_api: service_api.into(),
        }
    }

    /// Create a missing service method error
    pub fn missing_service_method<S: Into<String>, M: Into<String>>(
        service_api: S,
        signature: M,
    ) -> Self {
        Self::MissingServiceMethod {
            service_api: service_api.into(),
            signature: signature.into(),
        }
    }

    /// Create a service unavailable error
    pub fn service_unavailable<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ServiceUnavailable {
            service: service.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an illegal subsystem error
    pub fn illegal_subsystem<S, C, P>(service: S, consumer_subsystem: C, provider_subsystem: P) -> Self
    where
        S: Into<String>,
        C: Into<String>,
        P: Into<String>,
    {
        Self::IllegalSubsystem {
            service: service.into(),
            consumer_subsystem: consumer_subsystem.into(),
            provider_subsystem: provider_subsystem.into(),
        }
    }

    /// Create a remote service error as reported by the callee
    pub fn remote_service<T: Into<String>, M: Into<String>>(
        exception_type: T,
        message: M,
        correlation_id: Option<String>,
    ) -> Self {
        Self::RemoteService {
            exception_type: exception_type.into(),
            message: message.into(),
            correlation_id,
        }
    }

    /// Create a business error with an explicit type name
    pub fn business<T: Into<String>, M: Into<String>>(exception_type: T, message: M) -> Self {
        Self::Business {
            exception_type: exception_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a typed failure raised by a service implementation
    ///
    /// The fully qualified name of `E` becomes the reported exception type.
    pub fn business_from<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Business {
            exception_type: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }
}

// Serialization, registry and transport errors
impl Error {
    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create a serialization error with source
    pub fn serialization_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Create a registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::Registry {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Configuration {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl Error {
    /// Whether the caller may retry the operation later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }

    /// Whether the error is a transport failure or timeout
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// Convert transport failures into `ServiceUnavailable` for the given service
    ///
    /// Every other error is returned unchanged.
    pub fn into_service_unavailable(self, service: &str) -> Self {
        match self {
            Self::Transport { message, source } => Self::ServiceUnavailable {
                service: service.to_string(),
                message,
                source,
            },
            Self::Timeout { message } => Self::ServiceUnavailable {
                service: service.to_string(),
                message: format!("timed out: {message}"),
                source: None,
            },
            other => other,
        }
    }

    /// Type name reported on the wire when this error escapes a service method
    pub fn exception_type(&self) -> String {
        let variant = match self {
            Self::Business { exception_type, .. } | Self::RemoteService { exception_type, .. } => {
                return exception_type.clone();
            }
            Self::CircularDependency { .. } => "CircularDependency",
            Self::MissingBeanProvider { .. } => "MissingBeanProvider",
            Self::MissingBeanDependency { .. } => "MissingBeanDependency",
            Self::BeanType { .. } => "BeanType",
            Self::BeanCreation { .. } => "BeanCreation",
            Self::MissingService { .. } => "MissingService",
            Self::MissingServiceMethod { .. } => "MissingServiceMethod",
            Self::ServiceUnavailable { .. } => "ServiceUnavailable",
            Self::IllegalSubsystem { .. } => "IllegalSubsystem",
            Self::Serialization { .. } => "Serialization",
            Self::Registry { .. } => "Registry",
            Self::Transport { .. } => "Transport",
            Self::Timeout { .. } => "Timeout",
            Self::Configuration { .. } => "Configuration",
            Self::Internal { .. } => "Internal",
        };
        format!("{}::{variant}", std::any::type_name::<Self>())
    }

    /// Message reported on the wire; never includes source chains
    pub fn wire_message(&self) -> String {
        match self {
            Self::Business { message, .. } | Self::RemoteService { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_with_source(err.to_string(), err)
    }
}
