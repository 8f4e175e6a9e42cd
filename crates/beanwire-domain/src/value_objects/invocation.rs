//! Wire messages
//!
//! The header and field names are part of the wire contract and must not
//! change between releases.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{HEADER_API_VERSION, HEADER_SERVICE_API, HEADER_SERVICE_METHOD_SIGNATURE};
use crate::error::{Error, Result};

/// Serialized argument or result
pub type Payload = Vec<u8>;

/// Method name plus ordered parameter type names
///
/// The canonical form is `name(Type1,Type2)` and is what both sides of a
/// call use to find a method, so overloads stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    name: String,
    parameter_types: Vec<String>,
}

impl MethodSignature {
    /// Create a signature
    pub fn new<I, S>(name: impl Into<String>, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type names in declaration order
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Canonical string form
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameter_types.join(","))
    }
}

/// Request sent for every remote method call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// String-keyed headers
    pub headers: BTreeMap<String, String>,
    /// Serialized arguments in parameter order
    pub arguments: Vec<Payload>,
}

impl InvocationRequest {
    /// Create a request carrying the three routing headers
    pub fn new(service_api: &str, signature: &MethodSignature, api_version: u32) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(HEADER_SERVICE_API.to_string(), service_api.to_string());
        headers.insert(
            HEADER_SERVICE_METHOD_SIGNATURE.to_string(),
            signature.canonical(),
        );
        headers.insert(HEADER_API_VERSION.to_string(), api_version.to_string());
        Self {
            headers,
            arguments: Vec::new(),
        }
    }

    /// Set the serialized arguments
    pub fn with_arguments(mut self, arguments: Vec<Payload>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The `serviceApi` header
    pub fn service_api(&self) -> Result<&str> {
        self.required_header(HEADER_SERVICE_API)
    }

    /// The `serviceMethodSignature` header
    pub fn method_signature(&self) -> Result<&str> {
        self.required_header(HEADER_SERVICE_METHOD_SIGNATURE)
    }

    /// The `apiVersion` header parsed as an integer
    pub fn api_version(&self) -> Result<u32> {
        let raw = self.required_header(HEADER_API_VERSION)?;
        raw.parse().map_err(|_| {
            Error::serialization(format!("Invalid {HEADER_API_VERSION} header: '{raw}'"))
        })
    }

    fn required_header(&self, name: &str) -> Result<&str> {
        self.header(name)
            .ok_or_else(|| Error::serialization(format!("Missing request header '{name}'")))
    }
}

/// Response to an [`InvocationRequest`]
///
/// Either the body (absent for void methods) or the exception fields are
/// populated, never both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvocationResponse {
    /// Serialized result
    #[serde(rename = "responseBody")]
    pub response_body: Option<Payload>,
    /// Exception message
    #[serde(rename = "exceptionMsg")]
    pub exception_msg: Option<String>,
    /// Fully qualified exception type name
    #[serde(rename = "thrownExceptionType")]
    pub thrown_exception_type: Option<String>,
    /// Correlation id logged on the provider side
    #[serde(rename = "correlationId")]
    pub correlation_id: Option<String>,
}

impl InvocationResponse {
    /// Successful response with a body
    pub fn success(body: Payload) -> Self {
        Self {
            response_body: Some(body),
            ..Self::default()
        }
    }

    /// Successful response of a void method
    pub fn void() -> Self {
        Self::default()
    }

    /// Failed response
    pub fn failure(
        exception_type: impl Into<String>,
        message: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            response_body: None,
            exception_msg: Some(message.into()),
            thrown_exception_type: Some(exception_type.into()),
            correlation_id: Some(correlation_id.into()),
        }
    }

    /// Whether the callee reported an exception
    pub fn is_failure(&self) -> bool {
        self.thrown_exception_type.is_some()
    }

    /// Body on success, the remote exception as [`Error::RemoteService`] otherwise
    pub fn into_result(self) -> Result<Option<Payload>> {
        match self.thrown_exception_type {
            Some(exception_type) => Err(Error::remote_service(
                exception_type,
                self.exception_msg.unwrap_or_default(),
                self.correlation_id,
            )),
            None => Ok(self.response_body),
        }
    }
}
