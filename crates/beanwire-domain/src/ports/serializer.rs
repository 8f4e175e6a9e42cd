//! Object Serializer Port
//!
//! Serializers work on `serde_json::Value` so the trait stays object safe;
//! typed helpers live in [`ObjectSerializerExt`]. The api version is an
//! explicit parameter of every call.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::value_objects::Payload;

/// Version-aware payload codec
pub trait ObjectSerializer: Send + Sync {
    /// Serializer name, as used in a `SerializationConfig`
    fn name(&self) -> &str;

    /// Serialize a value of the named type for a peer speaking `version`
    fn serialize(&self, value: &Value, type_name: &str, version: u32) -> Result<Payload>;

    /// Deserialize a payload written by a peer speaking `version`
    fn deserialize(&self, payload: &[u8], type_name: &str, version: u32) -> Result<Value>;
}

/// Typed helpers over [`ObjectSerializer`]
pub trait ObjectSerializerExt {
    /// Serialize a typed value
    fn encode<T: Serialize + ?Sized>(&self, value: &T, type_name: &str, version: u32)
    -> Result<Payload>;

    /// Deserialize into a typed value
    fn decode<T: DeserializeOwned>(&self, payload: &[u8], type_name: &str, version: u32)
    -> Result<T>;
}

impl<S: ObjectSerializer + ?Sized> ObjectSerializerExt for S {
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        type_name: &str,
        version: u32,
    ) -> Result<Payload> {
        let value = serde_json::to_value(value).map_err(|e| {
            Error::serialization_with_source(format!("Failed to encode {type_name}"), e)
        })?;
        self.serialize(&value, type_name, version)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        payload: &[u8],
        type_name: &str,
        version: u32,
    ) -> Result<T> {
        let value = self.deserialize(payload, type_name, version)?;
        serde_json::from_value(value).map_err(|e| {
            Error::serialization_with_source(format!("Failed to decode {type_name}"), e)
        })
    }
}
