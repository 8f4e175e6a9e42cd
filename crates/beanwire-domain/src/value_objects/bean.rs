//! Bean identity

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a bean by type and optional qualifier
///
/// Equality and hashing use the type id and the qualifier; the type name is
/// kept for diagnostics only.
///
/// # Example
///
/// ```
/// use beanwire_domain::BeanKey;
///
/// let plain = BeanKey::of::<String>();
/// let named = BeanKey::qualified::<String>("greeting");
/// assert_ne!(plain, named);
/// assert_eq!(named.qualifier(), Some("greeting"));
/// ```
#[derive(Clone)]
pub struct BeanKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<String>,
}

impl BeanKey {
    /// Unqualified key for type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    /// Qualified key for type `T`
    pub fn qualified<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self::of::<T>().with_qualifier(qualifier)
    }

    /// Same type, different qualifier
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Type id of the bean
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the bean
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Qualifier, if any
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Whether the key carries a qualifier
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Whether the key names type `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for BeanKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for BeanKey {}

impl Hash for BeanKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for BeanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}[{}]", self.type_name, qualifier),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for BeanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanKey")
            .field("type", &self.type_name)
            .field("qualifier", &self.qualifier)
            .finish()
    }
}
