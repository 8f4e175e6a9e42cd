//! Method descriptors
//!
//! A descriptor is the static description of one exposed method, shared by
//! the client adapter and the server-side registration table. Descriptors are
//! `const` so an api module can declare them next to its trait.
//!
//! ```
//! use beanwire_application::remoting::MethodDescriptor;
//!
//! pub const HELLO: MethodDescriptor =
//!     MethodDescriptor::new("hello", &["Request"]).returns("Response");
//! pub const FIND_ALL: MethodDescriptor =
//!     MethodDescriptor::new("findAll", &["Query"]).returns("List<Item>").broadcast();
//!
//! assert_eq!(HELLO.signature().canonical(), "hello(Request)");
//! ```

use beanwire_domain::MethodSignature;

/// How a call reaches the provider's partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Any single partition may answer
    Any,
    /// The argument at this index selects the partition
    Argument(usize),
    /// Every partition answers and a reducer folds the results
    Broadcast,
}

/// Static description of an exposed method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: &'static str,
    parameter_types: &'static [&'static str],
    return_type: Option<&'static str>,
    routing: Routing,
}

impl MethodDescriptor {
    /// Void method routed to any partition
    pub const fn new(name: &'static str, parameter_types: &'static [&'static str]) -> Self {
        Self {
            name,
            parameter_types,
            return_type: None,
            routing: Routing::Any,
        }
    }

    /// Declare the return type
    pub const fn returns(mut self, return_type: &'static str) -> Self {
        self.return_type = Some(return_type);
        self
    }

    /// Route by the argument at `index`
    pub const fn routed_by(mut self, index: usize) -> Self {
        self.routing = Routing::Argument(index);
        self
    }

    /// Broadcast to every partition
    pub const fn broadcast(mut self) -> Self {
        self.routing = Routing::Broadcast;
        self
    }

    /// Method name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parameter type names
    pub fn parameter_types(&self) -> &'static [&'static str] {
        self.parameter_types
    }

    /// Return type name, `None` for void methods
    pub fn return_type(&self) -> Option<&'static str> {
        self.return_type
    }

    /// Routing policy
    pub fn routing(&self) -> Routing {
        self.routing
    }

    /// Whether the method is broadcast
    pub fn is_broadcast(&self) -> bool {
        self.routing == Routing::Broadcast
    }

    /// Canonical signature
    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(self.name, self.parameter_types.iter().copied())
    }
}
