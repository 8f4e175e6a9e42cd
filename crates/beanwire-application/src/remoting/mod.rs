//! Client-side remoting
//!
//! - [`MethodDescriptor`] describes one exposed method
//! - [`RemoteApi`] binds a service trait to a client adapter
//! - [`RemotingProxy`] performs the calls for that adapter
//! - [`Reducer`] folds broadcast results

pub mod api;
pub mod method;
pub mod proxy;
pub mod reducer;
pub mod rejecting;

pub use api::RemoteApi;
pub use method::{MethodDescriptor, Routing};
pub use proxy::{CallArgs, RemotingProxy};
pub use reducer::{FnReducer, ListReducer, MapReducer, Reducer, SetReducer, TolerantListReducer};
pub use rejecting::RejectingTransport;
