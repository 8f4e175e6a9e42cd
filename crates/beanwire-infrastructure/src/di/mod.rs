//! Composition root
//!
//! ```text
//! AppConfig ──▶ ApplicationContextBuilder ──▶ ApplicationContext
//!                    │                            ├── BeanFactory (remote service beans)
//!                    ├── registry backend         ├── LeaseManager ◀── ServiceBinder
//!                    ├── transport components     └── ServiceExporter
//!                    └── serializers / fault tolerance
//! ```

pub mod context;

pub use context::{ApplicationContext, ApplicationContextBuilder, init_context, service_key};
