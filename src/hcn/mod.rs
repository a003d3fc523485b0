//! Low-level HCN bindings
//!
//! Typed wrappers around the Host Compute Network entry points, bound lazily so
//! the crate loads on hosts without the HCN feature.

pub mod binding;
pub mod gateway;
pub mod guid;
pub mod loader;
pub mod resource;
pub mod result;
pub mod status;
pub mod wide;

pub use binding::{Binder, Library, Proc, Resolver};
pub use gateway::Gateway;
pub use loader::SystemResolver;
pub use resource::{Endpoint, Handle, LoadBalancer, Namespace, Network, Resource, SdnRoute, Standalone};
pub use result::{Response, ResultDocument};
pub use status::Status;
