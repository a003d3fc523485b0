//! HCN Gateway
//!
//! A Rust library for driving the Windows Host Compute Network (HCN) service:
//! networks, endpoints, namespaces, load balancers and SDN routes, plus the
//! legacy HNS request channel.
//!
//! # Key Features
//!
//! - **Lazy binding** - entry points are resolved on first use, so a missing
//!   HCN feature shows up as [`Error::ProcNotFound`] instead of a load failure
//! - **Typed handles** - `Handle<Network>` cannot be passed where an endpoint is expected
//! - **Pass-through payloads** - settings and queries are JSON text the service defines
//!
//! # Example
//!
//! ```no_run
//! use hcn_gateway::{Gateway, Network};
//! use uuid::Uuid;
//!
//! let gateway = Gateway::system();
//! let id = Uuid::new_v4();
//!
//! let network = gateway
//!     .create::<Network>(&id, r#"{"Name":"nat","Type":"NAT","SchemaVersion":{"Major":2,"Minor":0}}"#)?
//!     .into_value();
//! let props = gateway.query(&network, "{}")?.into_value();
//! println!("{}", props);
//!
//! gateway.close(network)?;
//! gateway.delete::<Network>(&id)?;
//! # Ok::<(), hcn_gateway::Error>(())
//! ```

pub mod blocking;
pub mod config;
pub mod error;
pub mod hcn;
pub mod hns;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use hcn::{
    Endpoint, Gateway, Handle, LoadBalancer, Namespace, Network, Response, SdnRoute, Status,
};
