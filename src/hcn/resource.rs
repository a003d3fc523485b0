//! Resource kinds and their opaque handles

use std::fmt;
use std::marker::PhantomData;

use super::binding::Proc;

mod sealed {
    pub trait Sealed {}
}

/// An HCN object kind and the entry points that operate on it.
pub trait Resource: sealed::Sealed {
    const KIND: &'static str;
    const OPEN: Proc;
    const MODIFY: Proc;
    const QUERY: Proc;
    const ENUMERATE: Proc;
    const DELETE: Proc;
    const CLOSE: Proc;
}

/// Kinds created from an id and settings alone. Endpoints also need their network.
pub trait Standalone: Resource {
    const CREATE: Proc;
}

macro_rules! resource {
    ($(#[$meta:meta])* $name:ident, $kind:literal,
     $open:ident, $modify:ident, $query:ident, $enumerate:ident, $delete:ident, $close:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $name {}

        impl sealed::Sealed for $name {}

        impl Resource for $name {
            const KIND: &'static str = $kind;
            const OPEN: Proc = Proc::$open;
            const MODIFY: Proc = Proc::$modify;
            const QUERY: Proc = Proc::$query;
            const ENUMERATE: Proc = Proc::$enumerate;
            const DELETE: Proc = Proc::$delete;
            const CLOSE: Proc = Proc::$close;
        }
    };
}

resource!(
    /// Virtual network
    Network, "network",
    HcnOpenNetwork, HcnModifyNetwork, HcnQueryNetworkProperties,
    HcnEnumerateNetworks, HcnDeleteNetwork, HcnCloseNetwork
);
resource!(
    /// Endpoint attached to a network
    Endpoint, "endpoint",
    HcnOpenEndpoint, HcnModifyEndpoint, HcnQueryEndpointProperties,
    HcnEnumerateEndpoints, HcnDeleteEndpoint, HcnCloseEndpoint
);
resource!(
    /// Network namespace grouping endpoints
    Namespace, "namespace",
    HcnOpenNamespace, HcnModifyNamespace, HcnQueryNamespaceProperties,
    HcnEnumerateNamespaces, HcnDeleteNamespace, HcnCloseNamespace
);
resource!(
    LoadBalancer, "load balancer",
    HcnOpenLoadBalancer, HcnModifyLoadBalancer, HcnQueryLoadBalancerProperties,
    HcnEnumerateLoadBalancers, HcnDeleteLoadBalancer, HcnCloseLoadBalancer
);
resource!(
    /// SDN route entry
    SdnRoute, "route",
    HcnOpenSdnRoute, HcnModifySdnRoute, HcnQuerySdnRouteProperties,
    HcnEnumerateSdnRoutes, HcnDeleteSdnRoute, HcnCloseSdnRoute
);

impl Standalone for Network {
    const CREATE: Proc = Proc::HcnCreateNetwork;
}

impl Standalone for Namespace {
    const CREATE: Proc = Proc::HcnCreateNamespace;
}

impl Standalone for LoadBalancer {
    const CREATE: Proc = Proc::HcnCreateLoadBalancer;
}

impl Standalone for SdnRoute {
    const CREATE: Proc = Proc::HcnCreateSdnRoute;
}

/// Opaque native handle to an open object of kind `R`.
///
/// Valid from the create/open call that returned it until it is passed to
/// `Gateway::close`. Nothing here tracks validity; the native layer decides
/// what happens to stale handles.
pub struct Handle<R: Resource> {
    raw: usize,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Resource> Handle<R> {
    /// Wrap a raw handle value.
    ///
    /// # Safety
    ///
    /// The value must have come from the native layer for an object of kind `R`
    /// and must not be closed through another `Handle`.
    pub unsafe fn from_raw(raw: usize) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    pub fn as_raw(&self) -> usize {
        self.raw
    }

    /// Give up the handle without closing it.
    pub fn into_raw(self) -> usize {
        self.raw
    }
}

impl<R: Resource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({:#x})", R::KIND, self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_match_kind() {
        fn symbols<R: Resource>() -> Vec<&'static str> {
            vec![
                R::OPEN.symbol(),
                R::MODIFY.symbol(),
                R::QUERY.symbol(),
                R::ENUMERATE.symbol(),
                R::DELETE.symbol(),
                R::CLOSE.symbol(),
            ]
        }
        assert!(symbols::<Network>().iter().all(|s| s.contains("Network")));
        assert!(symbols::<Endpoint>().iter().all(|s| s.contains("Endpoint")));
        assert!(symbols::<Namespace>().iter().all(|s| s.contains("Namespace")));
        assert!(symbols::<LoadBalancer>().iter().all(|s| s.contains("LoadBalancer")));
        assert!(symbols::<SdnRoute>().iter().all(|s| s.contains("SdnRoute")));
        assert_eq!(SdnRoute::CREATE, Proc::HcnCreateSdnRoute);
    }

    #[test]
    fn test_handle_debug() {
        let handle = unsafe { Handle::<Namespace>::from_raw(0xbeef) };
        assert_eq!(format!("{:?}", handle), "Handle<namespace>(0xbeef)");
        assert_eq!(handle.into_raw(), 0xbeef);
    }
}
