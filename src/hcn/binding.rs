//! Lazily bound native entry points
//!
//! Every entry point the gateway calls is listed in [`Proc`] together with the
//! library exporting it. A [`Binder`] resolves each one on first use through a
//! [`Resolver`] and keeps the address for the life of the process.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::Result;

/// System libraries hosting the entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Library {
    ComputeNetwork,
    IpHlpApi,
    VmCompute,
    /// Hosts `CoTaskMemFree`, which releases buffers returned through out pointers
    Ole32,
}

impl Library {
    pub const ALL: [Library; 4] = [
        Library::ComputeNetwork,
        Library::IpHlpApi,
        Library::VmCompute,
        Library::Ole32,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Library::ComputeNetwork => "computenetwork.dll",
            Library::IpHlpApi => "iphlpapi.dll",
            Library::VmCompute => "vmcompute.dll",
            Library::Ole32 => "ole32.dll",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

macro_rules! procs {
    ($($name:ident => $library:ident),+ $(,)?) => {
        /// Native entry points, named after their exported symbol
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Proc {
            $($name),+
        }

        impl Proc {
            pub const ALL: &'static [Proc] = &[$(Proc::$name),+];

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Proc::$name => stringify!($name)),+
                }
            }

            pub fn library(&self) -> Library {
                match self {
                    $(Proc::$name => Library::$library),+
                }
            }
        }
    };
}

procs! {
    HcnCreateNetwork => ComputeNetwork,
    HcnOpenNetwork => ComputeNetwork,
    HcnModifyNetwork => ComputeNetwork,
    HcnQueryNetworkProperties => ComputeNetwork,
    HcnEnumerateNetworks => ComputeNetwork,
    HcnDeleteNetwork => ComputeNetwork,
    HcnCloseNetwork => ComputeNetwork,

    HcnCreateEndpoint => ComputeNetwork,
    HcnOpenEndpoint => ComputeNetwork,
    HcnModifyEndpoint => ComputeNetwork,
    HcnQueryEndpointProperties => ComputeNetwork,
    HcnEnumerateEndpoints => ComputeNetwork,
    HcnDeleteEndpoint => ComputeNetwork,
    HcnCloseEndpoint => ComputeNetwork,

    HcnCreateNamespace => ComputeNetwork,
    HcnOpenNamespace => ComputeNetwork,
    HcnModifyNamespace => ComputeNetwork,
    HcnQueryNamespaceProperties => ComputeNetwork,
    HcnEnumerateNamespaces => ComputeNetwork,
    HcnDeleteNamespace => ComputeNetwork,
    HcnCloseNamespace => ComputeNetwork,

    HcnCreateLoadBalancer => ComputeNetwork,
    HcnOpenLoadBalancer => ComputeNetwork,
    HcnModifyLoadBalancer => ComputeNetwork,
    HcnQueryLoadBalancerProperties => ComputeNetwork,
    HcnEnumerateLoadBalancers => ComputeNetwork,
    HcnDeleteLoadBalancer => ComputeNetwork,
    HcnCloseLoadBalancer => ComputeNetwork,

    HcnCreateSdnRoute => ComputeNetwork,
    HcnOpenSdnRoute => ComputeNetwork,
    HcnModifySdnRoute => ComputeNetwork,
    HcnQuerySdnRouteProperties => ComputeNetwork,
    HcnEnumerateSdnRoutes => ComputeNetwork,
    HcnDeleteSdnRoute => ComputeNetwork,
    HcnCloseSdnRoute => ComputeNetwork,

    GetCurrentThreadCompartmentId => IpHlpApi,
    SetCurrentThreadCompartmentId => IpHlpApi,
    HNSCall => VmCompute,
    CoTaskMemFree => Ole32,
}

impl Proc {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Proc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Looks up exported symbols. The address returned must be the entry point of
/// a function with the signature the gateway expects for that symbol.
#[cfg_attr(test, mockall::automock)]
pub trait Resolver: Send + Sync {
    fn resolve(&self, library: Library, symbol: &'static str) -> Result<usize>;
}

/// Memoized entry point table, one single-assignment cell per [`Proc`].
pub struct Binder {
    resolver: Arc<dyn Resolver>,
    slots: Vec<OnceLock<usize>>,
}

impl Binder {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            slots: Proc::ALL.iter().map(|_| OnceLock::new()).collect(),
        }
    }

    /// Address of `proc`, resolving it on first use.
    ///
    /// Threads racing on the first use may each resolve; the first stored
    /// address wins and the others are dropped. Failures are not cached.
    pub fn address(&self, proc: Proc) -> Result<usize> {
        let slot = &self.slots[proc.index()];
        if let Some(addr) = slot.get() {
            return Ok(*addr);
        }

        let addr = self.resolver.resolve(proc.library(), proc.symbol())?;
        tracing::debug!(symbol = proc.symbol(), library = proc.library().file_name(), "Bound entry point");
        let _ = slot.set(addr);
        Ok(slot.get().copied().unwrap_or(addr))
    }

    pub fn is_bound(&self, proc: Proc) -> bool {
        self.slots[proc.index()].get().is_some()
    }

    /// Try to bind every entry point, reporting which ones are available.
    pub fn probe(&self) -> Vec<(Proc, bool)> {
        Proc::ALL
            .iter()
            .map(|proc| (*proc, self.address(*proc).is_ok()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use mockall::predicate::eq;

    fn not_found(library: Library, symbol: &'static str) -> Error {
        Error::ProcNotFound {
            library,
            symbol,
            reason: "missing".into(),
        }
    }

    #[test]
    fn test_proc_table() {
        assert_eq!(Proc::ALL.len(), 39);
        assert_eq!(Proc::HcnQuerySdnRouteProperties.symbol(), "HcnQuerySdnRouteProperties");
        assert_eq!(Proc::HNSCall.library(), Library::VmCompute);
        assert_eq!(Proc::SetCurrentThreadCompartmentId.library().file_name(), "iphlpapi.dll");
        for (i, proc) in Proc::ALL.iter().enumerate() {
            assert_eq!(proc.index(), i);
        }
    }

    #[test]
    fn test_resolves_once() {
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .with(eq(Library::ComputeNetwork), eq("HcnOpenNetwork"))
            .times(1)
            .returning(|_, _| Ok(0x1000));

        let binder = Binder::new(Arc::new(resolver));
        assert!(!binder.is_bound(Proc::HcnOpenNetwork));
        assert_eq!(binder.address(Proc::HcnOpenNetwork).unwrap(), 0x1000);
        assert_eq!(binder.address(Proc::HcnOpenNetwork).unwrap(), 0x1000);
        assert!(binder.is_bound(Proc::HcnOpenNetwork));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let mut seq = mockall::Sequence::new();
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|lib, sym| Err(not_found(lib, sym)));
        resolver
            .expect_resolve()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(0x2000));

        let binder = Binder::new(Arc::new(resolver));
        assert!(binder.address(Proc::HNSCall).unwrap_err().is_unsupported());
        assert!(!binder.is_bound(Proc::HNSCall));
        assert_eq!(binder.address(Proc::HNSCall).unwrap(), 0x2000);
    }

    #[test]
    fn test_racing_first_use_converges() {
        let mut resolver = MockResolver::new();
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = counter.clone();
        // Every racer may resolve, each getting a distinct address
        resolver.expect_resolve().returning(move |_, _| {
            let n = seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(0x4000 + n)
        });

        let binder = Binder::new(Arc::new(resolver));
        let addrs: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| binder.address(Proc::HcnEnumerateNetworks).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winner = binder.address(Proc::HcnEnumerateNetworks).unwrap();
        assert!(addrs.iter().all(|a| *a == winner));
        let resolutions = counter.load(std::sync::atomic::Ordering::SeqCst);
        assert!((1..=8).contains(&resolutions));
    }

    #[test]
    fn test_probe() {
        let mut resolver = MockResolver::new();
        resolver.expect_resolve().returning(|lib, sym| match lib {
            Library::IpHlpApi => Ok(0x10),
            _ => Err(not_found(lib, sym)),
        });

        let binder = Binder::new(Arc::new(resolver));
        let report = binder.probe();
        assert_eq!(report.len(), Proc::ALL.len());
        let available: Vec<Proc> = report.iter().filter(|(_, ok)| *ok).map(|(p, _)| *p).collect();
        assert_eq!(
            available,
            vec![Proc::GetCurrentThreadCompartmentId, Proc::SetCurrentThreadCompartmentId]
        );
    }
}
