//! Resolver backed by the operating system loader

use crate::config::GatewayConfig;
use crate::hcn::binding::{Library, Resolver};
#[cfg(windows)]
use crate::Error;
use crate::Result;

/// Resolves entry points from the system libraries named in a [`GatewayConfig`].
pub struct SystemResolver {
    config: GatewayConfig,
    #[cfg(windows)]
    modules: [std::sync::OnceLock<usize>; 4],
}

impl SystemResolver {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            #[cfg(windows)]
            modules: Default::default(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}

#[cfg(windows)]
impl SystemResolver {
    fn module(&self, library: Library) -> Result<usize> {
        use windows::core::{HSTRING, PCWSTR};
        use windows::Win32::Foundation::HANDLE;
        use windows::Win32::System::LibraryLoader::{
            LoadLibraryExW, LOAD_LIBRARY_FLAGS, LOAD_LIBRARY_SEARCH_SYSTEM32,
        };

        let slot = &self.modules[library.index()];
        if let Some(module) = slot.get() {
            return Ok(*module);
        }

        let name = HSTRING::from(self.config.library_name(library));
        let flags = if self.config.system32_only {
            LOAD_LIBRARY_SEARCH_SYSTEM32
        } else {
            LOAD_LIBRARY_FLAGS(0)
        };
        let module = unsafe { LoadLibraryExW(PCWSTR(name.as_ptr()), HANDLE::default(), flags) }
            .map_err(|e| Error::ProcNotFound {
                library,
                symbol: "",
                reason: e.to_string(),
            })?;

        tracing::debug!(library = %name, "Loaded library");
        // A racing load only bumps the module refcount; keep whichever landed first
        let raw = module.0 as usize;
        let _ = slot.set(raw);
        Ok(slot.get().copied().unwrap_or(raw))
    }
}

#[cfg(windows)]
impl Resolver for SystemResolver {
    fn resolve(&self, library: Library, symbol: &'static str) -> Result<usize> {
        use windows::core::PCSTR;
        use windows::Win32::Foundation::HMODULE;
        use windows::Win32::System::LibraryLoader::GetProcAddress;

        let module = self.module(library).map_err(|e| match e {
            Error::ProcNotFound { reason, .. } => Error::ProcNotFound {
                library,
                symbol,
                reason,
            },
            other => other,
        })?;

        let name = std::ffi::CString::new(symbol).map_err(|_| Error::InvalidString { argument: "symbol" })?;
        let proc = unsafe { GetProcAddress(HMODULE(module as _), PCSTR(name.as_ptr() as *const u8)) };
        match proc {
            Some(f) => Ok(f as usize),
            None => Err(Error::ProcNotFound {
                library,
                symbol,
                reason: windows::core::Error::from_win32().to_string(),
            }),
        }
    }
}

#[cfg(not(windows))]
impl Resolver for SystemResolver {
    fn resolve(&self, library: Library, symbol: &'static str) -> Result<usize> {
        Err(crate::Error::ProcNotFound {
            library,
            symbol,
            reason: format!(
                "{} requires Windows with the Host Compute Network feature",
                self.config.library_name(library)
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn test_unsupported_host() {
        let resolver = SystemResolver::default();
        let err = resolver
            .resolve(Library::ComputeNetwork, "HcnCreateNetwork")
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("HcnCreateNetwork"));
    }

    #[cfg(windows)]
    #[test]
    fn test_missing_symbol() {
        let resolver = SystemResolver::default();
        let err = resolver
            .resolve(Library::Ole32, "DefinitelyNotAnExport")
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(resolver.resolve(Library::Ole32, "CoTaskMemFree").is_ok());
    }
}
