//! Typed wrappers over the HCN entry points
//!
//! Each call encodes its string arguments, binds the entry point, makes one
//! blocking native call, then decodes the status word and any output buffers.
//! Output buffers are released with `CoTaskMemFree` once decoded.

use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use super::binding::{Binder, Proc, Resolver};
use super::guid::RawGuid;
use super::loader::SystemResolver;
use super::resource::{Endpoint, Handle, Network, Resource, Standalone};
use super::result::Response;
use super::status;
use super::wide::{read_wide, WideString};
use crate::config::GatewayConfig;
use crate::{Error, Result};

pub type RawHandle = *mut c_void;

/// Native signatures, keyed by verb
pub type CreateFn =
    unsafe extern "system" fn(*const RawGuid, *const u16, *mut RawHandle, *mut *mut u16) -> i32;
pub type CreateEndpointFn = unsafe extern "system" fn(
    RawHandle,
    *const RawGuid,
    *const u16,
    *mut RawHandle,
    *mut *mut u16,
) -> i32;
pub type OpenFn = unsafe extern "system" fn(*const RawGuid, *mut RawHandle, *mut *mut u16) -> i32;
pub type ModifyFn = unsafe extern "system" fn(RawHandle, *const u16, *mut *mut u16) -> i32;
pub type QueryFn =
    unsafe extern "system" fn(RawHandle, *const u16, *mut *mut u16, *mut *mut u16) -> i32;
pub type EnumerateFn = unsafe extern "system" fn(*const u16, *mut *mut u16, *mut *mut u16) -> i32;
pub type DeleteFn = unsafe extern "system" fn(*const RawGuid, *mut *mut u16) -> i32;
pub type CloseFn = unsafe extern "system" fn(RawHandle) -> i32;
pub type GetCompartmentFn = unsafe extern "system" fn() -> u32;
pub type SetCompartmentFn = unsafe extern "system" fn(u32) -> i32;
pub type HnsCallFn =
    unsafe extern "system" fn(*const u16, *const u16, *const u16, *mut *mut u16) -> i32;
pub type FreeFn = unsafe extern "system" fn(*const c_void);

/// Gateway to the Host Compute Network service
pub struct Gateway {
    binder: Binder,
}

impl Gateway {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            binder: Binder::new(resolver),
        }
    }

    /// Gateway over the system libraries named in `config`
    pub fn with_config(config: GatewayConfig) -> Self {
        Self::new(Arc::new(SystemResolver::new(config)))
    }

    /// Process-wide gateway using the default configuration
    pub fn system() -> &'static Gateway {
        static SYSTEM: OnceLock<Gateway> = OnceLock::new();
        SYSTEM.get_or_init(|| Gateway::with_config(GatewayConfig::default()))
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    /// Which entry points resolve on this host
    pub fn probe(&self) -> Vec<(Proc, bool)> {
        self.binder.probe()
    }

    /// Create an object of kind `R` from its settings document.
    pub fn create<R: Standalone>(&self, id: &Uuid, settings: &str) -> Result<Response<Handle<R>>> {
        let settings = WideString::new("settings", settings)?;
        let call: CreateFn = self.bind(R::CREATE)?;
        let guid = RawGuid::from(id);
        let mut handle: RawHandle = ptr::null_mut();
        let mut result: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %R::CREATE, %id, "Calling");
        let hr = unsafe { call(&guid, settings.as_ptr(), &mut handle, &mut result) };
        self.finish(R::CREATE, hr, result, handle)
            .map(|r| r.map(|raw| unsafe { Handle::from_raw(raw as usize) }))
    }

    /// Create an endpoint on `network`.
    pub fn create_endpoint(
        &self,
        network: &Handle<Network>,
        id: &Uuid,
        settings: &str,
    ) -> Result<Response<Handle<Endpoint>>> {
        let proc = Proc::HcnCreateEndpoint;
        let settings = WideString::new("settings", settings)?;
        let call: CreateEndpointFn = self.bind(proc)?;
        let guid = RawGuid::from(id);
        let mut handle: RawHandle = ptr::null_mut();
        let mut result: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %proc, %id, "Calling");
        let hr = unsafe {
            call(
                network.as_raw() as RawHandle,
                &guid,
                settings.as_ptr(),
                &mut handle,
                &mut result,
            )
        };
        self.finish(proc, hr, result, handle)
            .map(|r| r.map(|raw| unsafe { Handle::from_raw(raw as usize) }))
    }

    /// Open an existing object by id.
    pub fn open<R: Resource>(&self, id: &Uuid) -> Result<Response<Handle<R>>> {
        let call: OpenFn = self.bind(R::OPEN)?;
        let guid = RawGuid::from(id);
        let mut handle: RawHandle = ptr::null_mut();
        let mut result: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %R::OPEN, %id, "Calling");
        let hr = unsafe { call(&guid, &mut handle, &mut result) };
        self.finish(R::OPEN, hr, result, handle)
            .map(|r| r.map(|raw| unsafe { Handle::from_raw(raw as usize) }))
    }

    /// Apply a settings document to an open object.
    pub fn modify<R: Resource>(&self, handle: &Handle<R>, settings: &str) -> Result<Response<()>> {
        let settings = WideString::new("settings", settings)?;
        let call: ModifyFn = self.bind(R::MODIFY)?;
        let mut result: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %R::MODIFY, ?handle, "Calling");
        let hr = unsafe { call(handle.as_raw() as RawHandle, settings.as_ptr(), &mut result) };
        self.finish(R::MODIFY, hr, result, ())
    }

    /// Query the properties document of an open object.
    pub fn query<R: Resource>(&self, handle: &Handle<R>, query: &str) -> Result<Response<String>> {
        let query = WideString::new("query", query)?;
        let call: QueryFn = self.bind(R::QUERY)?;
        let mut properties: *mut u16 = ptr::null_mut();
        let mut result: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %R::QUERY, ?handle, "Calling");
        let hr = unsafe {
            call(
                handle.as_raw() as RawHandle,
                query.as_ptr(),
                &mut properties,
                &mut result,
            )
        };
        let properties = self.take_buffer(properties).unwrap_or_default();
        self.finish(R::QUERY, hr, result, properties)
    }

    /// List objects of kind `R` matching `query`.
    pub fn enumerate<R: Resource>(&self, query: &str) -> Result<Response<String>> {
        let query = WideString::new("query", query)?;
        let call: EnumerateFn = self.bind(R::ENUMERATE)?;
        let mut items: *mut u16 = ptr::null_mut();
        let mut result: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %R::ENUMERATE, "Calling");
        let hr = unsafe { call(query.as_ptr(), &mut items, &mut result) };
        let items = self.take_buffer(items).unwrap_or_default();
        self.finish(R::ENUMERATE, hr, result, items)
    }

    /// Delete an object by id.
    pub fn delete<R: Resource>(&self, id: &Uuid) -> Result<Response<()>> {
        let call: DeleteFn = self.bind(R::DELETE)?;
        let guid = RawGuid::from(id);
        let mut result: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %R::DELETE, %id, "Calling");
        let hr = unsafe { call(&guid, &mut result) };
        self.finish(R::DELETE, hr, result, ())
    }

    /// Close a handle. Whatever status the native layer reports is passed through.
    pub fn close<R: Resource>(&self, handle: Handle<R>) -> Result<()> {
        let call: CloseFn = self.bind(R::CLOSE)?;

        tracing::trace!(operation = %R::CLOSE, ?handle, "Calling");
        let hr = unsafe { call(handle.into_raw() as RawHandle) };
        self.finish(R::CLOSE, hr, ptr::null_mut(), ()).map(|_| ())
    }

    /// Network compartment of the calling thread
    pub fn thread_compartment_id(&self) -> Result<u32> {
        let call: GetCompartmentFn = self.bind(Proc::GetCurrentThreadCompartmentId)?;
        Ok(unsafe { call() })
    }

    pub fn set_thread_compartment_id(&self, compartment_id: u32) -> Result<()> {
        let proc = Proc::SetCurrentThreadCompartmentId;
        let call: SetCompartmentFn = self.bind(proc)?;

        tracing::trace!(operation = %proc, compartment_id, "Calling");
        let hr = unsafe { call(compartment_id) };
        self.finish(proc, hr, ptr::null_mut(), ()).map(|_| ())
    }

    /// Legacy HNS request, addressed by verb and path. Returns the raw response text.
    pub fn hns_call(&self, method: &str, path: &str, body: &str) -> Result<String> {
        let proc = Proc::HNSCall;
        let method = WideString::new("method", method)?;
        let path = WideString::new("path", path)?;
        let body = WideString::new("body", body)?;
        let call: HnsCallFn = self.bind(proc)?;
        let mut response: *mut u16 = ptr::null_mut();

        tracing::trace!(operation = %proc, path = %path.to_string_lossy(), "Calling");
        let hr = unsafe { call(method.as_ptr(), path.as_ptr(), body.as_ptr(), &mut response) };
        let response = self.take_buffer(response);
        match status::check(hr) {
            Ok(()) => Ok(response.unwrap_or_default()),
            Err(status) => Err(Error::Native {
                operation: proc.symbol(),
                status,
                result: response.filter(|text| !text.is_empty()),
            }),
        }
    }

    /// Bound entry point of `proc` as the function type `F`.
    fn bind<F: Copy>(&self, proc: Proc) -> Result<F> {
        let addr = self.binder.address(proc)?;
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<usize>());
        // SAFETY: the Resolver contract guarantees `addr` is an entry point
        // whose signature is the one `F` names for this proc.
        Ok(unsafe { mem::transmute_copy::<usize, F>(&addr) })
    }

    /// Decode and release a buffer the native layer allocated.
    fn take_buffer(&self, buffer: *mut u16) -> Option<String> {
        if buffer.is_null() {
            return None;
        }
        let text = unsafe { read_wide(buffer) };
        match self.bind::<FreeFn>(Proc::CoTaskMemFree) {
            Ok(free) => unsafe { free(buffer as *const c_void) },
            Err(e) => tracing::warn!(error = %e, "Cannot release native buffer, leaking it"),
        }
        text
    }

    fn finish<T>(&self, proc: Proc, hr: i32, result: *mut u16, value: T) -> Result<Response<T>> {
        let result = self.take_buffer(result).filter(|text| !text.is_empty());
        match status::check(hr) {
            Ok(()) => Ok(Response { value, result }),
            Err(status) => Err(Error::Native {
                operation: proc.symbol(),
                status,
                result,
            }),
        }
    }
}
