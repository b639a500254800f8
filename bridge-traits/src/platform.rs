//! Threading bounds that follow the target.
//!
//! Native hosts drive the media primitive from a multi-threaded runtime, so
//! every bridge object must be `Send + Sync`. Browser builds run on one thread
//! and hand out `web_sys` objects that cannot satisfy those bounds, so the
//! markers collapse to nothing on `wasm32`.

/// `Send + Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync + ?Sized {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> PlatformSendSync for T {}
