//! # Host Bridge Traits
//!
//! Capabilities the playback core needs from the host application but cannot
//! provide itself.
//!
//! - [`MediaBackend`](media::MediaBackend) / [`MediaResource`](media::MediaResource):
//!   the raw playable-media primitive (browser audio element, native player).
//! - [`MediaEventSink`](media::MediaEventSink): lifecycle callbacks from a resource
//!   back into the core.
//! - [`LoggerSink`](logging::LoggerSink): forwards structured logs to host logging.
//!
//! ## Error Handling
//!
//! Every bridge call reports failures as [`BridgeError`](error::BridgeError).
//! Hosts should map platform errors onto the closest variant and keep the
//! message actionable (`"404 fetching recording"`, `"autoplay blocked"`), since
//! the core surfaces it to the UI verbatim.
//!
//! ## Thread Safety
//!
//! On native targets all bridge objects must be `Send + Sync`; on `wasm32` the
//! bounds are lifted (see [`platform`]).
//!
//! ## Implementing a backend
//!
//! ```ignore
//! use bridge_traits::media::{MediaBackend, MediaEventSink, MediaResource};
//! use bridge_traits::error::Result;
//! use std::sync::Arc;
//!
//! struct HtmlAudioBackend;
//!
//! impl MediaBackend for HtmlAudioBackend {
//!     fn create(&self, uri: &str, sink: Arc<dyn MediaEventSink>) -> Result<Arc<dyn MediaResource>> {
//!         let element = web_sys::HtmlAudioElement::new_with_src(uri)?;
//!         // wire `loadedmetadata`, `timeupdate`, `ended`, `error` to `sink.emit(..)`
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod logging;
pub mod media;
pub mod platform;

pub use error::BridgeError;

pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{MediaBackend, MediaEvent, MediaEventSink, MediaResource};
pub use platform::PlatformSendSync;
