//! Provider-facing descriptors: validated endpoints, grant labels, and quirks.
//!
//! A [`ProviderDescriptor`] names the four endpoints the broker talks to (consent screen,
//! token endpoint, user-info lookup, mail send) and the quirks that shape the consent URL.
//! [`ProviderDescriptor::google`] returns the preset used by the binary.

pub mod descriptor;
pub mod grant;

pub use descriptor::*;
pub use grant::*;
