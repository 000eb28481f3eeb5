//! Logging backend selection.
//!
//! Re-exports the `defmt` macros when the `defmt` feature is enabled and the
//! `log` facade macros otherwise. Format strings must stick to `{}` and
//! `{:?}` so they compile against both.

#[allow(unused_imports)]
#[cfg(not(feature = "defmt"))]
pub(crate) use log::{debug, info, trace, warn};

#[allow(unused_imports)]
#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, info, trace, warn};
