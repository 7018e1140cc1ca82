//! Safe SQL builder: identifiers from descriptors only, values as parameters.

mod builder;
mod dialect;
#[cfg(feature = "postgres")]
pub mod params;
pub use builder::*;
pub use dialect::*;
#[cfg(feature = "postgres")]
pub use params::*;
