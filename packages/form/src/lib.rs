#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod error;
pub use error::*;

mod fields;

mod form;
pub use form::*;

mod submit;
pub use submit::*;

mod update;
pub use update::*;
