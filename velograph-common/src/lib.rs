//! Common utilities for the velograph toolkit
//!
//! Everything here is shared by the graph decoders, the routing engine and the
//! synthetic dataset builder: the error taxonomy, bit-field extraction, the
//! Q28.4 fixed-point format and a few numeric helpers.

pub mod bits;
pub mod error;
pub mod functions;
pub mod math;
pub mod q28_4;

pub use error::{Error, Result};
