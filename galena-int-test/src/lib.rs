//! Integration test support for the Galena toolkit.

pub mod test_util;
