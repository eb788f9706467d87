extern crate alloc;

pub use alloc::{collections::BTreeMap, format, string::String, vec, vec::Vec};
