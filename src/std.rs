pub use std::{collections::BTreeMap, format, string::String, vec, vec::Vec};
