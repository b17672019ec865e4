//! Enumerated template parameters.
//!
//! A parameter such as `age_group` or `variant` lists the values a templated
//! variable is instantiated over. Values can be declared at several levels;
//! more specific levels replace less specific ones per parameter name.

pub mod types;

pub use types::{ParamMetadata, ParamSpec, ParamsMap, cartesian_product};
