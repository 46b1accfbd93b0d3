//! Source config schemas, by version

pub mod v0_2;

mod translate;
