//! Generated Ignition config schemas, by version

pub mod v3_1;
