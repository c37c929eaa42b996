pub mod factory;
pub mod local;
pub mod memory;

#[cfg(feature = "ssm")]
pub mod ssm;
