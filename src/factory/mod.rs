//! Instance deployment.
//!
//! The [`Registry`] turns [`InstanceConfig`] values into live
//! [`IrsInstance`]s, one per [`InstanceKey`]: the same underlying, oracle,
//! term and tick spacing can only be deployed once.
//!
//! [`InstanceConfig`]: crate::config::InstanceConfig
//! [`InstanceKey`]: crate::config::InstanceKey
//! [`IrsInstance`]: crate::instance::IrsInstance

mod registry;

pub use registry::{InstanceId, Registry};
