//! Registry of deployed instances.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::{InstanceConfig, InstanceKey};
use crate::error::{IrsError, Result};
use crate::instance::IrsInstance;
use crate::traits::FromConfig;

/// Handle to an instance in a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceId(usize);

impl InstanceId {
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Deploys instances and hands out access to them.
///
/// At most one instance exists per [`InstanceKey`].
///
/// # Example
///
/// ```rust
/// use irs_amm::config::{InstanceConfig, MarginCalculatorParameters, MarginEngineConfig, VammConfig};
/// use irs_amm::domain::{Address, TermWindow, Timestamp, Wad};
/// use irs_amm::error::IrsError;
/// use irs_amm::factory::Registry;
///
/// let term = TermWindow::new(Timestamp::new(0), Timestamp::new(86_400)).expect("term");
/// let config = InstanceConfig::new(
///     Address::repeat(1),
///     Address::repeat(9),
///     Address::repeat(2),
///     Address::repeat(3),
///     VammConfig::new(60, Wad::ZERO, 0, term).expect("vamm"),
///     MarginEngineConfig::new(3_600, 0).expect("engine"),
///     MarginCalculatorParameters::default(),
/// )
/// .expect("config");
///
/// let mut registry = Registry::default();
/// let id = registry.deploy(&config).expect("deployed");
/// assert_eq!(registry.find(&config.key()), Some(id));
/// assert_eq!(registry.deploy(&config), Err(IrsError::InstanceAlreadyExists));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    instances: Vec<IrsInstance>,
    index: BTreeMap<InstanceKey, InstanceId>,
}

impl Registry {
    /// Validates `config` and deploys a fresh instance for it.
    ///
    /// # Errors
    ///
    /// - [`IrsError::InstanceAlreadyExists`] if the key is taken.
    /// - Any validation error of `config`.
    pub fn deploy(&mut self, config: &InstanceConfig) -> Result<InstanceId> {
        let key = config.key();
        if self.index.contains_key(&key) {
            return Err(IrsError::InstanceAlreadyExists);
        }
        let instance = IrsInstance::from_config(config)?;
        let id = InstanceId(self.instances.len());
        self.instances.push(instance);
        self.index.insert(key, id);
        info!(id = id.get(), instance = %key, "instance deployed");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`IrsError::InstanceNotFound`] for an unknown id.
    pub fn instance(&self, id: InstanceId) -> Result<&IrsInstance> {
        self.instances.get(id.0).ok_or(IrsError::InstanceNotFound)
    }

    /// # Errors
    ///
    /// Returns [`IrsError::InstanceNotFound`] for an unknown id.
    pub fn instance_mut(&mut self, id: InstanceId) -> Result<&mut IrsInstance> {
        self.instances.get_mut(id.0).ok_or(IrsError::InstanceNotFound)
    }

    /// Id of the instance deployed under `key`.
    #[must_use]
    pub fn find(&self, key: &InstanceKey) -> Option<InstanceId> {
        self.index.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Every instance with its id, in deployment order.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &IrsInstance)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, instance)| (InstanceId(i), instance))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{MarginCalculatorParameters, MarginEngineConfig, VammConfig};
    use crate::domain::{Address, TermWindow, Timestamp, Wad};

    // -- helpers --------------------------------------------------------------

    fn config(spacing: u32, term_end: u64) -> InstanceConfig {
        let Ok(term) = TermWindow::new(Timestamp::new(0), Timestamp::new(term_end)) else {
            panic!("valid term");
        };
        let Ok(vamm) = VammConfig::new(spacing, Wad::ZERO, 0, term) else {
            panic!("valid vamm");
        };
        let Ok(engine) = MarginEngineConfig::new(3_600, 0) else {
            panic!("valid engine");
        };
        let Ok(cfg) = InstanceConfig::new(
            Address::repeat(1),
            Address::repeat(9),
            Address::repeat(2),
            Address::repeat(3),
            vamm,
            engine,
            MarginCalculatorParameters::default(),
        ) else {
            panic!("valid config");
        };
        cfg
    }

    #[test]
    fn deploys_distinct_keys() {
        let mut registry = Registry::default();
        let Ok(a) = registry.deploy(&config(60, 1_000)) else {
            panic!("expected Ok");
        };
        let Ok(b) = registry.deploy(&config(10, 1_000)) else {
            panic!("expected Ok");
        };
        let Ok(c) = registry.deploy(&config(60, 2_000)) else {
            panic!("expected Ok");
        };
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.find(&config(10, 1_000).key()), Some(b));
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut registry = Registry::default();
        let Ok(_) = registry.deploy(&config(60, 1_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(
            registry.deploy(&config(60, 1_000)),
            Err(IrsError::InstanceAlreadyExists)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut registry = Registry::default();
        assert!(registry.is_empty());
        assert_eq!(
            registry.instance(InstanceId(0)).err(),
            Some(IrsError::InstanceNotFound)
        );
        assert_eq!(
            registry.instance_mut(InstanceId(3)).err(),
            Some(IrsError::InstanceNotFound)
        );
        assert!(registry.find(&config(60, 1_000).key()).is_none());
    }

    #[test]
    fn handles_reach_the_deployed_instance() {
        let mut registry = Registry::default();
        let cfg = config(60, 1_000);
        let Ok(id) = registry.deploy(&cfg) else {
            panic!("expected Ok");
        };
        let Ok(instance) = registry.instance(id) else {
            panic!("expected Ok");
        };
        assert_eq!(instance.key(), cfg.key());
        assert_eq!(registry.iter().count(), 1);
    }
}
