//! Built-in provider adapters.

pub mod coveralls;
pub mod drone;

pub use coveralls::{CoverallsAdapter, CoverallsNotification};
pub use drone::{DroneAdapter, DroneNotification};

use crate::config::ProvidersConfig;
use crate::webhook::{Registry, RegistryError};

/// Registers both built-in adapters with their default match rules.
pub fn register_defaults(registry: &Registry) -> Result<(), RegistryError> {
    registry.register(coveralls::NAME, CoverallsAdapter::default())?;
    registry.register(drone::NAME, DroneAdapter::default())?;
    Ok(())
}

/// Registers every provider enabled in `config`.
///
/// Returns the names registered, in registration order.
pub fn register_enabled(
    registry: &Registry,
    config: &ProvidersConfig,
) -> Result<Vec<&'static str>, RegistryError> {
    let mut registered = Vec::new();

    if config.coveralls.enabled {
        registry.register(coveralls::NAME, CoverallsAdapter::from_settings(&config.coveralls))?;
        registered.push(coveralls::NAME);
    }

    if config.drone.enabled {
        registry.register(drone::NAME, DroneAdapter::from_settings(&config.drone))?;
        registered.push(drone::NAME);
    }

    Ok(registered)
}
