pub mod appointment;
pub mod billing;
pub mod dashboard;
pub mod diagnostic_test;
pub mod doctor;
pub mod enums;
pub mod insurance;
pub mod medical_history;
pub mod medication;
pub mod patient;

pub use appointment::*;
pub use billing::*;
pub use dashboard::*;
pub use diagnostic_test::*;
pub use doctor::*;
pub use enums::*;
pub use insurance::*;
pub use medical_history::*;
pub use medication::*;
pub use patient::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::Resource;

/// Display placeholder for a foreign key that resolves to nothing.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A record stored under one resource of the backing store.
///
/// The identifier is serialized under the resource's primary-key column and
/// is `None` until the store assigns it.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const RESOURCE: Resource;
}

macro_rules! impl_entity {
    ($ty:ty, $resource:ident) => {
        impl $crate::models::Entity for $ty {
            const RESOURCE: $crate::db::Resource = $crate::db::Resource::$resource;
        }
    };
}
pub(crate) use impl_entity;

/// Hosted tables declare every business column nullable; read null as the
/// field's default instead of failing the whole list.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
