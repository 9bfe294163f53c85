pub mod attendance;
pub mod gym;
pub mod member;
pub mod payment;

use gymflow_core::store::StoreError;

/// Decode a TEXT status column through the domain type's `FromStr`.
pub(crate) fn parse_column<T>(entity: &'static str, value: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|message| StoreError::Decode { entity, message })
}
