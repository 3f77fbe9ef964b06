//! Address store: flat single-row mapping over `ADDRESSES`.
//!
//! # Responsibility
//! - Insert address rows and read them back by key.
//! - Provide the prefixed address extractor reused by the people store.
//!
//! # Invariants
//! - Only find-by-id and save are supported; addresses have no update path.
//! - `REGION` is stored as the upper-case region name.

use crate::model::address::{Address, AddressId, Region};
use crate::repo::catalog::{CrudOperation, OperationCatalog};
use crate::repo::crud_repo::{CrudRepository, EntityMapper};
use crate::repo::cursor::ResultCursor;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::identity::IdentityAccessor;
use crate::repo::registration::EntityRegistration;
use rusqlite::types::Value;
use rusqlite::Connection;

pub const FIND_ADDRESS_BY_ID_SQL: &str = "SELECT
    ID, STREET_ADDRESS, ADDRESS2, CITY, STATE, POSTCODE, COUNTY, REGION, COUNTRY
FROM ADDRESSES
WHERE ID = ?";

pub const SAVE_ADDRESS_SQL: &str = "INSERT INTO ADDRESSES
    (STREET_ADDRESS, ADDRESS2, CITY, STATE, POSTCODE, COUNTY, REGION, COUNTRY)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

fn address_id(address: &Address) -> Option<i64> {
    address.id
}

fn assign_address_id(address: &mut Address, id: i64) {
    address.id = Some(id);
}

/// Row mapper for `Address`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressMapper;

impl EntityMapper for AddressMapper {
    type Entity = Address;

    const ENTITY_NAME: &'static str = "address";

    fn registration(&self) -> EntityRegistration<Address> {
        EntityRegistration {
            table: "ADDRESSES",
            identity: Some(IdentityAccessor::new(
                Self::ENTITY_NAME,
                "id",
                address_id,
                assign_address_id,
            )),
            catalog: OperationCatalog::new(Self::ENTITY_NAME)
                .with_override(CrudOperation::FindById, FIND_ADDRESS_BY_ID_SQL)
                .with_override(CrudOperation::Save, SAVE_ADDRESS_SQL),
            required: &[CrudOperation::FindById, CrudOperation::Save],
        }
    }

    fn extract_entity(&self, cursor: &mut ResultCursor) -> RepoResult<Address> {
        extract_address(cursor, "")?.ok_or_else(|| {
            RepoError::InvalidData("address row without a value in ADDRESSES.ID".to_string())
        })
    }

    fn map_for_save(&self, address: &mut Address) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(address.street_address.clone()),
            address.address2.clone().map_or(Value::Null, Value::Text),
            Value::Text(address.city.clone()),
            Value::Text(address.state.clone()),
            Value::Text(address.postcode.clone()),
            Value::Text(address.county.clone()),
            Value::Text(address.region.as_str().to_string()),
            Value::Text(address.country.clone()),
        ])
    }

    fn describe(&self, address: &Address) -> String {
        format!(
            "address(street_address={}, city={}, postcode={}, region={})",
            address.street_address, address.city, address.postcode, address.region
        )
    }
}

/// Leaf store persisting `Address` values on a shared connection.
pub struct AddressRepository<'conn> {
    inner: CrudRepository<'conn, AddressMapper>,
}

impl<'conn> AddressRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            inner: CrudRepository::try_new(conn, AddressMapper)?,
        })
    }

    /// Inserts a new address row and writes the key into `address`.
    pub fn save(&self, address: &mut Address) -> RepoResult<AddressId> {
        self.inner.save(address)
    }

    pub fn find_by_id(&self, id: AddressId) -> RepoResult<Option<Address>> {
        self.inner.find_by_id(id)
    }
}

/// Reads an address from `prefix`-aliased columns of the current row.
///
/// Returns `None` without touching the remaining columns when
/// `{prefix}ID` is NULL.
pub(crate) fn extract_address(
    cursor: &ResultCursor,
    prefix: &str,
) -> RepoResult<Option<Address>> {
    let Some(id) = cursor.get::<Option<i64>>(&format!("{prefix}ID"))? else {
        return Ok(None);
    };

    let column = |name: &str| format!("{prefix}{name}");
    let region_text: String = cursor.get(&column("REGION"))?;
    let region = Region::parse(&region_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid region `{region_text}` in {}",
            column("REGION")
        ))
    })?;

    Ok(Some(Address {
        id: Some(id),
        street_address: cursor.get(&column("STREET_ADDRESS"))?,
        address2: cursor.get(&column("ADDRESS2"))?,
        city: cursor.get(&column("CITY"))?,
        state: cursor.get(&column("STATE"))?,
        postcode: cursor.get(&column("POSTCODE"))?,
        country: cursor.get(&column("COUNTRY"))?,
        county: cursor.get(&column("COUNTY"))?,
        region,
    }))
}
