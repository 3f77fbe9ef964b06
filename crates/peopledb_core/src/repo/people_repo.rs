//! People store: person rows plus cascaded addresses and children.
//!
//! # Responsibility
//! - Rebuild a person graph from the denormalized find-by-id join.
//! - Save addresses before the person row and children after it.
//! - Link children stored earlier to the newly keyed parent row.
//!
//! # Invariants
//! - The join yields one row per child; parent, spouse and address columns
//!   repeat on every row and are read from the first row only.
//! - The spouse is referenced by key only and never persisted from here.
//! - Already keyed addresses are bound by key instead of being inserted again.
//! - `DOB` is stored as UTC RFC 3339 text, `SALARY` as exact decimal text.

use crate::model::address::{Address, AddressId};
use crate::model::person::{Person, PersonId};
use crate::repo::address_repo::{extract_address, AddressRepository};
use crate::repo::catalog::{CrudOperation, OperationCatalog};
use crate::repo::crud_repo::{CrudRepository, EntityMapper};
use crate::repo::cursor::ResultCursor;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::identity::IdentityAccessor;
use crate::repo::registration::EntityRegistration;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const SAVE_PERSON_SQL: &str = "INSERT INTO PEOPLE
    (FIRST_NAME, LAST_NAME, DOB, SALARY, EMAIL, HOME_ADDRESS, BUSINESS_ADDRESS, SPOUSE, PARENT_ID)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

pub const FIND_PERSON_BY_ID_SQL: &str = "SELECT
    PARENT.ID AS PARENT_ID, PARENT.FIRST_NAME AS PARENT_FIRST_NAME,
    PARENT.LAST_NAME AS PARENT_LAST_NAME, PARENT.DOB AS PARENT_DOB,
    PARENT.SALARY AS PARENT_SALARY, PARENT.EMAIL AS PARENT_EMAIL,
    PARENT.PARENT_ID AS PARENT_PARENT_ID, PARENT.SPOUSE AS SPOUSE,

    CHILD.ID AS CHILD_ID, CHILD.FIRST_NAME AS CHILD_FIRST_NAME,
    CHILD.LAST_NAME AS CHILD_LAST_NAME, CHILD.DOB AS CHILD_DOB,
    CHILD.SALARY AS CHILD_SALARY, CHILD.EMAIL AS CHILD_EMAIL,

    HOME.ID AS HOME_ID, HOME.STREET_ADDRESS AS HOME_STREET_ADDRESS,
    HOME.ADDRESS2 AS HOME_ADDRESS2, HOME.CITY AS HOME_CITY, HOME.STATE AS HOME_STATE,
    HOME.POSTCODE AS HOME_POSTCODE, HOME.COUNTY AS HOME_COUNTY,
    HOME.REGION AS HOME_REGION, HOME.COUNTRY AS HOME_COUNTRY,

    BUSINESS.ID AS BUSINESS_ID, BUSINESS.STREET_ADDRESS AS BUSINESS_STREET_ADDRESS,
    BUSINESS.ADDRESS2 AS BUSINESS_ADDRESS2, BUSINESS.CITY AS BUSINESS_CITY,
    BUSINESS.STATE AS BUSINESS_STATE, BUSINESS.POSTCODE AS BUSINESS_POSTCODE,
    BUSINESS.COUNTY AS BUSINESS_COUNTY, BUSINESS.REGION AS BUSINESS_REGION,
    BUSINESS.COUNTRY AS BUSINESS_COUNTRY
FROM PEOPLE AS PARENT
LEFT OUTER JOIN PEOPLE AS CHILD ON PARENT.ID = CHILD.PARENT_ID
LEFT OUTER JOIN ADDRESSES AS HOME ON PARENT.HOME_ADDRESS = HOME.ID
LEFT OUTER JOIN ADDRESSES AS BUSINESS ON PARENT.BUSINESS_ADDRESS = BUSINESS.ID
WHERE PARENT.ID = ?";

/// Only name, birth date and salary are updatable through this path.
pub const UPDATE_PERSON_SQL: &str =
    "UPDATE PEOPLE SET FIRST_NAME = ?, LAST_NAME = ?, DOB = ?, SALARY = ? WHERE ID = ?";

/// Re-parents a child that was stored before its parent.
pub const LINK_PERSON_PARENT_SQL: &str = "UPDATE PEOPLE SET PARENT_ID = ? WHERE ID = ?";

pub const COUNT_PEOPLE_SQL: &str = "SELECT COUNT(*) FROM PEOPLE";
pub const DELETE_PERSON_SQL: &str = "DELETE FROM PEOPLE WHERE ID = ?";
pub const DELETE_PEOPLE_SQL: &str = "DELETE FROM PEOPLE WHERE ID IN (:ids)";

fn person_id(person: &Person) -> Option<i64> {
    person.id()
}

fn assign_person_id(person: &mut Person, id: i64) {
    person.assign_id(id);
}

/// Row mapper for `Person`, owning the address store it cascades into.
pub struct PersonMapper<'conn> {
    addresses: AddressRepository<'conn>,
}

impl<'conn> PersonMapper<'conn> {
    pub fn new(addresses: AddressRepository<'conn>) -> Self {
        Self { addresses }
    }

    pub fn addresses(&self) -> &AddressRepository<'conn> {
        &self.addresses
    }

    fn persist_address(&self, address: Option<&mut Address>) -> RepoResult<Option<AddressId>> {
        match address {
            None => Ok(None),
            Some(address) => match address.id {
                Some(id) => Ok(Some(id)),
                None => self.addresses.save(address).map(Some),
            },
        }
    }
}

impl EntityMapper for PersonMapper<'_> {
    type Entity = Person;

    const ENTITY_NAME: &'static str = "person";

    fn registration(&self) -> EntityRegistration<Person> {
        EntityRegistration {
            table: "PEOPLE",
            identity: Some(IdentityAccessor::new(
                Self::ENTITY_NAME,
                "id",
                person_id,
                assign_person_id,
            )),
            catalog: OperationCatalog::new(Self::ENTITY_NAME)
                .with_override(CrudOperation::FindById, FIND_PERSON_BY_ID_SQL)
                .with_override(CrudOperation::Save, SAVE_PERSON_SQL)
                .with_override(CrudOperation::Update, UPDATE_PERSON_SQL)
                .with_override(CrudOperation::LinkParent, LINK_PERSON_PARENT_SQL),
            required: &CrudOperation::ALL,
        }
    }

    fn default_sql(&self, operation: CrudOperation) -> RepoResult<&'static str> {
        match operation {
            CrudOperation::Count => Ok(COUNT_PEOPLE_SQL),
            CrudOperation::DeleteOne => Ok(DELETE_PERSON_SQL),
            CrudOperation::DeleteMany => Ok(DELETE_PEOPLE_SQL),
            CrudOperation::FindById
            | CrudOperation::Save
            | CrudOperation::Update
            | CrudOperation::LinkParent => {
                Err(RepoError::UnsupportedOperation {
                    entity: Self::ENTITY_NAME,
                    operation,
                })
            }
        }
    }

    fn extract_entity(&self, cursor: &mut ResultCursor) -> RepoResult<Person> {
        reconstruct_person(cursor)
    }

    fn map_for_save(&self, person: &mut Person) -> RepoResult<Vec<Value>> {
        let home_address = self.persist_address(person.home_address.as_mut())?;
        let business_address = self.persist_address(person.business_address.as_mut())?;
        let spouse_id = person.spouse_id.filter(|id| *id > 0);

        Ok(vec![
            Value::Text(person.first_name.clone()),
            Value::Text(person.last_name.clone()),
            Value::Text(dob_to_db(&person.dob)),
            Value::Text(person.salary.to_string()),
            person.email.clone().map_or(Value::Null, Value::Text),
            optional_key(home_address),
            optional_key(business_address),
            optional_key(spouse_id),
            optional_key(person.parent_id()),
        ])
    }

    fn map_for_update(&self, person: &Person) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(person.first_name.clone()),
            Value::Text(person.last_name.clone()),
            Value::Text(dob_to_db(&person.dob)),
            Value::Text(person.salary.to_string()),
        ])
    }

    fn post_save(
        &self,
        repo: &CrudRepository<'_, Self>,
        person: &mut Person,
        id: i64,
    ) -> RepoResult<()> {
        for child in person.children_mut() {
            child.set_parent_id(Some(id));
            match child.id() {
                Some(_) => repo.link_parent(child, id)?,
                None => {
                    repo.save(child)?;
                }
            }
        }
        Ok(())
    }

    fn describe(&self, person: &Person) -> String {
        format!(
            "person(first_name={}, last_name={}, dob={}, children={}, parent_id={:?})",
            person.first_name,
            person.last_name,
            dob_to_db(&person.dob),
            person.children().len(),
            person.parent_id()
        )
    }
}

/// Composite store for `Person` graphs.
///
/// Shares its connection with the address store it cascades into.
pub struct PeopleRepository<'conn> {
    inner: CrudRepository<'conn, PersonMapper<'conn>>,
}

impl<'conn> PeopleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let mapper = PersonMapper::new(AddressRepository::try_new(conn)?);
        Ok(Self {
            inner: CrudRepository::try_new(conn, mapper)?,
        })
    }

    pub fn addresses(&self) -> &AddressRepository<'conn> {
        self.inner.mapper().addresses()
    }

    /// Saves `person`, its unsaved addresses and, recursively, its unsaved
    /// children. Children that already have a key are re-pointed at the new
    /// row. Returns the person's new key.
    ///
    /// Nothing is rolled back when a later step fails; wrap the call in a
    /// transaction when all-or-nothing is needed.
    pub fn save(&self, person: &mut Person) -> RepoResult<PersonId> {
        self.inner.save(person)
    }

    pub fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.inner.find_by_id(id)
    }

    /// Writes name, birth date and salary. A missing row is not reported.
    pub fn update(&self, person: &Person) -> RepoResult<()> {
        self.inner.update(person)
    }

    /// Deletes the person's row only; children and addresses are left alone.
    pub fn delete(&self, person: &Person) -> RepoResult<()> {
        self.inner.delete(person)
    }

    pub fn delete_many(&self, people: &[&Person]) -> RepoResult<()> {
        self.inner.delete_many(people)
    }

    pub fn count(&self) -> RepoResult<i64> {
        self.inner.count()
    }
}

/// Rebuilds one person graph from the find-by-id join.
///
/// Expects a cursor positioned at the first row. Parent, spouse and both
/// addresses come from that row; every row from there to the end contributes
/// a child when its `CHILD_ID` is not NULL.
pub fn reconstruct_person(cursor: &mut ResultCursor) -> RepoResult<Person> {
    let mut parent = extract_person(cursor, "PARENT_")?;
    parent.set_parent_id(cursor.get("PARENT_PARENT_ID")?);
    parent.home_address = extract_address(cursor, "HOME_")?;
    parent.business_address = extract_address(cursor, "BUSINESS_")?;
    parent.spouse_id = cursor.get::<Option<i64>>("SPOUSE")?.filter(|id| *id > 0);

    while !cursor.is_exhausted() {
        if cursor.get::<Option<i64>>("CHILD_ID")?.is_some() {
            let child = extract_person(cursor, "CHILD_")?;
            parent.add_child(child);
        }
        cursor.advance();
    }

    Ok(parent)
}

fn extract_person(cursor: &ResultCursor, prefix: &str) -> RepoResult<Person> {
    let column = |name: &str| format!("{prefix}{name}");

    let dob_text: String = cursor.get(&column("DOB"))?;
    let mut person = Person::new(
        cursor.get::<String>(&column("FIRST_NAME"))?,
        cursor.get::<String>(&column("LAST_NAME"))?,
        parse_dob(&dob_text, &column("DOB"))?,
    );
    person.assign_id(cursor.get(&column("ID"))?);
    person.salary = read_salary(cursor, &column("SALARY"))?;
    person.email = cursor.get(&column("EMAIL"))?;
    Ok(person)
}

fn dob_to_db(dob: &DateTime<FixedOffset>) -> String {
    dob.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_dob(value: &str, column: &str) -> RepoResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid date `{value}` in {column}: {err}")))
}

fn read_salary(cursor: &ResultCursor, column: &str) -> RepoResult<Decimal> {
    let invalid = |detail: String| {
        RepoError::InvalidData(format!("invalid salary in {column}: {detail}"))
    };

    match cursor.value(column)? {
        Value::Null => Ok(Decimal::ZERO),
        Value::Integer(value) => Ok(Decimal::from(*value)),
        Value::Real(value) => Decimal::try_from(*value).map_err(|err| invalid(err.to_string())),
        Value::Text(text) => Decimal::from_str(text).map_err(|err| invalid(err.to_string())),
        Value::Blob(_) => Err(invalid("blob value".to_string())),
    }
}

fn optional_key(key: Option<i64>) -> Value {
    key.map_or(Value::Null, Value::Integer)
}

#[cfg(test)]
mod tests {
    use super::{dob_to_db, parse_dob};
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn dob_is_stored_in_utc_and_keeps_the_instant() {
        let dob = FixedOffset::west_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(1980, 11, 15, 0, 0, 0)
            .unwrap();

        let stored = dob_to_db(&dob);
        assert_eq!(stored, "1980-11-15T06:00:00Z");

        let parsed = parse_dob(&stored, "DOB").unwrap();
        assert_eq!(parsed, dob);
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn malformed_dob_is_invalid_data() {
        let err = parse_dob("15/11/1980", "PARENT_DOB").unwrap_err();
        assert!(err.to_string().contains("PARENT_DOB"), "unexpected error: {err}");
    }
}
