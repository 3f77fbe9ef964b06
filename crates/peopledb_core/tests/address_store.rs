use peopledb_core::db::open_db_in_memory;
use peopledb_core::{
    Address, AddressMapper, AddressRepository, CrudOperation, CrudRepository, Region, RepoError,
};

fn pine_avenue() -> Address {
    Address {
        id: None,
        street_address: "9 Pine Avenue".to_string(),
        address2: None,
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        postcode: "62701".to_string(),
        country: "United States".to_string(),
        county: "Sangamon County".to_string(),
        region: Region::Central,
    }
}

#[test]
fn save_and_find_address_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::try_new(&conn).unwrap();

    let mut address = pine_avenue();
    let id = repo.save(&mut address).unwrap();
    assert_eq!(address.id, Some(id));

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found, address);
}

#[test]
fn region_is_stored_as_upper_case_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::try_new(&conn).unwrap();

    let mut address = pine_avenue();
    let id = repo.save(&mut address).unwrap();

    let stored: String = conn
        .query_row("SELECT REGION FROM ADDRESSES WHERE ID = ?1", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, "CENTRAL");
}

#[test]
fn missing_address_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::try_new(&conn).unwrap();

    assert!(repo.find_by_id(404).unwrap().is_none());
}

#[test]
fn each_unsaved_address_gets_a_fresh_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::try_new(&conn).unwrap();

    let mut first = pine_avenue();
    let mut second = pine_avenue();
    let first_id = repo.save(&mut first).unwrap();
    let second_id = repo.save(&mut second).unwrap();

    assert_ne!(first_id, second_id);
}

#[test]
fn address_store_has_no_update_count_or_delete() {
    let conn = open_db_in_memory().unwrap();
    let engine = CrudRepository::try_new(&conn, AddressMapper).unwrap();

    let mut address = pine_avenue();
    engine.save(&mut address).unwrap();

    for operation in [
        CrudOperation::Update,
        CrudOperation::DeleteOne,
        CrudOperation::DeleteMany,
        CrudOperation::Count,
    ] {
        assert!(!engine.supports(operation), "{operation} should be unsupported");
    }

    assert!(matches!(
        engine.count(),
        Err(RepoError::UnsupportedOperation {
            entity: "address",
            operation: CrudOperation::Count,
        })
    ));
    assert!(matches!(
        engine.update(&address),
        Err(RepoError::UnsupportedOperation {
            operation: CrudOperation::Update,
            ..
        })
    ));
    assert!(matches!(
        engine.delete(&address),
        Err(RepoError::UnsupportedOperation {
            operation: CrudOperation::DeleteOne,
            ..
        })
    ));
}
