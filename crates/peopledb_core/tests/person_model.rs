use chrono::{FixedOffset, TimeZone};
use peopledb_core::{Address, Person, Region};
use rust_decimal::Decimal;

#[test]
fn person_serialization_uses_expected_wire_fields() {
    let dob = FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(1985, 3, 1, 12, 30, 0)
        .unwrap();
    let mut person = Person::new("Ada", "Byron", dob);
    person.salary = Decimal::new(12_345_67, 2);
    person.home_address = Some(Address {
        id: Some(3),
        street_address: "1 Dorset Street".to_string(),
        address2: None,
        city: "London".to_string(),
        state: "LDN".to_string(),
        postcode: "W1U".to_string(),
        country: "United Kingdom".to_string(),
        county: "Westminster".to_string(),
        region: Region::South,
    });
    person.add_child(Person::new("Anne", "King", dob));

    let json = serde_json::to_value(&person).unwrap();
    assert_eq!(json["first_name"], "Ada");
    assert_eq!(json["salary"], "12345.67");
    assert_eq!(json["dob"], "1985-03-01T12:30:00+02:00");
    assert_eq!(json["home_address"]["region"], "SOUTH");
    assert_eq!(json["children"][0]["first_name"], "Anne");
    assert!(json["id"].is_null());

    let decoded: Person = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, person);
    assert_eq!(decoded.salary, person.salary);
    assert_eq!(decoded.home_address, person.home_address);
    assert_eq!(decoded.children().len(), 1);
}
