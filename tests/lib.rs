//! Shared fixtures for the cross-crate integration tests.

use chrono::NaiveDate;
use products_hr::Employee;

pub fn employee(first: &str, last: &str, birthday: &str) -> Employee {
    let birthday = birthday
        .parse::<NaiveDate>()
        .unwrap_or_else(|err| panic!("bad fixture date {birthday}: {err}"));
    Employee::new(first, last, birthday)
}

pub fn ada() -> Employee {
    employee("Ada", "Lovelace", "1815-12-10")
}

/// Distinct business keys, one per index.
pub fn staff(count: usize) -> Vec<Employee> {
    (0..count)
        .map(|i| employee(&format!("Worker{i}"), "Staff", "1990-01-01"))
        .collect()
}
