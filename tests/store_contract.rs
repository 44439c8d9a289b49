use std::sync::Arc;

use directory_tests::{ada, employee, staff};
use products_hr::{EmployeeId, EmployeeStore, StoreError};
use uuid::Uuid;

#[test]
fn distinct_candidates_each_listed_once_under_fresh_ids() {
    let store = EmployeeStore::new();
    let candidates = staff(5);
    let ids: Vec<EmployeeId> = candidates
        .iter()
        .cloned()
        .map(|candidate| store.add(candidate).unwrap())
        .collect();

    let listed = store.list();
    assert_eq!(listed.len(), candidates.len());
    let issued = ids.iter().zip(&candidates);
    for ((id, record), (expected_id, expected)) in listed.iter().zip(issued) {
        assert_eq!(id, expected_id);
        assert_eq!(record, expected);
    }
    let mut unique = ids.clone();
    unique.sort_by_key(|id| id.to_string());
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn second_ada_is_a_duplicate_of_the_first() {
    let store = EmployeeStore::new();
    let first = store.add(ada()).unwrap();
    assert_eq!(
        store.add(ada()),
        Err(StoreError::Duplicate { existing: first })
    );
    assert_eq!(store.len(), 1);
}

#[test]
fn removing_a_never_issued_token_is_not_found() {
    let store = EmployeeStore::new();
    store.add(ada()).unwrap();
    let stranger: EmployeeId = Uuid::new_v4().to_string().parse().unwrap();
    assert_eq!(store.remove(stranger), Err(StoreError::NotFound(stranger)));
}

#[test]
fn identifiers_are_not_resurrected() {
    let store = EmployeeStore::new();
    let first = store.add(ada()).unwrap();
    assert_eq!(store.remove(first), Ok(ada()));
    assert_eq!(store.remove(first), Err(StoreError::NotFound(first)));

    let second = store.add(ada()).unwrap();
    assert_ne!(first, second);
}

#[test]
fn empty_first_name_leaves_size_unchanged() {
    let store = EmployeeStore::new();
    store.add(ada()).unwrap();
    let err = store.add(employee("", "Hopper", "1906-12-09")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(ref v) if v.field == "first_name"));
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_race_on_one_business_key() {
    let store = Arc::new(EmployeeStore::new());
    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.add(ada()) })
        })
        .collect();

    let mut winners = Vec::new();
    let mut duplicates = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(id) => winners.push(id),
            Err(StoreError::Duplicate { existing }) => duplicates.push(existing),
            Err(other) => panic!("unexpected error {other}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert!(duplicates.iter().all(|existing| *existing == winners[0]));
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_adds_and_removes_stay_consistent() {
    let store = Arc::new(EmployeeStore::new());
    let tasks: Vec<_> = staff(64)
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let id = store.add(candidate)?;
                if i % 2 == 0 {
                    store.remove(id)?;
                }
                Ok::<_, StoreError>(id)
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(store.len(), 32);
    let survivors: Vec<usize> = store
        .list()
        .iter()
        .map(|(_, record)| record.first_name["Worker".len()..].parse().unwrap())
        .collect();
    assert!(survivors.iter().all(|i| i % 2 == 1));
}
