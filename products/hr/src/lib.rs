//! HR module: the employee directory.
//!
//! [`EmployeeStore`] owns every employee record for the lifetime of the
//! process. Transport layers hand it typed [`Employee`] candidates and map
//! [`StoreError`] back onto their own rejection signals.

mod employee;
mod error;
mod store;

pub use employee::{Employee, EmployeeDraft, EmployeeId};
pub use error::{StoreError, StoreResult, ValidationError};
pub use store::EmployeeStore;
