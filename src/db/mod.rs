pub mod activity;
pub mod colleges;
pub mod connection;
pub mod dashboard;
pub mod leads;
pub mod notes;
pub mod tracking;
pub mod users;
pub mod works;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection::{init_db, Database};
