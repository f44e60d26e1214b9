pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use error::CrmError;
pub use store::CompanyStore;
