//! Direct PostgreSQL access, used when the service is given a database URL
//! instead of the REST gateway.

pub mod incident_repo;

pub use incident_repo::IncidentRepo;
