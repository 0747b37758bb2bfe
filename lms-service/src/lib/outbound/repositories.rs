pub mod account;
pub mod enrollment;

pub use account::PostgresAccountRepository;
pub use enrollment::PostgresEnrollmentStore;
