pub mod connection;
pub mod entity;
pub mod hosted;
pub mod repository;
pub mod store;

pub use connection::establish_connection;
pub use hosted::HostedJobStore;
pub use repository::JobRepository;
pub use store::JobStore;
