pub mod contracts;
pub mod error;
pub mod executor;
pub mod file_store;
pub mod repository;

pub use contracts::*;
pub use error::*;
pub use executor::*;
pub use file_store::*;
pub use repository::*;
