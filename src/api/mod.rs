//! API response types, pagination and request extraction

pub mod extract;
pub mod pagination;
pub mod response;

pub use extract::ApiJson;
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use response::{Created, DataResponse, Mutated, NoContent};
