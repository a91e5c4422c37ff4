pub mod comment;
pub mod pg;
pub mod routes;
pub mod store;
