pub mod models;
pub mod queries;
pub mod seed;
pub mod writer;
