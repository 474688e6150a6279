pub mod batch;
pub mod resolver;
