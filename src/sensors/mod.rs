pub mod silicon;
pub mod simple;
