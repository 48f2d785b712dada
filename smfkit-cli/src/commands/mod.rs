pub mod build;
pub mod common;
pub mod extract;
pub mod info;
