pub mod build;
pub mod escape;
pub mod serve;
