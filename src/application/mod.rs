pub mod accounts;
mod dependencies;
pub mod library;

pub use dependencies::ServiceDependencies;
