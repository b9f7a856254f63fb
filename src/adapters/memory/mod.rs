pub mod accounts;
pub mod library;

pub use accounts::Accounts as InMemoryAccounts;
pub use library::Library as InMemoryLibrary;
