mod account_service;
mod errors;

pub use account_service::{
    RegisterAccount, authenticate, ensure_admin, load_caller, register,
};
pub use errors::{AccountError, Result};
