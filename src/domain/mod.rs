pub mod book;
pub mod borrow_record;
pub mod commands;
pub mod errors;
pub mod events;
pub mod lending;
pub mod resolver;
pub mod value_objects;

pub use book::*;
pub use borrow_record::*;
pub use errors::*;
pub use events::*;
pub use value_objects::*;
