pub mod document;
pub mod engine;
pub mod error;
pub mod store;
pub mod validation;

pub use document::Document;
pub use engine::Engine;
pub use error::{Result, ScratchDbError};
pub use store::JsonStore;
