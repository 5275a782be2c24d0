pub mod patch;
pub mod request;

pub use patch::Patch;
pub use request::{MakeRequest, Request, UPDATE_FIELDS, UpdateRequest};
