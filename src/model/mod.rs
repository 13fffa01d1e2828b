pub mod note;
pub mod role;
pub mod user;
