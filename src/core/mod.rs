pub mod document;
pub mod html;
pub mod note;
pub mod session;
