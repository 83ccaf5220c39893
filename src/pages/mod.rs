pub mod editor;
pub mod library;
