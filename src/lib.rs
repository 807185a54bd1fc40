//! Render a publications page from a BibTeX-like bibliography.

pub mod author;
pub mod bibliography;
pub mod config;
pub mod doi;
pub mod enrich;
pub mod entry;
pub mod export;
pub mod fields;
pub mod html;
pub mod orcid;
pub mod render;
pub mod sections;
pub mod site;

pub use author::Author;
pub use bibliography::Bibliography;
pub use config::Config;
pub use entry::{Entry, EntryKind};
pub use render::Renderer;
