//! BMFont descriptor import.
//!
//! [`fnt::parse`] turns the text or XML encoding of a BMFont `.fnt` file into
//! a [`fnt::Descriptor`]. The remaining modules cover what an importer needs
//! around it: page-texture resolution, font-asset assembly, a name-hash font
//! directory and batch import over files and folders.

pub mod assets;
pub mod config;
pub mod directory;
pub mod fnt;
pub mod font_asset;
pub mod import;

pub use fnt::{Descriptor, Format, ParseError, parse};
