//! Output page writing
//!
//! - [`compose_page`] lays out one bleed page as a plain value
//! - [`write_page`] turns that layout into PDF objects
//! - XObjects for the embedded source page and the strips live in `xobject`

mod page;
mod xobject;

pub use page::*;
