mod prompt;
mod tag;
pub mod validators;

pub use prompt::*;
pub use tag::*;
