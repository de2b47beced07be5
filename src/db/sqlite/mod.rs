mod common;
mod prompts;
pub(crate) mod tags;

pub use prompts::SqlitePromptRepo;
