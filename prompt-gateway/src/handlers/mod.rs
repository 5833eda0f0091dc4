pub mod completions;
pub mod health;
pub mod not_found;
pub mod prompts;

pub use completions::{generate, summarize};
pub use health::health_check;
pub use not_found::not_found;
pub use prompts::{get_prompt, update_prompt};
