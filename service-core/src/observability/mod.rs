pub mod logging;

pub use logging::{LOG_FILE_NAME, init_tracing};
