pub mod request_id;
pub mod request_log;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use request_log::request_log_middleware;
