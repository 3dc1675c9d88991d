pub mod errors;
pub mod work;

pub use errors::Error;

pub use work::{handle_request, next_request_in_queue};
