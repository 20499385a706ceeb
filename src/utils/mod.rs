pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{has_binary_extension, host_of, is_http_url, normalize_url, url_hash};
