pub mod cache;
pub mod clock;
pub mod compression;
pub mod http;
pub mod time;

pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use compression::{ContentEncoding, add_accept_encoding, decompress_body, detect_encodings};
pub use http::{HyperClient, build_hyper_client};
pub use time::{normalize_unix_seconds, normalize_unix_seconds_f64};
