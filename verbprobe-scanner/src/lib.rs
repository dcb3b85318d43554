pub mod classify;
pub mod error;
pub mod method;
pub mod probe;
pub mod result;
pub mod scanner;

pub use classify::{Classification, classify};
pub use error::ScanError;
pub use method::HttpMethod;
pub use probe::Prober;
pub use result::{MethodResult, ProbeOutcome, ScanOutcome, Unavailable, UrlReport};
pub use scanner::{ScanConfig, Scanner};
