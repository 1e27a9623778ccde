pub mod fingerprint;
pub(crate) mod request;
pub(crate) mod response;

pub use fingerprint::FingerprintGenerator;
pub use request::PageRequest;
pub use response::PageResponse;
