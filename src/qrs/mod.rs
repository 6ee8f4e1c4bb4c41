pub mod client;
pub mod filter;
pub mod request;
pub mod transport;
pub mod types;
pub mod xrf;

pub use client::RepositoryClient;
pub use filter::{Filter, FilterOp};
pub use request::{RequestBuilder, RequestContext};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{ConnectionProfile, DomainCredential, IdentityClaim, UserAccessEntry, UserRef};
pub use xrf::XrfKey;
