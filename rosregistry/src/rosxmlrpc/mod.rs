//! XML-RPC plumbing shared by the master and slave APIs.
//!
//! Every call in the registration protocol answers with the triple
//! `(code, statusMessage, value)`. [`ResponseInfo`] translates between that
//! wire shape and the [`Response`] result type used throughout the crate.

pub use self::client::Client;
use self::response_info::ResponseInfo;
pub use self::server::Server;

pub mod client;
pub mod error;
mod response_info;
pub mod server;

pub type Response<T> = Result<T, ResponseError>;

/// Failure reported through the response triple.
///
/// `Client` maps to the error code (-1): the caller supplied bad data.
/// `Server` maps to the failure code (0): an expected, soft failure such as
/// a lookup miss.
#[derive(Clone, Debug)]
pub enum ResponseError {
    Client(String),
    Server(String),
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match *self {
            ResponseError::Client(ref v) => write!(f, "Client error: {}", v),
            ResponseError::Server(ref v) => write!(f, "Server error: {}", v),
        }
    }
}

impl std::error::Error for ResponseError {}

const ERROR_CODE: i32 = -1;
const FAILURE_CODE: i32 = 0;
const SUCCESS_CODE: i32 = 1;
