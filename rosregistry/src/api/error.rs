#![allow(deprecated)]
pub use crate::rosxmlrpc::error as rosxmlrpc;
pub use crate::rosxmlrpc::ResponseError;
use error_chain::error_chain;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Naming(ros_names::Error);
        Response(ResponseError);
    }
    links {
        XmlRpc(rosxmlrpc::Error, rosxmlrpc::ErrorKind);
    }
    errors {
        AlreadyRunning(t: String) {
            description("Server was already started")
            display("{} server was already started, and servers only start once", t)
        }
        NotRunning(operation: String) {
            description("Server is not running")
            display("Cannot perform {} while the server is not running", operation)
        }
        Duplicate(t: String) {
            description("Could not add duplicate")
            display("Could not add duplicate {}", t)
        }
        MalformedUri(uri: String) {
            description("Malformed URI")
            display("Malformed URI: {}", uri)
        }
        UnsupportedOperation(operation: String) {
            description("Operation is not supported")
            display("Operation is not supported: {}", operation)
        }
    }
}
