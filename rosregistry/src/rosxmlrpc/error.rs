#![allow(deprecated)]
use error_chain::error_chain;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        ForeignXmlRpc(xml_rpc::error::Error);
    }

    errors {
        BadUri(uri: String) {
            description("Bad URI provided")
            display("Bad URI provided: {}", uri)
        }
    }
}
