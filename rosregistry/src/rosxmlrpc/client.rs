use super::error::{ErrorKind, Result};
use super::{Response, ResponseError, ResponseInfo};
use serde::{Deserialize, Serialize};
use xml_rpc::{self, Params, Url, Value};

/// Synchronous XML-RPC client for one remote endpoint.
///
/// The same type talks to the master and to peer slaves; the caller
/// identity travels inside the parameter tuple, not here.
#[derive(Debug)]
pub struct Client {
    server_uri: Url,
}

impl Client {
    pub fn new(server_uri: &str) -> Result<Client> {
        let server_uri = server_uri
            .parse()
            .map_err(|_| ErrorKind::BadUri(server_uri.into()))?;
        Ok(Client { server_uri })
    }

    pub fn request_raw(&self, name: &str, params: Params) -> Response<Value> {
        let call_result = xml_rpc::call_value(&self.server_uri, name, params);

        let server_response = call_result.map_err(|err| {
            ResponseError::Client(format!("Failed to perform call to server: {}", err))
        })?;

        let response_parameters = server_response.map_err(|fault| {
            ResponseError::Client(format!(
                "Unexpected fault #{} received from server: {}",
                fault.code, fault.message
            ))
        })?;

        let response_parameters = peel_array_wrappers(&response_parameters[..]);

        ResponseInfo::from_array(response_parameters)?.into()
    }

    pub fn request_value<S>(&self, name: &str, params: &S) -> Response<Value>
    where
        S: Serialize,
    {
        let params = xml_rpc::into_params(params).map_err(bad_request_structure)?;
        self.request_raw(name, params)
    }

    pub fn request<'a, S, D>(&self, name: &str, params: &S) -> Response<D>
    where
        S: Serialize,
        D: Deserialize<'a>,
    {
        let data = self.request_value(name, params)?;
        Deserialize::deserialize(data).map_err(bad_response_structure)
    }
}

// Transports disagree on how deep the response triple is nested.
fn peel_array_wrappers(mut data: &[Value]) -> &[Value] {
    while let [Value::Array(ref children)] = data[..] {
        data = children;
    }
    data
}

fn bad_request_structure<T: std::fmt::Display>(err: T) -> ResponseError {
    ResponseError::Client(format!("Failed to serialize parameters: {}", err))
}

fn bad_response_structure<T: std::fmt::Display>(err: T) -> ResponseError {
    ResponseError::Server(format!("Response data has unexpected structure: {}", err))
}
