use serde::Deserialize;
use serde_json::Value;

pub const SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
pub const SEND_TRANSACTION: &str = "eth_sendTransaction";

/// JSON-RPC method as seen by the censorship policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum RpcMethod {
    SendRawTransaction,
    SendTransaction,
    /// Any other method, or a missing/non-string method field
    Other(String),
}

impl Default for RpcMethod {
    fn default() -> Self {
        RpcMethod::Other(String::new())
    }
}

impl From<Value> for RpcMethod {
    fn from(value: Value) -> Self {
        match value {
            Value::String(name) => match name.as_str() {
                SEND_RAW_TRANSACTION => RpcMethod::SendRawTransaction,
                SEND_TRANSACTION => RpcMethod::SendTransaction,
                _ => RpcMethod::Other(name),
            },
            other => RpcMethod::Other(other.to_string()),
        }
    }
}

/// One JSON-RPC call parsed from a client request body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub method: RpcMethod,
    #[serde(default)]
    pub params: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RpcBody {
    Batch(Vec<RpcRequest>),
    Single(RpcRequest),
}

impl RpcRequest {
    /// Parse a request body holding either a single call or a batch
    pub fn parse_body(body: &[u8]) -> Result<Vec<RpcRequest>, serde_json::Error> {
        match serde_json::from_slice::<RpcBody>(body)? {
            RpcBody::Batch(calls) => Ok(calls),
            RpcBody::Single(call) => Ok(vec![call]),
        }
    }

    /// First positional parameter when it is a string
    pub fn raw_transaction(&self) -> Option<&str> {
        self.params.as_array()?.first()?.as_str()
    }
}
