pub mod address_matcher;
pub mod censorship_config;
pub mod rpc_request;
pub mod transaction;

pub use address_matcher::AddressMatcher;
pub use censorship_config::CensorshipConfig;
pub use rpc_request::{RpcMethod, RpcRequest, SEND_RAW_TRANSACTION, SEND_TRANSACTION};
pub use transaction::{DecodedTransaction, SignatureParts};
