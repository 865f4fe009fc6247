use std::sync::Arc;

use alloy_primitives::{Address, B256};

use crate::blockchain::InspectTransaction;
use crate::error::RelayError;
use crate::models::{AddressMatcher, RpcMethod, RpcRequest};
use crate::store::ConfigStore;

/// Outcome of checking one client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    /// Drop the request; `matched` is the deny-list entry as configured
    Censor {
        sender: Address,
        matched: String,
        hash: B256,
    },
}

impl Verdict {
    pub fn is_censored(&self) -> bool {
        matches!(self, Verdict::Censor { .. })
    }
}

/// Decides whether a request body may reach the target
#[derive(Clone)]
pub struct CensorshipPolicy {
    store: Arc<ConfigStore>,
    inspector: Arc<dyn InspectTransaction>,
}

impl CensorshipPolicy {
    pub fn new(store: Arc<ConfigStore>, inspector: Arc<dyn InspectTransaction>) -> Self {
        Self { store, inspector }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Check a request body against the deny-list as it is right now.
    ///
    /// Errors mean the request could not be judged and the session must end.
    pub fn evaluate(&self, body: &[u8]) -> Result<Verdict, RelayError> {
        let config = self.store.get();

        // Nothing to inspect: no deny-list, or a request without a body
        if !config.is_censoring() || body.is_empty() {
            return Ok(Verdict::Forward);
        }

        let calls = RpcRequest::parse_body(body)
            .map_err(|e| RelayError::MalformedRequest(format!("body is not JSON-RPC: {}", e)))?;

        for call in &calls {
            match call.method {
                RpcMethod::SendRawTransaction => {
                    let raw = call.raw_transaction().ok_or_else(|| {
                        RelayError::MalformedRequest(
                            "eth_sendRawTransaction without a string params[0]".to_string(),
                        )
                    })?;

                    let tx = self.inspector.inspect(raw)?;
                    let sender = tx.sender_hex();
                    if let Some(matched) = AddressMatcher::find_match(&sender, &config.censored_addresses) {
                        return Ok(Verdict::Censor {
                            sender: tx.sender,
                            matched: matched.to_string(),
                            hash: tx.hash,
                        });
                    }
                }
                // Unsigned submissions carry no signature to recover from
                RpcMethod::SendTransaction => {}
                RpcMethod::Other(_) => {}
            }
        }

        Ok(Verdict::Forward)
    }
}
