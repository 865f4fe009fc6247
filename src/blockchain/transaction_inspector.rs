use alloy_consensus::transaction::SignerRecoverable;
use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::{Decodable2718, Typed2718};
use alloy_primitives::hex;

use crate::error::DecodeError;
use crate::models::{DecodedTransaction, SignatureParts};

/// Turns the hex payload of `eth_sendRawTransaction` into a decoded transaction.
///
/// Implementations must be pure: no I/O and no shared mutation, so the relay can
/// call them inline between two socket operations.
pub trait InspectTransaction: Send + Sync {
    fn inspect(&self, raw_hex: &str) -> Result<DecodedTransaction, DecodeError>;
}

/// Inspector backed by alloy's EIP-2718 decoder and secp256k1 recovery.
///
/// Legacy transactions are recovered with EIP-155 when they carry a chain id and
/// with the Homestead scheme otherwise; typed transactions always sign over
/// their own chain id.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionInspector;

impl TransactionInspector {
    pub fn new() -> Self {
        Self
    }

    /// Strip an optional 0x prefix and hex-decode
    pub fn decode_hex(raw_hex: &str) -> Result<Vec<u8>, DecodeError> {
        let trimmed = raw_hex.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        hex::decode(stripped).map_err(|e| DecodeError::BadHex(e.to_string()))
    }

    /// Decode the canonical network encoding, rejecting trailing bytes
    pub fn decode_envelope(bytes: &[u8]) -> Result<TxEnvelope, DecodeError> {
        let mut buf = bytes;
        let envelope = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| DecodeError::BadEncoding(e.to_string()))?;

        if !buf.is_empty() {
            return Err(DecodeError::BadEncoding(format!(
                "{} trailing bytes after transaction",
                buf.len()
            )));
        }

        Ok(envelope)
    }
}

impl InspectTransaction for TransactionInspector {
    fn inspect(&self, raw_hex: &str) -> Result<DecodedTransaction, DecodeError> {
        let bytes = Self::decode_hex(raw_hex)?;
        let envelope = Self::decode_envelope(&bytes)?;

        let sender = envelope
            .recover_signer()
            .map_err(|e| DecodeError::UnrecoverableSender(e.to_string()))?;

        let signature = envelope.signature();

        Ok(DecodedTransaction {
            hash: *envelope.tx_hash(),
            tx_type: envelope.ty(),
            nonce: envelope.nonce(),
            to: envelope.to(),
            value: envelope.value(),
            input: envelope.input().clone(),
            chain_id: envelope.chain_id(),
            signature: SignatureParts {
                r: signature.r(),
                s: signature.s(),
                y_parity: signature.v(),
            },
            sender,
        })
    }
}
