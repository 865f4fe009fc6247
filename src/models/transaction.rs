use alloy_primitives::{Address, Bytes, B256, U256};

/// Signature components as carried by the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureParts {
    pub r: U256,
    pub s: U256,
    pub y_parity: bool,
}

/// Fields decoded from one submitted signed transaction, plus its recovered sender.
/// Lives for a single request and is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub hash: B256,
    /// EIP-2718 type byte, 0 for legacy
    pub tx_type: u8,
    pub nonce: u64,
    /// None for contract creation
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    /// None for pre-EIP-155 legacy transactions
    pub chain_id: Option<u64>,
    pub signature: SignatureParts,
    pub sender: Address,
}

impl DecodedTransaction {
    /// Sender as a checksummed 0x-prefixed string
    pub fn sender_hex(&self) -> String {
        self.sender.to_checksum(None)
    }

    pub fn is_replay_protected(&self) -> bool {
        self.chain_id.is_some()
    }
}
