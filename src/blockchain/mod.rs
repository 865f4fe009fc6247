pub mod transaction_inspector;

pub use transaction_inspector::{InspectTransaction, TransactionInspector};
