pub mod framing;
pub mod policy;
pub mod session;

pub use framing::{FramingLimits, RawHttpRequest, RequestReader};
pub use policy::{CensorshipPolicy, Verdict};
pub use session::{ConnectionSession, Direction, RelayEngine, SessionSummary};
