//! Translation between the host contract and the vendor wire format.
//!
//! Pure functions plus one per-stream assembler; no I/O happens here.

mod request;
mod response;
mod stream;

pub use request::to_chat_request;
pub use response::{from_chat_response, from_wire_usage, map_finish_reason};
pub use stream::StreamAssembler;
