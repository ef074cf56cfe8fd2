mod init;
mod span;
mod trace_id;

pub use init::init_logger;
pub use span::{flag_if_slow, root_span};
pub use trace_id::TraceId;
