//! Record layer: slotted-page record management, condition evaluation,
//! and sequential scans.

mod condition;
mod manager;
mod row;
mod scan;

pub use condition::evaluate;
pub use manager::RecordManager;
pub use row::{decode_row, encode_row, strip_padding, Value};
pub use scan::{Scan, ScanFilter};
