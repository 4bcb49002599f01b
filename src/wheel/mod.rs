//! Wheel reading, patching, and validation

mod patcher;
mod reader;
mod validator;

pub use patcher::WheelPatcher;
pub use reader::WheelReader;
pub use reader::WheelScan;
pub use validator::validate_entries;
pub use validator::verify_patched;
