use crate::message::{Command, ResponseMode};

/// Requests the device information block
pub const REQUEST: Command = Command::from_static(&[0x10, 0x00]);
/// Alternate device information request; the reply layout is undocumented
pub const REQUEST_VARIANT: Command = Command::from_static(&[0x25]);
pub(crate) const MODE: ResponseMode = ResponseMode::Single;
