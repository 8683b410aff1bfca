use bytemuck::bytes_of;

use super::mem::{buddy_info, BuddyInfo};

/// Destination of a syscall's user-space copy. The architecture's copy-out
/// shim validates the user buffer and performs the actual transfer; a bad
/// destination surfaces as [`CopyFault`].
pub trait CopyOut {
    fn copy_out(&mut self, bytes: &[u8]) -> Result<(), CopyFault>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFault;

/// Read-only buddy statistics syscall: snapshots the arena under its lock
/// and hands the record to the user copy shim. The `buddy_info(1)` user
/// program reports a failed copy as `buddy info: kernel error`.
pub fn sys_buddy_info(user: &mut dyn CopyOut) -> Result<(), CopyFault> {
    let info = buddy_info();
    user.copy_out(bytes_of(&info))
}
