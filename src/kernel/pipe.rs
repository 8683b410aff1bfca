//! Shape of the pipe buffer record served by the slab registry.

pub const PIPE_SIZE: usize = 512;

#[repr(C)]
pub struct Pipe {
    pub data: [u8; PIPE_SIZE],
    /// Total bytes read and written, monotonically increasing; the pipe is
    /// empty when they are equal.
    pub nread: u32,
    pub nwrite: u32,
    pub readopen: bool,
    pub writeopen: bool,
}
