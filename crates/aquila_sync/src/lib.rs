#![cfg_attr(not(test), no_std)]

mod spin;

pub use spin::{LoopRelax, Relax, Spin, SpinGuard, SpinRelax};
