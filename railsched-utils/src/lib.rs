#![cfg_attr(not(test), no_std)]

pub mod delay;
pub mod flag;

pub use delay::BusyDelay;
pub use flag::SharedFlag;
