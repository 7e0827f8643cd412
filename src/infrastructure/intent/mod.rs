pub mod noop;
pub mod remote;
