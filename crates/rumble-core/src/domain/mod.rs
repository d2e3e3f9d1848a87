//! Domain rules that do not depend on any I/O.

pub mod device_index;
