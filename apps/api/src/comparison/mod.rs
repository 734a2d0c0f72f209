// Resume version comparison.
// diff is pure and I/O free; service owns storage access and result assembly.

pub mod diff;
pub mod handlers;
pub mod service;
pub mod store;
