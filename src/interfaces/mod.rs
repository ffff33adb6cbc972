//! Batch I/O surfaces.

pub mod csv;
