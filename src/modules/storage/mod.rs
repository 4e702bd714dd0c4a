//! Local-disk blob storage backing document uploads

mod disk;

pub use disk::DiskStorage;
