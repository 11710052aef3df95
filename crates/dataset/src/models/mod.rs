mod distinct;
mod file;

pub use self::distinct::DistinctHash;
pub use self::file::RawFileRow;
