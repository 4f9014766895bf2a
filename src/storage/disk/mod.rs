mod storage_manager;

pub use storage_manager::*;
