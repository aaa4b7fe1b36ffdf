pub mod directory;
pub mod logging;
pub mod storage;
