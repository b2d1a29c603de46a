pub mod config;
pub mod logging;

pub mod collection;
pub mod index;
pub mod integrity;
pub mod orchestrator;
pub mod reconciler;
pub mod resume;
pub mod retry;
pub mod scanner;
pub mod session;
pub mod storage;
