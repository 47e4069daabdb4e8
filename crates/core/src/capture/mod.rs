pub mod capture_session;
pub mod frame_source;
pub mod progress_logger;
