pub mod capture_config;
pub mod constants;
pub mod display_flags;
pub mod error;
pub mod frame;
pub mod path_utils;
pub mod settings;
pub mod view_spec;
