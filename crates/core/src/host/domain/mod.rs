pub mod render_target;
pub mod timeline;
