pub mod target_lock;
pub mod viewport_state_guard;
