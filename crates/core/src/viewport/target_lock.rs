use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use crate::shared::error::CaptureError;

fn active_targets() -> &'static Mutex<HashSet<String>> {
    static ACTIVE: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    ACTIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Exclusive claim on a render target for the length of one session.
///
/// Released on drop.
#[derive(Debug)]
pub struct TargetLock {
    id: String,
}

impl TargetLock {
    pub fn acquire(id: &str) -> Result<Self, CaptureError> {
        let mut active = active_targets()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(id.to_string()) {
            return Err(CaptureError::TargetBusy(id.to_string()));
        }
        Ok(Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        let mut active = active_targets()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let _first = TargetLock::acquire("lock-test-busy").unwrap();
        let err = TargetLock::acquire("lock-test-busy").unwrap_err();
        assert!(matches!(err, CaptureError::TargetBusy(ref id) if id == "lock-test-busy"));
    }

    #[test]
    fn test_drop_releases() {
        let first = TargetLock::acquire("lock-test-release").unwrap();
        drop(first);
        assert!(TargetLock::acquire("lock-test-release").is_ok());
    }

    #[test]
    fn test_distinct_targets_do_not_conflict() {
        let _a = TargetLock::acquire("lock-test-a").unwrap();
        let b = TargetLock::acquire("lock-test-b").unwrap();
        assert_eq!(b.id(), "lock-test-b");
    }
}
