use crate::host::domain::render_target::RenderTarget;
use crate::shared::display_flags::DisplayFlags;

/// Holds a render target in minimal-display mode.
///
/// `acquire` records every tracked toggle and hides the non-sticky ones;
/// the recorded values are written back by `release` or, failing that,
/// on drop. Individual toggle failures are logged and skipped since the
/// toggles are cosmetic.
///
/// The guard borrows the target for its whole lifetime, so frame
/// readback goes through [`ViewportStateGuard::target`].
pub struct ViewportStateGuard<'a> {
    target: &'a mut dyn RenderTarget,
    snapshot: Vec<(String, bool)>,
    restored: bool,
}

impl<'a> ViewportStateGuard<'a> {
    pub fn acquire(target: &'a mut dyn RenderTarget, flags: &DisplayFlags) -> Self {
        let target_id = target.id().to_string();
        let mut snapshot = Vec::with_capacity(flags.len());

        match target.display_toggles() {
            None => {
                log::warn!(
                    "Render target '{target_id}' has no display editor; viewport flags left untouched"
                );
            }
            Some(editor) => {
                for flag in flags {
                    match editor.get(&flag.name) {
                        Ok(visible) => snapshot.push((flag.name.clone(), visible)),
                        Err(e) => log::warn!("Could not read display flag '{}': {e}", flag.name),
                    }
                }

                for (name, visible) in &snapshot {
                    let sticky = flags.get(name).is_some_and(|f| f.sticky);
                    let forced = sticky && *visible;
                    if let Err(e) = editor.set(name, forced) {
                        log::warn!("Could not set display flag '{name}': {e}");
                    }
                }
                log::debug!(
                    "Minimal display active on '{target_id}' ({} flags tracked)",
                    snapshot.len()
                );
            }
        }

        Self {
            target,
            snapshot,
            restored: false,
        }
    }

    pub fn target(&mut self) -> &mut dyn RenderTarget {
        &mut *self.target
    }

    /// Flag values recorded at acquisition, in catalog order.
    pub fn snapshot(&self) -> &[(String, bool)] {
        &self.snapshot
    }

    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        if self.snapshot.is_empty() {
            return;
        }

        let target_id = self.target.id().to_string();
        let Some(editor) = self.target.display_toggles() else {
            log::warn!("Render target '{target_id}' lost its display editor; flags not restored");
            return;
        };
        for (name, visible) in &self.snapshot {
            if let Err(e) = editor.set(name, *visible) {
                log::error!("Could not restore display flag '{name}': {e}");
            }
        }
        log::debug!("Display flags restored on '{target_id}'");
    }
}

impl Drop for ViewportStateGuard<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}
