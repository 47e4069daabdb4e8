use std::sync::OnceLock;

use crate::shared::error::CaptureError;

/// One named viewport visibility toggle.
///
/// `sticky` toggles keep their current value while minimal display is
/// forced; every other toggle is hidden for the duration of a capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFlag {
    pub name: String,
    pub sticky: bool,
}

impl DisplayFlag {
    pub fn new(name: &str, sticky: bool) -> Self {
        Self {
            name: name.to_string(),
            sticky,
        }
    }
}

/// Ordered set of display toggles tracked for one capture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayFlags {
    flags: Vec<DisplayFlag>,
}

impl DisplayFlags {
    pub fn new(flags: Vec<DisplayFlag>) -> Self {
        Self { flags }
    }

    /// A private copy of the process-wide catalog.
    pub fn catalog() -> Self {
        default_catalog().clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayFlag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DisplayFlag> {
        self.flags.iter().find(|f| f.name == name)
    }

    pub fn set_sticky(&mut self, name: &str, sticky: bool) -> Result<(), CaptureError> {
        let flag = self
            .flags
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| CaptureError::InvalidConfig(format!("unknown display flag '{name}'")))?;
        flag.sticky = sticky;
        Ok(())
    }

    /// Marks every named flag sticky, failing on the first unknown name.
    pub fn with_sticky<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, CaptureError> {
        for name in names {
            self.set_sticky(name.as_ref(), true)?;
        }
        Ok(self)
    }
}

impl<'a> IntoIterator for &'a DisplayFlags {
    type Item = &'a DisplayFlag;
    type IntoIter = std::slice::Iter<'a, DisplayFlag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.iter()
    }
}

const CATALOG: &[(&str, bool)] = &[
    ("cameras", false),
    ("clipGhosts", false),
    ("controlVertices", false),
    ("deformers", false),
    ("dimensions", false),
    ("dynamicConstraints", false),
    ("dynamics", false),
    ("fluids", false),
    ("follicles", false),
    ("grid", false),
    ("hairSystems", false),
    ("handles", false),
    ("headsUpDisplay", false),
    ("hulls", false),
    ("ikHandles", false),
    ("imagePlane", false),
    ("joints", false),
    ("lights", false),
    ("locators", false),
    ("manipulators", false),
    ("motionTrails", false),
    ("nCloths", false),
    ("nParticles", false),
    ("nRigids", false),
    ("nurbsCurves", false),
    ("nurbsSurfaces", false),
    ("particleInstancers", false),
    ("pivots", false),
    ("planes", false),
    ("pluginShapes", false),
    ("polymeshes", true),
    ("shadows", false),
    ("strokes", false),
    ("subdivSurfaces", false),
    ("textures", false),
    ("transpInShadows", false),
];

fn default_catalog() -> &'static DisplayFlags {
    static CATALOG_FLAGS: OnceLock<DisplayFlags> = OnceLock::new();
    CATALOG_FLAGS.get_or_init(|| {
        DisplayFlags::new(
            CATALOG
                .iter()
                .map(|&(name, sticky)| DisplayFlag::new(name, sticky))
                .collect(),
        )
    })
}
