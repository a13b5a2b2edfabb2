/// Parent-relative placement: translate, then scale uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        scale: 1.0,
    };

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Place `child` (expressed in this transform's space) into the parent
    /// space of `self`.
    pub fn then(&self, child: &Transform) -> Transform {
        let [x, y, z] = child.translation;
        let [px, py, pz] = self.translation;
        Transform {
            translation: [px + self.scale * x, py + self.scale * y, pz + self.scale * z],
            scale: self.scale * child.scale,
        }
    }

    /// Map a point from this transform's local space into its parent space.
    pub fn apply(&self, point: [f32; 3]) -> [f32; 3] {
        self.then(&Transform::from_translation(point)).translation
    }
}
