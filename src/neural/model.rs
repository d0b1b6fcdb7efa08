//! Super-resolution model trait and core types

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;

use crate::error::{ProjectError, Result};

/// Scale factors for which a pretrained model is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpscaleFactor {
    X2,
    X3,
    X4,
}

impl UpscaleFactor {
    pub const ALL: [UpscaleFactor; 3] = [UpscaleFactor::X2, UpscaleFactor::X3, UpscaleFactor::X4];

    pub fn value(&self) -> u32 {
        match self {
            UpscaleFactor::X2 => 2,
            UpscaleFactor::X3 => 3,
            UpscaleFactor::X4 => 4,
        }
    }

    /// Suffix inserted into the name of an upscaled artefact, e.g. `@x3`
    pub fn name_suffix(&self) -> String {
        format!("@x{}", self.value())
    }
}

impl TryFrom<u32> for UpscaleFactor {
    type Error = ProjectError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            2 => Ok(UpscaleFactor::X2),
            3 => Ok(UpscaleFactor::X3),
            4 => Ok(UpscaleFactor::X4),
            other => Err(ProjectError::InvalidArgument {
                reason: format!("upscale factor must be 2, 3 or 4, got {}", other),
            }),
        }
    }
}

impl fmt::Display for UpscaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.value())
    }
}

/// A loaded model that upscales images by its fixed factor.
pub trait SuperResolutionModel: Send + Sync {
    /// The factor this model was trained for
    fn factor(&self) -> UpscaleFactor;

    /// Return an upscaled copy of `image` in the same channel layout
    fn upsample(&self, image: &DynamicImage) -> Result<DynamicImage>;
}

/// Produces models on demand; loading is assumed to be expensive.
pub trait ModelLoader: Send + Sync {
    fn load(&self, factor: UpscaleFactor) -> Result<Arc<dyn SuperResolutionModel>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_conversion() {
        assert_eq!(UpscaleFactor::try_from(2).unwrap(), UpscaleFactor::X2);
        assert_eq!(UpscaleFactor::try_from(4).unwrap().value(), 4);

        for bad in [0, 1, 5, 8] {
            let err = UpscaleFactor::try_from(bad).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        }
    }

    #[test]
    fn test_name_suffix() {
        assert_eq!(UpscaleFactor::X3.name_suffix(), "@x3");
        assert_eq!(UpscaleFactor::X3.to_string(), "x3");
    }
}
