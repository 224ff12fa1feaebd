//! Grid-geometry facade: cell depths and face areas by direction.

use rf_core::{CellId, Real};

use crate::error::{FluidError, FluidResult};

/// Logically-Cartesian face direction of a cell face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceDir {
    XMinus,
    XPlus,
    YMinus,
    YPlus,
    ZMinus,
    ZPlus,
}

impl FaceDir {
    /// Map a grid face tag in 0..=5 to a direction.
    pub fn from_tag(tag: u8) -> FluidResult<Self> {
        Ok(match tag {
            0 => FaceDir::XMinus,
            1 => FaceDir::XPlus,
            2 => FaceDir::YMinus,
            3 => FaceDir::YPlus,
            4 => FaceDir::ZMinus,
            5 => FaceDir::ZPlus,
            _ => return Err(FluidError::InvalidFaceTag { tag }),
        })
    }
}

/// One face of a cell as seen by the geometry facade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellFace {
    pub dir: FaceDir,
    pub area: Real,
}

/// Narrow geometry contract consumed by the aquifer connection setup.
pub trait GridGeometry {
    /// Depth of the cell center (positive downwards).
    fn cell_depth(&self, cell: CellId) -> FluidResult<Real>;

    /// Faces of a cell with their areas.
    fn cell_faces(&self, cell: CellId) -> FluidResult<&[CellFace]>;
}
