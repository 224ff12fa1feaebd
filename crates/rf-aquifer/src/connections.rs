//! Aquifer-to-reservoir connection set.
//!
//! Connections are declared as (cell, face direction) pairs; geometry is
//! resolved against the grid facade at initialization, producing the per-entry
//! face areas, depths, and the area fractions that split the total influx.

use rf_core::{CellId, Real};
use rf_fluids::{FaceDir, GridGeometry};

use crate::error::{AquiferError, AquiferResult};

/// One declared boundary connection.
#[derive(Clone, Debug)]
pub struct ConnectionEntry {
    pub cell: CellId,
    pub face_dir: FaceDir,
    /// Optional explicit influx coefficient; overrides the grid face area.
    pub influx_coeff: Option<Real>,
    /// Multiplier on the effective area.
    pub influx_multiplier: Real,
}

impl ConnectionEntry {
    pub fn new(cell: CellId, face_dir: FaceDir) -> Self {
        Self {
            cell,
            face_dir,
            influx_coeff: None,
            influx_multiplier: 1.0,
        }
    }
}

/// The ordered connection list of one aquifer.
#[derive(Clone, Debug)]
pub struct AquiferConnections {
    entries: Vec<ConnectionEntry>,
}

impl AquiferConnections {
    pub fn new(aquifer_id: u32, entries: Vec<ConnectionEntry>) -> AquiferResult<Self> {
        if entries.is_empty() {
            return Err(AquiferError::EmptyConnections { aquifer_id });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ConnectionEntry] {
        &self.entries
    }

    pub fn cells(&self) -> Vec<CellId> {
        self.entries.iter().map(|e| e.cell).collect()
    }

    /// Resolve face areas and depths against the grid and compute the area
    /// fractions. The fractions sum to one by construction.
    pub fn initialize(
        &self,
        aquifer_id: u32,
        grid: &dyn GridGeometry,
    ) -> AquiferResult<ConnectionGeometry> {
        let n = self.entries.len();
        let mut face_areas = vec![0.0; n];
        let mut depths = vec![0.0; n];

        let mut denom_face_areas = 0.0;
        for (idx, entry) in self.entries.iter().enumerate() {
            for face in grid.cell_faces(entry.cell)? {
                if face.dir == entry.face_dir {
                    let area = entry.influx_coeff.unwrap_or(face.area);
                    face_areas[idx] = area * entry.influx_multiplier;
                    denom_face_areas += face_areas[idx];
                }
            }
            depths[idx] = grid.cell_depth(entry.cell)?;
        }

        if denom_face_areas <= 0.0 {
            return Err(AquiferError::NoConnectedFaces { aquifer_id });
        }

        let alphas = face_areas.iter().map(|a| a / denom_face_areas).collect();
        Ok(ConnectionGeometry {
            face_areas,
            depths,
            alphas,
        })
    }
}

/// Geometry derived from the grid at initialization.
#[derive(Clone, Debug)]
pub struct ConnectionGeometry {
    pub face_areas: Vec<Real>,
    pub depths: Vec<Real>,
    pub alphas: Vec<Real>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rf_fluids::{CellFace, InMemoryGeometry};

    fn grid_with_faces(faces: &[(Real, FaceDir)]) -> (InMemoryGeometry, Vec<CellId>) {
        let mut geo = InMemoryGeometry::new();
        let cells = faces
            .iter()
            .enumerate()
            .map(|(i, (area, dir))| {
                geo.push_cell(
                    1000.0 + i as Real,
                    vec![CellFace {
                        dir: *dir,
                        area: *area,
                    }],
                )
            })
            .collect();
        (geo, cells)
    }

    #[test]
    fn alphas_sum_to_one() {
        let (geo, cells) = grid_with_faces(&[
            (10.0, FaceDir::XPlus),
            (30.0, FaceDir::XPlus),
            (60.0, FaceDir::XPlus),
        ]);
        let entries = cells
            .iter()
            .map(|c| ConnectionEntry::new(*c, FaceDir::XPlus))
            .collect();
        let conns = AquiferConnections::new(1, entries).unwrap();
        let geom = conns.initialize(1, &geo).unwrap();

        let total: Real = geom.alphas.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-15);
        assert_relative_eq!(geom.alphas[0], 0.1);
        assert_relative_eq!(geom.alphas[2], 0.6);
    }

    #[test]
    fn mismatched_direction_gives_zero_area() {
        let (geo, cells) = grid_with_faces(&[(10.0, FaceDir::XPlus), (10.0, FaceDir::YMinus)]);
        let entries = vec![
            ConnectionEntry::new(cells[0], FaceDir::XPlus),
            // Declared on ZPlus but the cell only has a YMinus face.
            ConnectionEntry::new(cells[1], FaceDir::ZPlus),
        ];
        let conns = AquiferConnections::new(2, entries).unwrap();
        let geom = conns.initialize(2, &geo).unwrap();
        assert_eq!(geom.face_areas[1], 0.0);
        assert_relative_eq!(geom.alphas[0], 1.0);
    }

    #[test]
    fn influx_coeff_overrides_face_area() {
        let (geo, cells) = grid_with_faces(&[(10.0, FaceDir::XPlus)]);
        let mut entry = ConnectionEntry::new(cells[0], FaceDir::XPlus);
        entry.influx_coeff = Some(4.0);
        entry.influx_multiplier = 2.0;
        let conns = AquiferConnections::new(3, vec![entry]).unwrap();
        let geom = conns.initialize(3, &geo).unwrap();
        assert_relative_eq!(geom.face_areas[0], 8.0);
    }

    #[test]
    fn empty_connection_list_rejected() {
        assert!(matches!(
            AquiferConnections::new(9, vec![]),
            Err(AquiferError::EmptyConnections { aquifer_id: 9 })
        ));
    }
}
