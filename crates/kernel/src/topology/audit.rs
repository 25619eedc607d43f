//! Euler characteristic audit of volume shells. Findings are reported, not
//! enforced: shells bounded by holed faces legitimately deviate from 2.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::entity::Tag;
use super::registry::{EntityRegistry, SurfaceLoopId, VolumeId};

/// Vertex, edge and face counts of one shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCounts {
    pub surface_loop: Tag,
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
}

impl ShellCounts {
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices as i64 - self.edges as i64 + self.faces as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAudit {
    pub volume: Tag,
    pub shells: Vec<ShellCounts>,
}

impl VolumeAudit {
    /// True when every shell is a topological sphere (V - E + F = 2).
    pub fn all_spherical(&self) -> bool {
        self.shells.iter().all(|s| s.euler_characteristic() == 2)
    }
}

impl EntityRegistry {
    /// Count distinct curve endpoints, curves and surfaces of a shell.
    /// Arc centers and spline interior points are not vertices.
    pub fn shell_counts(&self, shell: SurfaceLoopId) -> ShellCounts {
        let sl = self.surface_loop(shell);
        let mut edges = HashSet::new();
        let mut vertices = HashSet::new();
        for s in &sl.surfaces {
            for l in self.surface(*s).loops() {
                for oc in &self.curve_loop(l).curves {
                    edges.insert(oc.curve);
                    let c = self.curve(oc.curve);
                    vertices.insert(c.start);
                    vertices.insert(c.end);
                }
            }
        }
        ShellCounts {
            surface_loop: sl.tag,
            vertices: vertices.len(),
            edges: edges.len(),
            faces: sl.surfaces.len(),
        }
    }
}

#[instrument(skip(reg))]
pub fn audit_volume(reg: &EntityRegistry, volume: VolumeId) -> VolumeAudit {
    let v = reg.volume(volume);
    let shells: Vec<ShellCounts> = v.shells().map(|s| reg.shell_counts(s)).collect();
    for s in &shells {
        debug!(
            surface_loop = s.surface_loop,
            chi = s.euler_characteristic(),
            "shell euler characteristic"
        );
    }
    VolumeAudit {
        volume: v.tag,
        shells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::geometry::point::Point3d;
    use crate::topology::builder::*;

    #[test]
    fn test_tetrahedron_is_spherical() {
        let cfg = ModelConfig::default();
        let mut reg = EntityRegistry::new();
        let corners = [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0)];
        for (i, (x, y, z)) in corners.iter().enumerate() {
            add_point(&mut reg, Point3d::new(*x, *y, *z), None, Some(i as Tag + 1)).unwrap();
        }
        for (i, (a, b)) in [(1, 2), (2, 3), (3, 1), (1, 4), (2, 4), (3, 4)].iter().enumerate() {
            add_curve(&mut reg, CurveType::Line, &[*a, *b], Some(i as Tag + 1), &cfg).unwrap();
        }
        let faces: [&[Tag]; 4] = [&[1, 2, 3], &[1, 5, -4], &[2, 6, -5], &[3, 4, -6]];
        for (i, f) in faces.iter().enumerate() {
            let t = i as Tag + 1;
            add_curve_loop(&mut reg, f, Some(t)).unwrap();
            add_plane_surface(&mut reg, &[t], Some(t), &cfg).unwrap();
        }
        add_surface_loop(&mut reg, &[1, 2, 3, 4], Some(1)).unwrap();
        let v = add_volume(&mut reg, &[1], Some(1)).unwrap();

        let audit = audit_volume(&reg, v);
        assert_eq!(audit.volume, 1);
        assert_eq!(
            audit.shells,
            vec![ShellCounts {
                surface_loop: 1,
                vertices: 4,
                edges: 6,
                faces: 4
            }]
        );
        assert!(audit.all_spherical());
    }
}
