//! Replays of the two introductory tutorials.

use std::f64::consts::PI;

use brep_kernel::{Dim, EntityRef, Tag};

use crate::helpers::{points, surfaces, HarnessError};
use crate::workflow::ModelBuilder;

/// Tutorial 1: a 0.1 x 0.5 quadrilateral surface and two physical groups.
pub fn tutorial_1() -> Result<ModelBuilder, HarnessError> {
    let lc = 1e-4;
    let mut m = ModelBuilder::new("t1").with_auto_check();
    m.point(0.0, 0.0, 0.0, Some(lc), Some(1))?;
    m.point(0.1, 0.0, 0.0, Some(lc), Some(2))?;
    m.point(0.1, 0.3, 0.0, Some(lc), Some(3))?;
    let p4 = m.point(0.0, 0.5, 0.0, Some(lc), None)?;

    m.line(1, 2, Some(1))?;
    m.line(2, 3, Some(2))?;
    m.line(3, p4, Some(3))?;
    m.line(p4, 1, Some(4))?;

    m.curve_loop(&[1, 2, 3, 4], Some(1))?;
    m.plane_surface(&[1], Some(1))?;
    m.synchronize()?;

    m.physical_group(Dim::Curve, &[1, 2, 4], Some(5), None)?;
    m.physical_group(Dim::Surface, &[1], None, Some("My surface"))?;
    Ok(m)
}

/// Tags produced by tutorial 2 that scenarios check against.
#[derive(Debug, Clone, PartialEq)]
pub struct Tutorial2 {
    /// Copy of point 3, later translated.
    pub copied_point: Tag,
    /// Copies of surfaces 1 and 11, shifted along x.
    pub copied_surfaces: Vec<EntityRef>,
    /// Everything the extrusion created.
    pub extruded: Vec<EntityRef>,
}

/// Tutorial 2: transforms, copies, a hand-built volume and an extruded one.
pub fn tutorial_2() -> Result<(ModelBuilder, Tutorial2), HarnessError> {
    let lc = 1e-2;
    let mut m = ModelBuilder::new("t2").with_auto_check();
    m.point(0.0, 0.0, 0.0, Some(lc), Some(1))?;
    m.point(0.1, 0.0, 0.0, Some(lc), Some(2))?;
    m.point(0.1, 0.3, 0.0, Some(lc), Some(3))?;
    m.point(0.0, 0.3, 0.0, Some(lc), Some(4))?;
    m.line(1, 2, Some(1))?;
    m.line(3, 2, Some(2))?;
    m.line(3, 4, Some(3))?;
    m.line(4, 1, Some(4))?;
    m.curve_loop(&[4, 1, -2, 3], Some(1))?;
    m.plane_surface(&[1], Some(1))?;
    m.synchronize()?;
    m.physical_group(Dim::Curve, &[1, 2, 4], Some(5), None)?;
    m.physical_group(Dim::Surface, &[1], None, Some("My surface"))?;

    // Move a new point, then grow a quadrilateral off the top edge.
    m.point(0.0, 0.4, 0.0, Some(lc), Some(5))?;
    m.line(4, 5, Some(5))?;
    m.translate(&points(&[5]), -0.02, 0.0, 0.0)?;
    m.rotate(&points(&[5]), [0.0, 0.3, 0.0], [0.0, 0.0, 1.0], -PI / 4.0)?;

    let ov = m.copy(&points(&[3]))?;
    m.translate(&ov, 0.0, 0.05, 0.0)?;
    let copied_point = ov[0].tag();
    m.line(3, copied_point, Some(7))?;
    m.line(copied_point, 5, Some(8))?;
    m.curve_loop(&[5, -8, -7, 3], Some(10))?;
    m.plane_surface(&[10], Some(11))?;

    let copied_surfaces = m.copy(&surfaces(&[1, 11]))?;
    m.translate(&copied_surfaces, 0.12, 0.0, 0.0)?;

    // Hand-built volume on top of surface 11.
    m.point(0.0, 0.3, 0.12, Some(lc), Some(100))?;
    m.point(0.1, 0.3, 0.12, Some(lc), Some(101))?;
    m.point(0.1, 0.35, 0.12, Some(lc), Some(102))?;
    m.synchronize()?;
    let xyz = m.value(Dim::Point, 5, &[])?;
    m.point(xyz.x, xyz.y, 0.12, Some(lc), Some(103))?;

    m.line(4, 100, Some(110))?;
    m.line(3, 101, Some(111))?;
    m.line(copied_point, 102, Some(112))?;
    m.line(5, 103, Some(113))?;
    m.line(103, 100, Some(114))?;
    m.line(100, 101, Some(115))?;
    m.line(101, 102, Some(116))?;
    m.line(102, 103, Some(117))?;

    m.curve_loop(&[115, -111, 3, 110], Some(118))?;
    m.plane_surface(&[118], Some(119))?;
    m.curve_loop(&[111, 116, -112, -7], Some(120))?;
    m.plane_surface(&[120], Some(121))?;
    m.curve_loop(&[112, 117, -113, -8], Some(122))?;
    m.plane_surface(&[122], Some(123))?;
    m.curve_loop(&[114, -110, 5, 113], Some(124))?;
    m.plane_surface(&[124], Some(125))?;
    m.curve_loop(&[115, 116, 117, 114], Some(126))?;
    m.plane_surface(&[126], Some(127))?;
    m.surface_loop(&[127, 119, 121, 123, 125, 11], Some(128))?;
    m.volume(&[128], Some(129))?;

    // The same kind of volume, extruded from the second copied surface.
    let extruded = m.extrude(&copied_surfaces[1..2], 0.0, 0.0, 0.12)?;

    m.mesh_size(&points(&[103, 105, 102, copied_point, 5]), lc * 3.0)?;
    m.synchronize()?;
    let mut volumes = vec![129];
    volumes.extend(crate::helpers::volume_tags(&extruded));
    m.physical_group(Dim::Volume, &volumes, Some(1), Some("The volume"))?;

    Ok((
        m,
        Tutorial2 {
            copied_point,
            copied_surfaces,
            extruded,
        },
    ))
}
