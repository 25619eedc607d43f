//! Assertion helpers with diagnostic output.
//!
//! Every failure states expected vs actual and the entity involved.

use brep_kernel::{Dim, Model, Point3d, Tag};

use crate::helpers::HarnessError;

/// Assert the coordinates of a point within `tol`.
pub fn assert_point_near(
    model: &Model,
    tag: Tag,
    expected: Point3d,
    tol: f64,
) -> Result<(), HarnessError> {
    let reg = model.registry();
    let actual = reg.position(reg.point_id(tag)?);
    if actual.distance_to(&expected) <= tol {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("point {tag}: expected {expected:?}, got {actual:?}"),
        })
    }
}

/// Assert exact entity counts (points, curves, surfaces, volumes).
pub fn assert_counts(model: &Model, expected: [usize; 4]) -> Result<(), HarnessError> {
    let actual = Dim::ALL.map(|d| model.registry().count(d));
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("expected P/C/S/V counts {expected:?}, got {actual:?}"),
        })
    }
}

/// Assert the mesh size hint of a point.
pub fn assert_mesh_size(
    model: &Model,
    tag: Tag,
    expected: Option<f64>,
) -> Result<(), HarnessError> {
    let reg = model.registry();
    let actual = reg.point(reg.point_id(tag)?).mesh_size;
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("point {tag}: expected mesh size {expected:?}, got {actual:?}"),
        })
    }
}

/// Assert the members of a physical group, in insertion order.
pub fn assert_group(
    model: &Model,
    dim: Dim,
    tag: Tag,
    expected: &[Tag],
) -> Result<(), HarnessError> {
    let actual = model.physical_group_members(dim, tag)?;
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "group ({}, {tag}): expected members {expected:?}, got {actual:?}",
                dim.index()
            ),
        })
    }
}
