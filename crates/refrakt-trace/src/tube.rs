//! Extruding a traced path into renderable geometry.

use refrakt_geom::{Mesh, Pose};
use refrakt_math::Vector;

use crate::{Result, TracedPath};

/// Build a square-section tube along the path, in the beam's object space.
///
/// Each path point becomes a square of four vertices offset diagonally from
/// it; consecutive squares are stitched with eight triangles, two per side,
/// wound clockwise seen from outside. The path points are world-space, so
/// they are mapped into the beam's object space first (the orientation is a
/// rotation, so its transpose inverts it).
pub fn tube_mesh(path: &TracedPath, beam_pose: &Pose, radius: f64) -> Result<Mesh> {
    let points = path.points();
    let to_object = beam_pose.orientation().transpose();
    let offset0 = Vector::xyz(-radius, radius, 0.0);
    let offset1 = Vector::xyz(radius, radius, 0.0);

    let mut verts = Vec::with_capacity(4 * points.len());
    let mut faces = Vec::with_capacity(8 * (points.len() - 1));
    for (i, point) in points.iter().enumerate() {
        let center = to_object.mul_vector(&point.sub(beam_pose.origin())?)?;
        verts.push(center.add(&offset0)?);
        verts.push(center.add(&offset1)?);
        verts.push(center.sub(&offset0)?);
        verts.push(center.sub(&offset1)?);
        if i > 0 {
            let j = 4 * i;
            faces.push([j - 4, j, j + 1]);
            faces.push([j - 4, j + 1, j - 3]);
            faces.push([j - 3, j + 1, j + 2]);
            faces.push([j - 3, j + 2, j - 2]);
            faces.push([j - 2, j + 2, j + 3]);
            faces.push([j - 2, j + 3, j - 1]);
            faces.push([j - 1, j + 3, j]);
            faces.push([j - 1, j, j - 4]);
        }
    }
    Ok(Mesh::from_data(verts, faces)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refrakt_geom::Primitive;
    use refrakt_math::Matrix;

    use crate::trace;

    fn straight_path() -> TracedPath {
        let cube = Mesh::primitive(Primitive::Cube);
        let mut emitter = Pose::at(Vector::xyz(0.0, 0.0, -5.0)).unwrap();
        emitter.set_orientation(Matrix::identity(3)).unwrap();
        trace(&emitter, &cube, &Pose::new(), 1.52).unwrap()
    }

    #[test]
    fn test_vertex_and_face_counts() {
        let path = straight_path();
        let mesh = tube_mesh(&path, &Pose::at(Vector::xyz(0.0, 0.0, -5.0)).unwrap(), 0.015)
            .unwrap();
        let n = path.points().len();
        assert_eq!(mesh.verts().len(), 4 * n);
        assert_eq!(mesh.faces().len(), 8 * (n - 1));
    }

    #[test]
    fn test_cross_section_extent() {
        let path = straight_path();
        let radius = 0.015;
        let mesh =
            tube_mesh(&path, &Pose::at(Vector::xyz(0.0, 0.0, -5.0)).unwrap(), radius).unwrap();
        let bounds = mesh.bounds();
        assert!((bounds.min()[0] + radius).abs() < 1e-12);
        assert!((bounds.max()[0] - radius).abs() < 1e-12);
        assert!((bounds.min()[1] + radius).abs() < 1e-12);
        assert!((bounds.max()[1] - radius).abs() < 1e-12);
        // The tube starts at the beam origin in object space.
        assert!(bounds.min()[2].abs() < 1e-9);
    }

    #[test]
    fn test_side_normals_point_outward() {
        let path = straight_path();
        let mesh = tube_mesh(&path, &Pose::at(Vector::xyz(0.0, 0.0, -5.0)).unwrap(), 0.02)
            .unwrap();
        for face in mesh.faces() {
            // Along a straight tube every face normal is perpendicular to
            // the direction of travel and points away from the axis.
            let n = face.normal();
            assert!(n[2].abs() < 1e-9);
            assert!(face.plane_d() > 0.0);
        }
    }
}
