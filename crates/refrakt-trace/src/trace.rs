//! Walking a beam through the target mesh.

use refrakt_geom::{Mesh, Pose};
use refrakt_math::{Matrix, Vector};

use crate::{Edge2d, Ray, Result, MAX_ANGLE_MARKERS, MAX_PATH_POINTS, MIN_RAY_ADVANCE};

/// How far past the last interaction the path extends when the beam leaves
/// the target for good.
const EXIT_EXTENSION: f64 = 8.0;

/// How far the path extends when the beam never touched the target at all.
const MISS_EXTENSION: f64 = 10.0;

/// Distance from an intersection at which angle anchors are placed, along
/// the bisector of the ray and the surface normal.
const ANCHOR_OFFSET: f64 = 0.3;

/// An angle between the beam and a surface normal, with the world-space
/// point where a label for it belongs.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleMarker {
    /// The angle to the normal, folded into `[0, pi/2]`, in radians.
    pub angle: f64,
    /// Anchor point for the label, offset from the intersection.
    pub anchor: Vector,
}

/// The polyline a beam follows, with its recorded angles.
///
/// Holds at most [`MAX_PATH_POINTS`] points and [`MAX_ANGLE_MARKERS`]
/// markers; pushes beyond capacity are dropped silently, matching the fixed
/// label budget of the display layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TracedPath {
    points: Vec<Vector>,
    markers: Vec<AngleMarker>,
}

impl TracedPath {
    /// The path vertices in world space, in travel order.
    pub fn points(&self) -> &[Vector] {
        &self.points
    }

    /// The recorded angles in travel order: two per surface interaction,
    /// incident side first.
    pub fn markers(&self) -> &[AngleMarker] {
        &self.markers
    }

    fn push_point(&mut self, p: Vector) {
        if self.points.len() < MAX_PATH_POINTS {
            self.points.push(p);
        }
    }

    fn push_marker(&mut self, angle: f64, anchor: Vector) {
        if self.markers.len() < MAX_ANGLE_MARKERS {
            self.markers.push(AngleMarker { angle, anchor });
        }
    }
}

/// The target mesh flattened into world space.
struct WorldFace {
    verts: [usize; 3],
    normal: Vector,
    plane_d: f64,
}

fn world_view(mesh: &Mesh, pose: &Pose) -> Result<(Vec<Vector>, Vec<WorldFace>)> {
    let orientation = pose.orientation();
    let mut verts = Vec::with_capacity(mesh.verts().len());
    for v in mesh.verts() {
        verts.push(orientation.mul_vector(v)?.add(pose.origin())?);
    }
    let mut faces = Vec::with_capacity(mesh.faces().len());
    for face in mesh.faces() {
        let indices = face.vertex_indices();
        let normal = orientation.mul_vector(face.normal())?;
        let plane_d = normal.dot(&verts[indices[0]])?;
        faces.push(WorldFace {
            verts: indices,
            normal,
            plane_d,
        });
    }
    Ok((verts, faces))
}

/// Trace a beam from `emitter` through the posed target mesh.
///
/// The beam starts at the emitter's origin heading along its local z basis.
/// `relative_index` is the target material's refractive index over the
/// surrounding world's; the critical angle for total internal reflection
/// follows from whichever side is denser. The returned path always ends in
/// an open segment extending past the last interaction.
pub fn trace(
    emitter: &Pose,
    target: &Mesh,
    target_pose: &Pose,
    relative_index: f64,
) -> Result<TracedPath> {
    let (verts, faces) = world_view(target, target_pose)?;
    let critical_angle = if relative_index > 1.0 {
        (1.0 / relative_index).asin()
    } else {
        relative_index.asin()
    };

    let mut path = TracedPath::default();
    let mut current = Ray::new(emitter.origin().clone(), emitter.basis(2)?);
    let direction;
    loop {
        path.push_point(current.point.clone());
        let next = next_ray(
            &current,
            &verts,
            &faces,
            relative_index,
            critical_angle,
            &mut path,
        )?;
        match next {
            Some(ray) if path.points.len() < MAX_PATH_POINTS - 1 => current = ray,
            _ => {
                direction = current.direction.clone();
                break;
            }
        }
    }
    // Carry the beam onward so the open end is visible: further if it never
    // met the target at all.
    let last = path.points[path.points.len() - 1].clone();
    let extension = if path.points.len() == 1 {
        MISS_EXTENSION
    } else {
        EXIT_EXTENSION
    };
    path.push_point(last.add(&direction.scale(extension))?);
    Ok(path)
}

/// Find the nearest face the ray genuinely crosses and bend the beam there.
/// `None` when the ray escapes to infinity.
fn next_ray(
    incident: &Ray,
    verts: &[Vector],
    faces: &[WorldFace],
    relative_index: f64,
    critical_angle: f64,
    path: &mut TracedPath,
) -> Result<Option<Ray>> {
    let p = &incident.point;
    let v = &incident.direction;
    let mut nearest_lambda = -1.0;
    let mut hit_face: Option<usize> = None;
    let mut hit_point = Vector::zeros(3);

    for (i, face) in faces.iter().enumerate() {
        let n = &face.normal;
        let d = face.plane_d;
        let n_dot_p = n.dot(p)?;
        let n_dot_v = n.dot(v)?;
        // Skip faces the ray points away from, and faces containing p.
        if n_dot_p < d {
            if n_dot_v <= 0.0 {
                continue;
            }
        } else if n_dot_p == d {
            continue;
        } else if n_dot_v >= 0.0 {
            continue;
        }
        let lambda = (d - n_dot_p) / n_dot_v;
        if lambda <= MIN_RAY_ADVANCE {
            continue;
        }
        if nearest_lambda != -1.0 && lambda >= nearest_lambda {
            continue;
        }
        let point_in_plane = p.add(&v.scale(lambda))?;
        if point_in_face(verts, face, &point_in_plane) {
            nearest_lambda = lambda;
            hit_face = Some(i);
            hit_point = point_in_plane;
        }
    }

    match hit_face {
        None => Ok(None),
        Some(i) => {
            let outgoing = next_vector(
                v,
                &faces[i].normal,
                relative_index,
                critical_angle,
                &hit_point,
                path,
            )?;
            Ok(Some(Ray::new(hit_point, outgoing)))
        }
    }
}

/// Point-in-triangle test in a degeneracy-avoiding orthographic projection.
///
/// The triangle is split at its tallest edge; the hit is accepted when it
/// sits between the tall edge and whichever short edge spans its height.
fn point_in_face(verts: &[Vector], face: &WorldFace, point: &Vector) -> bool {
    let n = &face.normal;
    let [i0, i1, i2] = face.verts;
    let (a, b, c) = (&verts[i0], &verts[i1], &verts[i2]);
    // Project onto whichever coordinate plane keeps the vertices from
    // going colinear.
    let (axis_x, axis_y) = if n[2] == 0.0 {
        if n[0] == 0.0 {
            (0, 2)
        } else {
            (2, 1)
        }
    } else {
        (0, 1)
    };
    let edge0 = Edge2d::new(a[axis_x], a[axis_y], b[axis_x], b[axis_y]);
    let edge1 = Edge2d::new(b[axis_x], b[axis_y], c[axis_x], c[axis_y]);
    let edge2 = Edge2d::new(c[axis_x], c[axis_y], a[axis_x], a[axis_y]);
    let x = point[axis_x];
    let y = point[axis_y];

    let mut tall = edge0;
    let mut short0 = edge1;
    let mut short1 = edge2;
    if edge1.height() > tall.height() {
        tall = edge1;
        short0 = edge0;
    }
    if edge2.height() > tall.height() {
        tall = edge2;
        short0 = edge0;
        short1 = edge1;
    }
    // short0 must be the edge sharing the tall edge's lower vertex.
    if (tall.y0() != short0.y0() || tall.x0() != short0.x0())
        && !(tall.y0() == short0.y0() && tall.x0() == short0.x1())
    {
        std::mem::swap(&mut short0, &mut short1);
    }

    if y > short0.y1() {
        // Upper part: between the tall edge and short1.
        let dx_tall = (tall.x1() - tall.x0()) / tall.height();
        let dx_short = (short1.x1() - short1.x0()) / short1.height();
        let y_from_top = y - tall.y1();
        let x_tall = y_from_top * dx_tall + tall.x1();
        let x_short = y_from_top * dx_short + tall.x1();
        if dx_tall > dx_short {
            x <= x_short && x >= x_tall
        } else {
            x >= x_short && x <= x_tall
        }
    } else {
        // Lower part: between the tall edge and short0.
        let dx_tall = (tall.x1() - tall.x0()) / tall.height();
        let dx_short = (short0.x1() - short0.x0()) / short0.height();
        let y_from_bottom = y - tall.y0();
        let x_tall = y_from_bottom * dx_tall + tall.x0();
        let x_short = y_from_bottom * dx_short + tall.x0();
        if dx_short > dx_tall {
            x <= x_short && x >= x_tall
        } else {
            x >= x_short && x <= x_tall
        }
    }
}

/// Bend the beam at a surface: Snell refraction, or total internal
/// reflection when leaving the denser medium at or past the critical angle.
/// Records the incident and outgoing angles with their anchors.
fn next_vector(
    vector: &Vector,
    normal: &Vector,
    relative_index: f64,
    critical_angle: f64,
    intersection: &Vector,
    path: &mut TracedPath,
) -> Result<Vector> {
    let vector = vector.normalized();
    let normal = normal.normalized();
    let v_dot_n = vector.dot(&normal)?;
    if v_dot_n == 0.0 {
        // Grazing along the face; pass straight through.
        return Ok(vector);
    }
    let normal_toward = if v_dot_n > 0.0 { 0.3 } else { -0.3 };
    let incident_anchor = intersection.sub(
        &vector
            .scale(ANCHOR_OFFSET)
            .midpoint(&normal.scale(normal_toward))?,
    )?;

    // Work in the plane containing the ray and the normal. The basis is
    // left-handed with x = -normal so the resulting matrix is a rotation
    // rather than a rotation plus reflection.
    let x_basis = normal.scale(-1.0);
    let y_basis = vector.scale(-1.0).cross(&normal)?.normalized();
    let z_basis = y_basis.scale(-1.0).cross(&x_basis)?.normalized();
    let to_plane =
        Matrix::from_columns(vec![x_basis, y_basis, z_basis])?.transpose();

    let mut angle = v_dot_n.acos();
    if angle > std::f64::consts::FRAC_PI_2 {
        angle = std::f64::consts::PI - angle;
    }
    path.push_marker(angle, incident_anchor);

    let mut plane_vector = to_plane.mul_vector(&vector)?;
    if v_dot_n < 0.0 {
        // Entering the target.
        if relative_index > 1.0 {
            plane_vector = refract(&plane_vector, relative_index);
        } else if angle >= critical_angle {
            plane_vector[0] = -plane_vector[0];
        } else {
            plane_vector = refract(&plane_vector, relative_index);
        }
    } else {
        // Leaving the target.
        if relative_index > 1.0 {
            if angle >= critical_angle {
                plane_vector[0] = -plane_vector[0];
            } else {
                plane_vector = refract(&plane_vector, 1.0 / relative_index);
            }
        } else {
            plane_vector = refract(&plane_vector, 1.0 / relative_index);
        }
    }
    let outgoing = to_plane.transpose().mul_vector(&plane_vector)?;

    let out_dot_n = outgoing.dot(&normal)?;
    let normal_toward = if out_dot_n > 0.0 { 0.3 } else { -0.3 };
    let outgoing_anchor = intersection.add(
        &outgoing
            .scale(ANCHOR_OFFSET)
            .midpoint(&normal.scale(normal_toward))?,
    )?;
    let mut angle = out_dot_n.acos();
    if angle > std::f64::consts::FRAC_PI_2 {
        angle = std::f64::consts::PI - angle;
    }
    path.push_marker(angle, outgoing_anchor);
    Ok(outgoing)
}

/// Snell's law in the canonical plane: x along the (negated) normal, all y
/// components zero, z perpendicular. The sign of the along-normal component
/// is preserved so the ray keeps crossing the surface the same way.
fn refract(incident: &Vector, relative_index: f64) -> Vector {
    let sin_r = incident[2] / relative_index;
    let cos_r = sin_r.asin().cos();
    let x = if incident[0] < 0.0 { -cos_r } else { cos_r };
    Vector::xyz(x, 0.0, sin_r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refrakt_geom::Primitive;
    use std::f64::consts::{FRAC_PI_6, PI};

    const GLASS_OVER_AIR: f64 = 1.52;

    fn emitter_at(origin: Vector, direction: Vector) -> Pose {
        // Any right-handed frame with the requested z column serves; trace
        // only reads the origin and the z basis.
        let d = direction.normalized();
        let up = Vector::xyz(0.0, 1.0, 0.0);
        let x = up.cross(&d).unwrap().normalized();
        let y = d.cross(&x).unwrap().normalized();
        let mut pose = Pose::at(origin).unwrap();
        pose.set_orientation(Matrix::from_columns(vec![x, y, d]).unwrap())
            .unwrap();
        pose
    }

    #[test]
    fn test_normal_incidence_passes_straight_through() {
        let cube = Mesh::primitive(Primitive::Cube);
        let emitter = emitter_at(Vector::xyz(0.0, 0.0, -5.0), Vector::xyz(0.0, 0.0, 1.0));
        let path = trace(&emitter, &cube, &Pose::new(), GLASS_OVER_AIR).unwrap();
        let points = path.points();
        assert_eq!(points.len(), 4);
        assert!((points[1][2] + 1.0).abs() < 1e-10);
        assert!((points[2][2] - 1.0).abs() < 1e-10);
        // Exit extension carries on 8 units along the unchanged direction.
        assert!((points[3][2] - 9.0).abs() < 1e-10);
        for p in points {
            assert!(p[0].abs() < 1e-10);
            assert!(p[1].abs() < 1e-10);
        }
        for marker in path.markers() {
            assert!(marker.angle.abs() < 1e-10);
        }
    }

    #[test]
    fn test_thirty_degrees_into_glass() {
        // sin(r) = sin(30 deg) / 1.52, so r is about 19.2 degrees.
        let cube = Mesh::primitive(Primitive::Cube);
        let direction = Vector::xyz(FRAC_PI_6.sin(), 0.0, FRAC_PI_6.cos());
        let emitter = emitter_at(Vector::xyz(-0.9, 0.0, -3.0), direction);
        let path = trace(&emitter, &cube, &Pose::new(), GLASS_OVER_AIR).unwrap();
        let markers = path.markers();
        assert!(markers.len() >= 2);
        assert!((markers[0].angle - FRAC_PI_6).abs() < 1e-10);
        let expected = (FRAC_PI_6.sin() / GLASS_OVER_AIR).asin();
        assert!((markers[1].angle - expected).abs() < 1e-10);
        assert!((expected.to_degrees() - 19.2049).abs() < 1e-3);
    }

    #[test]
    fn test_retracing_unchanged_inputs_is_identical() {
        // Same emitter, target and index twice; the paths must match to the
        // bit, points and markers alike.
        let cube = Mesh::primitive(Primitive::Cube);
        let direction = Vector::xyz(FRAC_PI_6.sin(), 0.0, FRAC_PI_6.cos());
        let emitter = emitter_at(Vector::xyz(-0.9, 0.0, -3.0), direction);
        let first = trace(&emitter, &cube, &Pose::new(), GLASS_OVER_AIR).unwrap();
        let second = trace(&emitter, &cube, &Pose::new(), GLASS_OVER_AIR).unwrap();
        assert_eq!(first.points(), second.points());
        assert_eq!(first.markers(), second.markers());
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_faces_restore_the_angle() {
        // Through a slab the exit angle equals the entry angle.
        let cube = Mesh::primitive(Primitive::Cube);
        let direction = Vector::xyz(FRAC_PI_6.sin(), 0.0, FRAC_PI_6.cos());
        let emitter = emitter_at(Vector::xyz(-0.9, 0.0, -3.0), direction);
        let path = trace(&emitter, &cube, &Pose::new(), GLASS_OVER_AIR).unwrap();
        let markers = path.markers();
        assert_eq!(markers.len(), 4);
        let inside = (FRAC_PI_6.sin() / GLASS_OVER_AIR).asin();
        assert!((markers[2].angle - inside).abs() < 1e-10);
        assert!((markers[3].angle - FRAC_PI_6).abs() < 1e-10);
        assert_eq!(path.points().len(), 4);
    }

    #[test]
    fn test_miss_extends_ten_units() {
        let cube = Mesh::primitive(Primitive::Cube);
        let emitter = emitter_at(Vector::xyz(5.0, 0.0, -3.0), Vector::xyz(0.0, 0.0, 1.0));
        let path = trace(&emitter, &cube, &Pose::new(), GLASS_OVER_AIR).unwrap();
        assert_eq!(path.points().len(), 2);
        assert!(path.markers().is_empty());
        let end = &path.points()[1];
        assert!((end[2] - 7.0).abs() < 1e-10);
        assert!((end[0] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_posed_target_moves_with_its_origin() {
        // Shift the cube out of the beam's way; the beam must now miss.
        let cube = Mesh::primitive(Primitive::Cube);
        let target_pose = Pose::at(Vector::xyz(10.0, 0.0, 0.0)).unwrap();
        let emitter = emitter_at(Vector::xyz(0.0, 0.0, -5.0), Vector::xyz(0.0, 0.0, 1.0));
        let path = trace(&emitter, &cube, &target_pose, GLASS_OVER_AIR).unwrap();
        assert_eq!(path.points().len(), 2);
    }

    #[test]
    fn test_anchor_offsets_near_intersection() {
        let cube = Mesh::primitive(Primitive::Cube);
        let emitter = emitter_at(Vector::xyz(0.0, 0.0, -5.0), Vector::xyz(0.0, 0.0, 1.0));
        let path = trace(&emitter, &cube, &Pose::new(), GLASS_OVER_AIR).unwrap();
        let entry = &path.points()[1];
        for marker in &path.markers()[..2] {
            let distance = marker.anchor.sub(entry).unwrap().modulus();
            assert!(distance < 2.0 * 0.3 + 1e-9);
        }
    }

    #[test]
    fn test_total_internal_reflection_at_steep_exit() {
        // Critical angle for n = 1.52 is about 41.1 degrees. A prism face
        // met at 45 degrees from inside reflects instead of refracting.
        let critical = (1.0 / GLASS_OVER_AIR).asin();
        assert!(PI / 4.0 > critical);
        let mut path = TracedPath::default();
        // Inside the glass heading up-and-right at 45 degrees toward the
        // face x = 1 with outward normal +x.
        let inside = Vector::xyz((2.0_f64).sqrt() / 2.0, 0.0, (2.0_f64).sqrt() / 2.0);
        let normal = Vector::xyz(1.0, 0.0, 0.0);
        let out = next_vector(
            &inside,
            &normal,
            GLASS_OVER_AIR,
            critical,
            &Vector::xyz(1.0, 0.0, 0.0),
            &mut path,
        )
        .unwrap();
        // Reflection flips the along-normal component and keeps the rest.
        assert!((out[0] + inside[0]).abs() < 1e-10);
        assert!((out[2] - inside[2]).abs() < 1e-10);
        assert_eq!(path.markers().len(), 2);
        assert!((path.markers()[0].angle - PI / 4.0).abs() < 1e-10);
        assert!((path.markers()[1].angle - PI / 4.0).abs() < 1e-10);
    }
}
