//! Triangle meshes and primitive generators.

use std::fmt;

use refrakt_math::Vector;

use crate::{GeomError, Result};

/// The shapes the mesh generator knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Cube of side 2.
    Cube,
    /// The cube stretched to double length along x.
    Cuboid,
    /// Prism with an equilateral triangular cross-section, length 2.
    TriangularPrism,
    /// UV sphere of radius 1.
    Sphere,
    /// The sphere squashed along x into a biconvex lens.
    ConvexLens,
    /// The convex lens with its bulges pushed through each other.
    ConcaveLens,
    /// Half a cylinder of radius 1 and height 2, cut along its axis.
    HalfCylinder,
}

impl Primitive {
    /// Parse a primitive from its user-facing name.
    pub fn from_name(name: &str) -> Option<Primitive> {
        match name.trim() {
            "Cube" => Some(Primitive::Cube),
            "Cuboid" => Some(Primitive::Cuboid),
            "Triangular prism" => Some(Primitive::TriangularPrism),
            "Sphere" => Some(Primitive::Sphere),
            "Convex lens" => Some(Primitive::ConvexLens),
            "Concave lens" => Some(Primitive::ConcaveLens),
            "Half-cylinder" => Some(Primitive::HalfCylinder),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Cube => "Cube",
            Primitive::Cuboid => "Cuboid",
            Primitive::TriangularPrism => "Triangular prism",
            Primitive::Sphere => "Sphere",
            Primitive::ConvexLens => "Convex lens",
            Primitive::ConcaveLens => "Concave lens",
            Primitive::HalfCylinder => "Half-cylinder",
        };
        f.write_str(name)
    }
}

/// A triangular face: three vertex indices with the cached face plane.
///
/// Vertices are listed clockwise as seen from outside the solid, so the
/// normal points outward. The plane satisfies `normal . p = plane_d` for
/// every point `p` on the face.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    verts: [usize; 3],
    normal: Vector,
    plane_d: f64,
}

impl Face {
    /// The three vertex indices.
    pub fn vertex_indices(&self) -> [usize; 3] {
        self.verts
    }

    /// The unit outward normal.
    pub fn normal(&self) -> &Vector {
        &self.normal
    }

    /// The plane offset `d` in `normal . p = d`.
    pub fn plane_d(&self) -> f64 {
        self.plane_d
    }
}

/// An axis-aligned bounding box in object space.
#[derive(Debug, Clone, PartialEq)]
pub struct Aabb {
    min: [f64; 3],
    max: [f64; 3],
}

impl Aabb {
    fn of_points(points: &[Vector]) -> Aabb {
        let mut min = [points[0][0], points[0][1], points[0][2]];
        let mut max = min;
        for p in &points[1..] {
            for axis in 0..3 {
                if p[axis] < min[axis] {
                    min[axis] = p[axis];
                } else if p[axis] > max[axis] {
                    max[axis] = p[axis];
                }
            }
        }
        Aabb { min, max }
    }

    /// Per-axis minima.
    pub fn min(&self) -> [f64; 3] {
        self.min
    }

    /// Per-axis maxima.
    pub fn max(&self) -> [f64; 3] {
        self.max
    }

    /// The eight corners, lower face first, x varying fastest.
    pub fn corners(&self) -> [Vector; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vector::xyz(lo[0], lo[1], lo[2]),
            Vector::xyz(hi[0], lo[1], lo[2]),
            Vector::xyz(lo[0], lo[1], hi[2]),
            Vector::xyz(hi[0], lo[1], hi[2]),
            Vector::xyz(lo[0], hi[1], lo[2]),
            Vector::xyz(hi[0], hi[1], lo[2]),
            Vector::xyz(lo[0], hi[1], hi[2]),
            Vector::xyz(hi[0], hi[1], hi[2]),
        ]
    }
}

/// A triangle mesh with cached face planes and bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    verts: Vec<Vector>,
    faces: Vec<Face>,
    bounds: Aabb,
}

impl Mesh {
    /// Build a mesh from vertices and index triples, computing the face
    /// planes and bounding box.
    ///
    /// Every vertex must be 3-D and every index in range. Degenerate faces
    /// are kept with a zero normal; the renderer and tracer both skip them
    /// naturally.
    pub fn from_data(verts: Vec<Vector>, face_indices: Vec<[usize; 3]>) -> Result<Mesh> {
        if face_indices.is_empty() || verts.len() < 3 {
            return Err(GeomError::EmptyMesh);
        }
        for (f, indices) in face_indices.iter().enumerate() {
            for &v in indices {
                if v >= verts.len() {
                    return Err(GeomError::FaceOutOfRange {
                        face: f,
                        vertex: v,
                        vertex_count: verts.len(),
                    });
                }
            }
        }
        let faces = face_indices
            .into_iter()
            .map(|indices| Face {
                normal: face_normal(&verts, indices),
                plane_d: 0.0,
                verts: indices,
            })
            .collect();
        let mut mesh = Mesh {
            bounds: Aabb::of_points(&verts),
            verts,
            faces,
        };
        mesh.recompute_planes();
        Ok(mesh)
    }

    /// Generate one of the built-in shapes.
    pub fn primitive(shape: Primitive) -> Mesh {
        let (mut verts, mut face_indices) = match shape {
            Primitive::Cube | Primitive::Cuboid => cube_data(),
            Primitive::TriangularPrism => prism_data(),
            Primitive::Sphere | Primitive::ConvexLens | Primitive::ConcaveLens => sphere_data(),
            Primitive::HalfCylinder => half_cylinder_data(),
        };
        match shape {
            Primitive::Cuboid => scale_verts(&mut verts, 2.0, 1.0, 1.0),
            Primitive::ConvexLens => scale_verts(&mut verts, 0.6, 2.0, 2.0),
            Primitive::ConcaveLens => {
                scale_verts(&mut verts, 0.6, 2.0, 2.0);
                for v in &mut verts {
                    // Push each bulge through to the other side; vertices on
                    // the central plane stay put.
                    if v[0] < -0.0001 {
                        v[0] += 0.8;
                    } else if v[0] > 0.0001 {
                        v[0] -= 0.8;
                    }
                }
                // The faces are now inside out; reversing the winding points
                // the normals back outward.
                for f in &mut face_indices {
                    f.swap(0, 2);
                }
            }
            _ => {}
        }
        let faces = face_indices
            .into_iter()
            .map(|indices| Face {
                normal: face_normal(&verts, indices),
                plane_d: 0.0,
                verts: indices,
            })
            .collect();
        let mut mesh = Mesh {
            bounds: Aabb::of_points(&verts),
            verts,
            faces,
        };
        mesh.recompute_planes();
        mesh
    }

    /// Stretch the mesh along the object-space axes and refresh the cached
    /// face planes and bounding box.
    pub fn scale(&mut self, sx: f64, sy: f64, sz: f64) {
        scale_verts(&mut self.verts, sx, sy, sz);
        for i in 0..self.faces.len() {
            self.faces[i].normal = face_normal(&self.verts, self.faces[i].verts);
        }
        self.recompute_planes();
        self.bounds = Aabb::of_points(&self.verts);
    }

    fn recompute_planes(&mut self) {
        for face in &mut self.faces {
            // plane_d = n . p for any point p on the face.
            let p0 = &self.verts[face.verts[0]];
            face.plane_d = p0[0] * face.normal[0] + p0[1] * face.normal[1] + p0[2] * face.normal[2];
        }
    }

    /// The vertex positions in object space.
    pub fn verts(&self) -> &[Vector] {
        &self.verts
    }

    /// The faces with their cached planes.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// The object-space bounding box.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}

/// Unit normal of the triangle, pointing toward the side from which its
/// vertices wind clockwise. Degenerate triangles yield the zero vector.
fn face_normal(verts: &[Vector], indices: [usize; 3]) -> Vector {
    let p0 = &verts[indices[0]];
    let p1 = &verts[indices[1]];
    let p2 = &verts[indices[2]];
    let a = Vector::xyz(p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]);
    let b = Vector::xyz(p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]);
    match a.cross(&b) {
        Ok(n) => n.normalized(),
        Err(_) => Vector::zeros(3),
    }
}

fn scale_verts(verts: &mut [Vector], sx: f64, sy: f64, sz: f64) {
    for v in verts {
        v[0] *= sx;
        v[1] *= sy;
        v[2] *= sz;
    }
}

/// Cube of side 2 centered on the origin.
fn cube_data() -> (Vec<Vector>, Vec<[usize; 3]>) {
    let verts = vec![
        Vector::xyz(-1.0, -1.0, -1.0),
        Vector::xyz(1.0, -1.0, -1.0),
        Vector::xyz(-1.0, -1.0, 1.0),
        Vector::xyz(1.0, -1.0, 1.0),
        Vector::xyz(-1.0, 1.0, -1.0),
        Vector::xyz(1.0, 1.0, -1.0),
        Vector::xyz(-1.0, 1.0, 1.0),
        Vector::xyz(1.0, 1.0, 1.0),
    ];
    let faces = vec![
        [0, 3, 2],
        [0, 1, 3],
        [0, 4, 5],
        [0, 5, 1],
        [0, 2, 6],
        [0, 6, 4],
        [2, 7, 6],
        [2, 3, 7],
        [3, 1, 5],
        [3, 5, 7],
        [4, 7, 5],
        [4, 6, 7],
    ];
    (verts, faces)
}

/// Prism whose cross-section is an equilateral triangle of side 2.
fn prism_data() -> (Vec<Vector>, Vec<[usize; 3]>) {
    let half_altitude = (std::f64::consts::PI / 3.0).sin();
    let verts = vec![
        Vector::xyz(-1.0, -half_altitude, -1.0),
        Vector::xyz(0.0, half_altitude, -1.0),
        Vector::xyz(1.0, -half_altitude, -1.0),
        Vector::xyz(-1.0, -half_altitude, 1.0),
        Vector::xyz(0.0, half_altitude, 1.0),
        Vector::xyz(1.0, -half_altitude, 1.0),
    ];
    let faces = vec![
        [0, 1, 2],
        [0, 5, 3],
        [0, 2, 5],
        [0, 3, 4],
        [0, 4, 1],
        [1, 4, 5],
        [1, 5, 2],
        [3, 5, 4],
    ];
    (verts, faces)
}

/// UV sphere of radius 1 with single-vertex pole caps.
///
/// An odd ring count puts the middle of a ring, not a loop of edges, at the
/// equator, which keeps beams from grazing an edge exactly halfway up.
fn sphere_data() -> (Vec<Vector>, Vec<[usize; 3]>) {
    let segments: usize = 14;
    let rings: usize = 15;
    let mut verts = Vec::with_capacity(segments * (rings - 1) + 2);
    let mut faces = Vec::with_capacity(2 * segments * (rings - 1));
    verts.push(Vector::xyz(0.0, -1.0, 0.0));
    for i in 0..segments {
        if i == segments - 1 {
            faces.push([0, i + 1, 1]);
        } else {
            faces.push([0, i + 1, i + 2]);
        }
    }
    let pitch_increment = std::f64::consts::PI / rings as f64;
    let mut pitch = pitch_increment - std::f64::consts::FRAC_PI_2;
    let heading_increment = std::f64::consts::PI * 2.0 / segments as f64;
    let mut heading = -std::f64::consts::PI;
    for r in 0..rings - 1 {
        let y = pitch.sin();
        let radius = pitch.cos();
        for _ in 0..segments {
            verts.push(Vector::xyz(radius * heading.cos(), y, radius * heading.sin()));
            heading += heading_increment;
        }
        if r != rings - 2 {
            // Stitch this ring to the next with two coplanar triangles per
            // segment, wrapping at the seam.
            for i in 0..segments {
                let base = segments * r + i + 1;
                if i == segments - 1 {
                    faces.push([base, base + segments, segments * r + 1 + segments]);
                    faces.push([base, segments * r + 1 + segments, segments * r + 1]);
                } else {
                    faces.push([base, base + segments, base + segments + 1]);
                    faces.push([base, base + segments + 1, base + 1]);
                }
            }
        }
        pitch += pitch_increment;
    }
    verts.push(Vector::xyz(0.0, 1.0, 0.0));
    let top = segments * (rings - 1) + 1;
    for i in 0..segments {
        let base = segments * (rings - 2) + 1 + i;
        if i == segments - 1 {
            faces.push([base, top, segments * (rings - 2) + 1]);
        } else {
            faces.push([base, top, base + 1]);
        }
    }
    (verts, faces)
}

/// Half a cylinder of radius 1 and height 2, cut along the vertical plane.
fn half_cylinder_data() -> (Vec<Vector>, Vec<[usize; 3]>) {
    let segments: usize = 32;
    let mut verts = vec![Vector::zeros(3); segments * 2];
    let mut faces = Vec::with_capacity(4 * segments - 4);
    let heading_increment = std::f64::consts::PI / (segments - 1) as f64;
    let mut heading = 0.0_f64;
    for s in 0..segments {
        let x = heading.cos();
        let z = heading.sin();
        verts[s] = Vector::xyz(x, -1.0, z);
        verts[s + segments] = Vector::xyz(x, 1.0, z);
        heading += heading_increment;
    }
    // Vertical strips approximating the curved surface.
    for i in 0..segments - 1 {
        faces.push([i, i + segments, i + segments + 1]);
        faces.push([i, i + segments + 1, i + 1]);
    }
    // Fans for the bottom and top semicircles.
    for i in 0..segments - 2 {
        faces.push([0, i + 1, i + 2]);
    }
    for i in 0..segments - 2 {
        faces.push([segments, segments + i + 2, segments + i + 1]);
    }
    // The flat rectangular cut face.
    faces.push([0, segments * 2 - 1, segments]);
    faces.push([0, segments - 1, segments * 2 - 1]);
    (verts, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centroid(mesh: &Mesh, face: &Face) -> Vector {
        let [a, b, c] = face.vertex_indices();
        let (va, vb, vc) = (&mesh.verts()[a], &mesh.verts()[b], &mesh.verts()[c]);
        Vector::xyz(
            (va[0] + vb[0] + vc[0]) / 3.0,
            (va[1] + vb[1] + vc[1]) / 3.0,
            (va[2] + vb[2] + vc[2]) / 3.0,
        )
    }

    #[test]
    fn test_cube_counts_and_bounds() {
        let cube = Mesh::primitive(Primitive::Cube);
        assert_eq!(cube.verts().len(), 8);
        assert_eq!(cube.faces().len(), 12);
        assert_eq!(cube.bounds().min(), [-1.0, -1.0, -1.0]);
        assert_eq!(cube.bounds().max(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let cube = Mesh::primitive(Primitive::Cube);
        for face in cube.faces() {
            let c = centroid(&cube, face);
            let outward = c.dot(face.normal()).unwrap();
            assert!(outward > 0.0, "inward-facing normal on {:?}", face);
            assert!(face.normal().is_normalized());
        }
    }

    #[test]
    fn test_cube_plane_offsets() {
        // Every face of the unit-2 cube lies in a plane one unit from the
        // center along an axis.
        let cube = Mesh::primitive(Primitive::Cube);
        for face in cube.faces() {
            assert!((face.plane_d() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cuboid_stretches_x() {
        let cuboid = Mesh::primitive(Primitive::Cuboid);
        assert_eq!(cuboid.bounds().min(), [-2.0, -1.0, -1.0]);
        assert_eq!(cuboid.bounds().max(), [2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sphere_counts() {
        let sphere = Mesh::primitive(Primitive::Sphere);
        assert_eq!(sphere.verts().len(), 14 * 14 + 2);
        assert_eq!(sphere.faces().len(), 2 * 14 * 14);
        for v in sphere.verts() {
            assert!((v.modulus() - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let sphere = Mesh::primitive(Primitive::Sphere);
        for face in sphere.faces() {
            let c = centroid(&sphere, face);
            assert!(c.dot(face.normal()).unwrap() > 0.0);
        }
    }

    #[test]
    fn test_concave_lens_normals_point_outward() {
        // The lens construction turns the sphere inside out, so the winding
        // reversal has to bring the normals back outward along x.
        let lens = Mesh::primitive(Primitive::ConcaveLens);
        assert_eq!(lens.faces().len(), 2 * 14 * 14);
        let mut saw_left = false;
        for face in lens.faces() {
            let c = centroid(&lens, face);
            if c[0] < -0.05 {
                saw_left = true;
                assert!(face.normal()[0] < 0.0, "left-side normal points right");
            }
        }
        assert!(saw_left);
    }

    #[test]
    fn test_half_cylinder_counts() {
        let half = Mesh::primitive(Primitive::HalfCylinder);
        assert_eq!(half.verts().len(), 64);
        assert_eq!(half.faces().len(), 4 * 32 - 4);
        assert_eq!(half.bounds().min(), [-1.0, -1.0, 0.0]);
        assert_eq!(half.bounds().max(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_prism_counts() {
        let prism = Mesh::primitive(Primitive::TriangularPrism);
        assert_eq!(prism.verts().len(), 6);
        assert_eq!(prism.faces().len(), 8);
    }

    #[test]
    fn test_scale_refreshes_planes_and_bounds() {
        let mut cube = Mesh::primitive(Primitive::Cube);
        cube.scale(0.5, 0.5, 0.5);
        assert_eq!(cube.bounds().max(), [0.5, 0.5, 0.5]);
        for face in cube.faces() {
            assert!((face.plane_d() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_from_data_validates_indices() {
        let verts = vec![
            Vector::xyz(0.0, 0.0, 0.0),
            Vector::xyz(1.0, 0.0, 0.0),
            Vector::xyz(0.0, 1.0, 0.0),
        ];
        assert!(Mesh::from_data(verts.clone(), vec![[0, 1, 3]]).is_err());
        assert!(Mesh::from_data(verts, vec![[0, 1, 2]]).is_ok());
    }

    #[test]
    fn test_primitive_names_roundtrip() {
        for shape in [
            Primitive::Cube,
            Primitive::Cuboid,
            Primitive::TriangularPrism,
            Primitive::Sphere,
            Primitive::ConvexLens,
            Primitive::ConcaveLens,
            Primitive::HalfCylinder,
        ] {
            assert_eq!(Primitive::from_name(&shape.to_string()), Some(shape));
        }
        assert_eq!(Primitive::from_name("Dodecahedron"), None);
    }
}
