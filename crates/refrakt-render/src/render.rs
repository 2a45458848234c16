//! The render pass: projection, culling, shading and rasterization.

use log::debug;
use refrakt_geom::{Mesh, Pose};
use refrakt_math::Vector;

use crate::{Frame, Projection, Result, Rgba, OUTLINE_COLOR};

/// Brightness falloff steepness for translucent faces.
const TRANSLUCENT_FALLOFF: f64 = 262144.0;

/// Brightness falloff steepness for opaque faces.
const OPAQUE_FALLOFF: f64 = 524288.0;

/// One renderable entity: a mesh at a pose with a color.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    /// Opaque identifier written into the frame's id plane.
    pub id: u64,
    /// The geometry, in object space.
    pub mesh: &'a Mesh,
    /// Where the geometry sits in the world.
    pub pose: &'a Pose,
    /// Base color, including alpha.
    pub color: Rgba,
    /// Skip brightness shading; beams render as solid color.
    pub flat_shaded: bool,
}

/// Render the items into the frame from the camera's point of view.
///
/// Items are drawn from last to first, so earlier entries end up in front
/// wherever depths tie. The frame is cleared first.
pub fn render(
    frame: &mut Frame,
    projection: &Projection,
    camera: &Pose,
    items: &[DrawItem<'_>],
) -> Result<()> {
    frame.clear();
    let upright_to_camera = camera.orientation().transpose();
    let camera_distance = camera.origin().modulus();
    debug!("render pass over {} items", items.len());
    for item in items.iter().rev() {
        if !in_view(item, camera, projection, camera_distance)? {
            continue;
        }
        let verts = item.mesh.verts();
        let mut normalized_cache: Vec<Option<Vector>> = vec![None; verts.len()];
        let mut screen_cache: Vec<Option<Vector>> = vec![None; verts.len()];
        for face in item.mesh.faces() {
            for index in face.vertex_indices() {
                if screen_cache[index].is_some() {
                    continue;
                }
                let world = item
                    .pose
                    .orientation()
                    .mul_vector(&verts[index])?
                    .add(item.pose.origin())?;
                let camera_coord =
                    upright_to_camera.mul_vector(&world.sub(camera.origin())?)?;
                let normalized = projection.to_normalized(&camera_coord, camera_distance)?;
                // Screen y is flipped, which also flips face winding.
                let screen = Vector::xyz(
                    (normalized[0] + 1.0) * frame.width() as f64 / 2.0,
                    frame.height() as f64 * (0.5 - normalized[1] * 0.5),
                    normalized[2],
                );
                normalized_cache[index] = Some(normalized);
                screen_cache[index] = Some(screen);
            }
            let [i0, i1, i2] = face.vertex_indices();
            let (p0, p1, p2) = match (&screen_cache[i0], &screen_cache[i1], &screen_cache[i2]) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => continue,
            };
            let normal = p1.sub(p0)?.cross(&p2.sub(p0)?)?.normalized();
            if normal[2] <= 0.0 && !item.color.is_translucent() {
                continue;
            }
            if !(vertex_visible(p0, frame) || vertex_visible(p1, frame) || vertex_visible(p2, frame))
            {
                continue;
            }
            let d = p0.dot(&normal)?;
            let (n0, n1, n2) = match (
                &normalized_cache[i0],
                &normalized_cache[i1],
                &normalized_cache[i2],
            ) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => continue,
            };
            // Shading reads normalized clip space, not screen space.
            let color = face_color(n0, n1, n2, item)?;
            rasterize(frame, p0, p1, p2, &normal, d, color, item.id);
        }
    }
    Ok(())
}

fn vertex_visible(p: &Vector, frame: &Frame) -> bool {
    p[0] >= 0.0
        && p[0] <= frame.width() as f64
        && p[1] >= 0.0
        && p[1] <= frame.height() as f64
        && p[2] >= 0.0
        && p[2] <= 1.0
}

/// Quick accept: true when the bounding box might be visible. A true result
/// does not guarantee any face actually lands on screen.
fn in_view(
    item: &DrawItem<'_>,
    camera: &Pose,
    projection: &Projection,
    camera_distance: f64,
) -> Result<bool> {
    let upright_to_camera = camera.orientation().transpose();
    let bounds = [[-1.0, 1.0], [-1.0, 1.0], [0.0, 1.0]];
    let mut below = [false; 3];
    let mut above = [false; 3];
    let mut span = [false; 3];
    for corner in item.mesh.bounds().corners() {
        let world = item
            .pose
            .orientation()
            .mul_vector(&corner)?
            .add(item.pose.origin())?;
        let camera_coord = upright_to_camera.mul_vector(&world.sub(camera.origin())?)?;
        let normalized = projection.to_normalized(&camera_coord, camera_distance)?;
        for axis in 0..3 {
            if span[axis] {
                continue;
            }
            if normalized[axis] >= bounds[axis][0] {
                if normalized[axis] <= bounds[axis][1] {
                    span[axis] = true;
                } else {
                    above[axis] = true;
                }
            } else {
                below[axis] = true;
            }
            if below[axis] && above[axis] {
                span[axis] = true;
            }
        }
        if span[0] && span[1] && span[2] {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Brightness-shaded face color from how squarely the face points at the
/// camera in normalized clip space. Flat-shaded items keep their color.
fn face_color(n0: &Vector, n1: &Vector, n2: &Vector, item: &DrawItem<'_>) -> Result<Rgba> {
    if item.flat_shaded {
        return Ok(item.color);
    }
    let normal = n1.sub(n0)?.cross(&n2.sub(n0)?)?.normalized();
    let nz = normal[2];
    let brightness = if item.color.is_translucent() {
        if nz < 0.0 {
            // Facing the camera; falloff is steep because nz hugs -1.
            (1.0 - TRANSLUCENT_FALLOFF * (1.0 + nz)).max(0.5)
        } else {
            (-(nz - 1.0)).max(0.2)
        }
    } else {
        let mut b = 1.0 - OPAQUE_FALLOFF * (1.0 + nz);
        // Compress the low end in halving steps so steep faces stay
        // distinguishable instead of crushing to the floor.
        if b < 0.7 {
            b = (b - 0.7) / 2.0 + 0.7;
            if b < 0.6 {
                b = (b - 0.6) / 2.0 + 0.6;
                if b < 0.5 {
                    b = (b - 0.5) / 2.0 + 0.5;
                }
            }
        }
        b.max(0.4)
    };
    Ok(item.color.dimmed(brightness))
}

/// Round half up, as the scanline conversion expects.
fn round(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

#[derive(Clone, Copy)]
struct ScreenEdge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    height: f64,
}

impl ScreenEdge {
    fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> ScreenEdge {
        if y0 < y1 {
            ScreenEdge {
                x0,
                y0,
                x1,
                y1,
                height: y1 - y0,
            }
        } else {
            ScreenEdge {
                x0: x1,
                y0: y1,
                x1: x0,
                y1: y0,
                height: y0 - y1,
            }
        }
    }
}

/// Scanline-fill the triangle, splitting it at its tallest edge.
#[allow(clippy::too_many_arguments)]
fn rasterize(
    frame: &mut Frame,
    p0: &Vector,
    p1: &Vector,
    p2: &Vector,
    normal: &Vector,
    d: f64,
    color: Rgba,
    id: u64,
) {
    let min_depth = p0[2].min(p1[2]).min(p2[2]);
    let edge0 = ScreenEdge::new(p0[0], p0[1], p1[0], p1[1]);
    let edge1 = ScreenEdge::new(p1[0], p1[1], p2[0], p2[1]);
    let edge2 = ScreenEdge::new(p2[0], p2[1], p0[0], p0[1]);
    let mut tall = edge0;
    let mut short0 = edge1;
    let mut short1 = edge2;
    if edge1.height > tall.height {
        tall = edge1;
        short0 = edge0;
    }
    if edge2.height > tall.height {
        tall = edge2;
        short0 = edge0;
        short1 = edge1;
    }
    // short0 spans the lower half of the triangle.
    if tall.y0 != short0.y0 {
        std::mem::swap(&mut short0, &mut short1);
    }

    let mut initial_y = round(tall.y0).max(0);
    let mut final_y = round(short0.y1).min(frame.height() as i64 - 1);
    let dx_tall = (tall.x1 - tall.x0) / tall.height;
    let mut dx_short = (short0.x1 - short0.x0) / short0.height;
    let mut y_skip = initial_y as f64 - tall.y0;
    let mut x_tall = (y_skip + 0.5) * dx_tall + tall.x0;
    let mut x_short = (y_skip + 0.5) * dx_short + short0.x0;
    rasterize_half(
        frame, initial_y, final_y, x_short, x_tall, dx_short, dx_tall, min_depth, normal, d,
        color, id,
    );

    x_tall += dx_tall * (final_y - initial_y) as f64;
    initial_y = final_y;
    final_y = round(short1.y1).min(frame.height() as i64 - 1);
    dx_short = (short1.x1 - short1.x0) / short1.height;
    y_skip = initial_y as f64 - short1.y0;
    x_short = (y_skip + 0.5) * dx_short + short1.x0;
    rasterize_half(
        frame, initial_y, final_y, x_short, x_tall, dx_short, dx_tall, min_depth, normal, d,
        color, id,
    );
}

#[allow(clippy::too_many_arguments)]
fn rasterize_half(
    frame: &mut Frame,
    initial_y: i64,
    final_y: i64,
    mut x_short: f64,
    mut x_tall: f64,
    dx_short: f64,
    dx_tall: f64,
    min_depth: f64,
    normal: &Vector,
    d: f64,
    color: Rgba,
    id: u64,
) {
    for pixel_y in initial_y..final_y {
        let a = round(x_short);
        let b = round(x_tall);
        let (start_x, end_x) = if b <= a { (b, a) } else { (a, b) };
        rasterize_row(
            frame, start_x, end_x, pixel_y, min_depth, normal, d, color, id,
        );
        x_tall += dx_tall;
        x_short += dx_short;
    }
}

#[allow(clippy::too_many_arguments)]
fn rasterize_row(
    frame: &mut Frame,
    start_x: i64,
    end_x: i64,
    pixel_y: i64,
    min_depth: f64,
    normal: &Vector,
    d: f64,
    color: Rgba,
    id: u64,
) {
    if pixel_y < 0 || pixel_y >= frame.height() as i64 {
        return;
    }
    let y = pixel_y as usize;
    for pixel_x in start_x..end_x {
        if pixel_x < 0 || pixel_x >= frame.width() as i64 {
            continue;
        }
        let x = pixel_x as usize;
        if min_depth >= frame.depth_at(x, y) {
            continue;
        }
        // Recover depth at the pixel center from the face plane:
        // p . n = d, solved for the depth component.
        let depth = (d - normal[0] * (pixel_x as f64 + 0.5) - normal[1] * (pixel_y as f64 + 0.5))
            / normal[2];
        if depth < 0.0 {
            continue;
        }
        if depth < frame.depth_at(x, y) {
            frame.set_pixel(x, y, depth, color, id);
        }
    }
}

/// Draw a one-pixel outline wherever the selected entity's pixels border
/// anything else, scanning columns then rows. A post-process over the id
/// plane; the outline never widens the selection itself.
pub fn outline_selected(frame: &mut Frame, selected: u64) {
    let (width, height) = (frame.width(), frame.height());
    for x in 0..width {
        let mut inside = false;
        for y in 0..height {
            let belongs = frame.id_at(x, y) == Some(selected);
            if !inside && belongs {
                if y > 0 {
                    frame.paint_over(x, y - 1, OUTLINE_COLOR);
                }
                inside = true;
            } else if inside && !belongs {
                frame.paint_over(x, y, OUTLINE_COLOR);
                inside = false;
            }
        }
    }
    for y in 0..height {
        let mut inside = false;
        for x in 0..width {
            let belongs = frame.id_at(x, y) == Some(selected);
            if !inside && belongs {
                if x > 0 {
                    frame.paint_over(x - 1, y, OUTLINE_COLOR);
                }
                inside = true;
            } else if inside && !belongs {
                frame.paint_over(x, y, OUTLINE_COLOR);
                inside = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectionMode;
    use refrakt_geom::Primitive;

    fn camera_at_minus_six() -> Pose {
        Pose::at(Vector::xyz(0.0, 0.0, -6.0)).unwrap()
    }

    fn render_cube(color: Rgba) -> Frame {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut frame = Frame::new(100, 100, Rgba::opaque(0, 0, 0));
        let projection = Projection::new(100, 100, ProjectionMode::Perspective);
        let camera = camera_at_minus_six();
        let cube = Mesh::primitive(Primitive::Cube);
        let pose = Pose::new();
        let items = [DrawItem {
            id: 1,
            mesh: &cube,
            pose: &pose,
            color,
            flat_shaded: false,
        }];
        render(&mut frame, &projection, &camera, &items).unwrap();
        frame
    }

    #[test]
    fn test_opaque_cube_fills_center() {
        let frame = render_cube(Rgba::opaque(50, 200, 100));
        assert_eq!(frame.id_at(50, 50), Some(1));
        assert!(frame.depth_at(50, 50) < 1.0);
        // The face squarely toward the camera shades at full brightness.
        assert_eq!(frame.color_at(50, 50), Rgba::opaque(50, 200, 100));
        // Corners stay background.
        assert_eq!(frame.id_at(2, 2), None);
        assert_eq!(frame.color_at(2, 2), Rgba::opaque(0, 0, 0));
    }

    #[test]
    fn test_translucent_cube_blends_but_picks() {
        let frame = render_cube(Rgba::new(50, 200, 100, 100));
        // Blended over black yet still owning depth and id.
        assert_eq!(frame.color_at(50, 50), Rgba::opaque(20, 78, 39));
        assert_eq!(frame.id_at(50, 50), Some(1));
        assert!(frame.depth_at(50, 50) < 1.0);
    }

    #[test]
    fn test_nearer_item_wins_depth() {
        let mut frame = Frame::new(100, 100, Rgba::opaque(0, 0, 0));
        let projection = Projection::new(100, 100, ProjectionMode::Perspective);
        let camera = camera_at_minus_six();
        let cube = Mesh::primitive(Primitive::Cube);
        let mut small = Mesh::primitive(Primitive::Cube);
        small.scale(0.2, 0.2, 0.2);
        let far_pose = Pose::new();
        let near_pose = Pose::at(Vector::xyz(0.0, 0.0, -3.0)).unwrap();
        let items = [
            DrawItem {
                id: 1,
                mesh: &cube,
                pose: &far_pose,
                color: Rgba::opaque(200, 0, 0),
                flat_shaded: false,
            },
            DrawItem {
                id: 2,
                mesh: &small,
                pose: &near_pose,
                color: Rgba::opaque(0, 0, 200),
                flat_shaded: false,
            },
        ];
        render(&mut frame, &projection, &camera, &items).unwrap();
        assert_eq!(frame.id_at(50, 50), Some(2));
    }

    #[test]
    fn test_rasterize_covers_pixel_centers_exactly() {
        let mut frame = Frame::new(16, 16, Rgba::opaque(0, 0, 0));
        // Right triangle in screen space with its vertical edge on the
        // x = 2.5 pixel-center column, its horizontal edge on the y = 2.5
        // center row and the hypotenuse on x + y = 13, at constant depth.
        let p0 = Vector::xyz(2.5, 2.5, 0.4);
        let p1 = Vector::xyz(10.5, 2.5, 0.4);
        let p2 = Vector::xyz(2.5, 10.5, 0.4);
        let normal = Vector::xyz(0.0, 0.0, 1.0);
        rasterize(
            &mut frame,
            &p0,
            &p1,
            &p2,
            &normal,
            0.4,
            Rgba::opaque(200, 0, 0),
            7,
        );
        let mut written = 0;
        for y in 0..16 {
            for x in 0..16 {
                let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
                // Half-up rounding keeps a center sitting on the left or
                // top edge out and takes a center on the right edge in.
                let inside = cx > 2.5 && cy > 2.5 && cx + cy <= 13.0;
                assert_eq!(frame.id_at(x, y) == Some(7), inside, "pixel ({x}, {y})");
                if inside {
                    written += 1;
                    assert!((frame.depth_at(x, y) - 0.4).abs() < 1e-12);
                }
            }
        }
        assert_eq!(written, 28);
    }

    #[test]
    fn test_offscreen_mesh_draws_nothing() {
        let mut frame = Frame::new(80, 80, Rgba::opaque(0, 0, 0));
        let projection = Projection::new(80, 80, ProjectionMode::Perspective);
        let camera = camera_at_minus_six();
        let cube = Mesh::primitive(Primitive::Cube);
        let aside = Pose::at(Vector::xyz(100.0, 0.0, 0.0)).unwrap();
        let behind = Pose::at(Vector::xyz(0.0, 0.0, -20.0)).unwrap();
        for p in [&aside, &behind] {
            let items = [DrawItem {
                id: 1,
                mesh: &cube,
                pose: p,
                color: Rgba::opaque(200, 0, 0),
                flat_shaded: false,
            }];
            render(&mut frame, &projection, &camera, &items).unwrap();
            for y in 0..80 {
                for x in 0..80 {
                    assert_eq!(frame.id_at(x, y), None);
                }
            }
        }
    }

    #[test]
    fn test_outline_rings_the_selection() {
        let mut frame = render_cube(Rgba::opaque(50, 200, 100));
        // Find the cube's top edge in the middle column before outlining.
        let mut top = None;
        for y in 0..100 {
            if frame.id_at(50, y) == Some(1) {
                top = Some(y);
                break;
            }
        }
        let top = top.unwrap();
        assert!(top > 0);
        outline_selected(&mut frame, 1);
        assert_eq!(frame.color_at(50, top - 1), OUTLINE_COLOR);
        // Deep inside the silhouette the fill is untouched.
        assert_eq!(frame.color_at(50, 50), Rgba::opaque(50, 200, 100));
        // Far corners are untouched background.
        assert_eq!(frame.color_at(2, 2), Rgba::opaque(0, 0, 0));
    }

    #[test]
    fn test_outline_ignores_other_ids() {
        let mut frame = render_cube(Rgba::opaque(50, 200, 100));
        outline_selected(&mut frame, 42);
        assert_eq!(frame.color_at(50, 50), Rgba::opaque(50, 200, 100));
        assert_eq!(frame.color_at(2, 2), Rgba::opaque(0, 0, 0));
    }
}
