//! The interactive scene: entities, selection, camera control and rendering.

use std::f64::consts::PI;

use log::debug;
use rand::Rng;
use slotmap::{Key, KeyData, SlotMap};

use refrakt_geom::{Mesh, Pose, Primitive};
use refrakt_math::{Matrix, Vector};
use refrakt_render::{
    outline_selected, render, DrawItem, Frame, Projection, ProjectionMode, Rgba,
};
use refrakt_trace::{trace, tube_mesh, AngleMarker, TracedPath};

use crate::{MaterialTable, Result, SceneError, MAX_RAY_BOXES};

/// How far from the world origin the camera starts.
const CAMERA_START_DISTANCE: f64 = 6.0;

/// The closest the camera may zoom toward the world origin.
const MIN_CAMERA_DISTANCE: f64 = 3.0;

/// The farthest the camera may zoom from the world origin.
const MAX_CAMERA_DISTANCE: f64 = 100.0;

/// Per-notch zoom factor; each notch toward the origin keeps 80% of the
/// camera's distance.
const ZOOM_STEP: f64 = 0.8;

/// How far from the world origin new ray boxes sit.
const RAY_BOX_DISTANCE: f64 = 5.0;

/// Translucent green of the default target.
const TARGET_COLOR: Rgba = Rgba::new(50, 200, 100, 100);

/// Material index of the default target: soda-lime glass.
const TARGET_START_MATERIAL: usize = 2;

/// Light grey of every ray box.
const RAY_BOX_COLOR: Rgba = Rgba::opaque(200, 200, 200);

/// Red of every light beam.
const BEAM_COLOR: Rgba = Rgba::opaque(200, 20, 20);

/// Beam half-width for a fresh ray box; thickness 3 on the 1 to 10 scale.
const DEFAULT_BEAM_RADIUS: f64 = 0.015;

/// Beam half-width per unit of thickness.
const RADIUS_PER_THICKNESS: f64 = 0.005;

slotmap::new_key_type! {
    /// Stable handle for an entity in a [`Scene`].
    pub struct EntityId;
}

/// The six axis-aligned camera positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    /// Looking along +z from in front of the scene.
    Front,
    /// Looking along -z from behind the scene.
    Back,
    /// Looking along +x from the left.
    Left,
    /// Looking along -x from the right.
    Right,
    /// Looking straight down from above.
    Top,
    /// Looking straight up from below.
    Bottom,
}

enum Entity {
    Target {
        shape: Primitive,
        mesh: Mesh,
        material: usize,
        color: Rgba,
        pose: Pose,
    },
    RayBox {
        pose: Pose,
        mesh: Mesh,
        color: Rgba,
        label: String,
        beam: EntityId,
    },
    Beam {
        pose: Pose,
        mesh: Mesh,
        color: Rgba,
        radius: f64,
        path: TracedPath,
        angles_visible: bool,
    },
}

/// A complete interactive scene.
///
/// Holds the camera, the refracting target, the ray boxes with their light
/// beams, the material table and the current selection. Beams are retraced
/// eagerly: any operation that changes what a beam would do leaves every
/// affected beam's path and geometry up to date when it returns.
pub struct Scene {
    materials: MaterialTable,
    world_material: usize,
    entities: SlotMap<EntityId, Entity>,
    draw_order: Vec<EntityId>,
    camera: Pose,
    target: EntityId,
    selected: Option<EntityId>,
    mode: ProjectionMode,
}

impl Scene {
    /// A scene with the preset materials, the camera six units in front of
    /// the origin and a glass cube target at the origin. No ray boxes yet.
    pub fn new() -> Result<Scene> {
        let camera = Pose::at(Vector::xyz(0.0, 0.0, -CAMERA_START_DISTANCE))?;
        let mut entities = SlotMap::with_key();
        let target = entities.insert(Entity::Target {
            shape: Primitive::Cube,
            mesh: Mesh::primitive(Primitive::Cube),
            material: TARGET_START_MATERIAL,
            color: TARGET_COLOR,
            pose: Pose::new(),
        });
        Ok(Scene {
            materials: MaterialTable::with_presets(),
            world_material: 0,
            entities,
            draw_order: vec![target],
            camera,
            target,
            selected: None,
            mode: ProjectionMode::Perspective,
        })
    }

    fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id).ok_or(SceneError::UnknownEntity)
    }

    // ----- materials -----

    /// The material table.
    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Define a new material and return its index.
    pub fn add_material(&mut self, name: &str, refractive_index: f64) -> usize {
        self.materials.add(name, refractive_index)
    }

    /// The material index of the world surrounding the target.
    pub fn world_material(&self) -> usize {
        self.world_material
    }

    /// Change the surrounding world's material and retrace every beam.
    pub fn set_world_material(&mut self, material: usize) -> Result<()> {
        if !self.materials.contains(material) {
            return Err(SceneError::UnknownMaterial(material));
        }
        self.world_material = material;
        self.retrace_all_beams()
    }

    /// The target's material index.
    pub fn target_material(&self) -> usize {
        match self.entities.get(self.target) {
            Some(Entity::Target { material, .. }) => *material,
            _ => 0,
        }
    }

    /// Change the target's material and retrace every beam.
    pub fn set_target_material(&mut self, material: usize) -> Result<()> {
        if !self.materials.contains(material) {
            return Err(SceneError::UnknownMaterial(material));
        }
        if let Some(Entity::Target { material: m, .. }) = self.entities.get_mut(self.target) {
            *m = material;
        }
        self.retrace_all_beams()
    }

    /// The target's refractive index relative to the surrounding world.
    fn relative_index(&self) -> Result<f64> {
        let target = self.materials.refractive_index(self.target_material())?;
        let world = self.materials.refractive_index(self.world_material)?;
        Ok(target / world)
    }

    // ----- target -----

    /// The target's current primitive shape.
    pub fn target_shape(&self) -> Primitive {
        match self.entities.get(self.target) {
            Some(Entity::Target { shape, .. }) => *shape,
            _ => Primitive::Cube,
        }
    }

    /// Swap the target's geometry for another primitive, keeping its color
    /// and material, and retrace every beam.
    pub fn set_target_shape(&mut self, shape: Primitive) -> Result<()> {
        if let Some(Entity::Target {
            shape: s, mesh, ..
        }) = self.entities.get_mut(self.target)
        {
            *s = shape;
            *mesh = Mesh::primitive(shape);
        }
        self.retrace_all_beams()
    }

    // ----- ray boxes and beams -----

    /// How many ray boxes the scene holds.
    pub fn ray_box_count(&self) -> usize {
        self.entities
            .values()
            .filter(|e| matches!(e, Entity::RayBox { .. }))
            .count()
    }

    /// Add a ray box at a random heading around the target and select it.
    ///
    /// The box appears five units from the origin in the horizontal plane,
    /// aimed at the origin, with a red beam already traced. Fails without
    /// changing the scene once [`MAX_RAY_BOXES`] boxes exist.
    pub fn add_ray_box(&mut self) -> Result<EntityId> {
        let heading = rand::rng().random_range(-PI..PI);
        self.add_ray_box_at_heading(heading)
    }

    /// Add a ray box at a chosen heading around the target and select it.
    pub fn add_ray_box_at_heading(&mut self, heading: f64) -> Result<EntityId> {
        if self.ray_box_count() >= MAX_RAY_BOXES {
            return Err(SceneError::CapacityExceeded);
        }
        let mut pose = Pose::at(Vector::xyz(0.0, 0.0, -RAY_BOX_DISTANCE))?;
        pose.orbit(&Vector::zeros(3), heading, 0.0)?;
        let mut mesh = Mesh::primitive(Primitive::Cube);
        mesh.scale(0.5, 0.5, 0.5);

        let path = self.trace_from(&pose)?;
        let beam_mesh = tube_mesh(&path, &pose, DEFAULT_BEAM_RADIUS)?;
        let beam = self.entities.insert(Entity::Beam {
            pose: pose.clone(),
            mesh: beam_mesh,
            color: BEAM_COLOR,
            radius: DEFAULT_BEAM_RADIUS,
            path,
            angles_visible: true,
        });
        let ray_box = self.entities.insert(Entity::RayBox {
            pose,
            mesh,
            color: RAY_BOX_COLOR,
            label: "Ray box".to_string(),
            beam,
        });
        self.draw_order.push(ray_box);
        self.draw_order.push(beam);
        self.selected = Some(ray_box);
        debug!("added ray box at heading {heading:.3}");
        Ok(ray_box)
    }

    /// Remove a ray box and its beam. Clears the selection.
    pub fn remove_ray_box(&mut self, id: EntityId) -> Result<()> {
        let beam = self.beam_of(id)?;
        self.entities.remove(id);
        self.entities.remove(beam);
        self.draw_order.retain(|&e| e != id && e != beam);
        self.selected = None;
        Ok(())
    }

    fn beam_of(&self, id: EntityId) -> Result<EntityId> {
        match self.entities.get(id) {
            Some(Entity::RayBox { beam, .. }) => Ok(*beam),
            Some(_) => Err(SceneError::NotARayBox),
            None => Err(SceneError::UnknownEntity),
        }
    }

    /// The pose of a ray box.
    pub fn ray_box_pose(&self, id: EntityId) -> Result<&Pose> {
        match self.entity(id)? {
            Entity::RayBox { pose, .. } => Ok(pose),
            _ => Err(SceneError::NotARayBox),
        }
    }

    /// A ray box's label.
    pub fn ray_box_label(&self, id: EntityId) -> Result<&str> {
        match self.entity(id)? {
            Entity::RayBox { label, .. } => Ok(label),
            _ => Err(SceneError::NotARayBox),
        }
    }

    /// Rename a ray box.
    pub fn set_ray_box_label(&mut self, id: EntityId, label: &str) -> Result<()> {
        self.beam_of(id)?;
        if let Some(Entity::RayBox { label: l, .. }) = self.entities.get_mut(id) {
            *l = label.to_string();
        }
        Ok(())
    }

    /// Revolve a ray box about the world origin, carrying its beam along,
    /// and retrace the beam.
    ///
    /// Pitch turns about the horizontal axis perpendicular to the box's
    /// meridian, so it works whichever way the box is facing.
    pub fn orbit_ray_box(&mut self, id: EntityId, heading: f64, pitch: f64) -> Result<()> {
        self.with_ray_box_pose(id, |pose| {
            pose.orbit_upright(&Vector::zeros(3), heading, pitch)?;
            Ok(())
        })
    }

    /// Rotate a ray box about its own origin and retrace its beam.
    pub fn rotate_ray_box(&mut self, id: EntityId, heading: f64, pitch: f64) -> Result<()> {
        self.with_ray_box_pose(id, |pose| {
            pose.rotate_by(heading, pitch)?;
            Ok(())
        })
    }

    /// Shift a ray box by a displacement and retrace its beam.
    pub fn displace_ray_box(&mut self, id: EntityId, displacement: &Vector) -> Result<()> {
        self.with_ray_box_pose(id, |pose| {
            pose.displace(displacement)?;
            Ok(())
        })
    }

    /// Apply `f` to the ray box's pose, mirror the new pose onto its beam
    /// and retrace. A beam shares its ray box's frame so the traced path
    /// maps into the beam's object space consistently.
    fn with_ray_box_pose<F>(&mut self, id: EntityId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Pose) -> Result<()>,
    {
        let beam = self.beam_of(id)?;
        let pose = match self.entities.get_mut(id) {
            Some(Entity::RayBox { pose, .. }) => {
                f(pose)?;
                pose.clone()
            }
            _ => return Err(SceneError::UnknownEntity),
        };
        if let Some(Entity::Beam { pose: p, .. }) = self.entities.get_mut(beam) {
            *p = pose;
        }
        self.retrace_beam(beam)
    }

    /// A beam's thickness on the 1 to 10 scale, keyed by its ray box.
    pub fn beam_thickness(&self, id: EntityId) -> Result<u32> {
        Ok((self.beam_radius(id)? / RADIUS_PER_THICKNESS) as u32)
    }

    /// Set a beam's thickness on the 1 to 10 scale; out-of-range values are
    /// clamped. Only the beam's geometry changes, not its path.
    pub fn set_beam_thickness(&mut self, id: EntityId, thickness: u32) -> Result<()> {
        let radius = thickness.clamp(1, 10) as f64 * RADIUS_PER_THICKNESS;
        let beam = self.beam_of(id)?;
        if let Some(Entity::Beam { radius: r, .. }) = self.entities.get_mut(beam) {
            *r = radius;
        }
        self.rebuild_beam_mesh(beam)
    }

    /// A beam's half-width in world units, keyed by its ray box.
    pub fn beam_radius(&self, id: EntityId) -> Result<f64> {
        let beam = self.beam_of(id)?;
        match self.entity(beam)? {
            Entity::Beam { radius, .. } => Ok(*radius),
            _ => Err(SceneError::UnknownEntity),
        }
    }

    /// Whether a ray box's beam has its angles marked for display.
    pub fn angles_visible(&self, id: EntityId) -> Result<bool> {
        let beam = self.beam_of(id)?;
        match self.entity(beam)? {
            Entity::Beam { angles_visible, .. } => Ok(*angles_visible),
            _ => Err(SceneError::UnknownEntity),
        }
    }

    /// Turn a beam's angle display on or off.
    pub fn set_angles_visible(&mut self, id: EntityId, visible: bool) -> Result<()> {
        let beam = self.beam_of(id)?;
        if let Some(Entity::Beam { angles_visible, .. }) = self.entities.get_mut(beam) {
            *angles_visible = visible;
        }
        Ok(())
    }

    /// A beam's recorded angles with their world-space anchor points, in
    /// travel order, keyed by its ray box.
    pub fn beam_markers(&self, id: EntityId) -> Result<&[AngleMarker]> {
        let beam = self.beam_of(id)?;
        match self.entity(beam)? {
            Entity::Beam { path, .. } => Ok(path.markers()),
            _ => Err(SceneError::UnknownEntity),
        }
    }

    /// The world-space polyline a beam follows, keyed by its ray box.
    pub fn beam_points(&self, id: EntityId) -> Result<&[Vector]> {
        let beam = self.beam_of(id)?;
        match self.entity(beam)? {
            Entity::Beam { path, .. } => Ok(path.points()),
            _ => Err(SceneError::UnknownEntity),
        }
    }

    fn trace_from(&self, emitter: &Pose) -> Result<TracedPath> {
        let relative_index = self.relative_index()?;
        match self.entity(self.target)? {
            Entity::Target { mesh, pose, .. } => {
                Ok(trace(emitter, mesh, pose, relative_index)?)
            }
            _ => Err(SceneError::UnknownEntity),
        }
    }

    /// Retrace one beam's path and rebuild its tube.
    fn retrace_beam(&mut self, beam: EntityId) -> Result<()> {
        let (pose, radius) = match self.entity(beam)? {
            Entity::Beam { pose, radius, .. } => (pose.clone(), *radius),
            _ => return Err(SceneError::UnknownEntity),
        };
        let path = self.trace_from(&pose)?;
        let mesh = tube_mesh(&path, &pose, radius)?;
        if let Some(Entity::Beam { path: p, mesh: m, .. }) = self.entities.get_mut(beam) {
            *p = path;
            *m = mesh;
        }
        Ok(())
    }

    /// Rebuild one beam's tube from its existing path.
    fn rebuild_beam_mesh(&mut self, beam: EntityId) -> Result<()> {
        let (pose, radius, path) = match self.entity(beam)? {
            Entity::Beam {
                pose, radius, path, ..
            } => (pose.clone(), *radius, path.clone()),
            _ => return Err(SceneError::UnknownEntity),
        };
        let mesh = tube_mesh(&path, &pose, radius)?;
        if let Some(Entity::Beam { mesh: m, .. }) = self.entities.get_mut(beam) {
            *m = mesh;
        }
        Ok(())
    }

    fn retrace_all_beams(&mut self) -> Result<()> {
        let beams: Vec<EntityId> = self
            .entities
            .iter()
            .filter_map(|(id, e)| matches!(e, Entity::Beam { .. }).then_some(id))
            .collect();
        for beam in beams {
            self.retrace_beam(beam)?;
        }
        Ok(())
    }

    // ----- selection -----

    /// The selected ray box, if any.
    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Resolve a click against the last rendered frame.
    ///
    /// Clicking a ray box selects it; clicking anything else, including a
    /// beam or the target, empties the selection. Returns the new selection.
    pub fn click(&mut self, frame: &Frame, x: usize, y: usize) -> Option<EntityId> {
        let hit = if x < frame.width() && y < frame.height() {
            frame.id_at(x, y)
        } else {
            None
        };
        self.selected = hit.and_then(|raw| {
            let id = EntityId::from(KeyData::from_ffi(raw));
            match self.entities.get(id) {
                Some(Entity::RayBox { .. }) => Some(id),
                _ => None,
            }
        });
        self.selected
    }

    // ----- camera -----

    /// The camera's pose.
    pub fn camera(&self) -> &Pose {
        &self.camera
    }

    /// Orbit the camera about the world origin. The camera always faces the
    /// origin, so pitch turns about its own horizontal axis.
    pub fn orbit_camera(&mut self, heading: f64, pitch: f64) -> Result<()> {
        Ok(self.camera.orbit(&Vector::zeros(3), heading, pitch)?)
    }

    /// Orbit the camera from a mouse drag across a frame of the given pixel
    /// dimensions. A full-width drag turns half a revolution; a full-height
    /// drag pitches a quarter revolution.
    pub fn drag_orbit(&mut self, dx: i32, dy: i32, width: usize, height: usize) -> Result<()> {
        let heading = PI * dx as f64 / width as f64;
        let pitch = 0.5 * PI * dy as f64 / height as f64;
        self.orbit_camera(heading, pitch)
    }

    /// Move the camera along its line through the origin: each negative
    /// notch takes 20% off the distance, each positive notch puts it back.
    /// The distance is clamped between three and a hundred units.
    pub fn zoom(&mut self, notches: f64) -> Result<()> {
        let mut origin = self.camera.origin().scale(ZOOM_STEP.powf(-notches));
        let distance = origin.modulus();
        if distance < MIN_CAMERA_DISTANCE {
            origin = origin.scale(MIN_CAMERA_DISTANCE / distance);
        } else if distance > MAX_CAMERA_DISTANCE {
            origin = origin.scale(MAX_CAMERA_DISTANCE / distance);
        }
        Ok(self.camera.set_origin(origin)?)
    }

    /// Jump the camera to one of the six axis-aligned views, keeping its
    /// current distance from the origin.
    pub fn set_view(&mut self, preset: ViewPreset) -> Result<()> {
        let distance = self.camera.origin().modulus();
        let (origin, layout) = match preset {
            ViewPreset::Front => (
                Vector::xyz(0.0, 0.0, -distance),
                [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            ),
            ViewPreset::Back => (
                Vector::xyz(0.0, 0.0, distance),
                [-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
            ),
            ViewPreset::Left => (
                Vector::xyz(-distance, 0.0, 0.0),
                [0.0, 0.0, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
            ),
            ViewPreset::Right => (
                Vector::xyz(distance, 0.0, 0.0),
                [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0],
            ),
            ViewPreset::Top => (
                Vector::xyz(0.0, distance, 0.0),
                [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0],
            ),
            ViewPreset::Bottom => (
                Vector::xyz(0.0, -distance, 0.0),
                [1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0],
            ),
        };
        let mut orientation = Matrix::zeros(3, 3);
        orientation.set_elements(&layout)?;
        self.camera.set_origin(origin)?;
        self.camera.set_orientation(orientation)?;
        Ok(())
    }

    /// Whether orthographic projection is in use.
    pub fn is_orthographic(&self) -> bool {
        self.mode == ProjectionMode::Orthographic
    }

    /// Switch between perspective and orthographic projection.
    pub fn toggle_orthographic(&mut self) {
        self.mode = match self.mode {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
    }

    // ----- rendering -----

    /// Render the scene into the frame and outline the selection, if any.
    pub fn render(&self, frame: &mut Frame) -> Result<()> {
        let projection = Projection::new(frame.width(), frame.height(), self.mode);
        let mut items = Vec::with_capacity(self.draw_order.len());
        for &id in &self.draw_order {
            let item = match self.entity(id)? {
                Entity::Target {
                    mesh, color, pose, ..
                } => DrawItem {
                    id: id.data().as_ffi(),
                    mesh,
                    pose,
                    color: *color,
                    flat_shaded: false,
                },
                Entity::RayBox {
                    pose, mesh, color, ..
                } => DrawItem {
                    id: id.data().as_ffi(),
                    mesh,
                    pose,
                    color: *color,
                    flat_shaded: false,
                },
                Entity::Beam {
                    pose, mesh, color, ..
                } => DrawItem {
                    id: id.data().as_ffi(),
                    mesh,
                    pose,
                    color: *color,
                    flat_shaded: true,
                },
            };
            items.push(item);
        }
        render(frame, &projection, &self.camera, &items)?;
        if let Some(selected) = self.selected {
            outline_selected(frame, selected.data().as_ffi());
        }
        Ok(())
    }
}
