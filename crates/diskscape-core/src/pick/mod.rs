//! Ray picking against the laid-out tree.
//!
//! A ray is intersected with each candidate node's bounding box first; only
//! on a box hit is the (smaller) block tested. Nodes rejected by the
//! visibility filter, and nodes whose box the ray misses, are skipped along
//! with their entire subtree by advancing to the next non-descendant. The
//! winner is the visible node whose block intersection lies closest to the
//! ray origin in front of the camera.

use crate::config::VisualizationOptions;
use crate::model::{Block, Point3, VizBlock};
use crate::tree::{NodeId, Tree};

/// Margin of error shared by the parallel-ray rejection, the plane-distance
/// test, and the face-extent checks.
const EPSILON: f64 = 1e-4;

/// A ray with unit-length direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    origin: Point3,
    direction: Point3,
}

impl Ray {
    /// Construct a ray. A zero-length direction is a programmer error.
    pub fn new(origin: Point3, direction: Point3) -> Self {
        debug_assert!(
            direction.length() > 0.0,
            "ray direction must not be the zero vector"
        );
        Self {
            origin,
            direction: direction.normalized(),
        }
    }

    #[inline]
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Point3 {
        self.direction
    }
}

/// The camera half-space test used to discard hits behind the viewer.
pub trait Camera {
    fn is_in_front(&self, point: Point3) -> bool;
}

/// A minimal camera: a position and a forward direction.
#[derive(Clone, Copy, Debug)]
pub struct Viewpoint {
    pub position: Point3,
    pub forward: Point3,
}

impl Camera for Viewpoint {
    fn is_in_front(&self, point: Point3) -> bool {
        (point - self.position).dot(self.forward) > 0.0
    }
}

/// Find the visible node whose block is hit nearest the ray origin.
pub fn find_nearest_intersection(
    tree: &Tree<VizBlock>,
    camera: &dyn Camera,
    ray: Ray,
    options: &VisualizationOptions,
) -> Option<NodeId> {
    let mut nearest: Option<(f64, NodeId)> = None;

    let mut current = Some(tree.root());
    while let Some(id) = current {
        let data = tree.data(id);

        if !options.is_visible(&data.file) {
            current = next_non_descendant(tree, id);
            continue;
        }

        if intersect_block(ray, &data.bounds).is_none() {
            current = next_non_descendant(tree, id);
            continue;
        }

        if let Some(hit) = intersect_block(ray, &data.block) {
            if camera.is_in_front(hit) {
                let distance = ray.origin().distance_to(hit);
                if nearest.map_or(true, |(best, _)| distance < best) {
                    nearest = Some((distance, id));
                }
            }
        }

        current = match tree.node(id).first_child() {
            Some(child) => Some(child),
            None => next_non_descendant(tree, id),
        };
    }

    nearest.map(|(_, id)| id)
}

/// Step to the next node in pre-order that is not a descendant of `id`.
fn next_non_descendant(tree: &Tree<VizBlock>, mut id: NodeId) -> Option<NodeId> {
    loop {
        if let Some(sibling) = tree.node(id).next_sibling() {
            return Some(sibling);
        }
        id = tree.node(id).parent()?;
    }
}

/// Where the ray pierces the plane through `point_on_plane` with `normal`,
/// if it does so at a non-degenerate angle and distance.
fn intersect_plane(ray: Ray, point_on_plane: Point3, normal: Point3) -> Option<Point3> {
    let denominator = ray.direction().dot(normal);
    if denominator.abs() < EPSILON {
        return None;
    }

    let numerator = (point_on_plane - ray.origin()).dot(normal);
    let scalar = numerator / denominator;
    if scalar.abs() < EPSILON {
        return None;
    }

    Some(ray.origin() + ray.direction() * scalar)
}

/// Intersect the ray with the five visible faces of `block` (the bottom is
/// never seen), returning the face hit closest to the ray origin.
pub fn intersect_block(ray: Ray, block: &Block) -> Option<Point3> {
    let origin = block.origin();
    let width = block.width();
    let height = block.height();
    let depth = block.depth();

    let x_range = (origin.x - EPSILON, origin.x + width + EPSILON);
    let y_range = (origin.y - EPSILON, origin.y + height + EPSILON);
    let z_range = (origin.z - depth - EPSILON, origin.z + EPSILON);

    let mut closest: Option<(f64, Point3)> = None;
    let mut consider = |hit: Point3| {
        let distance = ray.origin().distance_to(hit);
        if closest.map_or(true, |(best, _)| distance < best) {
            closest = Some((distance, hit));
        }
    };

    // Top face (+y).
    if let Some(hit) = intersect_plane(
        ray,
        origin + Point3::new(0.0, height, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ) {
        if in_range(hit.x, x_range) && in_range(hit.z, z_range) {
            consider(hit);
        }
    }

    // Front face (+z).
    if let Some(hit) = intersect_plane(ray, origin, Point3::new(0.0, 0.0, 1.0)) {
        if in_range(hit.x, x_range) && in_range(hit.y, y_range) {
            consider(hit);
        }
    }

    // Back face (−z).
    if let Some(hit) = intersect_plane(
        ray,
        origin + Point3::new(0.0, 0.0, -depth),
        Point3::new(0.0, 0.0, -1.0),
    ) {
        if in_range(hit.x, x_range) && in_range(hit.y, y_range) {
            consider(hit);
        }
    }

    // Left face (−x).
    if let Some(hit) = intersect_plane(ray, origin, Point3::new(-1.0, 0.0, 0.0)) {
        if in_range(hit.z, z_range) && in_range(hit.y, y_range) {
            consider(hit);
        }
    }

    // Right face (+x).
    if let Some(hit) = intersect_plane(
        ray,
        origin + Point3::new(width, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
    ) {
        if in_range(hit.z, z_range) && in_range(hit.y, y_range) {
            consider(hit);
        }
    }

    closest.map(|(_, hit)| hit)
}

#[inline]
fn in_range(value: f64, (low, high): (f64, f64)) -> bool {
    value >= low && value <= high
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;
    use crate::model::FileRecord;

    fn build_small_scene() -> Tree<VizBlock> {
        let mut root_record = FileRecord::directory("root");
        root_record.size_bytes = 200;
        let mut tree = Tree::new(VizBlock::new(root_record));
        let root = tree.root();
        tree.append_child(root, VizBlock::new(FileRecord::regular("a.bin", 100)));
        tree.append_child(root, VizBlock::new(FileRecord::regular("b.bin", 50)));
        tree.append_child(root, VizBlock::new(FileRecord::regular("c.bin", 50)));

        layout::parse(&mut tree);
        layout::bounds::update_bounding_boxes(&mut tree);
        tree
    }

    fn overhead_camera() -> Viewpoint {
        Viewpoint {
            position: Point3::new(500.0, 100.0, -500.0),
            forward: Point3::new(0.0, -1.0, 0.0),
        }
    }

    #[test]
    fn test_block_top_face_hit() {
        let block = Block::new(Point3::ORIGIN, 10.0, 2.0, 10.0);
        let ray = Ray::new(Point3::new(5.0, 50.0, -5.0), Point3::new(0.0, -1.0, 0.0));

        let hit = intersect_block(ray, &block).expect("ray should hit the top face");
        assert!((hit.y - 2.0).abs() < 1e-9);
        assert!((hit.x - 5.0).abs() < 1e-9);
        assert!((hit.z + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_front_face_hit() {
        let block = Block::new(Point3::ORIGIN, 10.0, 2.0, 10.0);
        let ray = Ray::new(Point3::new(5.0, 1.0, 20.0), Point3::new(0.0, 0.0, -1.0));

        let hit = intersect_block(ray, &block).expect("ray should hit the front face");
        assert!(hit.z.abs() < 1e-9);
    }

    #[test]
    fn test_block_miss() {
        let block = Block::new(Point3::ORIGIN, 10.0, 2.0, 10.0);
        let ray = Ray::new(Point3::new(50.0, 1.0, -5.0), Point3::new(0.0, 0.0, -1.0));
        assert!(intersect_block(ray, &block).is_none());
    }

    #[test]
    fn test_parallel_ray_rejected() {
        let block = Block::new(Point3::ORIGIN, 10.0, 2.0, 10.0);
        // Grazing along the top face plane.
        let ray = Ray::new(Point3::new(-5.0, 2.0, -5.0), Point3::new(1.0, 0.0, 0.0));
        // Side faces can still be hit, but the hit must come from a
        // perpendicular plane, never the parallel top one.
        if let Some(hit) = intersect_block(ray, &block) {
            assert!(hit.x.abs() < 1e-6 || (hit.x - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_select_topmost_block_under_ray() {
        let tree = build_small_scene();
        let camera = overhead_camera();
        let options = VisualizationOptions::default();

        // Aim straight down at the center of the largest child's block.
        let target = tree
            .children(tree.root())
            .max_by_key(|&id| tree.data(id).file.size_bytes)
            .unwrap();
        let block = &tree.data(target).block;
        let center = block.origin()
            + Point3::new(block.width() / 2.0, 0.0, -block.depth() / 2.0);
        let ray = Ray::new(
            Point3::new(center.x, 50.0, center.z),
            Point3::new(0.0, -1.0, 0.0),
        );

        // The child sits on top of the root, so it is hit first.
        let picked = find_nearest_intersection(&tree, &camera, ray, &options);
        assert_eq!(picked, Some(target));
    }

    #[test]
    fn test_ray_through_padding_gap_falls_to_parent() {
        let tree = build_small_scene();
        let camera = overhead_camera();
        let options = VisualizationOptions::default();

        // Sibling blocks are separated by padding; a ray down the gap
        // reaches the parent's own top face instead.
        let ray = Ray::new(Point3::new(500.0, 50.0, -500.0), Point3::new(0.0, -1.0, 0.0));
        let picked = find_nearest_intersection(&tree, &camera, ray, &options);
        assert_eq!(picked, Some(tree.root()));
    }

    #[test]
    fn test_select_miss_returns_none() {
        let tree = build_small_scene();
        let ray = Ray::new(Point3::new(2000.0, 50.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let camera = Viewpoint {
            position: Point3::new(2000.0, 50.0, 0.0),
            forward: Point3::new(1.0, 0.0, 0.0),
        };

        let options = VisualizationOptions::default();
        assert!(find_nearest_intersection(&tree, &camera, ray, &options).is_none());
    }

    #[test]
    fn test_select_is_idempotent() {
        let tree = build_small_scene();
        let ray = Ray::new(Point3::new(500.0, 50.0, -500.0), Point3::new(0.0, -1.0, 0.0));
        let camera = overhead_camera();
        let options = VisualizationOptions::default();

        let first = find_nearest_intersection(&tree, &camera, ray, &options);
        let second = find_nearest_intersection(&tree, &camera, ray, &options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_hides_small_files_from_picking() {
        let tree = build_small_scene();
        let camera = overhead_camera();

        // Aim at one of the 50-byte blocks specifically.
        let target = tree
            .children(tree.root())
            .find(|&id| tree.data(id).file.size_bytes == 50)
            .unwrap();
        let block = &tree.data(target).block;
        let center = block.origin()
            + Point3::new(block.width() / 2.0, 0.0, -block.depth() / 2.0);
        let ray = Ray::new(
            Point3::new(center.x, 50.0, center.z),
            Point3::new(0.0, -1.0, 0.0),
        );

        let permissive = VisualizationOptions::default();
        assert_eq!(
            find_nearest_intersection(&tree, &camera, ray, &permissive),
            Some(target)
        );

        // With a 64-byte floor the 50-byte blocks disappear; the ray now
        // falls through to the root block below.
        let strict = VisualizationOptions {
            minimum_file_size: 64,
            only_show_directories: false,
        };
        let picked = find_nearest_intersection(&tree, &camera, ray, &strict);
        assert_eq!(picked, Some(tree.root()));
    }

    #[test]
    fn test_hits_behind_camera_are_ignored() {
        let tree = build_small_scene();
        let ray = Ray::new(Point3::new(500.0, 50.0, -500.0), Point3::new(0.0, -1.0, 0.0));
        // Camera facing straight up: everything below it is "behind".
        let camera = Viewpoint {
            position: Point3::new(500.0, 100.0, -500.0),
            forward: Point3::new(0.0, 1.0, 0.0),
        };

        let options = VisualizationOptions::default();
        assert!(find_nearest_intersection(&tree, &camera, ray, &options).is_none());
    }
}
