//! Squarified treemap layout.
//!
//! Assigns every node of the visualization tree an axis-aligned block on
//! the top face of its parent, with ground area proportional to its share
//! of the parent's bytes. Siblings are packed into rows by the classical
//! squarified greedy (Bruls, Huizing, van Wijk 2000): a child joins the
//! current row only while doing so does not worsen the row's worst aspect
//! ratio against the shorter edge of the remaining area.
//!
//! All geometry is `f64`. Layout is only recomputed by an explicit call to
//! [`parse`] — filesystem events mutate sizes, never block coordinates.

pub mod bounds;

use crate::model::{Block, Point3, VizBlock};
use crate::tree::{NodeId, Tree};

/// Height of every block.
pub const BLOCK_HEIGHT: f64 = 2.0;
/// Width of the root block, along +x.
pub const ROOT_BLOCK_WIDTH: f64 = 1000.0;
/// Depth of the root block, along −z.
pub const ROOT_BLOCK_DEPTH: f64 = 1000.0;

/// Fraction of the short axis a block keeps when padding is ratio-based.
const PADDING_RATIO: f64 = 0.9;
/// Upper bound on any single padding gap.
const MAX_PADDING: f64 = 0.75;

/// Lay out the entire tree.
///
/// Children are sorted descending by size first (row building requires it),
/// the root receives the fixed world block at the origin, and every level
/// below is squarified recursively.
pub fn parse(tree: &mut Tree<VizBlock>) {
    sort_by_descending_size(tree);

    let root = tree.root();
    tree.data_mut(root).block = Block::new(
        Point3::ORIGIN,
        ROOT_BLOCK_WIDTH,
        BLOCK_HEIGHT,
        ROOT_BLOCK_DEPTH,
    );

    squarify_recursively(tree, root);
}

/// Sort every node's children so the largest comes first.
fn sort_by_descending_size(tree: &mut Tree<VizBlock>) {
    let ids: Vec<NodeId> = tree.pre_order(tree.root()).collect();
    for id in ids {
        tree.sort_children_by(id, |a, b| b.file.size_bytes.cmp(&a.file.size_bytes));
    }
}

fn squarify_recursively(tree: &mut Tree<VizBlock>, parent: NodeId) {
    let children: Vec<NodeId> = tree.children(parent).collect();
    if children.is_empty() {
        return;
    }

    squarify_and_layout_rows(tree, parent, &children);

    for child in children {
        squarify_recursively(tree, child);
    }
}

/// Greedily partition `children` (pre-sorted descending) into rows and lay
/// each row out on the parent's top face.
fn squarify_and_layout_rows(tree: &mut Tree<VizBlock>, parent: NodeId, children: &[NodeId]) {
    debug_assert!(tree.data(parent).block.has_volume());

    let mut row: Vec<NodeId> = Vec::with_capacity(children.len());
    let mut shortest_edge = shortest_edge_of_remaining_bounds(&tree.data(parent).block);
    debug_assert!(shortest_edge > 0.0);

    for &child in children {
        let candidate_size = tree.data(child).file.size_bytes;

        let ratio_with = worst_aspect_ratio(tree, &row, candidate_size, parent, shortest_edge);
        let ratio_without = worst_aspect_ratio(tree, &row, 0, parent, shortest_edge);

        if ratio_with <= ratio_without {
            row.push(child);
        } else {
            layout_row(tree, parent, &row);
            row.clear();
            row.push(child);

            shortest_edge = shortest_edge_of_remaining_bounds(&tree.data(parent).block);
            debug_assert!(shortest_edge > 0.0);
        }
    }

    if !row.is_empty() {
        layout_row(tree, parent, &row);
    }
}

/// The sub-rectangle of `block`'s top face not yet covered by placed rows.
///
/// Spans from the next-row marker to the far corner of the top face. Width
/// and depth are normalized positive.
fn remaining_area(block: &Block) -> Block {
    let near = block.next_row_origin();
    let far_corner = block.next_child_origin() + Point3::new(block.width(), 0.0, -block.depth());

    Block::new(
        near,
        far_corner.x - near.x,
        BLOCK_HEIGHT,
        near.z - far_corner.z,
    )
}

fn shortest_edge_of_remaining_bounds(block: &Block) -> f64 {
    let remaining = remaining_area(block);
    remaining.width().min(remaining.depth())
}

/// Total bytes of the row plus an optional candidate.
fn bytes_in_row(tree: &Tree<VizBlock>, row: &[NodeId], candidate_size: u64) -> u64 {
    row.iter()
        .map(|&id| tree.data(id).file.size_bytes)
        .sum::<u64>()
        + candidate_size
}

/// The rectangle a row of `row_bytes` bytes would occupy inside the
/// remaining area, oriented along the longer remaining edge. When
/// `advance_row_marker` is set, the parent's next-row marker is pushed past
/// the rectangle, committing it.
fn calculate_row_bounds(
    tree: &mut Tree<VizBlock>,
    parent: NodeId,
    row_bytes: u64,
    advance_row_marker: bool,
) -> Block {
    let parent_data = tree.data(parent);
    let parent_block = parent_data.block;
    debug_assert!(parent_block.has_volume());

    let remaining = remaining_area(&parent_block);

    let parent_area = parent_block.width() * parent_block.depth();
    let remaining_fraction = (remaining.width() * remaining.depth()) / parent_area;
    let remaining_bytes = remaining_fraction * parent_data.file.size_bytes as f64;
    let row_to_parent_ratio = row_bytes as f64 / remaining_bytes;

    let near = parent_block.next_row_origin();

    let row_bounds = if remaining.width() > remaining.depth() {
        let bounds = Block::new(
            near,
            remaining.width() * row_to_parent_ratio,
            BLOCK_HEIGHT,
            remaining.depth(),
        );
        if advance_row_marker {
            tree.data_mut(parent)
                .block
                .set_next_row_origin(near + Point3::new(bounds.width(), 0.0, 0.0));
        }
        bounds
    } else {
        let bounds = Block::new(
            near,
            remaining.width(),
            BLOCK_HEIGHT,
            remaining.depth() * row_to_parent_ratio,
        );
        if advance_row_marker {
            tree.data_mut(parent)
                .block
                .set_next_row_origin(near + Point3::new(0.0, 0.0, -bounds.depth()));
        }
        bounds
    };

    debug_assert!(row_bounds.has_volume());
    row_bounds
}

/// Worst aspect ratio across the row if it were closed now with
/// `candidate_size` added (pass 0 to evaluate the row as-is).
fn worst_aspect_ratio(
    tree: &mut Tree<VizBlock>,
    row: &[NodeId],
    candidate_size: u64,
    parent: NodeId,
    shortest_edge: f64,
) -> f64 {
    if row.is_empty() && candidate_size == 0 {
        return f64::MAX;
    }

    // The row is sorted descending, so its extremes are at the ends.
    let first_in_row = row.first().map(|&id| tree.data(id).file.size_bytes);
    let last_in_row = row.last().map(|&id| tree.data(id).file.size_bytes);

    let largest_bytes = match first_in_row {
        Some(first) => first.max(candidate_size),
        None => candidate_size,
    };
    let smallest_bytes = match last_in_row {
        Some(last) if candidate_size > 0 => last.min(candidate_size),
        Some(last) => last,
        None => candidate_size,
    };
    debug_assert!(largest_bytes > 0);
    debug_assert!(smallest_bytes > 0);

    let row_bytes = bytes_in_row(tree, row, candidate_size);
    let row_bounds = calculate_row_bounds(tree, parent, row_bytes, false);
    let total_row_area = row_bounds.width() * row_bounds.depth();
    debug_assert!(total_row_area > 0.0);

    let largest_area = largest_bytes as f64 / row_bytes as f64 * total_row_area;
    let smallest_area = smallest_bytes as f64 / row_bytes as f64 * total_row_area;

    let edge_squared = shortest_edge * shortest_edge;
    let area_squared = total_row_area * total_row_area;

    f64::max(
        (edge_squared * largest_area) / area_squared,
        area_squared / (edge_squared * smallest_area),
    )
}

/// Commit a row: claim its rectangle from the remaining area, then slice it
/// perpendicular to its long side, one child at a time.
fn layout_row(tree: &mut Tree<VizBlock>, parent: NodeId, row: &[NodeId]) {
    debug_assert!(!row.is_empty(), "cannot lay out an empty row");

    let row_bytes = bytes_in_row(tree, row, 0);
    let mut land = calculate_row_bounds(tree, parent, row_bytes, true);
    debug_assert!(land.has_volume());

    let node_count = row.len();

    for &child in row {
        let child_bytes = tree.data(child).file.size_bytes;
        debug_assert!(child_bytes > 0, "layout requires pruned, non-zero sizes");

        let share_of_row = child_bytes as f64 / row_bytes as f64;

        let (block, additional_coverage) = if land.width() > land.depth() {
            slice_perpendicular_to_width(&land, share_of_row, node_count)
        } else {
            slice_perpendicular_to_depth(&land, share_of_row, node_count)
        };

        debug_assert!(additional_coverage > 0.0);
        debug_assert!(block.has_volume());

        tree.data_mut(child).block = block;
        land.add_coverage(additional_coverage);
    }
}

/// Slice a child off the row along +x. The long axis is width; depth is the
/// padded short axis.
fn slice_perpendicular_to_width(land: &Block, share_of_row: f64, node_count: usize) -> (Block, f64) {
    let available_width = land.width();
    let available_depth = land.depth();

    let width_plus_padding = available_width * share_of_row;
    let ratio_based_padding = ((available_width * 0.1) / node_count as f64) / 2.0;

    let mut width_padding = ratio_based_padding.min(MAX_PADDING);
    let mut final_width = width_plus_padding - 2.0 * width_padding;
    if final_width <= 0.0 {
        // Padding would consume the slice; shrink it symmetrically instead.
        final_width = width_plus_padding * PADDING_RATIO;
        width_padding = width_plus_padding * (1.0 - PADDING_RATIO) / 2.0;
    }

    let trimmed_depth = available_depth * PADDING_RATIO;
    let depth_padding = ((available_depth - trimmed_depth) / 2.0).min(MAX_PADDING);
    let final_depth = if depth_padding == MAX_PADDING {
        available_depth - 2.0 * MAX_PADDING
    } else {
        trimmed_depth
    };

    let offset = Point3::new(
        available_width * land.coverage() + width_padding,
        0.0,
        -depth_padding,
    );

    let block = Block::new(
        land.origin() + offset,
        final_width,
        BLOCK_HEIGHT,
        final_depth,
    );
    (block, width_plus_padding / available_width)
}

/// Slice a child off the row along −z. The long axis is depth; width is the
/// padded short axis.
fn slice_perpendicular_to_depth(land: &Block, share_of_row: f64, node_count: usize) -> (Block, f64) {
    let available_width = land.width();
    let available_depth = land.depth();

    let depth_plus_padding = available_depth * share_of_row;
    let ratio_based_padding = ((available_depth * 0.1) / node_count as f64) / 2.0;

    let mut depth_padding = ratio_based_padding.min(MAX_PADDING);
    let mut final_depth = depth_plus_padding - 2.0 * depth_padding;
    if final_depth <= 0.0 {
        final_depth = depth_plus_padding * PADDING_RATIO;
        depth_padding = depth_plus_padding * (1.0 - PADDING_RATIO) / 2.0;
    }

    let trimmed_width = available_width * PADDING_RATIO;
    let width_padding = ((available_width - trimmed_width) / 2.0).min(MAX_PADDING);
    let final_width = if width_padding == MAX_PADDING {
        available_width - 2.0 * MAX_PADDING
    } else {
        trimmed_width
    };

    let offset = Point3::new(
        width_padding,
        0.0,
        -(available_depth * land.coverage()) - depth_padding,
    );

    let block = Block::new(
        land.origin() + offset,
        final_width,
        BLOCK_HEIGHT,
        final_depth,
    );
    (block, depth_plus_padding / available_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileRecord, TreemapMetadata};

    fn file(name: &str, size: u64) -> VizBlock {
        VizBlock::new(FileRecord::regular(name, size))
    }

    /// Root directory with three files: 100, 50, 50 bytes.
    fn small_tree() -> Tree<VizBlock> {
        let mut root_record = FileRecord::directory("root");
        root_record.size_bytes = 200;
        let mut tree = Tree::new(VizBlock::new(root_record));
        let root = tree.root();
        tree.append_child(root, file("a.bin", 100));
        tree.append_child(root, file("b.bin", 50));
        tree.append_child(root, file("c.bin", 50));
        tree
    }

    fn aspect_ratio(block: &Block) -> f64 {
        let long = block.width().max(block.depth());
        let short = block.width().min(block.depth());
        long / short
    }

    #[test]
    fn test_root_block_is_fixed() {
        let mut tree = small_tree();
        parse(&mut tree);

        let root_block = &tree.data(tree.root()).block;
        assert_eq!(root_block.origin(), Point3::ORIGIN);
        assert_eq!(root_block.width(), ROOT_BLOCK_WIDTH);
        assert_eq!(root_block.depth(), ROOT_BLOCK_DEPTH);
        assert_eq!(root_block.height(), BLOCK_HEIGHT);
    }

    #[test]
    fn test_children_sit_on_parent_top_face() {
        let mut tree = small_tree();
        parse(&mut tree);

        let root = tree.root();
        let parent_y = tree.data(root).block.origin().y;
        for child in tree.children(root) {
            let block = &tree.data(child).block;
            assert!(block.has_volume());
            assert!((block.origin().y - (parent_y + BLOCK_HEIGHT)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_children_stay_within_parent_footprint() {
        let mut tree = small_tree();
        parse(&mut tree);

        let root = tree.root();
        let parent = tree.data(root).block;
        let ids: Vec<NodeId> = tree.pre_order(root).skip(1).collect();
        for id in ids {
            let block = &tree.data(id).block;
            let tolerance = 1e-6;
            assert!(block.origin().x >= parent.origin().x - tolerance);
            assert!(
                block.origin().x + block.width() <= parent.origin().x + parent.width() + tolerance
            );
            assert!(block.origin().z <= parent.origin().z + tolerance);
            assert!(
                block.origin().z - block.depth() >= parent.origin().z - parent.depth() - tolerance
            );
        }
    }

    #[test]
    fn test_ground_areas_proportional_to_sizes() {
        let mut tree = small_tree();
        parse(&mut tree);

        // Padding trims each block, but relative proportions must hold:
        // the 100-byte child covers twice the area of each 50-byte child,
        // within the padding slack.
        let root = tree.root();
        let areas: Vec<(u64, f64)> = tree
            .children(root)
            .map(|id| {
                let data = tree.data(id);
                (data.file.size_bytes, data.block.width() * data.block.depth())
            })
            .collect();

        assert_eq!(areas[0].0, 100);
        let big = areas[0].1;
        for &(size, area) in &areas[1..] {
            assert_eq!(size, 50);
            let ratio = big / area;
            assert!(
                (1.4..=2.6).contains(&ratio),
                "expected ~2x area ratio, got {ratio}"
            );
        }
    }

    #[test]
    fn test_small_tree_aspect_ratios_are_reasonable() {
        let mut tree = small_tree();
        parse(&mut tree);

        let root = tree.root();
        for child in tree.children(root) {
            let ratio = aspect_ratio(&tree.data(child).block);
            assert!(ratio <= 4.0, "aspect ratio too extreme: {ratio}");
        }
    }

    #[test]
    fn test_nested_directories_are_laid_out() {
        let mut root_record = FileRecord::directory("root");
        root_record.size_bytes = 300;
        let mut tree = Tree::new(VizBlock::new(root_record));
        let root = tree.root();

        let mut dir_record = FileRecord::directory("sub");
        dir_record.size_bytes = 200;
        let sub = tree.append_child(root, VizBlock::new(dir_record));
        tree.append_child(sub, file("x.bin", 150));
        tree.append_child(sub, file("y.bin", 50));
        tree.append_child(root, file("z.bin", 100));

        parse(&mut tree);

        // Every node must have volume and sit one level above its parent.
        let ids: Vec<NodeId> = tree.pre_order(root).collect();
        for id in ids {
            let block = &tree.data(id).block;
            assert!(block.has_volume(), "node without volume after layout");
            if let Some(parent) = tree.node(id).parent() {
                let parent_block = &tree.data(parent).block;
                assert!(
                    (block.origin().y - (parent_block.origin().y + BLOCK_HEIGHT)).abs() < 1e-9
                );
            }
        }
    }

    #[test]
    fn test_layout_sorts_children_descending() {
        let mut root_record = FileRecord::directory("root");
        root_record.size_bytes = 60;
        let mut tree = Tree::new(VizBlock::new(root_record));
        let root = tree.root();
        tree.append_child(root, file("small.bin", 10));
        tree.append_child(root, file("large.bin", 30));
        tree.append_child(root, file("medium.bin", 20));

        parse(&mut tree);

        let sizes: Vec<u64> = tree
            .children(root)
            .map(|id| tree.data(id).file.size_bytes)
            .collect();
        assert_eq!(sizes, [30, 20, 10]);
    }

    #[test]
    fn test_metadata_is_plain_data() {
        // Guard against accidental non-Copy changes; the scanner hands this
        // across a channel by value.
        let metadata = TreemapMetadata {
            file_count: 1,
            directory_count: 2,
            total_bytes: 3,
        };
        let copy = metadata;
        assert_eq!(copy, metadata);
    }
}
