//! Post-layout bounding-box pass.
//!
//! Every node receives an AABB that minimally encloses its own block and
//! the AABBs of all descendants. Because children always share their
//! parent's horizontal footprint, only the height needs to grow: a parent's
//! box is its own block extended upward by the tallest child box.

use crate::model::{Block, VizBlock};
use crate::tree::{NodeId, Tree};

/// Recompute `bounds` for every node. Must run after `layout::parse`.
pub fn update_bounding_boxes(tree: &mut Tree<VizBlock>) {
    let ids: Vec<NodeId> = tree.post_order(tree.root()).collect();

    for id in ids {
        if !tree.node(id).has_children() {
            let block = tree.data(id).block;
            tree.data_mut(id).bounds = block;
            continue;
        }

        let mut tallest_descendant: f64 = 0.0;
        let children: Vec<NodeId> = tree.children(id).collect();
        for child in children {
            tallest_descendant = tallest_descendant.max(tree.data(child).bounds.height());
        }

        let block = tree.data(id).block;
        tree.data_mut(id).bounds = Block::new(
            block.origin(),
            block.width(),
            block.height() + tallest_descendant,
            block.depth(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{self, BLOCK_HEIGHT};
    use crate::model::{FileRecord, VizBlock};

    fn file(name: &str, size: u64) -> VizBlock {
        VizBlock::new(FileRecord::regular(name, size))
    }

    fn dir(name: &str, size: u64) -> VizBlock {
        let mut record = FileRecord::directory(name);
        record.size_bytes = size;
        VizBlock::new(record)
    }

    #[test]
    fn test_leaf_bounds_equal_block() {
        let mut tree = Tree::new(dir("root", 100));
        let root = tree.root();
        let leaf = tree.append_child(root, file("a.bin", 100));

        layout::parse(&mut tree);
        update_bounding_boxes(&mut tree);

        assert_eq!(tree.data(leaf).bounds, tree.data(leaf).block);
    }

    #[test]
    fn test_parent_bounds_grow_by_tallest_child() {
        let mut tree = Tree::new(dir("root", 300));
        let root = tree.root();
        let sub = tree.append_child(root, dir("sub", 200));
        tree.append_child(sub, file("x.bin", 200));
        tree.append_child(root, file("y.bin", 100));

        layout::parse(&mut tree);
        update_bounding_boxes(&mut tree);

        // sub holds one level of children: its box is two blocks tall.
        let sub_bounds = &tree.data(sub).bounds;
        assert!((sub_bounds.height() - 2.0 * BLOCK_HEIGHT).abs() < 1e-9);

        // The root sees sub's box as its tallest child: three blocks tall.
        let root_bounds = &tree.data(root).bounds;
        assert!((root_bounds.height() - 3.0 * BLOCK_HEIGHT).abs() < 1e-9);

        // Origin and footprint come from the node's own block.
        let root_block = &tree.data(root).block;
        assert_eq!(root_bounds.origin(), root_block.origin());
        assert_eq!(root_bounds.width(), root_block.width());
        assert_eq!(root_bounds.depth(), root_block.depth());
    }

    #[test]
    fn test_bounds_enclose_every_descendant() {
        let mut tree = Tree::new(dir("root", 600));
        let root = tree.root();
        let a = tree.append_child(root, dir("a", 400));
        let deep = tree.append_child(a, dir("deep", 300));
        tree.append_child(deep, file("big.bin", 300));
        tree.append_child(a, file("side.bin", 100));
        tree.append_child(root, file("top.bin", 200));

        layout::parse(&mut tree);
        update_bounding_boxes(&mut tree);

        let ids: Vec<NodeId> = tree.pre_order(root).collect();
        for id in ids {
            let bounds = tree.data(id).bounds;
            let top = bounds.origin().y + bounds.height();
            for descendant in tree.pre_order(id) {
                let block = tree.data(descendant).block;
                assert!(
                    block.origin().y + block.height() <= top + 1e-9,
                    "descendant block pokes out of its ancestor's bounds"
                );
            }
        }
    }
}
