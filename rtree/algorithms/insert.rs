use tracing::trace;

use super::super::error::RTreeError;
use super::super::node::{NodeId, NodeKind};
use super::super::rectangle::Rectangle;
use super::super::rtree::RTree;

/// 插入操作相关算法
impl RTree {
    /// 插入新的数据矩形
    ///
    /// 选出目标叶子节点并追加条目，然后自底向上修复：溢出的节点被分裂，
    /// 其余祖先节点的边界框增量扩展到根节点为止。
    pub fn insert(&mut self, rect: Rectangle) {
        let leaf = self.choose_subtree(&rect);
        self.node_mut(leaf).push_entry(rect);
        self.record_insert();
        trace!("inserted {} into leaf {}", rect, leaf);

        self.adjust_tree(leaf);
    }

    /// 从根节点向下选择插入的叶子节点
    ///
    /// 每一层选择扩大面积最小的子节点，相同时选择当前面积更小的。
    /// 遇到的第一个叶子节点即为结果；新建的空树根节点本身就是合法的目标。
    ///
    /// # Panics
    /// 内部节点没有子节点，或者子节点缺少边界框时 panic。
    pub(crate) fn choose_subtree(&self, rect: &Rectangle) -> NodeId {
        let mut current = self.root();
        loop {
            match self.node(current).kind() {
                NodeKind::Leaf { .. } => return current,
                NodeKind::Internal { children } => {
                    current = self.choose_child(current, children, rect);
                }
            }
        }
    }

    /// 在一组子节点中选择吸收 `rect` 代价最小的那个
    fn choose_child(&self, parent: NodeId, children: &[NodeId], rect: &Rectangle) -> NodeId {
        let mut best: Option<(NodeId, f64, f64)> = None;

        for &child in children {
            let mbr = match self.node(child).bbox() {
                Some(mbr) => mbr,
                None => panic!("{}", RTreeError::EmptyTree(child)),
            };
            let enlargement = mbr.enlargement(rect);
            let area = mbr.area();

            let better = match best {
                None => true,
                Some((_, min_enlargement, min_area)) => {
                    enlargement < min_enlargement
                        || (enlargement == min_enlargement && area < min_area)
                }
            };
            if better {
                best = Some((child, enlargement, area));
            }
        }

        match best {
            Some((child, _, _)) => child,
            None => panic!("{}", RTreeError::EmptyTree(parent)),
        }
    }

    /// 自底向上调整树
    ///
    /// 溢出的节点分裂后从其父节点继续检查；未溢出的节点把自己的边界框
    /// 扩展进父节点。循环在根节点处结束。
    fn adjust_tree(&mut self, start: NodeId) {
        let max_entries = self.max_entries();
        let mut current = start;

        loop {
            if self.node(current).is_overflowing(max_entries) {
                current = self.split_node(current);
                continue;
            }

            let node = self.node(current);
            let Some(parent) = node.parent() else {
                break;
            };
            let Some(bbox) = node.bbox().copied() else {
                panic!("{}", RTreeError::EmptyTree(current));
            };
            self.node_mut(parent).resize_bbox(&bbox);
            current = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unit_squares(count: usize) -> Vec<Rectangle> {
        (0..count)
            .map(|i| {
                let v = (i * 2) as f64;
                Rectangle::new(v, v, v + 1.0, v + 1.0)
            })
            .collect()
    }

    #[test]
    fn test_insert_basic() {
        let mut rtree = RTree::new(4).unwrap();

        rtree.insert(Rectangle::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(rtree.len(), 1);
        assert!(!rtree.is_empty());
        assert_eq!(rtree.root_bbox(), Some(&Rectangle::new(0.0, 0.0, 10.0, 10.0)));

        rtree.insert(Rectangle::new(5.0, 5.0, 15.0, 15.0));
        rtree.insert(Rectangle::new(20.0, 20.0, 30.0, 30.0));
        assert_eq!(rtree.len(), 3);
        assert_eq!(rtree.height(), 1);
        assert_eq!(rtree.root_bbox(), Some(&Rectangle::new(0.0, 0.0, 30.0, 30.0)));
        rtree.validate().unwrap();
    }

    #[test]
    fn test_root_stays_leaf_at_capacity() {
        let mut rtree = RTree::new(4).unwrap();
        for rect in unit_squares(4) {
            rtree.insert(rect);
        }

        let root = rtree.root_node();
        assert!(root.is_leaf_node());
        assert_eq!(root.entries().len(), 4);
        assert_eq!(root.bbox(), Some(&Rectangle::new(0.0, 0.0, 7.0, 7.0)));
    }

    #[test]
    fn test_fifth_insert_splits_root() {
        let mut rtree = RTree::new(4).unwrap();
        for rect in unit_squares(5) {
            rtree.insert(rect);
        }

        let root = rtree.root_node();
        assert!(root.is_internal_node());
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.bbox(), Some(&Rectangle::new(0.0, 0.0, 9.0, 9.0)));
        assert_eq!(rtree.height(), 2);

        let first = rtree.get(root.children()[0]).unwrap();
        let second = rtree.get(root.children()[1]).unwrap();
        assert!(first.is_leaf_node() && second.is_leaf_node());

        // 种子为 (0,0,1,1) 与 (8,8,9,9)，其余按扩大面积分配
        assert_eq!(
            first.entries(),
            &[
                Rectangle::new(0.0, 0.0, 1.0, 1.0),
                Rectangle::new(2.0, 2.0, 3.0, 3.0),
                Rectangle::new(4.0, 4.0, 5.0, 5.0),
            ]
        );
        assert_eq!(
            second.entries(),
            &[
                Rectangle::new(8.0, 8.0, 9.0, 9.0),
                Rectangle::new(6.0, 6.0, 7.0, 7.0),
            ]
        );
        assert_eq!(first.bbox(), Some(&Rectangle::new(0.0, 0.0, 5.0, 5.0)));
        assert_eq!(second.bbox(), Some(&Rectangle::new(6.0, 6.0, 9.0, 9.0)));
        assert_eq!(first.parent(), Some(rtree.root()));
        assert_eq!(second.parent(), Some(rtree.root()));
        rtree.validate().unwrap();
    }

    #[test]
    fn test_choose_subtree_prefers_least_enlargement() {
        let mut rtree = RTree::new(4).unwrap();
        for rect in unit_squares(5) {
            rtree.insert(rect);
        }
        let children = rtree.root_node().children().to_vec();

        // 被第一个叶子节点完全包含，扩大面积为 0
        let inside = Rectangle::new(1.0, 1.0, 2.0, 2.0);
        assert_eq!(rtree.choose_subtree(&inside), children[0]);

        let near_second = Rectangle::new(9.0, 9.0, 10.0, 10.0);
        assert_eq!(rtree.choose_subtree(&near_second), children[1]);
    }

    #[test]
    fn test_choose_subtree_tie_prefers_smaller_area() {
        use crate::rtree::Node;

        let mut rtree = RTree::new(4).unwrap();
        let mut large = Node::new_leaf_node();
        large.push_entry(Rectangle::new(0.0, 0.0, 10.0, 10.0));
        let mut small = Node::new_leaf_node();
        small.push_entry(Rectangle::new(4.0, 4.0, 6.0, 6.0));

        let large = rtree.alloc(large);
        let small = rtree.alloc(small);
        let root = rtree.alloc(Node::new_internal_node());
        rtree.attach_child(root, large);
        rtree.attach_child(root, small);
        rtree.set_root(root);

        // 两个节点都包含该点，扩大面积都为 0，选择面积更小的节点
        assert_eq!(rtree.choose_subtree(&Rectangle::from_point(5.0, 5.0)), small);
        assert_eq!(rtree.choose_subtree(&Rectangle::from_point(1.0, 1.0)), large);
    }

    #[test]
    fn test_insert_points() {
        let mut rtree = RTree::new(4).unwrap();
        for i in 0..10 {
            let v = i as f64 * 2.0;
            rtree.insert(Rectangle::from_point(v, v));
        }

        assert_eq!(rtree.len(), 10);
        assert_eq!(rtree.root_bbox(), Some(&Rectangle::new(0.0, 0.0, 18.0, 18.0)));
        rtree.validate().unwrap();
    }

    #[test]
    fn test_duplicate_rectangles() {
        let mut rtree = RTree::new(3).unwrap();
        let rect = Rectangle::new(1.0, 1.0, 2.0, 2.0);
        for _ in 0..20 {
            rtree.insert(rect);
        }

        assert_eq!(rtree.len(), 20);
        assert_eq!(rtree.entries().len(), 20);
        assert!(rtree.entries().iter().all(|e| *e == rect));
        rtree.validate().unwrap();
    }

    #[test]
    fn test_height_grows_through_internal_splits() {
        let mut rtree = RTree::new(2).unwrap();
        let mut last_height = rtree.height();
        for (i, rect) in unit_squares(64).into_iter().enumerate() {
            rtree.insert(rect);
            let height = rtree.height();
            assert!(height == last_height || height == last_height + 1, "after insert {}", i);
            last_height = height;
            rtree.validate().unwrap();
        }

        assert!(rtree.height() >= 4);
        assert!(rtree.root_node().children().len() >= 2);
        assert_eq!(rtree.root_bbox(), Some(&Rectangle::new(0.0, 0.0, 127.0, 127.0)));
    }

    #[test]
    fn test_random_inserts_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(42);

        for max_entries in [2, 3, 4, 9, 16] {
            let mut rtree = RTree::new(max_entries).unwrap();
            let mut inserted = Vec::new();

            for _ in 0..500 {
                let x = rng.gen_range(0.0..1000.0);
                let y = rng.gen_range(0.0..1000.0);
                let w = rng.gen_range(0.0..20.0);
                let h = rng.gen_range(0.0..20.0);
                let rect = Rectangle::new(x, y, x + w, y + h);
                rtree.insert(rect);
                inserted.push(rect);
            }

            rtree.validate().unwrap();
            assert_eq!(rtree.len(), inserted.len());

            let expected = Rectangle::union_all(&inserted);
            assert_eq!(rtree.root_bbox().copied(), expected);

            // 所有条目恰好出现一次
            let key = |r: &Rectangle| (r.min[0].to_bits(), r.min[1].to_bits(), r.max[0].to_bits(), r.max[1].to_bits());
            let mut stored: Vec<_> = rtree.entries().iter().map(key).collect();
            let mut original: Vec<_> = inserted.iter().map(key).collect();
            stored.sort_unstable();
            original.sort_unstable();
            assert_eq!(stored, original);
        }
    }

    #[test]
    fn test_every_bbox_contains_its_members() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut rtree = RTree::new(4).unwrap();
        for _ in 0..200 {
            let x = rng.gen_range(-50.0..50.0);
            let y = rng.gen_range(-50.0..50.0);
            rtree.insert(Rectangle::new(x, y, x + 1.0, y + 3.0));
        }

        let mut stack = vec![rtree.root()];
        while let Some(id) = stack.pop() {
            let node = rtree.get(id).unwrap();
            let bbox = node.bbox().unwrap();
            for entry in node.entries() {
                assert!(bbox.contains(entry));
            }
            for &child in node.children() {
                assert!(bbox.contains(rtree.get(child).unwrap().bbox().unwrap()));
                stack.push(child);
            }
        }
    }
}
