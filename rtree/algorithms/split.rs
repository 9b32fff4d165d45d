use tracing::debug;

use super::super::error::RTreeError;
use super::super::node::{Node, NodeId, NodeKind};
use super::super::rectangle::Rectangle;
use super::super::rtree::RTree;

/// 分裂过程中的一组成员及其当前边界框
#[derive(Debug)]
pub(crate) struct SplitGroup<T> {
    pub(crate) bbox: Rectangle,
    pub(crate) members: Vec<T>,
}

impl<T> SplitGroup<T> {
    fn seeded(rect: Rectangle, member: T) -> Self {
        SplitGroup {
            bbox: rect,
            members: vec![member],
        }
    }

    fn push(&mut self, rect: &Rectangle, member: T) {
        self.bbox.extend(rect);
        self.members.push(member);
    }
}

/// 选择分裂种子：中心点距离最大的一对成员
///
/// 检查所有无序成员对，返回的下标满足 `first < second`。距离相同时保留最先找到的一对。
pub(crate) fn choose_split_seeds(rects: &[Rectangle]) -> (usize, usize) {
    let mut max_distance = f64::NEG_INFINITY;
    let mut best_pair = (0, 1);

    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let distance = rects[i].distance(&rects[j]);
            if distance > max_distance {
                max_distance = distance;
                best_pair = (i, j);
            }
        }
    }

    best_pair
}

/// 二次分裂：把溢出节点的成员分成两组
///
/// 两个种子各自成为一组的第一个成员，其余成员按原顺序逐个分配给
/// 扩大面积更小的一组，相同时分配给第一组。两组都不为空，
/// 且每个成员恰好出现在其中一组。
///
/// # Panics
/// 成员少于两个时 panic。
pub(crate) fn quadratic_split<T>(mut members: Vec<(Rectangle, T)>) -> (SplitGroup<T>, SplitGroup<T>) {
    assert!(members.len() >= 2, "cannot split fewer than two members");

    let rects: Vec<Rectangle> = members.iter().map(|(rect, _)| *rect).collect();
    let (seed1, seed2) = choose_split_seeds(&rects);

    // 先移除下标大的种子，剩余成员保持原顺序
    let (rect2, member2) = members.remove(seed2);
    let (rect1, member1) = members.remove(seed1);
    let mut group1 = SplitGroup::seeded(rect1, member1);
    let mut group2 = SplitGroup::seeded(rect2, member2);

    for (rect, member) in members {
        let enlargement1 = group1.bbox.enlargement(&rect);
        let enlargement2 = group2.bbox.enlargement(&rect);
        if enlargement2 < enlargement1 {
            group2.push(&rect, member);
        } else {
            group1.push(&rect, member);
        }
    }

    (group1, group2)
}

/// 节点分裂相关算法
impl RTree {
    /// 分裂溢出的节点，返回接收分裂结果的父节点
    ///
    /// 原节点被丢弃，两个新节点在父节点的子节点列表中占据原节点的位置，
    /// 父节点的边界框随后从头重新计算。根节点分裂时会创建新的根节点，树高加一。
    pub(crate) fn split_node(&mut self, id: NodeId) -> NodeId {
        let node = self.take_node(id);
        let parent = node.parent();
        let member_count = node.len();

        let (first, second) = match node.kind {
            NodeKind::Leaf { entries } => {
                let (group1, group2) = quadratic_split(entries.into_iter().map(|e| (e, e)).collect());
                (self.alloc_leaf(group1), self.alloc_leaf(group2))
            }
            NodeKind::Internal { children } => {
                let members = children
                    .into_iter()
                    .map(|child| (self.child_bbox(child), child))
                    .collect();
                let (group1, group2) = quadratic_split(members);
                (self.alloc_internal(group1), self.alloc_internal(group2))
            }
        };

        debug!(
            "split node {} with {} members into {} ({}) and {} ({})",
            id,
            member_count,
            first,
            self.node(first).len(),
            second,
            self.node(second).len()
        );

        let parent = match parent {
            Some(parent) => {
                self.replace_child(parent, id, first, second);
                self.recompute_bbox(parent);
                parent
            }
            None => {
                let root = self.alloc(Node::new_internal_node());
                self.attach_child(root, first);
                self.attach_child(root, second);
                self.set_root(root);
                debug!("root split, tree height is now {}", self.height());
                root
            }
        };

        // 两个新节点和新根都已分配，原槽位此后才可复用
        self.recycle(id);
        parent
    }

    fn alloc_leaf(&mut self, group: SplitGroup<Rectangle>) -> NodeId {
        let mut node = Node::new_leaf_node();
        for rect in group.members {
            node.push_entry(rect);
        }
        self.alloc(node)
    }

    fn alloc_internal(&mut self, group: SplitGroup<NodeId>) -> NodeId {
        let id = self.alloc(Node::new_internal_node());
        for child in group.members {
            self.attach_child(id, child);
        }
        id
    }

    fn child_bbox(&self, child: NodeId) -> Rectangle {
        match self.node(child).bbox() {
            Some(bbox) => *bbox,
            None => panic!("{}", RTreeError::EmptyTree(child)),
        }
    }

    /// 在父节点的子节点列表中用 `first`、`second` 替换 `old`
    fn replace_child(&mut self, parent: NodeId, old: NodeId, first: NodeId, second: NodeId) {
        let NodeKind::Internal { children } = &mut self.node_mut(parent).kind else {
            panic!("parent {} of split node {} is a leaf", parent, old);
        };
        let Some(position) = children.iter().position(|&child| child == old) else {
            panic!("node {} is missing from the children of its parent {}", old, parent);
        };
        children[position] = first;
        children.insert(position + 1, second);

        self.node_mut(first).parent = Some(parent);
        self.node_mut(second).parent = Some(parent);
    }
}
