use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::rectangle::Rectangle;

/// 节点句柄 - 节点在树的节点池中的下标
///
/// 父子关系都通过句柄表达，父节点引用不参与所有权。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "#{}", _0)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// 句柄在节点池中的下标
    pub fn index(self) -> usize {
        self.0
    }
}

/// 节点的内容，由类型系统区分叶子节点和内部节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// 叶子节点：直接存储用户插入的数据矩形
    Leaf { entries: Vec<Rectangle> },
    /// 内部节点：存储子节点句柄
    Internal { children: Vec<NodeId> },
}

/// R-tree节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// 节点的最小边界矩形，只有在添加第一个成员之前为 `None`
    pub(crate) bbox: Option<Rectangle>,
    pub(crate) kind: NodeKind,
    /// 根节点没有父节点
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    /// 创建空的叶子节点
    pub fn new_leaf_node() -> Self {
        Node {
            bbox: None,
            kind: NodeKind::Leaf {
                entries: Vec::new(),
            },
            parent: None,
        }
    }

    /// 创建空的内部节点
    pub fn new_internal_node() -> Self {
        Node {
            bbox: None,
            kind: NodeKind::Internal {
                children: Vec::new(),
            },
            parent: None,
        }
    }

    pub fn is_leaf_node(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn is_internal_node(&self) -> bool {
        matches!(self.kind, NodeKind::Internal { .. })
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn bbox(&self) -> Option<&Rectangle> {
        self.bbox.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// 叶子节点的数据矩形，内部节点返回空切片
    pub fn entries(&self) -> &[Rectangle] {
        match &self.kind {
            NodeKind::Leaf { entries } => entries.as_slice(),
            NodeKind::Internal { .. } => &[],
        }
    }

    /// 内部节点的子节点句柄，叶子节点返回空切片
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Internal { children } => children.as_slice(),
        }
    }

    /// 成员数量（叶子节点为条目数，内部节点为子节点数）
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf { entries } => entries.len(),
            NodeKind::Internal { children } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 成员数量超过容量时节点溢出，需要分裂
    pub fn is_overflowing(&self, max_entries: usize) -> bool {
        self.len() > max_entries
    }

    /// 增量更新边界框以覆盖 `candidate`
    ///
    /// 没有边界框时直接采用 `candidate` 的范围。只能扩大，不能缩小；
    /// 成员被移走或重新分配后要调用 `RTree::recompute_bbox`。
    pub fn resize_bbox(&mut self, candidate: &Rectangle) {
        match &mut self.bbox {
            Some(bbox) => bbox.extend(candidate),
            None => self.bbox = Some(*candidate),
        }
    }

    /// 向叶子节点追加数据矩形
    ///
    /// # Panics
    /// 在内部节点上调用时 panic。
    pub fn push_entry(&mut self, rect: Rectangle) {
        match &mut self.kind {
            NodeKind::Leaf { entries } => entries.push(rect),
            NodeKind::Internal { .. } => panic!("cannot push a data entry into an internal node"),
        }
        self.resize_bbox(&rect);
    }

    /// 向内部节点追加子节点句柄，子节点的父引用由树负责设置
    pub(crate) fn push_child(&mut self, child: NodeId, child_bbox: Option<&Rectangle>) {
        match &mut self.kind {
            NodeKind::Internal { children } => children.push(child),
            NodeKind::Leaf { .. } => panic!("cannot push child {} into a leaf node", child),
        }
        if let Some(bbox) = child_bbox {
            self.resize_bbox(bbox);
        }
    }
}
