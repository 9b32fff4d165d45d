use serde::{Deserialize, Serialize};

use super::error::RTreeError;
use super::node::{Node, NodeId, NodeKind};
use super::rectangle::Rectangle;

/// 默认的节点最大条目数
pub const DEFAULT_MAX_ENTRIES: usize = 8;

/// 用于JSON序列化的树结构
#[derive(Debug, Serialize, Deserialize)]
pub struct TreeVisualization {
    pub root: NodeVisualization,
    pub config: TreeConfig,
}

/// 用于JSON序列化的树参数
#[derive(Debug, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_entries: usize,
    pub height: usize,
    pub len: usize,
}

/// JSON中的节点类型
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Leaf,
    Internal,
}

/// 用于JSON序列化的节点结构
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeVisualization {
    pub id: NodeId,
    /// 节点的最小边界矩形，空树的根节点为 null
    pub mbr: Option<Rectangle>,
    pub node_type: NodeType,
    /// 节点层级，叶子节点为 0
    pub level: usize,
    /// 数据条目（仅叶子节点）
    pub data_entries: Vec<Rectangle>,
    /// 子节点（仅内部节点）
    pub child_nodes: Vec<NodeVisualization>,
}

/// R-tree主结构
///
/// 所有节点都存放在树持有的节点池中，通过 [`NodeId`] 互相引用。
/// 分裂丢弃的槽位会进入空闲列表，供之后分配的节点复用。
///
/// ```
/// use rtree_index::{RTree, Rectangle};
///
/// let mut rtree = RTree::new(4).unwrap();
/// rtree.insert(Rectangle::new(0.0, 0.0, 1.0, 1.0));
/// rtree.insert(Rectangle::new(2.0, 2.0, 3.0, 3.0));
///
/// assert_eq!(rtree.len(), 2);
/// assert_eq!(rtree.height(), 1);
/// assert_eq!(rtree.root_bbox(), Some(&Rectangle::new(0.0, 0.0, 3.0, 3.0)));
/// ```
#[derive(Debug, Clone)]
pub struct RTree {
    nodes: Vec<Option<Node>>,
    free_slots: Vec<usize>,
    root: NodeId,
    /// 最大条目数M
    max_entries: usize,
    /// 已插入的数据矩形数量
    len: usize,
}

impl RTree {
    /// 创建新的R-tree，根节点是一个空的叶子节点
    pub fn new(max_entries: usize) -> Result<Self, RTreeError> {
        if max_entries < 2 {
            return Err(RTreeError::InvalidCapacity(max_entries));
        }

        Ok(RTree {
            nodes: vec![Some(Node::new_leaf_node())],
            free_slots: Vec::new(),
            root: NodeId(0),
            max_entries,
            len: 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 已插入的数据矩形数量
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root)
    }

    /// 获取R-tree的根节点MBR，空树返回 `None`
    pub fn root_bbox(&self) -> Option<&Rectangle> {
        self.root_node().bbox()
    }

    /// 按句柄查找节点，句柄无效或节点已被丢弃时返回 `None`
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)?.as_ref()
    }

    /// 树的高度，只有一个叶子根节点时为 1
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root_node();
        while let Some(&first) = current.children().first() {
            current = self.node(first);
            height += 1;
        }
        height
    }

    /// 当前存活的节点数量
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_slots.len()
    }

    /// 按深度优先顺序列出所有数据矩形
    pub fn entries(&self) -> Vec<Rectangle> {
        let mut result = Vec::with_capacity(self.len);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Leaf { entries } => result.extend_from_slice(entries),
                NodeKind::Internal { children } => stack.extend(children.iter().rev()),
            }
        }
        result
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("dangling node handle {}", id),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("dangling node handle {}", id),
        }
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    pub(crate) fn record_insert(&mut self) {
        self.len += 1;
    }

    /// 把节点放入节点池，优先复用空闲槽位
    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        match self.free_slots.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// 从节点池中取出节点，槽位在调用 [`RTree::recycle`] 之前不会被复用
    pub(crate) fn take_node(&mut self, id: NodeId) -> Node {
        match self.nodes.get_mut(id.0).and_then(Option::take) {
            Some(node) => node,
            None => panic!("dangling node handle {}", id),
        }
    }

    pub(crate) fn recycle(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id.0].is_none(), "recycling live node {}", id);
        self.free_slots.push(id.0);
    }

    /// 把 `child` 挂到内部节点 `parent` 下，设置父引用并扩展父节点的边界框
    pub(crate) fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        let child_bbox = {
            let child_node = self.node_mut(child);
            child_node.parent = Some(parent);
            child_node.bbox
        };
        self.node_mut(parent).push_child(child, child_bbox.as_ref());
    }

    /// 根据当前成员从头计算节点的边界框
    ///
    /// 与 [`Node::resize_bbox`] 不同，这里可以让边界框缩小。
    pub(crate) fn recompute_bbox(&mut self, id: NodeId) {
        let bbox = match &self.node(id).kind {
            NodeKind::Leaf { entries } => Rectangle::union_all(entries),
            NodeKind::Internal { children } => {
                Rectangle::union_all(children.iter().map(|&child| {
                    match self.node(child).bbox() {
                        Some(bbox) => bbox,
                        None => panic!("{}", RTreeError::EmptyTree(child)),
                    }
                }))
            }
        };
        self.node_mut(id).bbox = bbox;
    }

    /// 导出树结构为JSON格式，用于可视化
    pub fn export_to_json(&self) -> Result<String, serde_json::Error> {
        let visualization = TreeVisualization {
            root: self.create_node_visualization(self.root, self.height() - 1),
            config: TreeConfig {
                max_entries: self.max_entries,
                height: self.height(),
                len: self.len,
            },
        };
        serde_json::to_string_pretty(&visualization)
    }

    fn create_node_visualization(&self, id: NodeId, level: usize) -> NodeVisualization {
        let node = self.node(id);
        let (node_type, child_nodes) = match &node.kind {
            NodeKind::Leaf { .. } => (NodeType::Leaf, Vec::new()),
            NodeKind::Internal { children } => (
                NodeType::Internal,
                children
                    .iter()
                    .map(|&child| self.create_node_visualization(child, level.saturating_sub(1)))
                    .collect(),
            ),
        };

        NodeVisualization {
            id,
            mbr: node.bbox,
            node_type,
            level,
            data_entries: node.entries().to_vec(),
            child_nodes,
        }
    }
}

impl Default for RTree {
    fn default() -> Self {
        RTree {
            nodes: vec![Some(Node::new_leaf_node())],
            free_slots: Vec::new(),
            root: NodeId(0),
            max_entries: DEFAULT_MAX_ENTRIES,
            len: 0,
        }
    }
}
