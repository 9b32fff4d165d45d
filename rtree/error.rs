use super::node::NodeId;

/// R-tree 错误类型
///
/// `InvalidArity` 和 `InvalidCapacity` 是构造时的输入错误；
/// `EmptyTree` 和 `InvariantViolation` 说明树结构已经损坏，
/// 插入路径上遇到时直接 panic，只有 [`RTree::validate`](super::RTree::validate) 会把它们作为值返回。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RTreeError {
    #[error("rectangle requires exactly 4 coordinates, got {0}")]
    InvalidArity(usize),
    #[error("max entries must be at least 2, got {0}")]
    InvalidCapacity(usize),
    #[error("internal node {0} has no bounding box")]
    EmptyTree(NodeId),
    #[error("invariant violated at node {node}: {reason}")]
    InvariantViolation { node: NodeId, reason: String },
}
