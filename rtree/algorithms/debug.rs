use std::collections::HashSet;
use std::fmt::Write;

use super::super::error::RTreeError;
use super::super::node::{NodeId, NodeKind};
use super::super::rectangle::Rectangle;
use super::super::rtree::RTree;

/// R-tree调试功能实现
impl RTree {
    /// 以缩进文本形式输出完整的树结构
    pub fn dump_tree(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "RTree (max_entries={}, height={}, len={})",
            self.max_entries(),
            self.height(),
            self.len()
        );
        self.dump_node(self.root(), 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let node = self.node(id);
        let bbox = match node.bbox() {
            Some(bbox) => bbox.to_string(),
            None => "empty".to_string(),
        };

        match node.kind() {
            NodeKind::Leaf { entries } => {
                let _ = writeln!(out, "{}Leaf {} bbox={} ({} entries)", indent, id, bbox, entries.len());
                for (i, entry) in entries.iter().enumerate() {
                    let _ = writeln!(out, "{}  [{}] {}", indent, i, entry);
                }
            }
            NodeKind::Internal { children } => {
                let _ = writeln!(out, "{}Internal {} bbox={} ({} children)", indent, id, bbox, children.len());
                for &child in children {
                    self.dump_node(child, depth + 1, out);
                }
            }
        }
    }

    /// 检查树的结构不变量，返回遇到的第一个违规
    ///
    /// 检查内容：父子引用互相一致且每个节点只出现一次；边界框恰好等于成员的并集；
    /// 非根节点不为空；没有节点超过容量；所有叶子节点深度相同；条目总数与 `len()` 一致。
    pub fn validate(&self) -> Result<(), RTreeError> {
        let root = self.root();
        let violation = |node: NodeId, reason: String| -> Result<(), RTreeError> {
            Err(RTreeError::InvariantViolation { node, reason })
        };

        match self.get(root) {
            None => return violation(root, "root handle is dangling".to_string()),
            Some(node) if node.parent().is_some() => {
                return violation(root, "root has a parent".to_string());
            }
            Some(_) => {}
        }

        let mut seen = HashSet::new();
        let mut leaf_depth = None;
        let mut entry_count = 0;
        let mut stack = vec![(root, 1usize)];

        while let Some((id, depth)) = stack.pop() {
            if !seen.insert(id) {
                return violation(id, "node is reachable more than once".to_string());
            }
            let Some(node) = self.get(id) else {
                return violation(id, "dangling child handle".to_string());
            };

            if id != root && node.is_empty() {
                return violation(id, "non-root node is empty".to_string());
            }
            if node.is_overflowing(self.max_entries()) {
                return violation(id, format!("{} members exceed capacity {}", node.len(), self.max_entries()));
            }

            let expected = match node.kind() {
                NodeKind::Leaf { entries } => {
                    let expected_depth = *leaf_depth.get_or_insert(depth);
                    if expected_depth != depth {
                        return violation(
                            id,
                            format!("leaf at depth {} but other leaves at depth {}", depth, expected_depth),
                        );
                    }
                    entry_count += entries.len();
                    Rectangle::union_all(entries)
                }
                NodeKind::Internal { children } => {
                    let mut child_boxes = Vec::with_capacity(children.len());
                    for &child in children {
                        let Some(child_node) = self.get(child) else {
                            return violation(id, format!("child {} is dangling", child));
                        };
                        if child_node.parent() != Some(id) {
                            return violation(child, format!("parent reference does not point to {}", id));
                        }
                        match child_node.bbox() {
                            Some(bbox) => child_boxes.push(*bbox),
                            None => return violation(child, "child node has no bounding box".to_string()),
                        }
                        stack.push((child, depth + 1));
                    }
                    Rectangle::union_all(&child_boxes)
                }
            };

            if node.bbox() != expected.as_ref() {
                return violation(
                    id,
                    format!("bounding box {:?} differs from member union {:?}", node.bbox(), expected),
                );
            }
        }

        if entry_count != self.len() {
            return violation(root, format!("found {} entries but len is {}", entry_count, self.len()));
        }
        if seen.len() != self.node_count() {
            return violation(root, format!("{} reachable nodes but {} allocated", seen.len(), self.node_count()));
        }

        Ok(())
    }
}
