//! # 矩形 R-tree 空间索引
//!
//! 在内存中维护一棵平衡的 R-tree，逐个插入二维轴对齐矩形。
//! 节点溢出时使用二次分裂（以中心点距离最远的两个成员为种子），
//! 分裂结果自底向上传播，根节点分裂时树高加一。
//!
//! ```rust
//! use rtree_index::{RTree, Rectangle};
//!
//! let mut rtree = RTree::new(4).unwrap();
//! for i in 0..5 {
//!     let v = (i * 2) as f64;
//!     rtree.insert(Rectangle::new(v, v, v + 1.0, v + 1.0));
//! }
//!
//! assert_eq!(rtree.height(), 2);
//! assert_eq!(rtree.root_node().children().len(), 2);
//! assert_eq!(rtree.root_bbox(), Some(&Rectangle::new(0.0, 0.0, 9.0, 9.0)));
//! ```

pub mod config;
pub mod rtree;

use std::error::Error;

// 重新导出主要的公共接口
pub use crate::config::{init_logging, IndexConfig, LoggingConfig, TreeSettings};
pub use crate::rtree::{Node, NodeId, NodeKind, RTree, RTreeError, Rectangle};

pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;
