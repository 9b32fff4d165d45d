// R-tree算法模块
//
// - insert: 子树选择、插入和自底向上的树调整
// - split: 二次分裂（种子选择与成员分配）
// - debug: 树结构输出与不变量检查

pub mod debug;
pub mod insert;
pub mod split;
