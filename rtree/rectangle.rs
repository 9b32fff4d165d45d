use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::RTreeError;

/// 矩形边界框 - 既用于存储的数据矩形，也用于节点的最小边界矩形(MBR)
///
/// 数据矩形插入后不再修改；节点的边界框则通过 [`Rectangle::extend`] 原地增长。
/// 构造时不会规范化坐标顺序，`min > max` 属于调用方错误。
///
/// 相等比较（`==`）是逐坐标的精确比较，没有误差容限。
#[derive(Debug, Display, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[display(fmt = "Rectangle(min: {:?}, max: {:?})", min, max)]
pub struct Rectangle {
    pub min: [f64; 2], // [x_min, y_min]
    pub max: [f64; 2], // [x_max, y_max]
}

impl Rectangle {
    /// 由四个坐标创建矩形
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Rectangle {
            min: [x_min, y_min],
            max: [x_max, y_max],
        }
    }

    /// 由坐标切片创建矩形，切片长度必须恰好为 4
    ///
    /// ```
    /// use rtree_index::{Rectangle, RTreeError};
    ///
    /// let rect = Rectangle::from_coords(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(rect, Rectangle::new(1.0, 2.0, 3.0, 4.0));
    ///
    /// let err = Rectangle::from_coords(&[1.0, 2.0, 3.0]).unwrap_err();
    /// assert_eq!(err, RTreeError::InvalidArity(3));
    /// ```
    pub fn from_coords(coords: &[f64]) -> Result<Self, RTreeError> {
        match *coords {
            [x_min, y_min, x_max, y_max] => Ok(Rectangle::new(x_min, y_min, x_max, y_max)),
            _ => Err(RTreeError::InvalidArity(coords.len())),
        }
    }

    /// 创建一个点矩形（面积为 0）
    pub fn from_point(x: f64, y: f64) -> Self {
        Rectangle {
            min: [x, y],
            max: [x, y],
        }
    }

    /// 计算一组矩形的最小边界矩形，输入为空时返回 `None`
    ///
    /// 这是从头重新计算边界框的唯一途径，分裂后重新分配条目时必须使用它，
    /// 因为 [`Rectangle::extend`] 只能让边界框变大。
    pub fn union_all<'a, I>(rects: I) -> Option<Rectangle>
    where
        I: IntoIterator<Item = &'a Rectangle>,
    {
        let mut iter = rects.into_iter();
        let mut mbr = *iter.next()?;
        for rect in iter {
            mbr.extend(rect);
        }
        Some(mbr)
    }

    /// 计算矩形面积，退化矩形（宽或高为 0）面积为 0
    pub fn area(&self) -> f64 {
        (self.max[0] - self.min[0]) * (self.max[1] - self.min[1])
    }

    /// 判断两个矩形是否相交，边界接触也算相交
    pub fn overlaps(&self, other: &Rectangle) -> bool {
        !(self.min[0] > other.max[0]
            || other.min[0] > self.max[0]
            || self.min[1] > other.max[1]
            || other.min[1] > self.max[1])
    }

    /// 判断当前矩形是否包含另一个矩形（含边界）
    pub fn contains(&self, other: &Rectangle) -> bool {
        self.min[0] <= other.min[0]
            && self.min[1] <= other.min[1]
            && self.max[0] >= other.max[0]
            && self.max[1] >= other.max[1]
    }

    /// 计算两个矩形的并集MBR，不修改任何输入
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    /// 原地扩展为与另一个矩形的并集
    pub fn extend(&mut self, other: &Rectangle) {
        *self = self.union(other);
    }

    /// 计算扩大到包含另一个矩形所需的面积增量
    ///
    /// 已经包含时直接返回 0，跳过并集和面积计算。
    pub fn enlargement(&self, other: &Rectangle) -> f64 {
        if self.contains(other) {
            return 0.0;
        }
        self.union(other).area() - self.area()
    }

    /// 计算矩形中心点
    pub fn centroid(&self) -> [f64; 2] {
        [
            self.min[0] + (self.max[0] - self.min[0]) / 2.0,
            self.min[1] + (self.max[1] - self.min[1]) / 2.0,
        ]
    }

    /// 两个矩形中心点之间的欧氏距离
    ///
    /// 不是边与边之间的最短距离，只用于分裂时的种子选择。
    pub fn distance(&self, other: &Rectangle) -> f64 {
        let [x1, y1] = self.centroid();
        let [x2, y2] = other.centroid();
        ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
    }
}

impl TryFrom<&[f64]> for Rectangle {
    type Error = RTreeError;

    fn try_from(coords: &[f64]) -> Result<Self, Self::Error> {
        Rectangle::from_coords(coords)
    }
}
