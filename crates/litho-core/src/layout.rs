//! Layout boundary. The box model algorithm lives behind [`LayoutSolver`];
//! [`StackLayoutSolver`] is a minimal stacking implementation.

use crate::component::FlexDirection;
use crate::node::InternalNode;

/// Constraints used during layout measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraints {
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
}

impl Constraints {
    pub fn tight(width: f32, height: f32) -> Self {
        Self {
            min_width: width,
            max_width: width,
            min_height: height,
            max_height: height,
        }
    }

    pub fn loose(max_width: f32, max_height: f32) -> Self {
        Self {
            min_width: 0.0,
            max_width,
            min_height: 0.0,
            max_height,
        }
    }

    pub fn unbounded() -> Self {
        Self::loose(f32::INFINITY, f32::INFINITY)
    }

    pub fn is_bounded(&self) -> bool {
        self.max_width.is_finite() && self.max_height.is_finite()
    }

    pub fn constrain(&self, width: f32, height: f32) -> (f32, f32) {
        (
            width.clamp(self.min_width, self.max_width),
            height.clamp(self.min_height, self.max_height),
        )
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Geometry for one node, in root coordinates. `children` mirrors the node's
/// children one to one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub children: Vec<LayoutBox>,
}

/// Pure geometry: the same tree and constraints always produce the same boxes.
pub trait LayoutSolver: Send + Sync {
    fn solve(&self, root: &InternalNode, constraints: Constraints) -> LayoutBox;
}

/// Stacks children along the node's direction, sizing each node from its
/// style or from its content plus padding.
#[derive(Debug, Default, Clone, Copy)]
pub struct StackLayoutSolver;

impl StackLayoutSolver {
    fn measure(&self, node: &InternalNode, x: f32, y: f32, constraints: Constraints) -> LayoutBox {
        let style = &node.style;
        let pad = style.padding;
        let inner_width = (style.width.unwrap_or(constraints.max_width) - 2.0 * pad).max(0.0);
        let inner_height = (style.height.unwrap_or(constraints.max_height) - 2.0 * pad).max(0.0);

        let mut main = 0.0f32;
        let mut cross = 0.0f32;
        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let (child_x, child_y, child_constraints) = match style.direction {
                FlexDirection::Column => (
                    x + pad,
                    y + pad + main,
                    Constraints::loose(inner_width, (inner_height - main).max(0.0)),
                ),
                FlexDirection::Row => (
                    x + pad + main,
                    y + pad,
                    Constraints::loose((inner_width - main).max(0.0), inner_height),
                ),
            };
            let measured = self.measure(child, child_x, child_y, child_constraints);
            match style.direction {
                FlexDirection::Column => {
                    main += measured.rect.height;
                    cross = cross.max(measured.rect.width);
                }
                FlexDirection::Row => {
                    main += measured.rect.width;
                    cross = cross.max(measured.rect.height);
                }
            }
            children.push(measured);
        }

        let (content_width, content_height) = match style.direction {
            FlexDirection::Column => (cross, main),
            FlexDirection::Row => (main, cross),
        };
        let (width, height) = constraints.constrain(
            style.width.unwrap_or(content_width + 2.0 * pad),
            style.height.unwrap_or(content_height + 2.0 * pad),
        );
        LayoutBox {
            rect: Rect::new(x, y, width, height),
            children,
        }
    }
}

impl LayoutSolver for StackLayoutSolver {
    fn solve(&self, root: &InternalNode, constraints: Constraints) -> LayoutBox {
        self.measure(root, 0.0, 0.0, constraints)
    }
}
