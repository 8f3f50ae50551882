//! Node placement.
//!
//! Nodes never move. Allocators hand out positions in order. A grid allocator can be bounded by
//! a rectangle, in which case it runs out once the next grid point would fall outside it.

use crate::priv_prelude::*;

/// A point in the simulated world, in metres.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Position {
        Position { x, y, z }
    }
}

/// An axis-aligned rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Rectangle {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Rectangle {
        Rectangle { x_min, x_max, y_min, y_max }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.x_min
            && position.x <= self.x_max
            && position.y >= self.y_min
            && position.y <= self.y_max
    }
}

pub trait PositionAllocator {
    /// The next position, or `None` if the allocator is exhausted.
    fn next_position(&mut self) -> Option<Position>;
}

/// Hands out a fixed list of positions.
#[derive(Debug, Default, Clone)]
pub struct ListPositionAllocator {
    positions: VecDeque<Position>,
}

impl ListPositionAllocator {
    pub fn new() -> ListPositionAllocator {
        ListPositionAllocator::default()
    }

    pub fn add(&mut self, position: Position) -> &mut ListPositionAllocator {
        self.positions.push_back(position);
        self
    }

    pub fn remaining(&self) -> usize {
        self.positions.len()
    }
}

impl PositionAllocator for ListPositionAllocator {
    fn next_position(&mut self) -> Option<Position> {
        self.positions.pop_front()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    /// Fill a row of `grid_width` positions before moving to the next row.
    RowFirst,
    /// Fill a column of `grid_width` positions before moving to the next column.
    ColumnFirst,
}

/// Lays nodes out on a regular grid.
#[derive(Debug, Clone)]
pub struct GridPositionAllocator {
    pub min_x: f64,
    pub min_y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    pub grid_width: u32,
    pub layout: GridLayout,
    pub bounds: Option<Rectangle>,
    next: u32,
}

impl GridPositionAllocator {
    pub fn new(
        min_x: f64,
        min_y: f64,
        delta_x: f64,
        delta_y: f64,
        grid_width: u32,
        layout: GridLayout,
    ) -> GridPositionAllocator {
        GridPositionAllocator {
            min_x,
            min_y,
            delta_x,
            delta_y,
            grid_width: cmp::max(grid_width, 1),
            layout,
            bounds: None,
            next: 0,
        }
    }

    pub fn bounded(mut self, bounds: Rectangle) -> GridPositionAllocator {
        self.bounds = Some(bounds);
        self
    }

    /// The `index`th grid point, ignoring bounds.
    pub fn position_at(&self, index: u32) -> Position {
        let along = f64::from(index % self.grid_width);
        let across = f64::from(index / self.grid_width);
        match self.layout {
            GridLayout::RowFirst => Position::new(
                self.min_x + along * self.delta_x,
                self.min_y + across * self.delta_y,
                0.0,
            ),
            GridLayout::ColumnFirst => Position::new(
                self.min_x + across * self.delta_x,
                self.min_y + along * self.delta_y,
                0.0,
            ),
        }
    }

    /// How many consecutive grid points fit inside the bounds. `None` if unbounded.
    pub fn capacity(&self) -> Option<u32> {
        let bounds = self.bounds?;
        let mut count = 0;
        while bounds.contains(self.position_at(count)) {
            count += 1;
            if count == u32::MAX {
                break;
            }
        }
        Some(count)
    }
}

impl PositionAllocator for GridPositionAllocator {
    fn next_position(&mut self) -> Option<Position> {
        let position = self.position_at(self.next);
        if let Some(bounds) = self.bounds {
            if !bounds.contains(position) {
                return None;
            }
        }
        self.next += 1;
        Some(position)
    }
}
