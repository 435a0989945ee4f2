/// Axis-aligned rectangle, half-open on the max edges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        min_x: 0,
        min_y: 0,
        max_x: 0,
        max_y: 0,
    };

    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Rect {
        Rect {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Rect {
        Rect::new(
            x,
            y,
            x.saturating_add_unsigned(width),
            y.saturating_add_unsigned(height),
        )
    }

    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.min_x.saturating_add(dx),
            self.min_y.saturating_add(dy),
            self.max_x.saturating_add(dx),
            self.max_y.saturating_add(dy),
        )
    }

    /// Overlap of two rectangles. Disjoint inputs yield `Rect::ZERO`.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let rect = Rect::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );

        if rect.is_empty() { Rect::ZERO } else { rect }
    }
}
