use std::ops::{Add, Mul};

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(self) -> Size<T> {
        Size::new(self.width, self.height)
    }
}

impl<T: Add<Output = T> + Copy> Rect<T> {
    /// Right edge (`x + width`).
    pub fn max_x(&self) -> T {
        self.x + self.width
    }

    /// Bottom edge (`y + height`) in a y-down space.
    pub fn max_y(&self) -> T {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub const fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn cast<U: From<T>>(self) -> Size<U> {
        Size {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl<T: Mul + Copy> Mul<T> for Size<T> {
    type Output = Size<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Size {
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0_f32, 5.0, 20.0, 15.0);
        assert_eq!(rect.max_x(), 30.0);
        assert_eq!(rect.max_y(), 20.0);
        assert_eq!(rect.size(), Size::new(20.0, 15.0));
    }

    #[test]
    fn test_size_cast_and_scale() {
        let size: Size<f64> = Size::new(4_u32, 3).cast();
        assert_eq!(size, Size::new(4.0, 3.0));
        assert_eq!(Size::new(4, 3) * 2, Size::new(8, 6));
    }
}
