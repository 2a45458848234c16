//! Line segments in two dimensions, ordered bottom to top.

/// An edge of a projected triangle with its lower endpoint first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge2d {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    height: f64,
}

impl Edge2d {
    /// Build an edge from two endpoints in either order; the constructor
    /// flips them so `(x0, y0)` is always the lower end.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Edge2d {
        if y0 < y1 {
            Edge2d {
                x0,
                y0,
                x1,
                y1,
                height: y1 - y0,
            }
        } else {
            Edge2d {
                x0: x1,
                y0: y1,
                x1: x0,
                y1: y0,
                height: y0 - y1,
            }
        }
    }

    /// x of the lower endpoint.
    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// y of the lower endpoint.
    pub fn y0(&self) -> f64 {
        self.y0
    }

    /// x of the higher endpoint.
    pub fn x1(&self) -> f64 {
        self.x1
    }

    /// y of the higher endpoint.
    pub fn y1(&self) -> f64 {
        self.y1
    }

    /// The positive vertical extent of the edge.
    pub fn height(&self) -> f64 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_endpoints_by_y() {
        let e = Edge2d::new(5.0, 3.0, 1.0, -2.0);
        assert_eq!(e.x0(), 1.0);
        assert_eq!(e.y0(), -2.0);
        assert_eq!(e.x1(), 5.0);
        assert_eq!(e.y1(), 3.0);
        assert_eq!(e.height(), 5.0);
    }

    #[test]
    fn test_height_nonnegative_for_horizontal() {
        let e = Edge2d::new(0.0, 1.0, 4.0, 1.0);
        assert_eq!(e.height(), 0.0);
        assert_eq!(e.x0(), 4.0);
    }
}
