//! 整数セル座標の幾何プリミティブ

/// セル座標上の点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// セル座標上の矩形（幅か高さが 0 以下なら空とみなす）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// 空の矩形
    pub const EMPTY: Rect = Rect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// 右端（排他的）
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// 下端（排他的）
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// 点が矩形内にあるか
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// 両矩形を含む最小の矩形
    ///
    /// 片方が空ならもう片方をそのまま返す。ダーティ領域の累積に使う。
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// 共通部分（重ならなければ空矩形）
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let width = self.right().min(other.right()) - x;
        let height = self.bottom().min(other.bottom()) - y;
        if width <= 0 || height <= 0 {
            Rect::EMPTY
        } else {
            Rect {
                x,
                y,
                width,
                height,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(Rect::EMPTY.is_empty());
        assert!(Rect::new(1, 1, 0, 5).is_empty());
        assert!(Rect::new(1, 1, 5, -1).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(5, 5, 1, 1);
        assert_eq!(a.union(&b), Rect::new(0, 0, 6, 6));
        // 空矩形との合併は相手をそのまま返す
        assert_eq!(Rect::EMPTY.union(&a), a);
        assert_eq!(a.union(&Rect::EMPTY), a);
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(2, 2, 4, 4);
        assert_eq!(a.intersection(&b), Rect::new(2, 2, 2, 2));
        // 重ならない場合は空
        let c = Rect::new(10, 10, 2, 2);
        assert!(a.intersection(&c).is_empty());
        assert!(a.intersection(&Rect::EMPTY).is_empty());
    }

    #[test]
    fn test_contains() {
        let r = Rect::new(1, 1, 2, 2);
        assert!(r.contains(1, 1));
        assert!(r.contains(2, 2));
        assert!(!r.contains(3, 1));
        assert!(!r.contains(0, 1));
    }
}
