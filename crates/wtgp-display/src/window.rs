//! サーバー主導で操作される 1 枚のウィンドウ

use alloc::vec;
use alloc::vec::Vec;

use crate::cell::TRANSPARENT;
use crate::geom::{Point, Rect};

/// セル内容を持つ矩形ウィンドウ
///
/// `contents` は行優先（y * width + x）で `bounds` と同じ寸法を持つ。
/// 座標系はウィンドウローカル（左上が 0,0）。
#[derive(Debug, Clone)]
pub struct Window {
    id: i32,
    layer: i32,
    bounds: Rect,
    contents: Vec<u32>,
}

impl Window {
    /// 全セルを fill で埋めた新しいウィンドウを生成する
    pub fn new(id: i32, layer: i32, bounds: Rect, fill: u32) -> Self {
        let len = cell_count(&bounds);
        Window {
            id,
            layer,
            bounds,
            contents: vec![fill; len],
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// ローカル座標のセル値（範囲外は透明扱い）
    pub fn cell(&self, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x >= self.bounds.width || y >= self.bounds.height {
            return TRANSPARENT;
        }
        self.contents[(y * self.bounds.width + x) as usize]
    }

    fn set_cell(&mut self, x: i32, y: i32, value: u32) {
        if x < 0 || y < 0 || x >= self.bounds.width || y >= self.bounds.height {
            return;
        }
        self.contents[(y * self.bounds.width + x) as usize] = value;
    }

    /// 位置と寸法を更新する
    ///
    /// 寸法が変わる場合、旧内容との重なり部分は保持され、新規セルは
    /// fill で埋まる。位置だけの変更では内容に触れない。
    pub fn set_bounds(&mut self, bounds: Rect, fill: u32) {
        if bounds.width != self.bounds.width || bounds.height != self.bounds.height {
            let mut contents = vec![fill; cell_count(&bounds)];
            let copy_w = bounds.width.min(self.bounds.width).max(0);
            let copy_h = bounds.height.min(self.bounds.height).max(0);
            for y in 0..copy_h {
                for x in 0..copy_w {
                    contents[(y * bounds.width + x) as usize] =
                        self.contents[(y * self.bounds.width + x) as usize];
                }
            }
            self.contents = contents;
        }
        self.bounds = bounds;
    }

    /// ローカル矩形 rect に values（行優先、rect と同寸法）を書き込む
    ///
    /// ウィンドウ外にはみ出すセルは黙って捨てる。
    pub fn set_contents(&mut self, rect: Rect, values: &[u32]) {
        for y in 0..rect.height {
            for x in 0..rect.width {
                let idx = (y * rect.width + x) as usize;
                if let Some(&value) = values.get(idx) {
                    self.set_cell(rect.x + x, rect.y + y, value);
                }
            }
        }
    }

    /// ローカル矩形 source の内容を dest（左上）へ移動する
    ///
    /// 先に source を一括で読み出してから書き込むので、移動元と移動先が
    /// 重なっていても正しく動く。移動で空いたセルは fill で埋まる。
    pub fn move_contents(&mut self, source: Rect, dest: Point, fill: u32) {
        let mut moved = Vec::with_capacity(cell_count(&source));
        for y in 0..source.height {
            for x in 0..source.width {
                moved.push(self.cell(source.x + x, source.y + y));
            }
        }
        for y in 0..source.height {
            for x in 0..source.width {
                self.set_cell(source.x + x, source.y + y, fill);
            }
        }
        let dest_rect = Rect::new(dest.x, dest.y, source.width, source.height);
        self.set_contents(dest_rect, &moved);
    }
}

fn cell_count(bounds: &Rect) -> usize {
    if bounds.is_empty() {
        0
    } else {
        (bounds.width as usize) * (bounds.height as usize)
    }
}
