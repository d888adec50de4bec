//! 画面全体の合成とダーティ領域管理

use alloc::vec;
use alloc::vec::Vec;

use crate::cell::{BLANK, TRANSPARENT};
use crate::geom::{Point, Rect};
use crate::window::Window;

/// 再描画しない前回値。合成結果は 18 ビットに収まるので衝突しない。
const NEVER_RENDERED: u32 = u32::MAX;

/// フェイタルバナー用のウィンドウ ID / レイヤー（常に最前面）
const BANNER_ID: i32 = i32::MAX;

/// 前回描画から変化した 1 セル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellUpdate {
    pub x: i32,
    pub y: i32,
    pub value: u32,
}

/// ウィンドウスタックと差分描画の状態
///
/// 操作はすべてダーティ矩形（単一のバウンディングボックス）を蓄積する
/// だけで、実際の合成は `update_display` まで遅延される。
pub struct Screen {
    width: i32,
    height: i32,
    /// layer 昇順（同値は後着が上）
    windows: Vec<Window>,
    dirty: Rect,
    /// 前回 `update_display` が返した後の画面内容
    rendered: Vec<u32>,
}

impl Screen {
    /// 指定寸法の画面を生成する（初回は全面がダーティ）
    pub fn new(width: u16, height: u16) -> Self {
        let width = i32::from(width);
        let height = i32::from(height);
        Screen {
            width,
            height,
            windows: Vec::new(),
            dirty: Rect::new(0, 0, width, height),
            rendered: vec![BLANK; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// layer 昇順のウィンドウ一覧
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window(&self, id: i32) -> Option<&Window> {
        self.windows.iter().find(|w| w.id() == id)
    }

    fn window_index(&self, id: i32) -> Option<usize> {
        self.windows.iter().position(|w| w.id() == id)
    }

    /// ダーティ領域があるか（次の `update_display` が差分を出し得るか）
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    fn mark_dirty(&mut self, rect: &Rect) {
        self.dirty = self.dirty.union(rect);
    }

    /// layer 順を保ってウィンドウを挿入する
    ///
    /// 上から走査して `layer <= 新規 layer` の最初のウィンドウの直上に
    /// 入れる。同じ layer では後着が上になる。
    fn insert_window(&mut self, window: Window) {
        let mut index = 0;
        for (i, w) in self.windows.iter().enumerate().rev() {
            if w.layer() <= window.layer() {
                index = i + 1;
                break;
            }
        }
        self.windows.insert(index, window);
    }

    /// ウィンドウの生成または位置・寸法・layer の更新
    ///
    /// layer が変わらない限りスタック内の位置は据え置く。同じ layer の
    /// ウィンドウ同士の重なり順は、移動やリサイズでは変化しない。
    pub fn update_window(&mut self, id: i32, layer: i32, bounds: Rect, fill: u32) {
        match self.window_index(id) {
            Some(index) if self.windows[index].layer() == layer => {
                let old = self.windows[index].bounds();
                self.windows[index].set_bounds(bounds, fill);
                self.mark_dirty(&old);
            }
            Some(index) => {
                // layer 変更はスタック内の並べ替えを伴うので一度抜く
                let mut window = self.windows.remove(index);
                self.mark_dirty(&window.bounds());
                window.set_layer(layer);
                window.set_bounds(bounds, fill);
                self.insert_window(window);
            }
            None => self.insert_window(Window::new(id, layer, bounds, fill)),
        }
        self.mark_dirty(&bounds);
    }

    /// ウィンドウを削除する（未知の ID は無視）
    pub fn remove_window(&mut self, id: i32) {
        if let Some(index) = self.window_index(id) {
            let window = self.windows.remove(index);
            self.mark_dirty(&window.bounds());
        }
    }

    /// ウィンドウローカル矩形に内容を書き込む（未知の ID は無視）
    pub fn set_window_contents(&mut self, id: i32, rect: Rect, values: &[u32]) {
        if let Some(index) = self.window_index(id) {
            let window = &mut self.windows[index];
            let origin = window.bounds();
            window.set_contents(rect, values);
            self.mark_dirty(&Rect::new(
                origin.x + rect.x,
                origin.y + rect.y,
                rect.width,
                rect.height,
            ));
        }
    }

    /// ウィンドウ内で矩形内容を移動する（未知の ID は無視）
    pub fn move_window_contents(&mut self, id: i32, source: Rect, dest: Point, fill: u32) {
        if let Some(index) = self.window_index(id) {
            let window = &mut self.windows[index];
            let origin = window.bounds();
            window.move_contents(source, dest, fill);
            let dest_rect = Rect::new(dest.x, dest.y, source.width, source.height);
            let touched = source.union(&dest_rect);
            self.mark_dirty(&Rect::new(
                origin.x + touched.x,
                origin.y + touched.y,
                touched.width,
                touched.height,
            ));
        }
    }

    /// 全ウィンドウを破棄する（再接続時）
    pub fn clear_windows(&mut self) {
        self.windows.clear();
        self.dirty = Rect::new(0, 0, self.width, self.height);
    }

    /// 前回描画の記憶を捨てて全面再描画を要求する
    pub fn invalidate(&mut self) {
        for cell in self.rendered.iter_mut() {
            *cell = NEVER_RENDERED;
        }
        self.dirty = Rect::new(0, 0, self.width, self.height);
    }

    /// 画面中央に '#' 枠のバナーウィンドウを最前面で表示する
    ///
    /// 接続断やサーバーからの close 理由の提示に使う。通常の合成経路を
    /// 通るので、呼び出し後の `update_display` で差分として現れる。
    pub fn show_banner(&mut self, text: &str) {
        let mut values: Vec<u32> = Vec::new();
        values.push(BLANK);
        for unit in text.encode_utf16() {
            values.push(u32::from(unit));
        }
        values.push(BLANK);

        let width = values.len() as i32;
        let height = 3;
        let bounds = Rect::new(
            (self.width - width) / 2,
            (self.height - height) / 2,
            width,
            height,
        );
        self.update_window(BANNER_ID, i32::MAX, bounds, u32::from(b'#'));
        self.set_window_contents(BANNER_ID, Rect::new(0, 1, width, 1), &values);
    }

    /// ダーティ領域を再合成し、前回描画から変化したセルを返す
    ///
    /// 返したセルは描画済みとして記録され、ダーティ領域は空に戻る。
    pub fn update_display(&mut self) -> Vec<CellUpdate> {
        let screen_rect = Rect::new(0, 0, self.width, self.height);
        let bounds = self.dirty.intersection(&screen_rect);
        self.dirty = Rect::EMPTY;
        if bounds.is_empty() {
            return Vec::new();
        }

        // ダーティ矩形内を下から上へ合成（0 = 透明はスキップ）
        let mut combined = vec![TRANSPARENT; (bounds.width * bounds.height) as usize];
        for window in &self.windows {
            let isect = window.bounds().intersection(&bounds);
            if isect.is_empty() {
                continue;
            }
            let origin = window.bounds();
            for y in isect.y..isect.bottom() {
                for x in isect.x..isect.right() {
                    let value = window.cell(x - origin.x, y - origin.y);
                    if value != TRANSPARENT {
                        combined[((y - bounds.y) * bounds.width + (x - bounds.x)) as usize] =
                            value;
                    }
                }
            }
        }

        let mut updates = Vec::new();
        for y in bounds.y..bounds.bottom() {
            for x in bounds.x..bounds.right() {
                let value =
                    match combined[((y - bounds.y) * bounds.width + (x - bounds.x)) as usize] {
                        TRANSPARENT => BLANK,
                        v => v,
                    };
                let index = (y * self.width + x) as usize;
                if self.rendered[index] != value {
                    self.rendered[index] = value;
                    updates.push(CellUpdate { x, y, value });
                }
            }
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(screen: &Screen) -> Vec<i32> {
        screen.windows().iter().map(|w| w.layer()).collect()
    }

    fn cell_at(updates: &[CellUpdate], x: i32, y: i32) -> Option<u32> {
        updates
            .iter()
            .find(|u| u.x == x && u.y == y)
            .map(|u| u.value)
    }

    #[test]
    fn test_layer_insertion_order() {
        let mut screen = Screen::new(20, 10);
        for (id, layer) in [(10, 3), (11, 1), (12, 3), (13, 2)] {
            screen.update_window(id, layer, Rect::new(0, 0, 1, 1), 0);
        }
        assert_eq!(layers(&screen), vec![1, 2, 3, 3]);
        // layer 3 同士は後着（id=12）が上
        let ids: Vec<i32> = screen.windows().iter().map(|w| w.id()).collect();
        assert_eq!(ids, vec![11, 13, 10, 12]);
    }

    #[test]
    fn test_relayer_repositions() {
        let mut screen = Screen::new(20, 10);
        screen.update_window(1, 5, Rect::new(0, 0, 1, 1), 0);
        screen.update_window(2, 9, Rect::new(0, 0, 1, 1), 0);
        screen.update_window(1, 9, Rect::new(0, 0, 1, 1), 0);
        // 1 は layer 9 に上がり、同値なので 2 の上に来る
        let ids: Vec<i32> = screen.windows().iter().map(|w| w.id()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_same_layer_update_keeps_stacking() {
        let mut screen = Screen::new(20, 10);
        screen.update_window(1, 3, Rect::new(0, 0, 2, 1), u32::from(b'a'));
        screen.update_window(2, 3, Rect::new(0, 0, 2, 1), u32::from(b'b'));
        // layer 据え置きの移動・リサイズでは 2 が上のまま
        screen.update_window(1, 3, Rect::new(0, 0, 3, 1), u32::from(b'a'));
        let ids: Vec<i32> = screen.windows().iter().map(|w| w.id()).collect();
        assert_eq!(ids, vec![1, 2]);

        let updates = screen.update_display();
        assert_eq!(cell_at(&updates, 0, 0), Some(u32::from(b'b')));
        assert_eq!(cell_at(&updates, 2, 0), Some(u32::from(b'a')));
    }

    #[test]
    fn test_composite_uncovered_is_blank() {
        let mut screen = Screen::new(4, 1);
        screen.update_window(1, 0, Rect::new(0, 0, 2, 1), u32::from(b'A'));
        let updates = screen.update_display();
        assert_eq!(cell_at(&updates, 0, 0), Some(u32::from(b'A')));
        // 初回描画バッファは空白なので、覆われないセルは差分に出ない
        assert_eq!(cell_at(&updates, 3, 0), None);
    }

    #[test]
    fn test_transparency_shows_lower_window() {
        let mut screen = Screen::new(3, 1);
        screen.update_window(1, 0, Rect::new(0, 0, 3, 1), u32::from(b'a'));
        // 上のウィンドウの中央セルだけ透明
        screen.update_window(2, 1, Rect::new(0, 0, 3, 1), u32::from(b'b'));
        screen.set_window_contents(2, Rect::new(1, 0, 1, 1), &[TRANSPARENT]);
        let updates = screen.update_display();
        assert_eq!(cell_at(&updates, 0, 0), Some(u32::from(b'b')));
        assert_eq!(cell_at(&updates, 1, 0), Some(u32::from(b'a')));
        assert_eq!(cell_at(&updates, 2, 0), Some(u32::from(b'b')));
    }

    #[test]
    fn test_diff_only_changed_cells() {
        let mut screen = Screen::new(4, 1);
        screen.update_window(1, 0, Rect::new(0, 0, 4, 1), u32::from(b'x'));
        screen.update_display();
        // 変更なしなら空
        assert!(screen.update_display().is_empty());

        screen.set_window_contents(1, Rect::new(2, 0, 1, 1), &[u32::from(b'y')]);
        let updates = screen.update_display();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0], CellUpdate { x: 2, y: 0, value: u32::from(b'y') });
    }

    #[test]
    fn test_remove_window_reveals_below() {
        let mut screen = Screen::new(2, 1);
        screen.update_window(1, 0, Rect::new(0, 0, 2, 1), u32::from(b'u'));
        screen.update_window(2, 1, Rect::new(0, 0, 2, 1), u32::from(b'o'));
        screen.update_display();

        screen.remove_window(2);
        let updates = screen.update_display();
        assert_eq!(cell_at(&updates, 0, 0), Some(u32::from(b'u')));
        assert_eq!(cell_at(&updates, 1, 0), Some(u32::from(b'u')));
    }

    #[test]
    fn test_remove_last_window_blanks() {
        let mut screen = Screen::new(2, 1);
        screen.update_window(1, 0, Rect::new(0, 0, 2, 1), u32::from(b'z'));
        screen.update_display();
        screen.remove_window(1);
        let updates = screen.update_display();
        assert_eq!(cell_at(&updates, 0, 0), Some(BLANK));
    }

    #[test]
    fn test_unknown_id_ignored() {
        let mut screen = Screen::new(4, 2);
        screen.update_display();
        screen.remove_window(42);
        screen.set_window_contents(42, Rect::new(0, 0, 1, 1), &[1]);
        screen.move_window_contents(42, Rect::new(0, 0, 1, 1), Point::new(1, 0), 0);
        assert!(screen.update_display().is_empty());
    }

    #[test]
    fn test_window_partially_offscreen() {
        let mut screen = Screen::new(3, 3);
        // 画面左上をまたぐウィンドウ。ダーティは画面内に切り詰められる。
        screen.update_window(1, 0, Rect::new(-2, -2, 4, 4), u32::from(b'#'));
        let updates = screen.update_display();
        assert_eq!(cell_at(&updates, 0, 0), Some(u32::from(b'#')));
        assert_eq!(cell_at(&updates, 1, 1), Some(u32::from(b'#')));
        assert_eq!(cell_at(&updates, 2, 2), None);
        assert!(updates.iter().all(|u| u.x >= 0 && u.y >= 0));
    }

    #[test]
    fn test_invalidate_repaints_everything() {
        let mut screen = Screen::new(2, 2);
        screen.update_window(1, 0, Rect::new(0, 0, 2, 2), u32::from(b'q'));
        screen.update_display();
        assert!(screen.update_display().is_empty());

        screen.invalidate();
        let updates = screen.update_display();
        assert_eq!(updates.len(), 4);
    }

    #[test]
    fn test_move_contents_marks_both_regions() {
        let mut screen = Screen::new(8, 1);
        screen.update_window(1, 0, Rect::new(0, 0, 8, 1), 0);
        screen.set_window_contents(1, Rect::new(0, 0, 2, 1), &[1, 2]);
        screen.update_display();

        screen.move_window_contents(1, Rect::new(0, 0, 2, 1), Point::new(6, 0), 0);
        let updates = screen.update_display();
        // 移動元は空白（fill 0 → 透明 → 空白）、移動先に内容
        assert_eq!(cell_at(&updates, 0, 0), Some(BLANK));
        assert_eq!(cell_at(&updates, 6, 0), Some(1));
        assert_eq!(cell_at(&updates, 7, 0), Some(2));
    }

    #[test]
    fn test_banner_geometry_and_contents() {
        let mut screen = Screen::new(80, 24);
        screen.show_banner("Connection closed");
        let window = screen.window(i32::MAX).unwrap();
        // " Connection closed " は 19 セル
        assert_eq!(window.bounds(), Rect::new(30, 10, 19, 3));
        assert_eq!(window.layer(), i32::MAX);
        assert_eq!(window.cell(0, 0), u32::from(b'#'));
        assert_eq!(window.cell(0, 1), BLANK);
        assert_eq!(window.cell(1, 1), u32::from(b'C'));
        assert_eq!(window.cell(18, 2), u32::from(b'#'));
    }

    #[test]
    fn test_clear_windows() {
        let mut screen = Screen::new(2, 1);
        screen.update_window(1, 0, Rect::new(0, 0, 2, 1), u32::from(b'c'));
        screen.update_display();
        screen.clear_windows();
        let updates = screen.update_display();
        assert_eq!(cell_at(&updates, 0, 0), Some(BLANK));
        assert!(screen.windows().is_empty());
    }
}
