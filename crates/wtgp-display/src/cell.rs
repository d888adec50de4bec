//! セル値のエンコーディング
//!
//! 1 セルは 32 ビット整数。下位 16 ビットが文字（UTF-16 コードユニット）、
//! 上位が表示属性フラグ。
//!
//! ```text
//! bit 0..16   文字コード（0 = 透明）
//! bit 16      反転表示
//! bit 17      減光表示
//! ```

/// 前景と背景を反転して描画する
pub const REVERSE_FLAG: u32 = 0x10000;

/// 減光（半輝度）で描画する
pub const DIM_FLAG: u32 = 0x20000;

/// 透明セル。合成時に下のウィンドウを透過する。
pub const TRANSPARENT: u32 = 0;

/// どのウィンドウにも覆われないセルの描画値（空白）
pub const BLANK: u32 = 0x20;

/// セル値から文字コードを取り出す
pub fn glyph(value: u32) -> u16 {
    (value & 0xFFFF) as u16
}

/// 反転フラグが立っているか
pub fn is_reverse(value: u32) -> bool {
    value & REVERSE_FLAG != 0
}

/// 減光フラグが立っているか
pub fn is_dim(value: u32) -> bool {
    value & DIM_FLAG != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let v = u32::from(b'A') | REVERSE_FLAG | DIM_FLAG;
        assert_eq!(glyph(v), u16::from(b'A'));
        assert!(is_reverse(v));
        assert!(is_dim(v));
        assert!(!is_reverse(u32::from(b'A')));
    }
}
