use super::*;

#[test]
fn test_line_map_unix_and_windows_endings() {
    let source = "let a = 1;\nlet b = 2;\r\nlet c = 3;\rend";
    let map = LineMap::build(source);
    assert_eq!(map.line_count(), 4);

    assert_eq!(map.offset_to_position(0, source), SourcePosition::new(0, 0));
    assert_eq!(map.offset_to_position(4, source), SourcePosition::new(0, 4));
    assert_eq!(map.offset_to_position(11, source), SourcePosition::new(1, 0));
    assert_eq!(map.offset_to_position(23, source), SourcePosition::new(2, 0));
    assert_eq!(map.offset_to_position(34, source), SourcePosition::new(3, 0));
}

#[test]
fn test_offset_past_end_is_clamped() {
    let source = "ab";
    let map = LineMap::build(source);
    assert_eq!(map.offset_to_position(99, source), SourcePosition::new(0, 2));
}

#[test]
fn test_columns_count_utf16_units() {
    let source = "\u{1F600}x";
    let map = LineMap::build(source);
    // The emoji is four bytes and two UTF-16 units
    assert_eq!(map.offset_to_position(4, source), SourcePosition::new(0, 2));
}
