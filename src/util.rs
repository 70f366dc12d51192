pub(crate) fn digit_vec(int_str: &str) -> Vec<u8> {
    int_str
        .chars()
        .filter_map(|c| c.to_digit(10))
        .filter_map(|u| u8::try_from(u).ok())
        .collect()
}

/// Byte offsets of `separator` that sit outside any parenthetical group.
fn top_level_positions(value: &str, separator: char) -> Vec<usize> {
    let mut depth = 0_usize;
    value
        .char_indices()
        .filter_map(|(i, c)| {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if c == separator && depth == 0 => return Some(i),
                _ => {}
            }
            None
        })
        .collect()
}

/// Splits on the first `separator` outside parentheses.
pub(crate) fn split_once_top_level(value: &str, separator: char) -> (&str, Option<&str>) {
    top_level_positions(value, separator)
        .first()
        .map_or((value, None), |&i| {
            (&value[..i], Some(&value[i + separator.len_utf8()..]))
        })
}

/// Splits on every `separator` outside parentheses, dropping empty pieces.
pub(crate) fn split_top_level(value: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for i in top_level_positions(value, separator) {
        pieces.push(&value[start..i]);
        start = i + separator.len_utf8();
    }
    pieces.push(&value[start..]);
    pieces.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Returns the first fielder digit following an `E`, scanning left to right.
pub(crate) fn first_error_digit(value: &str) -> Option<u8> {
    value
        .as_bytes()
        .windows(2)
        .find(|w| w[0] == b'E' && w[1].is_ascii_digit())
        .map(|w| w[1] - b'0')
}
