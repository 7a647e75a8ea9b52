//! Byte-level memory primitives exercised by the boot self-test

/// Set every byte of `dst` to `value`
pub fn fill(dst: &mut [u8], value: u8) {
    dst.fill(value);
}

/// Copy `src` into the front of `dst`, returning the number of bytes copied
///
/// Copies `min(dst.len(), src.len())` bytes.
pub fn copy(dst: &mut [u8], src: &[u8]) -> usize {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

/// Length of a NUL-terminated string, not counting the terminator
///
/// A slice without a NUL is measured to its end.
pub fn c_strlen(s: &[u8]) -> usize {
    let mut len = 0;
    while len < s.len() && s[len] != 0 {
        len += 1;
    }
    len
}
