//! UTF-16 string marshalling

use crate::{Error, Result};

/// Null-terminated UTF-16 buffer handed to native entry points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideString {
    units: Vec<u16>,
}

impl WideString {
    /// Encode `value`, naming `argument` in the error if it holds a NUL.
    pub fn new(argument: &'static str, value: &str) -> Result<Self> {
        if value.contains('\0') {
            return Err(Error::InvalidString { argument });
        }
        let mut units: Vec<u16> = value.encode_utf16().collect();
        units.push(0);
        Ok(Self { units })
    }

    pub fn as_ptr(&self) -> *const u16 {
        self.units.as_ptr()
    }

    /// Code units without the terminator
    pub fn as_units(&self) -> &[u16] {
        &self.units[..self.units.len() - 1]
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_units())
    }
}

/// Decode a null-terminated UTF-16 buffer owned by someone else.
///
/// # Safety
///
/// `ptr` must be null or point to a readable, null-terminated UTF-16 sequence.
pub unsafe fn read_wide(ptr: *const u16) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0usize;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    let units = std::slice::from_raw_parts(ptr, len);
    Some(String::from_utf16_lossy(units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for s in ["", "{}", r#"{"Name":"nat"}"#, "ünïcödé", "𝄞 clef", "a\u{FFFF}b"] {
            let wide = WideString::new("settings", s).unwrap();
            assert_eq!(wide.to_string_lossy(), s);
            let decoded = unsafe { read_wide(wide.as_ptr()) };
            assert_eq!(decoded.as_deref(), Some(s));
        }
    }

    #[test]
    fn test_terminator() {
        let wide = WideString::new("query", "ab").unwrap();
        assert_eq!(wide.as_units(), &[b'a' as u16, b'b' as u16]);
        assert_eq!(unsafe { *wide.as_ptr().add(2) }, 0);
    }

    #[test]
    fn test_embedded_nul_rejected() {
        let err = WideString::new("settings", "{\0}").unwrap_err();
        assert!(matches!(err, Error::InvalidString { argument: "settings" }));
    }

    #[test]
    fn test_read_null() {
        assert_eq!(unsafe { read_wide(std::ptr::null()) }, None);
    }
}
