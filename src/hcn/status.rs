//! Decoding of the 32-bit status word returned by native entry points

use std::fmt;

pub const ERROR_ACCESS_DENIED: u32 = 5;
pub const ERROR_INVALID_HANDLE: u32 = 6;
pub const ERROR_NOT_FOUND: u32 = 0x490;

pub const HCN_E_NETWORK_NOT_FOUND: u32 = 0x803B_0001;
pub const HCN_E_ENDPOINT_NOT_FOUND: u32 = 0x803B_0002;
pub const HCN_E_PORT_ALREADY_EXISTS: u32 = 0x803B_0013;

/// Facility bits that mark an HRESULT wrapping a Win32 error.
const WIN32_FACILITY_MASK: u32 = 0x1fff_0000;
const WIN32_FACILITY: u32 = 0x0007_0000;

/// A failed status, decided once at the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Win32 error number recovered from a `FACILITY_WIN32` HRESULT
    Errno(u32),
    /// Any other failing HRESULT, kept as returned
    Hresult(i32),
}

impl Status {
    /// Decode a status word. Zero and positive values are success and yield `None`.
    pub fn decode(code: i32) -> Option<Self> {
        if code >= 0 {
            return None;
        }
        let raw = code as u32;
        if raw & WIN32_FACILITY_MASK == WIN32_FACILITY {
            Some(Status::Errno(raw & 0xffff))
        } else {
            Some(Status::Hresult(code))
        }
    }

    /// Numeric code: the errno for `Errno`, the HRESULT bits otherwise
    pub fn code(&self) -> u32 {
        match self {
            Status::Errno(errno) => *errno,
            Status::Hresult(hr) => *hr as u32,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Status::Errno(errno) => *errno == ERROR_NOT_FOUND,
            Status::Hresult(hr) => matches!(
                *hr as u32,
                HCN_E_NETWORK_NOT_FOUND | HCN_E_ENDPOINT_NOT_FOUND
            ),
        }
    }

    pub fn is_access_denied(&self) -> bool {
        *self == Status::Errno(ERROR_ACCESS_DENIED)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Errno(errno) => write!(f, "Win32 error {}", errno),
            Status::Hresult(hr) => write!(f, "HRESULT 0x{:08X}", *hr as u32),
        }
    }
}

/// Turn a status word into a `Result`.
pub fn check(code: i32) -> Result<(), Status> {
    match Status::decode(code) {
        Some(status) => Err(status),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_codes() {
        assert_eq!(Status::decode(0), None);
        assert_eq!(Status::decode(1), None);
        assert_eq!(Status::decode(i32::MAX), None);
        assert!(check(0).is_ok());
    }

    #[test]
    fn test_win32_facility_is_remapped() {
        for low in [0u32, 2, 5, 0x490, 0xffff] {
            let code = (0x8007_0000 | low) as i32;
            assert_eq!(Status::decode(code), Some(Status::Errno(low)));
        }
        // Severity and reserved bits outside the mask do not matter
        assert_eq!(
            Status::decode(0xE007_0057u32 as i32),
            Some(Status::Errno(0x57))
        );
    }

    #[test]
    fn test_other_failures_pass_through() {
        for raw in [0x8000_4001u32, 0x803B_0001, 0x8037_011B, 0x8017_0005, 0xFFFF_FFFF] {
            assert_eq!(Status::decode(raw as i32), Some(Status::Hresult(raw as i32)));
            assert_eq!(Status::decode(raw as i32).unwrap().code(), raw);
        }
    }

    #[test]
    fn test_well_known_codes() {
        assert!(Status::Errno(ERROR_NOT_FOUND).is_not_found());
        assert!(Status::Hresult(HCN_E_ENDPOINT_NOT_FOUND as i32).is_not_found());
        assert!(!Status::Hresult(HCN_E_PORT_ALREADY_EXISTS as i32).is_not_found());
        assert!(Status::Errno(ERROR_ACCESS_DENIED).is_access_denied());
        assert_eq!(Status::Hresult(0x803B_0001u32 as i32).to_string(), "HRESULT 0x803B0001");
    }
}
