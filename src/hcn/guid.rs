//! Binary GUID layout used by HCN entry points

use uuid::Uuid;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawGuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl From<&Uuid> for RawGuid {
    fn from(id: &Uuid) -> Self {
        let (data1, data2, data3, data4) = id.as_fields();
        Self {
            data1,
            data2,
            data3,
            data4: *data4,
        }
    }
}

impl From<RawGuid> for Uuid {
    fn from(guid: RawGuid) -> Self {
        Uuid::from_fields(guid.data1, guid.data2, guid.data3, &guid.data4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_layout() {
        let id = Uuid::parse_str("a42e7cda-d03f-480c-9cc2-a4de20abb878").unwrap();
        let guid = RawGuid::from(&id);
        assert_eq!(guid.data1, 0xa42e7cda);
        assert_eq!(guid.data2, 0xd03f);
        assert_eq!(guid.data3, 0x480c);
        assert_eq!(guid.data4, [0x9c, 0xc2, 0xa4, 0xde, 0x20, 0xab, 0xb8, 0x78]);
        assert_eq!(Uuid::from(guid), id);
        assert_eq!(std::mem::size_of::<RawGuid>(), 16);
    }
}
