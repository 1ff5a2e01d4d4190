//! Flat 256-byte address space and its code/stack partition.

/// Code/stack region map.
pub mod map;

pub use map::{LayoutError, MemoryLayout, MemoryRegion, DEFAULT_STACK_SIZE, STACK_TOP};

/// Size in bytes of the flat address space.
pub const ADDRESS_SPACE_BYTES: usize = u8::MAX as usize + 1;

/// Backing store for the whole address space. Indexed by `u8` addresses.
pub type AddressSpace = [u8; ADDRESS_SPACE_BYTES];

/// Allocates a zeroed address space.
#[must_use]
pub const fn new_address_space() -> AddressSpace {
    [0; ADDRESS_SPACE_BYTES]
}

/// Serde adapter storing the address space as a plain byte sequence.
#[cfg(feature = "serde")]
pub(crate) mod image_serde {
    use super::AddressSpace;

    pub(crate) fn serialize<S>(memory: &AddressSpace, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(memory.iter())
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<AddressSpace, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = <Vec<u8> as serde::Deserialize<'de>>::deserialize(deserializer)?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| {
            serde::de::Error::invalid_length(len, &"exactly 256 memory bytes")
        })
    }
}
