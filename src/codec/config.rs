//! Engine configuration

/// Default recursion limit for nested messages and packed runs
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Bytes reserved ahead of a nested message or packed run while its length
/// is unknown: room for a 5-byte key varint and a 5-byte length varint.
pub const NESTED_RESERVE_BYTES: usize = 10;

/// Limits shared by the decode, encode, and struct-mapping engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecConfig {
    /// Maximum number of simultaneously open frames, root included.
    pub max_depth: usize,
}

impl CodecConfig {
    /// Configuration with a custom recursion limit.
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
