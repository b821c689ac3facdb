use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BitstreamError {
    #[error("invalid bit length {bits} (buffer holds {available} bits)")]
    InvalidLength { bits: i64, available: usize },

    #[error("invalid field width {width} (max {max})")]
    InvalidWidth { width: u32, max: u32 },

    #[error("value {value:#x} does not fit in {width} bits")]
    ValueOverflow { value: u64, width: u32 },

    #[error("writer full: {requested} bits requested, capacity {capacity} bits")]
    BufferFull { requested: usize, capacity: usize },

    #[error("overread: consumed {consumed} bits of {available}")]
    Overread { consumed: usize, available: usize },

    #[error("overlapping VLC codes at table slot {slot}")]
    OverlappingCodes { slot: usize },

    #[error("VLC build failure: {0}")]
    BuildFailure(String),

    #[error("invalid VLC code at bit {position}")]
    InvalidCode { position: usize },

    #[error("symbol frequency sum {sum} overflows 31 bits")]
    FrequencyOverflow { sum: u64 },

    #[error("code for symbol {symbol} is {len} bits long")]
    CodeLengthOverflow { symbol: usize, len: u32 },
}

impl BitstreamError {
    /// Decode-time errors only affect the current unit (frame, subframe, slice).
    ///
    /// Everything else is raised while constructing a reader, writer or table
    /// and should abort initialisation of whatever owns it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BitstreamError::InvalidCode { .. } | BitstreamError::Overread { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BitstreamError>;
