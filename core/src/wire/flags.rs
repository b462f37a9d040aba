//! Bit-packed `flags` column.
//!
//! ```text
//! bit  9..6   5        4            3..2    1..0
//!      chans  approx   virtual_aid  repeat  validation
//! ```

/// Validation tri-state. The raw value 3 is not assigned by the server and is
/// kept as [`Validation::Reserved`] rather than folded into another state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    Dubious,
    #[default]
    Pending,
    Confirmed,
    Reserved,
}

impl Validation {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Validation::Pending,
            1 => Validation::Confirmed,
            2 => Validation::Dubious,
            _ => Validation::Reserved,
        }
    }

    /// Numeric form used by the redundant `validated` column.
    pub fn code(self) -> i64 {
        match self {
            Validation::Dubious => -1,
            Validation::Pending => 0,
            Validation::Confirmed => 1,
            Validation::Reserved => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Validation::Dubious),
            0 => Some(Validation::Pending),
            1 => Some(Validation::Confirmed),
            3 => Some(Validation::Reserved),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Validation::Pending => 0,
            Validation::Confirmed => 1,
            Validation::Dubious => 2,
            Validation::Reserved => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Validation::Dubious => "dubious",
            Validation::Pending => "pending",
            Validation::Confirmed => "confirmed",
            Validation::Reserved => "reserved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagWord {
    pub validation: Validation,
    pub repeat: u8,
    pub virtual_aid: bool,
    pub approximate: bool,
    pub channels: u8,
}

impl FlagWord {
    pub fn decode(raw: u32) -> Self {
        Self {
            validation: Validation::from_bits(raw),
            repeat: ((raw >> 2) & 0b11) as u8,
            virtual_aid: (raw >> 4) & 1 == 1,
            approximate: (raw >> 5) & 1 == 1,
            channels: ((raw >> 6) & 0xF) as u8,
        }
    }

    pub fn encode(&self) -> u32 {
        self.validation.bits()
            | (u32::from(self.repeat & 0b11) << 2)
            | (u32::from(self.virtual_aid) << 4)
            | (u32::from(self.approximate) << 5)
            | (u32::from(self.channels & 0xF) << 6)
    }

    /// Channel letters present in the mask, `A` for bit 0.
    pub fn channel_letters(&self) -> String {
        (0..4)
            .filter(|bit| self.channels & (1 << bit) != 0)
            .map(|bit| char::from(b'A' + bit as u8))
            .collect()
    }
}
