use core::fmt;

/// Everything that can go wrong while taking apart (or validating) an IE,
/// a facility payload or an ASN.1 element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduParseErr {
    /// Tag byte differs from the one required at this position
    InvalidTag { expected: u64, found: u64 },
    /// Cursor would move past the end of the supplied slice
    BufferEnded { field: Option<&'static str> },
    /// Declared length is below the minimum for this element
    TooShort { field: &'static str, min: usize, found: usize },
    /// Declared length does not fit in the remaining input
    InconsistentLength { expected: usize, found: usize },
    InvalidValue { field: &'static str, value: u64 },
    Inconsistency { field: &'static str, reason: &'static str },
    /// Encoding would exceed a fixed-size staging area
    BufferFull { field: &'static str, capacity: usize },
    NotImplemented { field: Option<&'static str> },
}

impl fmt::Display for PduParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PduParseErr::InvalidTag { expected, found } => write!(f, "invalid tag 0x{:02x}, expected 0x{:02x}", found, expected),
            PduParseErr::BufferEnded { field } => write!(f, "buffer ended while reading {}", field.unwrap_or("?")),
            PduParseErr::TooShort { field, min, found } => write!(f, "{} too short ({} < {})", field, found, min),
            PduParseErr::InconsistentLength { expected, found } => write!(f, "length {} exceeds available {}", expected, found),
            PduParseErr::InvalidValue { field, value } => write!(f, "{} out of range ({})", field, value),
            PduParseErr::Inconsistency { field, reason } => write!(f, "{}: {}", field, reason),
            PduParseErr::BufferFull { field, capacity } => write!(f, "{} does not fit in {} bytes", field, capacity),
            PduParseErr::NotImplemented { field } => write!(f, "not implemented: {}", field.unwrap_or("?")),
        }
    }
}

impl std::error::Error for PduParseErr {}

/// Checks whether a tag byte matches the expected value. If not, returns PduParseErr::InvalidTag
#[macro_export]
macro_rules! expect_tag {
    ($value:expr, $expected:expr) => {{
        let found = $value as u64;
        let expected = $expected as u64;
        if found == expected {
            Ok(())
        } else {
            Err($crate::PduParseErr::InvalidTag { expected, found })
        }
    }};
}

/// Checks whether a value matches an expected value. If not, returns PduParseErr::InvalidValue
#[macro_export]
macro_rules! expect_value {
    ($value:ident, $expected:expr) => {
        $crate::expect_value!(@inner $value, $expected, stringify!($value))
    };
    ($value:expr, $expected:expr, $field:expr) => {
        $crate::expect_value!(@inner $value, $expected, $field)
    };

    (@inner $value:expr, $expected:expr, $field:expr) => {{
        let val = $value;
        if val == $expected {
            Ok(())
        } else {
            Err($crate::PduParseErr::InvalidValue {
                field: $field,
                value: val as u64,
            })
        }
    }};
}

/// Use when a range check has already failed. Generates a PduParseErr::InvalidValue
#[macro_export]
macro_rules! expect_failed {
    ($value:ident) => {
        $crate::expect_failed!(@inner $value, stringify!($value))
    };
    ($value:expr, $field:expr) => {
        $crate::expect_failed!(@inner $value, $field)
    };

    (@inner $value:expr, $field:expr) => {{
        Err($crate::PduParseErr::InvalidValue {
            field: $field,
            value: $value as u64,
        })
    }};
}

/// Range check for encoder inputs, returns PduParseErr::InvalidValue when `value` is outside `range`
#[macro_export]
macro_rules! expect_range {
    ($value:expr, $range:expr, $field:expr) => {{
        let val = $value;
        if ($range).contains(&val) {
            Ok(())
        } else {
            Err($crate::PduParseErr::InvalidValue {
                field: $field,
                value: val as u64,
            })
        }
    }};
}

/// Rejects an IE body shorter than `min` bytes with PduParseErr::TooShort
#[macro_export]
macro_rules! expect_min_len {
    ($body:expr, $min:expr, $field:expr) => {{
        let found = $body.len();
        if found >= $min {
            Ok(())
        } else {
            Err($crate::PduParseErr::TooShort {
                field: $field,
                min: $min,
                found,
            })
        }
    }};
}

/// Reads one octet from a ByteCursor, naming the field after the binding
#[macro_export]
macro_rules! let_octet {
    ($cur:expr, $ident:ident) => {
        let $ident = $cur.read_u8(stringify!($ident))?;
    };
}
