//! Value-level serialization over [`DataInput`]/[`DataOutput`]
//!
//! Keys and values stored in a sparse hash container cross the persistence
//! boundary through these two traits. Implementations are provided for the
//! primitive types and owned byte/string containers; user types implement
//! the pair by composing the provided ones.

use crate::error::Result;
use crate::io::data_input::DataInput;
use crate::io::data_output::DataOutput;

/// Types that can write themselves to a [`DataOutput`]
pub trait DataSerialize {
    /// Serialize `self` into the output
    fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()>;
}

/// Types that can reconstruct themselves from a [`DataInput`]
pub trait DataDeserialize: Sized {
    /// Deserialize a value from the input
    fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self>;
}

macro_rules! impl_fixed_width {
    ($($ty:ty => $write:ident, $read:ident, $repr:ty);+ $(;)?) => {
        $(
            impl DataSerialize for $ty {
                #[inline]
                fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()> {
                    output.$write(*self as $repr)
                }
            }

            impl DataDeserialize for $ty {
                #[inline]
                fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
                    Ok(input.$read()? as $ty)
                }
            }
        )+
    };
}

impl_fixed_width! {
    u8  => write_u8,  read_u8,  u8;
    u16 => write_u16, read_u16, u16;
    u32 => write_u32, read_u32, u32;
    u64 => write_u64, read_u64, u64;
    i8  => write_u8,  read_u8,  u8;
    i16 => write_u16, read_u16, u16;
    i32 => write_u32, read_u32, u32;
    i64 => write_u64, read_u64, u64;
}

impl DataSerialize for bool {
    #[inline]
    fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()> {
        output.write_u8(*self as u8)
    }
}

impl DataDeserialize for bool {
    #[inline]
    fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
        Ok(input.read_u8()? != 0)
    }
}

impl DataSerialize for f64 {
    #[inline]
    fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()> {
        output.write_f64(*self)
    }
}

impl DataDeserialize for f64 {
    #[inline]
    fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
        input.read_f64()
    }
}

impl DataSerialize for String {
    #[inline]
    fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()> {
        output.write_length_prefixed_string(self)
    }
}

impl DataDeserialize for String {
    #[inline]
    fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
        input.read_length_prefixed_string()
    }
}

impl DataSerialize for Vec<u8> {
    #[inline]
    fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()> {
        output.write_length_prefixed_bytes(self)
    }
}

impl DataDeserialize for Vec<u8> {
    #[inline]
    fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
        input.read_length_prefixed_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceDataInput, VecDataOutput};

    fn round_trip<T: DataSerialize + DataDeserialize + PartialEq + std::fmt::Debug>(value: T) {
        let mut out = VecDataOutput::new();
        value.serialize_to(&mut out).unwrap();
        let bytes = out.into_vec();
        let mut input = SliceDataInput::new(&bytes);
        let restored = T::deserialize_from(&mut input).unwrap();
        assert_eq!(restored, value);
        assert!(!input.has_more());
    }

    #[test]
    fn test_integer_round_trips() {
        round_trip(0u8);
        round_trip(u8::MAX);
        round_trip(u16::MAX);
        round_trip(u32::MAX);
        round_trip(u64::MAX);
        round_trip(-1i8);
        round_trip(i16::MIN);
        round_trip(i32::MIN);
        round_trip(i64::MIN);
    }

    #[test]
    fn test_misc_round_trips() {
        round_trip(true);
        round_trip(false);
        round_trip(3.25f64);
        round_trip(String::from("sparse hash"));
        round_trip(String::new());
        round_trip(vec![1u8, 2, 3]);
        round_trip(Vec::<u8>::new());
    }
}
