//! Byte-span serialization transport
//!
//! The container core persists itself through a pair of narrow interfaces:
//! [`DataOutput`] receives raw byte spans, [`DataInput`] supplies them back.
//! [`DataSerialize`] and [`DataDeserialize`] describe how individual keys
//! and values cross that boundary. No file or wire format beyond the byte
//! stream itself is imposed here.

mod data_input;
mod data_output;
mod serialize;
mod var_int;

pub use data_input::{DataInput, SliceDataInput};
pub use data_output::{DataOutput, VecDataOutput};
pub use serialize::{DataDeserialize, DataSerialize};
pub use var_int::VarInt;
