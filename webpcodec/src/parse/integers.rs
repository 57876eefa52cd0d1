#![allow(missing_docs)]

use std::mem::size_of;
use std::num::NonZeroU32;

use bitflags::Flags;
use bytes::{Buf, BufMut};
use webpcodec_common::error::WhileParsingType;
use webpcodec_common::parse::FourCC;
use webpcodec_common::{ensure_attach, report_attach, Result, ResultExt};

use crate::CodecError;

/// A fixed-size little-endian value stored in a RIFF chunk.
pub trait RiffPrim: Sized {
    const ENCODED_LEN: u32;
    fn parse<B: Buf>(buf: B) -> Result<Self, CodecError>;
    fn put_buf<B: BufMut>(&self, buf: B);
}

pub trait RiffFlags: Flags {}

/// A 24-bit value stored minus one, so that it is never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OneBasedU24(NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Reserved<const LEN: u32>(());

//
// RiffPrim impls
//

macro_rules! riff_int {
    ($($ty:ty => ($get_fun:ident, $put_fun:ident)),+ $(,)?) => {
        $(impl RiffPrim for $ty {
            const ENCODED_LEN: u32 = size_of::<Self>() as u32;

            fn parse<B: Buf>(mut buf: B) -> Result<Self, CodecError> {
                ensure_remaining::<Self, _>(&buf)?;
                Ok(buf.$get_fun())
            }

            fn put_buf<B: BufMut>(&self, mut buf: B) {
                buf.$put_fun(*self)
            }
        })+
    };
}

riff_int! {
    u8 => (get_u8, put_u8),
    u16 => (get_u16_le, put_u16_le),
    u32 => (get_u32_le, put_u32_le),
}

impl RiffPrim for FourCC {
    const ENCODED_LEN: u32 = FourCC::ENCODED_LEN;

    fn parse<B: Buf>(buf: B) -> Result<Self, CodecError> {
        ensure_remaining::<Self, _>(&buf)?;
        Ok(FourCC::parse(buf))
    }

    fn put_buf<B: BufMut>(&self, buf: B) {
        FourCC::put_buf(self, buf)
    }
}

/// Container values are read from within a chunk, so running out of input means the chunk is too short.
fn ensure_remaining<T: RiffPrim, B: Buf>(buf: &B) -> Result<(), CodecError> {
    ensure_attach!(
        buf.remaining() >= T::ENCODED_LEN as usize,
        CodecError::MalformedContainer,
        WhileParsingType::new::<T>(),
    );
    Ok(())
}

//
// RiffFlags impls
//

impl<T: RiffFlags> RiffPrim for T
where
    T::Bits: TryFrom<u64> + Into<u64>,
{
    const ENCODED_LEN: u32 = size_of::<<Self as Flags>::Bits>() as u32;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, CodecError> {
        ensure_remaining::<Self, _>(&buf)?;
        let value = buf.get_uint_le(Self::ENCODED_LEN as usize);
        let value = value.try_into().unwrap_or_else(|_| unreachable!());
        Self::from_bits(value)
            .ok_or_else(|| report_attach!(CodecError::MalformedContainer, "non-zero reserved bits"))
            .while_parsing_type()
    }

    fn put_buf<B: BufMut>(&self, mut buf: B) {
        buf.put_uint_le(self.bits().into(), Self::ENCODED_LEN as usize);
    }
}

//
// OneBasedU24 impls
//

impl OneBasedU24 {
    pub const MAX: u32 = 1 << 24;

    /// Returns `None` if `value` is larger than [`Self::MAX`].
    pub fn new(value: NonZeroU32) -> Option<Self> {
        (value.get() <= Self::MAX).then_some(Self(value))
    }

    pub fn get(&self) -> NonZeroU32 {
        self.0
    }
}

impl RiffPrim for OneBasedU24 {
    const ENCODED_LEN: u32 = 3;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, CodecError> {
        ensure_remaining::<Self, _>(&buf)?;
        let value = NonZeroU32::MIN.saturating_add(buf.get_uint_le(Self::ENCODED_LEN as usize) as u32);
        Ok(Self(value))
    }

    fn put_buf<B: BufMut>(&self, mut buf: B) {
        buf.put_uint_le(u64::from(self.0.get()) - 1, Self::ENCODED_LEN as usize);
    }
}

//
// Reserved impls
//

impl<const LEN: u32> RiffPrim for Reserved<LEN> {
    const ENCODED_LEN: u32 = LEN;

    fn parse<B: Buf>(mut buf: B) -> Result<Self, CodecError> {
        ensure_remaining::<Self, _>(&buf)?;
        for _ in 0..LEN {
            ensure_attach!(
                buf.get_u8() == 0,
                CodecError::MalformedContainer,
                "non-zero reserved bits",
                WhileParsingType::new::<Self>(),
            );
        }
        Ok(Self(()))
    }

    fn put_buf<B: BufMut>(&self, mut buf: B) {
        for _ in 0..LEN {
            buf.put_u8(0);
        }
    }
}
