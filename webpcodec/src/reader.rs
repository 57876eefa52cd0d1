use webpcodec_common::error::WhileParsingType;
use webpcodec_common::parse::FourCC;
use webpcodec_common::{bail_attach, ensure_attach, InputSpan, ResultExt};

use crate::error::{CodecResultExt, ExpectedChunk, WhileParsingChunk};
use crate::parse::{ChunkHeader, ParseChunk, RiffPrim};
use crate::{CodecError, Error};

/// Reads the chunks of an in-memory RIFF file, or of the data of a chunk containing other chunks.
pub struct ChunkReader<'a> {
    input: &'a [u8],
    /// The offset of `input` from the start of the file.
    offset: u64,
    state: State<'a>,
}

enum State<'a> {
    Idle { last: FourCC },
    ReadingBody { header: ChunkHeader, data_offset: u64, data: &'a [u8] },
}

//
// ChunkReader impls
//

impl<'a> ChunkReader<'a> {
    pub fn new(input: &'a [u8], chunk_name: FourCC) -> Self {
        Self { input, offset: 0, state: State::Idle { last: chunk_name } }
    }

    pub fn has_remaining(&self) -> bool {
        !self.input.is_empty()
    }

    /// The number of bytes following the current chunk.
    pub fn remaining_len(&self) -> usize {
        self.input.len()
    }

    /// Read the name of the next chunk, without consuming its header.
    pub fn peek_header(&self) -> Result<Option<FourCC>, Error> {
        if !self.has_remaining() {
            return Ok(None);
        }
        let header = ChunkHeader::parse(self.input).while_parsing_type()?;
        Ok(Some(header.name))
    }

    /// Read a specific chunk header.
    pub fn read_header(&mut self, name: FourCC) -> Result<InputSpan, Error> {
        ensure_attach!(self.has_remaining(), CodecError::MalformedContainer, ExpectedChunk(name));
        let (read_name, span) = self.read_any_header()?;
        ensure_attach!(
            read_name == name,
            CodecError::MalformedContainer,
            ExpectedChunk(name),
            WhileParsingChunk(read_name),
        );
        Ok(span)
    }

    /// Read a chunk header, skipping any unread data of the previous chunk.
    pub fn read_any_header(&mut self) -> Result<(FourCC, InputSpan), Error> {
        ensure_attach!(
            self.has_remaining(),
            CodecError::MalformedContainer,
            "missing chunk",
            WhileParsingChunk(self.current_chunk_name()),
        );
        let offset = self.offset;
        let header = ChunkHeader::parse(&mut self.input).while_parsing_type()?;
        self.offset += u64::from(ChunkHeader::ENCODED_LEN);

        let len = header.len as usize;
        ensure_attach!(
            len <= self.input.len(),
            CodecError::MalformedContainer,
            "chunk extends past the end of the input",
            WhileParsingChunk(header.name),
        );
        let (data, rest) = self.input.split_at(len);
        let data_offset = self.offset;
        self.input = rest;
        self.offset += u64::from(header.len);

        // A missing pad byte at the very end of the input is tolerated.
        if header.padded() && self.has_remaining() {
            self.input = &self.input[1..];
            self.offset += 1;
        }

        self.state = State::ReadingBody { header, data_offset, data };
        let len = u64::from(header.len) + u64::from(ChunkHeader::ENCODED_LEN);
        Ok((header.name, InputSpan { offset, len }))
    }

    /// Parse the start of the current chunk's data, assuming its header has already been read.
    pub fn parse_data<T: ParseChunk>(&mut self) -> Result<T, Error> {
        let name = self.current_chunk_name();
        let State::ReadingBody { data, .. } = &mut self.state else {
            bail_attach!(CodecError::MalformedContainer, WhileParsingType::new::<T>(), WhileParsingChunk(name));
        };
        let parsed = T::parse(&mut *data).while_parsing_chunk(name)?;
        Ok(parsed)
    }

    /// The unread data of the current chunk, assuming its header has already been read.
    pub fn data(&mut self) -> &'a [u8] {
        match &mut self.state {
            State::ReadingBody { data, .. } => std::mem::take(data),
            State::Idle { .. } => &[],
        }
    }

    /// A reader for the chunks contained in the current chunk's unread data.
    pub fn child_reader(&mut self) -> ChunkReader<'a> {
        let name = self.current_chunk_name();
        let offset = match &self.state {
            State::Idle { .. } => self.offset,
            State::ReadingBody { header, data_offset, data } => {
                data_offset + u64::from(header.len) - data.len() as u64
            }
        };
        ChunkReader { input: self.data(), offset, state: State::Idle { last: name } }
    }

    fn current_chunk_name(&self) -> FourCC {
        match &self.state {
            State::Idle { last } => *last,
            State::ReadingBody { header, .. } => header.name,
        }
    }
}
