//! BinaryReader - 二进制数据读取工具
//!
//! Little-endian cursor over a borrowed account buffer. Every read is bounds
//! checked so malformed accounts surface as errors instead of panics.

use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8], String> {
        let end = self.offset.checked_add(length).filter(|end| *end <= self.buffer.len());
        match end {
            Some(end) => {
                let slice = &self.buffer[self.offset..end];
                self.offset = end;
                Ok(slice)
            }
            None => Err(format!(
                "Buffer overflow: trying to read {} bytes at offset {} in buffer of length {}",
                length,
                self.offset,
                self.buffer.len()
            )),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], String> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, String> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, String> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, String> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, String> {
        self.read_array().map(u64::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, String> {
        self.read_array().map(i64::from_le_bytes)
    }

    pub fn read_fixed_array(&mut self, length: usize) -> Result<&'a [u8], String> {
        self.take(length)
    }

    pub fn read_pubkey(&mut self) -> Result<Pubkey, String> {
        self.read_array::<32>().map(Pubkey::new_from_array)
    }

    pub fn skip(&mut self, length: usize) -> Result<(), String> {
        self.take(length).map(|_| ())
    }

    /// Move the cursor to an absolute offset.
    pub fn seek(&mut self, offset: usize) -> Result<(), String> {
        if offset > self.buffer.len() {
            return Err(format!(
                "Seek out of range: offset {} in buffer of length {}",
                offset,
                self.buffer.len()
            ));
        }
        self.offset = offset;
        Ok(())
    }
}
