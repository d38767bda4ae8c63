use crate::{
    util::{le_u32_split, take_split},
    Error, ErrorKind, MashupDefect,
};
use std::io::Write;

/// The segments of a DataMashup payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MashupContainer<'a> {
    package: &'a [u8],
    first_xml: &'a [u8],
    second_xml: &'a [u8],
    tail: &'a [u8],
}

impl<'a> MashupContainer<'a> {
    /// The difference between the related length field and the length of the
    /// second xml segment
    pub const LENGTH_OFFSET: u32 = 34;

    /// Assembles a container from its segments
    pub fn new(
        package: &'a [u8],
        first_xml: &'a [u8],
        second_xml: &'a [u8],
        tail: &'a [u8],
    ) -> Self {
        MashupContainer {
            package,
            first_xml,
            second_xml,
            tail,
        }
    }

    /// Parses a DataMashup payload into its segments
    ///
    /// ```
    /// use pbit_vcs::MashupContainer;
    ///
    /// let mut data = vec![0, 0, 0, 0];
    /// data.extend_from_slice(&[2, 0, 0, 0]);
    /// data.extend_from_slice(b"PK");
    /// data.extend_from_slice(&[1, 0, 0, 0]);
    /// data.extend_from_slice(b"a");
    /// data.extend_from_slice(&[35, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);
    /// data.extend_from_slice(b"b");
    /// data.extend_from_slice(b"tail");
    ///
    /// let container = MashupContainer::parse(&data).unwrap();
    /// assert_eq!(container.package(), b"PK");
    /// assert_eq!(container.first_xml(), b"a");
    /// assert_eq!(container.second_xml(), b"b");
    /// assert_eq!(container.tail(), b"tail");
    /// assert_eq!(container.to_vec().unwrap(), data);
    /// ```
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        let (version, data) = read_u32(data)?;
        if version != 0 {
            return Err(MashupDefect::NonZeroVersion(version).into());
        }

        let (package, data) = read_prefixed(data)?;
        let (first_xml, data) = read_prefixed(data)?;
        let (related, data) = read_u32(data)?;
        let (reserved, data) = read_u32(data)?;
        let (second_len, data) = read_u32(data)?;

        if related.checked_sub(second_len) != Some(Self::LENGTH_OFFSET) {
            return Err(MashupDefect::LengthRelation {
                related,
                second_xml: second_len,
            }
            .into());
        }

        if reserved != 0 {
            return Err(MashupDefect::NonZeroReserved(reserved).into());
        }

        let (second_xml, tail) = read_exact(data, second_len)?;
        Ok(MashupContainer {
            package,
            first_xml,
            second_xml,
            tail,
        })
    }

    /// The zip archive holding the package parts
    pub fn package(&self) -> &'a [u8] {
        self.package
    }

    /// The first xml segment
    pub fn first_xml(&self) -> &'a [u8] {
        self.first_xml
    }

    /// The second xml segment
    pub fn second_xml(&self) -> &'a [u8] {
        self.second_xml
    }

    /// The bytes that follow the second xml segment
    pub fn tail(&self) -> &'a [u8] {
        self.tail
    }

    /// The length field that precedes the reserved word, always 34 more than
    /// the length of the second xml segment
    pub fn related_len(&self) -> Result<u32, Error> {
        segment_len(self.second_xml)?
            .checked_add(Self::LENGTH_OFFSET)
            .ok_or_else(|| Error::from(ErrorKind::SegmentTooLarge { len: self.second_xml.len() }))
    }

    /// The 8 bytes between the first and second xml segment: the related
    /// length followed by the reserved zero word
    pub fn mystery_block(&self) -> Result<[u8; 8], Error> {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.related_len()?.to_le_bytes());
        Ok(out)
    }

    /// The number of bytes the encoded payload occupies
    pub fn encoded_len(&self) -> usize {
        4 + 4
            + self.package.len()
            + 4
            + self.first_xml.len()
            + 8
            + 4
            + self.second_xml.len()
            + self.tail.len()
    }

    /// Writes the payload, deriving every length field from the segments
    pub fn write<W>(&self, mut writer: W) -> Result<(), Error>
    where
        W: Write,
    {
        let package_len = segment_len(self.package)?;
        let first_len = segment_len(self.first_xml)?;
        let second_len = segment_len(self.second_xml)?;
        let mystery = self.mystery_block()?;

        writer.write_all(&0u32.to_le_bytes())?;
        writer.write_all(&package_len.to_le_bytes())?;
        writer.write_all(self.package)?;
        writer.write_all(&first_len.to_le_bytes())?;
        writer.write_all(self.first_xml)?;
        writer.write_all(&mystery)?;
        writer.write_all(&second_len.to_le_bytes())?;
        writer.write_all(self.second_xml)?;
        writer.write_all(self.tail)?;
        Ok(())
    }

    /// Encodes the payload into a new buffer
    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write(&mut out)?;
        Ok(out)
    }
}

fn segment_len(data: &[u8]) -> Result<u32, Error> {
    u32::try_from(data.len())
        .map_err(|_| Error::from(ErrorKind::SegmentTooLarge { len: data.len() }))
}

fn read_u32(data: &[u8]) -> Result<(u32, &[u8]), MashupDefect> {
    le_u32_split(data).ok_or(MashupDefect::Truncated {
        needed: 4,
        available: data.len(),
    })
}

fn read_exact(data: &[u8], len: u32) -> Result<(&[u8], &[u8]), MashupDefect> {
    let needed = len as usize;
    take_split(data, needed).ok_or(MashupDefect::Truncated {
        needed,
        available: data.len(),
    })
}

fn read_prefixed(data: &[u8]) -> Result<(&[u8], &[u8]), MashupDefect> {
    let (len, data) = read_u32(data)?;
    read_exact(data, len)
}
