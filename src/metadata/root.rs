//! Metadata root ("BSJB") and stream directory parsing.
//!
//! The CLR metadata blob starts with a root header carrying the runtime
//! version string and a directory of named streams (`#~`, `#Strings`,
//! `#Blob`, ...). Offsets in the directory are relative to the start of the
//! metadata blob itself.

use crate::{file::parser::Parser, Result};

/// Magic signature at the start of the metadata root.
pub const METADATA_SIGNATURE: u32 = 0x424A_5342;

/// One entry of the stream directory.
#[derive(Debug, Clone)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Stream name (e.g. `#~`, `#Strings`)
    pub name: String,
}

/// The parsed metadata root.
#[derive(Debug)]
pub struct MetadataRoot {
    /// Runtime version string (e.g. `v4.0.30319`)
    pub version: String,
    /// Directory of streams contained in the metadata blob
    pub streams: Vec<StreamHeader>,
}

impl MetadataRoot {
    /// Parses the root header and stream directory from the metadata blob.
    ///
    /// # Errors
    /// Returns an error on a wrong signature, truncated directory, or a
    /// stream whose declared range falls outside the blob.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);

        let signature = parser.read_le::<u32>()?;
        if signature != METADATA_SIGNATURE {
            return Err(malformed_error!(
                "Invalid metadata signature - 0x{:08x}",
                signature
            ));
        }

        let _major = parser.read_le::<u16>()?;
        let _minor = parser.read_le::<u16>()?;
        let _reserved = parser.read_le::<u32>()?;

        let version_length = parser.read_le::<u32>()? as usize;
        let version_bytes = parser.read_bytes(version_length)?;
        let version = version_bytes
            .iter()
            .take_while(|&&byte| byte != 0)
            .map(|&byte| byte as char)
            .collect::<String>();

        let _flags = parser.read_le::<u16>()?;
        let stream_count = parser.read_le::<u16>()?;

        let mut streams = Vec::with_capacity(stream_count as usize);
        for _ in 0..stream_count {
            let offset = parser.read_le::<u32>()?;
            let size = parser.read_le::<u32>()?;

            let mut name = String::new();
            loop {
                let byte = parser.read_le::<u8>()?;
                if byte == 0 {
                    break;
                }
                name.push(byte as char);
            }
            // Names are padded with zeroes to the next 4-byte boundary.
            while parser.pos() % 4 != 0 {
                parser.advance()?;
            }

            let Some(end) = offset.checked_add(size) else {
                return Err(malformed_error!("Stream '{}' range overflows", name));
            };
            if end as usize > data.len() {
                return Err(malformed_error!(
                    "Stream '{}' exceeds metadata blob - {} > {}",
                    name,
                    end,
                    data.len()
                ));
            }

            streams.push(StreamHeader { offset, size, name });
        }

        Ok(MetadataRoot { version, streams })
    }

    /// Looks up a stream header by name.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.streams.iter().find(|header| header.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal metadata blob with the given streams appended after
    /// the directory.
    pub(crate) fn build_root(streams: &[(&str, &[u8])]) -> Vec<u8> {
        let version = b"v4.0.30319\0\0";
        let mut header = Vec::new();
        header.extend_from_slice(&METADATA_SIGNATURE.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&(version.len() as u32).to_le_bytes());
        header.extend_from_slice(version);
        header.extend_from_slice(&0u16.to_le_bytes());
        header.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        // Directory size must be known before stream offsets can be fixed.
        let mut directory_size = 0usize;
        for (name, _) in streams {
            directory_size += 8 + name.len() + 1;
            directory_size += (4 - (directory_size % 4)) % 4;
        }

        let mut payload_offset = header.len() + directory_size;
        let mut directory = Vec::new();
        for (name, bytes) in streams {
            directory.extend_from_slice(&(payload_offset as u32).to_le_bytes());
            directory.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            directory.extend_from_slice(name.as_bytes());
            directory.push(0);
            while (header.len() + directory.len()) % 4 != 0 {
                directory.push(0);
            }
            payload_offset += bytes.len();
        }

        let mut blob = header;
        blob.extend_from_slice(&directory);
        for (_, bytes) in streams {
            blob.extend_from_slice(bytes);
        }
        blob
    }

    #[test]
    fn parses_version_and_streams() {
        let blob = build_root(&[("#Strings", b"\0Alpha\0"), ("#Blob", b"\0")]);
        let root = MetadataRoot::parse(&blob).unwrap();

        assert_eq!(root.version, "v4.0.30319");
        assert_eq!(root.streams.len(), 2);

        let strings = root.stream("#Strings").unwrap();
        assert_eq!(strings.size, 7);
        assert_eq!(
            &blob[strings.offset as usize..(strings.offset + strings.size) as usize],
            b"\0Alpha\0"
        );
        assert!(root.stream("#GUID").is_none());
    }

    #[test]
    fn rejects_wrong_signature() {
        let mut blob = build_root(&[]);
        blob[0] = 0xFF;
        assert!(MetadataRoot::parse(&blob).is_err());
    }

    #[test]
    fn rejects_stream_outside_blob() {
        let mut blob = build_root(&[("#Blob", b"\0")]);
        // Inflate the declared size of the only stream past the end.
        let len = blob.len();
        let size_at = len - 1/* payload */ - 8/* name+pad */ - 4/* size */;
        blob[size_at..size_at + 4].copy_from_slice(&0xFFFFu32.to_le_bytes());
        assert!(MetadataRoot::parse(&blob).is_err());
    }
}
