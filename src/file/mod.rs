//! PE image abstraction for the input module.
//!
//! [`Image`] owns the raw bytes of one .NET PE module (memory-mapped from
//! disk or provided as a buffer), captures its section table, and locates the
//! CLR runtime header. Everything downstream works in relative virtual
//! addresses; [`Image::rva_to_offset`] performs the section-table translation
//! into file offsets.

pub mod parser;

use std::path::Path;

use goblin::pe::PE;
use memmap2::Mmap;

use crate::{Error, Result};

/// One entry of the PE section table, reduced to the fields address
/// translation needs.
#[derive(Debug, Clone)]
pub struct Section {
    /// RVA at which the section is mapped
    pub virtual_address: u32,
    /// Size of the section in memory
    pub virtual_size: u32,
    /// File offset of the section's raw data
    pub pointer_to_raw_data: u32,
    /// Size of the section's raw data on disk
    pub size_of_raw_data: u32,
}

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// The input PE module.
///
/// Construction validates that the file is a PE image carrying a CLR runtime
/// header; anything else is rejected with [`Error::NotSupported`]. The
/// section table is copied out of the goblin parse so the image is
/// self-contained afterwards.
///
/// # Examples
///
/// ```rust,no_run
/// use cil2ts::Image;
/// use std::path::Path;
///
/// let image = Image::from_file(Path::new("Library.dll"))?;
/// let (clr_rva, _) = image.clr();
/// let clr_offset = image.rva_to_offset(clr_rva)?;
/// println!("CLR header at file offset 0x{:x}", clr_offset);
/// # Ok::<(), cil2ts::Error>(())
/// ```
pub struct Image {
    backing: Backing,
    sections: Vec<Section>,
    clr_rva: u32,
    clr_size: u32,
}

impl Image {
    /// Memory-maps a module from disk and validates its headers.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped, is not a PE
    /// image, or has no CLR runtime header.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mmap = unsafe { Mmap::map(&file) }?;
        Self::from_backing(Backing::Mapped(mmap))
    }

    /// Takes ownership of an in-memory module and validates its headers.
    ///
    /// # Errors
    /// Returns an error if the buffer is empty, is not a PE image, or has no
    /// CLR runtime header.
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        Self::from_backing(Backing::Owned(data))
    }

    fn from_backing(backing: Backing) -> Result<Self> {
        let data = match &backing {
            Backing::Mapped(map) => &map[..],
            Backing::Owned(vec) => vec.as_slice(),
        };
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let pe = PE::parse(data)?;
        let Some(optional_header) = pe.header.optional_header else {
            return Err(Error::NotSupported);
        };
        let Some(clr) = optional_header.data_directories.get_clr_runtime_header() else {
            return Err(Error::NotSupported);
        };
        if clr.virtual_address == 0 || clr.size == 0 {
            return Err(Error::NotSupported);
        }

        let sections = pe
            .sections
            .iter()
            .map(|section| Section {
                virtual_address: section.virtual_address,
                virtual_size: section.virtual_size,
                pointer_to_raw_data: section.pointer_to_raw_data,
                size_of_raw_data: section.size_of_raw_data,
            })
            .collect();

        let clr_rva = clr.virtual_address;
        let clr_size = clr.size;

        Ok(Image {
            backing,
            sections,
            clr_rva,
            clr_size,
        })
    }

    /// Builds an image from raw parts, bypassing PE validation. Test fixtures
    /// only.
    #[cfg(test)]
    pub(crate) fn from_parts(data: Vec<u8>, sections: Vec<Section>) -> Self {
        Image {
            backing: Backing::Owned(data),
            sections,
            clr_rva: 0,
            clr_size: 0,
        }
    }

    /// The full raw bytes of the module.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped(map) => &map[..],
            Backing::Owned(vec) => vec.as_slice(),
        }
    }

    /// The captured section table.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// RVA and size of the CLR runtime header.
    #[must_use]
    pub fn clr(&self) -> (u32, u32) {
        (self.clr_rva, self.clr_size)
    }

    /// Translates a relative virtual address into a file offset.
    ///
    /// Linear scan over the section table; the first section whose virtual
    /// range covers `rva` wins.
    ///
    /// # Errors
    /// Returns [`Error::SectionMapping`] when no section contains the
    /// address. Callers abort the current method or field on this, not the
    /// whole run.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        for section in &self.sections {
            let Some(section_end) = section.virtual_address.checked_add(section.virtual_size)
            else {
                return Err(malformed_error!(
                    "Section range overflows - {} + {}",
                    section.virtual_address,
                    section.virtual_size
                ));
            };

            if section.virtual_address <= rva && rva < section_end {
                return Ok((rva - section.virtual_address) as usize
                    + section.pointer_to_raw_data as usize);
            }
        }

        Err(Error::SectionMapping(rva))
    }

    /// Borrows `length` bytes starting at a file offset.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, length: usize) -> Result<&[u8]> {
        let data = self.data();
        let Some(end) = offset.checked_add(length) else {
            return Err(Error::OutOfBounds);
        };
        if end > data.len() {
            return Err(Error::OutOfBounds);
        }
        Ok(&data[offset..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with_sections(sections: Vec<Section>) -> Image {
        Image {
            backing: Backing::Owned(vec![0u8; 0x800]),
            sections,
            clr_rva: 0x2008,
            clr_size: 72,
        }
    }

    #[test]
    fn rva_maps_into_containing_section() {
        let image = image_with_sections(vec![
            Section {
                virtual_address: 0x1000,
                virtual_size: 0x1000,
                pointer_to_raw_data: 0x200,
                size_of_raw_data: 0x1000,
            },
            Section {
                virtual_address: 0x2000,
                virtual_size: 0x1000,
                pointer_to_raw_data: 0x400,
                size_of_raw_data: 0x200,
            },
        ]);

        assert_eq!(image.rva_to_offset(0x1000).unwrap(), 0x200);
        assert_eq!(image.rva_to_offset(0x1010).unwrap(), 0x210);
        assert_eq!(image.rva_to_offset(0x2008).unwrap(), 0x408);
    }

    #[test]
    fn unmapped_rva_is_section_mapping_error() {
        let image = image_with_sections(vec![Section {
            virtual_address: 0x1000,
            virtual_size: 0x1000,
            pointer_to_raw_data: 0x200,
            size_of_raw_data: 0x1000,
        }]);

        match image.rva_to_offset(0x8000) {
            Err(Error::SectionMapping(rva)) => assert_eq!(rva, 0x8000),
            other => panic!("expected SectionMapping, got {other:?}"),
        }
    }

    #[test]
    fn data_slice_bounds() {
        let image = image_with_sections(Vec::new());
        assert_eq!(image.data_slice(0, 4).unwrap().len(), 4);
        assert!(image.data_slice(0x7FD, 8).is_err());
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(Image::from_mem(Vec::new()), Err(Error::Empty)));
    }

    #[test]
    fn garbage_input_rejected() {
        let result = Image::from_mem(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(result.is_err());
    }
}
