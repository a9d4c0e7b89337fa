use crate::consts::*;
use crate::cursor::{ByteCursor, Endianness};
use crate::error::{Error, Result};
use crate::header::{ObjectClass, SecondaryHeader};
use goblin::elf::section_header::sht_to_str;
use std::io::{Cursor, Read, Seek};

/// Section count as declared by `e_shnum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionCount {
    Declared(u16),
    /// `e_shnum` overflowed; section 0's `sh_size` holds the count.
    Extended,
}

impl SectionCount {
    pub fn from_raw(e_shnum: u16) -> Self {
        if e_shnum == SHN_UNDEF {
            SectionCount::Extended
        } else {
            SectionCount::Declared(e_shnum)
        }
    }
}

/// Section name string table reference as declared by `e_shstrndx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTableIndex {
    /// No name string table; section names stay unresolved.
    None,
    Index(u16),
    /// `SHN_XINDEX`: section 0's `sh_link` holds the index.
    Extended,
    /// Any other value in the reserved index range.
    Reserved(u16),
}

impl StringTableIndex {
    pub fn from_raw(e_shstrndx: u16) -> Self {
        match e_shstrndx {
            SHN_UNDEF => StringTableIndex::None,
            SHN_XINDEX => StringTableIndex::Extended,
            i if i >= SHN_LORESERVE => StringTableIndex::Reserved(i),
            i => StringTableIndex::Index(i),
        }
    }
}

/// One entry of the section header table, widened to 64-bit fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Position in the table. Every "section by index" reference points here.
    pub index: usize,
    /// `sh_name`: byte offset into the section name string table.
    pub name_index: u32,
    /// `sh_type`
    pub kind: u32,
    pub flags: u64,
    /// `sh_addr`
    pub vma: u64,
    /// `sh_offset`
    pub file_offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
    /// Resolved through the name string table, `None` if there is none.
    pub name: Option<String>,
}

impl SectionHeader {
    /// Decodes one `Elf32_Shdr` / `Elf64_Shdr` from `buf`.
    fn parse(buf: &[u8], class: ObjectClass, endian: Endianness, index: usize) -> Result<Self> {
        let mut cur = ByteCursor::new(Cursor::new(buf), endian);
        let name_index = cur.read_u32()?;
        let kind = cur.read_u32()?;
        let flags = cur.read_word(class)?;
        let vma = cur.read_word(class)?;
        let file_offset = cur.read_word(class)?;
        let size = cur.read_word(class)?;
        let link = cur.read_u32()?;
        let info = cur.read_u32()?;
        let addralign = cur.read_word(class)?;
        let entsize = cur.read_word(class)?;

        Ok(SectionHeader {
            index,
            name_index,
            kind,
            flags,
            vma,
            file_offset,
            size,
            link,
            info,
            addralign,
            entsize,
            name: None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            SHT_ARM_ATTRIBUTES => "SHT_ARM_ATTRIBUTES",
            kind => sht_to_str(kind),
        }
    }

    /// Reads the raw bytes of this section.
    pub fn read_content<R: Read + Seek>(&self, cur: &mut ByteCursor<R>) -> Result<Vec<u8>> {
        log::debug!(
            "Reading section {} ({:?}): {} bytes at {:#x}",
            self.index,
            self.name().unwrap_or(""),
            self.size,
            self.file_offset
        );
        cur.seek(self.file_offset)?;
        cur.read_bytes(self.size)
    }
}

/// The ordered section directory of an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable {
    sections: Vec<SectionHeader>,
}

impl SectionTable {
    /// Reads the section header table described by `header`.
    ///
    /// Returns an empty table when `e_shoff` is 0. Entries keep their file order.
    /// Names are attached when `e_shstrndx` designates a name string table.
    pub fn read<R: Read + Seek>(header: &SecondaryHeader, cur: &mut ByteCursor<R>) -> Result<Self> {
        let table_offset = header.e_shoff;
        if table_offset == 0 {
            log::info!("No section header table");
            return Ok(SectionTable::default());
        }

        let class = header.class();
        let endian = header.primary().endianness;
        let layout = match class {
            ObjectClass::Elf32 => SECTION_HEADER_SIZE_32,
            ObjectClass::Elf64 => SECTION_HEADER_SIZE_64,
        };
        let entsize = header.e_shentsize;
        if entsize < layout {
            return Err(Error::InvalidSectionEntrySize {
                size: entsize,
                expected: layout,
                offset: table_offset,
            });
        }

        cur.seek(table_offset)?;
        let read_entry = |cur: &mut ByteCursor<R>, index: usize| -> Result<SectionHeader> {
            let buf = cur.read_bytes(u64::from(entsize))?;
            SectionHeader::parse(&buf, class, endian, index)
        };

        let mut sections = Vec::new();
        let count = match header.section_count() {
            SectionCount::Declared(n) => u64::from(n),
            SectionCount::Extended => {
                let first = read_entry(cur, 0)?;
                let count = first.size;
                if count == 0 {
                    return Err(Error::MalformedSectionCount {
                        count,
                        offset: table_offset,
                    });
                }
                log::debug!("Extended section count: {count}");
                sections.push(first);
                count
            }
        };

        sections.reserve(count.min(u64::from(u16::MAX)) as usize);
        for index in sections.len()..count as usize {
            sections.push(read_entry(cur, index)?);
        }
        log::debug!("Read {} section headers at {:#x}", sections.len(), table_offset);

        let mut table = SectionTable { sections };
        table.resolve_names(header, cur)?;
        Ok(table)
    }

    fn resolve_names<R: Read + Seek>(
        &mut self,
        header: &SecondaryHeader,
        cur: &mut ByteCursor<R>,
    ) -> Result<()> {
        let table_offset = header.e_shoff;
        let invalid = |index: u32, count: usize| Error::InvalidStringTableIndex {
            index,
            count,
            offset: table_offset,
        };

        let strndx = match header.string_table_index() {
            StringTableIndex::None => {
                log::info!("No section name string table; names stay unresolved");
                return Ok(());
            }
            StringTableIndex::Index(i) => u32::from(i),
            StringTableIndex::Extended => self
                .sections
                .first()
                .map(|s| s.link)
                .ok_or_else(|| invalid(u32::from(SHN_XINDEX), 0))?,
            StringTableIndex::Reserved(i) => return Err(invalid(u32::from(i), self.len())),
        };

        let count = self.len();
        let strtab = self
            .sections
            .get(strndx as usize)
            .ok_or_else(|| invalid(strndx, count))?;
        if strtab.kind != SHT_STRTAB {
            return Err(Error::WrongStringTableType {
                index: strtab.index,
                found: strtab.kind,
                offset: table_offset + u64::from(strndx) * u64::from(header.e_shentsize),
            });
        }

        let data = strtab.read_content(cur)?;
        for section in &mut self.sections {
            section.name = string_at(&data, section.name_index);
            if section.name.is_none() {
                log::warn!(
                    "Section {} name offset {:#x} outside string table of {} bytes",
                    section.index,
                    section.name_index,
                    data.len()
                );
            }
        }
        Ok(())
    }

    /// First section with `sh_type == kind`.
    pub fn find_by_type(&self, kind: u32) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// First section whose resolved name equals `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.name() == Some(name))
    }

    pub fn get(&self, index: usize) -> Option<&SectionHeader> {
        self.sections.get(index)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SectionHeader> {
        self.sections.iter()
    }
}

impl<'a> IntoIterator for &'a SectionTable {
    type Item = &'a SectionHeader;
    type IntoIter = std::slice::Iter<'a, SectionHeader>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

/// Null-terminated string at `offset`, or `None` when the offset is out of range.
fn string_at(data: &[u8], offset: u32) -> Option<String> {
    let start = offset as usize;
    let tail = data.get(start..)?;
    if tail.is_empty() {
        return None;
    }
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..end]).into_owned())
}
