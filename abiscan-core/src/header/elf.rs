use crate::consts::*;
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::header::{Header, ObjectClass, PrimaryHeader};
use crate::sections::{SectionCount, StringTableIndex};
use goblin::elf::header::{ET_DYN, ET_EXEC};
use std::fmt;
use std::io::{Cursor, Read, Seek};

/// Represents the class-dependent remainder of an ELF header.
///
/// Corresponds to the fields of `Elf32_Ehdr` / `Elf64_Ehdr` following `e_machine`.
/// Address sized fields are widened to `u64` regardless of class. A secondary header
/// can only be built from a [`PrimaryHeader`], which it keeps.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryHeader {
    primary: PrimaryHeader,

    /// ELF version (usually set to `EV_CURRENT` = 1).
    pub e_version: u32,

    /// Virtual address of the program entry point.
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// File offset of the section header table, 0 if there is none.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of the ELF header (52 bytes for ELF32, 64 for ELF64).
    pub e_ehsize: u16,

    /// Size of one entry in the program header table.
    pub e_phentsize: u16,

    /// Number of entries in the program header table.
    pub e_phnum: u16,

    /// Size of one entry in the section header table.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    ///
    /// `SHN_UNDEF` here means the real count is stored in section 0.
    pub e_shnum: u16,

    /// Index of the section header string table.
    pub e_shstrndx: u16,
}

/// Floating-point procedure call standard recorded in legacy ARM header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmFloatMode {
    None,
    Soft,
    Hard,
}

impl SecondaryHeader {
    /// Decodes the header fields following the primary header.
    ///
    /// The whole class-sized block is read first, so a short file fails with
    /// `Truncated` at the block start rather than partway through.
    pub fn read<R: Read + Seek>(primary: PrimaryHeader, cur: &mut ByteCursor<R>) -> Result<Self> {
        let size = match primary.class {
            ObjectClass::Elf32 => SECONDARY_HEADER_SIZE_32,
            ObjectClass::Elf64 => SECONDARY_HEADER_SIZE_64,
        };
        cur.seek(PRIMARY_HEADER_SIZE as u64)?;
        let block = cur.read_bytes(size as u64)?;

        let class = primary.class;
        let mut buf = ByteCursor::new(Cursor::new(block.as_slice()), primary.endianness);
        let header = SecondaryHeader {
            e_version: buf.read_u32()?,
            e_entry: buf.read_word(class)?,
            e_phoff: buf.read_word(class)?,
            e_shoff: buf.read_word(class)?,
            e_flags: buf.read_u32()?,
            e_ehsize: buf.read_u16()?,
            e_phentsize: buf.read_u16()?,
            e_phnum: buf.read_u16()?,
            e_shentsize: buf.read_u16()?,
            e_shnum: buf.read_u16()?,
            e_shstrndx: buf.read_u16()?,
            primary,
        };
        log::debug!("Secondary header: {header}");
        Ok(header)
    }

    pub fn primary(&self) -> &PrimaryHeader {
        &self.primary
    }

    pub fn class(&self) -> ObjectClass {
        self.primary.class
    }

    pub fn flags(&self) -> u32 {
        self.e_flags
    }

    pub fn section_count(&self) -> SectionCount {
        SectionCount::from_raw(self.e_shnum)
    }

    pub fn string_table_index(&self) -> StringTableIndex {
        StringTableIndex::from_raw(self.e_shstrndx)
    }

    /// ARM EABI version from the flags, 0 if the object is not an ARM EABI object.
    pub fn arm_eabi_version(&self) -> u8 {
        ((self.e_flags & EF_ARM_ABIMASK) >> EF_ARM_ABISHIFT) as u8
    }

    /// Legacy gcc flag bits, only meaningful alongside an EABI version.
    pub fn arm_legacy_gcc_flags(&self) -> u32 {
        if self.arm_eabi_version() != 0 {
            self.e_flags & EF_ARM_GCCMASK
        } else {
            0
        }
    }

    /// Float mode from the EABI header flags.
    ///
    /// Current toolchains leave these bits clear and record the calling convention
    /// in the attributes section instead, so this is informational only.
    pub fn arm_float_mode(&self) -> ArmFloatMode {
        if self.arm_eabi_version() == 0 {
            return ArmFloatMode::None;
        }
        if self.e_flags & EF_ARM_ABI_FLOAT_HARD != 0 {
            ArmFloatMode::Hard
        } else if self.e_flags & EF_ARM_ABI_FLOAT_SOFT != 0 {
            ArmFloatMode::Soft
        } else {
            ArmFloatMode::None
        }
    }
}

impl Header for SecondaryHeader {
    fn entry_point(&self) -> u64 {
        self.e_entry
    }

    fn machine(&self) -> u16 {
        self.primary.machine
    }

    fn is_64(&self) -> bool {
        self.primary.class == ObjectClass::Elf64
    }

    fn format_name(&self) -> &'static str {
        "ELF"
    }

    fn is_executable(&self) -> bool {
        self.primary.object_type == ET_EXEC
    }

    fn is_shared_object(&self) -> bool {
        self.primary.object_type == ET_DYN
    }
}

impl fmt::Display for SecondaryHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entry {:#x}, phoff {:#x} ({} x {}), shoff {:#x} ({} x {}), shstrndx {}, ehsize {}, flags {:#x}",
            self.e_entry,
            self.e_phoff,
            self.e_phnum,
            self.e_phentsize,
            self.e_shoff,
            self.e_shnum,
            self.e_shentsize,
            self.e_shstrndx,
            self.e_ehsize,
            self.e_flags,
        )?;
        let abi = self.arm_eabi_version();
        if self.primary.machine == EM_ARM && abi != 0 {
            write!(
                f,
                ", arm[abi {}, legacy-gcc {:#x}, float {:?}]",
                abi,
                self.arm_legacy_gcc_flags(),
                self.arm_float_mode()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Endianness;
    use crate::error::{Error, ErrorKind};
    use crate::platform::{AbiType, CpuType};

    fn primary(class: ObjectClass, endianness: Endianness) -> PrimaryHeader {
        PrimaryHeader {
            class,
            endianness,
            header_version: 1,
            os_abi: 0,
            abi_version: 0,
            object_type: ET_DYN,
            machine: EM_ARM,
            cpu_type: CpuType::Arm,
            abi_type: AbiType::EabiGnuArmel,
        }
    }

    fn with_flags(e_flags: u32) -> SecondaryHeader {
        SecondaryHeader {
            primary: primary(ObjectClass::Elf32, Endianness::Little),
            e_version: 1,
            e_entry: 0,
            e_phoff: 0,
            e_shoff: 0,
            e_flags,
            e_ehsize: 52,
            e_phentsize: 0,
            e_phnum: 0,
            e_shentsize: 40,
            e_shnum: 0,
            e_shstrndx: 0,
        }
    }

    #[test]
    fn elf32_big_endian_layout() {
        let mut bytes = vec![0u8; PRIMARY_HEADER_SIZE];
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&0x8000u32.to_be_bytes());
        bytes.extend_from_slice(&0x34u32.to_be_bytes());
        bytes.extend_from_slice(&0x1000u32.to_be_bytes());
        bytes.extend_from_slice(&0x0500_0400u32.to_be_bytes());
        for v in [52u16, 32, 2, 40, 7, 6] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }

        let mut cur = ByteCursor::new(Cursor::new(bytes), Endianness::Big);
        let hdr =
            SecondaryHeader::read(primary(ObjectClass::Elf32, Endianness::Big), &mut cur).unwrap();
        assert_eq!(hdr.e_entry, 0x8000);
        assert_eq!(hdr.e_phoff, 0x34);
        assert_eq!(hdr.e_shoff, 0x1000);
        assert_eq!(hdr.e_phnum, 2);
        assert_eq!(hdr.e_shentsize, 40);
        assert_eq!(hdr.e_shnum, 7);
        assert_eq!(hdr.e_shstrndx, 6);
        assert_eq!(hdr.arm_eabi_version(), 5);
        assert_eq!(hdr.arm_float_mode(), ArmFloatMode::Hard);
        assert!(!hdr.is_64());
    }

    #[test]
    fn short_block_is_truncated() {
        let bytes = vec![0u8; PRIMARY_HEADER_SIZE + SECONDARY_HEADER_SIZE_64 - 1];
        let mut cur = ByteCursor::new(Cursor::new(bytes), Endianness::Little);
        let err = SecondaryHeader::read(primary(ObjectClass::Elf64, Endianness::Little), &mut cur)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        assert!(matches!(
            err,
            Error::Truncated { offset, wanted } if offset == PRIMARY_HEADER_SIZE as u64 && wanted == SECONDARY_HEADER_SIZE_64 as u64
        ));
    }

    #[test]
    fn arm_flag_helpers() {
        let hdr = with_flags(0x0000_0400);
        assert_eq!(hdr.arm_eabi_version(), 0);
        assert_eq!(hdr.arm_float_mode(), ArmFloatMode::None);
        assert_eq!(hdr.arm_legacy_gcc_flags(), 0);

        let hdr = with_flags(0x0500_0202);
        assert_eq!(hdr.arm_eabi_version(), 5);
        assert_eq!(hdr.arm_float_mode(), ArmFloatMode::Soft);
        assert_eq!(hdr.arm_legacy_gcc_flags(), 0x202);
    }
}
