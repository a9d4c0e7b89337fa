//! Numeric constants and reserved sentinels of the ELF format.
//!
//! Generic values come from `goblin`; the ARM EABI values it does not carry are
//! defined here. Every sentinel comparison in the crate goes through this module.

use goblin::elf::{header, section_header};

pub use header::{
    EI_ABIVERSION, EI_CLASS, EI_DATA, EI_OSABI, EI_VERSION, ELFCLASS32, ELFCLASS64, ELFDATA2LSB,
    ELFDATA2MSB, ELFMAG, SELFMAG, SIZEOF_IDENT,
};
pub use header::{
    EM_386, EM_AARCH64, EM_ARM, EM_IA_64, EM_MIPS, EM_PARISC, EM_PPC, EM_PPC64, EM_SH, EM_SPARC,
    EM_SPARCV9, EM_X86_64,
};

/// Bytes consumed by the primary header: identification block, `e_type`, `e_machine`.
pub const PRIMARY_HEADER_SIZE: usize = SIZEOF_IDENT + 2 + 2;

/// Bytes following the primary header in a 32-bit (`Elf32_Ehdr`, 52 bytes) header.
pub const SECONDARY_HEADER_SIZE_32: usize = 52 - PRIMARY_HEADER_SIZE;
/// Bytes following the primary header in a 64-bit (`Elf64_Ehdr`, 64 bytes) header.
pub const SECONDARY_HEADER_SIZE_64: usize = 64 - PRIMARY_HEADER_SIZE;

/// `sizeof(Elf32_Shdr)`
pub const SECTION_HEADER_SIZE_32: u16 = 40;
/// `sizeof(Elf64_Shdr)`
pub const SECTION_HEADER_SIZE_64: u16 = 64;

/// Undefined section index. As `e_shstrndx` it means "no name string table",
/// as `e_shnum` it means "count lives in section 0's `sh_size`".
pub const SHN_UNDEF: u16 = section_header::SHN_UNDEF as u16;
/// Lower bound of the reserved section index range.
pub const SHN_LORESERVE: u16 = section_header::SHN_LORESERVE as u16;
/// `e_shstrndx` escape: the real index lives in section 0's `sh_link`.
pub const SHN_XINDEX: u16 = section_header::SHN_XINDEX as u16;

pub const SHT_STRTAB: u32 = section_header::SHT_STRTAB;
/// ARM build attributes section (`.ARM.attributes`).
pub const SHT_ARM_ATTRIBUTES: u32 = section_header::SHT_LOPROC + 3;

/// Format version byte leading an attributes section: `'A'`.
pub const ATTRIBUTES_FORMAT_VERSION: u8 = b'A';
/// Vendor name of the public ARM EABI attribute subsection.
pub const AEABI_VENDOR: &str = "aeabi";

pub const EF_ARM_ABIMASK: u32 = 0xFF00_0000;
pub const EF_ARM_ABISHIFT: u32 = 24;
/// Flags legacy (pre-EABI5) gcc toolchains left in the header.
pub const EF_ARM_GCCMASK: u32 = 0x0040_0FFF;
pub const EF_ARM_ABI_FLOAT_HARD: u32 = 0x0000_0400;
pub const EF_ARM_ABI_FLOAT_SOFT: u32 = 0x0000_0200;
