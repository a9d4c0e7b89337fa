use crate::consts::*;
use crate::cursor::{ByteCursor, Endianness};
use crate::error::{Error, Result};
use crate::platform::{AbiType, CpuType};
use std::fmt;
use std::io::{Read, Seek};

/// Word width of the object; fixes every address/offset sized field after the
/// identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Elf32,
    Elf64,
}

impl ObjectClass {
    pub fn bits(self) -> u32 {
        match self {
            ObjectClass::Elf32 => 32,
            ObjectClass::Elf64 => 64,
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ELF{}", self.bits())
    }
}

/// The class-independent head of an ELF header: the 16 byte identification block
/// followed by `e_type` and `e_machine`.
///
/// Everything here can be decoded without knowing the word width up front, and it
/// is what the rest of the pipeline needs to size its own reads. The CPU/ABI pair is
/// a provisional classification derived from `e_machine` alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub class: ObjectClass,
    pub endianness: Endianness,
    /// `e_ident[EI_VERSION]`
    pub header_version: u8,
    /// `e_ident[EI_OSABI]`
    pub os_abi: u8,
    /// `e_ident[EI_ABIVERSION]`
    pub abi_version: u8,
    /// `e_type`
    pub object_type: u16,
    /// `e_machine`
    pub machine: u16,
    pub cpu_type: CpuType,
    pub abi_type: AbiType,
}

impl PrimaryHeader {
    /// Decodes the primary header from the start of `cur`.
    ///
    /// On success the cursor's endianness is switched to the one declared by the
    /// object and it is positioned right after `e_machine`.
    pub fn read<R: Read + Seek>(cur: &mut ByteCursor<R>) -> Result<Self> {
        cur.seek(0)?;
        let mut ident = [0u8; SIZEOF_IDENT];
        cur.read_exact(&mut ident)?;

        if &ident[..SELFMAG] != ELFMAG {
            let mut found = [0u8; SELFMAG];
            found.copy_from_slice(&ident[..SELFMAG]);
            return Err(Error::InvalidMagic { found, offset: 0 });
        }

        let class = match ident[EI_CLASS] {
            ELFCLASS32 => ObjectClass::Elf32,
            ELFCLASS64 => ObjectClass::Elf64,
            value => {
                return Err(Error::UnsupportedClass {
                    value,
                    offset: EI_CLASS as u64,
                })
            }
        };
        let endianness = match ident[EI_DATA] {
            ELFDATA2LSB => Endianness::Little,
            ELFDATA2MSB => Endianness::Big,
            value => {
                return Err(Error::UnsupportedEndianness {
                    value,
                    offset: EI_DATA as u64,
                })
            }
        };

        cur.set_endianness(endianness);
        let object_type = cur.read_u16()?;
        let machine = cur.read_u16()?;

        let (cpu_type, abi_type) = classify_machine(machine, class);
        if cpu_type == CpuType::Unknown {
            log::warn!("Unrecognized e_machine {machine:#x}; CPU type left unknown");
        }

        let header = PrimaryHeader {
            class,
            endianness,
            header_version: ident[EI_VERSION],
            os_abi: ident[EI_OSABI],
            abi_version: ident[EI_ABIVERSION],
            object_type,
            machine,
            cpu_type,
            abi_type,
        };
        log::debug!("Primary header: {header}");
        Ok(header)
    }

    /// Lower-case CPU name derived from `e_machine`.
    pub fn cpu_name(&self) -> &'static str {
        self.cpu_type.name()
    }
}

impl fmt::Display for PrimaryHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}-endian, version {}, os/abi {}, abi-version {}, type {:#x}, machine {:#x} ({}, {})",
            self.class,
            self.endianness,
            self.header_version,
            self.os_abi,
            self.abi_version,
            self.object_type,
            self.machine,
            self.cpu_type,
            self.abi_type,
        )
    }
}

/// Provisional classification of an `e_machine` code.
///
/// ARM 32-bit starts out as the lowest common denominator (`arm`, soft-float EABI);
/// the attributes section refines it later.
pub fn classify_machine(machine: u16, class: ObjectClass) -> (CpuType, AbiType) {
    let cpu = match machine {
        EM_ARM => return (CpuType::Arm, AbiType::EabiGnuArmel),
        EM_AARCH64 => return (CpuType::Arm64, AbiType::EabiAarch64),
        EM_386 => CpuType::X86_32,
        EM_X86_64 => CpuType::X86_64,
        EM_IA_64 => CpuType::Ia64,
        EM_MIPS => match class {
            ObjectClass::Elf32 => CpuType::Mips32,
            ObjectClass::Elf64 => CpuType::Mips64,
        },
        EM_PPC => CpuType::Ppc,
        EM_PPC64 => CpuType::Ppc64,
        EM_SH => CpuType::SuperH,
        EM_SPARC => CpuType::Sparc32,
        EM_SPARCV9 => CpuType::SparcV9_64,
        EM_PARISC => CpuType::PaRisc2_0,
        _ => CpuType::Unknown,
    };
    (cpu, AbiType::GenericAbi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn machine_table() {
        assert_eq!(
            classify_machine(EM_ARM, ObjectClass::Elf32),
            (CpuType::Arm, AbiType::EabiGnuArmel)
        );
        assert_eq!(
            classify_machine(EM_AARCH64, ObjectClass::Elf64),
            (CpuType::Arm64, AbiType::EabiAarch64)
        );
        assert_eq!(
            classify_machine(EM_MIPS, ObjectClass::Elf64).0,
            CpuType::Mips64
        );
        assert_eq!(
            classify_machine(0xBEEF, ObjectClass::Elf64),
            (CpuType::Unknown, AbiType::GenericAbi)
        );
    }

    #[test]
    fn big_endian_fields() {
        let mut bytes = vec![0x7f, b'E', b'L', b'F', 1, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&[0x00, 0x02, 0x00, 0x08]);
        let mut cur = ByteCursor::new(Cursor::new(bytes), Endianness::Little);

        let hdr = PrimaryHeader::read(&mut cur).unwrap();
        assert_eq!(hdr.class, ObjectClass::Elf32);
        assert_eq!(hdr.endianness, Endianness::Big);
        assert_eq!(hdr.object_type, 2);
        assert_eq!(hdr.machine, EM_MIPS);
        assert_eq!(hdr.cpu_name(), "mips");
        assert_eq!(cur.endianness(), Endianness::Big);
        assert_eq!(cur.position().unwrap(), PRIMARY_HEADER_SIZE as u64);
    }

    #[test]
    fn reserved_class_and_data_values() {
        let mut bytes = vec![0x7f, b'E', b'L', b'F', 3, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut cur = ByteCursor::new(Cursor::new(bytes.clone()), Endianness::Little);
        assert!(matches!(
            PrimaryHeader::read(&mut cur),
            Err(Error::UnsupportedClass { value: 3, offset: 4 })
        ));

        bytes[EI_CLASS] = ELFCLASS64;
        bytes[EI_DATA] = 0;
        let mut cur = ByteCursor::new(Cursor::new(bytes), Endianness::Little);
        assert!(matches!(
            PrimaryHeader::read(&mut cur),
            Err(Error::UnsupportedEndianness { value: 0, offset: 5 })
        ));
    }
}
