use crate::attributes::ArmAttributes;
use crate::cursor::{ByteCursor, Endianness};
use crate::error::{Error, Result};
use crate::header::{PrimaryHeader, SecondaryHeader};
use crate::platform::{AbiType, CpuFamily, CpuType};
use crate::resolve::resolve_arm_cpu;
use crate::sections::{SectionHeader, SectionTable};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Final identification of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Lower-case canonical CPU name, e.g. `cortex-a9` or `x86_64`.
    pub cpu_name: String,
    pub cpu_type: CpuType,
    pub abi_type: AbiType,
    /// Raw `e_flags`.
    pub flags: u32,
    /// Section directory in table order.
    pub sections: SectionTable,
}

impl Classification {
    pub fn family(&self) -> CpuFamily {
        self.cpu_type.family()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}), {}, flags {:#x}, {} sections",
            self.cpu_name,
            self.cpu_type,
            self.family(),
            self.abi_type,
            self.flags,
            self.sections.len()
        )
    }
}

/// A decoded object: headers, decoded ARM attributes and the final classification.
#[derive(Debug, Clone)]
pub struct Binary {
    pub path: Option<String>,
    pub header: SecondaryHeader,
    /// Present only for ARM 32-bit objects carrying an attributes section.
    pub arm_attributes: Option<ArmAttributes>,
    pub classification: Classification,
}

impl Binary {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut bin = Self::from_reader(BufReader::new(file))?;
        bin.path = Some(path.display().to_string());
        Ok(bin)
    }

    /// Runs the whole pipeline against a seekable source positioned anywhere.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut cur = ByteCursor::new(reader, Endianness::Little);
        let primary = PrimaryHeader::read(&mut cur)?;
        let header = SecondaryHeader::read(primary, &mut cur)?;
        let sections = SectionTable::read(&header, &mut cur)?;

        let primary = header.primary();
        let (arm_attributes, cpu_name, cpu_type, abi_type) =
            if primary.cpu_type.family() == CpuFamily::Arm32 {
                let attrs = ArmAttributes::read(&sections, primary.endianness, &mut cur)?;
                let cpu_name = attrs.as_ref().and_then(|a| a.cpu_name());
                let cpu_raw_name = attrs.as_ref().and_then(|a| a.cpu_raw_name());
                let resolved =
                    resolve_arm_cpu(cpu_name, cpu_raw_name, primary.cpu_name(), primary.cpu_type)?;
                let abi_type = if attrs.as_ref().is_some_and(|a| a.uses_hard_float()) {
                    AbiType::EabiGnuArmhf
                } else {
                    AbiType::EabiGnuArmel
                };
                (attrs, resolved.cpu_name, resolved.cpu_type, abi_type)
            } else {
                (
                    None,
                    primary.cpu_name().to_string(),
                    primary.cpu_type,
                    primary.abi_type,
                )
            };

        let classification = Classification {
            cpu_name,
            cpu_type,
            abi_type,
            flags: header.flags(),
            sections,
        };
        log::info!("Classified as {classification}");

        Ok(Self {
            path: None,
            header,
            arm_attributes,
            classification,
        })
    }

    pub fn primary(&self) -> &PrimaryHeader {
        self.header.primary()
    }

    pub fn sections(&self) -> &SectionTable {
        &self.classification.sections
    }

    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.classification.sections.find_by_name(name)
    }

    pub fn section_by_type(&self, kind: u32) -> Option<&SectionHeader> {
        self.classification.sections.find_by_type(kind)
    }
}
