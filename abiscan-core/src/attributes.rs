//! ARM build attributes (`.ARM.attributes`, `SHT_ARM_ATTRIBUTES`).
//!
//! Layout, per the ARM EABI addenda (IHI 0045):
//!
//! ```text
//! 'A'
//! ( <u32 len> <vendor NTBS> ( <uleb tag> <u32 size> [<uleb index>* 0] <attr>* )* )*
//! attr := <uleb tag> ( <uleb value> | <NTBS> )
//! ```
//!
//! Both length fields count themselves. Attribute data is advisory, so the decoder
//! never fails: it keeps whatever it recovered up to the first anomaly.

use crate::consts::{AEABI_VENDOR, ATTRIBUTES_FORMAT_VERSION, SHT_ARM_ATTRIBUTES};
use crate::cursor::{ByteCursor, Endianness};
use crate::error::Result;
use crate::sections::SectionTable;
use gimli::{EndianSlice, Reader, RunTimeEndian};
use std::fmt;
use std::io::{Read, Seek};
use thiserror::Error;

/// Attribute tag number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u64);

impl Tag {
    pub const FILE: Tag = Tag(1);
    pub const SECTION: Tag = Tag(2);
    pub const SYMBOL: Tag = Tag(3);
    pub const CPU_RAW_NAME: Tag = Tag(4);
    pub const CPU_NAME: Tag = Tag(5);
    pub const CPU_ARCH: Tag = Tag(6);
    pub const CPU_ARCH_PROFILE: Tag = Tag(7);
    pub const ARM_ISA_USE: Tag = Tag(8);
    pub const THUMB_ISA_USE: Tag = Tag(9);
    pub const FP_ARCH: Tag = Tag(10);
    pub const WMMX_ARCH: Tag = Tag(11);
    pub const ADVANCED_SIMD_ARCH: Tag = Tag(12);
    pub const PCS_CONFIG: Tag = Tag(13);
    pub const ABI_PCS_R9_USE: Tag = Tag(14);
    pub const ABI_PCS_RW_DATA: Tag = Tag(15);
    pub const ABI_PCS_RO_DATA: Tag = Tag(16);
    pub const ABI_PCS_GOT_USE: Tag = Tag(17);
    pub const ABI_PCS_WCHAR_T: Tag = Tag(18);
    pub const ABI_FP_ROUNDING: Tag = Tag(19);
    pub const ABI_FP_DENORMAL: Tag = Tag(20);
    pub const ABI_FP_EXCEPTIONS: Tag = Tag(21);
    pub const ABI_FP_USER_EXCEPTIONS: Tag = Tag(22);
    pub const ABI_FP_NUMBER_MODEL: Tag = Tag(23);
    pub const ABI_ALIGN_NEEDED: Tag = Tag(24);
    pub const ABI_ALIGN8_PRESERVED: Tag = Tag(25);
    pub const ABI_ENUM_SIZE: Tag = Tag(26);
    pub const ABI_HARDFP_USE: Tag = Tag(27);
    pub const ABI_VFP_ARGS: Tag = Tag(28);
    pub const ABI_WMMX_ARGS: Tag = Tag(29);
    pub const ABI_OPTIMIZATION_GOALS: Tag = Tag(30);
    pub const ABI_FP_OPTIMIZATION_GOALS: Tag = Tag(31);
    pub const COMPATIBILITY: Tag = Tag(32);
    pub const CPU_UNALIGNED_ACCESS: Tag = Tag(34);
    pub const FP_HP_EXTENSION: Tag = Tag(36);
    pub const ABI_FP_16BIT_FORMAT: Tag = Tag(38);
    pub const MPEXTENSION_USE: Tag = Tag(42);
    pub const DIV_USE: Tag = Tag(44);
    pub const NODEFAULTS: Tag = Tag(64);
    pub const ALSO_COMPATIBLE_WITH: Tag = Tag(65);
    pub const T2EE_USE: Tag = Tag(66);
    pub const CONFORMANCE: Tag = Tag(67);
    pub const VIRTUALIZATION_USE: Tag = Tag(68);
    pub const MPEXTENSION_USE_LEGACY: Tag = Tag(70);

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Tag::FILE => "File",
            Tag::SECTION => "Section",
            Tag::SYMBOL => "Symbol",
            Tag::CPU_RAW_NAME => "CPU_raw_name",
            Tag::CPU_NAME => "CPU_name",
            Tag::CPU_ARCH => "CPU_arch",
            Tag::CPU_ARCH_PROFILE => "CPU_arch_profile",
            Tag::ARM_ISA_USE => "ARM_ISA_use",
            Tag::THUMB_ISA_USE => "THUMB_ISA_use",
            Tag::FP_ARCH => "FP_arch",
            Tag::WMMX_ARCH => "WMMX_arch",
            Tag::ADVANCED_SIMD_ARCH => "Advanced_SIMD_arch",
            Tag::PCS_CONFIG => "PCS_config",
            Tag::ABI_PCS_R9_USE => "ABI_PCS_R9_use",
            Tag::ABI_PCS_RW_DATA => "ABI_PCS_RW_data",
            Tag::ABI_PCS_RO_DATA => "ABI_PCS_RO_data",
            Tag::ABI_PCS_GOT_USE => "ABI_PCS_GOT_use",
            Tag::ABI_PCS_WCHAR_T => "ABI_PCS_wchar_t",
            Tag::ABI_FP_ROUNDING => "ABI_FP_rounding",
            Tag::ABI_FP_DENORMAL => "ABI_FP_denormal",
            Tag::ABI_FP_EXCEPTIONS => "ABI_FP_exceptions",
            Tag::ABI_FP_USER_EXCEPTIONS => "ABI_FP_user_exceptions",
            Tag::ABI_FP_NUMBER_MODEL => "ABI_FP_number_model",
            Tag::ABI_ALIGN_NEEDED => "ABI_align_needed",
            Tag::ABI_ALIGN8_PRESERVED => "ABI_align8_preserved",
            Tag::ABI_ENUM_SIZE => "ABI_enum_size",
            Tag::ABI_HARDFP_USE => "ABI_HardFP_use",
            Tag::ABI_VFP_ARGS => "ABI_VFP_args",
            Tag::ABI_WMMX_ARGS => "ABI_WMMX_args",
            Tag::ABI_OPTIMIZATION_GOALS => "ABI_optimization_goals",
            Tag::ABI_FP_OPTIMIZATION_GOALS => "ABI_FP_optimization_goals",
            Tag::COMPATIBILITY => "compatibility",
            Tag::CPU_UNALIGNED_ACCESS => "CPU_unaligned_access",
            Tag::FP_HP_EXTENSION => "FP_HP_extension",
            Tag::ABI_FP_16BIT_FORMAT => "ABI_FP_16bit_format",
            Tag::MPEXTENSION_USE => "MPextension_use",
            Tag::DIV_USE => "DIV_use",
            Tag::NODEFAULTS => "nodefaults",
            Tag::ALSO_COMPATIBLE_WITH => "also_compatible_with",
            Tag::T2EE_USE => "T2EE_use",
            Tag::CONFORMANCE => "conformance",
            Tag::VIRTUALIZATION_USE => "Virtualization_use",
            Tag::MPEXTENSION_USE_LEGACY => "MPextension_use_legacy",
            _ => return None,
        };
        Some(name)
    }

    /// How the value following this tag is encoded.
    ///
    /// Tags below 32 are fixed by the EABI: `CPU_raw_name` and `CPU_name` are
    /// strings, every other one is a ULEB128. From 32 on the parity decides so that
    /// unknown tags can be skipped: even tags carry a ULEB128, odd tags a string.
    /// `compatibility` (32) is the one exception; it is a ULEB128 flag followed by a
    /// string, and is reported as a string here.
    pub fn value_kind(self) -> ValueKind {
        match self.0 {
            4 | 5 | 32 => ValueKind::Ntbs,
            n if n < 32 => ValueKind::Uleb128,
            n if n % 2 == 0 => ValueKind::Uleb128,
            _ => ValueKind::Ntbs,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Tag_{name}"),
            None => write!(f, "Tag_{}", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Uleb128,
    /// Null-terminated byte string.
    Ntbs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Uleb128(u64),
    Ntbs(String),
}

impl AttributeValue {
    pub fn as_uleb128(&self) -> Option<u64> {
        match self {
            AttributeValue::Uleb128(v) => Some(*v),
            AttributeValue::Ntbs(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Ntbs(s) => Some(s),
            AttributeValue::Uleb128(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Uleb128(v) => write!(f, "{v}"),
            AttributeValue::Ntbs(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub tag: Tag,
    pub value: AttributeValue,
}

/// What a group of attributes applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    File,
    Section(Vec<u64>),
    Symbol(Vec<u64>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeGroup {
    pub scope: Scope,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorSubsection {
    pub vendor: String,
    /// Empty for vendors other than `aeabi`, whose records are not decoded.
    pub groups: Vec<AttributeGroup>,
}

/// `Tag_ABI_VFP_args`: arguments passed in VFP registers.
pub const ABI_VFP_ARGS_VFP: u64 = 1;
/// `Tag_ABI_VFP_args`: code is compatible with both base and VFP variants.
pub const ABI_VFP_ARGS_COMPATIBLE: u64 = 3;

/// True if a `Tag_ABI_VFP_args` value accepts the hard-float (VFP) variant.
pub fn vfp_args_accepts_vfp_variant(value: u64) -> bool {
    value == ABI_VFP_ARGS_VFP || value == ABI_VFP_ARGS_COMPATIBLE
}

#[derive(Debug, Error)]
enum AttributeError {
    #[error("unknown format version {0:#x}")]
    Version(u8),
    #[error("length {len} is shorter than its own header ({remaining} bytes left)")]
    Length { len: usize, remaining: usize },
    #[error(transparent)]
    Read(#[from] gimli::Error),
}

/// Decoded contents of an ARM attributes section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmAttributes {
    pub vendors: Vec<VendorSubsection>,
}

impl ArmAttributes {
    /// Locates the attributes section by type and decodes it.
    ///
    /// `Ok(None)` when the object has no such section. Content running past the end
    /// of the source is decoded as far as it goes.
    pub fn read<R: Read + Seek>(
        sections: &SectionTable,
        endian: Endianness,
        cur: &mut ByteCursor<R>,
    ) -> Result<Option<Self>> {
        let Some(sh) = sections.find_by_type(SHT_ARM_ATTRIBUTES) else {
            log::debug!("No ARM attributes section");
            return Ok(None);
        };
        cur.seek(sh.file_offset)?;
        let data = cur.read_up_to(sh.size)?;
        if (data.len() as u64) < sh.size {
            log::warn!(
                "ARM attributes section {} truncated: {} of {} bytes at {:#x}",
                sh.index,
                data.len(),
                sh.size,
                sh.file_offset
            );
        }
        Ok(Some(Self::parse(&data, endian)))
    }

    /// Decodes raw section content. Never fails; see the module docs.
    pub fn parse(data: &[u8], endian: Endianness) -> Self {
        let mut attrs = ArmAttributes::default();
        if let Err(e) = attrs.parse_into(data, endian) {
            log::warn!(
                "Malformed ARM attributes ({e}); keeping {} records",
                attrs.iter().count()
            );
        }
        attrs
    }

    fn parse_into(&mut self, data: &[u8], endian: Endianness) -> std::result::Result<(), AttributeError> {
        let endian = match endian {
            Endianness::Little => RunTimeEndian::Little,
            Endianness::Big => RunTimeEndian::Big,
        };
        let mut input = EndianSlice::new(data, endian);

        let version = input.read_u8()?;
        if version != ATTRIBUTES_FORMAT_VERSION {
            return Err(AttributeError::Version(version));
        }

        while !input.is_empty() {
            let mut sub = split_counted(&mut input, 4)?;
            let vendor = lossy(sub.read_null_terminated_slice()?);
            let mut subsection = VendorSubsection {
                vendor,
                groups: Vec::new(),
            };
            let res = if subsection.vendor == AEABI_VENDOR {
                parse_groups(sub, &mut subsection.groups)
            } else {
                log::debug!("Skipping attributes of vendor {:?}", subsection.vendor);
                Ok(())
            };
            self.vendors.push(subsection);
            res?;
        }
        Ok(())
    }

    /// All records of the `aeabi` vendor, in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.aeabi_groups().flat_map(|g| g.attributes.iter())
    }

    fn aeabi_groups(&self) -> impl Iterator<Item = &AttributeGroup> {
        self.vendors
            .iter()
            .filter(|v| v.vendor == AEABI_VENDOR)
            .flat_map(|v| v.groups.iter())
    }

    /// First `aeabi` record with `tag`, preferring file scope.
    pub fn get(&self, tag: Tag) -> Option<&Attribute> {
        let find = |file_scope: bool| {
            self.aeabi_groups()
                .filter(move |g| (g.scope == Scope::File) == file_scope)
                .flat_map(|g| g.attributes.iter())
                .find(|a| a.tag == tag)
        };
        find(true).or_else(|| find(false))
    }

    fn get_str(&self, tag: Tag) -> Option<&str> {
        self.get(tag)
            .and_then(|a| a.value.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn cpu_name(&self) -> Option<&str> {
        self.get_str(Tag::CPU_NAME)
    }

    pub fn cpu_raw_name(&self) -> Option<&str> {
        self.get_str(Tag::CPU_RAW_NAME)
    }

    pub fn abi_vfp_args(&self) -> Option<u64> {
        self.get(Tag::ABI_VFP_ARGS).and_then(|a| a.value.as_uleb128())
    }

    /// True if the object expects floating-point arguments in VFP registers.
    pub fn uses_hard_float(&self) -> bool {
        self.abi_vfp_args().is_some_and(vfp_args_accepts_vfp_variant)
    }
}

type Input<'a> = EndianSlice<'a, RunTimeEndian>;

/// Splits off a block whose `u32` size (counting `consumed` bytes already read for
/// it, including the size field itself) was just read from `input`.
///
/// A size overrunning the input is clamped to what is left.
fn split_counted<'a>(input: &mut Input<'a>, consumed: usize) -> std::result::Result<Input<'a>, AttributeError> {
    let remaining = input.len();
    let len = input.read_u32()? as usize;
    if len < consumed {
        return Err(AttributeError::Length { len, remaining });
    }
    let mut body = len - consumed;
    if body > input.len() {
        log::warn!(
            "Attribute block of {len} bytes overruns the {remaining} bytes left; decoding what is there"
        );
        body = input.len();
    }
    Ok(input.split(body)?)
}

fn parse_groups(mut sub: Input<'_>, groups: &mut Vec<AttributeGroup>) -> std::result::Result<(), AttributeError> {
    while !sub.is_empty() {
        let start = sub.len();
        let tag = Tag(sub.read_uleb128()?);
        let tag_len = start - sub.len();
        let mut body = split_counted(&mut sub, tag_len + 4)?;

        let scope = match tag {
            Tag::FILE => Scope::File,
            Tag::SECTION => Scope::Section(read_indices(&mut body)?),
            Tag::SYMBOL => Scope::Symbol(read_indices(&mut body)?),
            other => {
                log::warn!("Skipping attribute group with unknown scope {}", other.0);
                continue;
            }
        };

        let mut group = AttributeGroup {
            scope,
            attributes: Vec::new(),
        };
        let res = parse_records(body, &mut group.attributes);
        groups.push(group);
        res?;
    }
    Ok(())
}

fn read_indices(body: &mut Input<'_>) -> gimli::Result<Vec<u64>> {
    let mut indices = Vec::new();
    loop {
        match body.read_uleb128()? {
            0 => return Ok(indices),
            index => indices.push(index),
        }
    }
}

fn parse_records(mut body: Input<'_>, out: &mut Vec<Attribute>) -> gimli::Result<()> {
    while !body.is_empty() {
        let tag = Tag(body.read_uleb128()?);
        let value = match tag.value_kind() {
            ValueKind::Uleb128 => AttributeValue::Uleb128(body.read_uleb128()?),
            ValueKind::Ntbs => {
                if tag == Tag::COMPATIBILITY {
                    body.read_uleb128()?;
                }
                AttributeValue::Ntbs(lossy(body.read_null_terminated_slice()?))
            }
        };
        log::debug!("ARM attribute {tag} = {value}");
        out.push(Attribute { tag, value });
    }
    Ok(())
}

fn lossy(slice: Input<'_>) -> String {
    String::from_utf8_lossy(slice.slice()).into_owned()
}
