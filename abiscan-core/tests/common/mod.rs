//! Synthetic ELF images for integration tests.
#![allow(dead_code)]

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_ARM_ATTRIBUTES: u32 = 0x7000_0003;

pub const EM_386: u16 = 3;
pub const EM_MIPS: u16 = 8;
pub const EM_ARM: u16 = 40;
pub const EM_X86_64: u16 = 62;
pub const EM_AARCH64: u16 = 183;

pub const ET_DYN: u16 = 3;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Out {
    buf: Vec<u8>,
    big: bool,
    wide: bool,
}

impl Out {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.buf.extend_from_slice(&b);
    }

    fn u32(&mut self, v: u32) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.buf.extend_from_slice(&b);
    }

    fn u64(&mut self, v: u64) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.buf.extend_from_slice(&b);
    }

    fn word(&mut self, v: u64) {
        if self.wide {
            self.u64(v)
        } else {
            self.u32(v as u32)
        }
    }

    fn align(&mut self, to: usize) {
        while self.buf.len() % to != 0 {
            self.buf.push(0);
        }
    }
}

#[derive(Clone)]
pub struct Section {
    pub name: String,
    pub kind: u32,
    pub data: Vec<u8>,
}

/// Builds `[header][section data...][.shstrtab][section header table]`.
///
/// Section 0 is the null section; `.shstrtab` is always the last section.
#[derive(Clone)]
pub struct ElfBuilder {
    pub wide: bool,
    pub big: bool,
    pub machine: u16,
    pub e_type: u16,
    pub entry: u64,
    pub flags: u32,
    pub sections: Vec<Section>,
    /// Writes `e_shnum = 0` and the real count into section 0's `sh_size`.
    pub extended_count: bool,
    pub shstrndx: Option<u16>,
    /// Writes `e_shstrndx = SHN_XINDEX` and the real index into section 0's `sh_link`.
    pub extended_strndx: bool,
    pub no_section_table: bool,
}

impl ElfBuilder {
    pub fn new(wide: bool, big: bool, machine: u16) -> Self {
        Self {
            wide,
            big,
            machine,
            e_type: ET_DYN,
            entry: 0,
            flags: 0,
            sections: Vec::new(),
            extended_count: false,
            shstrndx: None,
            extended_strndx: false,
            no_section_table: false,
        }
    }

    pub fn section(mut self, name: &str, kind: u32, data: &[u8]) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            kind,
            data: data.to_vec(),
        });
        self
    }

    /// Index the `.shstrtab` section will get.
    pub fn strtab_index(&self) -> u16 {
        self.sections.len() as u16 + 1
    }

    pub fn build(&self) -> Vec<u8> {
        let (ehsize, phentsize, shentsize) = if self.wide { (64, 56, 64) } else { (52, 32, 40) };
        let mut out = Out {
            buf: vec![0u8; ehsize as usize],
            big: self.big,
            wide: self.wide,
        };

        let mut names = vec![0u8];
        let mut name_offsets = Vec::new();
        for s in self.sections.iter() {
            name_offsets.push(names.len() as u32);
            names.extend_from_slice(s.name.as_bytes());
            names.push(0);
        }
        let strtab_name = names.len() as u32;
        names.extend_from_slice(b".shstrtab\0");

        let mut placed = Vec::new();
        for s in self.sections.iter().map(|s| &s.data).chain(std::iter::once(&names)) {
            out.align(8);
            placed.push((out.buf.len() as u64, s.len() as u64));
            out.buf.extend_from_slice(s);
        }

        out.align(8);
        let shoff = out.buf.len() as u64;
        let count = self.sections.len() as u64 + 2;
        let strndx = self.shstrndx.unwrap_or(self.strtab_index());

        // Null section, possibly carrying the escapes.
        out.u32(0);
        out.u32(0);
        out.word(0);
        out.word(0);
        out.word(0);
        out.word(if self.extended_count { count } else { 0 });
        out.u32(if self.extended_strndx { u32::from(strndx) } else { 0 });
        out.u32(0);
        out.word(0);
        out.word(0);

        let kinds = self.sections.iter().map(|s| s.kind).chain(std::iter::once(SHT_STRTAB));
        let name_idx = name_offsets.iter().copied().chain(std::iter::once(strtab_name));
        for ((kind, name), (offset, size)) in kinds.zip(name_idx).zip(placed) {
            out.u32(name);
            out.u32(kind);
            out.word(0);
            out.word(0);
            out.word(offset);
            out.word(size);
            out.u32(0);
            out.u32(0);
            out.word(1);
            out.word(0);
        }

        let mut hdr = Out {
            buf: Vec::new(),
            big: self.big,
            wide: self.wide,
        };
        hdr.buf.extend_from_slice(b"\x7fELF");
        hdr.u8(if self.wide { 2 } else { 1 });
        hdr.u8(if self.big { 2 } else { 1 });
        hdr.u8(1);
        hdr.buf.extend_from_slice(&[0u8; 9]);
        hdr.u16(self.e_type);
        hdr.u16(self.machine);
        hdr.u32(1);
        hdr.word(self.entry);
        hdr.word(0);
        hdr.word(if self.no_section_table { 0 } else { shoff });
        hdr.u32(self.flags);
        hdr.u16(ehsize);
        hdr.u16(phentsize);
        hdr.u16(0);
        hdr.u16(shentsize);
        hdr.u16(if self.extended_count { 0 } else { count as u16 });
        hdr.u16(if self.extended_strndx { 0xffff } else { strndx });
        assert_eq!(hdr.buf.len(), ehsize as usize);

        out.buf[..hdr.buf.len()].copy_from_slice(&hdr.buf);
        out.buf
    }
}

/// `.ARM.attributes` content with one `aeabi` file scope group.
pub fn arm_attributes(
    cpu_name: Option<&str>,
    cpu_raw_name: Option<&str>,
    vfp_args: Option<u64>,
    big: bool,
) -> Vec<u8> {
    let u32_bytes = |v: u32| if big { v.to_be_bytes() } else { v.to_le_bytes() };

    let mut records = Vec::new();
    if let Some(raw) = cpu_raw_name {
        records.push(4);
        records.extend_from_slice(raw.as_bytes());
        records.push(0);
    }
    if let Some(name) = cpu_name {
        records.push(5);
        records.extend_from_slice(name.as_bytes());
        records.push(0);
    }
    // Tag_CPU_arch: v7
    records.extend_from_slice(&[6, 10]);
    if let Some(v) = vfp_args {
        records.push(28);
        gimli::leb128::write::unsigned(&mut records, v).unwrap();
    }

    let mut sub = b"aeabi\0".to_vec();
    sub.push(1);
    sub.extend_from_slice(&u32_bytes(records.len() as u32 + 5));
    sub.extend_from_slice(&records);

    let mut out = vec![b'A'];
    out.extend_from_slice(&u32_bytes(sub.len() as u32 + 4));
    out.extend_from_slice(&sub);
    out
}
