//! Canonical CPU and ABI enumerations and their fixed lookup tables.
//!
//! All tables are compile-time constants; lookups never touch shared mutable state.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuFamily {
    X86,
    Arm32,
    Arm64,
    Ppc,
    Mips,
    SuperH,
    Sparc,
    Ia64,
    PaRisc,
    Unknown,
}

impl CpuFamily {
    pub fn is_arm(self) -> bool {
        matches!(self, CpuFamily::Arm32 | CpuFamily::Arm64)
    }
}

impl fmt::Display for CpuFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Canonical CPU variant, tagged with its family and a lower-case lookup name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuType {
    /// ARM 32-bit default.
    Arm,
    /// ARM7EJ, ARM9E, ARM10E, XScale.
    ArmV5,
    /// ARM11.
    ArmV6,
    /// ARM Cortex (32-bit profiles).
    ArmV7,
    X86_32,
    Ppc,
    Mips32,
    SuperH,
    Sparc32,
    /// ARM 64-bit default.
    Arm64,
    /// ARMv8-A cores.
    ArmV8A,
    X86_64,
    Ppc64,
    Mips64,
    Ia64,
    SparcV9_64,
    PaRisc2_0,
    Unknown,
}

impl CpuType {
    pub const ALL: [CpuType; 18] = [
        CpuType::Arm,
        CpuType::ArmV5,
        CpuType::ArmV6,
        CpuType::ArmV7,
        CpuType::X86_32,
        CpuType::Ppc,
        CpuType::Mips32,
        CpuType::SuperH,
        CpuType::Sparc32,
        CpuType::Arm64,
        CpuType::ArmV8A,
        CpuType::X86_64,
        CpuType::Ppc64,
        CpuType::Mips64,
        CpuType::Ia64,
        CpuType::SparcV9_64,
        CpuType::PaRisc2_0,
        CpuType::Unknown,
    ];

    pub fn family(self) -> CpuFamily {
        match self {
            CpuType::Arm | CpuType::ArmV5 | CpuType::ArmV6 | CpuType::ArmV7 => CpuFamily::Arm32,
            CpuType::Arm64 | CpuType::ArmV8A => CpuFamily::Arm64,
            CpuType::X86_32 | CpuType::X86_64 => CpuFamily::X86,
            CpuType::Ppc | CpuType::Ppc64 => CpuFamily::Ppc,
            CpuType::Mips32 | CpuType::Mips64 => CpuFamily::Mips,
            CpuType::SuperH => CpuFamily::SuperH,
            CpuType::Sparc32 | CpuType::SparcV9_64 => CpuFamily::Sparc,
            CpuType::Ia64 => CpuFamily::Ia64,
            CpuType::PaRisc2_0 => CpuFamily::PaRisc,
            CpuType::Unknown => CpuFamily::Unknown,
        }
    }

    /// Lower-case canonical name. [`CpuType::query`] maps it back to `self`.
    pub fn name(self) -> &'static str {
        match self {
            CpuType::Arm => "arm",
            CpuType::ArmV5 => "armv5",
            CpuType::ArmV6 => "armv6",
            CpuType::ArmV7 => "armv7",
            CpuType::X86_32 => "i386",
            CpuType::Ppc => "ppc",
            CpuType::Mips32 => "mips",
            CpuType::SuperH => "superh",
            CpuType::Sparc32 => "sparc",
            CpuType::Arm64 => "aarch64",
            CpuType::ArmV8A => "armv8-a",
            CpuType::X86_64 => "x86_64",
            CpuType::Ppc64 => "ppc64",
            CpuType::Mips64 => "mips64",
            CpuType::Ia64 => "ia64",
            CpuType::SparcV9_64 => "sparcv9",
            CpuType::PaRisc2_0 => "parisc",
            CpuType::Unknown => "unknown",
        }
    }

    pub fn is_32bit(self) -> bool {
        matches!(
            self,
            CpuType::Arm
                | CpuType::ArmV5
                | CpuType::ArmV6
                | CpuType::ArmV7
                | CpuType::X86_32
                | CpuType::Ppc
                | CpuType::Mips32
                | CpuType::SuperH
                | CpuType::Sparc32
        )
    }

    /// Maps a lower-case CPU name to its canonical type.
    ///
    /// Accepts canonical names, common toolchain aliases (`amd64`, `i686`,
    /// `armeabi-v7a`, ...), ARM core names as emitted in `Tag_CPU_name`
    /// (`cortex-a9`, `arm1176jzf-s`, ...) and the `arm-` prefixed forms of the
    /// ARM architecture names (`arm-v7`, `arm-7-a`).
    pub fn query(name: &str) -> Option<CpuType> {
        if let Some(t) = CpuType::ALL.iter().copied().find(|t| t.name() == name) {
            return Some(t);
        }
        if let Some(&(_, t)) = ARM_CORES.iter().find(|(core, _)| *core == name) {
            return Some(t);
        }

        let t = match name {
            "x86" | "i486" | "i586" | "i686" => CpuType::X86_32,
            "amd64" => CpuType::X86_64,
            "armv8-a" | "arm-v8-a" | "arm-8-a" | "arm64-v8a" => CpuType::ArmV8A,
            "armeabi-v7a" => CpuType::ArmV7,
            "pa_risc2.0" => CpuType::PaRisc2_0,
            n if n.starts_with("arm64") => CpuType::Arm64,
            n if has_arm_arch_prefix(n, '7') => CpuType::ArmV7,
            n if has_arm_arch_prefix(n, '6') => CpuType::ArmV6,
            n if has_arm_arch_prefix(n, '5') => CpuType::ArmV5,
            n if n.starts_with("arm") => CpuType::Arm,
            n if n.starts_with("sparcv9") => CpuType::SparcV9_64,
            n if n.starts_with("sparc") => CpuType::Sparc32,
            n if n.starts_with("ppc64") => CpuType::Ppc64,
            n if n.starts_with("ppc") => CpuType::Ppc,
            n if n.starts_with("mips64") => CpuType::Mips64,
            n if n.starts_with("mips") => CpuType::Mips32,
            n if n.starts_with("superh") => CpuType::SuperH,
            _ => return None,
        };
        Some(t)
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `armvN`, `arm-vN` or `arm-N` followed by anything.
fn has_arm_arch_prefix(name: &str, version: char) -> bool {
    ["armv", "arm-v", "arm-"].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(version))
    })
}

/// ARM core names as toolchains record them in the build attributes.
const ARM_CORES: &[(&str, CpuType)] = &[
    ("arm926ej-s", CpuType::ArmV5),
    ("arm946e-s", CpuType::ArmV5),
    ("arm966e-s", CpuType::ArmV5),
    ("arm968e-s", CpuType::ArmV5),
    ("arm1020e", CpuType::ArmV5),
    ("arm1022e", CpuType::ArmV5),
    ("arm1026ej-s", CpuType::ArmV5),
    ("xscale", CpuType::ArmV5),
    ("iwmmxt", CpuType::ArmV5),
    ("arm1136j-s", CpuType::ArmV6),
    ("arm1136jf-s", CpuType::ArmV6),
    ("arm1156t2-s", CpuType::ArmV6),
    ("arm1176jz-s", CpuType::ArmV6),
    ("arm1176jzf-s", CpuType::ArmV6),
    ("mpcore", CpuType::ArmV6),
    ("cortex-m0", CpuType::ArmV6),
    ("cortex-m0plus", CpuType::ArmV6),
    ("cortex-m1", CpuType::ArmV6),
    ("cortex-a5", CpuType::ArmV7),
    ("cortex-a7", CpuType::ArmV7),
    ("cortex-a8", CpuType::ArmV7),
    ("cortex-a9", CpuType::ArmV7),
    ("cortex-a12", CpuType::ArmV7),
    ("cortex-a15", CpuType::ArmV7),
    ("cortex-a17", CpuType::ArmV7),
    ("cortex-r4", CpuType::ArmV7),
    ("cortex-r5", CpuType::ArmV7),
    ("cortex-r7", CpuType::ArmV7),
    ("cortex-r8", CpuType::ArmV7),
    ("cortex-m3", CpuType::ArmV7),
    ("cortex-m4", CpuType::ArmV7),
    ("cortex-m7", CpuType::ArmV7),
    ("cortex-a32", CpuType::ArmV8A),
    ("cortex-a35", CpuType::ArmV8A),
    ("cortex-a53", CpuType::ArmV8A),
    ("cortex-a55", CpuType::ArmV8A),
    ("cortex-a57", CpuType::ArmV8A),
    ("cortex-a72", CpuType::ArmV8A),
    ("cortex-a73", CpuType::ArmV8A),
    ("cortex-a75", CpuType::ArmV8A),
    ("cortex-a76", CpuType::ArmV8A),
];

/// Calling-convention variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiType {
    GenericAbi,
    /// ARM GNU EABI, soft-float argument passing.
    EabiGnuArmel,
    /// ARM GNU EABI, hard-float (VFP) argument passing.
    EabiGnuArmhf,
    /// AArch64 procedure call standard.
    EabiAarch64,
}

impl AbiType {
    pub fn name(self) -> &'static str {
        match self {
            AbiType::GenericAbi => "generic",
            AbiType::EabiGnuArmel => "eabi-gnu-armel",
            AbiType::EabiGnuArmhf => "eabi-gnu-armhf",
            AbiType::EabiAarch64 => "eabi-aarch64",
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
