//! CPU name resolution against the canonical [`CpuType`] table.

use crate::error::{Error, Result};
use crate::platform::CpuType;

/// Marker prepended to vendor names that omit the family, e.g. `7-a` -> `arm-7-a`.
pub const ARM_PREFIX: &str = "arm-";

/// A CPU name together with the canonical type it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub cpu_name: String,
    pub cpu_type: CpuType,
}

/// Lower-cases a vendor CPU name and replaces spaces with hyphens.
pub fn normalize_cpu_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Looks `name` up in the canonical table.
///
/// With `require_arm`, a hit outside the ARM families counts as a miss.
pub fn query_cpu_type(name: &str, require_arm: bool) -> Option<CpuType> {
    let cpu_type = CpuType::query(name)?;
    if require_arm && !cpu_type.family().is_arm() {
        log::debug!(
            "CPU name {name:?} -> {cpu_type} ({}) rejected, not an ARM family",
            cpu_type.family()
        );
        return None;
    }
    Some(cpu_type)
}

/// Resolves the CPU of an ARM object.
///
/// Attempts, first hit wins:
/// 1. `cpu_name` (the `CPU_name` attribute),
/// 2. `cpu_raw_name` (the `CPU_raw_name` attribute),
/// 3. `primary_name`, the name derived from `e_machine`,
/// 4. each of the above with [`ARM_PREFIX`] prepended, in the same order,
/// 5. `primary_name` / `primary_type` verbatim.
///
/// Attribute names are normalized first; absent or empty ones are skipped. The last
/// step only fails if `primary_name` does not map back to `primary_type`, which
/// means the machine table and the CPU table disagree.
pub fn resolve_arm_cpu(
    cpu_name: Option<&str>,
    cpu_raw_name: Option<&str>,
    primary_name: &str,
    primary_type: CpuType,
) -> Result<Resolution> {
    let candidates: Vec<String> = [cpu_name, cpu_raw_name]
        .into_iter()
        .flatten()
        .filter(|name| !name.is_empty())
        .map(normalize_cpu_name)
        .chain(std::iter::once(primary_name.to_string()))
        .collect();

    let direct = candidates.iter().cloned();
    let prefixed = candidates.iter().map(|name| format!("{ARM_PREFIX}{name}"));
    for name in direct.chain(prefixed) {
        match query_cpu_type(&name, true) {
            Some(cpu_type) => {
                log::debug!("CPU name {name:?} -> {cpu_type}");
                return Ok(Resolution {
                    cpu_name: name,
                    cpu_type,
                });
            }
            None => log::debug!("CPU name {name:?} unresolved"),
        }
    }

    verbatim(primary_name, primary_type)
}

/// Last resort: the header's own classification, provided the tables agree on it.
fn verbatim(primary_name: &str, primary_type: CpuType) -> Result<Resolution> {
    if CpuType::query(primary_name) == Some(primary_type) {
        log::warn!("No ARM CPU name resolved; keeping {primary_name:?} from the header");
        return Ok(Resolution {
            cpu_name: primary_name.to_string(),
            cpu_type: primary_type,
        });
    }
    Err(Error::ResolutionExhausted {
        name: primary_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::platform::CpuFamily;

    fn resolve(cpu: Option<&str>, raw: Option<&str>) -> Resolution {
        resolve_arm_cpu(cpu, raw, "arm", CpuType::Arm).unwrap()
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_cpu_name("Cortex-A9"), "cortex-a9");
        assert_eq!(normalize_cpu_name("ARM v7 A"), "arm-v7-a");
    }

    #[test]
    fn family_rejection() {
        assert_eq!(query_cpu_type("x86_64", false), Some(CpuType::X86_64));
        assert_eq!(query_cpu_type("x86_64", true), None);
        assert_eq!(query_cpu_type("aarch64", true), Some(CpuType::Arm64));
        assert_eq!(query_cpu_type("cortex-a9", true), Some(CpuType::ArmV7));
    }

    #[test]
    fn cpu_name_attribute_first() {
        let r = resolve(Some("Cortex-A9"), Some("ARM1176JZF-S"));
        assert_eq!(r.cpu_name, "cortex-a9");
        assert_eq!(r.cpu_type, CpuType::ArmV7);
        assert_eq!(r.cpu_type.family(), CpuFamily::Arm32);
    }

    #[test]
    fn raw_name_when_cpu_name_misses() {
        let r = resolve(Some("Mystery Core"), Some("ARM1176JZF-S"));
        assert_eq!(r.cpu_name, "arm1176jzf-s");
        assert_eq!(r.cpu_type, CpuType::ArmV6);

        let r = resolve(Some(""), Some("armv5te"));
        assert_eq!(r.cpu_type, CpuType::ArmV5);
    }

    #[test]
    fn foreign_family_candidate_is_skipped() {
        let r = resolve(Some("x86_64"), None);
        assert_eq!(r.cpu_name, "arm");
        assert_eq!(r.cpu_type, CpuType::Arm);
    }

    #[test]
    fn direct_lookups_precede_prefixed_ones() {
        // "7-a" only resolves with the prefix, but the header name resolves directly.
        let r = resolve(Some("7-A"), None);
        assert_eq!(r.cpu_name, "arm");

        // Without a directly resolvable header name the prefixed form wins.
        let r = resolve_arm_cpu(Some("7-A"), None, "v6", CpuType::ArmV6).unwrap();
        assert_eq!(r.cpu_name, "arm-7-a");
        assert_eq!(r.cpu_type, CpuType::ArmV7);

        let r = resolve_arm_cpu(None, Some("v6"), "v5", CpuType::ArmV5).unwrap();
        assert_eq!(r.cpu_name, "arm-v6");
    }

    #[test]
    fn prefixed_unknown_name_is_generic_arm() {
        let r = resolve_arm_cpu(Some("Mystery Core"), None, "v5", CpuType::ArmV5).unwrap();
        assert_eq!(r.cpu_name, "arm-mystery-core");
        assert_eq!(r.cpu_type, CpuType::Arm);
    }

    #[test]
    fn verbatim_fallback_and_exhaustion() {
        let r = verbatim("mips", CpuType::Mips32).unwrap();
        assert_eq!(r.cpu_name, "mips");
        assert_eq!(r.cpu_type, CpuType::Mips32);

        let err = verbatim("bogus", CpuType::Arm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResolutionExhausted);
        let err = verbatim("arm", CpuType::ArmV7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResolutionExhausted);
    }
}
