//! CPU architecture and feature-tier detection for prebuilt asset selection
//!
//! Prebuilt archives are published per architecture and, on x86-64, per
//! instruction-set tier (avx2 or sse42). A machine below the sse42 tier
//! gets no prebuilt and falls through to the source build.

use std::fs;
use std::process::Command;

/// Target architecture as used in release asset names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
    Other(String),
}

impl Arch {
    pub fn as_asset_str(&self) -> &str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Other(name) => name,
        }
    }
}

/// x86-64 instruction-set tier (or neon on arm64)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuTier {
    Avx2,
    Sse42,
    Neon,
    Baseline,
}

/// Detected CPU profile used to pick a matching release asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuProfile {
    pub arch: Arch,
    pub tier: CpuTier,
}

impl CpuProfile {
    /// Asset name suffix after `<bin>_linux`, or `None` when no prebuilt
    /// matches this machine (unsupported arch or sub-sse42 x86).
    pub fn asset_suffix(&self) -> Option<String> {
        match (&self.arch, self.tier) {
            (Arch::Amd64, CpuTier::Avx2) => Some("amd64_avx2".to_string()),
            (Arch::Amd64, CpuTier::Sse42) => Some("amd64_sse42".to_string()),
            (Arch::Amd64, _) => None,
            (Arch::Arm64, _) => Some("arm64".to_string()),
            (Arch::Other(_), _) => None,
        }
    }

    /// Name of the checksum manifest published next to the assets
    pub fn sums_asset_name(&self) -> Option<String> {
        match &self.arch {
            Arch::Amd64 => match self.tier {
                CpuTier::Avx2 => Some("SHA256SUMS_amd64_avx2.txt".to_string()),
                CpuTier::Sse42 => Some("SHA256SUMS_amd64_sse42.txt".to_string()),
                _ => None,
            },
            Arch::Arm64 => Some("SHA256SUMS_arm64.txt".to_string()),
            Arch::Other(_) => None,
        }
    }
}

/// Pick the feature tier out of `lscpu` or `/proc/cpuinfo` flag text
pub fn tier_from_flags(text: &str) -> CpuTier {
    let lower = text.to_lowercase();
    if lower.contains("avx2") {
        CpuTier::Avx2
    } else if lower.contains("sse4_2") || lower.contains("sse4.2") {
        CpuTier::Sse42
    } else {
        CpuTier::Baseline
    }
}

fn cpu_flags_text() -> String {
    // lscpu first; /proc/cpuinfo as fallback when lscpu is absent
    if let Ok(out) = Command::new("lscpu").output() {
        if out.status.success() {
            return String::from_utf8_lossy(&out.stdout).into_owned();
        }
    }
    fs::read_to_string("/proc/cpuinfo").unwrap_or_default()
}

/// Detect the running machine's profile
pub fn detect() -> CpuProfile {
    match std::env::consts::ARCH {
        "x86_64" => CpuProfile {
            arch: Arch::Amd64,
            tier: tier_from_flags(&cpu_flags_text()),
        },
        "aarch64" => CpuProfile {
            arch: Arch::Arm64,
            tier: CpuTier::Neon,
        },
        other => CpuProfile {
            arch: Arch::Other(other.to_string()),
            tier: CpuTier::Baseline,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_avx2_wins_over_sse42() {
        let flags = "flags: fpu sse4_2 avx avx2 aes";
        assert_eq!(tier_from_flags(flags), CpuTier::Avx2);
    }

    #[test]
    fn test_tier_sse42_fallback() {
        assert_eq!(tier_from_flags("flags: fpu sse4_2"), CpuTier::Sse42);
        assert_eq!(tier_from_flags("Flags: SSE4.2"), CpuTier::Sse42);
    }

    #[test]
    fn test_tier_baseline_when_no_match() {
        assert_eq!(tier_from_flags("flags: fpu sse2"), CpuTier::Baseline);
    }

    #[test]
    fn test_asset_suffix_amd64_tiers() {
        let avx2 = CpuProfile { arch: Arch::Amd64, tier: CpuTier::Avx2 };
        assert_eq!(avx2.asset_suffix().as_deref(), Some("amd64_avx2"));

        let sse42 = CpuProfile { arch: Arch::Amd64, tier: CpuTier::Sse42 };
        assert_eq!(sse42.asset_suffix().as_deref(), Some("amd64_sse42"));
    }

    #[test]
    fn test_asset_suffix_skips_baseline_x86() {
        let baseline = CpuProfile { arch: Arch::Amd64, tier: CpuTier::Baseline };
        assert_eq!(baseline.asset_suffix(), None);
    }

    #[test]
    fn test_asset_suffix_arm64_has_no_tier() {
        let arm = CpuProfile { arch: Arch::Arm64, tier: CpuTier::Neon };
        assert_eq!(arm.asset_suffix().as_deref(), Some("arm64"));
        assert_eq!(arm.sums_asset_name().as_deref(), Some("SHA256SUMS_arm64.txt"));
    }

    #[test]
    fn test_unsupported_arch_gets_no_assets() {
        let riscv = CpuProfile {
            arch: Arch::Other("riscv64".to_string()),
            tier: CpuTier::Baseline,
        };
        assert_eq!(riscv.asset_suffix(), None);
        assert_eq!(riscv.sums_asset_name(), None);
    }
}
