//! Built-in ransomware signatures.
//!
//! Each family carries its MD5, SHA-1 and SHA-256. Algorithms are inferred
//! from digest length when loaded.

use crate::core::error::Result;
use crate::detection::signature::{Signature, SignatureEntry};

/// `(hex digest, label)` pairs.
pub const BUILTIN_SIGNATURES: &[(&str, &str)] = &[
    ("db349b97c37d22f5ea1d1841e3c89eb4", "WannaCry"),
    ("84c82835a5d21bbcf75a61706d8ab5493176a32b", "WannaCry"),
    (
        "aae42fa120f4fd7b981ab56b4c8f2dd48fbf673f3a9e5ebdb78b9342e0b29297",
        "WannaCry",
    ),
    ("5ff465afaabcbf0150d1a3ab2c2e74f3a4426467", "WannaCry"),
    (
        "ed01ebfbc9eb5bbea545af4d01bf5f1071661840480439c6e5babe8e080e41aa",
        "WannaCry",
    ),
    ("4b13069d80a4f2e378b8d2e9cf2d26e9", "Locky"),
    ("97e25c9db16e398be7b45f15785eb153ee25d94a", "Locky"),
    (
        "d2b2bc3b138fa45729d2c1fa0e2d3d8f47b8b5976f885c80e0f04e84a31c814e",
        "Locky",
    ),
    ("1e3b390339526c6b0e667f13a3bfb5ef", "CryptoWall"),
    ("7f22b7593e9ff082f70bd8d208c621d9ffdb5ab8", "CryptoWall"),
    (
        "bb01fa47dbbf1b61fb80db81343fbeb03b8a6559f50a019bfa2d07b703f9a0e8",
        "CryptoWall",
    ),
    ("3f86d7896d8f8572a4a71d2a8c2f7069", "Cerber"),
    ("55cf4c015bcffbf6eeb14fdbf33485f823b0e36b", "Cerber"),
    (
        "ca9c8c3c26fcff5f6edb243ef0ac4f4c33fd56b9ff3c3ab2f7ae1234ddf06437",
        "Cerber",
    ),
    ("aecf21c485fc916c57bb1e5f1f7c2c94", "TeslaCrypt"),
    ("f732edb205b94df03212efb6df755206e487a3b4", "TeslaCrypt"),
    (
        "02c7ed58c75f73dbdb8126a3d13d84eb471e63d1ff07cf63f500e90e293b6d71",
        "TeslaCrypt",
    ),
    ("651b93ca4fc60c837c50f0a943c4e697", "Petya"),
    ("01c149c2ab231d21f7d47006c8b00821754f06f0", "Petya"),
    (
        "c378b36d0f5a5c22e05b8e67c2de9e4b1792f5bbd9956f3e4fa2bdb06cd052f7",
        "Petya",
    ),
    ("c83710b8b83e97032c13e5fe75b46a7e", "Jigsaw"),
    ("f6b82cc06f3e8a891eb62f5d2386900e26f0d7b7", "Jigsaw"),
    (
        "ed8b5767606483484e61c2878a04e5f5a6b3a0e75fc313b1a3d94c8de66e72a3",
        "Jigsaw",
    ),
    ("95f71dfdbb06e8bbca73eec86f22479c", "Sodinokibi"),
    ("ef0e5ba4c5dcd2cb0fdfeffed502df2b7f18f417", "Sodinokibi"),
    (
        "9f4fa8d61c9e3b920615eec8755fdfc3dd815b7e60352b5e509c96a2902b0c3c",
        "Sodinokibi",
    ),
    // EICAR anti-virus test file
    ("44d88612fea8a8f36de82e1278abb02f", "EICAR-Test-File"),
    (
        "275a021bbfb6489e54d471899f7db9d1663fc695ec2fe2a2c4538aabf651fd0f",
        "EICAR-Test-File",
    ),
];

/// EICAR test file content, used to smoke-test an installation.
pub const EICAR_STRING: &str =
    "X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

/// Built-in signatures as untyped feed entries.
pub fn builtin_entries() -> Vec<SignatureEntry> {
    BUILTIN_SIGNATURES
        .iter()
        .map(|(hash, label)| SignatureEntry::untagged(*hash, Some(*label)))
        .collect()
}

/// Built-in signatures, validated.
pub fn builtin_signatures() -> Result<Vec<Signature>> {
    builtin_entries().iter().map(Signature::from_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::algorithm::HashAlgorithm;

    #[test]
    fn test_builtin_list_is_valid() {
        let sigs = builtin_signatures().unwrap();
        assert_eq!(sigs.len(), BUILTIN_SIGNATURES.len());
    }

    #[test]
    fn test_every_family_has_three_algorithms() {
        let sigs = builtin_signatures().unwrap();
        for family in ["Locky", "CryptoWall", "Cerber", "TeslaCrypt", "Petya", "Jigsaw", "Sodinokibi"] {
            let algs: Vec<HashAlgorithm> = sigs
                .iter()
                .filter(|s| s.label.as_deref() == Some(family))
                .map(|s| s.algorithm())
                .collect();
            assert_eq!(
                algs,
                vec![HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Sha256],
                "family {}",
                family
            );
        }
    }

    #[test]
    fn test_no_md5_is_a_truncated_longer_digest() {
        let sigs = builtin_signatures().unwrap();
        let longer: Vec<String> = sigs
            .iter()
            .filter(|s| s.algorithm() != HashAlgorithm::Md5)
            .map(|s| s.digest.to_hex())
            .collect();

        for sig in sigs.iter().filter(|s| s.algorithm() == HashAlgorithm::Md5) {
            let md5 = sig.digest.to_hex();
            assert!(
                !longer.iter().any(|hex| hex.starts_with(&md5)),
                "{} is a prefix of a longer digest",
                md5
            );
        }
    }
}
