//! # Permit (EIP-712 / EIP-2612)
//!
//! Typed structured-data hashing for signed approvals and secp256k1 signer
//! recovery.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must not exceed half the curve order
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **Replay**: the owner's nonce is part of the signed struct and advances
//!   on every accepted permit

use super::value_objects::{u256_to_word, Address, EcdsaSignature, Hash, U256};
use crate::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use subtle::Choice;

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")`
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Permit struct type; field order is part of the signature format.
pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// Signing domain version.
pub const DOMAIN_VERSION: &str = "1";

/// secp256k1 curve order n
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2 rounded down, the EIP-2 upper bound (inclusive) for S.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

// =============================================================================
// TYPED DATA
// =============================================================================

/// Parameters binding signatures to one token deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningDomain {
    /// Token name.
    pub name: String,
    /// Chain identifier.
    pub chain_id: u64,
    /// Token contract address.
    pub verifying_contract: Address,
}

impl SigningDomain {
    /// `hashStruct(EIP712Domain)`.
    #[must_use]
    pub fn separator(&self) -> Hash {
        let mut encoded = Vec::with_capacity(32 * 5);
        encoded.extend_from_slice(&keccak256(EIP712_DOMAIN_TYPE.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.name.as_bytes()));
        encoded.extend_from_slice(&keccak256(DOMAIN_VERSION.as_bytes()));
        encoded.extend_from_slice(&u256_to_word(U256::from(self.chain_id)));
        encoded.extend_from_slice(&self.verifying_contract.to_word());
        keccak256(&encoded)
    }
}

/// The signed permit message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermitMessage {
    /// Token owner granting the allowance.
    pub owner: Address,
    /// Spender receiving the allowance.
    pub spender: Address,
    /// Allowance value.
    pub value: U256,
    /// Owner nonce at signing time.
    pub nonce: U256,
    /// Expiry, unix seconds.
    pub deadline: U256,
}

impl PermitMessage {
    /// `hashStruct(Permit)`.
    #[must_use]
    pub fn struct_hash(&self) -> Hash {
        let mut encoded = Vec::with_capacity(32 * 6);
        encoded.extend_from_slice(&keccak256(PERMIT_TYPE.as_bytes()));
        encoded.extend_from_slice(&self.owner.to_word());
        encoded.extend_from_slice(&self.spender.to_word());
        encoded.extend_from_slice(&u256_to_word(self.value));
        encoded.extend_from_slice(&u256_to_word(self.nonce));
        encoded.extend_from_slice(&u256_to_word(self.deadline));
        keccak256(&encoded)
    }

    /// Final digest: `keccak256(0x19 0x01 || domainSeparator || structHash)`.
    #[must_use]
    pub fn signing_digest(&self, domain_separator: &Hash) -> Hash {
        typed_data_digest(domain_separator, &self.struct_hash())
    }
}

/// Combines a domain separator and struct hash per EIP-712.
#[must_use]
pub fn typed_data_digest(domain_separator: &Hash, struct_hash: &Hash) -> Hash {
    let mut encoded = [0u8; 66];
    encoded[0] = 0x19;
    encoded[1] = 0x01;
    encoded[2..34].copy_from_slice(domain_separator);
    encoded[34..].copy_from_slice(struct_hash);
    keccak256(&encoded)
}

// =============================================================================
// SIGNER RECOVERY
// =============================================================================

/// Recovers the signer of `digest` and checks it equals `expected`.
pub fn verify_signer(
    digest: &Hash,
    signature: &EcdsaSignature,
    expected: Address,
) -> Result<(), SignatureError> {
    let recovered = recover_address(digest, signature)?;
    if recovered != expected {
        return Err(SignatureError::InvalidSigner {
            expected,
            recovered,
        });
    }
    Ok(())
}

/// Recovers the Ethereum address that produced `signature` over `digest`.
pub fn recover_address(digest: &Hash, signature: &EcdsaSignature) -> Result<Address, SignatureError> {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return Err(SignatureError::InvalidFormat);
    }
    if !is_low_s(&signature.s) {
        return Err(SignatureError::MalleableSignature);
    }

    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Keccak256 hash function.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derives an Ethereum address: last 20 bytes of keccak256(uncompressed pubkey).
#[must_use]
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    // Skip the 0x04 SEC1 prefix
    let hash = keccak256(&pubkey_bytes.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address(address)
}

/// Constant-time `a < b` over big-endian byte strings.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> Choice {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from(u8::from(a[i] < b[i]));
        greater |= not_decided & Choice::from(u8::from(a[i] > b[i]));
    }
    less
}

/// S at most n/2 (EIP-2).
fn is_low_s(s: &[u8; 32]) -> bool {
    (!ct_less_than(&SECP256K1_HALF_ORDER, s)).into()
}

/// Scalar in [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let non_zero = scalar.iter().any(|&b| b != 0);
    non_zero && bool::from(ct_less_than(scalar, &SECP256K1_ORDER))
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// Computes n - s, flipping a signature between its high-S and low-S forms.
#[must_use]
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = i32::from(SECP256K1_ORDER[i]) - i32::from(s[i]) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }
    result
}

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Signing helpers for tests and tooling.
pub mod signing {
    use super::{address_from_pubkey, invert_s, is_low_s};
    use crate::domain::value_objects::{Address, EcdsaSignature, Hash};
    use k256::ecdsa::SigningKey;

    /// Address controlled by `key`.
    #[must_use]
    pub fn address_of(key: &SigningKey) -> Address {
        address_from_pubkey(key.verifying_key())
    }

    /// Signs a 32-byte digest, returning a low-S signature with v in {27, 28}.
    ///
    /// Returns None only if the k256 signer rejects the digest.
    #[must_use]
    pub fn sign_digest(digest: &Hash, key: &SigningKey) -> Option<EcdsaSignature> {
        let (sig, recid) = key.sign_prehash_recoverable(digest).ok()?;

        let sig_bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..]);

        let mut parity = recid.to_byte() & 1;
        if !is_low_s(&s) {
            s = invert_s(&s);
            parity ^= 1;
        }
        Some(EcdsaSignature::new(r, s, 27 + parity))
    }
}

#[cfg(test)]
mod tests {
    use super::signing::{address_of, sign_digest};
    use super::*;
    use k256::ecdsa::SigningKey;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes((&[seed; 32]).into()).unwrap()
    }

    fn domain() -> SigningDomain {
        SigningDomain {
            name: "Taxed Token".to_string(),
            chain_id: 1,
            verifying_contract: Address::from_low_u8(0xcc),
        }
    }

    fn message(owner: Address) -> PermitMessage {
        PermitMessage {
            owner,
            spender: Address::from_low_u8(2),
            value: U256::from(1_000),
            nonce: U256::zero(),
            deadline: U256::from(2_000_000_000u64),
        }
    }

    #[test]
    fn test_type_hashes_match_eip_constants() {
        assert_eq!(
            keccak256(EIP712_DOMAIN_TYPE.as_bytes()).to_vec(),
            hex::decode("8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f")
                .unwrap()
        );
        assert_eq!(
            keccak256(PERMIT_TYPE.as_bytes()).to_vec(),
            hex::decode("6e71edae12b1b97f4d1f60370fef10105fa2faae0126114a169c64845d6126c9")
                .unwrap()
        );
    }

    #[test]
    fn test_keccak_empty_input() {
        assert_eq!(
            keccak256(b"").to_vec(),
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap()
        );
    }

    #[test]
    fn test_separator_binds_every_domain_field() {
        let base = domain().separator();

        let mut other = domain();
        other.chain_id = 5;
        assert_ne!(other.separator(), base);

        let mut other = domain();
        other.name = "Other".to_string();
        assert_ne!(other.separator(), base);

        let mut other = domain();
        other.verifying_contract = Address::from_low_u8(0xcd);
        assert_ne!(other.separator(), base);
    }

    #[test]
    fn test_struct_hash_depends_on_nonce() {
        let owner = Address::from_low_u8(1);
        let mut next = message(owner);
        next.nonce = U256::one();
        assert_ne!(message(owner).struct_hash(), next.struct_hash());
    }

    #[test]
    fn test_sign_and_recover_roundtrip() {
        let signer = key(7);
        let owner = address_of(&signer);
        let digest = message(owner).signing_digest(&domain().separator());
        let signature = sign_digest(&digest, &signer).unwrap();

        assert_eq!(recover_address(&digest, &signature), Ok(owner));
        assert!(verify_signer(&digest, &signature, owner).is_ok());
    }

    #[test]
    fn test_wrong_signer_is_rejected() {
        let signer = key(7);
        let owner = address_of(&key(8));
        let digest = message(owner).signing_digest(&domain().separator());
        let signature = sign_digest(&digest, &signer).unwrap();

        assert_eq!(
            verify_signer(&digest, &signature, owner),
            Err(SignatureError::InvalidSigner {
                expected: owner,
                recovered: address_of(&signer),
            })
        );
    }

    #[test]
    fn test_high_s_is_rejected() {
        let signer = key(9);
        let digest = keccak256(b"malleable");
        let mut signature = sign_digest(&digest, &signer).unwrap();
        signature.s = invert_s(&signature.s);
        signature.v = if signature.v == 27 { 28 } else { 27 };

        assert_eq!(
            recover_address(&digest, &signature),
            Err(SignatureError::MalleableSignature)
        );
    }

    #[test]
    fn test_low_s_bound_is_inclusive() {
        assert!(is_low_s(&SECP256K1_HALF_ORDER));
        assert!(is_low_s(&[0u8; 32]));

        let mut above = SECP256K1_HALF_ORDER;
        above[31] += 1;
        assert!(!is_low_s(&above));
        assert!(!is_low_s(&SECP256K1_ORDER));

        // n/2 and n/2 + 1 are each other's inverse since n is odd.
        assert_eq!(invert_s(&SECP256K1_HALF_ORDER), above);
    }

    #[test]
    fn test_zero_scalars_are_rejected() {
        let digest = keccak256(b"zero");
        let signature = EcdsaSignature::new([0u8; 32], [1u8; 32], 27);
        assert_eq!(
            recover_address(&digest, &signature),
            Err(SignatureError::InvalidFormat)
        );
    }

    #[test]
    fn test_recovery_ids() {
        for v in [0u8, 1, 27, 28] {
            assert!(parse_recovery_id(v).is_ok());
        }
        for v in [2u8, 26, 29, 255] {
            assert_eq!(
                parse_recovery_id(v).unwrap_err(),
                SignatureError::InvalidRecoveryId(v)
            );
        }
    }

    #[test]
    fn test_invert_s_is_an_involution() {
        let s = [0x42u8; 32];
        assert_eq!(invert_s(&invert_s(&s)), s);
    }
}
