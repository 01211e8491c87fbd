//! Operation codec and hash builder.
//!
//! Two encodings of the same field order:
//! - hash encoding: variable-length payloads replaced by their keccak digests, signature left
//!   out. Fixed width, so the digest does not depend on payload size.
//! - accounting encoding: every field verbatim, signature included. Used for cost bookkeeping
//!   only, never hashed.
//!
//! Changing field order or width here breaks every signature produced so far.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use session_key_types::Operation;

/// Binds an operation hash to one executor instance on one chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashDomain {
    pub entry_point: Address,
    pub chain_id: u64,
}

impl HashDomain {
    pub const fn new(entry_point: Address, chain_id: u64) -> Self {
        Self {
            entry_point,
            chain_id,
        }
    }
}

/// `abi.encode(sender, nonce, keccak(initCode), keccak(callData), callGasLimit,
/// verificationGasLimit, preVerificationGas, maxFeePerGas, maxPriorityFeePerGas,
/// keccak(paymasterAndData))`.
pub fn encode_for_hash(op: &Operation) -> Vec<u8> {
    (
        op.sender,
        op.nonce,
        keccak256(&op.init_code),
        keccak256(&op.call_data),
        op.call_gas_limit,
        op.verification_gas_limit,
        op.pre_verification_gas,
        op.max_fee_per_gas,
        op.max_priority_fee_per_gas,
        keccak256(&op.paymaster_and_data),
    )
        .abi_encode_params()
}

/// Same field order as [`encode_for_hash`] with payloads and the signature kept verbatim.
pub fn encode_for_accounting(op: &Operation) -> Vec<u8> {
    (
        op.sender,
        op.nonce,
        op.init_code.clone(),
        op.call_data.clone(),
        op.call_gas_limit,
        op.verification_gas_limit,
        op.pre_verification_gas,
        op.max_fee_per_gas,
        op.max_priority_fee_per_gas,
        op.paymaster_and_data.clone(),
        op.signature.clone(),
    )
        .abi_encode_params()
}

/// `keccak256(abi.encode(keccak256(encode_for_hash(op)), entryPoint, chainId))`.
pub fn operation_hash(op: &Operation, domain: &HashDomain) -> B256 {
    let inner = keccak256(encode_for_hash(op));
    keccak256((inner, domain.entry_point, U256::from(domain.chain_id)).abi_encode_params())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{b256, hex, Bytes};

    fn sample() -> Operation {
        Operation {
            sender: Address::with_last_byte(0x5a),
            nonce: U256::from(3u64),
            init_code: Bytes::new(),
            call_data: Bytes::from_static(&[0xb6, 0x1d, 0x27, 0xf6, 0x01]),
            call_gas_limit: U256::from(3_000_000u64),
            verification_gas_limit: U256::from(250_000u64),
            pre_verification_gas: U256::from(21_000u64),
            max_fee_per_gas: U256::from(2_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        }
    }

    fn domain() -> HashDomain {
        HashDomain::new(Address::with_last_byte(0xe0), 31337)
    }

    #[test]
    fn test_hash_encoding_is_fixed_width() {
        let mut op = sample();
        assert_eq!(encode_for_hash(&op).len(), 10 * 32);
        op.call_data = Bytes::from(vec![0xff; 1000]);
        op.init_code = Bytes::from(vec![0xee; 77]);
        assert_eq!(encode_for_hash(&op).len(), 10 * 32);
    }

    #[test]
    fn test_hash_encoding_digests_payloads() {
        let op = sample();
        let enc = encode_for_hash(&op);
        assert_eq!(&enc[12..32], op.sender.as_slice());
        assert_eq!(&enc[2 * 32..3 * 32], keccak256(&op.init_code).as_slice());
        assert_eq!(&enc[3 * 32..4 * 32], keccak256(&op.call_data).as_slice());
        assert_eq!(&enc[9 * 32..], keccak256(&op.paymaster_and_data).as_slice());
    }

    #[test]
    fn test_accounting_encoding_keeps_payloads_and_signature() {
        let mut op = sample();
        let without_sig = encode_for_accounting(&op).len();
        op.signature = Bytes::from(vec![0x01; 65]);
        let with_sig = encode_for_accounting(&op).len();
        // 65 bytes pad to three words.
        assert_eq!(with_sig - without_sig, 3 * 32);

        // Signature does not feed the hash.
        assert_eq!(operation_hash(&op, &domain()), operation_hash(&sample(), &domain()));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(operation_hash(&sample(), &domain()), operation_hash(&sample(), &domain()));
    }

    #[test]
    fn test_every_hashed_field_changes_digest() {
        let base = operation_hash(&sample(), &domain());
        let one = U256::from(1u64);
        let mutations: Vec<Box<dyn Fn(&mut Operation)>> = vec![
            Box::new(|op: &mut Operation| op.sender = Address::with_last_byte(0x5b)),
            Box::new(move |op: &mut Operation| op.nonce += one),
            Box::new(|op: &mut Operation| op.init_code = Bytes::from_static(&[0x00])),
            Box::new(|op: &mut Operation| op.call_data = Bytes::from_static(&[0xb6, 0x1d, 0x27, 0xf6, 0x02])),
            Box::new(move |op: &mut Operation| op.call_gas_limit += one),
            Box::new(move |op: &mut Operation| op.verification_gas_limit += one),
            Box::new(move |op: &mut Operation| op.pre_verification_gas += one),
            Box::new(move |op: &mut Operation| op.max_fee_per_gas += one),
            Box::new(move |op: &mut Operation| op.max_priority_fee_per_gas += one),
            Box::new(|op: &mut Operation| op.paymaster_and_data = Bytes::from_static(&[0x01])),
        ];
        for (i, mutate) in mutations.iter().enumerate() {
            let mut op = sample();
            mutate(&mut op);
            assert_ne!(operation_hash(&op, &domain()), base, "field {i}");
        }
    }

    #[test]
    fn test_domain_separation() {
        let op = sample();
        let base = operation_hash(&op, &domain());
        let other_chain = HashDomain::new(Address::with_last_byte(0xe0), 1);
        let other_entry_point = HashDomain::new(Address::with_last_byte(0xe1), 31337);
        assert_ne!(operation_hash(&op, &other_chain), base);
        assert_ne!(operation_hash(&op, &other_entry_point), base);
    }

    /// Pinned `getUserOpHash` digest (EntryPoint v0.6 encoding) for a keyed nonce and a
    /// `setApprovalForAll` call.
    #[test]
    fn test_operation_hash_known_answer() {
        let op = Operation {
            sender: Address::with_last_byte(0xaa),
            nonce: (U256::from(3u64) << 64) | U256::from(5u64),
            init_code: Bytes::copy_from_slice(&hex!("deadbeef")),
            call_data: Bytes::copy_from_slice(&hex!("a22cb46500000000000000000000000000000000000000000000000000000000000000d00000000000000000000000000000000000000000000000000000000000000001")),
            call_gas_limit: U256::from(3_000_000u64),
            verification_gas_limit: U256::from(250_000u64),
            pre_verification_gas: U256::from(21_000u64),
            max_fee_per_gas: U256::from(1_000_000_007u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
            paymaster_and_data: Bytes::new(),
            signature: Bytes::from_static(&[0x01; 65]),
        };
        let domain = HashDomain::new(Address::with_last_byte(0xe0), 1337);
        assert_eq!(
            operation_hash(&op, &domain),
            b256!("b24c1a12f133d199c8e04c1527d8281f4834ea3a91d8647db905b8efd5d6498b")
        );
    }
}
