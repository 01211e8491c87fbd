//! Permission tree: a keccak Merkle tree with pair-sorted hashing.
//!
//! Each node is `keccak256(min(a, b) || max(a, b))`, so proofs carry no left/right flags.
//! A level with an odd number of nodes pairs its last node with itself. Proof generation and
//! [`verify_proof`] both follow this rule.

use alloy_primitives::{keccak256, B256};

use crate::errors::TreeError;

/// Hash two sibling nodes in sorted order.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

/// Fold `proof` over `leaf` and compare against `root`.
pub fn verify_proof(root: B256, leaf: B256, proof: &[B256]) -> bool {
    // No root published.
    if root == B256::ZERO {
        return false;
    }
    let computed = proof
        .iter()
        .fold(leaf, |node, sibling| hash_pair(node, *sibling));
    computed == root
}

/// A fully materialised permission tree. `layers[0]` holds the leaf digests, the last layer
/// holds the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionTree {
    layers: Vec<Vec<B256>>,
}

impl PermissionTree {
    /// Build a tree over already-hashed leaves, keeping their order.
    pub fn new(leaves: Vec<B256>) -> Result<Self, TreeError> {
        if leaves.is_empty() {
            return Err(TreeError::EmptyTree);
        }

        let mut layers = vec![leaves];
        while let Some(level) = layers.last().filter(|level| level.len() > 1) {
            let next = level
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(*a, *b),
                    [a] => hash_pair(*a, *a),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next);
        }
        Ok(Self { layers })
    }

    pub fn root(&self) -> B256 {
        // `new` guarantees a non-empty top layer.
        self.layers.last().map(|top| top[0]).unwrap_or_default()
    }

    pub fn leaves(&self) -> &[B256] {
        &self.layers[0]
    }

    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// Proof for the first occurrence of `leaf`.
    pub fn proof(&self, leaf: B256) -> Result<Vec<B256>, TreeError> {
        let index = self
            .leaves()
            .iter()
            .position(|candidate| *candidate == leaf)
            .ok_or(TreeError::LeafNotFound)?;
        self.proof_at(index)
    }

    /// Proof for the leaf at `index`. Duplicate leaves each get their own path.
    pub fn proof_at(&self, index: usize) -> Result<Vec<B256>, TreeError> {
        if index >= self.len() {
            return Err(TreeError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }

        let mut proof = Vec::with_capacity(self.layers.len() - 1);
        let mut i = index;
        for level in &self.layers[..self.layers.len() - 1] {
            let sibling = level.get(i ^ 1).unwrap_or(&level[i]);
            proof.push(*sibling);
            i /= 2;
        }
        Ok(proof)
    }
}
