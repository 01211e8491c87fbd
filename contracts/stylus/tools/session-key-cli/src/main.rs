use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{Address, Bytes, B256};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use k256::ecdsa::SigningKey;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use session_key_encoder::{encode_owner, encode_session, sign_operation, SessionGrant};
use session_key_manager::{decode_envelope, operation_hash, signing_digest, HashDomain};
use session_key_types::{
    verify_proof, Operation, PermissionLeaf, PermissionTree, SignatureEnvelope,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Off-chain tooling for session key permission trees and account operations.
///
/// Trees are written as JSON (`root`, `generatedAt`, and each leaf with its digest and proof)
/// so the signer side can pick a grant by index later.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the digest of a single permission leaf.
    Leaf {
        #[arg(long)]
        valid_after: u64,
        /// 0 means the grant never expires.
        #[arg(long)]
        valid_until: u64,
        /// Validation module that polices the session key.
        #[arg(long)]
        module: Address,
        /// ABI-encoded module parameters (hex).
        #[arg(long, default_value = "0x")]
        params: Bytes,
    },

    /// Build a permission tree from a JSON array of leaves and write root + proofs.
    Tree {
        #[arg(long)]
        leaves: PathBuf,
        #[arg(long, default_value = "permission-tree.json")]
        output: PathBuf,
    },

    /// Check a Merkle proof (comma-separated siblings) against a root.
    VerifyProof {
        #[arg(long)]
        root: B256,
        #[arg(long)]
        leaf: B256,
        #[arg(long, value_delimiter = ',')]
        proof: Vec<B256>,
    },

    /// Print the hash and the EIP-191 signing digest of a JSON operation.
    OpHash {
        #[arg(long)]
        op: PathBuf,
        #[command(flatten)]
        domain: DomainArgs,
    },

    /// Sign a JSON operation as the account owner and attach the owner envelope.
    SignOwner {
        #[arg(long)]
        op: PathBuf,
        #[arg(long)]
        owner_module: Address,
        #[command(flatten)]
        domain: DomainArgs,
        #[command(flatten)]
        key: KeyArgs,
        /// Write the signed operation here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Sign a JSON operation with a session key granted by one leaf of a tree file.
    SignSession {
        #[arg(long)]
        op: PathBuf,
        /// Tree file written by `tree`.
        #[arg(long)]
        tree: PathBuf,
        /// Index of the granted leaf in the tree file.
        #[arg(long)]
        index: usize,
        /// Session key manager the account has enabled.
        #[arg(long)]
        manager: Address,
        #[command(flatten)]
        domain: DomainArgs,
        #[command(flatten)]
        key: KeyArgs,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Decode an operation signature envelope.
    DecodeEnvelope {
        #[arg(long)]
        signature: Bytes,
    },
}

#[derive(Args, Debug)]
struct DomainArgs {
    /// EntryPoint address bound into the operation hash.
    #[arg(long, env = "ENTRY_POINT")]
    entry_point: Address,

    #[arg(long, env = "CHAIN_ID")]
    chain_id: u64,
}

impl DomainArgs {
    fn domain(&self) -> HashDomain {
        HashDomain::new(self.entry_point, self.chain_id)
    }
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Path to a file containing the signing key.
    #[arg(long, env = "PRIV_KEY_PATH", conflicts_with = "private_key")]
    private_key_path: Option<PathBuf>,

    /// Signing key (hex string, 0x...).
    #[arg(long, env = "PKEY", conflicts_with = "private_key_path")]
    private_key: Option<String>,
}

impl KeyArgs {
    fn signing_key(&self) -> Result<SigningKey> {
        let raw = if let Some(ref path) = self.private_key_path {
            fs::read_to_string(path)
                .with_context(|| format!("failed reading {}", path.display()))?
        } else if let Some(ref pk) = self.private_key {
            pk.clone()
        } else {
            bail!("missing signing key: provide --private-key-path or --private-key (or set PRIV_KEY_PATH/PKEY)");
        };
        parse_signing_key(&raw)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct TreeFile {
    root: B256,
    generated_at: String,
    leaves: Vec<TreeEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct TreeEntry {
    leaf: PermissionLeaf,
    digest: B256,
    proof: Vec<B256>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Leaf {
            valid_after,
            valid_until,
            module,
            params,
        } => {
            let leaf = PermissionLeaf {
                valid_after,
                valid_until,
                module,
                module_params: params,
            };
            println!("{}", leaf.digest().context("invalid leaf")?);
        }
        Command::Tree { leaves, output } => {
            let leaves: Vec<PermissionLeaf> = read_json(&leaves)?;
            let tree_file = build_tree_file(leaves, now_rfc3339())?;
            write_json_atomic(&output, &tree_file)?;
            println!(
                "Wrote {} leaves with root {} to {}",
                tree_file.leaves.len(),
                tree_file.root,
                output.display()
            );
        }
        Command::VerifyProof { root, leaf, proof } => {
            if !verify_proof(root, leaf, &proof) {
                bail!("proof does not verify against {root}");
            }
            println!("ok");
        }
        Command::OpHash { op, domain } => {
            let op: Operation = read_json(&op)?;
            let hash = operation_hash(&op, &domain.domain());
            println!("opHash:        {hash}");
            println!("signingDigest: {}", signing_digest(hash));
        }
        Command::SignOwner {
            op,
            owner_module,
            domain,
            key,
            output,
        } => {
            let mut op: Operation = read_json(&op)?;
            let signature = sign_operation(&op, &domain.domain(), &key.signing_key()?)?;
            op.signature = encode_owner(&signature, owner_module)?;
            emit_operation(&op, output.as_deref())?;
        }
        Command::SignSession {
            op,
            tree,
            index,
            manager,
            domain,
            key,
            output,
        } => {
            let mut op: Operation = read_json(&op)?;
            let tree_file: TreeFile = read_json(&tree)?;
            let grant = grant_at(&tree_file, index, manager)?;
            let signature = sign_operation(&op, &domain.domain(), &key.signing_key()?)?;
            op.signature = encode_session(&signature, &grant)?;
            emit_operation(&op, output.as_deref())?;
        }
        Command::DecodeEnvelope { signature } => {
            match decode_envelope(&signature).context("failed decoding envelope")? {
                SignatureEnvelope::Owner(owner) => {
                    println!("owner");
                    println!("  module:    {}", owner.owner_module);
                    println!("  signature: {}", owner.signature);
                }
                SignatureEnvelope::Session(session) => {
                    println!("session");
                    println!("  manager:    {}", session.manager);
                    println!("  module:     {}", session.module);
                    println!("  validAfter: {}", session.valid_after);
                    println!("  validUntil: {}", session.valid_until);
                    println!("  params:     {}", session.module_params);
                    println!("  leaf:       {}", session.leaf().digest()?);
                    println!("  proof:      {} siblings", session.proof.len());
                    println!("  signature:  {}", session.signature);
                }
            }
        }
    }
    Ok(())
}

fn parse_signing_key(raw: &str) -> Result<SigningKey> {
    let trimmed = raw.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .context("signing key is not valid hex")?;
    SigningKey::from_slice(&bytes).map_err(|_| anyhow!("signing key is not a valid secp256k1 scalar"))
}

fn build_tree_file(leaves: Vec<PermissionLeaf>, generated_at: String) -> Result<TreeFile> {
    let digests = leaves
        .iter()
        .map(PermissionLeaf::digest)
        .collect::<Result<Vec<B256>, _>>()
        .context("invalid leaf")?;
    let tree = PermissionTree::new(digests.clone()).context("failed building permission tree")?;
    info!(root = %tree.root(), leaves = tree.len(), "permission tree built");

    let leaves = leaves
        .into_iter()
        .zip(digests)
        .enumerate()
        .map(|(index, (leaf, digest))| {
            // By index, so duplicated leaves each keep their own path.
            let proof = tree.proof_at(index)?;
            Ok(TreeEntry {
                leaf,
                digest,
                proof,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TreeFile {
        root: tree.root(),
        generated_at,
        leaves,
    })
}

fn grant_at(tree_file: &TreeFile, index: usize, manager: Address) -> Result<SessionGrant> {
    let entry = tree_file.leaves.get(index).ok_or_else(|| {
        anyhow!(
            "leaf index {index} out of range (tree has {} leaves)",
            tree_file.leaves.len()
        )
    })?;
    if !verify_proof(tree_file.root, entry.digest, &entry.proof) {
        bail!("tree file entry {index} does not prove into root {}", tree_file.root);
    }
    debug!(index, digest = %entry.digest, "session grant selected");
    Ok(SessionGrant {
        manager,
        leaf: entry.leaf.clone(),
        proof: entry.proof.clone(),
    })
}

fn emit_operation(op: &Operation, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_json_atomic(path, op)?;
            println!("Wrote signed operation to {}", path.display());
        }
        None => {
            let serialised =
                serde_json::to_string_pretty(op).context("failed serialising operation JSON")?;
            println!("{serialised}");
        }
    }
    Ok(())
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed parsing JSON in {}", path.display()))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> PermissionLeaf {
        PermissionLeaf {
            valid_after: 10,
            valid_until: 1_000,
            module: Address::with_last_byte(byte),
            module_params: Bytes::from(vec![byte; 3]),
        }
    }

    #[test]
    fn test_tree_file_proofs_verify() {
        let tree_file =
            build_tree_file(vec![leaf(1), leaf(2), leaf(3), leaf(2)], "now".to_string()).unwrap();
        assert_eq!(tree_file.leaves.len(), 4);
        for entry in &tree_file.leaves {
            assert_eq!(entry.digest, entry.leaf.digest().unwrap());
            assert!(verify_proof(tree_file.root, entry.digest, &entry.proof));
        }
    }

    #[test]
    fn test_tree_file_rejects_empty_input() {
        assert!(build_tree_file(Vec::new(), "now".to_string()).is_err());
    }

    #[test]
    fn test_grant_at() {
        let tree_file = build_tree_file(vec![leaf(1), leaf(2)], "now".to_string()).unwrap();
        let manager = Address::with_last_byte(0x3a);

        let grant = grant_at(&tree_file, 1, manager).unwrap();
        assert_eq!(grant.leaf, leaf(2));
        assert_eq!(grant.manager, manager);
        assert!(grant_at(&tree_file, 2, manager).is_err());

        let mut tampered = tree_file.clone();
        tampered.root = B256::repeat_byte(0x55);
        assert!(grant_at(&tampered, 0, manager).is_err());
    }

    #[test]
    fn test_tree_file_json_shape() {
        let tree_file = build_tree_file(vec![leaf(7)], "2024-01-01T00:00:00Z".to_string()).unwrap();
        let value = serde_json::to_value(&tree_file).unwrap();
        assert!(value["root"].is_string());
        assert_eq!(value["generatedAt"], "2024-01-01T00:00:00Z");
        assert_eq!(value["leaves"][0]["leaf"]["validUntil"], 1_000);
        assert!(value["leaves"][0]["proof"].as_array().unwrap().is_empty());

        let parsed: TreeFile = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, tree_file);
    }

    #[test]
    fn test_parse_signing_key() {
        let mut raw = "0x".to_string();
        raw.push_str(&"00".repeat(31));
        raw.push_str("01\n");
        let key = parse_signing_key(&raw).unwrap();
        assert_eq!(
            session_key_manager::address_of(key.verifying_key()),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
                .parse::<Address>()
                .unwrap()
        );
        assert!(parse_signing_key("0xzz").is_err());
        assert!(parse_signing_key(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_tmp_path_for() {
        assert_eq!(
            tmp_path_for(Path::new("out/tree.json")),
            PathBuf::from("out/tree.json.tmp")
        );
    }

    #[test]
    fn test_cli_parses_sign_session() {
        let cli = Cli::try_parse_from([
            "session-key",
            "sign-session",
            "--op",
            "op.json",
            "--tree",
            "tree.json",
            "--index",
            "2",
            "--manager",
            "0x000000000000000000000000000000000000003a",
            "--entry-point",
            "0x00000000000000000000000000000000000000e0",
            "--chain-id",
            "1337",
            "--private-key",
            "0x01",
        ])
        .unwrap();
        match cli.command {
            Command::SignSession {
                index,
                domain,
                key,
                ..
            } => {
                assert_eq!(index, 2);
                assert_eq!(domain.chain_id, 1337);
                assert_eq!(key.private_key.as_deref(), Some("0x01"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
