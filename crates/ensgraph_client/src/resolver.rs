//! ENS name resolution over Ethereum JSON-RPC.
//!
//! Only the read path is implemented: registry lookup of the resolver
//! contract, then `addr(bytes32)` and `text(bytes32,string)` calls against it.
//! Every failure is logged and surfaces to callers as `None`.

use crate::error::ResolveError;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;

pub const DEFAULT_RPC_URL: &str = "https://cloudflare-eth.com";

/// ENS registry, same address on mainnet and the main testnets.
pub const ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Text records fetched for a profile.
pub const TEXT_RECORD_KEYS: [&str; 14] = [
    "email",
    "url",
    "description",
    "notice",
    "keywords",
    "com.twitter",
    "com.github",
    "com.discord",
    "org.telegram",
    "io.keybase",
    "avatar",
    "header",
    "name",
    "location",
];

const RESOLVER_SELECTOR: &str = "0178b8bf";
const ADDR_SELECTOR: &str = "3b3b57de";
const TEXT_SELECTOR: &str = "59d1d43c";

/// Resolved profile of one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnsProfile {
    pub name: String,
    /// EIP-55 checksummed address.
    pub address: String,
    pub avatar: Option<String>,
    /// Non-empty text records keyed by record name.
    pub records: BTreeMap<String, String>,
}

/// Black-box name lookups used by the rendering pipeline and the CLI.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Displayable avatar URL, or `None` when unset, unsupported or unresolvable.
    async fn resolve_avatar(&self, name: &str) -> Option<String>;

    /// Address plus text records, or `None` when the name has no address.
    async fn resolve_profile(&self, name: &str) -> Option<EnsProfile>;
}

/// Trims and lowercases a name; every dot-separated label must be non-empty.
pub fn normalize_name(raw: &str) -> Result<String, ResolveError> {
    let name = raw.trim().to_lowercase();
    let bad_label = |label: &str| label.is_empty() || label.contains(char::is_whitespace);
    if name.is_empty() || name.split('.').any(bad_label) {
        return Err(ResolveError::InvalidName(raw.to_string()));
    }
    Ok(name)
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Recursive Keccak-256 node hash of a dot-separated name. The empty name hashes to zero.
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&keccak256(label.as_bytes()));
        node = keccak256(&buf);
    }
    node
}

/// Maps an avatar text record to a URL a renderer can load directly.
///
/// `http(s)` and `data:` URIs pass through and `ipfs://` is rewritten
/// through [`IPFS_GATEWAY`]. NFT references and other schemes give `None`.
pub fn avatar_url(record: &str) -> Option<String> {
    let record = record.trim();
    let lower = record.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") || lower.starts_with("data:") {
        return Some(record.to_string());
    }
    if lower.starts_with("ipfs://") {
        let path = &record["ipfs://".len()..];
        let path = path.strip_prefix("ipfs/").unwrap_or(path);
        if path.is_empty() {
            return None;
        }
        return Some(format!("{IPFS_GATEWAY}{path}"));
    }
    None
}

/// EIP-55 mixed-case rendering of a 20-byte address.
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (index, ch) in lower.chars().enumerate() {
        let nibble = (hash[index / 2] >> (if index % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn encode_text_call(node: &[u8; 32], key: &str) -> String {
    let mut data = Vec::with_capacity(32 * 4 + key.len());
    data.extend_from_slice(node);
    data.extend_from_slice(&abi_word(64));
    data.extend_from_slice(&abi_word(key.len() as u64));
    data.extend_from_slice(key.as_bytes());
    let padding = (32 - key.len() % 32) % 32;
    data.extend(std::iter::repeat(0u8).take(padding));
    format!("0x{TEXT_SELECTOR}{}", hex::encode(data))
}

fn abi_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn decode_hex_result(result: &str) -> Result<Vec<u8>, ResolveError> {
    let digits = result.strip_prefix("0x").unwrap_or(result);
    hex::decode(digits).map_err(|err| ResolveError::Malformed(err.to_string()))
}

fn read_word_usize(bytes: &[u8], offset: usize) -> Result<usize, ResolveError> {
    let word = offset
        .checked_add(32)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| ResolveError::Malformed("word out of range".to_string()))?;
    if word[..24].iter().any(|byte| *byte != 0) {
        return Err(ResolveError::Malformed("word does not fit usize".to_string()));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(tail))
        .map_err(|_| ResolveError::Malformed("word does not fit usize".to_string()))
}

/// Last 20 bytes of the first word, or `None` for the zero address or an empty result.
fn decode_address(bytes: &[u8]) -> Result<Option<[u8; 20]>, ResolveError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let word = bytes
        .get(..32)
        .ok_or_else(|| ResolveError::Malformed("short address result".to_string()))?;
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..]);
    if address.iter().all(|byte| *byte == 0) {
        Ok(None)
    } else {
        Ok(Some(address))
    }
}

fn decode_string(bytes: &[u8]) -> Result<String, ResolveError> {
    if bytes.is_empty() {
        return Ok(String::new());
    }
    let offset = read_word_usize(bytes, 0)?;
    let len = read_word_usize(bytes, offset)?;
    let start = offset + 32;
    let raw = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| ResolveError::Malformed("string out of range".to_string()))?;
    String::from_utf8(raw.to_vec()).map_err(|err| ResolveError::Malformed(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

/// [`NameResolver`] backed by `eth_call` against a JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcNameResolver {
    http: Client,
    rpc_url: String,
    registry: String,
}

impl RpcNameResolver {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, ResolveError> {
        Ok(Self {
            http: Client::builder().build()?,
            rpc_url: rpc_url.into(),
            registry: ENS_REGISTRY.to_string(),
        })
    }

    /// Points registry lookups at another contract, for test chains.
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = registry.into();
        self
    }

    async fn eth_call(&self, to: &str, data: &str) -> Result<Vec<u8>, ResolveError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": to, "data": data }, "latest"],
        });
        let response: RpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(ResolveError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        let result = response
            .result
            .ok_or_else(|| ResolveError::Malformed("missing result".to_string()))?;
        decode_hex_result(&result)
    }

    async fn resolver_for(&self, node: &[u8; 32]) -> Result<Option<String>, ResolveError> {
        let data = format!("0x{RESOLVER_SELECTOR}{}", hex::encode(node));
        let bytes = self.eth_call(&self.registry, &data).await?;
        Ok(decode_address(&bytes)?.map(|address| format!("0x{}", hex::encode(address))))
    }

    async fn address(&self, resolver: &str, node: &[u8; 32]) -> Result<Option<[u8; 20]>, ResolveError> {
        let data = format!("0x{ADDR_SELECTOR}{}", hex::encode(node));
        let bytes = self.eth_call(resolver, &data).await?;
        decode_address(&bytes)
    }

    async fn text(&self, resolver: &str, node: &[u8; 32], key: &str) -> Result<String, ResolveError> {
        let bytes = self.eth_call(resolver, &encode_text_call(node, key)).await?;
        decode_string(&bytes)
    }

    async fn lookup_avatar(&self, name: &str) -> Result<Option<String>, ResolveError> {
        let name = normalize_name(name)?;
        let node = namehash(&name);
        let Some(resolver) = self.resolver_for(&node).await? else {
            return Ok(None);
        };
        let record = self.text(&resolver, &node, "avatar").await?;
        Ok(avatar_url(&record))
    }

    async fn lookup_profile(&self, name: &str) -> Result<Option<EnsProfile>, ResolveError> {
        let name = normalize_name(name)?;
        let node = namehash(&name);
        let Some(resolver) = self.resolver_for(&node).await? else {
            return Ok(None);
        };
        let Some(address) = self.address(&resolver, &node).await? else {
            return Ok(None);
        };

        let lookups = TEXT_RECORD_KEYS
            .iter()
            .map(|key| self.text(&resolver, &node, key));
        let values = join_all(lookups).await;

        let mut records = BTreeMap::new();
        for (key, value) in TEXT_RECORD_KEYS.iter().zip(values) {
            match value {
                Ok(value) if !value.is_empty() => {
                    records.insert((*key).to_string(), value);
                }
                Ok(_) => {}
                Err(err) => {
                    debug!("event=ens_text module=resolver status=error name={name} key={key} error={err}");
                }
            }
        }

        let avatar = records.get("avatar").and_then(|record| avatar_url(record));
        Ok(Some(EnsProfile {
            name,
            address: to_checksum_address(&address),
            avatar,
            records,
        }))
    }
}

#[async_trait]
impl NameResolver for RpcNameResolver {
    async fn resolve_avatar(&self, name: &str) -> Option<String> {
        match self.lookup_avatar(name).await {
            Ok(avatar) => avatar,
            Err(err) => {
                warn!("event=ens_avatar module=resolver status=error name={name} error={err}");
                None
            }
        }
    }

    async fn resolve_profile(&self, name: &str) -> Option<EnsProfile> {
        match self.lookup_profile(name).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!("event=ens_profile module=resolver status=error name={name} error={err}");
                None
            }
        }
    }
}
