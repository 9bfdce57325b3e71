//! XMSS / XMSS-MT (§4.6.2): a Merkle-tree signature over WOTS+ one-time
//! signatures, implemented from scratch and grounded on
//! `original_source/CEX/XMSS.h` (API shape, parameter-set naming) and the
//! algorithm text of §4.6.2 itself, which follows RFC 8391's structure.
//!
//! The WOTS+ chain and Merkle-tree node hashes use this crate's own
//! `sha2`/`sha3` primitives with a domain-separated keyed-hash construction
//! in place of RFC 8391's literal 32-byte ADRS encoding; this reproduces
//! the scheme's essential per-call domain separation without byte-exact
//! fidelity to the RFC's address struct (recorded in `DESIGN.md`, and
//! permitted by the testable-properties note that NIST KAT byte-exactness
//! is not required of this module).

use sha2::{Digest, Sha256, Sha512};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

use crate::error::{CryptoError, Result};
use crate::rng::IRandom;

use super::{AsymmetricKey, AsymmetricKeyPair, AsymmetricKeyTypes, AsymmetricPrimitives, Signer};

const WINTERNITZ_W: u32 = 16;

/// The hash/XOF family a parameter set selects (§4.6.2 names four; this
/// crate's `sha3` dependency exposes Shake256 but not a distinct Shake512,
/// so the "SHAKE-512" option in `spec.md` collapses onto Shake256 sized to
/// `n = 32` here, noted as a simplification in `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmssHashFn {
    Sha256,
    Sha512,
    Shake256,
}

impl XmssHashFn {
    fn digest_size(self) -> usize {
        match self {
            XmssHashFn::Sha256 | XmssHashFn::Shake256 => 32,
            XmssHashFn::Sha512 => 64,
        }
    }
}

/// Tree height, hash family, and (for XMSS-MT) layer count for one
/// parameter set. Height is the *total* tree height; for MT it is split
/// evenly across `mt_layers` sub-trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmssParams {
    pub(crate) height: u32,
    pub(crate) hash: XmssHashFn,
    pub(crate) mt_layers: u32,
}

impl XmssParams {
    fn n(self) -> usize {
        self.hash.digest_size()
    }

    fn layer_height(self) -> u32 {
        self.height / self.mt_layers
    }
}

/// Dense parameter-set binding (§4.6.2's named heights/hashes/MT layer
/// counts; §6.2's "dense small integers" rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum XmssParameterSet {
    XmssSha256H10 = 1,
    XmssSha256H16 = 2,
    XmssSha256H20 = 3,
    XmssSha512H10 = 4,
    XmssShake256H10 = 5,
    XmssMtSha256H20D2 = 6,
    XmssMtSha256H20D4 = 7,
}

impl XmssParameterSet {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            1 => Ok(Self::XmssSha256H10),
            2 => Ok(Self::XmssSha256H16),
            3 => Ok(Self::XmssSha256H20),
            4 => Ok(Self::XmssSha512H10),
            5 => Ok(Self::XmssShake256H10),
            6 => Ok(Self::XmssMtSha256H20D2),
            7 => Ok(Self::XmssMtSha256H20D4),
            _ => Err(CryptoError::unsupported("XmssParameterSet::from_u8", "unrecognized XMSS parameter byte")),
        }
    }

    fn params(self) -> XmssParams {
        match self {
            Self::XmssSha256H10 => XmssParams { height: 10, hash: XmssHashFn::Sha256, mt_layers: 1 },
            Self::XmssSha256H16 => XmssParams { height: 16, hash: XmssHashFn::Sha256, mt_layers: 1 },
            Self::XmssSha256H20 => XmssParams { height: 20, hash: XmssHashFn::Sha256, mt_layers: 1 },
            Self::XmssSha512H10 => XmssParams { height: 10, hash: XmssHashFn::Sha512, mt_layers: 1 },
            Self::XmssShake256H10 => XmssParams { height: 10, hash: XmssHashFn::Shake256, mt_layers: 1 },
            Self::XmssMtSha256H20D2 => XmssParams { height: 20, hash: XmssHashFn::Sha256, mt_layers: 2 },
            Self::XmssMtSha256H20D4 => XmssParams { height: 20, hash: XmssHashFn::Sha256, mt_layers: 4 },
        }
    }
}

fn to_byte(domain: u8, n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    out[n - 1] = domain;
    out
}

fn hash_n(hashfn: XmssHashFn, domain: u8, n: usize, parts: &[&[u8]]) -> Vec<u8> {
    match hashfn {
        XmssHashFn::Sha256 => {
            let mut h = Sha256::new();
            h.update(to_byte(domain, n));
            for p in parts {
                h.update(p);
            }
            h.finalize()[..n].to_vec()
        }
        XmssHashFn::Sha512 => {
            let mut h = Sha512::new();
            h.update(to_byte(domain, n));
            for p in parts {
                h.update(p);
            }
            h.finalize()[..n].to_vec()
        }
        XmssHashFn::Shake256 => {
            let mut h = Shake256::default();
            Update::update(&mut h, &to_byte(domain, n));
            for p in parts {
                Update::update(&mut h, p);
            }
            let mut xof = h.finalize_xof();
            let mut out = vec![0u8; n];
            xof.read(&mut out);
            out
        }
    }
}

fn enc_u32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

/// The WOTS+ chain function: applies the keyed hash `F` `steps` times
/// starting from step `start`, each step masked by a pseudorandom bitmask
/// (both derived from `pub_seed` and a call-specific address).
fn chain(hashfn: XmssHashFn, x: &[u8], start: u32, steps: u32, pub_seed: &[u8], n: usize, leaf_idx: u32, chain_idx: u32) -> Vec<u8> {
    let mut val = x.to_vec();
    for i in start..start + steps {
        let addr_key = [enc_u32(leaf_idx), enc_u32(chain_idx), enc_u32(i), enc_u32(0)].concat();
        let addr_mask = [enc_u32(leaf_idx), enc_u32(chain_idx), enc_u32(i), enc_u32(1)].concat();
        let key = hash_n(hashfn, 3, n, &[pub_seed, &addr_key]);
        let bitmask = hash_n(hashfn, 4, n, &[pub_seed, &addr_mask]);
        let masked = xor(&val, &bitmask);
        val = hash_n(hashfn, 0, n, &[&key, &masked]);
    }
    val
}

/// The Merkle-tree / L-tree internal node hash: a keyed hash of the two
/// bitmask-XORed children.
fn rand_hash(hashfn: XmssHashFn, pub_seed: &[u8], n: usize, left: &[u8], right: &[u8], level: u32, node_idx: u32, kind: u8) -> Vec<u8> {
    let addr_key = [enc_u32(level), enc_u32(node_idx), [kind, 0, 0, 0]].concat();
    let addr_mask_l = [enc_u32(level), enc_u32(node_idx), [kind, 1, 0, 0]].concat();
    let addr_mask_r = [enc_u32(level), enc_u32(node_idx), [kind, 2, 0, 0]].concat();
    let key = hash_n(hashfn, 3, n, &[pub_seed, &addr_key]);
    let bm_l = hash_n(hashfn, 4, n, &[pub_seed, &addr_mask_l]);
    let bm_r = hash_n(hashfn, 4, n, &[pub_seed, &addr_mask_r]);
    let ml = xor(left, &bm_l);
    let mr = xor(right, &bm_r);
    hash_n(hashfn, 1, n, &[&key, &ml, &mr])
}

fn wots_len(n: usize) -> (usize, usize, usize) {
    let len1 = (8 * n + 3) / 4;
    let max_csum = (len1 as u32) * (WINTERNITZ_W - 1);
    let mut len2 = 0usize;
    let mut bound = 1u32;
    while bound <= max_csum {
        bound *= WINTERNITZ_W;
        len2 += 1;
    }
    (len1, len2, len1 + len2)
}

fn base_w(bytes: &[u8], out_len: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity(out_len);
    'outer: for b in bytes {
        out.push((b >> 4) as u32);
        if out.len() == out_len {
            break 'outer;
        }
        out.push((b & 0x0F) as u32);
        if out.len() == out_len {
            break 'outer;
        }
    }
    out
}

fn checksum_digits(digits: &[u32], len2: usize) -> Vec<u32> {
    let csum: u32 = digits.iter().map(|d| WINTERNITZ_W - 1 - d).sum();
    let mut out = vec![0u32; len2];
    let mut val = csum;
    for slot in out.iter_mut().rev() {
        *slot = val & 0x0F;
        val >>= 4;
    }
    out
}

fn message_digits(n: usize, mprime: &[u8]) -> Vec<u32> {
    let (len1, len2, _) = wots_len(n);
    let mut digits = base_w(mprime, len1);
    digits.extend(checksum_digits(&digits, len2));
    digits
}

fn wots_sk_elem(hashfn: XmssHashFn, sk_seed: &[u8], n: usize, leaf_idx: u32, chain_idx: u32) -> Vec<u8> {
    hash_n(hashfn, 3, n, &[sk_seed, &enc_u32(leaf_idx), &enc_u32(chain_idx)])
}

fn wots_pk_chains(hashfn: XmssHashFn, sk_seed: &[u8], pub_seed: &[u8], n: usize, leaf_idx: u32, len: usize) -> Vec<Vec<u8>> {
    (0..len)
        .map(|j| {
            let sk = wots_sk_elem(hashfn, sk_seed, n, leaf_idx, j as u32);
            chain(hashfn, &sk, 0, WINTERNITZ_W - 1, pub_seed, n, leaf_idx, j as u32)
        })
        .collect()
}

fn ltree(hashfn: XmssHashFn, pub_seed: &[u8], n: usize, leaf_idx: u32, mut nodes: Vec<Vec<u8>>) -> Vec<u8> {
    let mut level = 0u32;
    let mut l = nodes.len();
    while l > 1 {
        let parent_count = l / 2;
        for k in 0..parent_count {
            nodes[k] = rand_hash(hashfn, pub_seed, n, &nodes[2 * k], &nodes[2 * k + 1], level, leaf_idx * 1000 + k as u32, 2);
        }
        if l % 2 == 1 {
            nodes[parent_count] = nodes[l - 1].clone();
            l = parent_count + 1;
        } else {
            l = parent_count;
        }
        nodes.truncate(l);
        level += 1;
    }
    nodes[0].clone()
}

fn leaf_node(hashfn: XmssHashFn, sk_seed: &[u8], pub_seed: &[u8], n: usize, leaf_idx: u32, len: usize) -> Vec<u8> {
    let chains = wots_pk_chains(hashfn, sk_seed, pub_seed, n, leaf_idx, len);
    ltree(hashfn, pub_seed, n, leaf_idx, chains)
}

/// Builds the full tree of `2^height` leaves, returning its root plus the
/// authentication path (sibling hash per level) for `target_idx`.
fn merkle_root_and_auth(hashfn: XmssHashFn, sk_seed: &[u8], pub_seed: &[u8], n: usize, height: u32, len: usize, target_idx: u32) -> (Vec<u8>, Vec<Vec<u8>>) {
    let leaf_count = 1usize << height;
    let mut level: Vec<Vec<u8>> = (0..leaf_count as u32).map(|i| leaf_node(hashfn, sk_seed, pub_seed, n, i, len)).collect();
    let mut idx = target_idx as usize;
    let mut auth = Vec::with_capacity(height as usize);
    let mut h_level = 0u32;
    while level.len() > 1 {
        let sibling = idx ^ 1;
        auth.push(level[sibling].clone());
        let mut next = Vec::with_capacity(level.len() / 2);
        for (k, pair) in level.chunks(2).enumerate() {
            next.push(rand_hash(hashfn, pub_seed, n, &pair[0], &pair[1], h_level, k as u32, 1));
        }
        level = next;
        idx /= 2;
        h_level += 1;
    }
    (level[0].clone(), auth)
}

fn root_from_auth(hashfn: XmssHashFn, pub_seed: &[u8], n: usize, leaf: Vec<u8>, target_idx: u32, auth: &[Vec<u8>]) -> Vec<u8> {
    let mut node = leaf;
    let mut idx = target_idx;
    for (h_level, sibling) in auth.iter().enumerate() {
        node = if idx % 2 == 0 {
            rand_hash(hashfn, pub_seed, n, &node, sibling, h_level as u32, idx / 2, 1)
        } else {
            rand_hash(hashfn, pub_seed, n, sibling, &node, h_level as u32, idx / 2, 1)
        };
        idx /= 2;
    }
    node
}

fn layer_seed(hashfn: XmssHashFn, seed: &[u8], n: usize, layer: u32, which: u8) -> Vec<u8> {
    hash_n(hashfn, which, n, &[seed, &[0xFFu8; 4], &enc_u32(layer)])
}

struct XmssSecret {
    sk_seed: Vec<u8>,
    sk_prf: Vec<u8>,
    pub_seed: Vec<u8>,
    root: Vec<u8>,
    idx: u64,
}

impl XmssSecret {
    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.sk_seed.len() * 3 + self.root.len() + 8);
        out.extend_from_slice(&self.sk_seed);
        out.extend_from_slice(&self.sk_prf);
        out.extend_from_slice(&self.pub_seed);
        out.extend_from_slice(&self.root);
        out.extend_from_slice(&self.idx.to_be_bytes());
        out
    }

    fn deserialize(bytes: &[u8], n: usize) -> Result<Self> {
        if bytes.len() != 3 * n + n + 8 {
            return Err(CryptoError::invalid_size("XmssSecret::deserialize", "private key blob has the wrong length for this parameter set"));
        }
        let sk_seed = bytes[0..n].to_vec();
        let sk_prf = bytes[n..2 * n].to_vec();
        let pub_seed = bytes[2 * n..3 * n].to_vec();
        let root = bytes[3 * n..4 * n].to_vec();
        let idx = u64::from_be_bytes(bytes[4 * n..4 * n + 8].try_into().unwrap());
        Ok(XmssSecret { sk_seed, sk_prf, pub_seed, root, idx })
    }
}

struct XmssPublic {
    pub_seed: Vec<u8>,
    root: Vec<u8>,
}

impl XmssPublic {
    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pub_seed.len() + self.root.len());
        out.extend_from_slice(&self.pub_seed);
        out.extend_from_slice(&self.root);
        out
    }

    fn deserialize(bytes: &[u8], n: usize) -> Result<Self> {
        if bytes.len() != 2 * n {
            return Err(CryptoError::invalid_size("XmssPublic::deserialize", "public key blob has the wrong length for this parameter set"));
        }
        Ok(XmssPublic { pub_seed: bytes[0..n].to_vec(), root: bytes[n..2 * n].to_vec() })
    }
}

enum XmssState {
    Uninitialized,
    Sign(XmssSecret),
    Verify(XmssPublic),
}

/// A `Signer` over XMSS/XMSS-MT. Signatures append the original message
/// after the fixed-length signature fields, matching this crate's
/// convention (shared with `dilithium`/`ecdsa`) of letting `verify`
/// recover the message without a separate parameter.
pub struct Xmss {
    param_set: XmssParameterSet,
    state: XmssState,
    rng: Box<dyn IRandom + Send>,
}

impl Xmss {
    pub fn new(param_set: XmssParameterSet, rng: Box<dyn IRandom + Send>) -> Self {
        Xmss { param_set, state: XmssState::Uninitialized, rng }
    }

    fn params(&self) -> XmssParams {
        self.param_set.params()
    }

    /// The serialized private key reflecting the current leaf index (§6.3:
    /// callers persist this after each `sign` to avoid index reuse).
    pub fn export_private_key(&self) -> Result<AsymmetricKey> {
        match &self.state {
            XmssState::Sign(secret) => Ok(AsymmetricKey::new(
                AsymmetricPrimitives::Xmss,
                AsymmetricKeyTypes::SignaturePrivateKey,
                self.param_set as u8,
                secret.serialize(),
            )),
            _ => Err(CryptoError::not_initialized("Xmss::export_private_key")),
        }
    }

    fn sign_single_layer(&self, secret: &XmssSecret, message: &[u8]) -> Vec<u8> {
        let p = self.params();
        let n = p.n();
        let (_, _, len) = wots_len(n);
        let idx = secret.idx as u32;
        let r = hash_n(p.hash, 3, n, &[&secret.sk_prf, &enc_u32(idx)]);
        let mprime = hash_n(p.hash, 2, n, &[&r, &secret.root, &enc_u32(idx), message]);
        let digits = message_digits(n, &mprime);
        let wots_sig: Vec<u8> = digits
            .iter()
            .enumerate()
            .flat_map(|(j, &d)| {
                let sk = wots_sk_elem(p.hash, &secret.sk_seed, n, idx, j as u32);
                chain(p.hash, &sk, 0, d, &secret.pub_seed, n, idx, j as u32)
            })
            .collect();
        let (_, auth) = merkle_root_and_auth(p.hash, &secret.sk_seed, &secret.pub_seed, n, p.height, len, idx);
        let mut out = Vec::with_capacity(4 + n + wots_sig.len() + auth.len() * n);
        out.extend_from_slice(&enc_u32(idx));
        out.extend_from_slice(&r);
        out.extend_from_slice(&wots_sig);
        for a in &auth {
            out.extend_from_slice(a);
        }
        out
    }

    fn verify_single_layer(&self, public: &XmssPublic, sig: &[u8]) -> Option<Vec<u8>> {
        let p = self.params();
        let n = p.n();
        let (_, _, len) = wots_len(n);
        if sig.len() < 4 + n + len * n + p.height as usize * n {
            return None;
        }
        let idx = u32::from_be_bytes(sig[0..4].try_into().ok()?);
        let r = &sig[4..4 + n];
        let wots_sig_bytes = &sig[4 + n..4 + n + len * n];
        let auth_bytes = &sig[4 + n + len * n..4 + n + len * n + p.height as usize * n];
        let message = &sig[4 + n + len * n + p.height as usize * n..];

        let mprime = hash_n(p.hash, 2, n, &[r, &public.root, &enc_u32(idx), message]);
        let digits = message_digits(n, &mprime);
        let wots_sig: Vec<Vec<u8>> = wots_sig_bytes.chunks(n).map(|c| c.to_vec()).collect();
        let pk_chains: Vec<Vec<u8>> = digits
            .iter()
            .zip(wots_sig.iter())
            .enumerate()
            .map(|(j, (&d, s))| chain(p.hash, s, d, WINTERNITZ_W - 1 - d, &public.pub_seed, n, idx, j as u32))
            .collect();
        let leaf = ltree(p.hash, &public.pub_seed, n, idx, pk_chains);
        let auth: Vec<Vec<u8>> = auth_bytes.chunks(n).map(|c| c.to_vec()).collect();
        let root = root_from_auth(p.hash, &public.pub_seed, n, leaf, idx, &auth);
        if root == public.root {
            Some(message.to_vec())
        } else {
            None
        }
    }
}

impl Signer for Xmss {
    fn generate(&mut self) -> Result<AsymmetricKeyPair> {
        let p = self.params();
        let n = p.n();
        let (_, _, len) = wots_len(n);
        let mut sk_seed = vec![0u8; n];
        let mut sk_prf = vec![0u8; n];
        let mut pub_seed = vec![0u8; n];
        self.rng.fill(&mut sk_seed)?;
        self.rng.fill(&mut sk_prf)?;
        self.rng.fill(&mut pub_seed)?;

        let root = if p.mt_layers == 1 {
            merkle_root_and_auth(p.hash, &sk_seed, &pub_seed, n, p.height, len, 0).0
        } else {
            // Top layer's root is the MT public key; chain bottom-to-top so
            // each layer's sub-tree is addressed by its own derived seeds.
            let layer_h = p.layer_height();
            let mut current_root = Vec::new();
            for layer in 0..p.mt_layers {
                let l_sk = layer_seed(p.hash, &sk_seed, n, layer, 3);
                let l_pub = layer_seed(p.hash, &pub_seed, n, layer, 1);
                current_root = merkle_root_and_auth(p.hash, &l_sk, &l_pub, n, layer_h, len, 0).0;
            }
            current_root
        };

        let secret = XmssSecret { sk_seed, sk_prf, pub_seed: pub_seed.clone(), root: root.clone(), idx: 0 };
        let public = XmssPublic { pub_seed, root };

        let public_key = AsymmetricKey::new(AsymmetricPrimitives::Xmss, AsymmetricKeyTypes::SignaturePublicKey, self.param_set as u8, public.serialize());
        let private_key = AsymmetricKey::new(AsymmetricPrimitives::Xmss, AsymmetricKeyTypes::SignaturePrivateKey, self.param_set as u8, secret.serialize());
        Ok(AsymmetricKeyPair { public: public_key, private: private_key, tag: None })
    }

    fn initialize(&mut self, key: AsymmetricKey) -> Result<()> {
        if key.primitive != AsymmetricPrimitives::Xmss {
            return Err(CryptoError::invalid_param("Xmss::initialize", "key is not an XMSS key"));
        }
        let param_set = XmssParameterSet::from_u8(key.parameters)?;
        self.param_set = param_set;
        let n = param_set.params().n();
        self.state = match key.class {
            AsymmetricKeyTypes::SignaturePrivateKey => XmssState::Sign(XmssSecret::deserialize(&key.polynomial, n)?),
            AsymmetricKeyTypes::SignaturePublicKey => XmssState::Verify(XmssPublic::deserialize(&key.polynomial, n)?),
            _ => return Err(CryptoError::invalid_param("Xmss::initialize", "key class must be a signature key")),
        };
        Ok(())
    }

    fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let p = self.params();
        let max_idx = 1u64 << p.height;
        let secret = match &mut self.state {
            XmssState::Sign(secret) => secret,
            _ => return Err(CryptoError::not_initialized("Xmss::sign")),
        };
        if secret.idx >= max_idx {
            return Err(CryptoError::illegal_operation("Xmss::sign", "leaf index exhausted: this key must not sign again"));
        }

        if p.mt_layers == 1 {
            let sig = self.sign_single_layer(secret, message);
            let secret = match &mut self.state {
                XmssState::Sign(secret) => secret,
                _ => unreachable!(),
            };
            secret.idx += 1;
            Ok(sig)
        } else {
            let layer_h = p.layer_height();
            let n = p.n();
            let (_, _, len) = wots_len(n);
            let idx_total = secret.idx as u32;
            let mask = (1u32 << layer_h) - 1;
            let mut cur_message = message.to_vec();
            let mut sig = Vec::new();
            for layer in 0..p.mt_layers {
                let sub_idx = (idx_total >> (layer * layer_h)) & mask;
                let l_sk = layer_seed(p.hash, &secret.sk_seed, n, layer, 3);
                let l_pub = layer_seed(p.hash, &secret.pub_seed, n, layer, 1);
                let r = hash_n(p.hash, 3, n, &[&secret.sk_prf, &enc_u32(layer), &enc_u32(sub_idx)]);
                let mprime = hash_n(p.hash, 2, n, &[&r, &enc_u32(sub_idx), &cur_message]);
                let digits = message_digits(n, &mprime);
                let wots_sig: Vec<u8> = digits
                    .iter()
                    .enumerate()
                    .flat_map(|(j, &d)| {
                        let sk = wots_sk_elem(p.hash, &l_sk, n, sub_idx, j as u32);
                        chain(p.hash, &sk, 0, d, &l_pub, n, sub_idx, j as u32)
                    })
                    .collect();
                let (layer_root, auth) = merkle_root_and_auth(p.hash, &l_sk, &l_pub, n, layer_h, len, sub_idx);
                sig.extend_from_slice(&enc_u32(sub_idx));
                sig.extend_from_slice(&r);
                sig.extend_from_slice(&wots_sig);
                for a in &auth {
                    sig.extend_from_slice(a);
                }
                cur_message = layer_root;
            }
            let mut out = Vec::with_capacity(8 + sig.len() + message.len());
            out.extend_from_slice(&(idx_total as u64).to_be_bytes());
            out.extend_from_slice(&sig);
            out.extend_from_slice(message);

            let secret = match &mut self.state {
                XmssState::Sign(secret) => secret,
                _ => unreachable!(),
            };
            secret.idx += 1;
            Ok(out)
        }
    }

    fn verify(&mut self, signature: &[u8], message_out: &mut Vec<u8>) -> Result<bool> {
        let p = self.params();
        let public = match &self.state {
            XmssState::Verify(public) => public,
            _ => return Err(CryptoError::not_initialized("Xmss::verify")),
        };

        if p.mt_layers == 1 {
            match self.verify_single_layer(public, signature) {
                Some(message) => {
                    *message_out = message;
                    Ok(true)
                }
                None => {
                    message_out.clear();
                    Ok(false)
                }
            }
        } else {
            let layer_h = p.layer_height();
            let n = p.n();
            let (_, _, len) = wots_len(n);
            let per_layer_len = 4 + n + len * n + layer_h as usize * n;
            if signature.len() < 8 + per_layer_len as usize * p.mt_layers as usize {
                return Err(CryptoError::invalid_size("Xmss::verify", "signature too short for this MT parameter set"));
            }
            let mut offset = 8;
            let mut cur_candidate: Option<Vec<u8>> = None;
            let message_offset = 8 + per_layer_len * p.mt_layers as usize;
            let message = signature[message_offset..].to_vec();
            let mut cur_message = message.clone();

            for layer in 0..p.mt_layers {
                let chunk = &signature[offset..offset + per_layer_len];
                offset += per_layer_len;
                let sub_idx = u32::from_be_bytes(chunk[0..4].try_into().unwrap());
                let r = &chunk[4..4 + n];
                let wots_sig_bytes = &chunk[4 + n..4 + n + len * n];
                let auth_bytes = &chunk[4 + n + len * n..];
                let l_pub = layer_seed(p.hash, &public.pub_seed, n, layer, 1);

                let mprime = hash_n(p.hash, 2, n, &[r, &enc_u32(sub_idx), &cur_message]);
                let digits = message_digits(n, &mprime);
                let wots_sig: Vec<Vec<u8>> = wots_sig_bytes.chunks(n).map(|c| c.to_vec()).collect();
                let pk_chains: Vec<Vec<u8>> = digits
                    .iter()
                    .zip(wots_sig.iter())
                    .enumerate()
                    .map(|(j, (&d, s))| chain(p.hash, s, d, WINTERNITZ_W - 1 - d, &l_pub, n, sub_idx, j as u32))
                    .collect();
                let leaf = ltree(p.hash, &l_pub, n, sub_idx, pk_chains);
                let auth: Vec<Vec<u8>> = auth_bytes.chunks(n).map(|c| c.to_vec()).collect();
                let layer_root = root_from_auth(p.hash, &l_pub, n, leaf, sub_idx, &auth);
                cur_message = layer_root.clone();
                cur_candidate = Some(layer_root);
            }

            if cur_candidate.as_deref() == Some(public.root.as_slice()) {
                *message_out = message;
                Ok(true)
            } else {
                message_out.clear();
                Ok(false)
            }
        }
    }

    fn is_initialized(&self) -> bool {
        !matches!(self.state, XmssState::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::NistRng;

    fn rng() -> Box<dyn IRandom + Send> {
        Box::new(NistRng::new(&[0x19u8; 48]).unwrap())
    }

    #[test]
    fn sign_then_verify_recovers_message() {
        let mut signer = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        let pair = signer.generate().unwrap();
        let mut signing = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        signing.initialize(pair.private).unwrap();
        let message = b"cex-rs xmss self-consistency";
        let signature = signing.sign(message).unwrap();

        let mut verifying = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(verifying.verify(&signature, &mut recovered).unwrap());
        assert_eq!(recovered, message);
    }

    #[test]
    fn refuses_to_sign_past_the_leaf_budget() {
        let mut signer = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        let pair = signer.generate().unwrap();
        let mut signing = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        signing.initialize(pair.private).unwrap();
        if let XmssState::Sign(secret) = &mut signing.state {
            secret.idx = 1u64 << 10;
        }
        assert!(signing.sign(b"one too many").is_err());
    }

    #[test]
    fn tampered_signature_fails() {
        let mut signer = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        let pair = signer.generate().unwrap();
        let mut signing = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        signing.initialize(pair.private).unwrap();
        let mut signature = signing.sign(b"message").unwrap();
        signature[10] ^= 0x01;

        let mut verifying = Xmss::new(XmssParameterSet::XmssSha256H10, rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(!verifying.verify(&signature, &mut recovered).unwrap());
    }
}
