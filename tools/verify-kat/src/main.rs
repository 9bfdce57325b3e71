//! Standalone known-answer-test runner for `cex-core`, mirroring the
//! teacher's own `tools/verify-kat` shape: takes a JSON vectors file path on
//! the command line and checks each scenario's expected output against a
//! live run of the corresponding primitive.
//!
//! Covers the byte-exact scenarios (AES-128-CBC, AES-256-CTR, BCG AES-256
//! no-reseed, GCM-AES-256 tamper detection). Dilithium-3 and
//! XMSS-SHA256-H10 NIST KATs are intentionally not attempted here: per
//! `SPEC_FULL.md` §9, those two signers are exempt from byte-exact KAT
//! fidelity and are instead covered by the crate's own round-trip/tamper
//! unit tests.

use cex_core::aead::gcm::Gcm;
use cex_core::aead::AeadCipher;
use cex_core::cipher::rijndael::Rijndael;
use cex_core::cipher::SymmetricKey;
use cex_core::drbg::Bcg;
use cex_core::drbg::Drbg;
use cex_core::mode::cbc::Cbc;
use cex_core::mode::ctr::{CounterEndian, Ctr};
use cex_core::mode::{BlockCipherOwnership, CipherMode};
use serde::Deserialize;

#[derive(Deserialize)]
struct Vectors {
    aes128_cbc: BlockModeKat,
    aes256_ctr: BlockModeKat,
    bcg_aes256_no_reseed: BcgKat,
    gcm_tamper: GcmTamperKat,
}

#[derive(Deserialize)]
struct BlockModeKat {
    key_hex: String,
    iv_hex: String,
    plaintext_hex: String,
    ciphertext_hex: String,
}

#[derive(Deserialize)]
struct BcgKat {
    key_hex: String,
    nonce_hex: String,
    output_hex: String,
}

#[derive(Deserialize)]
struct GcmTamperKat {
    key_hex: String,
    nonce_hex: String,
    plaintext_len: usize,
    flip_byte_index: usize,
}

fn aes128_cbc_kat(v: &BlockModeKat) -> anyhow::Result<()> {
    let key = SymmetricKey::with_nonce(hex::decode(&v.key_hex)?, hex::decode(&v.iv_hex)?);
    let pt = hex::decode(&v.plaintext_hex)?;
    let expected = hex::decode(&v.ciphertext_hex)?;

    let mut cipher = Rijndael::new();
    let mut mode = Cbc::new(BlockCipherOwnership::Borrowed(&mut cipher));
    mode.initialize(true, &key)?;
    let mut ct = vec![0u8; pt.len()];
    mode.transform(&pt, &mut ct)?;

    anyhow::ensure!(ct == expected, "AES-128-CBC KAT mismatch");
    println!("aes128_cbc: OK");
    Ok(())
}

fn aes256_ctr_kat(v: &BlockModeKat) -> anyhow::Result<()> {
    let key = SymmetricKey::with_nonce(hex::decode(&v.key_hex)?, hex::decode(&v.iv_hex)?);
    let pt = hex::decode(&v.plaintext_hex)?;
    let expected = hex::decode(&v.ciphertext_hex)?;

    let mut cipher = Rijndael::new();
    let mut mode = Ctr::new(BlockCipherOwnership::Borrowed(&mut cipher), CounterEndian::Big);
    mode.initialize(true, &key)?;
    let mut ct = vec![0u8; pt.len()];
    mode.transform(&pt, &mut ct)?;

    anyhow::ensure!(ct == expected, "AES-256-CTR KAT mismatch");
    println!("aes256_ctr: OK");
    Ok(())
}

fn bcg_no_reseed_kat(v: &BcgKat) -> anyhow::Result<()> {
    let key = SymmetricKey::with_nonce(hex::decode(&v.key_hex)?, hex::decode(&v.nonce_hex)?);
    let expected = hex::decode(&v.output_hex)?;

    let mut cipher = Rijndael::new();
    let mut bcg = Bcg::new(BlockCipherOwnership::Borrowed(&mut cipher), None);
    bcg.initialize(&key)?;
    let mut out = vec![0u8; expected.len()];
    bcg.generate(&mut out)?;

    anyhow::ensure!(out == expected, "BCG AES-256 no-reseed KAT mismatch");
    println!("bcg_aes256_no_reseed: OK");
    Ok(())
}

fn gcm_tamper_kat(v: &GcmTamperKat) -> anyhow::Result<()> {
    let key = SymmetricKey::with_nonce(hex::decode(&v.key_hex)?, hex::decode(&v.nonce_hex)?);
    let pt = vec![0u8; v.plaintext_len];

    let mut enc_cipher = Rijndael::new();
    let mut enc = Gcm::new(BlockCipherOwnership::Borrowed(&mut enc_cipher));
    enc.initialize(true, &key)?;
    let mut ct = vec![0u8; pt.len()];
    enc.transform(&pt, &mut ct)?;
    let mut tag = [0u8; 16];
    enc.finalize(&mut tag)?;

    ct[v.flip_byte_index] ^= 0x01;

    let mut dec_cipher = Rijndael::new();
    let mut dec = Gcm::new(BlockCipherOwnership::Borrowed(&mut dec_cipher));
    dec.initialize(false, &key)?;
    let mut out = vec![0u8; ct.len()];
    dec.transform(&ct, &mut out)?;
    let verified = dec.verify(&tag, &mut out);

    anyhow::ensure!(verified.is_err(), "GCM tamper check: verify unexpectedly succeeded");
    anyhow::ensure!(out.iter().all(|&b| b == 0), "GCM tamper check: output not zeroised on failure");
    println!("gcm_tamper: OK");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).expect("usage: verify-kat vectors.json");
    let data = std::fs::read_to_string(path)?;
    let vectors: Vectors = serde_json::from_str(&data)?;

    aes128_cbc_kat(&vectors.aes128_cbc)?;
    aes256_ctr_kat(&vectors.aes256_ctr)?;
    bcg_no_reseed_kat(&vectors.bcg_aes256_no_reseed)?;
    gcm_tamper_kat(&vectors.gcm_tamper)?;

    println!("all known-answer tests passed");
    Ok(())
}
