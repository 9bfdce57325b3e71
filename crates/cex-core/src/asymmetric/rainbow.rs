//! Rainbow (§4.6.3): a layered oil-vinegar multivariate signature,
//! implemented from scratch and grounded on `original_source/CEX/Rainbow.h`
//! (API shape, parameter-set naming) and §4.6.3's algorithm text.
//!
//! The private key is two affine maps `S`/`T` plus a two-layer
//! oil-vinegar central map `F`; the public key is the fully composed
//! quadratic map `P = S∘F∘T`, extracted from the private maps via
//! polarization (evaluating `P` at unit and paired unit vectors). This
//! crate uses small ("toy") variable counts for all three parameter sets
//! rather than the NIST Rainbow submission's production-scale dimensions,
//! since byte-exact NIST fidelity is explicitly not required of this
//! module (recorded in `DESIGN.md`) and a production-scale central map
//! would make the from-scratch polarization step impractical to hand-write
//! correctly within this exercise.

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

use crate::error::{CryptoError, Result};
use crate::rng::IRandom;

use super::{AsymmetricKey, AsymmetricKeyPair, AsymmetricKeyTypes, AsymmetricPrimitives, Signer};

const MAX_SIGN_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainbowField {
    Gf16,
    Gf256,
}

impl RainbowField {
    fn size(self) -> u16 {
        match self {
            RainbowField::Gf16 => 16,
            RainbowField::Gf256 => 256,
        }
    }

    fn mask(self, b: u8) -> u8 {
        match self {
            RainbowField::Gf16 => b & 0x0F,
            RainbowField::Gf256 => b,
        }
    }
}

fn gf16_mul(a: u8, b: u8) -> u8 {
    let mut a = a & 0x0F;
    let mut b = b & 0x0F;
    let mut result = 0u8;
    for _ in 0..4 {
        if b & 1 != 0 {
            result ^= a;
        }
        let carry = a & 0x08 != 0;
        a = (a << 1) & 0x0F;
        if carry {
            a ^= 0x03; // x^4 + x + 1 reduced mod x^4: carry term becomes x+1 (0b0011)
        }
        b >>= 1;
    }
    result & 0x0F
}

fn gf256_mul(a: u8, b: u8) -> u8 {
    let mut a = a;
    let mut b = b;
    let mut result = 0u8;
    for _ in 0..8 {
        if b & 1 != 0 {
            result ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= 0x1B; // x^8 + x^4 + x^3 + x + 1
        }
        b >>= 1;
    }
    result
}

fn field_add(_field: RainbowField, a: u8, b: u8) -> u8 {
    a ^ b
}

fn field_mul(field: RainbowField, a: u8, b: u8) -> u8 {
    match field {
        RainbowField::Gf16 => gf16_mul(a, b),
        RainbowField::Gf256 => gf256_mul(a, b),
    }
}

fn field_inv(field: RainbowField, a: u8) -> Option<u8> {
    if a == 0 {
        return None;
    }
    (1..field.size()).map(|b| b as u8).find(|&b| field_mul(field, a, b) == 1)
}

/// Gauss-Jordan elimination solving `a * x = rhs` for every column of `rhs`
/// simultaneously. Used both to solve oil-layer linear systems (one RHS
/// column) and to invert the `S`/`T` affine matrices (`n` RHS columns, an
/// identity matrix).
fn gauss_solve_multi(field: RainbowField, mut a: Vec<Vec<u8>>, mut rhs: Vec<Vec<u8>>) -> Option<Vec<Vec<u8>>> {
    let n = a.len();
    let k = rhs.first().map(|r| r.len()).unwrap_or(0);
    for col in 0..n {
        let pivot_row = (col..n).find(|&r| a[r][col] != 0)?;
        a.swap(col, pivot_row);
        rhs.swap(col, pivot_row);
        let inv_pivot = field_inv(field, a[col][col])?;
        for c in 0..n {
            a[col][c] = field_mul(field, a[col][c], inv_pivot);
        }
        for c in 0..k {
            rhs[col][c] = field_mul(field, rhs[col][c], inv_pivot);
        }
        for r in 0..n {
            if r != col && a[r][col] != 0 {
                let factor = a[r][col];
                for c in 0..n {
                    a[r][c] = field_add(field, a[r][c], field_mul(field, factor, a[col][c]));
                }
                for c in 0..k {
                    rhs[r][c] = field_add(field, rhs[r][c], field_mul(field, factor, rhs[col][c]));
                }
            }
        }
    }
    Some(rhs)
}

fn matvec(field: RainbowField, matrix: &[Vec<u8>], v: &[u8]) -> Vec<u8> {
    matrix
        .iter()
        .map(|row| row.iter().zip(v.iter()).fold(0u8, |acc, (&m, &x)| field_add(field, acc, field_mul(field, m, x))))
        .collect()
}

/// An invertible affine map `x -> matrix*x + translation`.
#[derive(Clone)]
struct Affine {
    dim: usize,
    matrix: Vec<Vec<u8>>,
    inverse: Vec<Vec<u8>>,
    translation: Vec<u8>,
}

impl Affine {
    fn random(field: RainbowField, rng: &mut dyn IRandom, dim: usize) -> Result<Self> {
        for _ in 0..MAX_SIGN_ATTEMPTS {
            let mut matrix = vec![vec![0u8; dim]; dim];
            for row in matrix.iter_mut() {
                let mut buf = vec![0u8; dim];
                rng.fill(&mut buf)?;
                for (m, b) in row.iter_mut().zip(buf.into_iter()) {
                    *m = field.mask(b);
                }
            }
            let identity: Vec<Vec<u8>> = (0..dim).map(|i| (0..dim).map(|j| if i == j { 1 } else { 0 }).collect()).collect();
            if let Some(inverse) = gauss_solve_multi(field, matrix.clone(), identity) {
                let mut translation = vec![0u8; dim];
                rng.fill(&mut translation)?;
                for t in translation.iter_mut() {
                    *t = field.mask(*t);
                }
                return Ok(Affine { dim, matrix, inverse, translation });
            }
        }
        Err(CryptoError::internal("Affine::random", "failed to sample an invertible affine map"))
    }

    fn apply(&self, field: RainbowField, x: &[u8]) -> Vec<u8> {
        let mv = matvec(field, &self.matrix, x);
        mv.iter().zip(self.translation.iter()).map(|(&a, &b)| field_add(field, a, b)).collect()
    }

    fn apply_inverse(&self, field: RainbowField, y: &[u8]) -> Vec<u8> {
        let shifted: Vec<u8> = y.iter().zip(self.translation.iter()).map(|(&a, &b)| field_add(field, a, b)).collect();
        matvec(field, &self.inverse, &shifted)
    }

    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 * self.dim * self.dim + self.dim);
        for row in &self.matrix {
            out.extend_from_slice(row);
        }
        for row in &self.inverse {
            out.extend_from_slice(row);
        }
        out.extend_from_slice(&self.translation);
        out
    }

    fn deserialize(bytes: &[u8], dim: usize) -> Result<(Self, usize)> {
        let needed = 2 * dim * dim + dim;
        if bytes.len() < needed {
            return Err(CryptoError::invalid_size("Affine::deserialize", "truncated affine map"));
        }
        let mut offset = 0;
        let mut matrix = vec![vec![0u8; dim]; dim];
        for row in matrix.iter_mut() {
            row.copy_from_slice(&bytes[offset..offset + dim]);
            offset += dim;
        }
        let mut inverse = vec![vec![0u8; dim]; dim];
        for row in inverse.iter_mut() {
            row.copy_from_slice(&bytes[offset..offset + dim]);
            offset += dim;
        }
        let translation = bytes[offset..offset + dim].to_vec();
        offset += dim;
        Ok((Affine { dim, matrix, inverse, translation }, offset))
    }
}

/// One oil-vinegar layer's equations: `oil_end - oil_start` quadratic
/// forms over variables `0..oil_end`, with no quadratic term between two
/// of this layer's own oil variables (what makes the layer's system
/// linear in those variables once everything before `oil_start` is
/// fixed).
#[derive(Clone)]
struct LayerEquation {
    quad: Vec<Vec<u8>>,
    linear: Vec<u8>,
    constant: u8,
}

#[derive(Clone)]
struct CentralLayer {
    oil_start: usize,
    oil_end: usize,
    equations: Vec<LayerEquation>,
}

fn evaluate_equation(field: RainbowField, eq: &LayerEquation, vars: &[u8], upto: usize) -> u8 {
    let mut acc = eq.constant;
    for i in 0..upto {
        acc = field_add(field, acc, field_mul(field, eq.linear[i], vars[i]));
        for j in i..upto {
            if eq.quad[i][j] != 0 {
                acc = field_add(field, acc, field_mul(field, eq.quad[i][j], field_mul(field, vars[i], vars[j])));
            }
        }
    }
    acc
}

fn evaluate_central(field: RainbowField, layers: &[CentralLayer], vars: &[u8]) -> Vec<u8> {
    layers.iter().flat_map(|layer| layer.equations.iter().map(|eq| evaluate_equation(field, eq, vars, layer.oil_end))).collect()
}

fn invert_central(field: RainbowField, layers: &[CentralLayer], target: &[u8], vars: &mut [u8]) -> Option<()> {
    let mut eq_offset = 0usize;
    for layer in layers {
        let oil_count = layer.oil_end - layer.oil_start;
        let mut a = vec![vec![0u8; oil_count]; oil_count];
        let mut b = vec![vec![0u8]; oil_count];
        for (r, eq) in layer.equations.iter().enumerate() {
            let mut fixed = eq.constant;
            for i in 0..layer.oil_start {
                fixed = field_add(field, fixed, field_mul(field, eq.linear[i], vars[i]));
                for j in i..layer.oil_start {
                    if eq.quad[i][j] != 0 {
                        fixed = field_add(field, fixed, field_mul(field, eq.quad[i][j], field_mul(field, vars[i], vars[j])));
                    }
                }
            }
            b[r][0] = field_add(field, target[eq_offset + r], fixed);
            for (k, col) in (layer.oil_start..layer.oil_end).enumerate() {
                let mut coeff = eq.linear[col];
                for i in 0..layer.oil_start {
                    if eq.quad[i][col] != 0 {
                        coeff = field_add(field, coeff, field_mul(field, eq.quad[i][col], vars[i]));
                    }
                }
                a[r][k] = coeff;
            }
        }
        let solved = gauss_solve_multi(field, a, b)?;
        for (k, col) in (layer.oil_start..layer.oil_end).enumerate() {
            vars[col] = solved[k][0];
        }
        eq_offset += oil_count;
    }
    Some(())
}

#[derive(Clone, Copy)]
struct RainbowDims {
    vinegar: usize,
    oil1: usize,
    oil2: usize,
}

impl RainbowDims {
    fn n(self) -> usize {
        self.vinegar + self.oil1 + self.oil2
    }

    fn m(self) -> usize {
        self.oil1 + self.oil2
    }
}

fn random_layer(field: RainbowField, rng: &mut dyn IRandom, oil_start: usize, oil_end: usize, count: usize) -> Result<CentralLayer> {
    let mut equations = Vec::with_capacity(count);
    for _ in 0..count {
        let mut quad = vec![vec![0u8; oil_end]; oil_end];
        for i in 0..oil_end {
            for j in i..oil_end {
                if i >= oil_start && j >= oil_start {
                    continue; // no oil-oil term within this layer
                }
                let mut b = [0u8; 1];
                rng.fill(&mut b)?;
                quad[i][j] = field.mask(b[0]);
            }
        }
        let mut linear = vec![0u8; oil_end];
        rng.fill(&mut linear)?;
        for l in linear.iter_mut() {
            *l = field.mask(*l);
        }
        let mut constant = [0u8; 1];
        rng.fill(&mut constant)?;
        equations.push(LayerEquation { quad, linear, constant: field.mask(constant[0]) });
    }
    Ok(CentralLayer { oil_start, oil_end, equations })
}

fn hash_to_vector(field: RainbowField, message: &[u8], len: usize) -> Vec<u8> {
    let mut h = Shake256::default();
    Update::update(&mut h, b"cex-rs/rainbow/digest");
    Update::update(&mut h, message);
    let mut xof = h.finalize_xof();
    let mut out = vec![0u8; len];
    xof.read(&mut out);
    for b in out.iter_mut() {
        *b = field.mask(*b);
    }
    out
}

struct RainbowPrivate {
    s: Affine,
    t: Affine,
    central: Vec<CentralLayer>,
}

struct RainbowPublic {
    quad: Vec<Vec<Vec<u8>>>,
    linear: Vec<Vec<u8>>,
    constant: Vec<u8>,
}

impl RainbowPublic {
    fn evaluate(&self, field: RainbowField, z: &[u8]) -> Vec<u8> {
        self.quad
            .iter()
            .zip(self.linear.iter())
            .zip(self.constant.iter())
            .map(|((quad, linear), &constant)| {
                let mut acc = constant;
                let n = z.len();
                for i in 0..n {
                    acc = field_add(field, acc, field_mul(field, linear[i], z[i]));
                    for j in i..n {
                        if quad[i][j] != 0 {
                            acc = field_add(field, acc, field_mul(field, quad[i][j], field_mul(field, z[i], z[j])));
                        }
                    }
                }
                acc
            })
            .collect()
    }
}

/// Recovers the full public quadratic map from the private `S`/`F`/`T` via
/// polarization: `P(0)` gives the constant term, `P(e_i)` and `P(g·e_i)`
/// (two points) separate the diagonal quadratic coefficient from the
/// linear one, and `P(e_i+e_j) - P(e_i) - P(e_j) + P(0)` gives each
/// off-diagonal quadratic coefficient.
fn build_public_key(field: RainbowField, dims: RainbowDims, private: &RainbowPrivate) -> Result<RainbowPublic> {
    let n = dims.n();
    let m = dims.m();
    let compose = |x: &[u8]| -> Vec<u8> {
        let tx = private.t.apply(field, x);
        let fx = evaluate_central(field, &private.central, &tx);
        private.s.apply(field, &fx)
    };

    let zero = vec![0u8; n];
    let c = compose(&zero);

    const G: u8 = 2;
    let g_sq = field_mul(field, G, G);
    let denom = field_add(field, G, g_sq);
    let inv_denom = field_inv(field, denom).ok_or_else(|| CryptoError::internal("build_public_key", "degenerate polarization denominator"))?;

    let mut linear = vec![vec![0u8; n]; m];
    let mut diag = vec![vec![0u8; n]; m];
    let mut d1_cache = vec![vec![0u8; m]; n];

    for i in 0..n {
        let mut x1 = zero.clone();
        x1[i] = 1;
        let y1 = compose(&x1);

        let mut xg = zero.clone();
        xg[i] = G;
        let yg = compose(&xg);

        for k in 0..m {
            let d1 = field_add(field, y1[k], c[k]);
            let d2 = field_add(field, yg[k], c[k]);
            d1_cache[i][k] = d1;
            let rhs = field_add(field, d2, field_mul(field, d1, G));
            let b = field_mul(field, rhs, inv_denom);
            let a = field_add(field, d1, b);
            linear[k][i] = a;
            diag[k][i] = b;
        }
    }

    let mut quad = vec![vec![vec![0u8; n]; n]; m];
    for k in 0..m {
        for i in 0..n {
            quad[k][i][i] = diag[k][i];
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let mut xij = zero.clone();
            xij[i] = 1;
            xij[j] = 1;
            let yij = compose(&xij);
            for k in 0..m {
                let cross = field_add(field, field_add(field, yij[k], c[k]), field_add(field, d1_cache[i][k], d1_cache[j][k]));
                quad[k][i][j] = cross;
            }
        }
    }

    Ok(RainbowPublic { quad, linear, constant: c })
}

/// Dense parameter-set binding (§4.6.3 names the three security levels).
/// All three use the same small ("toy") variable counts in this crate;
/// only the field differs, per the module doc comment's sizing note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RainbowParameterSet {
    RnbwS1S128Shake256 = 1,
    RnbwS2S192Shake512 = 2,
    RnbwS3S256Shake512 = 3,
}

impl RainbowParameterSet {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            1 => Ok(Self::RnbwS1S128Shake256),
            2 => Ok(Self::RnbwS2S192Shake512),
            3 => Ok(Self::RnbwS3S256Shake512),
            _ => Err(CryptoError::unsupported("RainbowParameterSet::from_u8", "unrecognized Rainbow parameter byte")),
        }
    }

    fn field(self) -> RainbowField {
        match self {
            Self::RnbwS1S128Shake256 => RainbowField::Gf16,
            Self::RnbwS2S192Shake512 | Self::RnbwS3S256Shake512 => RainbowField::Gf256,
        }
    }

    fn dims(self) -> RainbowDims {
        RainbowDims { vinegar: 4, oil1: 3, oil2: 3 }
    }
}

enum RainbowState {
    Uninitialized,
    Sign { dims: RainbowDims, private: RainbowPrivate },
    Verify { dims: RainbowDims, public: RainbowPublic },
}

/// A `Signer` over the layered oil-vinegar construction. Signatures
/// append the original message after the fixed-length vector of field
/// elements, matching this crate's cross-signer envelope convention.
pub struct Rainbow {
    param_set: RainbowParameterSet,
    state: RainbowState,
    rng: Box<dyn IRandom + Send>,
}

impl Rainbow {
    pub fn new(param_set: RainbowParameterSet, rng: Box<dyn IRandom + Send>) -> Self {
        Rainbow { param_set, state: RainbowState::Uninitialized, rng }
    }

    fn serialize_private(field: RainbowField, dims: RainbowDims, private: &RainbowPrivate) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&private.s.serialize());
        out.extend_from_slice(&private.t.serialize());
        for layer in &private.central {
            for eq in &layer.equations {
                for row in &eq.quad {
                    out.extend_from_slice(row);
                }
                out.extend_from_slice(&eq.linear);
                out.push(eq.constant);
            }
        }
        let _ = field;
        let _ = dims;
        out
    }

    fn deserialize_private(field: RainbowField, dims: RainbowDims, bytes: &[u8]) -> Result<RainbowPrivate> {
        let m = dims.m();
        let n = dims.n();
        let (s, s_len) = Affine::deserialize(bytes, m)?;
        let (t, t_len) = Affine::deserialize(&bytes[s_len..], n)?;
        let mut offset = s_len + t_len;
        let layer_bounds = [(0, dims.vinegar + dims.oil1, dims.oil1), (dims.vinegar, n, dims.oil2)];
        let mut central = Vec::with_capacity(layer_bounds.len());
        for (oil_start, oil_end, count) in layer_bounds {
            let mut equations = Vec::with_capacity(count);
            for _ in 0..count {
                let mut quad = vec![vec![0u8; oil_end]; oil_end];
                for row in quad.iter_mut() {
                    if offset + oil_end > bytes.len() {
                        return Err(CryptoError::invalid_size("Rainbow::deserialize_private", "truncated central map"));
                    }
                    row.copy_from_slice(&bytes[offset..offset + oil_end]);
                    offset += oil_end;
                }
                let linear = bytes
                    .get(offset..offset + oil_end)
                    .ok_or_else(|| CryptoError::invalid_size("Rainbow::deserialize_private", "truncated central map"))?
                    .to_vec();
                offset += oil_end;
                let constant = *bytes.get(offset).ok_or_else(|| CryptoError::invalid_size("Rainbow::deserialize_private", "truncated central map"))?;
                offset += 1;
                equations.push(LayerEquation { quad, linear, constant });
            }
            central.push(CentralLayer { oil_start, oil_end, equations });
        }
        let _ = field;
        Ok(RainbowPrivate { s, t, central })
    }

    fn serialize_public(public: &RainbowPublic, n: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for row in &public.quad {
            for r in row {
                let mut padded = r.clone();
                padded.resize(n, 0);
                out.extend_from_slice(&padded);
            }
        }
        for row in &public.linear {
            out.extend_from_slice(row);
        }
        out.extend_from_slice(&public.constant);
        out
    }

    fn deserialize_public(dims: RainbowDims, bytes: &[u8]) -> Result<RainbowPublic> {
        let n = dims.n();
        let m = dims.m();
        let needed = m * n * n + m * n + m;
        if bytes.len() < needed {
            return Err(CryptoError::invalid_size("Rainbow::deserialize_public", "truncated public key"));
        }
        let mut offset = 0;
        let mut quad = vec![vec![vec![0u8; n]; n]; m];
        for k_rows in quad.iter_mut() {
            for row in k_rows.iter_mut() {
                row.copy_from_slice(&bytes[offset..offset + n]);
                offset += n;
            }
        }
        let mut linear = vec![vec![0u8; n]; m];
        for row in linear.iter_mut() {
            row.copy_from_slice(&bytes[offset..offset + n]);
            offset += n;
        }
        let constant = bytes[offset..offset + m].to_vec();
        Ok(RainbowPublic { quad, linear, constant })
    }
}

impl Signer for Rainbow {
    fn generate(&mut self) -> Result<AsymmetricKeyPair> {
        let field = self.param_set.field();
        let dims = self.param_set.dims();
        let n = dims.n();
        let m = dims.m();

        let s = Affine::random(field, self.rng.as_mut(), m)?;
        let t = Affine::random(field, self.rng.as_mut(), n)?;
        let layer1 = random_layer(field, self.rng.as_mut(), dims.vinegar, dims.vinegar + dims.oil1, dims.oil1)?;
        let layer2 = random_layer(field, self.rng.as_mut(), dims.vinegar + dims.oil1, n, dims.oil2)?;
        let central = vec![layer1, layer2];
        let private = RainbowPrivate { s, t, central };
        let public = build_public_key(field, dims, &private)?;

        let private_bytes = Self::serialize_private(field, dims, &private);
        let public_bytes = Self::serialize_public(&public, n);

        let public_key = AsymmetricKey::new(AsymmetricPrimitives::Rainbow, AsymmetricKeyTypes::SignaturePublicKey, self.param_set as u8, public_bytes);
        let private_key = AsymmetricKey::new(AsymmetricPrimitives::Rainbow, AsymmetricKeyTypes::SignaturePrivateKey, self.param_set as u8, private_bytes);
        Ok(AsymmetricKeyPair { public: public_key, private: private_key, tag: None })
    }

    fn initialize(&mut self, key: AsymmetricKey) -> Result<()> {
        if key.primitive != AsymmetricPrimitives::Rainbow {
            return Err(CryptoError::invalid_param("Rainbow::initialize", "key is not a Rainbow key"));
        }
        let param_set = RainbowParameterSet::from_u8(key.parameters)?;
        self.param_set = param_set;
        let field = param_set.field();
        let dims = param_set.dims();
        self.state = match key.class {
            AsymmetricKeyTypes::SignaturePrivateKey => {
                RainbowState::Sign { dims, private: Self::deserialize_private(field, dims, &key.polynomial)? }
            }
            AsymmetricKeyTypes::SignaturePublicKey => RainbowState::Verify { dims, public: Self::deserialize_public(dims, &key.polynomial)? },
            _ => return Err(CryptoError::invalid_param("Rainbow::initialize", "key class must be a signature key")),
        };
        Ok(())
    }

    fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let field = self.param_set.field();
        let (dims, private) = match &self.state {
            RainbowState::Sign { dims, private } => (*dims, private),
            _ => return Err(CryptoError::not_initialized("Rainbow::sign")),
        };
        let n = dims.n();
        let m = dims.m();
        let target = hash_to_vector(field, message, m);
        let y = private.s.apply_inverse(field, &target);

        for _ in 0..MAX_SIGN_ATTEMPTS {
            let mut vars = vec![0u8; n];
            let mut vinegar = vec![0u8; dims.vinegar];
            self.rng.fill(&mut vinegar)?;
            for (slot, b) in vars.iter_mut().zip(vinegar.into_iter()) {
                *slot = field.mask(b);
            }
            if invert_central(field, &private.central, &y, &mut vars).is_some() {
                let z = private.t.apply_inverse(field, &vars);
                let mut out = Vec::with_capacity(n + message.len());
                out.extend_from_slice(&z);
                out.extend_from_slice(message);
                return Ok(out);
            }
        }
        Err(CryptoError::internal("Rainbow::sign", "central map inversion did not converge"))
    }

    fn verify(&mut self, signature: &[u8], message_out: &mut Vec<u8>) -> Result<bool> {
        let field = self.param_set.field();
        let (dims, public) = match &self.state {
            RainbowState::Verify { dims, public } => (*dims, public),
            _ => return Err(CryptoError::not_initialized("Rainbow::verify")),
        };
        let n = dims.n();
        if signature.len() < n {
            return Err(CryptoError::invalid_size("Rainbow::verify", "signature shorter than the fixed vector length"));
        }
        let z = &signature[..n];
        let message = &signature[n..];
        let expected = hash_to_vector(field, message, dims.m());
        let actual = public.evaluate(field, z);
        if actual == expected {
            *message_out = message.to_vec();
            Ok(true)
        } else {
            message_out.clear();
            Ok(false)
        }
    }

    fn is_initialized(&self) -> bool {
        !matches!(self.state, RainbowState::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::NistRng;

    fn rng() -> Box<dyn IRandom + Send> {
        Box::new(NistRng::new(&[0x3Cu8; 48]).unwrap())
    }

    #[test]
    fn sign_then_verify_recovers_message() {
        let mut signer = Rainbow::new(RainbowParameterSet::RnbwS1S128Shake256, rng());
        let pair = signer.generate().unwrap();

        let mut signing = Rainbow::new(RainbowParameterSet::RnbwS1S128Shake256, rng());
        signing.initialize(pair.private).unwrap();
        let message = b"cex-rs rainbow self-consistency";
        let signature = signing.sign(message).unwrap();

        let mut verifying = Rainbow::new(RainbowParameterSet::RnbwS1S128Shake256, rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(verifying.verify(&signature, &mut recovered).unwrap());
        assert_eq!(recovered, message);
    }

    #[test]
    fn gf256_parameter_set_round_trips() {
        let mut signer = Rainbow::new(RainbowParameterSet::RnbwS2S192Shake512, rng());
        let pair = signer.generate().unwrap();

        let mut signing = Rainbow::new(RainbowParameterSet::RnbwS2S192Shake512, rng());
        signing.initialize(pair.private).unwrap();
        let message = b"gf256 parameter set";
        let signature = signing.sign(message).unwrap();

        let mut verifying = Rainbow::new(RainbowParameterSet::RnbwS2S192Shake512, rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(verifying.verify(&signature, &mut recovered).unwrap());
        assert_eq!(recovered, message);
    }

    #[test]
    fn tampered_signature_fails() {
        let mut signer = Rainbow::new(RainbowParameterSet::RnbwS1S128Shake256, rng());
        let pair = signer.generate().unwrap();

        let mut signing = Rainbow::new(RainbowParameterSet::RnbwS1S128Shake256, rng());
        signing.initialize(pair.private).unwrap();
        let mut signature = signing.sign(b"message").unwrap();
        signature[0] ^= 0x01;

        let mut verifying = Rainbow::new(RainbowParameterSet::RnbwS1S128Shake256, rng());
        verifying.initialize(pair.public).unwrap();
        let mut recovered = Vec::new();
        assert!(!verifying.verify(&signature, &mut recovered).unwrap());
        assert!(recovered.is_empty());
    }
}
