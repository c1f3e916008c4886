//! Reed-Solomon error correction for ECC200
//!
//! - GF(256) with primitive polynomial x^8 + x^5 + x^3 + x^2 + 1 (0x12d)
//! - Generator roots α^1..α^n, codeword polynomials highest degree first
//! - Blocks are interleaved: codeword `i` of block `b` sits at `i * blocks + b`

use crate::error::{DmtxError, Result};
use crate::models::SymbolSize;

const PRIMITIVE: u16 = 0x12d;

const fn build_tables() -> ([u8; 256], [u8; 255]) {
    let mut log = [0u8; 256];
    let mut alog = [0u8; 255];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        alog[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    (log, alog)
}

const TABLES: ([u8; 256], [u8; 255]) = build_tables();
static LOG_TABLE: [u8; 256] = TABLES.0;
static EXP_TABLE: [u8; 255] = TABLES.1;

/// GF(256) field operations using log/antilog tables
pub struct Gf256;

impl Gf256 {
    /// `a * b` in GF(256)
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + log_b) % 255]
    }

    /// `a / b`; `b` must be non-zero
    pub fn div(a: u8, b: u8) -> u8 {
        debug_assert!(b != 0, "division by zero in GF(256)");
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + 255 - log_b) % 255]
    }

    /// α^n
    pub fn alpha_pow(n: usize) -> u8 {
        EXP_TABLE[n % 255]
    }

    /// Evaluate a polynomial stored lowest degree first
    fn eval_ascending(poly: &[u8], x: u8) -> u8 {
        let mut sum = 0u8;
        let mut x_pow = 1u8;
        for &coeff in poly {
            sum ^= Gf256::mul(coeff, x_pow);
            x_pow = Gf256::mul(x_pow, x);
        }
        sum
    }
}

/// Generator polynomial with roots α^1..α^`ecc_len`, lowest degree first (leading 1 omitted)
fn generator(ecc_len: usize) -> Vec<u8> {
    let mut g = vec![1u8; ecc_len + 1];
    for i in 1..=ecc_len {
        for j in (0..i).rev() {
            g[j] = Gf256::mul(g[j], Gf256::alpha_pow(i));
            if j > 0 {
                g[j] ^= g[j - 1];
            }
        }
    }
    g.truncate(ecc_len);
    g
}

/// Error words of one block, in transmission order
pub fn encode_block(data: &[u8], ecc_len: usize) -> Vec<u8> {
    let g = generator(ecc_len);
    let mut b = vec![0u8; ecc_len];
    for &d in data {
        let val = b[ecc_len - 1] ^ d;
        for j in (1..ecc_len).rev() {
            b[j] = b[j - 1] ^ Gf256::mul(g[j], val);
        }
        b[0] = Gf256::mul(g[0], val);
    }
    b.reverse();
    b
}

/// Data and error words of `block` gathered out of the interleaved symbol codewords
fn gather_block(code: &[u8], size: SymbolSize, block: usize) -> Vec<u8> {
    let step = size.interleaved_blocks();
    let total = size.block_data_words(block) + size.block_error_words();
    let data_words = size.data_words();
    let block_data = size.block_data_words(block);
    (0..total)
        .map(|i| {
            if i < block_data {
                code[i * step + block]
            } else {
                code[data_words + (i - block_data) * step + block]
            }
        })
        .collect()
}

/// Fill the error words of a symbol whose data words are already in place
pub fn generate_ecc(code: &mut [u8], size: SymbolSize) -> Result<()> {
    if code.len() != size.total_words() {
        return Err(DmtxError::internal("codeword buffer does not match symbol size"));
    }
    let step = size.interleaved_blocks();
    let ecc_len = size.block_error_words();
    let data_words = size.data_words();
    for block in 0..step {
        let data: Vec<u8> = code[..data_words].iter().skip(block).step_by(step).copied().collect();
        let ecc = encode_block(&data, ecc_len);
        for (i, word) in ecc.into_iter().enumerate() {
            code[data_words + i * step + block] = word;
        }
    }
    Ok(())
}

/// Verify and correct every block of a symbol in place; returns the number of corrected
/// codewords
pub fn decode_check_errors(code: &mut [u8], size: SymbolSize) -> Result<usize> {
    if code.len() != size.total_words() {
        return Err(DmtxError::internal("codeword buffer does not match symbol size"));
    }
    let step = size.interleaved_blocks();
    let data_words = size.data_words();
    let decoder = ReedSolomonDecoder::new(size.block_error_words(), size.block_max_correctable());

    let mut corrected = 0;
    for block in 0..step {
        let mut words = gather_block(code, size, block);
        corrected += decoder.decode(&mut words)?;

        let block_data = size.block_data_words(block);
        for (i, word) in words.into_iter().enumerate() {
            if i < block_data {
                code[i * step + block] = word;
            } else {
                code[data_words + (i - block_data) * step + block] = word;
            }
        }
    }
    if corrected > 0 {
        tracing::debug!(corrected, %size, "reed-solomon corrected codewords");
    }
    Ok(corrected)
}

/// Syndrome decoder for one block
pub struct ReedSolomonDecoder {
    num_ecc_codewords: usize,
    max_correctable: usize,
}

impl ReedSolomonDecoder {
    /// Decoder for blocks carrying `num_ecc_codewords` error words, correcting at most
    /// `max_correctable` of them
    pub fn new(num_ecc_codewords: usize, max_correctable: usize) -> Self {
        Self {
            num_ecc_codewords,
            max_correctable,
        }
    }

    /// Correct `received` in place, returning how many codewords were changed
    pub fn decode(&self, received: &mut [u8]) -> Result<usize> {
        let syndrome = self.calculate_syndrome(received);
        if syndrome.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        // Berlekamp-Massey
        let (sigma, errors) = self.find_error_locator(&syndrome);
        if sigma.len() - 1 != errors || errors > self.max_correctable {
            return Err(DmtxError::Uncorrectable);
        }

        // Chien search
        let positions = self.find_error_positions(&sigma, received.len());
        if positions.len() != errors {
            return Err(DmtxError::Uncorrectable);
        }

        // Forney
        let values = self.find_error_values(&sigma, &syndrome, &positions, received.len())?;
        for (&pos, &value) in positions.iter().zip(values.iter()) {
            received[pos] ^= value;
        }

        if self.calculate_syndrome(received).iter().any(|&s| s != 0) {
            return Err(DmtxError::Uncorrectable);
        }
        Ok(errors)
    }

    /// S_i = r(α^(i+1)); `received[0]` is the coefficient of x^(n-1)
    fn calculate_syndrome(&self, received: &[u8]) -> Vec<u8> {
        let n = received.len();
        (0..self.num_ecc_codewords)
            .map(|i| {
                received.iter().enumerate().fold(0u8, |sum, (j, &c)| {
                    sum ^ Gf256::mul(c, Gf256::alpha_pow((i + 1) * (n - 1 - j)))
                })
            })
            .collect()
    }

    /// Error locator σ (lowest degree first, trailing zeros trimmed) and its expected degree
    fn find_error_locator(&self, syndrome: &[u8]) -> (Vec<u8>, usize) {
        let mut sigma = vec![1u8];
        let mut prev = vec![1u8];
        let mut l = 0usize;
        let mut m = 1usize;
        let mut delta_prev = 1u8;

        for n in 0..syndrome.len() {
            let mut delta = syndrome[n];
            for i in 1..=l.min(sigma.len() - 1) {
                delta ^= Gf256::mul(sigma[i], syndrome[n - i]);
            }
            if delta == 0 {
                m += 1;
                continue;
            }

            let coef = Gf256::div(delta, delta_prev);
            let mut next = sigma.clone();
            if next.len() < prev.len() + m {
                next.resize(prev.len() + m, 0);
            }
            for (i, &p) in prev.iter().enumerate() {
                next[i + m] ^= Gf256::mul(coef, p);
            }

            if 2 * l <= n {
                l = n + 1 - l;
                prev = std::mem::replace(&mut sigma, next);
                delta_prev = delta;
                m = 1;
            } else {
                sigma = next;
                m += 1;
            }
        }

        while sigma.len() > 1 && sigma.last() == Some(&0) {
            sigma.pop();
        }
        (sigma, l)
    }

    fn find_error_positions(&self, sigma: &[u8], n: usize) -> Vec<usize> {
        // Position j carries X = α^(n-1-j); it is in error when σ(X^-1) = 0
        (0..n)
            .filter(|&j| {
                let x_inv = Gf256::alpha_pow(255 - (n - 1 - j) % 255);
                Gf256::eval_ascending(sigma, x_inv) == 0
            })
            .collect()
    }

    fn find_error_values(
        &self,
        sigma: &[u8],
        syndrome: &[u8],
        positions: &[usize],
        n: usize,
    ) -> Result<Vec<u8>> {
        // Ω = S·σ mod x^(2t)
        let mut omega = vec![0u8; syndrome.len()];
        for (i, o) in omega.iter_mut().enumerate() {
            for j in 0..=i.min(sigma.len() - 1) {
                *o ^= Gf256::mul(sigma[j], syndrome[i - j]);
            }
        }

        positions
            .iter()
            .map(|&pos| {
                let x_inv = Gf256::alpha_pow(255 - (n - 1 - pos) % 255);
                let omega_val = Gf256::eval_ascending(&omega, x_inv);

                // σ'(x) keeps only the odd terms in characteristic 2
                let mut sigma_prime = 0u8;
                let mut x_pow = 1u8;
                for (i, &coeff) in sigma.iter().enumerate().skip(1) {
                    if i % 2 == 1 {
                        sigma_prime ^= Gf256::mul(coeff, x_pow);
                    }
                    x_pow = Gf256::mul(x_pow, x_inv);
                }
                if sigma_prime == 0 {
                    return Err(DmtxError::Uncorrectable);
                }
                // First root α^1, so no X_k factor
                Ok(Gf256::div(omega_val, sigma_prime))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rs_encode(data: &[u8], num_ecc: usize) -> Vec<u8> {
        let mut codeword = data.to_vec();
        codeword.extend(encode_block(data, num_ecc));
        codeword
    }

    #[test]
    fn test_gf256_basic() {
        assert_eq!(Gf256::mul(0, 5), 0);
        assert_eq!(Gf256::div(0, 5), 0);
        assert_eq!(Gf256::div(7, 7), 1);
        assert_eq!(Gf256::alpha_pow(8), 0x2d);
        assert_eq!(Gf256::alpha_pow(255), 1);
        for a in 1..=255u8 {
            assert_eq!(Gf256::div(Gf256::mul(a, 0x53), 0x53), a);
        }
    }

    #[test]
    fn test_iso_example_codewords() {
        // "123456" in a 10x10 symbol
        assert_eq!(encode_block(&[142, 164, 186], 5), vec![114, 25, 5, 88, 102]);
    }

    #[test]
    fn test_rs_no_errors() {
        let mut codeword = rs_encode(&[0x10, 0x20, 0x30, 0x40, 0x50, 0x60], 10);
        let decoder = ReedSolomonDecoder::new(10, 5);
        assert_eq!(decoder.decode(&mut codeword).unwrap(), 0);
    }

    #[test]
    fn test_rs_correct_single_error() {
        let data = vec![0x00; 10];
        let mut codeword = rs_encode(&data, 10);
        codeword[3] ^= 0xAB;
        let decoder = ReedSolomonDecoder::new(10, 5);
        assert_eq!(decoder.decode(&mut codeword).unwrap(), 1);
        assert_eq!(&codeword[..data.len()], &data);
    }

    #[test]
    fn test_rs_correct_multiple_errors() {
        let data = vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        let mut codeword = rs_encode(&data, 10);
        codeword[0] ^= 0xFF;
        codeword[4] ^= 0x42;
        codeword[7] ^= 0x13;
        codeword[16] ^= 0x01;
        let decoder = ReedSolomonDecoder::new(10, 5);
        assert_eq!(decoder.decode(&mut codeword).unwrap(), 4);
        assert_eq!(&codeword[..data.len()], &data);
    }

    #[test]
    fn test_rs_respects_max_correctable() {
        let data: Vec<u8> = "Data Matrix".bytes().collect();
        let mut codeword = rs_encode(&data, 12);
        codeword[1] ^= 0x55;
        codeword[5] ^= 0xAA;
        codeword[9] ^= 0x0F;
        let decoder = ReedSolomonDecoder::new(12, 2);
        assert_eq!(decoder.decode(&mut codeword), Err(DmtxError::Uncorrectable));
    }

    #[test]
    fn test_symbol_interleaving_round_trip() {
        // 64x64 has two interleaved blocks
        let size = SymbolSize::from_dimensions(64, 64).unwrap();
        let mut code = vec![0u8; size.total_words()];
        for (i, word) in code.iter_mut().take(size.data_words()).enumerate() {
            *word = (i * 7 + 3) as u8;
        }
        generate_ecc(&mut code, size).unwrap();
        let clean = code.clone();

        for block in 0..size.interleaved_blocks() {
            let words = gather_block(&code, size, block);
            assert_eq!(words.len(), size.block_data_words(block) + size.block_error_words());
        }

        code[0] ^= 0x40;
        code[1] ^= 0x40;
        code[size.data_words() + 3] ^= 0x99;
        assert_eq!(decode_check_errors(&mut code, size).unwrap(), 3);
        assert_eq!(code, clean);
    }

    #[test]
    fn test_144_block_sizes() {
        let size = SymbolSize::SQUARE_144X144;
        let mut code = vec![0x5a; size.total_words()];
        generate_ecc(&mut code, size).unwrap();
        assert_eq!(decode_check_errors(&mut code, size).unwrap(), 0);
    }
}
