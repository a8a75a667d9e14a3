// Reed-Solomon error correction over GF(256)
//------------------------------------------------------------------------------

// Log/antilog tables for the QR field: reducing polynomial 0x11D, generator
// element 2.
static GF_TABLES: ([u8; 255], [u8; 256]) = build_gf_tables();

const fn build_gf_tables() -> ([u8; 255], [u8; 256]) {
    let mut exp = [0u8; 255];
    let mut log = [0u8; 256];
    let mut x = 1usize;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11D;
        }
        i += 1;
    }
    (exp, log)
}

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let (exp, log) = (&GF_TABLES.0, &GF_TABLES.1);
    let log_sum = log[a as usize] as usize + log[b as usize] as usize;
    exp[log_sum % 255]
}

// Product of (x - α^i) for i in [0, degree), coefficients stored without
// the leading 1.
fn generator_poly(degree: usize) -> Vec<u8> {
    debug_assert!((1..=MAX_EC_SIZE).contains(&degree), "Invalid ec codeword count: {degree}");

    let mut result = vec![0u8; degree];
    result[degree - 1] = 1;
    let mut root = 1u8;
    for _ in 0..degree {
        for i in 0..degree {
            result[i] = gf_mul(result[i], root);
            if i + 1 < degree {
                result[i] ^= result[i + 1];
            }
        }
        root = gf_mul(root, 0x02);
    }
    result
}

/// Parity codewords for one data block: the remainder of data * x^degree
/// divided by the generator polynomial.
pub(crate) fn ecc(block: &[u8], ecc_count: usize) -> Vec<u8> {
    let generator = generator_poly(ecc_count);
    let mut rem = vec![0u8; ecc_count];
    for &codeword in block {
        let factor = codeword ^ rem[0];
        rem.rotate_left(1);
        rem[ecc_count - 1] = 0;
        for (r, &g) in rem.iter_mut().zip(generator.iter()) {
            *r ^= gf_mul(g, factor);
        }
    }
    rem
}


// Global constants
//------------------------------------------------------------------------------

pub(crate) const MAX_EC_SIZE: usize = 30;
