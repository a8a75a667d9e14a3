mod ec;
mod qr;

pub use qr::{Module, QR};

use std::ops::Deref;

use crate::common::{
    codec::{total_encoded_bits, Segment, MODE_BIT_LEN, PADDING_CODEWORDS},
    error::{QRError, QRResult},
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
    BitStream,
};

// Encoder entry points
//------------------------------------------------------------------------------

/// Encodes a Unicode string, picking the densest single mode that covers it.
pub fn encode_text(text: &str, ec_level: ECLevel) -> QRResult<QR> {
    encode_segments(&Segment::make_segments(text), ec_level)
}

/// Encodes arbitrary bytes in byte mode.
pub fn encode_binary(data: &[u8], ec_level: ECLevel) -> QRResult<QR> {
    encode_segments(&[Segment::bytes(data)], ec_level)
}

pub fn encode_segments(segments: &[Segment], ec_level: ECLevel) -> QRResult<QR> {
    encode_segments_advanced(segments, ec_level, Version::MIN, Version::MAX, None, true)
}

/// Full control variant: version search is restricted to
/// `[min_version, max_version]`, a mask pattern can be forced instead of
/// scored, and `boost_ec_level` may raise the requested level whenever the
/// chosen version has room for it.
pub fn encode_segments_advanced(
    segments: &[Segment],
    ec_level: ECLevel,
    min_version: Version,
    max_version: Version,
    mask: Option<MaskPattern>,
    boost_ec_level: bool,
) -> QRResult<QR> {
    let (version, total_bits) = find_version(segments, ec_level, min_version, max_version)?;
    let mut ec_level = ec_level;
    if boost_ec_level {
        for candidate in [ECLevel::M, ECLevel::Q, ECLevel::H] {
            if candidate > ec_level && total_bits <= version.data_bit_capacity(candidate) {
                ec_level = candidate;
            }
        }
    }

    let encoded = assemble_bit_stream(segments, version, ec_level, total_bits);
    let payload = add_error_correction(encoded.data(), version, ec_level);

    let mut qr = QR::new(version, ec_level);
    qr.draw_all_function_patterns();
    qr.draw_encoding_region(&payload);
    match mask {
        Some(pattern) => qr.apply_mask(pattern),
        None => {
            apply_best_mask(&mut qr);
        }
    }
    Ok(qr)
}

// Encoder pipeline
//------------------------------------------------------------------------------

fn find_version(
    segments: &[Segment],
    ec_level: ECLevel,
    min_version: Version,
    max_version: Version,
) -> QRResult<(Version, usize)> {
    if min_version > max_version {
        return Err(QRError::InvalidVersionRange);
    }
    for v in *min_version..=*max_version {
        let version = Version::new_unchecked(v);
        if let Some(bits) = total_encoded_bits(segments, version) {
            if bits <= version.data_bit_capacity(ec_level) {
                return Ok((version, bits));
            }
        }
    }
    Err(QRError::DataTooLong)
}

fn assemble_bit_stream(
    segments: &[Segment],
    version: Version,
    ec_level: ECLevel,
    total_bits: usize,
) -> BitStream {
    let bit_capacity = version.data_bit_capacity(ec_level);
    let mut bs = BitStream::with_capacity(bit_capacity);
    for seg in segments {
        bs.push_bits(seg.mode().indicator(), MODE_BIT_LEN);
        bs.push_bits(seg.char_count() as u32, version.char_count_bits(seg.mode()));
        bs.extend(seg.data());
    }
    debug_assert!(
        bs.len() == total_bits,
        "Encoded bit count doesn't match the precomputed total: Encoded {}, Total {total_bits}",
        bs.len()
    );

    push_terminator(&mut bs, bit_capacity);
    pad_remaining_capacity(&mut bs, bit_capacity);
    bs
}

fn push_terminator(bs: &mut BitStream, bit_capacity: usize) {
    let term_len = std::cmp::min(4, bit_capacity - bs.len());
    bs.push_bits(0u32, term_len);
}

fn pad_remaining_capacity(bs: &mut BitStream, bit_capacity: usize) {
    let offset = bs.len() & 7;
    if offset > 0 {
        bs.push_bits(0u32, 8 - offset);
    }

    let remaining_codewords = (bit_capacity - bs.len()) >> 3;
    for pc in PADDING_CODEWORDS.iter().copied().cycle().take(remaining_codewords) {
        bs.push_bits(pc, 8);
    }
}

fn add_error_correction(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    debug_assert!(
        data.len() == version.data_codewords(ec_level),
        "Data length doesn't match codeword capacity: Data {}, Capacity {}",
        data.len(),
        version.data_codewords(ec_level)
    );

    let data_blocks = blockify(data, version, ec_level);
    let ecc_count = version.ecc_per_block(ec_level);
    let ecc_blocks = data_blocks.iter().map(|b| ec::ecc(b, ecc_count)).collect::<Vec<_>>();

    let mut payload = interleave(&data_blocks);
    payload.extend(interleave(&ecc_blocks));
    payload
}

// Splits the data codewords into ec blocks; short blocks precede the long
// ones, which carry one extra codeword.
fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
    let (block1_size, block1_count, block2_size, block2_count) =
        version.data_codewords_per_block(ec_level);

    let total_blocks = block1_count + block2_count;
    let total_block1_size = block1_size * block1_count;
    let total_size = total_block1_size + block2_size * block2_count;

    debug_assert!(
        total_size == data.len(),
        "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
        data.len(),
        total_size
    );

    let mut data_blocks = Vec::with_capacity(total_blocks);
    data_blocks.extend(data[..total_block1_size].chunks(block1_size));
    if block2_size > 0 {
        data_blocks.extend(data[total_block1_size..].chunks(block2_size));
    }
    data_blocks
}

// Column major read over blocks of uneven length; exhausted blocks drop out
fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
    let max_block_size = blocks.iter().map(|b| b.len()).max().expect("Blocks is empty");
    let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
    let mut res = Vec::with_capacity(total_size);
    for i in 0..max_block_size {
        for b in blocks {
            if i < b.len() {
                res.push(b[i]);
            }
        }
    }
    res
}

// Fluent builder
//------------------------------------------------------------------------------

pub struct QRBuilder<'a> {
    data: &'a [u8],
    min_version: Version,
    max_version: Version,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
    boost_ec_level: bool,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            min_version: Version::MIN,
            max_version: Version::MAX,
            ec_level: ECLevel::M,
            mask: None,
            boost_ec_level: true,
        }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.min_version = version;
        self.max_version = version;
        self
    }

    pub fn version_range(&mut self, min_version: Version, max_version: Version) -> &mut Self {
        self.min_version = min_version;
        self.max_version = max_version;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn boost_ec_level(&mut self, boost: bool) -> &mut Self {
        self.boost_ec_level = boost;
        self
    }

    pub fn metadata(&self) -> String {
        format!(
            "{{ Versions: {}-{}, Ec level: {}, Mask: {:?} }}",
            *self.min_version,
            *self.max_version,
            self.ec_level,
            self.mask.map(|m| *m)
        )
    }

    pub fn build(&self) -> QRResult<QR> {
        let segments = match std::str::from_utf8(self.data) {
            Ok(text) => Segment::make_segments(text),
            Err(_) => vec![Segment::bytes(self.data)],
        };
        encode_segments_advanced(
            &segments,
            self.ec_level,
            self.min_version,
            self.max_version,
            self.mask,
            self.boost_ec_level,
        )
    }
}


#[cfg(test)]
mod pipeline_tests {
    use test_case::test_case;

    use super::{add_error_correction, blockify, find_version, interleave, push_terminator};
    use crate::common::{
        codec::Segment,
        error::QRError,
        metadata::{ECLevel, Version},
        BitStream,
    };

    #[test]
    fn test_find_version_smallest_fit() {
        let segs = [Segment::bytes("Hello, world!".as_bytes())];
        // 116 bits fit v1 L (152) but not v1 H (72)
        let (ver, bits) = find_version(&segs, ECLevel::L, Version::MIN, Version::MAX).unwrap();
        assert_eq!(*ver, 1);
        assert_eq!(bits, 116);
        let (ver, _) = find_version(&segs, ECLevel::H, Version::MIN, Version::MAX).unwrap();
        assert_eq!(*ver, 2);
    }

    #[test]
    fn test_find_version_empty_segments() {
        let (ver, bits) = find_version(&[], ECLevel::H, Version::MIN, Version::MAX).unwrap();
        assert_eq!(*ver, 1);
        assert_eq!(bits, 0);
    }

    #[test]
    fn test_find_version_invalid_range() {
        let segs = [Segment::bytes(b"a")];
        let res =
            find_version(&segs, ECLevel::L, Version::new_unchecked(2), Version::new_unchecked(1));
        assert_eq!(res.unwrap_err(), QRError::InvalidVersionRange);
    }

    #[test]
    fn test_find_version_data_too_long() {
        let segs = [Segment::bytes(&[0u8; 3000])];
        let res = find_version(&segs, ECLevel::L, Version::MIN, Version::MAX);
        assert_eq!(res.unwrap_err(), QRError::DataTooLong);
    }

    #[test]
    fn test_push_terminator_truncated_at_capacity() {
        let mut bs = BitStream::new();
        bs.push_bits(0b1u8, 1);
        push_terminator(&mut bs, 3);
        assert_eq!(bs.len(), 3);
        push_terminator(&mut bs, 8);
        assert_eq!(bs.len(), 7);
    }

    #[test_case(16, ECLevel::M, 1; "one block")]
    #[test_case(62, ECLevel::Q, 5; "split blocks")]
    fn test_blockify_sizes(data_len: usize, ec_level: ECLevel, version: usize) {
        let data = vec![0u8; data_len];
        let ver = Version::new_unchecked(version);
        let blocks = blockify(&data, ver, ec_level);
        let (s1, c1, s2, c2) = ver.data_codewords_per_block(ec_level);
        assert_eq!(blocks.len(), c1 + c2);
        for (i, b) in blocks.iter().enumerate() {
            let exp = if i < c1 { s1 } else { s2 };
            assert_eq!(b.len(), exp, "Block {i}");
        }
    }

    #[test]
    fn test_interleave() {
        let blocks = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9, 0]];
        let interleaved = interleave(&blocks);
        assert_eq!(interleaved, vec![1, 4, 7, 2, 5, 8, 3, 6, 9, 0]);
    }

    #[test]
    fn test_add_error_correction_simple() {
        // Single block at v1 M: parity is appended straight after the data
        let msg = b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11";
        let payload = add_error_correction(msg, Version::new_unchecked(1), ECLevel::M);
        let mut exp = msg.to_vec();
        exp.extend(b"\xc4\x23\x27\x77\xeb\xd7\xe7\xe2\x5d\x17");
        assert_eq!(payload, exp);
    }

    #[test]
    fn test_add_error_correction_interleaves_blocks() {
        let msg = b"CUF\x86W&U\xc2w2\x06\x12\x06g&\xf6\xf6B\x07v\x86\xf2\x07&V\x16\xc6\xc7\x92\x06\
                    \xb6\xe6\xf7w2\x07v\x86W&R\x06\x86\x972\x07F\xf7vV\xc2\x06\x972\x10\xec\x11\xec\
                    \x11\xec\x11\xec";
        let ver = Version::new_unchecked(5);
        let payload = add_error_correction(msg, ver, ECLevel::Q);
        assert_eq!(payload.len(), ver.total_codewords());
        // 4 blocks of 15, 15, 16, 16 data codewords
        assert_eq!(&payload[..4], [msg[0], msg[15], msg[30], msg[46]]);
        // First parity codeword of each block, straight from the RS vectors
        let parity_start = ver.data_codewords(ECLevel::Q);
        assert_eq!(&payload[parity_start..parity_start + 4], [0xd5, 0x57, 0x94, 0xeb]);
    }
}
