// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Sub-vector records and the composite encodings built from them.

use tracing::warn;

use super::Reader;
use super::WireError;
use super::WireResult;
use super::Writer;

/// Bytes needed for a `bits`-bit number.
pub const fn byte_len(bits: usize) -> usize {
    (bits + 7) / 8
}

/// Bytes of a `bits`-bit number padded to the engine's 4-byte words.
pub const fn word_len(bits: usize) -> usize {
    4 * ((byte_len(bits) + 3) / 4)
}

/// On-the-wire size of one sub-vector record: header plus padded value.
pub const fn vector_len(bits: usize) -> usize {
    4 + word_len(bits)
}

/// On-the-wire size of curve domain parameters: six `bits`-wide records
/// plus the single-word cofactor record.
pub const fn ecc_domain_len(bits: usize) -> usize {
    6 * vector_len(bits) + 8
}

/// On-the-wire size of discrete-log domain parameters: prime and generator
/// at the prime width, subgroup order at the divisor width.
pub const fn dl_domain_len(prime_bits: usize, divisor_bits: usize) -> usize {
    2 * vector_len(prime_bits) + vector_len(divisor_bits)
}

fn check_bits(bits: usize) -> WireResult<()> {
    if bits == 0 || bits > u16::MAX as usize {
        return Err(WireError::BadBits(bits));
    }
    Ok(())
}

/// The 4-byte header preceding every sub-vector record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubVectorHeader {
    /// Value width in bits.
    pub bits: u16,
    /// Position of this record within its composite value.
    pub index: u8,
    /// Total records in the composite value.
    pub count: u8,
}

impl SubVectorHeader {
    /// Read a header at the cursor.
    pub fn read(r: &mut Reader<'_>) -> WireResult<Self> {
        let bits = r.get_u16_le()?;
        let index = r.get_u8()?;
        let count = r.get_u8()?;
        Ok(SubVectorHeader { bits, index, count })
    }

    /// Write this header at the cursor.
    pub fn write(self, w: &mut Writer<'_>) -> WireResult<()> {
        w.put_u16_le(self.bits)?;
        w.put_u8(self.index)?;
        w.put_u8(self.count)
    }

    /// Fail unless the record sits at `index` of `count`.
    pub fn expect(self, index: u8, count: u8) -> WireResult<Self> {
        if self.index != index || self.count != count {
            return Err(WireError::HeaderMismatch {
                index: self.index,
                count: self.count,
                expect_index: index,
                expect_count: count,
            });
        }
        Ok(self)
    }
}

/// Append one sub-vector record.
///
/// `value` is most-significant-byte first. A value wider than `bits` is
/// truncated to its least significant bytes with a warning; a narrower one
/// is zero-extended.
pub fn put_bigint(
    w: &mut Writer<'_>,
    bits: usize,
    index: u8,
    count: u8,
    value: &[u8],
) -> WireResult<()> {
    check_bits(bits)?;
    let blen = byte_len(bits);
    let wlen = word_len(bits);
    let trimmed = if value.len() > blen {
        warn!(
            have = value.len(),
            keep = blen,
            "big integer wider than its declared {bits} bits, truncating"
        );
        &value[value.len() - blen..]
    } else {
        value
    };
    let header = SubVectorHeader {
        bits: bits as u16,
        index,
        count,
    };
    header.write(w)?;
    w.put_reversed(trimmed)?;
    w.put_zeroes(wlen - trimmed.len())
}

fn read_record(r: &mut Reader<'_>) -> WireResult<(SubVectorHeader, Vec<u8>)> {
    let header = SubVectorHeader::read(r)?;
    check_bits(header.bits as usize)?;
    let blen = byte_len(header.bits as usize);
    let payload = r.get_bytes(word_len(header.bits as usize))?;
    let mut out = vec![0u8; blen];
    for (i, b) in payload[..blen].iter().enumerate() {
        out[blen - 1 - i] = *b;
    }
    Ok((header, out))
}

/// Read one sub-vector record into `dest`.
///
/// Fills `dest` most-significant-byte first and returns the header together
/// with the byte count written. A record wider than `dest` loses its most
/// significant bytes with a warning.
pub fn get_bigint(r: &mut Reader<'_>, dest: &mut [u8]) -> WireResult<(SubVectorHeader, usize)> {
    let (header, value) = read_record(r)?;
    let n = if value.len() > dest.len() {
        warn!(
            have = value.len(),
            keep = dest.len(),
            "big integer wider than the destination, truncating"
        );
        dest.len()
    } else {
        value.len()
    };
    dest[..n].copy_from_slice(&value[value.len() - n..]);
    Ok((header, n))
}

/// Append an EC point as two `bits`-wide records.
pub fn put_point(w: &mut Writer<'_>, bits: usize, x: &[u8], y: &[u8]) -> WireResult<()> {
    put_bigint(w, bits, 0, 2, x)?;
    put_bigint(w, bits, 1, 2, y)
}

/// Read an EC point written by [`put_point`].
pub fn get_point(r: &mut Reader<'_>) -> WireResult<(Vec<u8>, Vec<u8>)> {
    let (hx, x) = read_record(r)?;
    hx.expect(0, 2)?;
    let (hy, y) = read_record(r)?;
    hy.expect(1, 2)?;
    Ok((x, y))
}

/// Append two EC points as one four-record composite.
pub fn put_point_pair(
    w: &mut Writer<'_>,
    bits: usize,
    first: (&[u8], &[u8]),
    second: (&[u8], &[u8]),
) -> WireResult<()> {
    put_bigint(w, bits, 0, 4, first.0)?;
    put_bigint(w, bits, 1, 4, first.1)?;
    put_bigint(w, bits, 2, 4, second.0)?;
    put_bigint(w, bits, 3, 4, second.1)
}

/// Read a point pair written by [`put_point_pair`].
#[allow(clippy::type_complexity)]
pub fn get_point_pair(r: &mut Reader<'_>) -> WireResult<((Vec<u8>, Vec<u8>), (Vec<u8>, Vec<u8>))> {
    let (h0, x1) = read_record(r)?;
    h0.expect(0, 4)?;
    let (h1, y1) = read_record(r)?;
    h1.expect(1, 4)?;
    let (h2, x2) = read_record(r)?;
    h2.expect(2, 4)?;
    let (h3, y2) = read_record(r)?;
    h3.expect(3, 4)?;
    Ok(((x1, y1), (x2, y2)))
}

/// Append an `(r, s)` signature; same two-record shape as a point.
pub fn put_signature(w: &mut Writer<'_>, bits: usize, sig_r: &[u8], sig_s: &[u8]) -> WireResult<()> {
    put_point(w, bits, sig_r, sig_s)
}

/// Read a signature written by [`put_signature`].
pub fn get_signature(r: &mut Reader<'_>) -> WireResult<(Vec<u8>, Vec<u8>)> {
    get_point(r)
}

/// Curve domain parameters in application form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EccDomainParams {
    /// Curve size in bits.
    pub bits: usize,
    /// Field modulus p.
    pub modulus: Vec<u8>,
    /// Curve coefficient a.
    pub a: Vec<u8>,
    /// Curve coefficient b.
    pub b: Vec<u8>,
    /// Base point order n.
    pub order: Vec<u8>,
    /// Base point x.
    pub base_x: Vec<u8>,
    /// Base point y.
    pub base_y: Vec<u8>,
    /// Cofactor; zero is read as one.
    pub cofactor: u8,
}

/// Append curve domain parameters as a seven-record composite.
pub fn put_ecc_domain(w: &mut Writer<'_>, d: &EccDomainParams) -> WireResult<()> {
    put_bigint(w, d.bits, 0, 7, &d.modulus)?;
    put_bigint(w, d.bits, 1, 7, &d.a)?;
    put_bigint(w, d.bits, 2, 7, &d.b)?;
    put_bigint(w, d.bits, 3, 7, &d.order)?;
    put_bigint(w, d.bits, 4, 7, &d.base_x)?;
    put_bigint(w, d.bits, 5, 7, &d.base_y)?;
    // The cofactor record is width-encoded from its own value.
    let cof = if d.cofactor == 0 { 1 } else { d.cofactor };
    let cof_bits = 8 - cof.leading_zeros() as usize;
    put_bigint(w, cof_bits, 6, 7, &[cof])
}

/// Read curve domain parameters written by [`put_ecc_domain`].
pub fn get_ecc_domain(r: &mut Reader<'_>) -> WireResult<EccDomainParams> {
    let (h, modulus) = read_record(r)?;
    h.expect(0, 7)?;
    let bits = h.bits as usize;
    let (h, a) = read_record(r)?;
    h.expect(1, 7)?;
    let (h, b) = read_record(r)?;
    h.expect(2, 7)?;
    let (h, order) = read_record(r)?;
    h.expect(3, 7)?;
    let (h, base_x) = read_record(r)?;
    h.expect(4, 7)?;
    let (h, base_y) = read_record(r)?;
    h.expect(5, 7)?;
    let (h, cof) = read_record(r)?;
    h.expect(6, 7)?;
    Ok(EccDomainParams {
        bits,
        modulus,
        a,
        b,
        order,
        base_x,
        base_y,
        cofactor: cof.last().copied().unwrap_or(1),
    })
}

/// Discrete-log domain parameters in application form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DlDomainParams {
    /// Prime modulus size in bits.
    pub prime_bits: usize,
    /// Subgroup order size in bits.
    pub divisor_bits: usize,
    /// Prime modulus p.
    pub prime: Vec<u8>,
    /// Subgroup order q.
    pub divisor: Vec<u8>,
    /// Generator g.
    pub generator: Vec<u8>,
}

/// Append discrete-log domain parameters as a three-record composite.
pub fn put_dl_domain(w: &mut Writer<'_>, d: &DlDomainParams) -> WireResult<()> {
    put_bigint(w, d.prime_bits, 0, 3, &d.prime)?;
    put_bigint(w, d.divisor_bits, 1, 3, &d.divisor)?;
    put_bigint(w, d.prime_bits, 2, 3, &d.generator)
}

/// Read discrete-log domain parameters written by [`put_dl_domain`].
pub fn get_dl_domain(r: &mut Reader<'_>) -> WireResult<DlDomainParams> {
    let (hp, prime) = read_record(r)?;
    hp.expect(0, 3)?;
    let (hq, divisor) = read_record(r)?;
    hq.expect(1, 3)?;
    let (hg, generator) = read_record(r)?;
    hg.expect(2, 3)?;
    Ok(DlDomainParams {
        prime_bits: hp.bits as usize,
        divisor_bits: hq.bits as usize,
        prime,
        divisor,
        generator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_formulas() {
        // 255 bits and 256 bits both occupy 32 value bytes.
        assert_eq!(byte_len(255), 32);
        assert_eq!(vector_len(255), 36);
        assert_eq!(vector_len(256), 36);
        // P-521: 66 bytes pad to 68.
        assert_eq!(byte_len(521), 66);
        assert_eq!(word_len(521), 68);
        assert_eq!(vector_len(521), 72);
        // A single bit still takes a full word.
        assert_eq!(vector_len(1), 8);
        assert_eq!(vector_len(2048), 260);
        assert_eq!(ecc_domain_len(256), 6 * 36 + 8);
        assert_eq!(dl_domain_len(2048, 256), 2 * 260 + 36);
    }

    #[test]
    fn bigint_round_trip_unaligned_width() {
        // 161 bits: 21 value bytes, padded to 24.
        let value: Vec<u8> = (1..=21).collect();
        let mut buf = vec![0u8; vector_len(161)];
        let mut w = Writer::new(&mut buf);
        put_bigint(&mut w, 161, 0, 1, &value).unwrap();
        assert_eq!(w.position(), vector_len(161));

        let mut r = Reader::new(&buf);
        let mut dest = [0u8; 21];
        let (h, n) = get_bigint(&mut r, &mut dest).unwrap();
        assert_eq!(h.bits, 161);
        assert_eq!(n, 21);
        assert_eq!(&dest[..], &value[..]);
    }

    #[test]
    fn bigint_layout_is_reversed_and_padded() {
        let mut buf = vec![0u8; vector_len(24)];
        let mut w = Writer::new(&mut buf);
        put_bigint(&mut w, 24, 2, 4, &[0xaa, 0xbb, 0xcc]).unwrap();
        // bits=24 LE, index 2 of 4, then cc bb aa and one pad byte.
        assert_eq!(buf, [24, 0, 2, 4, 0xcc, 0xbb, 0xaa, 0x00]);
    }

    #[test]
    fn oversized_value_keeps_least_significant_bytes() {
        let mut buf = vec![0u8; vector_len(8)];
        let mut w = Writer::new(&mut buf);
        put_bigint(&mut w, 8, 0, 1, &[0xde, 0xad, 0x42]).unwrap();

        let mut r = Reader::new(&buf);
        let mut dest = [0u8; 1];
        let (_, n) = get_bigint(&mut r, &mut dest).unwrap();
        assert_eq!((n, dest[0]), (1, 0x42));
    }

    #[test]
    fn narrow_destination_truncates_on_read() {
        let mut buf = vec![0u8; vector_len(32)];
        let mut w = Writer::new(&mut buf);
        put_bigint(&mut w, 32, 0, 1, &[0x01, 0x02, 0x03, 0x04]).unwrap();

        let mut r = Reader::new(&buf);
        let mut dest = [0u8; 2];
        let (_, n) = get_bigint(&mut r, &mut dest).unwrap();
        assert_eq!(n, 2);
        assert_eq!(dest, [0x03, 0x04]);
    }

    #[test]
    fn point_pair_round_trip() {
        let bits = 255;
        let x1 = vec![0x11; 32];
        let y1 = vec![0x22; 32];
        let x2 = vec![0x33; 32];
        let y2 = vec![0x44; 32];
        let mut buf = vec![0u8; 4 * vector_len(bits)];
        let mut w = Writer::new(&mut buf);
        put_point_pair(&mut w, bits, (&x1, &y1), (&x2, &y2)).unwrap();

        let mut r = Reader::new(&buf);
        let (p1, p2) = get_point_pair(&mut r).unwrap();
        assert_eq!(p1, (x1, y1));
        assert_eq!(p2, (x2, y2));
    }

    #[test]
    fn point_rejects_signature_style_header() {
        let mut buf = vec![0u8; vector_len(16)];
        let mut w = Writer::new(&mut buf);
        put_bigint(&mut w, 16, 0, 1, &[0x12, 0x34]).unwrap();

        let mut r = Reader::new(&buf);
        let err = get_point(&mut r).unwrap_err();
        assert_eq!(
            err,
            WireError::HeaderMismatch {
                index: 0,
                count: 1,
                expect_index: 0,
                expect_count: 2,
            }
        );
    }

    #[test]
    fn ecc_domain_round_trip_normalizes_cofactor() {
        let d = EccDomainParams {
            bits: 192,
            modulus: vec![0xff; 24],
            a: vec![0x01; 24],
            b: vec![0x02; 24],
            order: vec![0xfe; 24],
            base_x: vec![0x03; 24],
            base_y: vec![0x04; 24],
            cofactor: 0,
        };
        let mut buf = vec![0u8; ecc_domain_len(192)];
        let mut w = Writer::new(&mut buf);
        put_ecc_domain(&mut w, &d).unwrap();
        assert_eq!(w.position(), ecc_domain_len(192));

        let mut r = Reader::new(&buf);
        let back = get_ecc_domain(&mut r).unwrap();
        assert_eq!(back.cofactor, 1);
        assert_eq!(back.modulus, d.modulus);
        assert_eq!(back.base_y, d.base_y);
        assert_eq!(back.bits, 192);
    }

    #[test]
    fn dl_domain_round_trip_keeps_split_widths() {
        let d = DlDomainParams {
            prime_bits: 2048,
            divisor_bits: 256,
            prime: vec![0xaa; 256],
            divisor: vec![0xbb; 32],
            generator: vec![0x02],
        };
        let mut buf = vec![0u8; dl_domain_len(2048, 256)];
        let mut w = Writer::new(&mut buf);
        put_dl_domain(&mut w, &d).unwrap();
        assert_eq!(w.position(), dl_domain_len(2048, 256));

        let mut r = Reader::new(&buf);
        let back = get_dl_domain(&mut r).unwrap();
        assert_eq!(back.prime_bits, 2048);
        assert_eq!(back.divisor_bits, 256);
        assert_eq!(back.prime, d.prime);
        // The generator reads back zero-extended to the prime width.
        assert_eq!(back.generator.len(), 256);
        assert_eq!(back.generator[255], 0x02);
        assert!(back.generator[..255].iter().all(|b| *b == 0));
    }
}
