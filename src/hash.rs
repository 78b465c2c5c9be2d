#![allow(clippy::many_single_char_names)]

/// murmurhash2 over UTF-16 code units, rendered in base36. Matches the output of
/// `@emotion/hash`, which starts from a zero state instead of mixing in a seed.
pub fn hash_string(input: &str) -> String {
    let units: Vec<u16> = input.encode_utf16().collect();
    to_base36(murmur2(&units))
}

fn murmur2(units: &[u16]) -> u32 {
    let mut len = units.len();
    let mut h: u32 = 0;
    let mut index = 0usize;

    while len >= 4 {
        let mut k = (units[index] as u32 & 0xff)
            | (((units[index + 1] as u32) & 0xff) << 8)
            | (((units[index + 2] as u32) & 0xff) << 16)
            | (((units[index + 3] as u32) & 0xff) << 24);

        k = mul_mix(k);
        k ^= k >> 24;
        h = mul_mix(k) ^ mul_mix(h);

        index += 4;
        len -= 4;
    }

    match len {
        3 => {
            h ^= ((units[index + 2] as u32) & 0xff) << 16;
            h ^= ((units[index + 1] as u32) & 0xff) << 8;
            h ^= (units[index] as u32) & 0xff;
            h = mul_mix(h);
        }
        2 => {
            h ^= ((units[index + 1] as u32) & 0xff) << 8;
            h ^= (units[index] as u32) & 0xff;
            h = mul_mix(h);
        }
        1 => {
            h ^= (units[index] as u32) & 0xff;
            h = mul_mix(h);
        }
        _ => {}
    }

    h ^= h >> 13;
    h = mul_mix(h);
    h ^ (h >> 15)
}

#[inline]
fn mul_mix(value: u32) -> u32 {
    let low = (value & 0xffff).wrapping_mul(0x5bd1e995);
    let high = ((value >> 16) & 0xffff).wrapping_mul(0xe995);
    low.wrapping_add(high << 16)
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::with_capacity(8);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    out.iter().rev().collect()
}
