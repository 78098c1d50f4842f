//! The cipher applied to programs saved with `SAVE "name",P`.

const KEY1: [u8; 13] = [
    0xA9, 0x84, 0x8D, 0xCD, 0x75, 0x83, 0x43, 0x63, 0x24, 0x83, 0x19, 0xF7, 0x9A,
];
const KEY2: [u8; 11] = [0x1E, 0x1D, 0xC4, 0x77, 0x26, 0x97, 0xE0, 0x74, 0x59, 0x88, 0x7C];

pub fn unprotect(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &c)| {
            let c = c.wrapping_sub(11 - (i % 11) as u8);
            let c = c ^ KEY1[i % 13] ^ KEY2[i % 11];
            c.wrapping_add(13 - (i % 13) as u8)
        })
        .collect()
}

pub fn protect(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &c)| {
            let c = c.wrapping_sub(13 - (i % 13) as u8);
            let c = c ^ KEY1[i % 13] ^ KEY2[i % 11];
            c.wrapping_add(11 - (i % 11) as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse() {
        let data: Vec<u8> = (0..=255).chain(0..200).collect();
        assert_eq!(unprotect(&protect(&data)), data);
        assert_ne!(protect(&data), data);
    }

    #[test]
    fn test_first_byte() {
        // 0 - 11 = 0xF5, ^ 0xA9 ^ 0x1E = 0x42, + 13 = 0x4F
        assert_eq!(unprotect(&[0]), vec![0x4F]);
    }
}
