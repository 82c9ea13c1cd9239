use byteorder::{BigEndian, ByteOrder};

use crate::error::CipherError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Decrypt,
    Encrypt,
}

/// Transform `src` with the rolling XOR cipher and return the output
/// together with the final key.
///
/// The key stream depends on the plaintext, so this is not a stateless
/// XOR: each 16-bit word is masked with the low half of the running key,
/// then the plaintext word (just produced when decrypting, already in
/// hand when encrypting) is sign-extended, added to the key, and the key
/// is rotated left by one bit. The final key doubles as the file footer.
pub fn crypt(src: &[u8], key: u32, direction: Direction) -> Result<(Vec<u8>, u32), CipherError> {
    if src.len() % 2 != 0 {
        return Err(CipherError::OddLength {
            received: src.len(),
        });
    }

    let mut output = vec![0u8; src.len()];
    let mut key = key;

    for (chunk, out) in src.chunks_exact(2).zip(output.chunks_exact_mut(2)) {
        let word = BigEndian::read_u16(chunk);
        let emitted = word ^ (key & 0xffff) as u16;
        BigEndian::write_u16(out, emitted);

        let plain = match direction {
            Direction::Decrypt => emitted,
            Direction::Encrypt => word,
        };

        // Widen as a signed 16-bit value, the way the original 68k code
        // extends the word before the 32-bit add.
        key = key.wrapping_add(plain as i16 as u32);
        key = key.rotate_left(1);
    }

    Ok((output, key))
}
