use byteorder::{BigEndian, ByteOrder};
use log::warn;

use crate::cipher::{self, Direction};
use crate::error::ContainerError;
use crate::squish;
use crate::{CIPHER_KEY, SAVE_MAGIC};

/// Bytes taken by the magic and the footer together.
pub const ENVELOPE_LEN: usize = 6;

/// Findings from decoding one file.
///
/// None of these stop decoding: the tool is a recovery aid, and a save
/// with a bad magic or footer is still worth opening.
#[derive(Copy, Clone, Debug)]
pub struct IntegrityReport {
    /// Magic read from the file (expected [`SAVE_MAGIC`]).
    pub magic: u16,
    /// Footer stored in the last four bytes of the file.
    pub footer_stored: u32,
    /// Final cipher key computed over the ciphertext.
    pub footer_computed: u32,
    /// The interior had odd length and its trailing byte was dropped.
    pub odd_ciphertext: bool,
}

impl IntegrityReport {
    pub fn magic_ok(&self) -> bool {
        self.magic == SAVE_MAGIC
    }

    pub fn footer_ok(&self) -> bool {
        self.footer_stored == self.footer_computed
    }

    pub fn clean(&self) -> bool {
        self.magic_ok() && self.footer_ok() && !self.odd_ciphertext
    }
}

/// One decoded savegame: the decrypted-but-still-squished interior, the
/// expanded memory image, and the integrity findings.
#[derive(Clone, Debug)]
pub struct SaveGame {
    pub compressed: Vec<u8>,
    pub image: Vec<u8>,
    pub report: IntegrityReport,
}

/// One encoded savegame, with the intermediate squished buffer kept for
/// phase-by-phase self-testing.
#[derive(Clone, Debug)]
pub struct EncodedSave {
    pub compressed: Vec<u8>,
    pub file: Vec<u8>,
}

/// Unwrap a savegame file into its raw memory image.
pub fn decode(file: &[u8]) -> Result<SaveGame, ContainerError> {
    if file.len() < ENVELOPE_LEN {
        return Err(ContainerError::FileTooSmall {
            expected: ENVELOPE_LEN,
            received: file.len(),
        });
    }

    let magic = BigEndian::read_u16(&file[0..2]);
    if magic != SAVE_MAGIC {
        warn!("incorrect magic {magic:#06x} for a savegame, continuing anyway");
    }

    let mut interior = &file[2..file.len() - 4];
    let odd_ciphertext = interior.len() % 2 != 0;
    if odd_ciphertext {
        warn!(
            "ciphertext length {} is odd, dropping the trailing byte",
            interior.len()
        );
        interior = &interior[..interior.len() - 1];
    }

    let (compressed, footer_computed) = cipher::crypt(interior, CIPHER_KEY, Direction::Decrypt)?;

    let footer_stored = BigEndian::read_u32(&file[file.len() - 4..]);
    if footer_stored != footer_computed {
        warn!("incorrect footer: computed {footer_computed:#010x}, stored {footer_stored:#010x}");
    }

    let image = squish::unsquish(&compressed);

    Ok(SaveGame {
        compressed,
        image,
        report: IntegrityReport {
            magic,
            footer_stored,
            footer_computed,
            odd_ciphertext,
        },
    })
}

/// Wrap a raw memory image into a savegame file.
pub fn encode(image: &[u8]) -> Result<EncodedSave, ContainerError> {
    let compressed = squish::squish(image);
    let (ciphertext, key) = cipher::crypt(&compressed, CIPHER_KEY, Direction::Encrypt)?;

    let mut file = Vec::with_capacity(ciphertext.len() + ENVELOPE_LEN);
    file.extend_from_slice(&SAVE_MAGIC.to_be_bytes());
    file.extend_from_slice(&ciphertext);
    file.extend_from_slice(&key.to_be_bytes());

    Ok(EncodedSave { compressed, file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squish::IMAGE_LEN;

    fn synthetic_image() -> Vec<u8> {
        let mut image: Vec<u8> = (0..IMAGE_LEN)
            .map(|i| ((i * 11 + 5) % 249 + 1) as u8)
            .collect();
        image[0x300..0x340].fill(0);
        image[0x8800..0x8880].fill(0);
        image
    }

    #[test]
    fn encode_decode_roundtrip() {
        let image = synthetic_image();
        let encoded = encode(&image).unwrap();
        let decoded = decode(&encoded.file).unwrap();

        assert_eq!(decoded.image, image);
        assert_eq!(decoded.compressed, encoded.compressed);
        assert!(decoded.report.clean());
    }

    #[test]
    fn bad_magic_is_reported_but_not_fatal() {
        let image = synthetic_image();
        let mut file = encode(&image).unwrap().file;
        file[1] = 0x12;

        let decoded = decode(&file).unwrap();
        assert!(!decoded.report.magic_ok());
        assert!(decoded.report.footer_ok());
        assert_eq!(decoded.image, image);
    }

    #[test]
    fn bad_footer_is_reported_but_not_fatal() {
        let image = synthetic_image();
        let mut file = encode(&image).unwrap().file;
        let last = file.len() - 1;
        file[last] ^= 0xff;

        let decoded = decode(&file).unwrap();
        assert!(!decoded.report.footer_ok());
        assert!(decoded.report.magic_ok());
        assert_eq!(decoded.image, image);
    }

    #[test]
    fn odd_interior_is_truncated_and_reported() {
        let image = synthetic_image();
        let encoded = encode(&image).unwrap();

        // Splice a stray byte between ciphertext and footer.
        let mut file = encoded.file;
        file.insert(file.len() - 4, 0xaa);

        let decoded = decode(&file).unwrap();
        assert!(decoded.report.odd_ciphertext);
        assert!(decoded.report.footer_ok());
        assert_eq!(decoded.image, image);
    }

    #[test]
    fn undersized_file_is_a_hard_error() {
        let err = decode(&[0x00, 0x11, 0x01]).unwrap_err();
        assert!(matches!(err, ContainerError::FileTooSmall { received: 3, .. }));
    }

    #[test]
    fn full_pipeline_preserves_state() {
        use crate::state;

        let mut image = synthetic_image();
        let base = state::SLOT_BASE + 4 * state::SLOT_STRIDE;
        image[base] = 9;
        image[base + 0x3a..base + 0x3a + 6].copy_from_slice(b"Krait\0");

        let encoded = encode(&image).unwrap();
        let decoded = decode(&encoded.file).unwrap();
        let game = state::decode(&decoded.image).unwrap();

        let record = game.objects[4].as_ref().unwrap();
        assert_eq!(record.type_id, 9);
        assert_eq!(record.name.as_deref(), Some("Krait"));
    }

    #[test]
    fn envelope_layout() {
        let image = synthetic_image();
        let file = encode(&image).unwrap().file;

        assert_eq!(&file[0..2], &[0x00, 0x11]);
        assert_eq!(file.len() % 2, 0);

        let (_, key) = cipher::crypt(
            &file[2..file.len() - 4],
            CIPHER_KEY,
            Direction::Decrypt,
        )
        .unwrap();
        assert_eq!(BigEndian::read_u32(&file[file.len() - 4..]), key);
    }
}
