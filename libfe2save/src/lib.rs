/// Magic value at the start of every savegame file
pub const SAVE_MAGIC: u16 = 0x0011;
/// Seed for the rolling XOR cipher (hardcoded in the game binary)
pub const CIPHER_KEY: u32 = 0x12350fd4;

pub mod cipher;
pub mod container;
pub mod error;
pub mod selftest;
pub mod squish;
pub mod state;
pub mod tables;
