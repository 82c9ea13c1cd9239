use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CipherError {
    #[error("cipher input is {received} bytes; the cipher processes 16-bit words and needs an even length")]
    #[diagnostic(code(libfe2save::odd_cipher_input))]
    OddLength { received: usize },
}

#[derive(Error, Diagnostic, Debug)]
pub enum ContainerError {
    #[error("file is too small for a savegame (must be at least {expected} bytes, received {received} bytes)")]
    #[diagnostic(code(libfe2save::file_too_small))]
    FileTooSmall { expected: usize, received: usize },

    #[error(transparent)]
    #[diagnostic(code(libfe2save::cipher_error))]
    Cipher(#[from] CipherError),
}

#[derive(Error, Diagnostic, Debug)]
pub enum StateError {
    #[error("memory image is truncated (state decoding needs {expected} bytes, received {received} bytes)")]
    #[diagnostic(code(libfe2save::truncated_image))]
    TruncatedImage { expected: usize, received: usize },
}

#[derive(Error, Diagnostic, Debug)]
pub enum SelfTestError {
    #[error("{phase} mismatch: input[{input_offset}] = {input_byte:#04x}, output[{output_offset}] = {actual:#04x}, expected {expected:#04x}")]
    #[diagnostic(code(libfe2save::self_test_mismatch))]
    Mismatch {
        phase: &'static str,
        input_offset: usize,
        input_byte: u8,
        output_offset: usize,
        actual: u8,
        expected: u8,
    },

    #[error("{phase} length mismatch: produced {actual} bytes, expected {expected} bytes")]
    #[diagnostic(code(libfe2save::self_test_length))]
    LengthMismatch {
        phase: &'static str,
        actual: usize,
        expected: usize,
    },
}
