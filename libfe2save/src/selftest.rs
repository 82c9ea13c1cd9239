use crate::error::SelfTestError;

/// Compare one pipeline phase against a ground-truth buffer. The first
/// differing byte aborts the whole self-test; `input` is the buffer the
/// phase consumed, reported alongside the produced and expected bytes.
pub fn verify_phase(
    phase: &'static str,
    input: &[u8],
    produced: &[u8],
    expected: &[u8],
) -> Result<(), SelfTestError> {
    let common = produced.len().min(expected.len());
    for offset in 0..common {
        if produced[offset] != expected[offset] {
            return Err(SelfTestError::Mismatch {
                phase,
                input_offset: offset.min(input.len().saturating_sub(1)),
                input_byte: input.get(offset).copied().unwrap_or(0),
                output_offset: offset,
                actual: produced[offset],
                expected: expected[offset],
            });
        }
    }

    if produced.len() != expected.len() {
        return Err(SelfTestError::LengthMismatch {
            phase,
            actual: produced.len(),
            expected: expected.len(),
        });
    }

    Ok(())
}
