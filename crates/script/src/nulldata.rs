//! Data-carrier (`OP_RETURN`) outputs.

use bitcoin::{
    Script, ScriptBuf,
    opcodes::all::OP_RETURN,
    script::{Instruction, PushBytesBuf},
};

use crate::errors::ScriptError;

/// Largest payload a data-carrier output may hold.
pub const MAX_NULL_DATA_PAYLOAD: usize = 80;

/// Builds `OP_RETURN <payload>`.
pub fn null_data_script(payload: &[u8]) -> Result<ScriptBuf, ScriptError> {
    if payload.len() > MAX_NULL_DATA_PAYLOAD {
        return Err(ScriptError::PayloadTooLarge(payload.len()));
    }
    let push = PushBytesBuf::try_from(payload.to_vec())
        .map_err(|_| ScriptError::PayloadTooLarge(payload.len()))?;
    Ok(ScriptBuf::new_op_return(push))
}

/// Extracts the payload of a data-carrier script.
///
/// Accepts a bare `OP_RETURN` (empty payload) or `OP_RETURN` followed by
/// exactly one data push of at most [`MAX_NULL_DATA_PAYLOAD`] bytes.
pub fn null_data_payload(script: &Script) -> Option<&[u8]> {
    let (first, rest) = script.as_bytes().split_first()?;
    if *first != OP_RETURN.to_u8() {
        return None;
    }

    let mut instructions = Script::from_bytes(rest).instructions();
    match (instructions.next(), instructions.next()) {
        (None, _) => Some(&rest[..0]),
        (Some(Ok(Instruction::PushBytes(push))), None)
            if push.len() <= MAX_NULL_DATA_PAYLOAD =>
        {
            Some(push.as_bytes())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_extraction() {
        let script = null_data_script(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(null_data_payload(&script), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
    }

    #[test]
    fn test_empty_payload_forms() {
        let pushed_empty = null_data_script(&[]).unwrap();
        assert_eq!(null_data_payload(&pushed_empty), Some(&[][..]));

        let bare = Script::from_bytes(&[0x6a]);
        assert_eq!(null_data_payload(bare), Some(&[][..]));
    }

    #[test]
    fn test_rejects_non_nulldata() {
        assert_eq!(null_data_payload(Script::from_bytes(&[0x00, 0xbb])), None);
        assert_eq!(null_data_payload(Script::from_bytes(&[])), None);
        // Two pushes after OP_RETURN.
        assert_eq!(
            null_data_payload(Script::from_bytes(&[0x6a, 0x01, 0xaa, 0x01, 0xbb])),
            None
        );
        // Truncated push.
        assert_eq!(null_data_payload(Script::from_bytes(&[0x6a, 0x05, 0xaa])), None);
    }

    #[test]
    fn test_payload_limit() {
        assert!(null_data_script(&[0u8; MAX_NULL_DATA_PAYLOAD]).is_ok());
        assert_eq!(
            null_data_script(&[0u8; MAX_NULL_DATA_PAYLOAD + 1]),
            Err(ScriptError::PayloadTooLarge(81))
        );
    }
}
