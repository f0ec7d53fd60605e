//! Thread continuation scripts: `<thread index> OP_CHECKTHREAD`.

use bitcoin::{Script, ScriptBuf};
use keystone_primitives::ThreadId;

/// Opcode marking a thread continuation output.
pub const OP_CHECKTHREAD: u8 = 0xbb;

// Small-number push opcodes for the thread index.
const THREAD_INDEX_OPS: [u8; 3] = [0x00, 0x51, 0x52];

/// Builds the continuation script for `thread`.
pub fn thread_script(thread: ThreadId) -> ScriptBuf {
    ScriptBuf::from_bytes(vec![
        THREAD_INDEX_OPS[thread.index() as usize],
        OP_CHECKTHREAD,
    ])
}

/// Returns the thread a continuation script belongs to, if it is one.
pub fn parse_thread_script(script: &Script) -> Option<ThreadId> {
    match script.as_bytes() {
        [op, OP_CHECKTHREAD] => THREAD_INDEX_OPS
            .iter()
            .position(|o| o == op)
            .and_then(|idx| ThreadId::from_index(idx as u8)),
        _ => None,
    }
}
