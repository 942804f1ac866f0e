//! Opcode dispatch table.

use crate::instructions::Op;

/// Handler for every opcode byte, built at compile time.
pub static INSTRUCTION_TABLE: [Op; 256] = build();

const fn build() -> [Op; 256] {
    let mut table = [Op::Nop; 256];
    let mut opcode = 0;
    while opcode < table.len() {
        table[opcode] = Op::decode(opcode as u8);
        opcode += 1;
    }
    table
}

/// Look up the handler for an opcode.
#[must_use]
pub fn dispatch(opcode: u8) -> &'static Op {
    &INSTRUCTION_TABLE[opcode as usize]
}
