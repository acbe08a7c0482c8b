use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MuError, MuResult};
use crate::eval::Machine;
use crate::value::Value;

/// A host-supplied system operation. Receives the machine, the
/// unevaluated operand expression, and the call-site environment; it
/// may re-enter the evaluator through the machine.
pub type SysHandler = Arc<dyn Fn(&mut Machine, Value, Value) -> MuResult<Value>>;

/// Sparse map from system opcodes to handlers. Opcodes are handed out
/// sequentially from 1 and never reused; opcode 0 is the directory
/// operation the machine answers itself.
pub struct SysOpTable {
    handlers: HashMap<u16, SysHandler>,
    next_opcode: u16,
}

impl SysOpTable {
    pub fn new() -> Self {
        SysOpTable {
            handlers: HashMap::new(),
            next_opcode: 1,
        }
    }

    /// Store a handler under a fresh opcode.
    pub fn insert(&mut self, handler: SysHandler) -> MuResult<u16> {
        if self.next_opcode == u16::MAX {
            return Err(MuError::SysOpsExhausted);
        }
        let opcode = self.next_opcode;
        self.next_opcode += 1;
        self.handlers.insert(opcode, handler);
        Ok(opcode)
    }

    /// Clone the handler out of the table, so invoking it holds no
    /// borrow while it re-enters the machine.
    pub fn get(&self, opcode: u16) -> Option<SysHandler> {
        self.handlers.get(&opcode).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for SysOpTable {
    fn default() -> Self {
        SysOpTable::new()
    }
}
