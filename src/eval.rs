use crate::env;
use crate::error::{MuError, MuResult};
use crate::heap::Heap;
use crate::primitives;
use crate::reader::Reader;
use crate::symbol::SymbolTable;
use crate::sysop::{SysHandler, SysOpTable};
use crate::value::Value;

// Builtin indices with evaluation behavior of their own; the eager
// group 3..=14 goes through primitives::call_builtin.
const BI_QUOTE: i32 = 0;
const BI_TRUE: i32 = 1;
const BI_FALSE: i32 = 2;
const BI_ENV: i32 = 15;
const BI_SYS: i32 = 16;

/// The mu_ evaluation machine. All interpreter state lives here so the
/// collector can find roots and system operations can re-enter.
pub struct Machine {
    pub heap: Heap,
    pub symbols: SymbolTable,
    pub sys_ops: SysOpTable,
}

impl Machine {
    pub fn new(heap_cells: usize) -> Self {
        Machine {
            heap: Heap::new(heap_cells),
            symbols: SymbolTable::new(),
            sys_ops: SysOpTable::new(),
        }
    }

    // ========================================================================
    // Core evaluation
    // ========================================================================

    /// Evaluate an expression in an environment, collecting every
    /// intermediate cell back to `anchor` before returning. The anchor
    /// is normally the current `cons_top`, taken after the expression
    /// and environment were built; references above it are invalid
    /// after this returns, except through the returned value.
    pub fn eval(&mut self, expr: Value, env: Value, anchor: u32) -> MuResult<Value> {
        let result = self.eval_tail(expr, env, anchor)?;
        self.heap.collect(result, anchor)
    }

    /// The trampoline. Lazy builtins and receiver bodies continue the
    /// loop instead of recursing, so mu_ tail calls run in constant
    /// host stack and, thanks to the mid-loop collection, constant
    /// heap.
    fn eval_tail(&mut self, expr: Value, env: Value, anchor: u32) -> MuResult<Value> {
        let mut expr = expr;
        let mut env = env;
        loop {
            if expr.is_nil() {
                return Ok(Value::NIL);
            }
            if expr.is_atom() {
                return Ok(env::lookup(expr, env, &self.heap));
            }

            // An application: the evaluated head is the receiver, the
            // unevaluated tail its arguments.
            let head = self.heap.head(expr);
            let args = self.heap.tail(expr);
            let receiver = {
                let fresh = self.heap.anchor();
                self.eval(head, env, fresh)?
            };
            log::trace!("apply {:?} to {:?}", receiver, args);

            if !receiver.is_cons() {
                match receiver.builtin_index() {
                    BI_QUOTE => return Ok(self.heap.head_val(args)),
                    BI_TRUE => {
                        expr = self.heap.head_val(args);
                        continue;
                    }
                    BI_FALSE => {
                        expr = self.heap.head_val(self.heap.tail_val(args));
                        continue;
                    }
                    BI_ENV => return Ok(env),
                    BI_SYS => return self.apply_sys(args, env),
                    index if (3..=14).contains(&index) => {
                        let first = self.heap.head_val(args);
                        let a = {
                            let fresh = self.heap.anchor();
                            self.eval(first, env, fresh)?
                        };
                        let b = if primitives::takes_second(index) {
                            let second = self.heap.head_val(self.heap.tail_val(args));
                            let fresh = self.heap.anchor();
                            self.eval(second, env, fresh)?
                        } else {
                            Value::NIL
                        };
                        return primitives::call_builtin(index, a, b, &mut self.heap);
                    }
                    _ => return Ok(Value::NIL),
                }
            }

            // A user receiver: (pattern . (body . rest)). With a nil
            // rest the arguments pass unevaluated and the call-site
            // environment is used; otherwise the arguments are
            // evaluated and rest carries the captured environment.
            let pattern = self.heap.head(receiver);
            let body = self.heap.head_val(self.heap.tail(receiver));
            let rest = self.heap.tail_val(self.heap.tail(receiver));

            let mut call_env = env;
            let mut argv = args;
            if !rest.is_nil() {
                argv = self.eval_args(args, env)?;
                call_env = self.heap.head_val(rest);
            }

            let bound = env::match_pattern(argv, pattern, call_env, &mut self.heap)?;

            // Compact the pending work so the tail loop cannot grow the
            // heap across iterations.
            let bundle = self.heap.cons(bound, body)?;
            let bundle = self.heap.collect(bundle, anchor)?;
            env = self.heap.head(bundle);
            expr = self.heap.tail(bundle);
        }
    }

    /// Evaluate each element of an argument list under the caller's
    /// environment. A non-cons terminator is carried through unchanged.
    fn eval_args(&mut self, args: Value, env: Value) -> MuResult<Value> {
        let mut values = Vec::new();
        let mut current = args;
        while current.is_cons() {
            let element = self.heap.head(current);
            current = self.heap.tail(current);
            let fresh = self.heap.anchor();
            values.push(self.eval(element, env, fresh)?);
        }
        self.heap.list(&values, current)
    }

    // ========================================================================
    // System operations
    // ========================================================================

    /// `(~~sys name arg)`: both operands arrive unevaluated. The name's
    /// internment record holds the opcode; opcode 0, which unnamed and
    /// unregistered names resolve to, is the directory operation.
    fn apply_sys(&mut self, args: Value, env: Value) -> MuResult<Value> {
        let name = self.heap.head_val(args);
        let operand = self.heap.head_val(self.heap.tail_val(args));
        let opcode = self.symbols.sys_opcode(name);
        if opcode == 0 {
            return self.sys_directory();
        }
        match self.sys_ops.get(opcode) {
            Some(handler) => (*handler)(self, operand, env),
            None => Ok(Value::NIL),
        }
    }

    /// The association list from every registered operation's name atom
    /// to its opcode value.
    fn sys_directory(&mut self) -> MuResult<Value> {
        let mut listing = Value::NIL;
        for index in (0..self.symbols.records().len()).rev() {
            let opcode = self.symbols.records()[index].sys_opcode;
            if opcode != 0 {
                let entry = self
                    .heap
                    .cons(Value::named(index as u32), Value::from_raw(opcode as i32))?;
                listing = self.heap.cons(entry, listing)?;
            }
        }
        Ok(listing)
    }

    /// Bind a fresh opcode to `handler` and record it in the name's
    /// internment record. The name must be an interned atom.
    pub fn register_system_operation(
        &mut self,
        name: Value,
        handler: SysHandler,
    ) -> MuResult<u16> {
        if self.symbols.lookup_interned(name).is_none() {
            return Err(MuError::NotInterned);
        }
        let opcode = self.sys_ops.insert(handler)?;
        self.symbols.set_sys_opcode(name, opcode);
        log::debug!("registered system operation {:?} as opcode {}", name, opcode);
        Ok(opcode)
    }

    // ========================================================================
    // Embedder conveniences
    // ========================================================================

    /// Copy a source string into the yard, returning its region.
    pub fn load_str(&mut self, source: &str) -> MuResult<(u32, u32)> {
        let offset = self.symbols.yard_alloc(source.len() as u32)?;
        self.symbols.yard_write(offset, source.as_bytes());
        Ok((offset, source.len() as u32))
    }

    /// Parse and evaluate every expression of a source string in the
    /// empty environment, returning the last value (nil for empty
    /// input).
    pub fn run(&mut self, source: &str) -> MuResult<Value> {
        let (offset, length) = self.load_str(source)?;
        let end = offset + length;
        let mut pos = offset;
        let mut result = Value::NIL;
        loop {
            let mut reader = Reader::new(&mut self.heap, &mut self.symbols, pos, end - pos);
            let parsed = reader.read()?;
            pos = reader.position();
            match parsed {
                Some(expr) => {
                    let anchor = self.heap.anchor();
                    result = self.eval(expr, Value::NIL, anchor)?;
                }
                None => return Ok(result),
            }
        }
    }
}
