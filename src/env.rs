use crate::error::MuResult;
use crate::heap::Heap;
use crate::value::Value;

/// Look up a symbol in an environment (a nil-terminated list of
/// `(symbol . value)` bindings). First match wins. An unbound symbol
/// evaluates to itself, so the symbol is returned when nothing matches.
pub fn lookup(sym: Value, env: Value, heap: &Heap) -> Value {
    let mut current = env;
    while current.is_cons() {
        let binding = heap.head(current);
        if binding.is_cons() && heap.head(binding) == sym {
            return heap.tail(binding);
        }
        current = heap.tail(current);
    }
    sym
}

/// Prepend a binding to an environment.
pub fn bind(sym: Value, val: Value, env: Value, heap: &mut Heap) -> MuResult<Value> {
    let binding = heap.cons(sym, val)?;
    heap.cons(binding, env)
}

/// Match a value against a pattern, extending `env` with the bindings.
///
/// A nil pattern binds nothing and checks nothing; an atom pattern
/// binds the whole value to that symbol; a cons pattern destructures,
/// head then tail. Matching never rejects: a non-cons value under a
/// cons pattern deconstructs to nil on both sides, per the primitives'
/// leniency.
pub fn match_pattern(value: Value, pattern: Value, env: Value, heap: &mut Heap) -> MuResult<Value> {
    let mut value = value;
    let mut pattern = pattern;
    let mut env = env;
    loop {
        if pattern.is_nil() {
            return Ok(env);
        }
        if pattern.is_atom() {
            return bind(pattern, value, env, heap);
        }
        let pattern_head = heap.head(pattern);
        let pattern_tail = heap.tail(pattern);
        let value_head = heap.head_val(value);
        let value_tail = heap.tail_val(value);
        env = match_pattern(value_head, pattern_head, env, heap)?;
        value = value_tail;
        pattern = pattern_tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(n: i32) -> Value {
        Value::from_raw(n)
    }

    #[test]
    fn lookup_finds_first_binding() {
        let mut heap = Heap::new(64);
        let x = atom(100);
        let env = bind(x, atom(1), Value::NIL, &mut heap).unwrap();
        let env = bind(x, atom(2), env, &mut heap).unwrap();
        assert_eq!(lookup(x, env, &heap), atom(2));
    }

    #[test]
    fn unbound_symbols_evaluate_to_themselves() {
        let mut heap = Heap::new(64);
        let x = atom(100);
        let y = atom(200);
        let env = bind(x, atom(1), Value::NIL, &mut heap).unwrap();
        assert_eq!(lookup(y, env, &heap), y);
        assert_eq!(lookup(y, Value::NIL, &heap), y);
    }

    #[test]
    fn atom_pattern_binds_the_whole_value() {
        let mut heap = Heap::new(64);
        let pattern = atom(100);
        let value = heap.cons(atom(1), atom(2)).unwrap();
        let env = match_pattern(value, pattern, Value::NIL, &mut heap).unwrap();
        assert_eq!(lookup(pattern, env, &heap), value);
    }

    #[test]
    fn nil_pattern_binds_nothing() {
        let mut heap = Heap::new(64);
        let env = bind(atom(100), atom(1), Value::NIL, &mut heap).unwrap();
        let extended = match_pattern(atom(5), Value::NIL, env, &mut heap).unwrap();
        assert_eq!(extended, env);
    }

    #[test]
    fn cons_pattern_destructures() {
        let mut heap = Heap::new(64);
        let x = atom(100);
        let y = atom(200);
        // pattern (x y), value (3 4)
        let pattern = heap.list(&[x, y], Value::NIL).unwrap();
        let value = heap.list(&[atom(3), atom(4)], Value::NIL).unwrap();
        let env = match_pattern(value, pattern, Value::NIL, &mut heap).unwrap();
        assert_eq!(lookup(x, env, &heap), atom(3));
        assert_eq!(lookup(y, env, &heap), atom(4));
    }

    #[test]
    fn mismatched_shapes_never_reject() {
        let mut heap = Heap::new(64);
        let x = atom(100);
        let y = atom(200);
        let pattern = heap.list(&[x, y], Value::NIL).unwrap();
        // an atom under a cons pattern deconstructs to nil on both sides
        let env = match_pattern(atom(7), pattern, Value::NIL, &mut heap).unwrap();
        assert_eq!(lookup(x, env, &heap), Value::NIL);
        assert_eq!(lookup(y, env, &heap), Value::NIL);
    }
}
