use crate::error::MuResult;
use crate::heap::Heap;
use crate::symbol::sym;
use crate::value::Value;

/// Arithmetic in mu_ is over 31-bit modular naturals.
pub const MODULUS_MASK: i32 = 0x7FFF_FFFF;

/// True when builtin `index` evaluates a second argument. Head, tail
/// and not take one; the rest of the eager group take two.
pub fn takes_second(index: i32) -> bool {
    !matches!(index, 3 | 4 | 12)
}

/// Dispatch an eager builtin (indices 3..=14) over its evaluated
/// arguments. Unused argument slots arrive as nil. Indices outside the
/// table produce nil.
pub fn call_builtin(index: i32, a: Value, b: Value, heap: &mut Heap) -> MuResult<Value> {
    Ok(match index {
        3 => heap.head_val(a),
        4 => heap.tail_val(a),
        5 => return heap.cons(a, b),
        6 => boolean(a.raw() <= b.raw()),
        7 => boolean(a == b),
        8 => masked(a.raw().wrapping_add(b.raw())),
        9 => masked(a.raw().wrapping_sub(b.raw())),
        10 => Value::from_raw(a.raw() & b.raw()),
        11 => Value::from_raw(a.raw() | b.raw()),
        12 => Value::from_raw(a.raw() ^ MODULUS_MASK),
        // shift counts take their low five bits, as hardware shifters do
        13 => masked((a.raw() as u32).wrapping_shl(b.raw() as u32) as i32),
        14 => Value::from_raw(((a.raw() as u32).wrapping_shr(b.raw() as u32)) as i32),
        _ => Value::NIL,
    })
}

fn boolean(flag: bool) -> Value {
    if flag {
        sym::TRUE
    } else {
        sym::FALSE
    }
}

fn masked(raw: i32) -> Value {
    Value::from_raw(raw & MODULUS_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(n: i32) -> Value {
        Value::from_raw(n)
    }

    fn run(index: i32, a: Value, b: Value) -> Value {
        let mut heap = Heap::new(16);
        call_builtin(index, a, b, &mut heap).unwrap()
    }

    #[test]
    fn head_and_tail_deconstruct() {
        let mut heap = Heap::new(16);
        let cell = heap.cons(atom(1), atom(2)).unwrap();
        assert_eq!(call_builtin(3, cell, Value::NIL, &mut heap).unwrap(), atom(1));
        assert_eq!(call_builtin(4, cell, Value::NIL, &mut heap).unwrap(), atom(2));
        assert_eq!(call_builtin(3, atom(7), Value::NIL, &mut heap).unwrap(), Value::NIL);
    }

    #[test]
    fn comparison_yields_boolean_atoms() {
        assert_eq!(run(6, atom(2), atom(3)), sym::TRUE);
        assert_eq!(run(6, atom(3), atom(3)), sym::TRUE);
        assert_eq!(run(6, atom(4), atom(3)), sym::FALSE);
        // lte is signed
        assert_eq!(run(6, Value::cons_at(8), atom(0)), sym::TRUE);
        assert_eq!(run(7, atom(5), atom(5)), sym::TRUE);
        assert_eq!(run(7, atom(5), atom(6)), sym::FALSE);
        assert_eq!(run(7, Value::NIL, Value::NIL), sym::TRUE);
    }

    #[test]
    fn arithmetic_is_modular_over_31_bits() {
        assert_eq!(run(8, atom(2), atom(3)).raw(), 5);
        assert_eq!(run(8, atom(MODULUS_MASK), atom(1)).raw(), 0);
        assert_eq!(run(9, atom(5), atom(3)).raw(), 2);
        assert_eq!(run(9, atom(3), atom(5)).raw(), MODULUS_MASK - 1);
    }

    #[test]
    fn bitwise_operations() {
        assert_eq!(run(10, atom(6), atom(3)).raw(), 2);
        assert_eq!(run(11, atom(4), atom(1)).raw(), 5);
        assert_eq!(run(12, Value::NIL, Value::NIL).raw(), MODULUS_MASK);
        assert_eq!(run(12, atom(MODULUS_MASK), Value::NIL).raw(), 0);
    }

    #[test]
    fn shifts() {
        assert_eq!(run(13, atom(1), atom(4)).raw(), 16);
        assert_eq!(run(13, atom(1), atom(30)).raw(), 1 << 30);
        // the modulus drops bit 31
        assert_eq!(run(13, atom(1), atom(31)).raw(), 0);
        assert_eq!(run(14, atom(8), atom(2)).raw(), 2);
        assert_eq!(run(14, atom(1), atom(1)).raw(), 0);
    }

    #[test]
    fn unknown_indices_produce_nil() {
        assert_eq!(run(17, atom(1), atom(2)), Value::NIL);
        assert_eq!(run(1000, atom(1), atom(2)), Value::NIL);
    }
}
