use crate::heap::Heap;
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Print a mu_ value in readable form.
///
/// Nil prints as `()`, atoms with a nonempty interned name print that
/// name, every other atom prints its decimal value, and cons chains
/// print as lists with dotted tails where the terminator is not nil.
pub fn print_val(val: Value, heap: &Heap, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    print_inner(val, heap, symbols, &mut out, 0);
    out
}

fn print_inner(val: Value, heap: &Heap, symbols: &SymbolTable, out: &mut String, depth: usize) {
    if depth > 1000 {
        out.push_str("...");
        return;
    }

    if val.is_nil() {
        out.push_str("()");
        return;
    }

    if val.is_atom() {
        print_atom(val, symbols, out);
        return;
    }

    out.push('(');
    print_inner(heap.head_val(val), heap, symbols, out, depth + 1);
    let mut current = heap.tail_val(val);
    loop {
        if current.is_nil() {
            break;
        }
        if current.is_atom() {
            out.push_str(" . ");
            print_atom(current, symbols, out);
            break;
        }
        out.push(' ');
        print_inner(heap.head_val(current), heap, symbols, out, depth + 1);
        current = heap.tail_val(current);
    }
    out.push(')');
}

fn print_atom(val: Value, symbols: &SymbolTable, out: &mut String) {
    match symbols.name_bytes(val) {
        Some(bytes) if !bytes.is_empty() => {
            out.push_str(&String::from_utf8_lossy(bytes));
        }
        _ => out.push_str(&val.raw().to_string()),
    }
}
