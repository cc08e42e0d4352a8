//! The diagonal board: consistency checks over a hypothesised plugboard
//! wiring.
//!
//! Strictly thread-local — callers construct one per worker/hypothesis,
//! never share it across threads.

use std::collections::HashMap;

/// A partial, symmetric hypothesis mapping letter indices (0..25) to
/// letter indices, built up during plugboard deduction.
pub type Wiring = HashMap<u8, u8>;

/// Checks a plugboard hypothesis for the four contradiction classes:
/// self-stecker, multiply-claimed letters, odd-sized components, and
/// cycles of length >= 3.
#[derive(Debug, Default)]
pub struct DiagonalBoard {
    component: [i16; 26],
}

impl DiagonalBoard {
    pub fn new() -> Self {
        Self { component: [-1; 26] }
    }

    /// `true` iff `wiring` is inconsistent with plugboard algebra.
    pub fn has_contradiction(&mut self, wiring: &Wiring) -> bool {
        if wiring.is_empty() {
            return false;
        }

        if Self::has_self_stecker(wiring) {
            return true;
        }
        if Self::has_invalid_letters_or_multi_claim(wiring) {
            return true;
        }
        if self.has_odd_component(wiring) {
            return true;
        }
        Self::has_long_cycle(wiring)
    }

    fn has_self_stecker(wiring: &Wiring) -> bool {
        wiring.iter().any(|(&a, &b)| a == b)
    }

    /// A letter outside 0..25, or a pairing whose reverse entry
    /// disagrees (or is missing), indicates a multiply-claimed letter.
    fn has_invalid_letters_or_multi_claim(wiring: &Wiring) -> bool {
        for (&a, &b) in wiring {
            if a >= 26 || b >= 26 {
                return true;
            }
            match wiring.get(&b) {
                Some(&back) if back == a => {}
                _ => return true,
            }
        }
        false
    }

    fn has_odd_component(&mut self, wiring: &Wiring) -> bool {
        for i in 0..26 {
            self.component[i] = i as i16;
        }

        fn find(parent: &mut [i16; 26], x: usize) -> usize {
            if parent[x] as usize != x {
                let root = find(parent, parent[x] as usize);
                parent[x] = root as i16;
            }
            parent[x] as usize
        }

        for (&a, &b) in wiring {
            let ra = find(&mut self.component, a as usize);
            let rb = find(&mut self.component, b as usize);
            if ra != rb {
                self.component[ra] = rb as i16;
            }
        }

        let mut sizes = [0u32; 26];
        let touched: Vec<u8> = wiring.keys().copied().collect();
        for &letter in &touched {
            let root = find(&mut self.component, letter as usize);
            sizes[root] += 1;
        }

        sizes.iter().any(|&size| size > 1 && size % 2 != 0)
    }

    /// A bounded walk (cap at 26 steps) looking for a cycle longer than
    /// a simple pair.
    fn has_long_cycle(wiring: &Wiring) -> bool {
        for (&start, &first) in wiring {
            let mut current = first;
            let mut visited = std::collections::HashSet::new();
            visited.insert(start);
            visited.insert(current);
            let mut steps = 1;

            while steps < 26 {
                let next = match wiring.get(&current) {
                    Some(&n) => n,
                    None => break,
                };
                if next == start && steps > 2 {
                    return true;
                }
                if visited.contains(&next) && next != start {
                    break;
                }
                visited.insert(next);
                current = next;
                steps += 1;
            }
        }
        false
    }
}
