//! The crib-driven plugboard deducer.
//!
//! For a fixed (rotor order, starting positions, offset) candidate,
//! attempts to derive a plugboard wiring that makes `Enigma(crib)`
//! equal the corresponding ciphertext slice.

use log::debug;

use crate::diagonal::{DiagonalBoard, Wiring};
use crate::machine::EnigmaMachine;
use crate::plugboard::Plugboard;
use crate::rotor::{Reflector, Rotor};

/// Outcome of a deduction attempt.
pub enum Deduction {
    /// An exact match was found; these pairs (possibly empty) make
    /// `Enigma(crib) == cipher`.
    Matched(Vec<(u8, u8)>),
    /// No plugboard hypothesis reproduced the cipher slice.
    Conflict,
    /// The zero-plugboard encryption didn't match and plugboard search
    /// was not attempted (either forbidden by `search_without_plugboard`,
    /// or genuinely exhausted with no contradiction recorded).
    NoMatch,
}

/// Attempts to derive a plugboard hypothesis for one (rotor order,
/// positions, offset) candidate.
pub struct PlugboardDeducer<'a> {
    crib: &'a [u8],
    cipher_slice: &'a [u8],
    rotors: [Rotor; 3],
    reflector: Reflector,
    positions: [u8; 3],
    offset: usize,
    search_without_plugboard: bool,
}

impl<'a> PlugboardDeducer<'a> {
    pub fn new(
        crib: &'a [u8],
        cipher_slice: &'a [u8],
        rotors: [Rotor; 3],
        reflector: Reflector,
        positions: [u8; 3],
        offset: usize,
        search_without_plugboard: bool,
    ) -> Self {
        debug_assert_eq!(crib.len(), cipher_slice.len());
        Self {
            crib,
            cipher_slice,
            rotors,
            reflector,
            positions,
            offset,
            search_without_plugboard,
        }
    }

    /// Encrypts `crib` starting from the candidate's rotor state,
    /// through the given plugboard.
    fn encrypt_crib_with(&self, plugboard: Plugboard) -> Vec<u8> {
        let mut machine = EnigmaMachine::new(self.rotors, self.reflector, plugboard);
        machine.set_rotor_positions(&self.positions);
        for _ in 0..self.offset {
            machine.step_rotors();
        }
        self.crib.iter().map(|&c| machine.encrypt_char(c)).collect()
    }

    /// Runs all deduction steps (4.6) and returns the result.
    pub fn deduce(&self) -> Deduction {
        // Step 1: zero-plugboard test.
        let zero_plug_output = self.encrypt_crib_with(Plugboard::empty());
        if zero_plug_output == self.cipher_slice {
            return Deduction::Matched(Vec::new());
        }

        // Step 2: abort if plugboard-less mode forbids further search.
        if self.search_without_plugboard {
            return Deduction::NoMatch;
        }

        // Step 3: simple forced-mapping pass.
        let mut forced: Wiring = Wiring::new();
        let mut forced_conflict = false;
        for (i, (&z, &t)) in zero_plug_output.iter().zip(self.cipher_slice.iter()).enumerate() {
            if z != t && !Self::propagate(&mut forced, z, t) {
                debug!("forced-mapping conflict at crib offset {i}");
                forced_conflict = true;
                break;
            }
        }

        if !forced_conflict && !forced.is_empty() {
            let pairs = Self::extract_pairs(&forced);
            if let Ok(plugboard) = Plugboard::from_pairs(&pairs) {
                if self.encrypt_crib_with(plugboard) == self.cipher_slice {
                    return Deduction::Matched(pairs);
                }
            }
        }

        // Step 4: Turing-style hypothesis scan.
        let crib_first = self.crib[0];
        for candidate in 0..26u8 {
            if candidate == crib_first {
                continue;
            }

            let Some(hypothesis) = self.inner_probe(crib_first, candidate) else {
                continue;
            };

            let pairs = Self::extract_pairs(&hypothesis);
            let mut board = DiagonalBoard::new();
            if board.has_contradiction(&hypothesis) {
                continue;
            }

            if let Ok(plugboard) = Plugboard::from_pairs(&pairs) {
                if self.encrypt_crib_with(plugboard) == self.cipher_slice {
                    return Deduction::Matched(pairs);
                }
            }
        }

        Deduction::Conflict
    }

    /// §4.6.1 constraint propagation: attempts to record `a <-> b` in `w`.
    fn propagate(w: &mut Wiring, a: u8, b: u8) -> bool {
        if a == b {
            return false;
        }
        if let Some(&existing) = w.get(&a) {
            return existing == b;
        }
        if let Some(&existing) = w.get(&b) {
            return existing == a;
        }
        if w.values().any(|&v| v == b) {
            return false;
        }
        w.insert(a, b);
        w.insert(b, a);
        true
    }

    /// §4.6.2 inner probe: builds a hypothesis from `{crib[0] <-> candidate}`.
    fn inner_probe(&self, crib_first: u8, candidate: u8) -> Option<Wiring> {
        let mut w = Wiring::new();
        w.insert(crib_first, candidate);
        w.insert(candidate, crib_first);

        let mut machine = EnigmaMachine::new(self.rotors, self.reflector, Plugboard::empty());
        let mut implications: Vec<(u8, u8)> = Vec::new();

        for i in 0..self.crib.len() {
            machine.set_rotor_positions(&self.positions);
            for _ in 0..(self.offset + i) {
                machine.step_rotors();
            }

            let x = *w.get(&self.crib[i]).unwrap_or(&self.crib[i]);
            let y = machine.encrypt_char_no_step(x);
            let t = self.cipher_slice[i];

            if let Some(&mapped) = w.get(&y) {
                if mapped != t {
                    return None;
                }
            } else if let Some(&mapped) = w.get(&t) {
                if mapped != y {
                    return None;
                }
            } else if y != t {
                implications.push((y, t));
            }
        }

        for (y, t) in implications {
            if !w.contains_key(&y) && !w.contains_key(&t) {
                w.insert(y, t);
                w.insert(t, y);
            }
        }

        Some(w)
    }

    fn extract_pairs(w: &Wiring) -> Vec<(u8, u8)> {
        let mut seen = [false; 26];
        let mut pairs = Vec::new();
        for (&a, &b) in w {
            if a == b || seen[a as usize] || seen[b as usize] {
                continue;
            }
            seen[a as usize] = true;
            seen[b as usize] = true;
            pairs.push((a.min(b), a.max(b)));
        }
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotor::{ReflectorSpec, RotorSpec};

    fn rotors(names: [&str; 3]) -> [Rotor; 3] {
        [
            Rotor::new(RotorSpec::by_name(names[0]).unwrap(), 0, 0),
            Rotor::new(RotorSpec::by_name(names[1]).unwrap(), 0, 0),
            Rotor::new(RotorSpec::by_name(names[2]).unwrap(), 0, 0),
        ]
    }

    fn reflector(name: &str) -> Reflector {
        Reflector::new(ReflectorSpec::by_name(name).unwrap())
    }

    #[test]
    fn no_plugboard_needed_matches_immediately() {
        let mut machine = EnigmaMachine::new(rotors(["I", "II", "III"]), reflector("B"), Plugboard::empty());
        machine.set_rotor_positions(&[0, 0, 0]);
        let crib = b"HELLOWORLD";
        let cipher: Vec<u8> = crib.iter().map(|&c| machine.encrypt_char(c - b'A')).collect();

        let deducer = PlugboardDeducer::new(
            &crib.iter().map(|&c| c - b'A').collect::<Vec<u8>>(),
            &cipher,
            rotors(["I", "II", "III"]),
            reflector("B"),
            [0, 0, 0],
            0,
            false,
        );

        match deducer.deduce() {
            Deduction::Matched(pairs) => assert!(pairs.is_empty()),
            _ => panic!("expected a zero-plugboard match"),
        }
    }

    #[test]
    fn deduces_plugboard_from_crib() {
        let plug = Plugboard::from_pairs(&[(0, 1), (2, 3), (4, 5)]).unwrap(); // AB CD EF
        let mut machine = EnigmaMachine::new(rotors(["II", "V", "III"]), reflector("B"), plug);
        machine.set_rotor_positions(&[5, 10, 22]); // F K W

        let plain: Vec<u8> = b"ATTACKATDAWN".iter().map(|&c| c - b'A').collect();
        let cipher: Vec<u8> = plain.iter().map(|&c| machine.encrypt_char(c)).collect();

        let deducer = PlugboardDeducer::new(
            &plain,
            &cipher,
            rotors(["II", "V", "III"]),
            reflector("B"),
            [5, 10, 22],
            0,
            false,
        );

        match deducer.deduce() {
            Deduction::Matched(pairs) => {
                assert!(!pairs.is_empty());
                let verify_plug = Plugboard::from_pairs(&pairs).unwrap();
                let mut verify_machine = EnigmaMachine::new(rotors(["II", "V", "III"]), reflector("B"), verify_plug);
                verify_machine.set_rotor_positions(&[5, 10, 22]);
                let result: Vec<u8> = plain.iter().map(|&c| verify_machine.encrypt_char(c)).collect();
                assert_eq!(result, cipher);
            }
            _ => panic!("expected a plugboard deduction"),
        }
    }

    #[test]
    fn search_without_plugboard_stops_at_step_one() {
        let plug = Plugboard::from_pairs(&[(0, 1)]).unwrap();
        let mut machine = EnigmaMachine::new(rotors(["I", "II", "III"]), reflector("B"), plug);
        machine.set_rotor_positions(&[0, 0, 0]);

        let plain: Vec<u8> = b"HELLO".iter().map(|&c| c - b'A').collect();
        let cipher: Vec<u8> = plain.iter().map(|&c| machine.encrypt_char(c)).collect();

        let deducer = PlugboardDeducer::new(&plain, &cipher, rotors(["I", "II", "III"]), reflector("B"), [0, 0, 0], 0, true);

        assert!(matches!(deducer.deduce(), Deduction::NoMatch));
    }
}
