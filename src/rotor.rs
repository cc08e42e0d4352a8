//! Rotor and reflector wiring tables, and the stateful [`Rotor`] wheel.
//!
//! The wiring tables are fixed historical constants, so (as in the
//! teacher repository) they are generated once at compile time rather
//! than parsed from strings at run time.

use crate::error::{EnigmaError, EnigmaResult};

/// Recognised rotor names, in the order their wiring tables appear below.
pub const ROTOR_NAMES: [&str; 8] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];

/// Recognised reflector names.
pub const REFLECTOR_NAMES: [&str; 2] = ["B", "C"];

const ROTOR_WIRINGS: [&[u8; 26]; 8] = [
    b"EKMFLGDQVZNTOWYHXUSPAIBRCJ",
    b"AJDKSIRUXBLHWTMCQGZNPYFVOE",
    b"BDFHJLCPRTXVZNYEIWGAKMUSQO",
    b"ESOVPZJAYQUIRHXLNFTGKDCMWB",
    b"VZBRGITYUPSDNHLXAWMJQOFECK",
    b"JPGVOUMFYQBENHZRDKASXLICTW",
    b"NZJHGRCXMYSWBOUFAIVLPEKQDT",
    b"FKQHTLXOCBJSPDZRAMEWNIUYGV",
];

const ROTOR_NOTCHES: [&[u8]; 8] = [
    &[16], // I: Q
    &[4],  // II: E
    &[21], // III: V
    &[9],  // IV: J
    &[25], // V: Z
    &[25, 12], // VI: Z, M
    &[25, 12], // VII: Z, M
    &[25, 12], // VIII: Z, M
];

const REFLECTOR_WIRINGS: [&[u8; 26]; 2] = [
    b"YRUHQSLDPXNGOKMIEBFZCWVJAT", // B
    b"FVPJIAOYEDRZXWGCTKUQSBNMHL", // C
];

fn char_to_index(c: u8) -> u8 {
    c - b'A'
}

/// Immutable, process-lifetime definition of a rotor's wiring and notch
/// positions.
#[derive(Debug, Clone, Copy)]
pub struct RotorSpec {
    name: &'static str,
    forward: [u8; 26],
    backward: [u8; 26],
    notches: &'static [u8],
}

impl RotorSpec {
    /// Looks up a rotor's spec by its historical name (`"I"` .. `"VIII"`).
    pub fn by_name(name: &str) -> EnigmaResult<Self> {
        let idx = ROTOR_NAMES
            .iter()
            .position(|&n| n == name)
            .ok_or_else(|| EnigmaError::ConfigurationError(format!("unknown rotor type: {name}")))?;

        let wiring = ROTOR_WIRINGS[idx];
        let mut forward = [0u8; 26];
        let mut backward = [0u8; 26];
        for i in 0..26 {
            forward[i] = char_to_index(wiring[i]);
            backward[forward[i] as usize] = i as u8;
        }

        Ok(Self {
            name: ROTOR_NAMES[idx],
            forward,
            backward,
            notches: ROTOR_NOTCHES[idx],
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The first (lowest-index, in table order) notch, used when only a
    /// single notch is needed.
    pub fn first_notch(&self) -> u8 {
        self.notches[0]
    }

    pub fn notches(&self) -> &'static [u8] {
        self.notches
    }
}

/// Immutable, fixed involutive substitution used by the reflector.
#[derive(Debug, Clone, Copy)]
pub struct ReflectorSpec {
    name: &'static str,
    wiring: [u8; 26],
}

impl ReflectorSpec {
    pub fn by_name(name: &str) -> EnigmaResult<Self> {
        let idx = REFLECTOR_NAMES
            .iter()
            .position(|&n| n == name)
            .ok_or_else(|| EnigmaError::ConfigurationError(format!("unknown reflector type: {name}")))?;

        let raw = REFLECTOR_WIRINGS[idx];
        let mut wiring = [0u8; 26];
        for i in 0..26 {
            wiring[i] = char_to_index(raw[i]);
        }

        Ok(Self {
            name: REFLECTOR_NAMES[idx],
            wiring,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A stateless involutive reflector: `reflect(reflect(c)) == c` and
/// `reflect(c) != c` for every `c`.
#[derive(Debug, Clone, Copy)]
pub struct Reflector {
    spec: ReflectorSpec,
}

impl Reflector {
    pub fn new(spec: ReflectorSpec) -> Self {
        Self { spec }
    }

    pub fn reflect(&self, c: u8) -> u8 {
        self.spec.wiring[c as usize]
    }
}

/// A stateful Enigma wheel: a fixed substitution permutation plus a
/// rotational offset and ring setting.
#[derive(Debug, Clone, Copy)]
pub struct Rotor {
    spec: RotorSpec,
    position: u8,
    ring: u8,
}

impl Rotor {
    pub fn new(spec: RotorSpec, position: u8, ring: u8) -> Self {
        Self {
            spec,
            position: position % 26,
            ring: ring % 26,
        }
    }

    pub fn spec(&self) -> &RotorSpec {
        &self.spec
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn ring(&self) -> u8 {
        self.ring
    }

    pub fn set_position(&mut self, position: u8) {
        self.position = position % 26;
    }

    pub fn set_ring(&mut self, ring: u8) {
        self.ring = ring % 26;
    }

    /// Advances the rotor's position by one, wrapping mod 26.
    pub fn rotate(&mut self) {
        self.position = (self.position + 1) % 26;
    }

    /// True iff the rotor currently sits on one of its notch positions.
    pub fn is_at_notch(&self) -> bool {
        self.spec.notches.contains(&self.position)
    }

    fn encipher(&self, c: u8, mapping: &[u8; 26]) -> u8 {
        let shift = (26 + self.position - self.ring) % 26;
        let idx = ((c as u16 + shift as u16) % 26) as u8;
        let val = mapping[idx as usize];
        (26 + val - shift) % 26
    }

    /// Substitution when current flows entry -> reflector.
    pub fn encrypt_forward(&self, c: u8) -> u8 {
        self.encipher(c, &self.spec.forward)
    }

    /// Substitution when current flows reflector -> exit.
    pub fn encrypt_backward(&self, c: u8) -> u8 {
        self.encipher(c, &self.spec.backward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_are_inverses() {
        let spec = RotorSpec::by_name("I").unwrap();
        let rotor = Rotor::new(spec, 7, 3);
        for c in 0..26u8 {
            let forward = rotor.encrypt_forward(c);
            let back = rotor.encrypt_backward(forward);
            assert_eq!(back, c);
        }
    }

    #[test]
    fn unknown_rotor_is_configuration_error() {
        assert!(RotorSpec::by_name("IX").is_err());
    }

    #[test]
    fn reflector_has_no_fixed_points_and_is_involutive() {
        let spec = ReflectorSpec::by_name("B").unwrap();
        let reflector = Reflector::new(spec);
        for c in 0..26u8 {
            assert_ne!(reflector.reflect(c), c);
            assert_eq!(reflector.reflect(reflector.reflect(c)), c);
        }
    }

    #[test]
    fn notches_match_historical_table() {
        assert_eq!(RotorSpec::by_name("I").unwrap().first_notch(), 16);
        assert_eq!(RotorSpec::by_name("II").unwrap().first_notch(), 4);
        assert_eq!(RotorSpec::by_name("III").unwrap().first_notch(), 21);
        assert_eq!(RotorSpec::by_name("VI").unwrap().notches(), &[25, 12]);
    }
}
