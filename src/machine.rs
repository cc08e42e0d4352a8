//! The Enigma transformation pipeline: rotors + reflector + plugboard.

use log::trace;

use crate::plugboard::Plugboard;
use crate::rotor::{Reflector, Rotor};

/// Composes three rotors (right-to-left: index 0 is the fastest wheel),
/// a reflector, and a plugboard into the full Enigma pipeline.
#[derive(Debug, Clone)]
pub struct EnigmaMachine {
    rotors: [Rotor; 3],
    reflector: Reflector,
    plugboard: Plugboard,
}

impl EnigmaMachine {
    pub fn new(rotors: [Rotor; 3], reflector: Reflector, plugboard: Plugboard) -> Self {
        Self {
            rotors,
            reflector,
            plugboard,
        }
    }

    pub fn plugboard(&self) -> &Plugboard {
        &self.plugboard
    }

    pub fn set_plugboard(&mut self, plugboard: Plugboard) {
        self.plugboard = plugboard;
    }

    /// Sets `rotor[i].position = positions[i]` for `i < positions.len()`.
    pub fn set_rotor_positions(&mut self, positions: &[u8]) {
        for (rotor, &pos) in self.rotors.iter_mut().zip(positions.iter()) {
            rotor.set_position(pos);
        }
    }

    pub fn rotor_positions(&self) -> [u8; 3] {
        [
            self.rotors[0].position(),
            self.rotors[1].position(),
            self.rotors[2].position(),
        ]
    }

    /// The historical double-stepping anomaly.
    ///
    /// The middle wheel's notch state is sampled *before* any rotor
    /// moves; the rightmost wheel always steps, and the middle/left
    /// wheels step according to that sampled state and the rightmost
    /// wheel's own (post-sampling) notch state.
    pub fn step_rotors(&mut self) {
        let middle_at_notch = self.rotors[1].is_at_notch();

        self.rotors[0].rotate();

        if self.rotors[0].is_at_notch() || middle_at_notch {
            self.rotors[1].rotate();
        }
        if middle_at_notch {
            self.rotors[2].rotate();
        }

        trace!(
            "rotor positions now {} {} {}",
            self.rotors[0].position(),
            self.rotors[1].position(),
            self.rotors[2].position()
        );
    }

    /// Steps the rotors, then performs the full plugboard/rotor/reflector
    /// round trip.
    pub fn encrypt_char(&mut self, c: u8) -> u8 {
        self.step_rotors();
        self.encrypt_char_no_step(c)
    }

    /// Performs the plugboard/rotor/reflector round trip without
    /// stepping the rotors first. Used by the Bombe deducer, which
    /// advances rotors to an exact target state externally.
    pub fn encrypt_char_no_step(&self, c: u8) -> u8 {
        let mut signal = self.plugboard.swap(c);

        for rotor in &self.rotors {
            signal = rotor.encrypt_forward(signal);
        }

        signal = self.reflector.reflect(signal);

        for rotor in self.rotors.iter().rev() {
            signal = rotor.encrypt_backward(signal);
        }

        self.plugboard.swap(signal)
    }

    /// Encrypts an A-Z string, stepping the rotors before each
    /// character. Non-uppercase-letter bytes are skipped, not emitted.
    pub fn encrypt(&mut self, msg: &str) -> String {
        msg.bytes()
            .filter(|&b| b.is_ascii_uppercase())
            .map(|b| {
                let idx = b - b'A';
                b'A' + self.encrypt_char(idx)
            })
            .map(|b| b as char)
            .collect()
    }
}
