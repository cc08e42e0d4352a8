//! End-to-end tests for the crib attack engine.

use rand::Rng;

use bombe::machine::EnigmaMachine;
use bombe::plugboard::Plugboard;
use bombe::rotor::{Reflector, ReflectorSpec, Rotor, RotorSpec};
use bombe::{AttackConfig, BombeSearch};

fn make_machine(rotor_names: [&str; 3], reflector_name: &str, positions: [u8; 3], plugboard: Plugboard) -> EnigmaMachine {
    let rotors = [
        Rotor::new(RotorSpec::by_name(rotor_names[0]).unwrap(), positions[0], 0),
        Rotor::new(RotorSpec::by_name(rotor_names[1]).unwrap(), positions[1], 0),
        Rotor::new(RotorSpec::by_name(rotor_names[2]).unwrap(), positions[2], 0),
    ];
    let reflector = Reflector::new(ReflectorSpec::by_name(reflector_name).unwrap());
    EnigmaMachine::new(rotors, reflector, plugboard)
}

#[test]
fn trivial_exact_match_recovers_starting_positions() {
    let mut machine = make_machine(["I", "II", "III"], "B", [0, 0, 0], Plugboard::empty());
    let crib = "HELLOWORLD";
    let cipher = machine.encrypt(crib);

    let config = AttackConfig::new(crib, &cipher, vec!["I".into(), "II".into(), "III".into()], "B", false, false).unwrap();
    let search = BombeSearch::new(config);
    let results = search.attack::<fn(&str)>(None);

    let hit = results
        .iter()
        .find(|r| r.positions == (0, 0, 0) && r.offset == 0)
        .expect("expected a candidate at the encrypting configuration");
    assert_eq!(hit.plugboard_pairs, 0);
    assert_eq!(hit.match_rate, 1.0);
}

#[test]
fn exact_match_requires_plugboard_recovery() {
    let plug = Plugboard::from_pairs(&[(0, 1), (2, 3), (4, 5)]).unwrap(); // A-B, C-D, E-F
    let mut machine = make_machine(["II", "V", "III"], "B", [5, 10, 22], plug);
    let crib = "ATTACKATDAWN";
    let cipher = machine.encrypt(crib);

    let config = AttackConfig::new(crib, &cipher, vec!["II".into(), "V".into(), "III".into()], "B", false, false).unwrap();
    let search = BombeSearch::new(config);
    let results = search.attack::<fn(&str)>(None);

    let hit = results
        .iter()
        .find(|r| r.match_rate == 1.0 && r.positions == (5, 10, 22))
        .expect("expected an exact match requiring a recovered plugboard");

    // Verify the recovered plugboard actually reproduces the cipher.
    let verify_plug = Plugboard::from_pairs(&hit.plugboard).unwrap();
    let mut verify_machine = make_machine(["II", "V", "III"], "B", [5, 10, 22], verify_plug);
    assert_eq!(verify_machine.encrypt(crib), cipher);
}

#[test]
fn crib_offset_within_a_longer_ciphertext_is_recovered() {
    let mut machine = make_machine(["I", "II", "III"], "B", [3, 7, 11], Plugboard::empty());
    let cipher = machine.encrypt("XXXXHELLOYYYY");

    let config = AttackConfig::new("HELLO", &cipher, vec!["I".into(), "II".into(), "III".into()], "B", false, false).unwrap();
    let search = BombeSearch::new(config);
    let results = search.attack::<fn(&str)>(None);

    assert!(results.iter().any(|r| r.offset == 4 && r.match_rate == 1.0));
}

#[test]
fn no_plugboard_mode_only_yields_partial_matches() {
    let plug = Plugboard::from_pairs(&[(0, 1), (2, 3), (4, 5)]).unwrap();
    let mut machine = make_machine(["II", "V", "III"], "B", [5, 10, 22], plug);
    let crib = "ATTACKATDAWN";
    let cipher = machine.encrypt(crib);

    let config = AttackConfig::new(crib, &cipher, vec!["II".into(), "V".into(), "III".into()], "B", false, true).unwrap();
    let search = BombeSearch::new(config);
    let results = search.attack::<fn(&str)>(None);

    assert!(!results.iter().any(|r| r.match_rate == 1.0));
    assert!(results
        .iter()
        .any(|r| r.positions == (5, 10, 22) && r.plugboard_pairs == 0 && r.match_rate < 1.0));
}

#[test]
fn test_all_orders_finds_the_correct_ordering_in_a_larger_pool() {
    let mut machine = make_machine(["III", "I", "IV"], "B", [2, 2, 2], Plugboard::empty());
    let crib = "ENIGMA";
    let cipher = machine.encrypt(crib);

    let pool = vec!["I".into(), "II".into(), "III".into(), "IV".into()];
    let config = AttackConfig::new(crib, &cipher, pool, "B", true, false).unwrap();
    let search = BombeSearch::new(config);
    let results = search.attack::<fn(&str)>(None);

    assert!(results.iter().any(|r| {
        r.match_rate == 1.0
            && r.positions == (2, 2, 2)
            && r.rotor_order == ("III".to_string(), "I".to_string(), "IV".to_string())
    }));
}

#[test]
fn stop_bounds_further_work_and_still_returns_partial_results() {
    let mut machine = make_machine(["I", "II", "III"], "B", [0, 0, 0], Plugboard::empty());
    let crib = "HELLOWORLD";
    let cipher = machine.encrypt(crib);

    let config = AttackConfig::new(crib, &cipher, vec!["I".into(), "II".into(), "III".into()], "B", false, false).unwrap();
    let search = BombeSearch::new(config);
    search.stop();
    // A stopped search still returns without panicking or hanging; the
    // result list may be empty since every worker skips at the top of
    // its innermost loop.
    let results = search.attack::<fn(&str)>(None);
    assert!(results.len() <= 1);
}

#[test]
fn random_configurations_never_self_encrypt_a_letter() {
    let mut rng = rand::thread_rng();
    let rotor_names = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];

    for _ in 0..1000 {
        let names = [
            rotor_names[rng.gen_range(0..rotor_names.len())],
            rotor_names[rng.gen_range(0..rotor_names.len())],
            rotor_names[rng.gen_range(0..rotor_names.len())],
        ];
        let positions = [rng.gen_range(0..26), rng.gen_range(0..26), rng.gen_range(0..26)];
        let mut machine = make_machine(names, "B", positions, Plugboard::empty());

        for c in 0..26u8 {
            assert_ne!(machine.encrypt_char(c), c);
        }
    }
}
