//! Command-line front-end for the crib attack engine.

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info};

use bombe::machine::EnigmaMachine;
use bombe::plugboard::Plugboard;
use bombe::rotor::{Reflector, ReflectorSpec, Rotor, RotorSpec};
use bombe::{AttackConfig, BombeSearch, CandidateResult, EnigmaError};

/// Known-plaintext crib attack against three-rotor Enigma ciphers, plus
/// manual encrypt/decrypt/verify convenience operations.
#[derive(Parser)]
#[command(name = "bombe")]
#[command(about = "Recovers rotor settings and plugboard wiring from a known-plaintext crib")]
#[command(version)]
struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the crib attack and ranks surviving candidates.
    Attack {
        /// The known (or guessed) plaintext fragment.
        #[arg(long)]
        crib: String,

        /// The ciphertext to search against.
        #[arg(long)]
        cipher: String,

        /// Comma-separated rotor pool, e.g. "I,II,III" (3 or more names).
        #[arg(long, default_value = "I,II,III")]
        rotors: String,

        /// Reflector type ("B" or "C").
        #[arg(long, default_value = "B")]
        reflector: String,

        /// Try every ordering/selection of 3 rotors from the pool,
        /// rather than the pool's given order.
        #[arg(long)]
        test_all_orders: bool,

        /// Abort plugboard deduction after the zero-plugboard test.
        #[arg(long)]
        no_plugboard: bool,

        /// Emit the result list as a JSON report instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Encrypts text with a fixed machine configuration.
    Encrypt {
        /// The text to encrypt. Lower-case letters are folded to upper
        /// case; non-letters are dropped.
        text: String,

        /// Rotor starting positions, e.g. "AAA".
        #[arg(short, long, default_value = "AAA")]
        positions: String,

        /// Comma-separated rotor order, e.g. "I,II,III".
        #[arg(short, long, default_value = "I,II,III")]
        rotors: String,

        /// Reflector type ("B" or "C").
        #[arg(short = 'f', long, default_value = "B")]
        reflector: String,

        /// Plugboard pairs, e.g. "AB CD EF".
        #[arg(short = 'g', long)]
        plugboard: Option<String>,
    },

    /// Decrypts text with a fixed machine configuration (identical
    /// logic to `encrypt`: the Enigma pipeline is its own inverse).
    Decrypt {
        /// The text to decrypt. Lower-case letters are folded to upper
        /// case; non-letters are dropped.
        text: String,

        /// Rotor starting positions, e.g. "AAA".
        #[arg(short, long, default_value = "AAA")]
        positions: String,

        /// Comma-separated rotor order, e.g. "I,II,III".
        #[arg(short, long, default_value = "I,II,III")]
        rotors: String,

        /// Reflector type ("B" or "C").
        #[arg(short = 'f', long, default_value = "B")]
        reflector: String,

        /// Plugboard pairs, e.g. "AB CD EF".
        #[arg(short = 'g', long)]
        plugboard: Option<String>,
    },

    /// Checks whether a crib, under a fixed machine configuration and
    /// offset, reproduces a given ciphertext exactly.
    Verify {
        /// The known (or guessed) plaintext fragment.
        #[arg(long)]
        crib: String,

        /// The ciphertext to check against.
        #[arg(long)]
        cipher: String,

        /// Rotor starting positions, e.g. "AAA".
        #[arg(short, long, default_value = "AAA")]
        positions: String,

        /// Comma-separated rotor order, e.g. "I,II,III".
        #[arg(short, long, default_value = "I,II,III")]
        rotors: String,

        /// Reflector type ("B" or "C").
        #[arg(short = 'f', long, default_value = "B")]
        reflector: String,

        /// Plugboard pairs, e.g. "AB CD EF".
        #[arg(short = 'g', long)]
        plugboard: Option<String>,

        /// Starting index of the crib within the ciphertext.
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
    },
}

/// Folds lower-case letters to upper case and drops every other byte,
/// mirroring the reference implementation's text-cleaning entry point.
fn clean_text(text: &str) -> String {
    text.bytes()
        .filter(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase() as char)
        .collect()
}

fn parse_rotor_names(rotors: &str) -> Result<[String; 3], EnigmaError> {
    let parts: Vec<String> = rotors.split(',').map(|s| s.trim().to_string()).collect();
    if parts.len() != 3 {
        return Err(EnigmaError::ConfigurationError(format!(
            "rotor order must name exactly 3 rotors, got {}",
            parts.len()
        )));
    }
    Ok([parts[0].clone(), parts[1].clone(), parts[2].clone()])
}

fn parse_positions(positions: &str) -> Result<[u8; 3], EnigmaError> {
    let upper = clean_text(positions);
    if upper.len() != 3 {
        return Err(EnigmaError::ConfigurationError(format!(
            "positions must be exactly 3 letters, got \"{positions}\""
        )));
    }
    let bytes = upper.as_bytes();
    Ok([bytes[0] - b'A', bytes[1] - b'A', bytes[2] - b'A'])
}

fn parse_plugboard(plugboard: Option<&str>) -> Result<Plugboard, EnigmaError> {
    let Some(spec) = plugboard else {
        return Ok(Plugboard::empty());
    };
    let pairs: Result<Vec<(u8, u8)>, EnigmaError> = spec
        .split_whitespace()
        .map(|pair| {
            let upper = clean_text(pair);
            let bytes = upper.as_bytes();
            if bytes.len() != 2 {
                return Err(EnigmaError::ConfigurationError(format!(
                    "plugboard pair must be exactly 2 letters, got \"{pair}\""
                )));
            }
            Ok((bytes[0] - b'A', bytes[1] - b'A'))
        })
        .collect();
    Plugboard::from_pairs(&pairs?)
}

fn build_machine(rotors: &str, reflector: &str, plugboard: Option<&str>) -> Result<EnigmaMachine, EnigmaError> {
    let names = parse_rotor_names(rotors)?;
    let rotors = [
        Rotor::new(RotorSpec::by_name(&names[0])?, 0, 0),
        Rotor::new(RotorSpec::by_name(&names[1])?, 0, 0),
        Rotor::new(RotorSpec::by_name(&names[2])?, 0, 0),
    ];
    let reflector = Reflector::new(ReflectorSpec::by_name(reflector)?);
    let plugboard = parse_plugboard(plugboard)?;
    Ok(EnigmaMachine::new(rotors, reflector, plugboard))
}

fn run_attack(
    crib: &str,
    cipher: &str,
    rotors: &str,
    reflector: &str,
    test_all_orders: bool,
    no_plugboard: bool,
) -> Result<Vec<CandidateResult>, EnigmaError> {
    let rotor_pool: Vec<String> = rotors.split(',').map(|s| s.trim().to_string()).collect();
    let config = AttackConfig::new(crib, cipher, rotor_pool, reflector, test_all_orders, no_plugboard)?;

    let search = BombeSearch::new(config);
    let progress = |msg: &str| info!("{msg}");
    Ok(search.attack(Some(&progress)))
}

fn run_encrypt(text: &str, positions: &str, rotors: &str, reflector: &str, plugboard: Option<&str>) -> Result<String, EnigmaError> {
    let mut machine = build_machine(rotors, reflector, plugboard)?;
    machine.set_rotor_positions(&parse_positions(positions)?);
    Ok(machine.encrypt(&clean_text(text)))
}

fn run_verify(
    crib: &str,
    cipher: &str,
    positions: &str,
    rotors: &str,
    reflector: &str,
    plugboard: Option<&str>,
    offset: usize,
) -> Result<bool, EnigmaError> {
    let clean_crib = clean_text(crib);
    let clean_cipher = clean_text(cipher);

    let mut machine = build_machine(rotors, reflector, plugboard)?;
    machine.set_rotor_positions(&parse_positions(positions)?);
    for _ in 0..offset {
        machine.step_rotors();
    }

    let produced: String = clean_crib
        .bytes()
        .map(|b| (b'A' + machine.encrypt_char(b - b'A')) as char)
        .collect();

    let target = if clean_cipher.len() >= offset + produced.len() {
        &clean_cipher[offset..offset + produced.len()]
    } else {
        clean_cipher.as_str()
    };

    Ok(produced == target)
}

fn print_table(results: &[CandidateResult]) {
    println!(
        "{:<8} {:<12} {:<8} {:<10} {:<8} {:<6} plugboard",
        "score", "rotors", "offset", "positions", "match", "pairs"
    );
    for r in results {
        let positions = format!(
            "{}{}{}",
            (b'A' + r.positions.0) as char,
            (b'A' + r.positions.1) as char,
            (b'A' + r.positions.2) as char,
        );
        let plugboard: Vec<String> = r
            .plugboard
            .iter()
            .map(|&(a, b)| format!("{}{}", (b'A' + a) as char, (b'A' + b) as char))
            .collect();
        println!(
            "{:<8.1} {:<12} {:<8} {:<10} {:<8.2} {:<6} {}",
            r.score,
            format!("{}-{}-{}", r.rotor_order.0, r.rotor_order.1, r.rotor_order.2),
            r.offset,
            positions,
            r.match_rate,
            r.plugboard_pairs,
            plugboard.join(" "),
        );
    }
}

fn print_json(crib: &str, cipher: &str, rotors: &str, reflector: &str, test_all_orders: bool, no_plugboard: bool, results: &[CandidateResult]) {
    let envelope = serde_json::json!({
        "settings": {
            "crib": crib,
            "cipher": cipher,
            "rotors": rotors,
            "reflector": reflector,
            "testAllOrders": test_all_orders,
            "searchWithoutPlugboard": no_plugboard,
        },
        "results": results,
        "totalResults": results.len(),
    });
    match serde_json::to_string_pretty(&envelope) {
        Ok(text) => println!("{text}"),
        Err(e) => error!("failed to serialise report: {e}"),
    }
}

fn main() {
    let cli = Cli::parse();

    let env = Env::default().filter_or("RUST_LOG", if cli.verbose { "debug" } else { "info" });
    env_logger::Builder::from_env(env).init();

    info!("bombe starting");

    let outcome = match &cli.command {
        Command::Attack {
            crib,
            cipher,
            rotors,
            reflector,
            test_all_orders,
            no_plugboard,
            json,
        } => run_attack(crib, cipher, rotors, reflector, *test_all_orders, *no_plugboard).map(|results| {
            if *json {
                print_json(crib, cipher, rotors, reflector, *test_all_orders, *no_plugboard, &results);
            } else {
                print_table(&results);
            }
        }),

        Command::Encrypt {
            text,
            positions,
            rotors,
            reflector,
            plugboard,
        } => run_encrypt(text, positions, rotors, reflector, plugboard.as_deref()).map(|result| {
            println!("{result}");
        }),

        Command::Decrypt {
            text,
            positions,
            rotors,
            reflector,
            plugboard,
        } => run_encrypt(text, positions, rotors, reflector, plugboard.as_deref()).map(|result| {
            println!("{result}");
        }),

        Command::Verify {
            crib,
            cipher,
            positions,
            rotors,
            reflector,
            plugboard,
            offset,
        } => run_verify(crib, cipher, positions, rotors, reflector, plugboard.as_deref(), *offset).map(|matched| {
            println!("{matched}");
        }),
    };

    if let Err(e) = outcome {
        error!("{e}");
        std::process::exit(1);
    }

    info!("bombe finished");
}
