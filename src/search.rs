//! The top-level attack driver: enumerates the search space in parallel
//! and collects candidate plugboard/rotor hypotheses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use itertools::iproduct;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::deducer::{Deduction, PlugboardDeducer};
use crate::error::{EnigmaError, EnigmaResult};
use crate::machine::EnigmaMachine;
use crate::plugboard::Plugboard;
use crate::rotor::{Reflector, ReflectorSpec, Rotor, RotorSpec};

/// A surviving hypothesis from one (rotor order, positions, offset) task.
///
/// Ordering is descending by `score`; this is the same shape persisted
/// by the `--json` report (see the crate-level documentation for the
/// surrounding envelope).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateResult {
    pub score: f64,
    pub positions: (u8, u8, u8),
    pub rotor_order: (String, String, String),
    pub plugboard: Vec<(u8, u8)>,
    pub match_rate: f64,
    pub plugboard_pairs: usize,
    pub offset: usize,
}

impl CandidateResult {
    fn exact(
        positions: (u8, u8, u8),
        rotor_order: (String, String, String),
        plugboard: Vec<(u8, u8)>,
        offset: usize,
    ) -> Self {
        let plugboard_pairs = plugboard.len();
        Self {
            score: 100.0 - 2.0 * plugboard_pairs as f64,
            positions,
            rotor_order,
            plugboard,
            match_rate: 1.0,
            plugboard_pairs,
            offset,
        }
    }

    fn partial(
        positions: (u8, u8, u8),
        rotor_order: (String, String, String),
        match_rate: f64,
        offset: usize,
    ) -> Self {
        Self {
            score: 100.0 * match_rate,
            positions,
            rotor_order,
            plugboard: Vec::new(),
            match_rate,
            plugboard_pairs: 0,
            offset,
        }
    }
}

/// An opt-in throttle that sleeps workers briefly when the caller
/// believes host CPU usage has crossed a threshold.
///
/// Genuine host CPU sampling is platform-specific code outside this
/// crate's concern; `LoadPolicy` only models the knob. It defaults to
/// never throttling, so library callers and tests never pay a
/// wall-clock cost they didn't ask for.
#[derive(Debug, Clone, Copy)]
pub enum LoadPolicy {
    /// Workers never sleep.
    Never,
    /// Sleep for `delay` every `every_n_tasks` tasks a single worker
    /// processes, regardless of actual host load.
    FixedInterval { every_n_tasks: u64, delay: Duration },
}

impl Default for LoadPolicy {
    fn default() -> Self {
        LoadPolicy::Never
    }
}

impl LoadPolicy {
    fn maybe_sleep(&self, tasks_done: u64) {
        if let LoadPolicy::FixedInterval { every_n_tasks, delay } = *self {
            if every_n_tasks > 0 && tasks_done % every_n_tasks == 0 {
                std::thread::sleep(delay);
            }
        }
    }
}

/// Validated input to a single attack run.
///
/// Construction performs every `ConfigurationError` check exactly
/// once; `BombeSearch` trusts these fields thereafter.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    crib: Vec<u8>,
    cipher: Vec<u8>,
    rotor_pool: Vec<String>,
    reflector: String,
    test_all_orders: bool,
    search_without_plugboard: bool,
}

fn validate_az(s: &str, field: &str) -> EnigmaResult<Vec<u8>> {
    if s.is_empty() {
        return Err(EnigmaError::ConfigurationError(format!("{field} must not be empty")));
    }
    s.bytes()
        .map(|b| {
            if b.is_ascii_uppercase() {
                Ok(b - b'A')
            } else {
                Err(EnigmaError::ConfigurationError(format!(
                    "{field} must contain only A-Z, found byte {b}"
                )))
            }
        })
        .collect()
}

impl AttackConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        crib: &str,
        cipher: &str,
        rotor_pool: Vec<String>,
        reflector: &str,
        test_all_orders: bool,
        search_without_plugboard: bool,
    ) -> EnigmaResult<Self> {
        let crib = validate_az(crib, "crib")?;
        let cipher = validate_az(cipher, "cipher")?;

        if cipher.len() < crib.len() {
            return Err(EnigmaError::ConfigurationError(
                "cipher must be at least as long as the crib".into(),
            ));
        }

        for name in &rotor_pool {
            RotorSpec::by_name(name)?;
        }
        ReflectorSpec::by_name(reflector)?;

        if !test_all_orders && rotor_pool.len() != 3 {
            return Err(EnigmaError::ConfigurationError(format!(
                "rotor pool must have exactly 3 members when test_all_orders is false, got {}",
                rotor_pool.len()
            )));
        }
        if rotor_pool.len() < 3 {
            return Err(EnigmaError::ConfigurationError(
                "rotor pool must have at least 3 members".into(),
            ));
        }

        Ok(Self {
            crib,
            cipher,
            rotor_pool,
            reflector: reflector.to_string(),
            test_all_orders,
            search_without_plugboard,
        })
    }

    fn orderings(&self) -> Vec<[String; 3]> {
        let pool = &self.rotor_pool;
        if !self.test_all_orders {
            return vec![[pool[0].clone(), pool[1].clone(), pool[2].clone()]];
        }

        if pool.len() <= 3 {
            return permutations(pool);
        }

        let mut out = Vec::with_capacity(pool.len() * (pool.len() - 1) * (pool.len() - 2));
        for i in 0..pool.len() {
            for j in 0..pool.len() {
                if j == i {
                    continue;
                }
                for k in 0..pool.len() {
                    if k == i || k == j {
                        continue;
                    }
                    out.push([pool[i].clone(), pool[j].clone(), pool[k].clone()]);
                }
            }
        }
        out
    }
}

/// All permutations of a pool of length <= 3.
fn permutations(pool: &[String]) -> Vec<[String; 3]> {
    match pool.len() {
        3 => {
            const PERMS: [[usize; 3]; 6] = [
                [0, 1, 2],
                [0, 2, 1],
                [1, 0, 2],
                [1, 2, 0],
                [2, 0, 1],
                [2, 1, 0],
            ];
            PERMS
                .iter()
                .map(|idx| [pool[idx[0]].clone(), pool[idx[1]].clone(), pool[idx[2]].clone()])
                .collect()
        }
        n => panic!("orderings() only calls permutations() for pool.len() <= 3, got {n}"),
    }
}

/// Top-level driver: owns no per-task state, only the validated
/// configuration and the cooperative cancellation flag.
pub struct BombeSearch {
    config: AttackConfig,
    cancelled: AtomicBool,
    load_policy: LoadPolicy,
}

impl BombeSearch {
    pub fn new(config: AttackConfig) -> Self {
        Self {
            config,
            cancelled: AtomicBool::new(false),
            load_policy: LoadPolicy::default(),
        }
    }

    pub fn with_load_policy(config: AttackConfig, load_policy: LoadPolicy) -> Self {
        Self {
            config,
            cancelled: AtomicBool::new(false),
            load_policy,
        }
    }

    /// Idempotent: sets the cancellation flag. Workers observe it at
    /// the top of their innermost loop and stop emitting.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Runs the full search and returns the ranked candidate list.
    ///
    /// `progress` is invoked with human-readable status lines from
    /// worker threads and must tolerate concurrent invocation.
    pub fn attack<F>(&self, progress: Option<&F>) -> Vec<CandidateResult>
    where
        F: Fn(&str) + Send + Sync,
    {
        let orderings = self.config.orderings();
        let max_offset = self.config.cipher.len() - self.config.crib.len();

        if let Some(cb) = progress {
            call_progress(
                cb,
                &format!(
                    "starting attack: crib_len={} cipher_len={} orderings={} offsets=0..={} threads={}",
                    self.config.crib.len(),
                    self.config.cipher.len(),
                    orderings.len(),
                    max_offset,
                    rayon::current_num_threads(),
                ),
            );
        }
        info!(
            "starting attack: {} rotor orderings, {} possible offsets",
            orderings.len(),
            max_offset + 1
        );

        let results: Mutex<Vec<CandidateResult>> = Mutex::new(Vec::new());
        let tasks_done = std::sync::atomic::AtomicU64::new(0);

        let offsets: Vec<usize> = (0..=max_offset).collect();
        const RANGE: std::ops::Range<u8> = 0..26;

        iproduct!(orderings.iter(), offsets.iter())
            .collect::<Vec<_>>()
            .into_par_iter()
            .for_each(|(order, &offset)| {
                if self.is_cancelled() {
                    return;
                }

                let Ok(spec0) = RotorSpec::by_name(&order[0]) else { return };
                let Ok(spec1) = RotorSpec::by_name(&order[1]) else { return };
                let Ok(spec2) = RotorSpec::by_name(&order[2]) else { return };
                let Ok(reflector_spec) = ReflectorSpec::by_name(&self.config.reflector) else { return };
                let reflector = Reflector::new(reflector_spec);

                let cipher_slice = &self.config.cipher[offset..offset + self.config.crib.len()];

                iproduct!(RANGE, RANGE, RANGE).for_each(|(p0, p1, p2)| {
                    if self.is_cancelled() {
                        return;
                    }

                    let n = tasks_done.fetch_add(1, Ordering::Relaxed);
                    self.load_policy.maybe_sleep(n);

                    let rotors = [
                        Rotor::new(spec0, p0, 0),
                        Rotor::new(spec1, p1, 0),
                        Rotor::new(spec2, p2, 0),
                    ];

                    let deducer = PlugboardDeducer::new(
                        &self.config.crib,
                        cipher_slice,
                        rotors,
                        reflector,
                        [p0, p1, p2],
                        offset,
                        self.config.search_without_plugboard,
                    );

                    match deducer.deduce() {
                        Deduction::Matched(pairs) => {
                            debug!("match at order={order:?} offset={offset} pos=({p0},{p1},{p2}) pairs={}", pairs.len());
                            let result = CandidateResult::exact(
                                (p0, p1, p2),
                                (order[0].clone(), order[1].clone(), order[2].clone()),
                                pairs,
                                offset,
                            );
                            results.lock().unwrap().push(result);
                        }
                        Deduction::NoMatch => {
                            let rate = zero_plugboard_match_rate(&rotors, reflector, &self.config.crib, cipher_slice, offset);
                            if rate >= 0.5 {
                                let result = CandidateResult::partial(
                                    (p0, p1, p2),
                                    (order[0].clone(), order[1].clone(), order[2].clone()),
                                    rate,
                                    offset,
                                );
                                results.lock().unwrap().push(result);
                            }
                        }
                        Deduction::Conflict => {}
                    }
                });
            });

        let mut out = results.into_inner().unwrap();
        out.sort_unstable_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

        if let Some(cb) = progress {
            call_progress(cb, &format!("attack complete: {} candidates", out.len()));
        }
        info!("attack complete: {} candidates", out.len());

        out
    }
}

/// Invokes a caller-supplied progress callback behind a panic guard: a
/// panicking callback is a `HypothesisFailure`-class fault (never the
/// search's own), so it is caught and logged rather than allowed to
/// unwind through a `rayon` worker and abort the run.
fn call_progress<F: Fn(&str) + Send + Sync + ?Sized>(cb: &F, message: &str) {
    if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(message))) {
        let reason = panic
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");
        warn!("progress callback panicked, ignoring: {reason}");
    }
}

fn zero_plugboard_match_rate(
    rotors: &[Rotor; 3],
    reflector: Reflector,
    crib: &[u8],
    cipher_slice: &[u8],
    offset: usize,
) -> f64 {
    let mut machine = EnigmaMachine::new(*rotors, reflector, Plugboard::empty());
    machine.set_rotor_positions(&[rotors[0].position(), rotors[1].position(), rotors[2].position()]);
    for _ in 0..offset {
        machine.step_rotors();
    }
    let matches = crib
        .iter()
        .zip(cipher_slice.iter())
        .filter(|&(&c, &t)| machine.encrypt_char(c) == t)
        .count();
    matches as f64 / crib.len() as f64
}
