// Record key generation
//
// Push keys are 20 characters: 8 characters of millisecond timestamp followed
// by 12 random characters, drawn from an alphabet whose ASCII order matches
// its numeric order. Keys therefore sort by creation time, and keys minted in
// the same millisecond are made distinct by incrementing the random tail.

use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIMESTAMP_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Debug, Default)]
struct PushIdState {
    last_millis: i64,
    last_random: [u8; RANDOM_LEN],
}

#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushIdState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_at(&self, millis: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        // Never step backwards, even if the wall clock does.
        let millis = millis.max(state.last_millis);
        if millis == state.last_millis && state.last_random != [0; RANDOM_LEN] {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.random_range(0..64u8);
            }
            state.last_millis = millis;
        }

        let mut key = String::with_capacity(TIMESTAMP_LEN + RANDOM_LEN);
        key.push_str(&encode_timestamp(millis));
        for &digit in state.last_random.iter() {
            key.push(PUSH_CHARS[digit as usize] as char);
        }
        key
    }
}

impl IdGenerator for PushIdGenerator {
    fn next_id(&self) -> String {
        self.generate_at(Utc::now().timestamp_millis())
    }
}

fn encode_timestamp(millis: i64) -> String {
    let mut remaining = millis.max(0) as u64;
    let mut chars = [b'-'; TIMESTAMP_LEN];
    for slot in chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(remaining % 64) as usize];
        remaining /= 64;
    }
    chars.iter().map(|&c| c as char).collect()
}

fn increment(digits: &mut [u8; RANDOM_LEN]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

/// `prefix1`, `prefix2`, ... Deterministic keys for tests and demos.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{}", self.prefix, n)
    }
}
