//! interning for [`super::Penalties`]. The universe of legal encodings is
//! small (~60), so decoding and the mutators route every freshly-built value
//! through here and hand back the canonical instance for that encoding.
//! Purely an internal optimisation: observable only as repeated allocations
//! avoided, never as a behavioural difference, since `Penalties` is `Copy`.

use super::Penalties;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

fn pool() -> &'static Mutex<HashMap<u16, Penalties>> {
    static POOL: OnceLock<Mutex<HashMap<u16, Penalties>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(HashMap::new()))
}

pub(super) fn intern(p: Penalties) -> Penalties {
    let key = p.encode();
    let mut pool = pool().lock().expect("penalties cache poisoned");
    *pool.entry(key).or_insert(p)
}
