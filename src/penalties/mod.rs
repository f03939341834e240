//! WCA pre/post-start penalty algebra (§3.2/§4.1).

mod cache;

use crate::error::{CoreError, CoreResult};

/// a single penalty: no penalty, a "+2" time penalty, or a DNF disqualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Penalty {
    None,
    PlusTwo,
    Dnf,
}

const MAX_PLUS_TWOS: u8 = 4;

/// immutable set of pre-start (inspection) and post-start (solve) penalties.
///
/// `Penalties` is a pure value object: every mutator returns a new value,
/// never mutates in place. Equal inputs always produce an equal, and where
/// possible identical (interned), instance — see [`cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Penalties {
    pre_plus_twos: u8,
    pre_dnf: bool,
    post_plus_twos: u8,
    post_dnf: bool,
}

/// the penalty-free value every solve starts from.
pub const NO_PENALTIES: Penalties = Penalties {
    pre_plus_twos: 0,
    pre_dnf: false,
    post_plus_twos: 0,
    post_dnf: false,
};

impl Default for Penalties {
    fn default() -> Self {
        NO_PENALTIES
    }
}

impl Penalties {
    pub fn pre_plus_twos(&self) -> u8 {
        self.pre_plus_twos
    }
    pub fn post_plus_twos(&self) -> u8 {
        self.post_plus_twos
    }
    pub fn pre_dnf(&self) -> bool {
        self.pre_dnf
    }
    pub fn post_dnf(&self) -> bool {
        self.post_dnf
    }
    pub fn has_post_penalties(&self) -> bool {
        self.post_plus_twos > 0 || self.post_dnf
    }
    pub fn is_dnf(&self) -> bool {
        self.pre_dnf || self.post_dnf
    }

    /// total time penalty in ms, regardless of DNF state (§3.2).
    pub fn time_penalty_ms(&self) -> crate::TimeMs {
        (self.pre_plus_twos as crate::TimeMs + self.post_plus_twos as crate::TimeMs)
            * crate::PLUS_TWO_MS
    }

    fn room_in_pre(&self, p: Penalty) -> bool {
        match p {
            Penalty::None => true,
            Penalty::PlusTwo => self.pre_plus_twos < MAX_PLUS_TWOS,
            Penalty::Dnf => !self.pre_dnf && !self.post_dnf,
        }
    }

    /// adds `p` to the pre-start (inspection) phase if there is room;
    /// otherwise returns `self` unchanged.
    pub fn incur_pre_start(&self, p: Penalty) -> Self {
        if !self.room_in_pre(p) {
            return *self;
        }
        let next = match p {
            Penalty::None => *self,
            Penalty::PlusTwo => Self {
                pre_plus_twos: self.pre_plus_twos + 1,
                ..*self
            },
            Penalty::Dnf => Self {
                pre_dnf: true,
                post_plus_twos: 0,
                post_dnf: false,
                ..*self
            },
        };
        cache::intern(next)
    }

    pub fn can_incur_post_start(&self, p: Penalty) -> bool {
        if self.pre_dnf {
            return false;
        }
        match p {
            Penalty::None => true,
            Penalty::PlusTwo => self.post_plus_twos < MAX_PLUS_TWOS,
            Penalty::Dnf => !self.post_dnf,
        }
    }

    /// adds `p` to the post-start (solve) phase; blocked entirely if a
    /// pre-start DNF exists (§4.1).
    pub fn incur_post_start(&self, p: Penalty) -> Self {
        if !self.can_incur_post_start(p) {
            return *self;
        }
        let next = match p {
            Penalty::None => *self,
            Penalty::PlusTwo => Self {
                post_plus_twos: self.post_plus_twos + 1,
                ..*self
            },
            Penalty::Dnf => Self {
                post_dnf: true,
                ..*self
            },
        };
        cache::intern(next)
    }

    pub fn can_annul_post_start(&self, p: Penalty) -> bool {
        match p {
            Penalty::None => true,
            Penalty::PlusTwo => self.post_plus_twos > 0,
            Penalty::Dnf => self.post_dnf,
        }
    }

    /// removes one instance of `p` from the post-start phase, if present.
    /// pre-start penalties can never be annulled.
    pub fn annul_post_start(&self, p: Penalty) -> Self {
        if !self.can_annul_post_start(p) {
            return *self;
        }
        let next = match p {
            Penalty::None => *self,
            Penalty::PlusTwo => Self {
                post_plus_twos: self.post_plus_twos - 1,
                ..*self
            },
            Penalty::Dnf => Self {
                post_dnf: false,
                ..*self
            },
        };
        cache::intern(next)
    }

    fn phase_byte(plus_twos: u8, dnf: bool) -> u16 {
        2 * plus_twos as u16 + dnf as u16
    }

    /// packs into the 16-bit on-disk encoding: pre-phase in bits 0-7,
    /// post-phase in bits 8-15; within a phase, bit 0 is the DNF flag and
    /// bits 1+ hold `plus_twos` (§3.2).
    pub fn encode(&self) -> u16 {
        let pre = Self::phase_byte(self.pre_plus_twos, self.pre_dnf);
        let post = Self::phase_byte(self.post_plus_twos, self.post_dnf);
        pre | (post << 8)
    }

    /// decodes a 16-bit encoding, rejecting any bit pattern that could not
    /// have been produced by [`Penalties::encode`].
    pub fn decode(bits: i32) -> CoreResult<Self> {
        if bits < 0 {
            return Err(CoreError::invalid_encoding(format!(
                "negative penalties encoding {bits}"
            )));
        }
        if bits > 0xFFFF {
            return Err(CoreError::invalid_encoding(format!(
                "penalties encoding {bits} has bits outside 0..=15"
            )));
        }
        let bits = bits as u16;
        let pre_byte = bits & 0xFF;
        let post_byte = (bits >> 8) & 0xFF;
        let pre_dnf = pre_byte & 1 == 1;
        let pre_plus_twos = (pre_byte >> 1) as u8;
        let post_dnf = post_byte & 1 == 1;
        let post_plus_twos = (post_byte >> 1) as u8;

        if pre_plus_twos > MAX_PLUS_TWOS || post_plus_twos > MAX_PLUS_TWOS {
            return Err(CoreError::invalid_encoding(format!(
                "penalties encoding {bits:#06x} exceeds the max of {MAX_PLUS_TWOS} plus-twos per phase"
            )));
        }
        if pre_dnf && (post_plus_twos > 0 || post_dnf) {
            return Err(CoreError::invalid_encoding(
                "penalties encoding has a pre-start DNF combined with post-start penalties",
            ));
        }

        Ok(cache::intern(Self {
            pre_plus_twos,
            pre_dnf,
            post_plus_twos,
            post_dnf,
        }))
    }
}

impl std::fmt::Display for Penalties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pre_dnf {
            return write!(f, "DNF(pre)");
        }
        if self.post_dnf {
            return write!(f, "DNF(post) +{}", self.pre_plus_twos);
        }
        write!(f, "+{}/+{}", self.pre_plus_twos, self.post_plus_twos)
    }
}

/// serialises to/from the 16-bit encoding (§3.2, §6 "Persistence blob
/// (Penalties)"), not the struct's field layout.
impl serde::Serialize for Penalties {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.encode())
    }
}

impl<'de> serde::Deserialize<'de> for Penalties {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u16::deserialize(deserializer)?;
        Penalties::decode(bits as i32).map_err(serde::de::Error::custom)
    }
}

impl crate::Arbitrary for Penalties {
    fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        loop {
            let bits = rng.random_range(0..=0xFFFFu16) as i32;
            if let Ok(p) = Self::decode(bits) {
                return p;
            }
        }
    }
}

#[cfg(test)]
mod penalties_tests {
    use super::*;

    #[test]
    fn round_trip_every_legal_encoding() {
        for bits in 0..=0xFFFFi32 {
            if let Ok(p) = Penalties::decode(bits) {
                assert_eq!(Penalties::decode(p.encode() as i32).unwrap(), p);
                assert_eq!(p.encode() as i32, bits);
            }
        }
    }

    #[test]
    fn decode_rejects_negative() {
        assert!(Penalties::decode(-1).is_err());
    }

    #[test]
    fn decode_rejects_out_of_range_bits() {
        assert!(Penalties::decode(0x1_0000).is_err());
    }

    #[test]
    fn decode_rejects_excess_plus_twos() {
        // pre phase byte = 2*5 + 0 = 10, exceeds MAX_PLUS_TWOS
        assert!(Penalties::decode(10).is_err());
    }

    #[test]
    fn decode_rejects_pre_dnf_with_post_penalty() {
        // pre_dnf (byte 1) | post_plus_twos=1 (byte 2) << 8
        let bits = 1 | (2 << 8);
        assert!(Penalties::decode(bits).is_err());
    }

    #[test]
    fn incur_post_start_blocked_by_pre_dnf() {
        let p = NO_PENALTIES.incur_pre_start(Penalty::Dnf);
        assert!(p.pre_dnf());
        assert_eq!(p.incur_post_start(Penalty::PlusTwo), p);
        assert!(!p.can_incur_post_start(Penalty::PlusTwo));
    }

    #[test]
    fn pre_start_caps_at_four_plus_twos() {
        let mut p = NO_PENALTIES;
        for _ in 0..10 {
            p = p.incur_pre_start(Penalty::PlusTwo);
        }
        assert_eq!(p.pre_plus_twos(), 4);
    }

    #[test]
    fn incur_then_annul_post_start_is_identity() {
        let p = NO_PENALTIES.incur_post_start(Penalty::PlusTwo);
        assert_eq!(p.annul_post_start(Penalty::PlusTwo), NO_PENALTIES);
    }

    #[test]
    fn time_penalty_counts_both_phases_regardless_of_dnf() {
        let p = NO_PENALTIES
            .incur_pre_start(Penalty::PlusTwo)
            .incur_post_start(Penalty::PlusTwo)
            .incur_post_start(Penalty::Dnf);
        assert_eq!(p.time_penalty_ms(), 4_000);
        assert!(p.is_dnf());
    }

    #[test]
    fn at_most_one_dnf_total() {
        let p = NO_PENALTIES.incur_pre_start(Penalty::Dnf);
        assert!(!p.can_incur_post_start(Penalty::Dnf));
    }
}
