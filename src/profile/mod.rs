//! Galosh profiles: position-specific match emissions with non-affine
//! pre-align and post-align insertion states and a single set of interior
//! transition parameters shared by every position.
//!
//! [`Profile`] is generic over its [`Residue`] order and its numeric type, so
//! the same model can be held in real space (`f64`) or log space
//! ([`LogProb`](crate::math::LogProb)). Code that only needs to read or fill
//! a profile is written against the [`ProfileModel`] trait.

use crate::{
    ProfillicError, ProfillicResult,
    data::Alphabet,
    math::{ProbNumber, argmax, normalize, zero},
};
use std::{fmt::Debug, marker::PhantomData};

mod text;
pub use text::*;

/// A residue ordering for profile emissions.
pub trait Residue: Copy + Debug + Default + PartialEq + 'static {
    /// The residues in emission order
    const SYMBOLS: &'static [u8];
    /// The alphabet these residues belong to
    const ALPHABET: Alphabet;

    /// The number of residues.
    #[inline]
    #[must_use]
    fn size() -> usize {
        Self::SYMBOLS.len()
    }
}

/// Nucleotides in `ACGT` order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dna;

/// Amino acids in `ARNDCQEGHILKMFPSTWYV` order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Amino;

impl Residue for Dna {
    const SYMBOLS: &'static [u8] = b"ACGT";
    const ALPHABET: Alphabet = Alphabet::Dna;
}

impl Residue for Amino {
    const SYMBOLS: &'static [u8] = b"ARNDCQEGHILKMFPSTWYV";
    const ALPHABET: Alphabet = Alphabet::Amino;
}

/// Defines a named group of outgoing transition probabilities.
macro_rules! transition_group {
    ($(#[$doc:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        pub struct $name<T> {
            $(pub $field: T),+
        }

        impl<T: ProbNumber> $name<T> {
            /// The field names, in the order they are serialized.
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Rescales the group to sum to one; see
            /// [`normalize`](crate::math::normalize).
            #[inline]
            pub fn normalize(&mut self, floor: f64) {
                let mut v = [$(self.$field),+];
                normalize(&mut v, floor);
                let [$($field),+] = v;
                $(self.$field = $field;)+
            }

            #[inline]
            pub fn zero(&mut self) {
                $(self.$field = T::ZERO;)+
            }

            /// Adds another group's values into this one.
            #[inline]
            pub fn accumulate(&mut self, other: &Self) {
                $(self.$field += other.$field;)+
            }

            #[inline]
            #[must_use]
            pub fn sum(&self) -> T {
                T::ZERO $(+ self.$field)+
            }

            #[inline]
            #[must_use]
            pub fn values(&self) -> Vec<T> {
                vec![$(self.$field),+]
            }

            /// Sets the group from values in serialized order. Returns `None` on
            /// a length mismatch.
            #[inline]
            pub fn set_values(&mut self, values: &[T]) -> Option<()> {
                let [$($field),+] = values else {
                    return None;
                };
                $(self.$field = *$field;)+
                Some(())
            }
        }
    };
}

transition_group!(
    /// Transitions out of the pre-align insertion state.
    FromPreAlign { to_pre_align, to_begin }
);
transition_group!(
    /// Transitions out of the begin state.
    FromBegin { to_match, to_deletion }
);
transition_group!(
    /// Transitions out of any interior match state.
    FromMatch { to_match, to_insertion, to_deletion }
);
transition_group!(
    /// Transitions out of any interior insertion state.
    FromInsertion { to_match, to_insertion }
);
transition_group!(
    /// Transitions out of any deletion state.
    FromDeletion { to_match, to_deletion }
);
transition_group!(
    /// Transitions out of the post-align insertion state.
    FromPostAlign { to_post_align, to_terminal }
);

/// Every transition parameter of a profile.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transitions<T> {
    pub from_pre_align:  FromPreAlign<T>,
    pub from_begin:      FromBegin<T>,
    pub from_match:      FromMatch<T>,
    pub from_insertion:  FromInsertion<T>,
    pub from_deletion:   FromDeletion<T>,
    pub from_post_align: FromPostAlign<T>,
}

impl<T: ProbNumber> Transitions<T> {
    pub fn normalize(&mut self, floor: f64) {
        self.from_pre_align.normalize(floor);
        self.from_begin.normalize(floor);
        self.from_match.normalize(floor);
        self.from_insertion.normalize(floor);
        self.from_deletion.normalize(floor);
        self.from_post_align.normalize(floor);
    }

    pub fn zero(&mut self) {
        self.from_pre_align.zero();
        self.from_begin.zero();
        self.from_match.zero();
        self.from_insertion.zero();
        self.from_deletion.zero();
        self.from_post_align.zero();
    }
}

/// The position-independent emission distributions of a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emission {
    PreAlignInsertion,
    Insertion,
    PostAlignInsertion,
}

/// Read and write access to a galosh profile.
pub trait ProfileModel: Sized {
    type Residue: Residue;
    type Number: ProbNumber;

    /// An all-zero profile with `length` positions.
    fn with_length(length: usize) -> Self;

    /// The number of positions, `M`.
    fn length(&self) -> usize;

    /// The match emission distribution at `pos`, counting from zero.
    fn match_emission(&self, pos: usize) -> &[Self::Number];

    fn match_emission_mut(&mut self, pos: usize) -> &mut [Self::Number];

    fn emission(&self, which: Emission) -> &[Self::Number];

    fn emission_mut(&mut self, which: Emission) -> &mut [Self::Number];

    fn transitions(&self) -> &Transitions<Self::Number>;

    fn transitions_mut(&mut self) -> &mut Transitions<Self::Number>;

    /// Normalizes every transition group and emission distribution. Vectors
    /// that sum to at most `floor` are left as they are.
    fn normalize(&mut self, floor: f64);

    /// Sets every parameter to zero.
    fn zero(&mut self);

    /// The most probable match residue at each position.
    fn consensus(&self) -> Vec<u8> {
        let symbols = <Self::Residue as Residue>::SYMBOLS;
        (0..self.length())
            .map(|pos| argmax(self.match_emission(pos)).map_or(b'X', |i| symbols[i]))
            .collect()
    }
}

/// A galosh profile stored in plain vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile<R: Residue, T: ProbNumber> {
    pub matches:              Vec<Vec<T>>,
    pub pre_align_insertion:  Vec<T>,
    pub insertion:            Vec<T>,
    pub post_align_insertion: Vec<T>,
    pub transitions:          Transitions<T>,
    residue:                  PhantomData<R>,
}

impl<R: Residue, T: ProbNumber> Profile<R, T> {
    #[must_use]
    pub fn new(length: usize) -> Self {
        let k = R::size();
        Profile {
            matches:              vec![vec![T::ZERO; k]; length],
            pre_align_insertion:  vec![T::ZERO; k],
            insertion:            vec![T::ZERO; k],
            post_align_insertion: vec![T::ZERO; k],
            transitions:          Transitions::default(),
            residue:              PhantomData,
        }
    }

    /// A profile with uniform emissions and even transition splits.
    #[must_use]
    pub fn uniform(length: usize) -> Self {
        let mut p = Self::new(length);
        let even = |n: f64| T::from_f64(1.0 / n);
        #[allow(clippy::cast_precision_loss)]
        let k = R::size() as f64;
        for v in p
            .matches
            .iter_mut()
            .chain([&mut p.pre_align_insertion, &mut p.insertion, &mut p.post_align_insertion])
        {
            v.fill(even(k));
        }
        let t = &mut p.transitions;
        t.from_pre_align = FromPreAlign { to_pre_align: even(2.0), to_begin: even(2.0) };
        t.from_begin = FromBegin { to_match: even(2.0), to_deletion: even(2.0) };
        t.from_match = FromMatch { to_match: even(3.0), to_insertion: even(3.0), to_deletion: even(3.0) };
        t.from_insertion = FromInsertion { to_match: even(2.0), to_insertion: even(2.0) };
        t.from_deletion = FromDeletion { to_match: even(2.0), to_deletion: even(2.0) };
        t.from_post_align = FromPostAlign { to_post_align: even(2.0), to_terminal: even(2.0) };
        p
    }
}

impl<R: Residue, T: ProbNumber> ProfileModel for Profile<R, T> {
    type Residue = R;
    type Number = T;

    fn with_length(length: usize) -> Self {
        Self::new(length)
    }

    #[inline]
    fn length(&self) -> usize {
        self.matches.len()
    }

    #[inline]
    fn match_emission(&self, pos: usize) -> &[T] {
        &self.matches[pos]
    }

    #[inline]
    fn match_emission_mut(&mut self, pos: usize) -> &mut [T] {
        &mut self.matches[pos]
    }

    #[inline]
    fn emission(&self, which: Emission) -> &[T] {
        match which {
            Emission::PreAlignInsertion => &self.pre_align_insertion,
            Emission::Insertion => &self.insertion,
            Emission::PostAlignInsertion => &self.post_align_insertion,
        }
    }

    #[inline]
    fn emission_mut(&mut self, which: Emission) -> &mut [T] {
        match which {
            Emission::PreAlignInsertion => &mut self.pre_align_insertion,
            Emission::Insertion => &mut self.insertion,
            Emission::PostAlignInsertion => &mut self.post_align_insertion,
        }
    }

    #[inline]
    fn transitions(&self) -> &Transitions<T> {
        &self.transitions
    }

    #[inline]
    fn transitions_mut(&mut self) -> &mut Transitions<T> {
        &mut self.transitions
    }

    fn normalize(&mut self, floor: f64) {
        self.transitions.normalize(floor);
        for v in self.matches.iter_mut().chain([
            &mut self.pre_align_insertion,
            &mut self.insertion,
            &mut self.post_align_insertion,
        ]) {
            normalize(v, floor);
        }
    }

    fn zero(&mut self) {
        self.transitions.zero();
        for v in self.matches.iter_mut().chain([
            &mut self.pre_align_insertion,
            &mut self.insertion,
            &mut self.post_align_insertion,
        ]) {
            zero(v);
        }
    }
}

/// A real-space profile of either residue type, as read from a file whose
/// alphabet is only known at runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyProfile {
    Dna(Profile<Dna, f64>),
    Amino(Profile<Amino, f64>),
}

impl AnyProfile {
    #[must_use]
    pub fn alphabet(&self) -> Alphabet {
        match self {
            AnyProfile::Dna(_) => Dna::ALPHABET,
            AnyProfile::Amino(_) => Amino::ALPHABET,
        }
    }

    #[must_use]
    pub fn length(&self) -> usize {
        match self {
            AnyProfile::Dna(p) => p.length(),
            AnyProfile::Amino(p) => p.length(),
        }
    }

    #[must_use]
    pub fn consensus(&self) -> Vec<u8> {
        match self {
            AnyProfile::Dna(p) => p.consensus(),
            AnyProfile::Amino(p) => p.consensus(),
        }
    }
}

/// Maps each residue of `R` to its index in `alphabet`.
///
/// # Errors
///
/// Fails if the alphabets differ in size or a residue has no counterpart.
pub(crate) fn residue_map<R: Residue>(alphabet: Alphabet) -> ProfillicResult<Vec<usize>> {
    if R::size() != alphabet.size() {
        return Err(ProfillicError::invalid(format!(
            "profile residues {} do not match the {alphabet} alphabet",
            String::from_utf8_lossy(R::SYMBOLS)
        )));
    }
    R::SYMBOLS
        .iter()
        .map(|&sym| {
            alphabet.index_of(sym).ok_or_else(|| {
                ProfillicError::invalid(format!(
                    "profile residue '{}' is not in the {alphabet} alphabet",
                    char::from(sym)
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod test;
