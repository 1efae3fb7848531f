//! Value identity for generated types.
//!
//! Generated structs hold `f64` fields, which rules out deriving `Eq` and
//! `Hash`. These traits give every wire type a total equality and a stable
//! 32-bit hash that agree with each other: doubles compare and hash by bit
//! pattern, so a NaN equals itself.
//!
//! The hash values are fixed. Scalars follow the conventional JVM
//! `hashCode` definitions so hashes computed here match peers that used
//! those, and generated structs fold their fields with an FNV-style mix.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

pub trait ThriftHash {
    fn thrift_hash(&self) -> i32;
}

pub trait ThriftEq {
    fn thrift_eq(&self, other: &Self) -> bool;
}

impl ThriftHash for bool {
    fn thrift_hash(&self) -> i32 {
        if *self { 1231 } else { 1237 }
    }
}

impl ThriftHash for i8 {
    fn thrift_hash(&self) -> i32 {
        i32::from(*self)
    }
}

impl ThriftHash for u8 {
    fn thrift_hash(&self) -> i32 {
        i32::from(*self as i8)
    }
}

impl ThriftHash for i16 {
    fn thrift_hash(&self) -> i32 {
        i32::from(*self)
    }
}

impl ThriftHash for i32 {
    fn thrift_hash(&self) -> i32 {
        *self
    }
}

impl ThriftHash for i64 {
    fn thrift_hash(&self) -> i32 {
        fold(*self as u64)
    }
}

impl ThriftHash for f64 {
    fn thrift_hash(&self) -> i32 {
        fold(self.to_bits())
    }
}

fn fold(bits: u64) -> i32 {
    (bits ^ (bits >> 32)) as u32 as i32
}

impl ThriftHash for str {
    fn thrift_hash(&self) -> i32 {
        self.encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
    }
}

impl ThriftHash for String {
    fn thrift_hash(&self) -> i32 {
        self.as_str().thrift_hash()
    }
}

impl<T: ThriftHash + ?Sized> ThriftHash for &T {
    fn thrift_hash(&self) -> i32 {
        (**self).thrift_hash()
    }
}

impl<T: ThriftHash + ?Sized> ThriftHash for Box<T> {
    fn thrift_hash(&self) -> i32 {
        (**self).thrift_hash()
    }
}

impl<T: ThriftHash> ThriftHash for Option<T> {
    fn thrift_hash(&self) -> i32 {
        self.as_ref().map_or(0, ThriftHash::thrift_hash)
    }
}

fn ordered<'a, T: ThriftHash + 'a>(items: impl Iterator<Item = &'a T>) -> i32 {
    items.fold(1i32, |h, item| h.wrapping_mul(31).wrapping_add(item.thrift_hash()))
}

fn unordered<'a, T: ThriftHash + 'a>(items: impl Iterator<Item = &'a T>) -> i32 {
    items.fold(0i32, |h, item| h.wrapping_add(item.thrift_hash()))
}

fn entries<'a, K: ThriftHash + 'a, V: ThriftHash + 'a>(
    items: impl Iterator<Item = (&'a K, &'a V)>,
) -> i32 {
    items.fold(0i32, |h, (k, v)| h.wrapping_add(k.thrift_hash() ^ v.thrift_hash()))
}

impl<T: ThriftHash> ThriftHash for [T] {
    fn thrift_hash(&self) -> i32 {
        ordered(self.iter())
    }
}

impl<T: ThriftHash> ThriftHash for Vec<T> {
    fn thrift_hash(&self) -> i32 {
        ordered(self.iter())
    }
}

impl<T: ThriftHash> ThriftHash for VecDeque<T> {
    fn thrift_hash(&self) -> i32 {
        ordered(self.iter())
    }
}

impl<T: ThriftHash, S> ThriftHash for HashSet<T, S> {
    fn thrift_hash(&self) -> i32 {
        unordered(self.iter())
    }
}

impl<T: ThriftHash> ThriftHash for BTreeSet<T> {
    fn thrift_hash(&self) -> i32 {
        unordered(self.iter())
    }
}

impl<K: ThriftHash, V: ThriftHash, S> ThriftHash for HashMap<K, V, S> {
    fn thrift_hash(&self) -> i32 {
        entries(self.iter())
    }
}

impl<K: ThriftHash, V: ThriftHash> ThriftHash for BTreeMap<K, V> {
    fn thrift_hash(&self) -> i32 {
        entries(self.iter())
    }
}

macro_rules! eq_by_partial_eq {
    ($($ty:ty),*) => {$(
        impl ThriftEq for $ty {
            fn thrift_eq(&self, other: &Self) -> bool {
                self == other
            }
        }
    )*};
}

eq_by_partial_eq!(bool, i8, u8, i16, i32, i64, str, String);

impl ThriftEq for f64 {
    fn thrift_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl<T: ThriftEq + ?Sized> ThriftEq for Box<T> {
    fn thrift_eq(&self, other: &Self) -> bool {
        (**self).thrift_eq(other)
    }
}

impl<T: ThriftEq> ThriftEq for Option<T> {
    fn thrift_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.thrift_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ThriftEq> ThriftEq for [T] {
    fn thrift_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.thrift_eq(b))
    }
}

impl<T: ThriftEq> ThriftEq for Vec<T> {
    fn thrift_eq(&self, other: &Self) -> bool {
        self.as_slice().thrift_eq(other.as_slice())
    }
}

impl<T: ThriftEq> ThriftEq for VecDeque<T> {
    fn thrift_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.thrift_eq(b))
    }
}

// Set elements and map keys are never doubles, so their own `Eq` already
// agrees with `ThriftEq`.

impl<T: Eq + Hash, S: std::hash::BuildHasher> ThriftEq for HashSet<T, S> {
    fn thrift_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: Ord> ThriftEq for BTreeSet<T> {
    fn thrift_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<K: Eq + Hash, V: ThriftEq, S: std::hash::BuildHasher> ThriftEq for HashMap<K, V, S> {
    fn thrift_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.thrift_eq(o)))
    }
}

impl<K: Ord, V: ThriftEq> ThriftEq for BTreeMap<K, V> {
    fn thrift_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.thrift_eq(o)))
    }
}
