//! Key ordering and bucket hashing.
//!
//! Every ordered structure only needs `K: Ord`; numeric keys compare
//! numerically and strings compare lexicographically. The hash table
//! additionally needs to map a key onto one of its buckets, which is what
//! [`BucketHash`] provides. It is implemented for the primitive integers,
//! `char`, `bool`, strings and tuples of up to four hashable elements.

/// Maps a key onto a bucket index in `0..capacity`.
pub trait BucketHash {
    /// Returns the bucket for this key. `capacity` is never zero.
    fn bucket(&self, capacity: usize) -> usize;
}

macro_rules! impl_bucket_hash_unsigned {
    ($($t:ty),*) => {
        $(
            impl BucketHash for $t {
                #[inline]
                fn bucket(&self, capacity: usize) -> usize {
                    (*self as u128 % capacity as u128) as usize
                }
            }
        )*
    };
}

macro_rules! impl_bucket_hash_signed {
    ($($t:ty),*) => {
        $(
            impl BucketHash for $t {
                #[inline]
                fn bucket(&self, capacity: usize) -> usize {
                    (*self as i128).rem_euclid(capacity as i128) as usize
                }
            }
        )*
    };
}

impl_bucket_hash_unsigned!(u8, u16, u32, u64, u128, usize);
impl_bucket_hash_signed!(i8, i16, i32, i64, i128, isize);

impl BucketHash for char {
    #[inline]
    fn bucket(&self, capacity: usize) -> usize {
        (*self as u32).bucket(capacity)
    }
}

impl BucketHash for bool {
    #[inline]
    fn bucket(&self, capacity: usize) -> usize {
        (*self as u8).bucket(capacity)
    }
}

// Tuples combine element buckets with the same 31-multiplier fold as strings.
macro_rules! impl_bucket_hash_tuple {
    ($(($($name:ident),+)),*) => {
        $(
            impl<$($name: BucketHash),+> BucketHash for ($($name,)+) {
                #[allow(non_snake_case)]
                fn bucket(&self, capacity: usize) -> usize {
                    let ($($name,)+) = self;
                    let mut h = 0usize;
                    $(
                        h = h.wrapping_mul(31).wrapping_add($name.bucket(capacity));
                    )+
                    h % capacity
                }
            }
        )*
    };
}

impl_bucket_hash_tuple!((A), (A, B), (A, B, C), (A, B, C, D));

/// Polynomial string hash (`h = h * 31 + c`) folded to 32 signed bits.
pub fn string_hash(s: &str) -> i32 {
    s.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}

impl BucketHash for str {
    #[inline]
    fn bucket(&self, capacity: usize) -> usize {
        string_hash(self).unsigned_abs() as usize % capacity
    }
}

impl BucketHash for String {
    #[inline]
    fn bucket(&self, capacity: usize) -> usize {
        self.as_str().bucket(capacity)
    }
}

impl<T: BucketHash + ?Sized> BucketHash for &T {
    #[inline]
    fn bucket(&self, capacity: usize) -> usize {
        (**self).bucket(capacity)
    }
}
