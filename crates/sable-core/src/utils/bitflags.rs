// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Declares bit-set newtypes over an unsigned integer.

/// Declares a `Copy` bit-set type with named constants, set operations and a
/// `Debug` impl listing the set flags by name.
///
/// Zero-valued constants are allowed and never show up in `Debug` output.
#[macro_export]
#[doc(hidden)]
macro_rules! sable_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// No bits set.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Wraps raw bits. Unnamed bits are kept.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits }
            }

            /// Returns the raw bits.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Whether every bit of `other` is set.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Whether any bit of `other` is set.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Bits set in either.
            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }

            /// Bits of `self` not set in `other`.
            #[must_use]
            pub const fn difference(self, other: Self) -> Self {
                Self { bits: self.bits & !other.bits }
            }

            /// Sets or clears the bits of `other`.
            pub fn set(&mut self, other: Self, enabled: bool) {
                if enabled {
                    self.bits |= other.bits;
                } else {
                    self.bits &= !other.bits;
                }
            }

            /// Number of bits set.
            pub const fn count(&self) -> u32 {
                self.bits.count_ones()
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                self.union(other)
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::ops::BitAndAssign for $name {
            fn bitand_assign(&mut self, other: Self) {
                self.bits &= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut rest = self.bits;
                let mut first = true;
                write!(f, "{}(", stringify!($name))?;
                $(
                    let value: $ty = $flag_value;
                    if value != 0 && (rest & value) == value {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        rest &= !value;
                        first = false;
                    }
                )*
                if rest != 0 {
                    if !first {
                        write!(f, " | ")?;
                    }
                    write!(f, "{:#x}", rest)?;
                    first = false;
                }
                if first {
                    write!(f, "EMPTY")?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::sable_bitflags;

    sable_bitflags! {
        /// Flags used by the tests below.
        pub struct Sides: u8 {
            const NONE = 0;
            const LEFT = 1 << 0;
            const RIGHT = 1 << 1;
            const TOP = 1 << 2;
            const HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
        }
    }

    #[test]
    fn test_set_operations() {
        let sides = Sides::LEFT | Sides::TOP;
        assert!(sides.contains(Sides::LEFT));
        assert!(!sides.contains(Sides::HORIZONTAL));
        assert!(sides.intersects(Sides::HORIZONTAL));
        assert_eq!(sides.difference(Sides::LEFT), Sides::TOP);
        assert_eq!(sides & Sides::HORIZONTAL, Sides::LEFT);
        assert_eq!(sides.count(), 2);
        assert_eq!(Sides::default(), Sides::EMPTY);
    }

    #[test]
    fn test_set_toggles_bits() {
        let mut sides = Sides::HORIZONTAL;
        sides.set(Sides::LEFT, false);
        assert_eq!(sides, Sides::RIGHT);
        sides.set(Sides::TOP, true);
        assert_eq!(sides.bits(), 0b110);
    }

    #[test]
    fn test_debug_names_flags() {
        assert_eq!(format!("{:?}", Sides::NONE), "Sides(EMPTY)");
        assert_eq!(format!("{:?}", Sides::HORIZONTAL), "Sides(LEFT | RIGHT)");
        assert_eq!(
            format!("{:?}", Sides::TOP | Sides::from_bits_truncate(0x40)),
            "Sides(TOP | 0x40)"
        );
    }
}
