//! Operator plumbing for the integer newtypes (`SQ`, `BitBoard`).

macro_rules! impl_bit_ops {
    ($t:ident, $b:ty) => {
        impl std::ops::BitAnd for $t {
            type Output = $t;
            #[inline(always)]
            fn bitand(self, rhs: $t) -> $t {
                $t(self.0 & rhs.0)
            }
        }

        impl std::ops::BitAndAssign for $t {
            #[inline(always)]
            fn bitand_assign(&mut self, rhs: $t) {
                self.0 &= rhs.0;
            }
        }

        impl std::ops::BitOr for $t {
            type Output = $t;
            #[inline(always)]
            fn bitor(self, rhs: $t) -> $t {
                $t(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $t {
            #[inline(always)]
            fn bitor_assign(&mut self, rhs: $t) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitXor for $t {
            type Output = $t;
            #[inline(always)]
            fn bitxor(self, rhs: $t) -> $t {
                $t(self.0 ^ rhs.0)
            }
        }

        impl std::ops::BitXorAssign for $t {
            #[inline(always)]
            fn bitxor_assign(&mut self, rhs: $t) {
                self.0 ^= rhs.0;
            }
        }

        impl std::ops::Not for $t {
            type Output = $t;
            #[inline(always)]
            fn not(self) -> $t {
                $t(!self.0)
            }
        }

        impl std::ops::Add for $t {
            type Output = $t;
            #[inline(always)]
            fn add(self, rhs: $t) -> $t {
                $t(self.0.wrapping_add(rhs.0))
            }
        }

        impl std::ops::AddAssign for $t {
            #[inline(always)]
            fn add_assign(&mut self, rhs: $t) {
                self.0 = self.0.wrapping_add(rhs.0);
            }
        }

        impl std::ops::Sub for $t {
            type Output = $t;
            #[inline(always)]
            fn sub(self, rhs: $t) -> $t {
                $t(self.0.wrapping_sub(rhs.0))
            }
        }

        impl std::ops::SubAssign for $t {
            #[inline(always)]
            fn sub_assign(&mut self, rhs: $t) {
                self.0 = self.0.wrapping_sub(rhs.0);
            }
        }

        impl std::ops::Shl<usize> for $t {
            type Output = $t;
            #[inline(always)]
            fn shl(self, rhs: usize) -> $t {
                $t(self.0.wrapping_shl(rhs as u32))
            }
        }

        impl std::ops::Shr<usize> for $t {
            type Output = $t;
            #[inline(always)]
            fn shr(self, rhs: usize) -> $t {
                $t(self.0.wrapping_shr(rhs as u32))
            }
        }

        impl From<$t> for $b {
            #[inline(always)]
            fn from(v: $t) -> $b {
                v.0
            }
        }
    };
}
