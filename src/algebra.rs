// SPDX-License-Identifier: AGPL-3.0-only

//! Lie-algebra vectors and gauge-group elements for the small-N
//! representations used by the CGC core.
//!
//! Two concrete representations, closed over a tagged enum:
//!
//! - **U(1)** (abelian limit, 1 color): algebra element is a single real
//!   `e`, group element is the phase `exp(i e)`.
//! - **SU(2)** (2 colors): algebra element `A = e_a σ_a / 2` is stored as
//!   the 3-vector `e`, group element `U = u0·1 + i u_a σ_a` as the real
//!   quaternion `(u0, u)`. The quaternion span is closed under addition,
//!   multiplication and inversion, so transient non-unitary combinations
//!   (sums of links used in field construction) stay representable.
//!
//! Conventions:
//!   exp map      `A.exp() = exp(i A)`  →  `(cos |e|/2, ê sin |e|/2)`
//!   projection   `U.proj()_a = 2 u_a`  (anti-Hermitian traceless part)
//!   adjoint act  `Q.act(U) = proj(U† Q U)`  (parallel transport)
//!   inner prod   `Q.square() = 2 Tr A² = Σ e_a²`
//!
//! Binary operations across different representations are programming
//! errors and panic; initialization seams validate component counts up
//! front and return [`GlasmaError::DimensionMismatch`] instead.

use crate::complex::Complex64;
use crate::error::GlasmaError;

/// Norm guard for the exponential map's small-angle branch.
const EXP_NORM_GUARD: f64 = 1e-12;

#[cold]
fn mismatch(expected: usize, found: usize) -> ! {
    panic!("algebra dimension mismatch: {expected} vs {found} components");
}

// ═══════════════════════════════════════════════════════════════════
//  Algebra elements
// ═══════════════════════════════════════════════════════════════════

/// Lie-algebra element: a real vector in the adjoint-index basis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AlgebraElement {
    /// u(1): one real component.
    U1(f64),
    /// su(2): three real components `e_a`, matrix form `e_a σ_a / 2`.
    Su2([f64; 3]),
}

impl AlgebraElement {
    /// Number of adjoint components (N² − 1, or 1 in the abelian limit).
    #[must_use]
    pub const fn n_components(&self) -> usize {
        match self {
            Self::U1(_) => 1,
            Self::Su2(_) => 3,
        }
    }

    /// Component accessor.
    #[must_use]
    pub fn get(&self, c: usize) -> f64 {
        match self {
            Self::U1(e) if c == 0 => *e,
            Self::Su2(e) if c < 3 => e[c],
            _ => mismatch(self.n_components(), c + 1),
        }
    }

    /// Component setter.
    pub fn set(&mut self, c: usize, value: f64) {
        match self {
            Self::U1(e) if c == 0 => *e = value,
            Self::Su2(e) if c < 3 => e[c] = value,
            _ => mismatch(self.n_components(), c + 1),
        }
    }

    #[must_use]
    pub fn add(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Self::U1(a), Self::U1(b)) => Self::U1(a + b),
            (Self::Su2(a), Self::Su2(b)) => {
                Self::Su2([a[0] + b[0], a[1] + b[1], a[2] + b[2]])
            }
            _ => mismatch(self.n_components(), rhs.n_components()),
        }
    }

    #[must_use]
    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.mult(-1.0))
    }

    /// Scalar multiple.
    #[must_use]
    pub fn mult(&self, s: f64) -> Self {
        match self {
            Self::U1(e) => Self::U1(e * s),
            Self::Su2(e) => Self::Su2([e[0] * s, e[1] * s, e[2] * s]),
        }
    }

    /// In-place accumulate.
    pub fn add_assign(&mut self, rhs: &Self) {
        match (&mut *self, rhs) {
            (Self::U1(a), Self::U1(b)) => *a += b,
            (Self::Su2(a), Self::Su2(b)) => {
                a[0] += b[0];
                a[1] += b[1];
                a[2] += b[2];
            }
            _ => mismatch(self.n_components(), rhs.n_components()),
        }
    }

    /// In-place scalar multiply.
    pub fn mult_assign(&mut self, s: f64) {
        match self {
            Self::U1(e) => *e *= s,
            Self::Su2(e) => {
                e[0] *= s;
                e[1] *= s;
                e[2] *= s;
            }
        }
    }

    /// Algebra inner product with itself: `2 Tr A² = Σ e_a²`.
    #[must_use]
    pub fn square(&self) -> f64 {
        match self {
            Self::U1(e) => e * e,
            Self::Su2(e) => e[0] * e[0] + e[1] * e[1] + e[2] * e[2],
        }
    }

    /// Adjoint-representation action: `proj(U† A U)`.
    ///
    /// Parallel transport of a color charge across the link `u`. Abelian
    /// charges commute with the group and are returned unchanged.
    #[must_use]
    pub fn act(&self, u: &GroupElement) -> Self {
        match (self, u) {
            (Self::U1(e), GroupElement::U1(_)) => Self::U1(*e),
            (Self::Su2(e), GroupElement::Su2(q)) => {
                // iA corresponds to the pure quaternion (0, e/2); conjugation
                // stays in the pure sector, so e'_a = 2 w_a.
                let a = [0.0, e[0] * 0.5, e[1] * 0.5, e[2] * 0.5];
                let w = su2_mul(&su2_mul(&su2_adj(q), &a), q);
                Self::Su2([2.0 * w[1], 2.0 * w[2], 2.0 * w[3]])
            }
            _ => mismatch(self.n_components(), u.n_components()),
        }
    }

    /// Exponential map `exp(i A)` onto the group.
    ///
    /// `q.mult(d).exp()` is the fractionally-scaled sub-cell link used by
    /// the charge-conserving deposition scheme.
    #[must_use]
    pub fn exp(&self) -> GroupElement {
        match self {
            Self::U1(e) => GroupElement::U1(Complex64::from_polar(*e)),
            Self::Su2(e) => {
                let norm = self.square().sqrt();
                let half = 0.5 * norm;
                // sin(|e|/2)/|e| with its |e| → 0 limit of 1/2.
                let factor = if norm < EXP_NORM_GUARD {
                    0.5 * (1.0 - half * half / 6.0)
                } else {
                    half.sin() / norm
                };
                GroupElement::Su2([
                    half.cos(),
                    e[0] * factor,
                    e[1] * factor,
                    e[2] * factor,
                ])
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Group elements
// ═══════════════════════════════════════════════════════════════════

/// Gauge-group element (or a transient linear combination of them).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GroupElement {
    /// U(1): complex phase (unit modulus when on the group).
    U1(Complex64),
    /// SU(2): real quaternion `(u0, u1, u2, u3)` for `u0·1 + i u_a σ_a`
    /// (unit norm when on the group).
    Su2([f64; 4]),
}

#[inline]
fn su2_mul(a: &[f64; 4], b: &[f64; 4]) -> [f64; 4] {
    // (a0 + i a·σ)(b0 + i b·σ) = (a0 b0 − a·b) + i(a0 b + b0 a − a×b)·σ
    [
        a[0] * b[0] - a[1] * b[1] - a[2] * b[2] - a[3] * b[3],
        a[0] * b[1] + b[0] * a[1] - (a[2] * b[3] - a[3] * b[2]),
        a[0] * b[2] + b[0] * a[2] - (a[3] * b[1] - a[1] * b[3]),
        a[0] * b[3] + b[0] * a[3] - (a[1] * b[2] - a[2] * b[1]),
    ]
}

#[inline]
const fn su2_adj(a: &[f64; 4]) -> [f64; 4] {
    [a[0], -a[1], -a[2], -a[3]]
}

impl GroupElement {
    /// Adjoint components of the matching algebra representation.
    #[must_use]
    pub const fn n_components(&self) -> usize {
        match self {
            Self::U1(_) => 1,
            Self::Su2(_) => 3,
        }
    }

    /// Group multiplication (total over the full quaternion/complex span).
    #[must_use]
    pub fn mult(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Self::U1(a), Self::U1(b)) => Self::U1(*a * *b),
            (Self::Su2(a), Self::Su2(b)) => Self::Su2(su2_mul(a, b)),
            _ => mismatch(self.n_components(), rhs.n_components()),
        }
    }

    /// Hermitian conjugate.
    #[must_use]
    pub fn adj(&self) -> Self {
        match self {
            Self::U1(a) => Self::U1(a.conj()),
            Self::Su2(a) => Self::Su2(su2_adj(a)),
        }
    }

    /// Multiplicative inverse; the caller guarantees a nonzero norm.
    #[must_use]
    pub fn inv(&self) -> Self {
        match self {
            Self::U1(a) => Self::U1(a.inv()),
            Self::Su2(a) => {
                let n = a[0] * a[0] + a[1] * a[1] + a[2] * a[2] + a[3] * a[3];
                let s = 1.0 / n;
                Self::Su2([a[0] * s, -a[1] * s, -a[2] * s, -a[3] * s])
            }
        }
    }

    /// Element-wise sum (transient, used in field construction only).
    #[must_use]
    pub fn add(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Self::U1(a), Self::U1(b)) => Self::U1(*a + *b),
            (Self::Su2(a), Self::Su2(b)) => Self::Su2([
                a[0] + b[0],
                a[1] + b[1],
                a[2] + b[2],
                a[3] + b[3],
            ]),
            _ => mismatch(self.n_components(), rhs.n_components()),
        }
    }

    /// Element-wise difference (transient).
    #[must_use]
    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.scale(-1.0))
    }

    /// Scale by a real number (transient).
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        match self {
            Self::U1(a) => Self::U1(a.scale(s)),
            Self::Su2(a) => Self::Su2([a[0] * s, a[1] * s, a[2] * s, a[3] * s]),
        }
    }

    /// Projection onto the algebra: anti-Hermitian traceless part.
    #[must_use]
    pub fn proj(&self) -> AlgebraElement {
        match self {
            Self::U1(a) => AlgebraElement::U1(a.im),
            Self::Su2(a) => AlgebraElement::Su2([2.0 * a[1], 2.0 * a[2], 2.0 * a[3]]),
        }
    }

    /// Squared quaternion/complex norm (1 for elements on the group).
    #[must_use]
    pub fn norm_sq(&self) -> f64 {
        match self {
            Self::U1(a) => a.abs_sq(),
            Self::Su2(a) => a[0] * a[0] + a[1] * a[1] + a[2] * a[2] + a[3] * a[3],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Element factory
// ═══════════════════════════════════════════════════════════════════

/// Produces zero/identity elements for a fixed color count.
///
/// The factory is the single place where the color count is validated;
/// everything downstream works with whichever representation it hands out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementFactory {
    colors: usize,
}

impl ElementFactory {
    /// Supported color counts: 1 (abelian limit) and 2 (SU(2)).
    pub fn new(colors: usize) -> Result<Self, GlasmaError> {
        match colors {
            1 | 2 => Ok(Self { colors }),
            _ => Err(GlasmaError::UnsupportedColorCount { colors }),
        }
    }

    #[must_use]
    pub const fn colors(&self) -> usize {
        self.colors
    }

    /// Adjoint components: N² − 1, or 1 in the abelian limit.
    #[must_use]
    pub const fn n_components(&self) -> usize {
        if self.colors > 1 {
            self.colors * self.colors - 1
        } else {
            1
        }
    }

    /// Zero algebra element.
    #[must_use]
    pub const fn algebra_zero(&self) -> AlgebraElement {
        match self.colors {
            1 => AlgebraElement::U1(0.0),
            _ => AlgebraElement::Su2([0.0; 3]),
        }
    }

    /// Group identity.
    #[must_use]
    pub const fn group_identity(&self) -> GroupElement {
        match self.colors {
            1 => GroupElement::U1(Complex64::ONE),
            _ => GroupElement::Su2([1.0, 0.0, 0.0, 0.0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn su2(e: [f64; 3]) -> AlgebraElement {
        AlgebraElement::Su2(e)
    }

    #[test]
    fn factory_rejects_three_colors() {
        assert_eq!(
            ElementFactory::new(3),
            Err(GlasmaError::UnsupportedColorCount { colors: 3 })
        );
        assert_eq!(ElementFactory::new(2).unwrap().n_components(), 3);
        assert_eq!(ElementFactory::new(1).unwrap().n_components(), 1);
    }

    #[test]
    fn exp_map_lands_on_the_group() {
        let q = su2([0.3, -0.7, 1.1]);
        let u = q.exp();
        assert!((u.norm_sq() - 1.0).abs() < 1e-14, "exp(iA) must be unitary");
    }

    #[test]
    fn exp_then_proj_recovers_small_elements() {
        let q = su2([1e-4, -2e-4, 3e-4]);
        let p = q.exp().proj();
        for c in 0..3 {
            assert!(
                (p.get(c) - q.get(c)).abs() < 1e-10,
                "proj(exp(iA)) ≈ A for small A, component {c}"
            );
        }
    }

    #[test]
    fn exp_small_norm_branch_is_continuous() {
        let a = su2([1e-13, 0.0, 0.0]).exp();
        let b = su2([2e-12, 0.0, 0.0]).exp();
        if let (GroupElement::Su2(qa), GroupElement::Su2(qb)) = (a, b) {
            assert!((qa[1] / 1e-13 - qb[1] / 2e-12).abs() < 1e-6);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn parallel_transport_round_trip() {
        let q = su2([0.4, -1.2, 0.9]);
        let u = su2([0.8, 0.1, -0.5]).exp();
        let back = q.act(&u).act(&u.adj());
        for c in 0..3 {
            assert!(
                (back.get(c) - q.get(c)).abs() < 1e-12,
                "Q.act(U).act(U†) must equal Q, component {c}"
            );
        }
    }

    #[test]
    fn adjoint_action_preserves_the_inner_product() {
        let q = su2([0.4, -1.2, 0.9]);
        let u = su2([-0.3, 0.6, 1.4]).exp();
        assert!((q.act(&u).square() - q.square()).abs() < 1e-12);
    }

    #[test]
    fn abelian_transport_is_trivial() {
        let q = AlgebraElement::U1(0.7);
        let u = AlgebraElement::U1(1.3).exp();
        assert!((q.act(&u).get(0) - 0.7).abs() < 1e-15);
    }

    #[test]
    fn group_mult_agrees_with_exp_of_parallel_elements() {
        // exp(iA) exp(iB) = exp(i(A+B)) when [A, B] = 0.
        let a = su2([0.5, 0.0, 0.0]);
        let b = su2([0.3, 0.0, 0.0]);
        let lhs = a.exp().mult(&b.exp());
        let rhs = a.add(&b).exp();
        if let (GroupElement::Su2(l), GroupElement::Su2(r)) = (lhs, rhs) {
            for i in 0..4 {
                assert!((l[i] - r[i]).abs() < 1e-14);
            }
        } else {
            unreachable!();
        }
    }

    #[test]
    fn inverse_undoes_multiplication() {
        let u = su2([0.8, -0.2, 0.4]).exp();
        let v = su2([0.1, 0.9, -0.6]).exp();
        let w = u.mult(&v).mult(&v.inv());
        if let (GroupElement::Su2(a), GroupElement::Su2(b)) = (w, u) {
            for i in 0..4 {
                assert!((a[i] - b[i]).abs() < 1e-13);
            }
        } else {
            unreachable!();
        }
    }

    #[test]
    fn inverse_of_non_unit_combination() {
        // Sums of group elements leave the unit sphere; inv must still work.
        let u = su2([0.8, -0.2, 0.4]).exp();
        let v = su2([0.1, 0.9, -0.6]).exp();
        let s = u.add(&v);
        let p = s.mult(&s.inv());
        if let GroupElement::Su2(q) = p {
            assert!((q[0] - 1.0).abs() < 1e-13);
            for c in &q[1..] {
                assert!(c.abs() < 1e-13);
            }
        } else {
            unreachable!();
        }
    }

    #[test]
    fn refinement_style_linear_combinations() {
        let q1 = su2([1.0, 2.0, 3.0]);
        let q2 = su2([0.5, -1.0, 2.0]);
        let mut dq = q1.mult(3.0);
        dq.add_assign(&q2.mult(-3.0));
        dq.mult_assign(0.25);
        assert!((dq.get(0) - 0.375).abs() < 1e-15);
        assert!((dq.get(1) - 2.25).abs() < 1e-15);
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn mixed_representation_add_panics() {
        let _ = AlgebraElement::U1(1.0).add(&su2([0.0; 3]));
    }

    #[test]
    fn square_is_sum_of_component_squares() {
        assert!((su2([3.0, 4.0, 0.0]).square() - 25.0).abs() < 1e-15);
        assert!((AlgebraElement::U1(-2.0).square() - 4.0).abs() < 1e-15);
    }
}
