// SPDX-License-Identifier: AGPL-3.0-only

//! Spectral Poisson solvers and momentum-space charge regulation.
//!
//! Two momentum definitions coexist and must not be conflated:
//!
//! - the *effective* lattice momentum `k_eff² = 2 Σ_i (1 − cos(2π n_i/N_i)) / a²`,
//!   the eigenvalue of the discrete Laplacian and therefore the denominator
//!   of the lattice Poisson equation;
//! - the *aliased physical* momentum `k² = Σ_i (2π min(n_i, N_i−n_i) / (a N_i))²`,
//!   used to test regulator windows against physical cutoff scales.
//!
//! All regulators zero the zero-momentum mode first: a periodic lattice
//! admits no solution of the Poisson equation for nonzero net charge.

use crate::algebra::{AlgebraElement, GroupElement};
use crate::complex::Complex64;
use crate::fft::fft_nd;
use crate::grid::{cell_index_of, cell_pos_of, reduce_dim, Grid};
use crate::settings::Settings;

/// Squared effective lattice momentum of a mode, the discrete-Laplacian
/// eigenvalue `2 Σ_i (1 − cos(2π n_i / N_i)) / a²`.
#[must_use]
pub fn effective_momentum_squared(cell_index: usize, dims: &[usize], a: f64) -> f64 {
    let pos = cell_pos_of(cell_index, dims);
    let mut k2 = 2.0 * dims.len() as f64;
    for (p, &n) in pos.iter().zip(dims) {
        k2 -= 2.0 * (std::f64::consts::TAU * *p as f64 / n as f64).cos();
    }
    k2 / (a * a)
}

/// Squared aliased physical momentum of a mode, folding each axis onto
/// `[0, π/a]` via `min(n, N − n)`.
#[must_use]
pub fn physical_momentum_squared(cell_index: usize, dims: &[usize], a: f64) -> f64 {
    let pos = cell_pos_of(cell_index, dims);
    let mut k2 = 0.0;
    for (p, &n) in pos.iter().zip(dims) {
        let folded = (*p as usize).min(n - *p as usize) as f64;
        let k = std::f64::consts::TAU * folded / (a * n as f64);
        k2 += k * k;
    }
    k2
}

/// Signed 1-D lattice momentum on `[−π/a, π/a)`, folding the fractional
/// mode index `δ = n/N` at one half.
#[must_use]
pub fn lattice_momentum_1d(pos: usize, num_cells: usize, a: f64) -> f64 {
    let delta = pos as f64 / num_cells as f64;
    if delta < 0.5 {
        std::f64::consts::TAU * delta / a
    } else {
        std::f64::consts::TAU * (delta - 1.0) / a
    }
}

/// Error function via the Abramowitz-Stegun 7.1.26 rational approximation
/// (absolute error below 1.5e-7, sufficient for smooth charge profiles).
#[must_use]
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

fn to_complex(rho: &[f64]) -> Vec<Complex64> {
    rho.iter().map(|&r| Complex64::new(r, 0.0)).collect()
}

fn from_complex(data: &[Complex64], rho: &mut [f64]) {
    for (r, v) in rho.iter_mut().zip(data) {
        *r = v.re;
    }
}

/// Solves the transverse Poisson equation `−Δφ = ρ` on a periodic lattice.
/// The zero-momentum mode is dropped.
#[must_use]
pub fn solve_poisson_2d(rho: &[f64], dims: &[usize], a: f64) -> Vec<f64> {
    let mut data = to_complex(rho);
    fft_nd(&mut data, dims, false);

    data[0] = Complex64::ZERO;
    for (i, v) in data.iter_mut().enumerate().skip(1) {
        let k2 = effective_momentum_squared(i, dims, a);
        *v = v.scale(1.0 / k2);
    }

    fft_nd(&mut data, dims, true);
    let mut phi = vec![0.0; rho.len()];
    from_complex(&data, &mut phi);
    phi
}

/// Hard UV / soft IR regulation of one color component of a 3-D charge
/// density. Modes pass only inside the window `0 < k_T² ≤ UVT²` and
/// `|k_L| ≤ UVL`; inside, each mode is damped by `k_eff,T²/(k_eff,T² + IR²)`.
pub fn regulate_charge_density_hard(
    rho: &mut [f64],
    dims: &[usize],
    uv_t: f64,
    uv_l: f64,
    ir: f64,
    direction: usize,
    a: f64,
) {
    regulate_charge_density(rho, dims, uv_t, ir, direction, a, |k_l| {
        if k_l <= uv_l {
            1.0
        } else {
            0.0
        }
    });
}

/// Hard transverse window with a Gaussian longitudinal factor
/// `exp(−k_L² w² / 4)` instead of a sharp cutoff.
pub fn regulate_charge_density_gaussian(
    rho: &mut [f64],
    dims: &[usize],
    uv_t: f64,
    long_width: f64,
    ir: f64,
    direction: usize,
    a: f64,
) {
    regulate_charge_density(rho, dims, uv_t, ir, direction, a, |k_l| {
        (-0.25 * k_l * k_l * long_width * long_width).exp()
    });
}

fn regulate_charge_density<F: Fn(f64) -> f64>(
    rho: &mut [f64],
    dims: &[usize],
    uv_t: f64,
    ir: f64,
    direction: usize,
    a: f64,
    longitudinal_factor: F,
) {
    let trans_dims = reduce_dim(dims, direction);
    let long_cells = dims[direction];

    let mut data = to_complex(rho);
    fft_nd(&mut data, dims, false);

    // Remove global charge.
    data[0] = Complex64::ZERO;

    for (i, v) in data.iter_mut().enumerate() {
        let pos = cell_pos_of(i, dims);
        let long_pos = pos[direction] as usize;
        let trans_pos = reduce_dim(&pos, direction);
        let trans_index = cell_index_of(&trans_pos, &trans_dims);

        let kt_eff2 = effective_momentum_squared(trans_index, &trans_dims, a);
        let kt2 = physical_momentum_squared(trans_index, &trans_dims, a);
        let k_l = lattice_momentum_1d(long_pos, long_cells, a).abs();

        if kt2 <= uv_t * uv_t && kt2 > 0.0 {
            let regulator = kt_eff2 / (kt_eff2 + ir * ir) * longitudinal_factor(k_l);
            *v = v.scale(regulator);
        } else {
            *v = Complex64::ZERO;
        }
    }

    fft_nd(&mut data, dims, true);
    from_complex(&data, rho);
}

/// Transverse-only regulation used by the MV-model Wilson-line sampler:
/// hard window `0 < k² ≤ UVT²`, soft IR damping, zero mode removed.
pub fn regulate_charge_density_2d(rho: &mut [f64], dims: &[usize], uv_t: f64, ir: f64, a: f64) {
    let mut data = to_complex(rho);
    fft_nd(&mut data, dims, false);

    data[0] = Complex64::ZERO;
    for (i, v) in data.iter_mut().enumerate().skip(1) {
        let k_eff2 = effective_momentum_squared(i, dims, a);
        let k2 = physical_momentum_squared(i, dims, a);
        if k2 <= uv_t * uv_t {
            *v = v.scale(k_eff2 / (k_eff2 + ir * ir));
        } else {
            *v = Complex64::ZERO;
        }
    }

    fft_nd(&mut data, dims, true);
    from_complex(&data, rho);
}

// ═══════════════════════════════════════════════════════════════════
//  Field-level solvers
// ═══════════════════════════════════════════════════════════════════

/// One-dimensional abelian-limit solver: with vanishing initial gauge
/// fields the Gauss constraint reduces per color component to the ordinary
/// Poisson equation. The electric field follows from the central
/// difference of the potential.
pub struct WongPoissonSolver;

impl WongPoissonSolver {
    pub fn solve(grid: &mut Grid) {
        let dims = grid.shape().to_vec();
        let total = grid.total_cells();
        let a = grid.lattice_spacing();
        let components = grid.factory().n_components();

        for c in 0..components {
            let rho: Vec<f64> = (0..total).map(|i| grid.rho(i).get(c)).collect();
            let phi = solve_poisson_2d(&rho, &dims, a);

            for i in 0..total {
                let left = grid.shift(i, 0, -1);
                let right = grid.shift(i, 0, 1);
                let field = (phi[right] - phi[left]) / (2.0 * a);
                let mut e = grid.e(i, 0);
                e.set(c, field);
                grid.set_e(i, 0, e);
            }
        }
    }
}

/// Light-cone Poisson solver for CGC initial conditions.
///
/// Given a transverse color charge density moving along `direction`,
/// solves the 2-D transverse Poisson equation, builds transverse Wilson
/// lines `V(x_T) = exp(−i φ(x_T) g s(z, t))` with a smoothed longitudinal
/// profile `s`, sets the transverse links `U_i = V(x) V(x+î)†` at `t = 0`
/// and `t = a_t`, derives the transverse electric fields from the link
/// mismatch between the two times, and records the discrete Gauss-law
/// violation of the resulting configuration for the particle creator.
pub struct LightConePoissonSolver {
    direction: usize,
    orientation: i32,
    location: f64,
    longitudinal_width: f64,
    trans_density: Vec<AlgebraElement>,
    trans_dims: Vec<usize>,
    phi: Vec<AlgebraElement>,
    gauss_violation: Vec<AlgebraElement>,
    coupling: f64,
}

impl LightConePoissonSolver {
    pub fn new(
        direction: usize,
        orientation: i32,
        location: f64,
        longitudinal_width: f64,
        trans_density: Vec<AlgebraElement>,
        trans_dims: Vec<usize>,
    ) -> Self {
        Self {
            direction,
            orientation,
            location,
            longitudinal_width,
            trans_density,
            trans_dims,
            phi: Vec::new(),
            gauss_violation: Vec::new(),
            coupling: 1.0,
        }
    }

    /// Solves the transverse Poisson equation for the potential φ.
    pub fn initialize(&mut self, settings: &Settings) {
        self.coupling = settings.coupling;
        let a = settings.lattice_spacing;
        let total_trans: usize = self.trans_dims.iter().product();
        let components = self
            .trans_density
            .first()
            .map_or(0, AlgebraElement::n_components);

        let mut phi = self.trans_density.clone();
        for p in &mut phi {
            p.mult_assign(0.0);
        }
        for c in 0..components {
            let rho: Vec<f64> = (0..total_trans)
                .map(|i| self.trans_density[i].get(c))
                .collect();
            let solution = solve_poisson_2d(&rho, &self.trans_dims, a);
            for (p, &v) in phi.iter_mut().zip(&solution) {
                p.set(c, v);
            }
        }
        self.phi = phi;
    }

    /// Cumulative longitudinal profile of the moving charge sheet at
    /// comoving offset `xi = z − location − orientation·t`: approaches 1
    /// behind the sheet and 0 ahead of it.
    fn integrated_shape(&self, xi: f64) -> f64 {
        let arg = f64::from(self.orientation) * xi
            / (std::f64::consts::SQRT_2 * self.longitudinal_width);
        0.5 * (1.0 - erf(arg))
    }

    /// Wilson line at a transverse site for a given longitudinal profile
    /// value.
    fn wilson_line(&self, trans_index: usize, shape: f64) -> GroupElement {
        self.phi[trans_index]
            .mult(-shape * self.coupling)
            .exp()
    }

    /// Sets links and electric fields on the grid and records the Gauss
    /// violation. Retains no grid references afterwards.
    pub fn solve(&mut self, grid: &mut Grid) {
        let a = grid.lattice_spacing();
        let at = grid.temporal_spacing();
        let g = self.coupling;
        let total = grid.total_cells();
        let d = grid.dimensions();

        // Transverse links and fields at t = 0 and t = a_t.
        for i in 0..total {
            let pos = grid.cell_pos(i);
            let z = pos[self.direction] as f64 * a - self.location;
            let trans_pos = reduce_dim(&pos, self.direction);
            let s0 = self.integrated_shape(z);
            let s1 = self.integrated_shape(z - f64::from(self.orientation) * at);

            let trans_index = cell_index_of(&trans_pos, &self.trans_dims);
            let v0 = self.wilson_line(trans_index, s0);
            let v1 = self.wilson_line(trans_index, s1);

            let mut t = 0;
            for j in 0..d {
                if j == self.direction {
                    continue;
                }
                let shifted_pos = {
                    let mut p = trans_pos.clone();
                    p[t] += 1;
                    cell_index_of(&p, &self.trans_dims)
                };
                let v0s = self.wilson_line(shifted_pos, s0);
                let v1s = self.wilson_line(shifted_pos, s1);

                let u0 = v0.mult(&v0s.adj());
                let u1 = v1.mult(&v1s.adj());
                grid.set_u(i, j, u0);
                grid.set_u_next(i, j, u1);

                // Discrete time derivative of the link pair.
                let e = u1.mult(&u0.adj()).proj().mult(1.0 / (g * a * at));
                grid.set_e(i, j, e);
                t += 1;
            }
        }

        // Gauss-law violation of the configuration just written:
        // G(x) = Σ_i (E_i(x) − E_i(x−î) transported across U_i(x−î)).
        let mut violation = vec![grid.factory().algebra_zero(); total];
        for (i, out) in violation.iter_mut().enumerate() {
            for j in 0..d {
                let back = grid.shift(i, j, -1);
                let transported = grid.e(back, j).act(&grid.u(back, j));
                out.add_assign(&grid.e(i, j).sub(&transported));
            }
        }
        self.gauss_violation = violation;
    }

    /// Gauss-law violation at a cell, the target density for particle
    /// creation.
    #[must_use]
    pub fn gauss_violation(&self, cell: usize) -> AlgebraElement {
        self.gauss_violation[cell]
    }

    #[must_use]
    pub fn gauss_violation_field(&self) -> &[AlgebraElement] {
        &self.gauss_violation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimulationType;

    #[test]
    fn effective_momentum_vanishes_at_dc() {
        assert!(effective_momentum_squared(0, &[8, 8], 1.0).abs() < 1e-15);
    }

    #[test]
    fn physical_momentum_folds_high_modes() {
        let dims = [8];
        // Mode 7 aliases to mode 1.
        let low = physical_momentum_squared(1, &dims, 1.0);
        let high = physical_momentum_squared(7, &dims, 1.0);
        assert!((low - high).abs() < 1e-14);
    }

    #[test]
    fn lattice_momentum_is_signed() {
        let n = 8;
        assert!(lattice_momentum_1d(1, n, 1.0) > 0.0);
        assert!(lattice_momentum_1d(n - 1, n, 1.0) < 0.0);
        let k_plus = lattice_momentum_1d(1, n, 1.0);
        let k_minus = lattice_momentum_1d(n - 1, n, 1.0);
        assert!((k_plus + k_minus).abs() < 1e-14);
    }

    #[test]
    fn erf_matches_known_values() {
        assert!(erf(0.0).abs() < 1e-15);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
        assert!((erf(3.0) - 0.999_977_9).abs() < 1e-5);
    }

    #[test]
    fn uniform_density_gives_zero_potential() {
        let dims = [4, 4];
        let rho = vec![2.5; 16];
        let phi = solve_poisson_2d(&rho, &dims, 1.0);
        for v in &phi {
            assert!(v.abs() < 1e-12, "uniform charge is pure zero mode");
        }
    }

    #[test]
    fn poisson_reproduces_single_mode() {
        // ρ(x) = cos(2π x / N) has −Δφ = k_eff² φ with the same spatial shape.
        let dims = [8, 1];
        let n = 8;
        let rho: Vec<f64> = (0..n)
            .map(|x| (std::f64::consts::TAU * x as f64 / n as f64).cos())
            .collect();
        let phi = solve_poisson_2d(&rho, &dims, 1.0);
        let k2 = effective_momentum_squared(1, &[8], 1.0);
        for (x, p) in phi.iter().enumerate() {
            let expected = (std::f64::consts::TAU * x as f64 / n as f64).cos() / k2;
            assert!((p - expected).abs() < 1e-12, "site {x}");
        }
    }

    #[test]
    fn regulated_density_has_zero_mean() {
        let dims = [4, 4, 4];
        let mut rho: Vec<f64> = (0..64).map(|i| (i % 7) as f64 - 2.0).collect();
        regulate_charge_density_hard(&mut rho, &dims, 100.0, 100.0, 0.0, 2, 1.0);
        let mean: f64 = rho.iter().sum::<f64>() / 64.0;
        assert!(mean.abs() < 1e-12, "DC mode must be removed exactly");
    }

    #[test]
    fn gaussian_regulator_damps_but_keeps_zero_mean() {
        let dims = [4, 4, 4];
        let mut rho: Vec<f64> = (0..64).map(|i| ((i * 13) % 11) as f64).collect();
        regulate_charge_density_gaussian(&mut rho, &dims, 100.0, 2.0, 0.5, 2, 1.0);
        let mean: f64 = rho.iter().sum::<f64>() / 64.0;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn tight_uv_window_kills_everything() {
        let dims = [4, 4];
        let mut rho: Vec<f64> = (0..16).map(|i| i as f64).collect();
        regulate_charge_density_2d(&mut rho, &dims, 1e-6, 0.0, 1.0);
        for v in &rho {
            assert!(v.abs() < 1e-12, "no mode fits below the cutoff");
        }
    }

    fn settings_3d() -> Settings {
        Settings {
            dimensions: 3,
            colors: 2,
            grid_cells: vec![4, 4, 8],
            lattice_spacing: 1.0,
            time_step: 0.5,
            coupling: 1.0,
            simulation_type: SimulationType::TemporalCgcNgp,
        }
    }

    #[test]
    fn wong_solver_recovers_field_of_dipole() {
        let settings = Settings {
            dimensions: 1,
            colors: 1,
            grid_cells: vec![16],
            lattice_spacing: 1.0,
            time_step: 1.0,
            coupling: 1.0,
            simulation_type: SimulationType::Wong1dNgp,
        };
        let mut grid = Grid::new(&settings).expect("grid");
        let mut plus = grid.factory().algebra_zero();
        plus.set(0, 1.0);
        grid.add_rho(4, &plus);
        grid.add_rho(12, &plus.mult(-1.0));
        WongPoissonSolver::solve(&mut grid);

        // Summed field divergence reproduces the charges up to the
        // discretization of the central difference.
        let mut total = 0.0;
        for i in 0..16 {
            total += grid.e(i, 0).get(0);
        }
        assert!(total.abs() < 1e-12, "periodic field sums to zero");
        assert!(grid.e(5, 0).get(0).abs() > 1e-3, "field near the charge");
    }

    #[test]
    fn light_cone_solver_produces_unitary_links() {
        let settings = settings_3d();
        let mut grid = Grid::new(&settings).expect("grid");
        let trans_dims = vec![4, 4];
        let factory = *grid.factory();
        let mut density = vec![factory.algebra_zero(); 16];
        let mut q = factory.algebra_zero();
        q.set(0, 0.7);
        q.set(2, -0.3);
        density[5].add_assign(&q);
        density[10].add_assign(&q.mult(-1.0));

        let mut solver = LightConePoissonSolver::new(2, 1, 4.0, 1.0, density, trans_dims);
        solver.initialize(&settings);
        solver.solve(&mut grid);

        for i in 0..grid.total_cells() {
            for j in 0..2 {
                assert!(
                    (grid.u(i, j).norm_sq() - 1.0).abs() < 1e-12,
                    "transverse links stay on the group"
                );
            }
        }
        assert_eq!(solver.gauss_violation_field().len(), grid.total_cells());
    }
}
