// SPDX-License-Identifier: AGPL-3.0-only

//! In-place complex Fourier transforms for the spectral Poisson solver.
//!
//! The lattice solvers only ever transform full complex arrays over
//! periodic grids, so a dense complex-to-complex transform is all that is
//! needed. Power-of-two axis lengths take the iterative radix-2
//! Cooley-Tukey path; any other length falls back to the O(n²) reference
//! DFT, which is exact and keeps odd grid sizes usable for tests and small
//! runs.
//!
//! Normalization matches the usual "unscaled forward, 1/n inverse"
//! convention, applied per axis so a full D-dimensional round trip scales
//! by 1/(total cells) exactly once.

use crate::complex::Complex64;

/// In-place 1-D complex FFT. `inverse` flips the twiddle sign and applies
/// the 1/n normalization.
pub fn fft_1d(data: &mut [Complex64], inverse: bool) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    if n.is_power_of_two() {
        fft_radix2(data, inverse);
    } else {
        dft_reference(data, inverse);
    }
    if inverse {
        let s = 1.0 / n as f64;
        for v in data.iter_mut() {
            *v = v.scale(s);
        }
    }
}

/// In-place D-dimensional complex FFT over a row-major array
/// (last axis fastest, matching the grid's cell indexing).
pub fn fft_nd(data: &mut [Complex64], dims: &[usize], inverse: bool) {
    let total: usize = dims.iter().product();
    assert_eq!(data.len(), total, "data length must match the grid volume");

    // Transform along each axis through a strided gather/scatter.
    let mut stride_after = 1usize; // product of dims after the current axis
    for axis in (0..dims.len()).rev() {
        let n = dims[axis];
        let stride = stride_after;
        let block = n * stride;
        let mut line = vec![Complex64::ZERO; n];

        for base in (0..total).step_by(block) {
            for offset in 0..stride {
                for (k, v) in line.iter_mut().enumerate() {
                    *v = data[base + offset + k * stride];
                }
                fft_1d(&mut line, inverse);
                for (k, v) in line.iter().enumerate() {
                    data[base + offset + k * stride] = *v;
                }
            }
        }
        stride_after *= n;
    }
}

/// Iterative radix-2 Cooley-Tukey with bit-reversal permutation.
fn fft_radix2(data: &mut [Complex64], inverse: bool) {
    let n = data.len();
    let levels = n.trailing_zeros();

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            data.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    for level in 0..levels {
        let len = 2usize << level;
        let half = len / 2;
        let theta = sign * std::f64::consts::TAU / len as f64;
        let step = Complex64::from_polar(theta);
        for start in (0..n).step_by(len) {
            let mut w = Complex64::ONE;
            for k in 0..half {
                let a = data[start + k];
                let b = data[start + k + half] * w;
                data[start + k] = a + b;
                data[start + k + half] = a - b;
                w = w * step;
            }
        }
    }
}

/// Exact O(n²) DFT for non-power-of-two lengths.
fn dft_reference(data: &mut [Complex64], inverse: bool) {
    let n = data.len();
    let sign = if inverse { 1.0 } else { -1.0 };
    let mut out = vec![Complex64::ZERO; n];
    for (k, o) in out.iter_mut().enumerate() {
        let mut acc = Complex64::ZERO;
        for (m, v) in data.iter().enumerate() {
            let theta = sign * std::f64::consts::TAU * (k * m % n) as f64 / n as f64;
            acc += *v * Complex64::from_polar(theta);
        }
        *o = acc;
    }
    data.copy_from_slice(&out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_err(a: &[Complex64], b: &[Complex64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (*x - *y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn forward_of_constant_is_dc_only() {
        let mut data = vec![Complex64::ONE; 8];
        fft_1d(&mut data, false);
        assert!((data[0].re - 8.0).abs() < 1e-13);
        for v in &data[1..] {
            assert!(v.abs() < 1e-13, "non-DC modes must vanish");
        }
    }

    #[test]
    fn single_mode_lands_in_single_bin() {
        let n = 16;
        let mut data: Vec<Complex64> = (0..n)
            .map(|i| Complex64::from_polar(std::f64::consts::TAU * 3.0 * i as f64 / n as f64))
            .collect();
        fft_1d(&mut data, false);
        assert!((data[3].re - n as f64).abs() < 1e-11);
        for (k, v) in data.iter().enumerate() {
            if k != 3 {
                assert!(v.abs() < 1e-11, "leakage into bin {k}");
            }
        }
    }

    #[test]
    fn roundtrip_power_of_two() {
        let orig: Vec<Complex64> = (0..32)
            .map(|i| Complex64::new((i as f64).sin(), (i as f64 * 0.7).cos()))
            .collect();
        let mut data = orig.clone();
        fft_1d(&mut data, false);
        fft_1d(&mut data, true);
        assert!(max_err(&data, &orig) < 1e-12);
    }

    #[test]
    fn roundtrip_non_power_of_two() {
        let orig: Vec<Complex64> = (0..12)
            .map(|i| Complex64::new(i as f64, -(i as f64) * 0.3))
            .collect();
        let mut data = orig.clone();
        fft_1d(&mut data, false);
        fft_1d(&mut data, true);
        assert!(max_err(&data, &orig) < 1e-11);
    }

    #[test]
    fn radix2_matches_reference_dft() {
        let orig: Vec<Complex64> = (0..16)
            .map(|i| Complex64::new((3 * i % 7) as f64, (5 * i % 11) as f64))
            .collect();
        let mut fast = orig.clone();
        let mut slow = orig.clone();
        fft_radix2(&mut fast, false);
        dft_reference(&mut slow, false);
        assert!(max_err(&fast, &slow) < 1e-10);
    }

    #[test]
    fn roundtrip_2d() {
        let dims = [4, 8];
        let orig: Vec<Complex64> = (0..32)
            .map(|i| Complex64::new((i as f64 * 1.3).sin(), (i as f64 * 0.1).cos()))
            .collect();
        let mut data = orig.clone();
        fft_nd(&mut data, &dims, false);
        fft_nd(&mut data, &dims, true);
        assert!(max_err(&data, &orig) < 1e-12);
    }

    #[test]
    fn roundtrip_3d_mixed_sizes() {
        let dims = [2, 3, 4];
        let orig: Vec<Complex64> = (0..24)
            .map(|i| Complex64::new(i as f64, (i * i % 5) as f64))
            .collect();
        let mut data = orig.clone();
        fft_nd(&mut data, &dims, false);
        fft_nd(&mut data, &dims, true);
        assert!(max_err(&data, &orig) < 1e-11);
    }

    #[test]
    fn plane_wave_2d_lands_in_single_bin() {
        let (nx, ny) = (4usize, 4usize);
        let mut data = vec![Complex64::ZERO; nx * ny];
        for x in 0..nx {
            for y in 0..ny {
                let phase = std::f64::consts::TAU * (x as f64 / nx as f64 + 2.0 * y as f64 / ny as f64);
                data[x * ny + y] = Complex64::from_polar(phase);
            }
        }
        fft_nd(&mut data, &[nx, ny], false);
        let hot = ny + 2;
        assert!((data[hot].re - (nx * ny) as f64).abs() < 1e-11);
        for (i, v) in data.iter().enumerate() {
            if i != hot {
                assert!(v.abs() < 1e-11, "leakage into bin {i}");
            }
        }
    }
}
