use crate::traits::{coeff, DynamicalSystem, Scalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = coeff::<T>(0.5);
        let sixth = coeff::<T>(1.0 / 6.0);
        let two = coeff::<T>(2.0);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Tsitouras 5(4) Solver, advanced with its 5th order weights at a fixed step.
pub struct Tsit5<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;

        let c2 = coeff::<T>(0.161);
        let c3 = coeff::<T>(0.327);
        let c4 = coeff::<T>(0.9);
        let c5 = coeff::<T>(0.9800255409045097);

        let a21 = coeff::<T>(0.161);

        let a31 = coeff::<T>(-0.008480655492356989);
        let a32 = coeff::<T>(0.335480655492357);

        let a41 = coeff::<T>(2.897153057105493);
        let a42 = coeff::<T>(-6.359448489975075);
        let a43 = coeff::<T>(4.3622954328695815);

        let a51 = coeff::<T>(5.325864828439257);
        let a52 = coeff::<T>(-11.748883564062828);
        let a53 = coeff::<T>(7.4955393428898365);
        let a54 = coeff::<T>(-0.09249506636175525);

        let a61 = coeff::<T>(5.86145544294642);
        let a62 = coeff::<T>(-12.92096931784711);
        let a63 = coeff::<T>(8.159367898576159);
        let a64 = coeff::<T>(-0.071584973281401);
        let a65 = coeff::<T>(-0.028269050394068383);

        // b coefficients (5th order)
        let b1 = coeff::<T>(0.09646076681806523);
        let b2 = coeff::<T>(0.01);
        let b3 = coeff::<T>(0.4798896504144996);
        let b4 = coeff::<T>(1.379008574103742);
        let b5 = coeff::<T>(-3.290069515436081);
        let b6 = coeff::<T>(2.324710524099774);

        // k1
        system.apply(t0, state, &mut self.k1);

        // k2
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a21 * self.k1[i]);
        }
        system.apply(t0 + c2 * dt, &self.tmp, &mut self.k2);

        // k3
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a31 * self.k1[i] + a32 * self.k2[i]);
        }
        system.apply(t0 + c3 * dt, &self.tmp, &mut self.k3);

        // k4
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        system.apply(t0 + c4 * dt, &self.tmp, &mut self.k4);

        // k5
        for i in 0..state.len() {
            self.tmp[i] = state[i]
                + dt * (a51 * self.k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        system.apply(t0 + c5 * dt, &self.tmp, &mut self.k5);

        // k6
        for i in 0..state.len() {
            self.tmp[i] = state[i]
                + dt * (a61 * self.k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k6);

        // Update State
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * (b1 * self.k1[i]
                    + b2 * self.k2[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }

        *t = t0 + dt;
    }
}

#[cfg(test)]
mod tests {
    use super::{Tsit5, RK4};
    use crate::traits::{DynamicalSystem, Steppable};

    struct Decay;

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -x[0];
        }
    }

    struct Rotation;

    impl DynamicalSystem<f64> for Rotation {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -x[1];
            out[1] = x[0];
        }
    }

    #[test]
    fn rk4_single_step_matches_taylor_polynomial() {
        let mut solver = RK4::new(1);
        let mut t = 0.0;
        let mut state = vec![1.0];
        let dt = 0.1;
        solver.step(&Decay, &mut t, &mut state, dt);
        // RK4 reproduces exp(-dt) through the dt^4 term.
        let expected = 1.0 - dt + dt * dt / 2.0 - dt.powi(3) / 6.0 + dt.powi(4) / 24.0;
        assert!((state[0] - expected).abs() < 1e-15);
        assert!((t - dt).abs() < 1e-15);
    }

    #[test]
    fn tsit5_tracks_rotation_over_one_period() {
        let mut solver = Tsit5::new(2);
        let mut t = 0.0;
        let mut state = vec![1.0, 0.0];
        let steps = 200;
        let dt = 2.0 * std::f64::consts::PI / steps as f64;
        for _ in 0..steps {
            solver.step(&Rotation, &mut t, &mut state, dt);
        }
        assert!((state[0] - 1.0).abs() < 1e-9);
        assert!(state[1].abs() < 1e-9);
    }

    #[test]
    fn tsit5_converges_at_fifth_order() {
        let global_error = |steps: usize| {
            let mut solver = Tsit5::new(1);
            let mut t = 0.0;
            let mut state = vec![1.0];
            let dt = 1.0 / steps as f64;
            for _ in 0..steps {
                solver.step(&Decay, &mut t, &mut state, dt);
            }
            (state[0] - (-1.0f64).exp()).abs()
        };
        let coarse = global_error(10);
        let fine = global_error(20);
        assert!(coarse > 0.0);
        // Halving dt divides the error by about 2^5.
        assert!(fine < coarse / 24.0, "coarse {coarse}, fine {fine}");
    }
}
