//! Classic fourth-order Runge-Kutta

use super::{AccelerationField, Integrator};
use crate::physics::math::{Scalar, Vector};

/// Fourth-order Runge-Kutta integrator (RK4)
///
/// 1. k1 = f(t, y)
/// 2. k2 = f(t + dt/2, y + k1*dt/2)
/// 3. k3 = f(t + dt/2, y + k2*dt/2)
/// 4. k4 = f(t + dt, y + k3*dt)
/// 5. y(t+dt) = y(t) + dt/6 * (k1 + 2*k2 + 2*k3 + k4)
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKuttaFourthOrder;

impl Integrator for RungeKuttaFourthOrder {
    fn clone_box(&self) -> Box<dyn Integrator> {
        Box::new(*self)
    }

    fn step(
        &self,
        position: &mut Vector,
        velocity: &mut Vector,
        field: &dyn AccelerationField,
        dt: Scalar,
    ) {
        let k1_x = *velocity;
        let k1_v = field.at(*position);

        let k2_x = *velocity + k1_v * (dt * 0.5);
        let k2_v = field.at(*position + k1_x * (dt * 0.5));

        let k3_x = *velocity + k2_v * (dt * 0.5);
        let k3_v = field.at(*position + k2_x * (dt * 0.5));

        let k4_x = *velocity + k3_v * dt;
        let k4_v = field.at(*position + k3_x * dt);

        *position += (k1_x + k2_x * 2.0 + k3_x * 2.0 + k4_x) * (dt / 6.0);
        *velocity += (k1_v + k2_v * 2.0 + k3_v * 2.0 + k4_v) * (dt / 6.0);
    }

    fn convergence_order(&self) -> usize {
        4
    }

    fn name(&self) -> &'static str {
        "runge_kutta_fourth_order"
    }

    fn aliases(&self) -> Vec<&'static str> {
        vec!["rk4"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::integrators::CentralGravity;

    struct ConstantField(Vector);

    impl AccelerationField for ConstantField {
        fn at(&self, _position: Vector) -> Vector {
            self.0
        }
    }

    #[test]
    fn test_rk4_exact_for_constant_acceleration() {
        let mut position = Vector::new(1.0, 0.0, 0.0);
        let mut velocity = Vector::new(0.0, 1.0, 0.0);
        let field = ConstantField(Vector::new(0.0, 0.0, -9.81));

        RungeKuttaFourthOrder.step(&mut position, &mut velocity, &field, 0.01);

        let expected_position = Vector::new(1.0, 0.01, -0.5 * 9.81 * 0.01 * 0.01);
        assert!((position - expected_position).length() < 1e-12);
        assert!((velocity - Vector::new(0.0, 1.0, -0.0981)).length() < 1e-12);
    }

    #[test]
    fn test_rk4_circular_orbit_radius_drift() {
        let field = CentralGravity::new(1.0);
        let mut position = Vector::new(1.0, 0.0, 0.0);
        let mut velocity = Vector::new(0.0, 1.0, 0.0);
        let dt = 2.0 * std::f64::consts::PI / 1000.0;

        for _ in 0..1000 {
            RungeKuttaFourthOrder.step(&mut position, &mut velocity, &field, dt);
        }

        assert!((position.length() - 1.0).abs() < 1e-8);
        assert!((position - Vector::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }
}
