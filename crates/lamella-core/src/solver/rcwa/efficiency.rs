//! Diffraction efficiencies and the energy balance check.

use num_complex::Complex64;

use super::boundary::{Amplitudes, HalfSpace};
use crate::solver::SolverError;
use crate::types::{Diagnostics, OrderEfficiency, OrderStatus};

/// Convert mode amplitudes into per-order efficiencies.
///
/// $\eta_n = |r_n|^2\,\mathrm{Re}(q_n/Y)/\mathrm{Re}(q_0/Y)$ for propagating
/// orders (likewise for transmission); evanescent orders are exactly 0.
pub fn order_efficiencies(
    truncation: usize,
    incidence: &HalfSpace,
    substrate: &HalfSpace,
    amplitudes: &Amplitudes,
    k0: f64,
) -> Result<Vec<OrderEfficiency>, SolverError> {
    let centre = truncation;
    let incident_flux = incidence.flux_weight(centre);
    if incidence.status[centre] != OrderStatus::Propagating || !(incident_flux > 0.0) {
        return Err(SolverError::InvalidInput(
            "incident wave does not propagate in the incidence medium".into(),
        ));
    }

    let efficiency = |medium: &HalfSpace, i: usize, amplitude: Complex64| match medium.status[i] {
        OrderStatus::Propagating => amplitude.norm_sqr() * medium.flux_weight(i) / incident_flux,
        OrderStatus::Evanescent => 0.0,
    };

    Ok((0..2 * truncation + 1)
        .map(|i| {
            let r = amplitudes.reflection[i];
            let t = amplitudes.transmission[i];
            OrderEfficiency {
                order: i as i64 - truncation as i64,
                status: incidence.status[i],
                kz: incidence.q[i] * k0,
                reflection: r,
                efficiency: efficiency(incidence, i, r),
                transmission_status: substrate.status[i],
                transmission: t,
                transmission_efficiency: efficiency(substrate, i, t),
            }
        })
        .collect())
}

/// Sum the efficiencies and check the energy balance.
///
/// Lossless structures must satisfy $|\sum R + \sum T - 1| \le$ `tolerance`;
/// absorbing ones only $\sum R + \sum T \le 1 +$ `tolerance`. A violation
/// leaves `message` set in the returned diagnostics.
pub fn check_conservation(orders: &[OrderEfficiency], lossless: bool, tolerance: f64) -> Diagnostics {
    let total_reflection: f64 = orders.iter().map(|o| o.efficiency).sum();
    let total_transmission: f64 = orders.iter().map(|o| o.transmission_efficiency).sum();
    let energy_sum = total_reflection + total_transmission;
    let residual = if lossless {
        (energy_sum - 1.0).abs()
    } else {
        (energy_sum - 1.0).max(0.0)
    };

    let message = if residual <= tolerance {
        None
    } else {
        let violation = SolverError::ConservationViolation {
            energy_sum,
            residual,
            tolerance,
        };
        Some(violation.to_string())
    };

    Diagnostics {
        total_reflection,
        total_transmission,
        energy_sum,
        residual,
        tolerance,
        lossless,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(efficiency: f64, transmission_efficiency: f64) -> OrderEfficiency {
        OrderEfficiency {
            order: 0,
            status: OrderStatus::Propagating,
            kz: Complex64::new(1.0, 0.0),
            reflection: Complex64::new(efficiency.sqrt(), 0.0),
            efficiency,
            transmission_status: OrderStatus::Propagating,
            transmission: Complex64::new(transmission_efficiency.sqrt(), 0.0),
            transmission_efficiency,
        }
    }

    #[test]
    fn test_lossless_balance_within_tolerance() {
        let diag = check_conservation(&[order(0.3, 0.2), order(0.1, 0.4)], true, 1e-6);
        assert!(diag.message.is_none());
        assert!(diag.residual < 1e-15);
    }

    #[test]
    fn test_lossless_deficit_is_violation() {
        let diag = check_conservation(&[order(0.3, 0.6)], true, 1e-3);
        assert!(diag.message.unwrap().contains("Energy balance violated"));
    }

    #[test]
    fn test_absorbing_deficit_is_allowed_but_excess_is_not() {
        assert!(check_conservation(&[order(0.3, 0.0)], false, 1e-6).message.is_none());
        let diag = check_conservation(&[order(0.9, 0.2)], false, 1e-6);
        assert!(diag.message.is_some());
        assert!((diag.residual - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_evanescent_orders_have_zero_efficiency() {
        let kx = [-1.0, 0.0, 1.0];
        let air = HalfSpace::new(Complex64::new(1.0, 0.0), &kx, crate::types::Polarization::Te);
        let amps = Amplitudes {
            reflection: vec![Complex64::new(0.7, 0.0), Complex64::new(0.5, 0.0), Complex64::new(0.7, 0.0)],
            transmission: vec![Complex64::new(0.0, 0.0); 3],
        };
        let orders = order_efficiencies(1, &air, &air, &amps, 1.0).unwrap();
        assert_eq!(orders[0].status, OrderStatus::Evanescent);
        assert_eq!(orders[0].efficiency, 0.0);
        assert_eq!(orders[2].efficiency, 0.0);
        assert!((orders[1].efficiency - 0.25).abs() < 1e-15);
    }
}
