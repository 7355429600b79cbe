//! Constants for solver keys, default settings, and exit codes.

/// Default maximum multipole retrieved from the solver.
pub const DEFAULT_LMAX: usize = 2500;

/// Default maximum wavenumber (in 1/Mpc) for the matter power spectrum.
pub const DEFAULT_P_K_MAX_INV_MPC: f64 = 3.0;

/// Output directive requesting temperature, polarization, lensing, and matter power.
pub const OUTPUT_DIRECTIVE: &str = "tCl,pCl,lCl,mPk";

/// First multipole carrying physical information (0 and 1 are monopole and dipole).
pub const FIRST_PHYSICAL_MULTIPOLE: usize = 2;

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Solver input keys.
pub mod keys {
    /// Requested outputs.
    pub const OUTPUT: &str = "output";
    /// Lensing toggle (`yes` / `no`).
    pub const LENSING: &str = "lensing";
    /// Maximum wavenumber for P(k).
    pub const P_K_MAX: &str = "P_k_max_1/Mpc";
    /// Maximum multipole computed for scalar modes.
    pub const L_MAX_SCALARS: &str = "l_max_scalars";
    /// Reduced Hubble parameter.
    pub const H: &str = "h";
    /// Hubble parameter in km/s/Mpc.
    pub const H0: &str = "H0";
    /// Physical baryon density.
    pub const OMEGA_B: &str = "omega_b";
    /// Physical cold dark matter density.
    pub const OMEGA_CDM: &str = "omega_cdm";
    /// Primordial scalar amplitude.
    pub const A_S: &str = "A_s";
    /// Primordial scalar tilt.
    pub const N_S: &str = "n_s";
    /// Reionization optical depth.
    pub const TAU_REIO: &str = "tau_reio";
}

/// Reference six-parameter Lambda-CDM point.
pub const LAMBDA_CDM_REFERENCE: [(&str, f64); 6] = [
    (keys::OMEGA_B, 0.022_382_8),
    (keys::OMEGA_CDM, 0.120_107_5),
    (keys::H, 0.678_10),
    (keys::A_S, 2.100_549e-9),
    (keys::N_S, 0.966_049_9),
    (keys::TAU_REIO, 0.054_308_42),
];

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// The solver rejected a physical parameter.
    pub const ERROR_INVALID_PARAMETER: i32 = 2;
    /// The solver failed while computing.
    pub const ERROR_COMPUTATION: i32 = 3;
    /// Results could not be extracted from the solver.
    pub const ERROR_EXTRACTION: i32 = 4;
    /// Invalid command-line or file configuration.
    pub const ERROR_CONFIG: i32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_point_has_six_parameters() {
        assert_eq!(LAMBDA_CDM_REFERENCE.len(), 6);
        assert!(LAMBDA_CDM_REFERENCE
            .iter()
            .all(|(_, value)| value.is_finite() && *value > 0.0));
    }

    #[test]
    fn output_directive_requests_all_spectra() {
        for part in ["tCl", "pCl", "lCl", "mPk"] {
            assert!(OUTPUT_DIRECTIVE.split(',').any(|p| p == part));
        }
    }
}
